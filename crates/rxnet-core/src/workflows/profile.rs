//! Pathway-profile assembly from the extracted record set.
//!
//! For every catalyst (and for the uncatalyzed case) the assembler
//! reconstructs the ordered reaction stages Reactants → preTS → TS →
//! postTS → Products. A stage energy resolves either directly, when one
//! record covers the composition, or by addition over the missing
//! configured components (mirroring step-wise complex formation when the
//! external tool was only run on sub-fragments). Stages without resolvable
//! energy are omitted rather than filled with placeholders.

use crate::core::models::identity::{Branch, Category, Variant};
use crate::core::models::network::ReactionNetworkConfig;
use crate::core::models::profile::{PathwayProfile, ProfileStage, StageKind, StageSource};
use crate::core::models::record::ResultRecord;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

type EnergyKey = (String, Option<Variant>);

/// Species-level energy lookup: most-corrected electronic energy and
/// optional Gibbs energy, keyed by species with a variant-specific override.
struct EnergyLookup {
    table: HashMap<EnergyKey, (f64, Option<f64>)>,
}

impl EnergyLookup {
    fn build(records: &[ResultRecord]) -> Self {
        let mut table = HashMap::new();
        for record in records {
            let value = (record.effective_energy_kcal(), record.gibbs);
            if let Some(variant) = record.identity.variant {
                table.insert((record.identity.species.clone(), Some(variant)), value);
            }
            table.insert((record.identity.species.clone(), None), value);
        }
        Self { table }
    }

    fn get(&self, species: &str, variant: Option<Variant>) -> Option<(f64, Option<f64>)> {
        if variant.is_some() {
            if let Some(v) = self.table.get(&(species.to_owned(), variant)) {
                return Some(*v);
            }
        }
        self.table.get(&(species.to_owned(), None)).copied()
    }
}

/// Assembles one pathway per catalyst plus the uncatalyzed pathway, from a
/// homogeneous record slice (one method combo, one mode).
pub fn assemble(config: &ReactionNetworkConfig, records: &[ResultRecord]) -> Vec<PathwayProfile> {
    let lookup = EnergyLookup::build(records);
    let mut profiles = Vec::new();

    let uncatalyzed = assemble_pathway(config, records, &lookup, None);
    if !uncatalyzed.raw.is_empty() {
        profiles.push(uncatalyzed);
    }
    for catalyst in &config.catalysts {
        let pathway = assemble_pathway(config, records, &lookup, Some(catalyst.name()));
        if !pathway.raw.is_empty() {
            profiles.push(pathway);
        }
    }
    profiles
}

fn assemble_pathway(
    config: &ReactionNetworkConfig,
    records: &[ResultRecord],
    lookup: &EnergyLookup,
    catalyst: Option<&str>,
) -> PathwayProfile {
    let all_reactants: Vec<&str> = config.reactants.iter().map(|s| s.name()).collect();
    let all_products: Vec<&str> = config.products.iter().map(|s| s.name()).collect();

    let mut raw = Vec::new();
    let mut builder = StageBuilder { lookup, raw: &mut raw };

    builder.endpoint_stages(records, StageKind::Reactants, Branch::Reactants, &all_reactants, catalyst);
    if let Some(cat) = catalyst {
        builder.catalytic_stages(records, StageKind::PreTs, Branch::PreTs, &all_reactants, cat);
        builder.catalytic_ts_stages(records, cat);
    }
    builder.uncatalyzed_ts_stages(records, catalyst);
    if let Some(cat) = catalyst {
        builder.catalytic_stages(records, StageKind::PostTs, Branch::PostTs, &all_products, cat);
    }
    builder.endpoint_stages(records, StageKind::Products, Branch::Products, &all_products, catalyst);

    let by_electronic = filter_stages(&raw, |s| Some(s.electronic_kcal));
    let by_gibbs = filter_stages(&raw, |s| s.gibbs_kcal);
    PathwayProfile {
        catalyst: catalyst.map(str::to_owned),
        raw,
        by_electronic,
        by_gibbs,
    }
}

struct StageBuilder<'a> {
    lookup: &'a EnergyLookup,
    raw: &'a mut Vec<ProfileStage>,
}

impl StageBuilder<'_> {
    /// Reactants/Products stages: uncatalyzed records, completed by the
    /// missing configured components and, for a catalyzed pathway, the
    /// catalyst itself. Duplicate compositions collapse to the first.
    fn endpoint_stages(
        &mut self,
        records: &[ResultRecord],
        kind: StageKind,
        branch: Branch,
        all_components: &[&str],
        catalyst: Option<&str>,
    ) {
        let mut seen: BTreeSet<Vec<String>> = BTreeSet::new();
        for record in matching(records, branch, Category::NoCat, None) {
            let mut species = vec![record.identity.species.clone()];
            species.extend(missing_components(&record.identity.components, all_components));
            if let Some(cat) = catalyst {
                species.push(cat.to_owned());
            }

            let mut key: Vec<String> = species.clone();
            key.sort();
            if !seen.insert(key) {
                continue;
            }
            self.push_stage(kind, species, record.identity.variant);
        }
    }

    /// preTS/postTS stages: catalytic records of one catalyst, completed by
    /// the missing configured components (the catalyst is already part of
    /// the combination).
    fn catalytic_stages(
        &mut self,
        records: &[ResultRecord],
        kind: StageKind,
        branch: Branch,
        all_components: &[&str],
        catalyst: &str,
    ) {
        for record in matching(records, branch, Category::Cat, Some(catalyst)) {
            let mut species = vec![record.identity.species.clone()];
            species.extend(missing_components(&record.identity.components, all_components));
            self.push_stage(kind, species, record.identity.variant);
        }
    }

    /// Catalytic transition state: one record per variant, direct lookup.
    fn catalytic_ts_stages(&mut self, records: &[ResultRecord], catalyst: &str) {
        for record in matching(records, Branch::Ts, Category::Cat, Some(catalyst)) {
            self.push_stage(
                StageKind::TransitionState,
                vec![record.identity.species.clone()],
                record.identity.variant,
            );
        }
    }

    /// Uncatalyzed transition state; on a catalyzed pathway the free
    /// catalyst is added so the stage stays comparable.
    fn uncatalyzed_ts_stages(&mut self, records: &[ResultRecord], catalyst: Option<&str>) {
        for record in matching(records, Branch::Ts, Category::NoCat, None) {
            let mut species = vec![record.identity.species.clone()];
            if let Some(cat) = catalyst {
                species.push(cat.to_owned());
            }
            self.push_stage(StageKind::TransitionState, species, None);
        }
    }

    /// Resolves and appends one stage; the first species may resolve
    /// variant-specifically, added components always resolve plain.
    fn push_stage(&mut self, kind: StageKind, species: Vec<String>, variant: Option<Variant>) {
        let mut electronic = 0.0;
        let mut gibbs = Some(0.0);
        for (i, name) in species.iter().enumerate() {
            let lookup_variant = if i == 0 { variant } else { None };
            let Some((e, g)) = self.lookup.get(name, lookup_variant) else {
                debug!(species = %name, "stage omitted; no energy for component");
                return;
            };
            electronic += e;
            gibbs = match (gibbs, g) {
                (Some(total), Some(g)) => Some(total + g),
                _ => None,
            };
        }
        let source = if species.len() == 1 { StageSource::Direct } else { StageSource::Addition };
        self.raw.push(ProfileStage {
            stage: kind,
            variant,
            species,
            electronic_kcal: electronic,
            gibbs_kcal: gibbs,
            source,
        });
    }
}

fn matching<'a>(
    records: &'a [ResultRecord],
    branch: Branch,
    category: Category,
    catalyst: Option<&'a str>,
) -> impl Iterator<Item = &'a ResultRecord> {
    records.iter().filter(move |r| {
        r.identity.branch == branch
            && r.identity.category == category
            && match catalyst {
                Some(cat) => r.identity.catalyst.as_deref() == Some(cat),
                None => true,
            }
    })
}

fn missing_components(present: &[String], all: &[&str]) -> Vec<String> {
    all.iter()
        .filter(|name| !present.iter().any(|p| p == *name))
        .map(|name| (*name).to_owned())
        .collect()
}

/// Variant filtering per energy kind: the three decomposition variants are
/// meant to be compared at one composition, not cherry-picked
/// independently. Per stage group the minimum-energy full variant wins and
/// the polarized/frozen entries are retained only at the same species
/// combination; groups with variants but no full entry keep every variant
/// of the minimum stage's composition; variant-free entries keep their
/// minimum.
fn filter_stages(
    stages: &[ProfileStage],
    energy: impl Fn(&ProfileStage) -> Option<f64>,
) -> Vec<ProfileStage> {
    if !stages.iter().any(|s| energy(s).is_some()) {
        debug!("profile filtering skipped; no stage carries this energy kind");
        return Vec::new();
    }

    let value = |stage: &ProfileStage| energy(stage).unwrap_or(f64::INFINITY);

    let mut kinds: Vec<StageKind> = Vec::new();
    for stage in stages {
        if !kinds.contains(&stage.stage) {
            kinds.push(stage.stage);
        }
    }

    let mut filtered = Vec::new();
    for kind in kinds {
        let group: Vec<&ProfileStage> = stages.iter().filter(|s| s.stage == kind).collect();
        let with_variant: Vec<&ProfileStage> =
            group.iter().copied().filter(|s| s.variant.is_some()).collect();
        let plain: Vec<&ProfileStage> =
            group.iter().copied().filter(|s| s.variant.is_none()).collect();

        if !with_variant.is_empty() {
            let full: Vec<&ProfileStage> = with_variant
                .iter()
                .copied()
                .filter(|s| s.variant == Some(Variant::FullCat))
                .collect();
            if let Some(best_full) = full
                .iter()
                .copied()
                .min_by(|a, b| value(a).total_cmp(&value(b)))
            {
                filtered.push((*best_full).clone());
                for variant in [Variant::PolCat, Variant::FrzCat] {
                    if let Some(matched) = with_variant.iter().copied().find(|s| {
                        s.variant == Some(variant) && s.species == best_full.species
                    }) {
                        filtered.push(matched.clone());
                    }
                }
            } else if let Some(best) = with_variant
                .iter()
                .copied()
                .min_by(|a, b| value(a).total_cmp(&value(b)))
            {
                warn!(stage = best.stage.as_str(), "variant group without a full entry");
                for stage in with_variant.iter().copied().filter(|s| s.species == best.species) {
                    filtered.push(stage.clone());
                }
            }
        }
        if let Some(best_plain) = plain
            .iter()
            .copied()
            .min_by(|a, b| value(a).total_cmp(&value(b)))
        {
            filtered.push(best_plain.clone());
        }
    }
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::identity::{CalculationIdentity, MethodCombo, Mode, TS_COMPLEX};
    use crate::core::models::record::{Quantity, ResultRecord};
    use crate::core::units::EnergyUnit;
    use approx::assert_relative_eq;

    fn network(products: &[&str]) -> ReactionNetworkConfig {
        let mut toml = String::from(
            "[[methods]]\nname = \"HF\"\nbasis_sets = [\"sto-3g\"]\n\n\
             [[reactants]]\nname = \"A\"\n\n[[reactants]]\nname = \"B\"\n\n\
             [[catalysts]]\nname = \"C\"\n",
        );
        for p in products {
            toml.push_str(&format!("\n[[products]]\nname = \"{p}\"\n"));
        }
        ReactionNetworkConfig::from_toml_str(&toml).unwrap()
    }

    fn record(
        species: &str,
        components: &[&str],
        category: Category,
        branch: Branch,
        variant: Option<Variant>,
        catalyst: Option<&str>,
        e_kcal: f64,
        gibbs: Option<f64>,
    ) -> ResultRecord {
        ResultRecord {
            identity: CalculationIdentity {
                species: species.into(),
                components: components.iter().map(|s| (*s).to_owned()).collect(),
                category,
                branch,
                variant,
                mode: Mode::Opt,
                combo: MethodCombo {
                    method: "HF".into(),
                    basis: "sto-3g".into(),
                    dispersion: None,
                    solvent: None,
                },
                sp_combo: None,
                catalyst: catalyst.map(str::to_owned),
            },
            electronic_energy: Quantity::energy(e_kcal, EnergyUnit::KcalPerMol),
            energy_fallback: false,
            enthalpy_corr: None,
            entropy_corr: None,
            correction_fallback: false,
            temperature_k: None,
            pressure_atm: None,
            zero_point_energy: None,
            imaginary_frequencies: None,
            convergence: None,
            qrrho: None,
            base_energy: None,
            cds: None,
            bsse: None,
            enthalpy: None,
            gibbs,
        }
    }

    fn single(species: &str, e: f64) -> ResultRecord {
        record(
            species,
            &[species],
            Category::NoCat,
            Branch::Reactants,
            None,
            None,
            e,
            Some(e + 1.0),
        )
    }

    #[test]
    fn reactants_resolve_by_addition_when_no_combined_record_exists() {
        let cfg = network(&[]);
        let records = vec![
            single("A", -10.0),
            single("B", -20.0),
            record("C", &["C"], Category::Cat, Branch::Cat, None, Some("C"), -30.0, Some(-29.0)),
        ];
        let profiles = assemble(&cfg, &records);

        let uncat = profiles.iter().find(|p| p.catalyst.is_none()).unwrap();
        let stage = &uncat.raw[0];
        assert_eq!(stage.stage, StageKind::Reactants);
        assert_eq!(stage.source, StageSource::Addition);
        assert_eq!(stage.species, vec!["A".to_owned(), "B".to_owned()]);
        assert_relative_eq!(stage.electronic_kcal, -30.0, epsilon = 1e-12);

        let cat = profiles.iter().find(|p| p.catalyst.as_deref() == Some("C")).unwrap();
        let stage = &cat.raw[0];
        assert_eq!(stage.species, vec!["A".to_owned(), "B".to_owned(), "C".to_owned()]);
        assert_relative_eq!(stage.electronic_kcal, -60.0, epsilon = 1e-12);
        assert_eq!(stage.source, StageSource::Addition);
    }

    #[test]
    fn combined_record_resolves_directly_alongside_the_addition_stage() {
        let cfg = network(&[]);
        let records = vec![
            single("A", -10.0),
            single("B", -20.0),
            record("A-B", &["A", "B"], Category::NoCat, Branch::Reactants, None, None, -32.0, Some(-31.0)),
        ];
        let profiles = assemble(&cfg, &records);
        let uncat = profiles.iter().find(|p| p.catalyst.is_none()).unwrap();

        let reactant_stages: Vec<_> =
            uncat.raw.iter().filter(|s| s.stage == StageKind::Reactants).collect();
        assert_eq!(reactant_stages.len(), 2);
        assert!(reactant_stages
            .iter()
            .any(|s| s.source == StageSource::Direct && s.species == vec!["A-B".to_owned()]));
        // Filtering keeps the minimum-energy composition.
        assert_eq!(uncat.by_electronic.len(), 1);
        assert_relative_eq!(uncat.by_electronic[0].electronic_kcal, -32.0, epsilon = 1e-12);
    }

    #[test]
    fn stages_without_resolvable_energy_are_omitted() {
        let cfg = network(&[]);
        // No record for B: neither reactant stage can resolve.
        let records = vec![single("A", -10.0)];
        let profiles = assemble(&cfg, &records);
        assert!(profiles.iter().all(|p| p
            .raw
            .iter()
            .all(|s| s.stage != StageKind::Reactants || !s.species.contains(&"B".to_owned()))));
    }

    #[test]
    fn variant_filtering_keeps_pol_frz_only_at_the_full_minimum_composition() {
        let cfg = network(&[]);
        let mut records = vec![single("A", -10.0), single("B", -20.0)];
        let pre = |species: &str, comps: &[&str], variant, e| {
            record(species, comps, Category::Cat, Branch::PreTs, Some(variant), Some("C"), e, None)
        };
        // Composition X = C-A-B carries the minimal full entry; composition
        // Y = C-A carries a lower polarized entry that must NOT be kept.
        records.push(pre("C-A-B", &["C", "A", "B"], Variant::FullCat, -100.0));
        records.push(pre("C-A-B", &["C", "A", "B"], Variant::PolCat, -90.0));
        records.push(pre("C-A-B", &["C", "A", "B"], Variant::FrzCat, -80.0));
        records.push(pre("C-A", &["C", "A"], Variant::FullCat, -70.0));
        records.push(pre("C-A", &["C", "A"], Variant::PolCat, -200.0));

        let profiles = assemble(&cfg, &records);
        let cat = profiles.iter().find(|p| p.catalyst.as_deref() == Some("C")).unwrap();

        let pre_filtered: Vec<_> = cat
            .by_electronic
            .iter()
            .filter(|s| s.stage == StageKind::PreTs)
            .collect();
        assert_eq!(pre_filtered.len(), 3);
        assert!(pre_filtered.iter().all(|s| s.species[0] == "C-A-B"));
        let full = pre_filtered.iter().find(|s| s.variant == Some(Variant::FullCat)).unwrap();
        assert_relative_eq!(full.electronic_kcal, -100.0, epsilon = 1e-12);
        assert!(pre_filtered
            .iter()
            .any(|s| s.variant == Some(Variant::PolCat) && s.electronic_kcal == -90.0));
    }

    #[test]
    fn catalyzed_pathway_orders_stages_and_adds_free_catalyst_to_uncatalyzed_ts() {
        let cfg = network(&["P"]);
        let records = vec![
            single("A", -10.0),
            single("B", -20.0),
            record("C", &["C"], Category::Cat, Branch::Cat, None, Some("C"), -5.0, Some(-4.0)),
            record(TS_COMPLEX, &[], Category::NoCat, Branch::Ts, None, None, -25.0, Some(-24.0)),
            record(
                "ts_C-tscomplex",
                &[],
                Category::Cat,
                Branch::Ts,
                Some(Variant::FullCat),
                Some("C"),
                -45.0,
                None,
            ),
            record("P", &["P"], Category::NoCat, Branch::Products, None, None, -40.0, Some(-39.0)),
        ];
        let profiles = assemble(&cfg, &records);
        let cat = profiles.iter().find(|p| p.catalyst.as_deref() == Some("C")).unwrap();

        let kinds: Vec<StageKind> = cat.raw.iter().map(|s| s.stage).collect();
        let mut sorted = kinds.clone();
        sorted.sort();
        assert_eq!(kinds, sorted, "stages appear in reaction order");

        let ts_stages: Vec<_> =
            cat.raw.iter().filter(|s| s.stage == StageKind::TransitionState).collect();
        assert!(ts_stages.iter().any(|s| s.species == vec!["ts_C-tscomplex".to_owned()]));
        assert!(ts_stages
            .iter()
            .any(|s| s.species == vec![TS_COMPLEX.to_owned(), "C".to_owned()]));
    }

    #[test]
    fn gibbs_filtering_is_empty_when_no_stage_carries_g() {
        let cfg = network(&[]);
        let records = vec![
            record("A", &["A"], Category::NoCat, Branch::Reactants, None, None, -10.0, None),
            record("B", &["B"], Category::NoCat, Branch::Reactants, None, None, -20.0, None),
        ];
        let profiles = assemble(&cfg, &records);
        let uncat = profiles.iter().find(|p| p.catalyst.is_none()).unwrap();
        assert!(!uncat.by_electronic.is_empty());
        assert!(uncat.by_gibbs.is_empty());
    }
}
