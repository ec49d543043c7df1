//! Combinatorial enumeration of the calculation universe.
//!
//! One pure pass over the configuration yields every calculation the
//! campaign requires, in a fixed, reproducible order. The same enumeration
//! backs input generation, status checking, and extraction, so the three can
//! never disagree about what exists. Identities are re-derived on every run;
//! nothing is persisted.

use crate::core::models::identity::{
    Branch, CalculationIdentity, Category, MethodCombo, Mode, Variant, TS_COMPLEX,
};
use crate::core::models::network::{ReactionNetworkConfig, SpeciesSpec};
use std::collections::HashMap;

/// An enumerated calculation: the identity plus the indices of the method
/// and basis entry that produced it (needed by input synthesis, which wants
/// the raw, unsanitized spellings).
#[derive(Debug, Clone, PartialEq)]
pub struct EnumeratedCalculation {
    pub identity: CalculationIdentity,
    pub method_idx: usize,
    pub basis_idx: usize,
}

/// Methods and basis sets grouped by their shared opt-level combo. Each
/// group emits one optimization per species slot, followed by every
/// single-point refinement configured on top of that optimization.
struct OptGroup {
    combo: MethodCombo,
    method_idx: usize,
    basis_idx: usize,
    sp_configs: Vec<(usize, usize)>,
}

fn opt_groups(config: &ReactionNetworkConfig) -> Vec<OptGroup> {
    let mut groups: Vec<OptGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (mi, method) in config.methods.iter().enumerate() {
        for (bi, basis) in method.basis_sets.iter().enumerate() {
            let combo = MethodCombo::opt_of(method, basis);
            let key = combo.folder_name();
            let gi = *index.entry(key).or_insert_with(|| {
                groups.push(OptGroup {
                    combo,
                    method_idx: mi,
                    basis_idx: bi,
                    sp_configs: Vec::new(),
                });
                groups.len() - 1
            });
            if method.name.sp_enabled() && basis.sp_enabled() {
                groups[gi].sp_configs.push((mi, bi));
            }
        }
    }
    groups
}

/// Combinations of `species`, sizes `min_len..=len`, preserving
/// configuration order so paths are reproducible across runs.
fn combinations(species: &[&SpeciesSpec], min_len: usize) -> Vec<Vec<String>> {
    fn pick(names: &[&str], start: usize, size: usize, current: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
        if current.len() == size {
            out.push(current.clone());
            return;
        }
        for i in start..names.len() {
            current.push(names[i].to_owned());
            pick(names, i + 1, size, current, out);
            current.pop();
        }
    }

    let names: Vec<&str> = species.iter().map(|s| s.name()).collect();
    let mut out = Vec::new();
    for size in min_len..=names.len() {
        pick(&names, 0, size, &mut Vec::with_capacity(size), &mut out);
    }
    out
}

struct SpeciesSlot<'a> {
    species: String,
    components: Vec<String>,
    category: Category,
    branch: Branch,
    variant: Option<Variant>,
    catalyst: Option<&'a str>,
}

/// Produces the complete, duplicate-free, order-stable calculation set for
/// a configuration.
pub fn enumerate(config: &ReactionNetworkConfig) -> Vec<EnumeratedCalculation> {
    let groups = opt_groups(config);
    let mut out = Vec::new();

    let mut emit = |slot: &SpeciesSlot| {
        for group in &groups {
            let opt_identity = CalculationIdentity {
                species: slot.species.clone(),
                components: slot.components.clone(),
                category: slot.category,
                branch: slot.branch,
                variant: slot.variant,
                mode: Mode::Opt,
                combo: group.combo.clone(),
                sp_combo: None,
                catalyst: slot.catalyst.map(str::to_owned),
            };
            out.push(EnumeratedCalculation {
                identity: opt_identity.clone(),
                method_idx: group.method_idx,
                basis_idx: group.basis_idx,
            });
            for &(mi, bi) in &group.sp_configs {
                let method = &config.methods[mi];
                let basis = &method.basis_sets[bi];
                let sp_combo = MethodCombo::sp_of(method, basis)
                    .expect("sp_configs only holds sp-enabled pairs");
                out.push(EnumeratedCalculation {
                    identity: CalculationIdentity {
                        mode: Mode::Sp,
                        sp_combo: Some(sp_combo),
                        ..opt_identity.clone()
                    },
                    method_idx: mi,
                    basis_idx: bi,
                });
            }
        }
    };

    let single = |spec: &SpeciesSpec, branch: Branch| SpeciesSlot {
        species: spec.name().to_owned(),
        components: vec![spec.name().to_owned()],
        category: Category::NoCat,
        branch,
        variant: None,
        catalyst: None,
    };

    // Individual reactants and products, then the uncatalyzed transition
    // state.
    for spec in &config.reactants {
        emit(&single(spec, Branch::Reactants));
    }
    for spec in &config.products {
        emit(&single(spec, Branch::Products));
    }
    emit(&SpeciesSlot {
        species: TS_COMPLEX.to_owned(),
        components: Vec::new(),
        category: Category::NoCat,
        branch: Branch::Ts,
        variant: None,
        catalyst: None,
    });

    // Pre-formed complexes: every size-≥2 combination of included species.
    let included_reactants: Vec<&SpeciesSpec> = config.included_reactants().collect();
    if included_reactants.len() > 1 {
        for combo in combinations(&included_reactants, 2) {
            emit(&SpeciesSlot {
                species: combo.join("-"),
                components: combo,
                category: Category::NoCat,
                branch: Branch::Reactants,
                variant: None,
                catalyst: None,
            });
        }
    }
    let included_products: Vec<&SpeciesSpec> = config.included_products().collect();
    if config.product_complexes && included_products.len() > 1 {
        for combo in combinations(&included_products, 2) {
            emit(&SpeciesSlot {
                species: combo.join("-"),
                components: combo,
                category: Category::NoCat,
                branch: Branch::Products,
                variant: None,
                catalyst: None,
            });
        }
    }

    // Catalytic branches: the catalyst alone, catalyst+reactant subsets
    // before the transition state, catalyst+product subsets after it, and
    // the catalytic transition state, each across the three decomposition
    // variants.
    for catalyst in &config.catalysts {
        let cat = catalyst.name();
        emit(&SpeciesSlot {
            species: cat.to_owned(),
            components: vec![cat.to_owned()],
            category: Category::Cat,
            branch: Branch::Cat,
            variant: None,
            catalyst: Some(cat),
        });

        for combo in combinations(&included_reactants, 1) {
            let mut components = vec![cat.to_owned()];
            components.extend(combo.iter().cloned());
            let species = format!("{cat}-{}", combo.join("-"));
            for variant in Variant::ALL {
                emit(&SpeciesSlot {
                    species: species.clone(),
                    components: components.clone(),
                    category: Category::Cat,
                    branch: Branch::PreTs,
                    variant: Some(variant),
                    catalyst: Some(cat),
                });
            }
        }

        for combo in combinations(&included_products, 1) {
            let mut components = vec![cat.to_owned()];
            components.extend(combo.iter().cloned());
            let species = format!("{cat}-{}", combo.join("-"));
            for variant in Variant::ALL {
                emit(&SpeciesSlot {
                    species: species.clone(),
                    components: components.clone(),
                    category: Category::Cat,
                    branch: Branch::PostTs,
                    variant: Some(variant),
                    catalyst: Some(cat),
                });
            }
        }

        for variant in Variant::ALL {
            emit(&SpeciesSlot {
                species: format!("ts_{cat}-{TS_COMPLEX}"),
                components: Vec::new(),
                category: Category::Cat,
                branch: Branch::Ts,
                variant: Some(variant),
                catalyst: Some(cat),
            });
        }
    }

    out
}
