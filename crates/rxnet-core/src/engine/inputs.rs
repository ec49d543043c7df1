//! Input-file synthesis: coordinate templates, molecule sections, and REM
//! sections composed into complete calculation inputs.
//!
//! Templates live under `{system_dir}/templates/`:
//!
//! ```text
//! templates/
//! ├── base_template.in        {molecule_section} / {rem_section} skeleton
//! ├── molecule/{id}.xyz       coordinates (variant-specific {id}_{variant}.xyz wins)
//! └── rem/
//!     ├── rem_opt_base.rem    {method} {basis} {dispersion} {solvent} {jobtype}
//!     ├── rem_sp_eda_base.rem {method} {basis} {dispersion} {solvent} {eda2} ...
//!     ├── rem_{variant}.rem   appended for decomposition variants
//!     ├── geom_opt.rem        appended for optimizations
//!     └── solvent_{name}.rem  appended when a solvent model is configured
//! ```

use crate::core::io::text::read_optional;
use crate::core::models::identity::{Branch, CalculationIdentity, Category, Mode, Variant};
use crate::core::models::network::{DualValue, MethodSpec};
use crate::engine::cache::TemplateCache;
use crate::engine::error::EngineError;
use crate::engine::patterns;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// A parsed coordinate template: atom count, overall charge and
/// multiplicity, and the raw atom lines.
#[derive(Debug, Clone, PartialEq)]
pub struct XyzTemplate {
    pub n_atoms: usize,
    pub charge: i32,
    pub multiplicity: u32,
    pub atoms: Vec<String>,
}

/// Parses an XYZ template: first line atom count, second line charge and
/// multiplicity, then exactly `n_atoms` atom lines.
pub fn parse_xyz(text: &str, identifier: &str) -> Result<XyzTemplate, EngineError> {
    let malformed = |message: &str| EngineError::Template {
        identifier: identifier.to_owned(),
        message: message.to_owned(),
    };

    let mut lines = text.lines();
    let n_atoms: usize = lines
        .next()
        .and_then(|l| l.trim().parse().ok())
        .ok_or_else(|| malformed("first line must be the atom count"))?;
    let header = lines
        .next()
        .ok_or_else(|| malformed("missing charge/multiplicity line"))?;
    let mut fields = header.split_whitespace();
    let charge: i32 = fields
        .next()
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| malformed("charge must be an integer"))?;
    let multiplicity: u32 = fields
        .next()
        .and_then(|f| f.parse().ok())
        .ok_or_else(|| malformed("multiplicity must be an integer"))?;

    let atoms: Vec<String> = lines.take(n_atoms).map(str::to_owned).collect();
    if atoms.len() < n_atoms {
        return Err(malformed("fewer atom lines than the declared count"));
    }
    Ok(XyzTemplate { n_atoms, charge, multiplicity, atoms })
}

/// Final geometry of an optimization output: coordinate lines of the last
/// `Standard Nuclear Orientation` block, reformatted as template atom lines.
pub fn final_geometry(out_text: &str) -> Option<Vec<String>> {
    let last = patterns::NUCLEAR_ORIENTATION.find_iter(out_text).last()?;
    let block = &out_text[last.start()..];
    let atoms: Vec<String> = patterns::COORD_LINE
        .captures_iter(block)
        .filter_map(|caps| {
            let x: f64 = caps[2].parse().ok()?;
            let y: f64 = caps[3].parse().ok()?;
            let z: f64 = caps[4].parse().ok()?;
            Some(format!("{}   {:14.10}   {:14.10}   {:14.10}", &caps[1], x, y, z))
        })
        .collect();
    if atoms.is_empty() { None } else { Some(atoms) }
}

/// Substitutes `{key}` placeholders. Unknown placeholders are left intact;
/// the external tool's own `$`-sections never collide with this syntax.
pub fn render(template: &str, substitutions: &[(&str, &str)]) -> String {
    let mut out = template.to_owned();
    for (key, value) in substitutions {
        let placeholder = format!("{{{key}}}");
        if out.contains(&placeholder) {
            out = out.replace(&placeholder, value);
        }
    }
    out
}

/// Standard molecule section: charge, multiplicity, atom lines. `coords`
/// overrides the template coordinates (single-point geometry refresh).
pub fn standard_molecule_section(template: &XyzTemplate, coords: Option<&[String]>) -> String {
    let atoms = coords.unwrap_or(&template.atoms);
    let mut section = format!("{} {}\n", template.charge, template.multiplicity);
    section.push_str(&atoms.join("\n"));
    section
}

/// Fragmented molecule section for decomposition calculations: overall
/// system header, then catalyst and substrate fragments split by their
/// template atom counts.
pub fn fragmented_molecule_section(
    species: &str,
    composite: &XyzTemplate,
    catalyst: &XyzTemplate,
    substrate: &XyzTemplate,
    coords: Option<&[String]>,
) -> Result<String, EngineError> {
    let atoms = coords.unwrap_or(&composite.atoms);
    let expected = catalyst.n_atoms + substrate.n_atoms;
    if atoms.len() < expected {
        return Err(EngineError::FragmentMismatch {
            species: species.to_owned(),
            expected,
            actual: atoms.len(),
        });
    }
    let (cat_atoms, rest) = atoms.split_at(catalyst.n_atoms);
    let sub_atoms = &rest[..substrate.n_atoms];

    let mut section = String::new();
    let _ = writeln!(section, "{} {}", composite.charge, composite.multiplicity);
    section.push_str("---\n");
    let _ = writeln!(section, "{} {}", catalyst.charge, catalyst.multiplicity);
    section.push_str(&cat_atoms.join("\n"));
    section.push('\n');
    section.push_str("---\n");
    let _ = writeln!(section, "{} {}", substrate.charge, substrate.multiplicity);
    section.push_str(&sub_atoms.join("\n"));
    Ok(section)
}

/// Composes complete input files for enumerated identities. Owns the
/// template cache for the lifetime of one generation pass.
pub struct InputComposer<'a> {
    system_dir: &'a Path,
    cache: TemplateCache,
}

impl<'a> InputComposer<'a> {
    pub fn new(system_dir: &'a Path) -> Self {
        Self { system_dir, cache: TemplateCache::new() }
    }

    fn templates_dir(&self) -> PathBuf {
        self.system_dir.join("templates")
    }

    fn molecule_dir(&self) -> PathBuf {
        self.templates_dir().join("molecule")
    }

    fn rem_dir(&self) -> PathBuf {
        self.templates_dir().join("rem")
    }

    fn read_template(&self, path: &Path) -> Result<String, EngineError> {
        read_optional(path).ok_or_else(|| EngineError::MissingTemplate { path: path.to_path_buf() })
    }

    /// Molecule-template identifier for an identity: pre/post
    /// transition-state templates carry their branch prefix.
    fn template_name(identity: &CalculationIdentity) -> String {
        match identity.branch {
            Branch::PreTs | Branch::PostTs => format!("{}_{}", identity.branch, identity.species),
            _ => identity.species.clone(),
        }
    }

    fn molecule_section(&mut self, identity: &CalculationIdentity) -> Result<String, EngineError> {
        let molecule_dir = self.molecule_dir();
        let name = Self::template_name(identity);
        let variant = identity.variant.map(|v| v.as_str());

        // Single points refine on the optimized geometry when the
        // optimization output is available.
        let coords = identity
            .opt_counterpart()
            .and_then(|opt| read_optional(&self.system_dir.join(opt.output_rel_path())))
            .and_then(|text| final_geometry(&text));

        if identity.variant.is_some() {
            let catalyst_name = identity
                .catalyst
                .clone()
                .ok_or_else(|| EngineError::Template {
                    identifier: name.clone(),
                    message: "decomposition calculation without a catalyst".to_owned(),
                })?;
            let substrate_name = identity
                .species
                .split_once('-')
                .map(|(_, rest)| rest.to_owned())
                .ok_or_else(|| EngineError::Template {
                    identifier: name.clone(),
                    message: "composite species must contain catalyst and substrate".to_owned(),
                })?;

            let composite = self.cache.get_or_load(&molecule_dir, &name, variant)?.clone();
            let catalyst = self.cache.get_or_load(&molecule_dir, &catalyst_name, variant)?.clone();
            let substrate = self.cache.get_or_load(&molecule_dir, &substrate_name, variant)?;
            fragmented_molecule_section(
                &identity.species,
                &composite,
                &catalyst,
                substrate,
                coords.as_deref(),
            )
        } else {
            let template = self.cache.get_or_load(&molecule_dir, &name, None)?;
            Ok(standard_molecule_section(template, coords.as_deref()))
        }
    }

    fn rem_section(
        &mut self,
        identity: &CalculationIdentity,
        method: &MethodSpec,
        basis: &DualValue,
        molecule: &XyzTemplate,
    ) -> Result<String, EngineError> {
        let rem_dir = self.rem_dir();
        match identity.mode {
            Mode::Opt => {
                let mut template = self.read_template(&rem_dir.join("rem_opt_base.rem"))?;
                if let Some(variant) = identity.variant {
                    let extra = self.read_template(&rem_dir.join(format!("rem_{variant}.rem")))?;
                    template.push('\n');
                    template.push_str(&extra);
                }
                let jobtype = if identity.branch.expects_transition_state() {
                    "ts"
                } else if molecule.n_atoms == 1 {
                    "sp"
                } else {
                    "opt"
                };
                Ok(render(
                    &template,
                    &[
                        ("method", method.name.raw_opt()),
                        ("basis", basis.raw_opt()),
                        ("dispersion", method.dispersion.raw_opt().unwrap_or("false")),
                        ("solvent", method.solvent.raw_opt().unwrap_or("false")),
                        ("jobtype", jobtype),
                    ],
                ))
            }
            Mode::Sp => {
                let template = self.read_template(&rem_dir.join("rem_sp_eda_base.rem"))?;
                // Decomposition switches: plain refinements and the lone
                // catalyst run with the analysis disabled.
                let eda2 = if identity.category == Category::NoCat || identity.branch == Branch::Cat
                {
                    0
                } else {
                    method.eda2
                };
                let freeze = if identity.variant == Some(Variant::FrzCat) { "1" } else { "0" };
                let bsse = if identity.variant == Some(Variant::FullCat) { "true" } else { "false" };
                Ok(render(
                    &template,
                    &[
                        ("method", method.name.raw_sp().unwrap_or_else(|| method.name.raw_opt())),
                        ("basis", basis.raw_sp().unwrap_or_else(|| basis.raw_opt())),
                        ("dispersion", method.dispersion.raw_sp().unwrap_or("false")),
                        ("solvent", method.solvent.raw_sp().unwrap_or("false")),
                        ("eda2", &eda2.to_string()),
                        ("scfmi_freeze_ss", freeze),
                        ("eda_bsse", bsse),
                    ],
                ))
            }
        }
    }

    /// Composes the complete input-file content for one identity.
    pub fn compose(
        &mut self,
        identity: &CalculationIdentity,
        method: &MethodSpec,
        basis: &DualValue,
    ) -> Result<String, EngineError> {
        let base_path = self.templates_dir().join("base_template.in");
        let mut base = self.read_template(&base_path)?;

        if identity.mode == Mode::Opt {
            let geom_path = self.rem_dir().join("geom_opt.rem");
            match read_optional(&geom_path) {
                Some(geom) => {
                    base.push_str("\n\n");
                    base.push_str(&geom);
                }
                None => tracing::warn!(path = %geom_path.display(), "geometry template not found"),
            }
        }
        let solvent = match identity.mode {
            Mode::Opt => method.solvent.raw_opt(),
            Mode::Sp => method.solvent.raw_sp(),
        };
        if let Some(solvent) = solvent {
            let solvent_path = self.rem_dir().join(format!("solvent_{solvent}.rem"));
            match read_optional(&solvent_path) {
                Some(extra) => {
                    base.push_str("\n\n");
                    base.push_str(&extra);
                }
                None => tracing::warn!(path = %solvent_path.display(), "solvent template not found"),
            }
        }

        let molecule_section = self.molecule_section(identity)?;
        // REM decisions depend on the parsed composite template (single-atom
        // species optimize as plain single points).
        let molecule_dir = self.molecule_dir();
        let composite = self
            .cache
            .get_or_load(
                &molecule_dir,
                &Self::template_name(identity),
                identity.variant.map(|v| v.as_str()),
            )?
            .clone();
        let rem_section = self.rem_section(identity, method, basis, &composite)?;

        Ok(render(
            &base,
            &[
                ("molecule_section", molecule_section.trim_end()),
                ("rem_section", rem_section.trim_end()),
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::identity::MethodCombo;
    use crate::core::models::network::OptionalDual;

    const WATER: &str = "3\n0 1\nO   0.0 0.0 0.0\nH   0.0 0.0 0.96\nH   0.93 0.0 -0.24\n";

    #[test]
    fn parse_xyz_reads_header_and_atoms() {
        let tpl = parse_xyz(WATER, "water").unwrap();
        assert_eq!(tpl.n_atoms, 3);
        assert_eq!(tpl.charge, 0);
        assert_eq!(tpl.multiplicity, 1);
        assert_eq!(tpl.atoms.len(), 3);
    }

    #[test]
    fn parse_xyz_rejects_short_files() {
        let err = parse_xyz("4\n0 1\nO 0 0 0\n", "broken").unwrap_err();
        assert!(matches!(err, EngineError::Template { .. }));
    }

    #[test]
    fn render_substitutes_known_placeholders_only() {
        let out = render("$rem\n  method {method}\n  thresh {thresh}\n", &[("method", "HF")]);
        assert!(out.contains("method HF"));
        assert!(out.contains("{thresh}"));
    }

    #[test]
    fn standard_section_uses_override_coordinates() {
        let tpl = parse_xyz(WATER, "water").unwrap();
        let coords = vec!["O 1 1 1".to_owned(), "H 2 2 2".to_owned(), "H 3 3 3".to_owned()];
        let section = standard_molecule_section(&tpl, Some(&coords));
        assert!(section.starts_with("0 1\n"));
        assert!(section.contains("O 1 1 1"));
        assert!(!section.contains("0.96"));
    }

    #[test]
    fn fragmented_section_splits_by_template_counts() {
        let composite = parse_xyz("4\n0 1\nHe 0 0 0\nNe 1 1 1\nO 2 2 2\nH 3 3 3\n", "c").unwrap();
        let catalyst = parse_xyz("2\n1 2\nHe 0 0 0\nNe 1 1 1\n", "cat").unwrap();
        let substrate = parse_xyz("2\n-1 1\nO 2 2 2\nH 3 3 3\n", "sub").unwrap();
        let section =
            fragmented_molecule_section("cat-sub", &composite, &catalyst, &substrate, None).unwrap();
        let expected = "0 1\n---\n1 2\nHe 0 0 0\nNe 1 1 1\n---\n-1 1\nO 2 2 2\nH 3 3 3";
        assert_eq!(section, expected);
    }

    #[test]
    fn fragmented_section_rejects_atom_shortfall() {
        let composite = parse_xyz("1\n0 1\nHe 0 0 0\n", "c").unwrap();
        let catalyst = parse_xyz("1\n0 1\nHe 0 0 0\n", "cat").unwrap();
        let substrate = parse_xyz("1\n0 1\nNe 1 1 1\n", "sub").unwrap();
        let err = fragmented_molecule_section("cat-sub", &composite, &catalyst, &substrate, None)
            .unwrap_err();
        assert!(matches!(err, EngineError::FragmentMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn final_geometry_takes_last_orientation_block() {
        let out = "\
 Standard Nuclear Orientation (Angstroms)\n\
    1   O   0.0000000000   0.0000000000   0.0000000000\n\
 intermediate step\n\
 Standard Nuclear Orientation (Angstroms)\n\
    1   O   1.5000000000   0.0000000000   0.0000000000\n\
    2   H   2.5000000000   0.0000000000   0.0000000000\n";
        let atoms = final_geometry(out).unwrap();
        assert_eq!(atoms.len(), 2);
        assert!(atoms[0].starts_with('O'));
        assert!(atoms[0].contains("1.5"));
    }

    #[test]
    fn final_geometry_absent_without_orientation_block() {
        assert!(final_geometry("nothing to see").is_none());
    }

    fn write_template_tree(dir: &Path) {
        let rem = dir.join("templates/rem");
        let mol = dir.join("templates/molecule");
        std::fs::create_dir_all(&rem).unwrap();
        std::fs::create_dir_all(&mol).unwrap();
        std::fs::write(
            dir.join("templates/base_template.in"),
            "$molecule\n{molecule_section}\n$end\n\n$rem\n{rem_section}\n$end\n",
        )
        .unwrap();
        std::fs::write(
            rem.join("rem_opt_base.rem"),
            "  jobtype {jobtype}\n  method {method}\n  basis {basis}\n",
        )
        .unwrap();
        std::fs::write(rem.join("geom_opt.rem"), "$geom_opt\n  maxiter 150\n$end").unwrap();
        std::fs::write(
            rem.join("rem_sp_eda_base.rem"),
            "  jobtype eda\n  method {method}\n  eda2 {eda2}\n  scfmi_freeze_ss {scfmi_freeze_ss}\n  eda_bsse {eda_bsse}\n",
        )
        .unwrap();
        std::fs::write(mol.join("water.xyz"), WATER).unwrap();
    }

    fn method_spec() -> MethodSpec {
        MethodSpec {
            name: DualValue::new("B3LYP", Some("wB97X-V".into())),
            dispersion: OptionalDual::default(),
            solvent: OptionalDual::default(),
            basis_sets: vec![DualValue::new("6-31G", Some("def2-TZVPP".into()))],
            eda2: 2,
        }
    }

    fn water_opt_identity() -> CalculationIdentity {
        CalculationIdentity {
            species: "water".into(),
            components: vec!["water".into()],
            category: Category::NoCat,
            branch: Branch::Reactants,
            variant: None,
            mode: Mode::Opt,
            combo: MethodCombo {
                method: "B3LYP".into(),
                basis: "6-31G".into(),
                dispersion: None,
                solvent: None,
            },
            sp_combo: None,
            catalyst: None,
        }
    }

    #[test]
    fn compose_renders_a_complete_opt_input() {
        let dir = tempfile::tempdir().unwrap();
        write_template_tree(dir.path());
        let method = method_spec();
        let mut composer = InputComposer::new(dir.path());
        let content = composer
            .compose(&water_opt_identity(), &method, &method.basis_sets[0])
            .unwrap();
        assert!(content.contains("$molecule\n0 1\nO   0.0 0.0 0.0"));
        assert!(content.contains("jobtype opt"));
        assert!(content.contains("method B3LYP"));
        assert!(content.contains("$geom_opt"));
    }

    #[test]
    fn compose_sp_uses_sp_method_and_eda_switches() {
        let dir = tempfile::tempdir().unwrap();
        write_template_tree(dir.path());
        let method = method_spec();

        let mut id = water_opt_identity();
        id.mode = Mode::Sp;
        id.sp_combo = Some(MethodCombo {
            method: "wB97X-V".into(),
            basis: "def2-TZVPP".into(),
            dispersion: None,
            solvent: None,
        });

        let mut composer = InputComposer::new(dir.path());
        let content = composer.compose(&id, &method, &method.basis_sets[0]).unwrap();
        assert!(content.contains("method wB97X-V"));
        // Uncatalyzed refinement: decomposition disabled.
        assert!(content.contains("eda2 0"));
        assert!(content.contains("eda_bsse false"));
        assert!(!content.contains("$geom_opt"));
    }

    #[test]
    fn compose_fails_without_molecule_template() {
        let dir = tempfile::tempdir().unwrap();
        write_template_tree(dir.path());
        let method = method_spec();
        let mut id = water_opt_identity();
        id.species = "ghost".into();
        let mut composer = InputComposer::new(dir.path());
        let err = composer.compose(&id, &method, &method.basis_sets[0]).unwrap_err();
        assert!(matches!(err, EngineError::MissingTemplate { .. }));
    }
}
