//! The immutable reaction-network configuration.
//!
//! Loaded once from a TOML description of the reaction network and the
//! computational method matrix, normalized (names sanitized for path use,
//! `"false"` placeholders collapsed to `None`), and then shared read-only by
//! the enumerator, the status workflow, and the extraction pipeline.

use crate::core::utils::sanitize::sanitize;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(String),
    #[error("I/O error reading configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("Error parsing TOML configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Configuration list must not be empty: {0}")]
    EmptyList(&'static str),
}

/// A configuration attribute carrying an optimization value and an optional,
/// distinct single-point value. Both the raw spelling (used when rendering
/// input files) and the sanitized spelling (used in paths) are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DualValue {
    raw_opt: String,
    raw_sp: Option<String>,
    opt: String,
    sp: Option<String>,
}

impl DualValue {
    pub fn new(raw_opt: impl Into<String>, raw_sp: Option<String>) -> Self {
        let raw_opt = raw_opt.into();
        let raw_sp = raw_sp.filter(|s| is_set(s));
        let opt = sanitize(&raw_opt);
        let sp = raw_sp.as_deref().map(sanitize);
        Self { raw_opt, raw_sp, opt, sp }
    }

    pub fn raw_opt(&self) -> &str {
        &self.raw_opt
    }

    pub fn raw_sp(&self) -> Option<&str> {
        self.raw_sp.as_deref()
    }

    /// Sanitized optimization value, safe for path segments.
    pub fn opt(&self) -> &str {
        &self.opt
    }

    /// Sanitized single-point value, if one was configured.
    pub fn sp(&self) -> Option<&str> {
        self.sp.as_deref()
    }

    pub fn sp_enabled(&self) -> bool {
        self.sp.is_some()
    }
}

/// Like [`DualValue`] but the attribute itself is optional (dispersion,
/// solvent). A raw `"false"` or empty spelling counts as absent; the opt and
/// sp sides are independent (a gas-phase optimization may still refine with
/// a solvated single point).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OptionalDual {
    raw_opt: Option<String>,
    raw_sp: Option<String>,
    opt: Option<String>,
    sp: Option<String>,
}

impl OptionalDual {
    pub fn new(raw_opt: Option<String>, raw_sp: Option<String>) -> Self {
        let raw_opt = raw_opt.filter(|s| is_set(s));
        let raw_sp = raw_sp.filter(|s| is_set(s));
        let opt = raw_opt.as_deref().map(sanitize);
        let sp = raw_sp.as_deref().map(sanitize);
        Self { raw_opt, raw_sp, opt, sp }
    }

    /// Sanitized optimization value, if set.
    pub fn opt(&self) -> Option<&str> {
        self.opt.as_deref()
    }

    /// Sanitized single-point value, if set.
    pub fn sp(&self) -> Option<&str> {
        self.sp.as_deref()
    }

    pub fn raw_opt(&self) -> Option<&str> {
        self.raw_opt.as_deref()
    }

    pub fn raw_sp(&self) -> Option<&str> {
        self.raw_sp.as_deref()
    }
}

fn is_set(s: &str) -> bool {
    !s.is_empty() && !s.eq_ignore_ascii_case("false")
}

/// One computational method entry: functional name, dispersion treatment,
/// implicit-solvent model, and the basis sets it runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSpec {
    pub name: DualValue,
    pub dispersion: OptionalDual,
    pub solvent: OptionalDual,
    pub basis_sets: Vec<DualValue>,
    /// Decomposition-analysis level passed through to single-point inputs.
    pub eda2: u32,
}

/// A reactant, product, or catalyst species.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesSpec {
    raw_name: String,
    name: String,
    pub include: bool,
    pub charge: Option<i32>,
    pub multiplicity: Option<u32>,
}

impl SpeciesSpec {
    pub fn new(raw_name: impl Into<String>) -> Self {
        let raw_name = raw_name.into();
        let name = sanitize(&raw_name);
        Self { raw_name, name, include: true, charge: None, multiplicity: None }
    }

    pub fn raw_name(&self) -> &str {
        &self.raw_name
    }

    /// Sanitized name, safe for path segments.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The normalized, immutable description of the reaction network and the
/// method matrix. Created once at load time and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionNetworkConfig {
    pub reactants: Vec<SpeciesSpec>,
    pub products: Vec<SpeciesSpec>,
    pub catalysts: Vec<SpeciesSpec>,
    pub methods: Vec<MethodSpec>,
    /// Whether size-≥2 product combinations (pre-formed product complexes)
    /// are enumerated alongside the reactant ones.
    pub product_complexes: bool,
}

impl ReactionNetworkConfig {
    /// Loads and normalizes a TOML network description from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Parses and normalizes a TOML network description.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text)?;
        raw.try_into()
    }

    /// Included reactants, in configuration order.
    pub fn included_reactants(&self) -> impl Iterator<Item = &SpeciesSpec> {
        self.reactants.iter().filter(|s| s.include)
    }

    /// Included products, in configuration order.
    pub fn included_products(&self) -> impl Iterator<Item = &SpeciesSpec> {
        self.products.iter().filter(|s| s.include)
    }
}

// ---------------------------------------------------------------------------
// Raw serde models
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDual {
    Single(String),
    Pair {
        opt: String,
        #[serde(default)]
        sp: Option<String>,
    },
}

impl RawDual {
    fn into_parts(self) -> (String, Option<String>) {
        match self {
            RawDual::Single(opt) => (opt, None),
            RawDual::Pair { opt, sp } => (opt, sp),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawMethod {
    name: RawDual,
    #[serde(default)]
    dispersion: Option<RawDual>,
    #[serde(default)]
    solvent: Option<RawDual>,
    basis_sets: Vec<RawDual>,
    #[serde(default = "default_eda2")]
    eda2: u32,
}

fn default_eda2() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct RawSpecies {
    name: String,
    #[serde(default = "default_include")]
    include: bool,
    #[serde(default)]
    charge: Option<i32>,
    #[serde(default)]
    multiplicity: Option<u32>,
}

fn default_include() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    product_complexes: bool,
    methods: Vec<RawMethod>,
    reactants: Vec<RawSpecies>,
    #[serde(default)]
    products: Vec<RawSpecies>,
    #[serde(default)]
    catalysts: Vec<RawSpecies>,
}

impl TryFrom<RawConfig> for ReactionNetworkConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, ConfigError> {
        if raw.methods.is_empty() {
            return Err(ConfigError::EmptyList("methods"));
        }
        if raw.reactants.is_empty() {
            return Err(ConfigError::EmptyList("reactants"));
        }

        let methods = raw
            .methods
            .into_iter()
            .map(|m| {
                let (name_opt, name_sp) = m.name.into_parts();
                if name_opt.is_empty() {
                    return Err(ConfigError::MissingParameter("methods.name"));
                }
                if m.basis_sets.is_empty() {
                    return Err(ConfigError::EmptyList("methods.basis_sets"));
                }
                let (disp_opt, disp_sp) =
                    m.dispersion.map(RawDual::into_parts).map_or((None, None), |(o, s)| (Some(o), s));
                let (solv_opt, solv_sp) =
                    m.solvent.map(RawDual::into_parts).map_or((None, None), |(o, s)| (Some(o), s));
                Ok(MethodSpec {
                    name: DualValue::new(name_opt, name_sp),
                    dispersion: OptionalDual::new(disp_opt, disp_sp),
                    solvent: OptionalDual::new(solv_opt, solv_sp),
                    basis_sets: m
                        .basis_sets
                        .into_iter()
                        .map(|b| {
                            let (opt, sp) = b.into_parts();
                            DualValue::new(opt, sp)
                        })
                        .collect(),
                    eda2: m.eda2,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let species = |raw: Vec<RawSpecies>, what: &'static str| {
            raw.into_iter()
                .map(|s| {
                    if s.name.is_empty() {
                        return Err(ConfigError::MissingParameter(what));
                    }
                    let mut spec = SpeciesSpec::new(s.name);
                    spec.include = s.include;
                    spec.charge = s.charge;
                    spec.multiplicity = s.multiplicity;
                    Ok(spec)
                })
                .collect::<Result<Vec<_>, _>>()
        };

        Ok(ReactionNetworkConfig {
            reactants: species(raw.reactants, "reactants.name")?,
            products: species(raw.products, "products.name")?,
            catalysts: species(raw.catalysts, "catalysts.name")?,
            methods,
            product_complexes: raw.product_complexes,
        })
    }
}
