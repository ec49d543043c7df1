//! Canonical calculation identities and their on-disk locations.
//!
//! Every calculation in the campaign is addressed by a
//! [`CalculationIdentity`]: species combination, category, branch,
//! decomposition variant, mode, and method combo. The identity alone
//! determines the calculation's relative path; path derivation is pure and
//! re-derived on every run so no hidden state can drift from the
//! configuration.
//!
//! The directory scheme, shared by input generation, status checking, and
//! extraction:
//!
//! ```text
//! {method}[_{dispersion}]_{basis}[_{solvent}]/
//! ├── no_cat/
//! │   ├── reactants/{species}/{species}_opt.in
//! │   │                └── {sp_combo}_sp/{species}_sp.in
//! │   ├── products/...
//! │   └── ts/tscomplex_opt.in
//! └── {catalyst}/
//!     ├── cat/{catalyst}_opt.in
//!     ├── preTS/{species}/{variant}/preTS_{species}_{variant}_opt.in
//!     ├── postTS/{species}/{variant}/postTS_{species}_{variant}_opt.in
//!     └── ts/{variant}/ts_{catalyst}-tscomplex_{variant}_opt.in
//! ```

use crate::core::models::network::{DualValue, MethodSpec};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Species name used for the uncatalyzed transition-state complex.
pub const TS_COMPLEX: &str = "tscomplex";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    NoCat,
    Cat,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::NoCat => "no_cat",
            Category::Cat => "cat",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Branch {
    Reactants,
    Products,
    Ts,
    PreTs,
    PostTs,
    Cat,
}

impl Branch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Branch::Reactants => "reactants",
            Branch::Products => "products",
            Branch::Ts => "ts",
            Branch::PreTs => "preTS",
            Branch::PostTs => "postTS",
            Branch::Cat => "cat",
        }
    }

    /// Whether optimizations on this branch are expected to converge to a
    /// transition state (exactly one imaginary frequency) rather than a
    /// minimum.
    pub fn expects_transition_state(&self) -> bool {
        matches!(self, Branch::Ts)
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Energy-decomposition variant of a catalytic calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Variant {
    FullCat,
    PolCat,
    FrzCat,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::FullCat, Variant::PolCat, Variant::FrzCat];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::FullCat => "full_cat",
            Variant::PolCat => "pol_cat",
            Variant::FrzCat => "frz_cat",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Mode {
    Opt,
    Sp,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Opt => "opt",
            Mode::Sp => "sp",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named combination of method, dispersion, basis set, and solvent, in
/// sanitized path form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MethodCombo {
    pub method: String,
    pub basis: String,
    pub dispersion: Option<String>,
    pub solvent: Option<String>,
}

impl MethodCombo {
    /// The opt-level combo of a (method, basis) pair; names the top-level
    /// folder of everything derived from that pair.
    pub fn opt_of(method: &MethodSpec, basis: &DualValue) -> Self {
        Self {
            method: method.name.opt().to_owned(),
            basis: basis.opt().to_owned(),
            dispersion: method.dispersion.opt().map(str::to_owned),
            solvent: method.solvent.opt().map(str::to_owned),
        }
    }

    /// The sp-level combo, present only when both the method name and the
    /// basis set declare a single-point configuration.
    pub fn sp_of(method: &MethodSpec, basis: &DualValue) -> Option<Self> {
        let name = method.name.sp()?;
        let basis_sp = basis.sp()?;
        Some(Self {
            method: name.to_owned(),
            basis: basis_sp.to_owned(),
            dispersion: method.dispersion.sp().map(str::to_owned),
            solvent: method.solvent.sp().map(str::to_owned),
        })
    }

    /// Folder name: `method[_dispersion]_basis[_solvent]`, absent attributes
    /// skipped.
    pub fn folder_name(&self) -> String {
        let mut parts: Vec<&str> = vec![&self.method];
        if let Some(d) = self.dispersion.as_deref() {
            parts.push(d);
        }
        parts.push(&self.basis);
        if let Some(s) = self.solvent.as_deref() {
            parts.push(s);
        }
        parts.join("_")
    }
}

/// The canonical identity of one calculation. The tuple (species, category,
/// branch, variant, method combo, mode) uniquely determines the relative
/// path; the enumerator never emits two identities with the same path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationIdentity {
    /// Dash-joined species combination string (`"BPh3-nitrone-alkene"`).
    pub species: String,
    /// Constituent species names of the combination, catalyst first for
    /// catalytic branches. Empty for the opaque `tscomplex` species.
    pub components: Vec<String>,
    pub category: Category,
    pub branch: Branch,
    pub variant: Option<Variant>,
    pub mode: Mode,
    /// Opt-level method combo (names the top-level folder).
    pub combo: MethodCombo,
    /// Sp-level combo; `Some` exactly when `mode == Sp`.
    pub sp_combo: Option<MethodCombo>,
    pub catalyst: Option<String>,
}

impl CalculationIdentity {
    /// File stem without the mode suffix.
    fn base_stem(&self) -> String {
        match (self.category, self.branch) {
            (Category::Cat, Branch::PreTs) | (Category::Cat, Branch::PostTs) => {
                let variant = self.variant.expect("catalytic branch carries a variant");
                format!("{}_{}_{}", self.branch, self.species, variant)
            }
            (Category::Cat, Branch::Ts) => {
                let variant = self.variant.expect("catalytic branch carries a variant");
                format!("{}_{}", self.species, variant)
            }
            _ => self.species.clone(),
        }
    }

    /// File stem including the mode suffix (`foo_opt`, `foo_sp`).
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.base_stem(), self.mode)
    }

    fn sp_folder(&self) -> Option<String> {
        self.sp_combo.as_ref().map(|c| format!("{}_sp", c.folder_name()))
    }

    /// Relative path of the input file under the system directory.
    pub fn input_rel_path(&self) -> PathBuf {
        let mut path = PathBuf::from(self.combo.folder_name());
        match self.category {
            Category::NoCat => {
                path.push("no_cat");
                path.push(self.branch.as_str());
                if !matches!(self.branch, Branch::Ts) {
                    path.push(&self.species);
                }
            }
            Category::Cat => {
                let catalyst = self.catalyst.as_deref().expect("catalytic identity names a catalyst");
                path.push(catalyst);
                path.push(self.branch.as_str());
                match self.branch {
                    Branch::PreTs | Branch::PostTs => {
                        path.push(&self.species);
                        path.push(self.variant.expect("catalytic branch carries a variant").as_str());
                    }
                    Branch::Ts => {
                        path.push(self.variant.expect("catalytic branch carries a variant").as_str());
                    }
                    Branch::Cat => {}
                    other => unreachable!("branch {other} is not catalytic"),
                }
            }
        }
        if let Some(sp_folder) = self.sp_folder() {
            path.push(sp_folder);
        }
        path.push(format!("{}.in", self.file_stem()));
        path
    }

    /// Relative path of the tool's primary output stream.
    pub fn output_rel_path(&self) -> PathBuf {
        self.input_rel_path().with_extension("out")
    }

    /// Relative path of the tool's error stream.
    pub fn error_rel_path(&self) -> PathBuf {
        self.input_rel_path().with_extension("err")
    }

    /// The optimization this single point depends on: same identity with the
    /// sp refinement stripped. `None` for optimizations themselves.
    pub fn opt_counterpart(&self) -> Option<CalculationIdentity> {
        match self.mode {
            Mode::Opt => None,
            Mode::Sp => Some(CalculationIdentity {
                mode: Mode::Opt,
                sp_combo: None,
                ..self.clone()
            }),
        }
    }
}
