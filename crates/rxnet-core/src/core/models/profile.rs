//! Assembled reaction-energy profiles.

use crate::core::models::identity::Variant;
use serde::Serialize;

/// How a stage's energy was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StageSource {
    /// A single record covers the stage composition.
    Direct,
    /// Sum over several records (step-wise complex formation).
    Addition,
}

impl StageSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageSource::Direct => "direct",
            StageSource::Addition => "addition",
        }
    }
}

/// Ordered reaction stages of a pathway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum StageKind {
    Reactants,
    PreTs,
    TransitionState,
    PostTs,
    Products,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Reactants => "Reactants",
            StageKind::PreTs => "preTS",
            StageKind::TransitionState => "TS",
            StageKind::PostTs => "postTS",
            StageKind::Products => "Products",
        }
    }
}

/// One row of an assembled pathway profile. Built fresh per extraction run;
/// never mutated afterward.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileStage {
    pub stage: StageKind,
    /// Decomposition variant the contributing record carried, if any.
    pub variant: Option<Variant>,
    /// Contributing species, in resolution order.
    pub species: Vec<String>,
    /// Aggregated electronic energy (kcal/mol).
    pub electronic_kcal: f64,
    /// Aggregated Gibbs energy (kcal/mol); absent when any contributor
    /// lacks G.
    pub gibbs_kcal: Option<f64>,
    pub source: StageSource,
}

impl ProfileStage {
    pub fn species_label(&self) -> String {
        self.species.join(" + ")
    }
}

/// One full reaction route: uncatalyzed, or catalyzed by one catalyst.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathwayProfile {
    /// `None` for the uncatalyzed pathway.
    pub catalyst: Option<String>,
    /// Every resolvable stage, unfiltered.
    pub raw: Vec<ProfileStage>,
    /// Stages filtered per variant-selection rules on electronic energy.
    pub by_electronic: Vec<ProfileStage>,
    /// Stages filtered per variant-selection rules on Gibbs energy; empty
    /// when no stage carries G.
    pub by_gibbs: Vec<ProfileStage>,
}
