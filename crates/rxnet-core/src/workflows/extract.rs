//! Batch result extraction over the enumerated calculation set.
//!
//! A best-effort pass: no calculation's failure aborts its siblings.
//! Optimizations are processed before their dependent single points within
//! each method-combo group, and the optimization's output text is cached
//! only for the lifetime of that group's processing (the single point needs
//! it for the solvent-correction components).

use crate::core::io::text::read_optional;
use crate::core::models::identity::Mode;
use crate::core::models::network::ReactionNetworkConfig;
use crate::core::models::record::ResultRecord;
use crate::engine::enumerate::{enumerate, EnumeratedCalculation};
use crate::engine::extract::{extract_opt, extract_sp};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::status::{status_for_input, JobState, JobStatus};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Which lifecycle states are eligible for extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractCriteria {
    /// Any calculation with an output file.
    All,
    /// Only calculations classifying as the given state (default:
    /// `SUCCESSFUL`, with the enhanced validation applied to
    /// optimizations).
    State(JobState),
}

impl Default for ExtractCriteria {
    fn default() -> Self {
        ExtractCriteria::State(JobState::Successful)
    }
}

impl ExtractCriteria {
    fn matches(&self, status: &JobStatus) -> bool {
        match self {
            ExtractCriteria::All => true,
            ExtractCriteria::State(state) => status.state == *state,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Calculations whose input file exists.
    pub processed: usize,
    /// Records successfully produced.
    pub extracted: usize,
    /// Calculations skipped by criteria or missing output.
    pub skipped: usize,
    /// Calculations whose output failed to yield a record.
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct ExtractionOutcome {
    pub records: Vec<ResultRecord>,
    pub stats: ExtractionStats,
}

/// Extracts a flat record list from every enumerated calculation matching
/// `criteria`.
pub fn run(
    config: &ReactionNetworkConfig,
    system_dir: &Path,
    criteria: ExtractCriteria,
    reporter: &ProgressReporter,
) -> ExtractionOutcome {
    let all = enumerate(config);
    info!(total = all.len(), "Extraction started.");
    reporter.report(Progress::TaskStart { total_steps: all.len() as u64 });

    // Group by opt-level combo, preserving enumeration order within each
    // group (which keeps every optimization ahead of its single points).
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<&EnumeratedCalculation>> = HashMap::new();
    for calc in &all {
        let key = calc.identity.combo.folder_name();
        groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Vec::new()
        }).push(calc);
    }

    let mut outcome = ExtractionOutcome::default();
    for key in &order {
        let mut opt_text_cache: HashMap<PathBuf, Option<String>> = HashMap::new();
        for &calc in &groups[key] {
            extract_one(calc, system_dir, criteria, &mut opt_text_cache, &mut outcome);
            reporter.report(Progress::TaskIncrement);
        }
        // opt_text_cache drops here; nothing outlives its group.
    }

    reporter.report(Progress::TaskFinish);
    info!(
        extracted = outcome.stats.extracted,
        failed = outcome.stats.failed,
        "Extraction finished."
    );
    outcome
}

fn extract_one(
    calc: &EnumeratedCalculation,
    system_dir: &Path,
    criteria: ExtractCriteria,
    opt_text_cache: &mut HashMap<PathBuf, Option<String>>,
    outcome: &mut ExtractionOutcome,
) {
    let identity = &calc.identity;
    let input = system_dir.join(identity.input_rel_path());
    if !input.exists() {
        outcome.stats.skipped += 1;
        return;
    }
    outcome.stats.processed += 1;

    // Enhanced validation gates optimizations: a tool-reported success that
    // contradicts the branch expectation must not feed the profiles.
    let validate = (identity.mode == Mode::Opt).then_some(identity.branch);
    let status = status_for_input(&input, validate);
    if !criteria.matches(&status) {
        outcome.stats.skipped += 1;
        return;
    }

    let Some(content) = read_optional(&input.with_extension("out")) else {
        outcome.stats.skipped += 1;
        return;
    };

    let result = match identity.mode {
        Mode::Opt => extract_opt(&content, identity),
        Mode::Sp => {
            // The optimization text is needed only for solvated refinements;
            // read it at most once per group.
            let solvated = identity
                .sp_combo
                .as_ref()
                .is_some_and(|combo| combo.solvent.is_some());
            let opt_text = if solvated {
                identity.opt_counterpart().and_then(|opt| {
                    let rel = opt.output_rel_path();
                    opt_text_cache
                        .entry(rel.clone())
                        .or_insert_with(|| read_optional(&system_dir.join(&rel)))
                        .clone()
                })
            } else {
                None
            };
            extract_sp(&content, opt_text.as_deref(), identity)
        }
    };

    match result {
        Ok(record) => {
            outcome.stats.extracted += 1;
            outcome.records.push(record);
        }
        Err(e) => {
            outcome.stats.failed += 1;
            warn!(
                calculation = %identity.input_rel_path().display(),
                error = %e,
                "record dropped"
            );
        }
    }
}
