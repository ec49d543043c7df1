//! Batch status classification over the enumerated calculation set.
//!
//! Returns plain data grouped by method combo; rendering belongs to the
//! caller. Statuses are recomputed from current file contents on every run.

use crate::core::models::identity::{MethodCombo, Mode};
use crate::core::models::network::ReactionNetworkConfig;
use crate::core::utils::sanitize::desanitize;
use crate::engine::enumerate::enumerate;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::status::{status_for_input, JobState, JobStatus};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Human-readable spellings of the dispersion treatments, keyed by their
/// sanitized configuration names. Longest prefixes first.
static DISPERSION_DISPLAY: &[(&str, &str)] = &[
    ("empirical_grimme3", "D3(0)"),
    ("empirical_grimme", "D2"),
    ("empirical_chg", "CHG"),
    ("d3_zerom", "D3M(0)"),
    ("d3_zero", "D3(0)"),
    ("d3_bjm", "D3M(BJ)"),
    ("d3_bj", "D3(BJ)"),
    ("d3_cso", "D3(CSO)"),
    ("d3_op", "D3(op)"),
    ("d3", "D3"),
    ("d4", "D4"),
];

/// Display name of a method combo: `method-DISP/basis/solvent`, with the
/// dispersion prettified and absent attributes skipped.
pub fn display_method_combo(combo: &MethodCombo) -> String {
    let mut name = desanitize(&combo.method);
    if let Some(disp) = combo.dispersion.as_deref() {
        let lower = disp.to_ascii_lowercase();
        let pretty = DISPERSION_DISPLAY
            .iter()
            .find(|(key, _)| lower.starts_with(key))
            .map(|(_, display)| (*display).to_owned())
            .unwrap_or_else(|| desanitize(disp));
        name.push('-');
        name.push_str(&pretty);
    }
    name.push('/');
    name.push_str(&desanitize(&combo.basis));
    if let Some(solvent) = combo.solvent.as_deref() {
        name.push('/');
        name.push_str(&desanitize(solvent));
    }
    name
}

#[derive(Debug, Clone)]
pub struct StatusRow {
    /// Relative path of the calculation, without the `.in` suffix.
    pub rel_path: PathBuf,
    pub mode: Mode,
    pub status: JobStatus,
}

#[derive(Debug, Clone)]
pub struct GroupReport {
    pub name: String,
    pub rows: Vec<StatusRow>,
    pub counts: BTreeMap<&'static str, usize>,
}

#[derive(Debug, Clone)]
pub struct StatusReport {
    pub groups: Vec<GroupReport>,
    pub overall: BTreeMap<&'static str, usize>,
}

impl StatusReport {
    pub fn total(&self) -> usize {
        self.overall.values().sum()
    }

    pub fn count(&self, state: JobState) -> usize {
        self.overall.get(state.as_str()).copied().unwrap_or(0)
    }
}

/// Classifies every enumerated calculation under `system_dir`, grouped by
/// method combo in enumeration order.
pub fn report(
    config: &ReactionNetworkConfig,
    system_dir: &Path,
    reporter: &ProgressReporter,
) -> StatusReport {
    info!("Status checking started.");
    let all = enumerate(config);
    reporter.report(Progress::TaskStart { total_steps: all.len() as u64 });

    let mut groups: Vec<GroupReport> = Vec::new();
    let mut group_index: BTreeMap<String, usize> = BTreeMap::new();
    let mut overall: BTreeMap<&'static str, usize> = BTreeMap::new();

    for calc in &all {
        let identity = &calc.identity;
        let input = system_dir.join(identity.input_rel_path());
        let status = status_for_input(&input, None);
        reporter.report(Progress::TaskIncrement);

        let name = display_method_combo(&identity.combo);
        let gi = *group_index.entry(name.clone()).or_insert_with(|| {
            groups.push(GroupReport { name, rows: Vec::new(), counts: BTreeMap::new() });
            groups.len() - 1
        });

        *groups[gi].counts.entry(status.state.as_str()).or_insert(0) += 1;
        *overall.entry(status.state.as_str()).or_insert(0) += 1;
        groups[gi].rows.push(StatusRow {
            rel_path: identity.input_rel_path().with_extension(""),
            mode: identity.mode,
            status,
        });
    }

    reporter.report(Progress::TaskFinish);
    info!("Status checking finished.");
    StatusReport { groups, overall }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::text::write_text;

    fn combo(disp: Option<&str>, solv: Option<&str>) -> MethodCombo {
        MethodCombo {
            method: "wB97X-V".into(),
            basis: "def2-TZVPP".into(),
            dispersion: disp.map(str::to_owned),
            solvent: solv.map(str::to_owned),
        }
    }

    #[test]
    fn display_name_prettifies_dispersion() {
        assert_eq!(display_method_combo(&combo(None, None)), "wB97X-V/def2-TZVPP");
        assert_eq!(
            display_method_combo(&combo(Some("d3_bj"), None)),
            "wB97X-V-D3(BJ)/def2-TZVPP"
        );
        assert_eq!(
            display_method_combo(&combo(Some("d3"), Some("smd"))),
            "wB97X-V-D3/def2-TZVPP/smd"
        );
    }

    #[test]
    fn display_name_desanitizes_unmapped_parts() {
        let c = MethodCombo {
            method: "B3LYP-space-mod".into(),
            basis: "6-31+G-asterisk-".into(),
            dispersion: None,
            solvent: None,
        };
        assert_eq!(display_method_combo(&c), "B3LYP mod/6-31+G*");
    }

    #[test]
    fn report_counts_states_per_group_and_overall() {
        let cfg = ReactionNetworkConfig::from_toml_str(
            r#"
            [[methods]]
            name = "HF"
            basis_sets = ["sto-3g"]

            [[reactants]]
            name = "R1"

            [[reactants]]
            name = "R2"
            "#,
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();

        // R1 completed; R2 never produced an output.
        write_text(
            &dir.path().join("HF_sto-3g/no_cat/reactants/R1/R1_opt.out"),
            "Total job time: 1.00s(wall)\nThank you very much for using Q-Chem.\n",
        )
        .unwrap();

        let report = report(&cfg, dir.path(), &ProgressReporter::new());
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].name, "HF/sto-3g");
        assert_eq!(report.count(JobState::Successful), 1);
        // R2, the uncatalyzed TS, and the R1-R2 complex have no output yet.
        assert_eq!(report.count(JobState::NoFile), 3);
        assert_eq!(report.total(), 4);
    }
}
