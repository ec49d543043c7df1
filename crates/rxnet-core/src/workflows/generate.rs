//! Input-file materialization over the enumerated calculation set.
//!
//! The only write path in the system: every other workflow consumes the
//! same enumeration read-only. Existing inputs are preserved unless an
//! overwrite criterion says otherwise; single-point generation follows the
//! configured strategy with the dependency edge to the parent optimization
//! resolved through the status classifier.

use crate::core::io::text::write_text;
use crate::core::models::identity::Mode;
use crate::core::models::network::ReactionNetworkConfig;
use crate::engine::enumerate::enumerate;
use crate::engine::inputs::InputComposer;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::status::{status_for_input, JobState};
use std::path::Path;
use tracing::{info, warn};

/// When an existing input file may be replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverwriteCriteria {
    /// Replace unconditionally.
    All,
    /// Replace only when no output file exists yet.
    NoFile,
    /// Replace when the calculation classifies as the given state.
    State(JobState),
}

/// Single-point generation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpStrategy {
    /// Generate single-point inputs unconditionally.
    Always,
    /// Generate a single-point input only once its optimization classifies
    /// as validated-successful; work that cannot yet be meaningfully
    /// computed is skipped.
    #[default]
    Smart,
    /// Never generate single-point inputs.
    Never,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateStats {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Materializes input files for every enumerated calculation.
pub fn run(
    config: &ReactionNetworkConfig,
    system_dir: &Path,
    overwrite: Option<OverwriteCriteria>,
    sp_strategy: SpStrategy,
    reporter: &ProgressReporter,
) -> GenerateStats {
    let all = enumerate(config);
    info!(total = all.len(), "Input generation started.");
    reporter.report(Progress::TaskStart { total_steps: all.len() as u64 });

    let mut composer = InputComposer::new(system_dir);
    let mut stats = GenerateStats::default();

    for calc in &all {
        let identity = &calc.identity;
        reporter.report(Progress::TaskIncrement);

        if identity.mode == Mode::Sp {
            match sp_strategy {
                SpStrategy::Never => {
                    stats.skipped += 1;
                    continue;
                }
                SpStrategy::Smart => {
                    // Dependency edge: the optimization must have reached the
                    // validated-successful terminal state. Enumeration order
                    // guarantees the optimization slot was visited first.
                    let opt = identity
                        .opt_counterpart()
                        .expect("sp identity has an opt counterpart");
                    let opt_input = system_dir.join(opt.input_rel_path());
                    let status = status_for_input(&opt_input, Some(opt.branch));
                    if status.state != JobState::Successful {
                        info!(
                            calculation = %identity.input_rel_path().display(),
                            opt_status = %status.state,
                            "skipping single point; optimization not validated-successful"
                        );
                        stats.skipped += 1;
                        continue;
                    }
                }
                SpStrategy::Always => {}
            }
        }

        let input = system_dir.join(identity.input_rel_path());
        if input.exists() {
            let proceed = match overwrite {
                None => false,
                Some(OverwriteCriteria::All) => true,
                Some(OverwriteCriteria::NoFile) => !input.with_extension("out").exists(),
                Some(OverwriteCriteria::State(state)) => {
                    status_for_input(&input, None).state == state
                }
            };
            if !proceed {
                stats.skipped += 1;
                continue;
            }
            info!(calculation = %identity.input_rel_path().display(), "overwriting input");
        }

        let method = &config.methods[calc.method_idx];
        let basis = &method.basis_sets[calc.basis_idx];
        match composer.compose(identity, method, basis) {
            Ok(content) => match write_text(&input, &content) {
                Ok(()) => {
                    stats.written += 1;
                    info!(calculation = %identity.input_rel_path().display(), "input written");
                }
                Err(e) => {
                    stats.failed += 1;
                    warn!(
                        calculation = %identity.input_rel_path().display(),
                        error = %e,
                        "failed to write input"
                    );
                }
            },
            Err(e) => {
                stats.failed += 1;
                warn!(
                    calculation = %identity.input_rel_path().display(),
                    error = %e,
                    "failed to compose input"
                );
            }
        }
    }

    reporter.report(Progress::TaskFinish);
    info!(
        written = stats.written,
        skipped = stats.skipped,
        failed = stats.failed,
        "Input generation finished."
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::text::read_optional;

    const CONFIG: &str = r#"
        [[methods]]
        name = { opt = "B3LYP", sp = "wB97X-V" }
        basis_sets = [{ opt = "6-31G", sp = "def2-TZVPP" }]

        [[reactants]]
        name = "R1"
    "#;

    fn network() -> ReactionNetworkConfig {
        ReactionNetworkConfig::from_toml_str(CONFIG).unwrap()
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
        std::fs::write(rem.join("rem_opt_base.rem"), "  jobtype {jobtype}\n  method {method}\n")
            .unwrap();
        std::fs::write(rem.join("geom_opt.rem"), "$geom_opt\n$end").unwrap();
        std::fs::write(rem.join("rem_sp_eda_base.rem"), "  method {method}\n  eda2 {eda2}\n")
            .unwrap();
        std::fs::write(
            mol.join("R1.xyz"),
            "2\n0 1\nO   0.0 0.0 0.0\nH   0.0 0.0 0.96\n",
        )
        .unwrap();
        // The uncatalyzed TS template is deliberately absent: that
        // calculation must fail without aborting the batch.
    }

    #[test]
    fn smart_strategy_defers_single_points_until_opt_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        write_template_tree(dir.path());
        let cfg = network();

        let stats = run(&cfg, dir.path(), None, SpStrategy::Smart, &ProgressReporter::new());
        let opt_input = dir.path().join("B3LYP_6-31G/no_cat/reactants/R1/R1_opt.in");
        let sp_input = dir
            .path()
            .join("B3LYP_6-31G/no_cat/reactants/R1/wB97X-V_def2-TZVPP_sp/R1_sp.in");
        assert!(opt_input.is_file());
        assert!(!sp_input.exists(), "sp deferred while opt has not run");
        // R1 opt written; tscomplex failed (no template); R1 sp skipped.
        assert_eq!(stats.written, 1);
        assert_eq!(stats.failed, 1);

        // Opt completes and validates: the next pass generates the sp.
        std::fs::write(
            dir.path().join("B3LYP_6-31G/no_cat/reactants/R1/R1_opt.out"),
            "OPTIMIZATION CONVERGED\nStandard Nuclear Orientation\n\
             1  O  0.1 0.2 0.3\n 2  H  1.0 1.1 1.2\n\
             Thank you very much for using Q-Chem.\n",
        )
        .unwrap();
        let stats = run(&cfg, dir.path(), None, SpStrategy::Smart, &ProgressReporter::new());
        assert!(sp_input.is_file());
        assert_eq!(stats.written, 1);

        // Geometry refresh: the sp molecule section uses the optimized
        // coordinates, not the template ones.
        let sp_content = read_optional(&sp_input).unwrap();
        assert!(sp_content.contains("0.1"));
        assert!(!sp_content.contains("0.96"));
    }

    #[test]
    fn never_strategy_skips_all_single_points() {
        let dir = tempfile::tempdir().unwrap();
        write_template_tree(dir.path());
        let stats = run(&network(), dir.path(), None, SpStrategy::Never, &ProgressReporter::new());
        assert_eq!(stats.written, 1);
        let sp_dir = dir.path().join("B3LYP_6-31G/no_cat/reactants/R1/wB97X-V_def2-TZVPP_sp");
        assert!(!sp_dir.exists());
    }

    #[test]
    fn existing_inputs_are_preserved_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        write_template_tree(dir.path());
        let cfg = network();
        run(&cfg, dir.path(), None, SpStrategy::Never, &ProgressReporter::new());

        let opt_input = dir.path().join("B3LYP_6-31G/no_cat/reactants/R1/R1_opt.in");
        std::fs::write(&opt_input, "hand-edited").unwrap();
        run(&cfg, dir.path(), None, SpStrategy::Never, &ProgressReporter::new());
        assert_eq!(read_optional(&opt_input).as_deref(), Some("hand-edited"));

        run(
            &cfg,
            dir.path(),
            Some(OverwriteCriteria::All),
            SpStrategy::Never,
            &ProgressReporter::new(),
        );
        assert_ne!(read_optional(&opt_input).as_deref(), Some("hand-edited"));
    }

    #[test]
    fn always_strategy_generates_sp_with_template_geometry() {
        let dir = tempfile::tempdir().unwrap();
        write_template_tree(dir.path());
        run(&network(), dir.path(), None, SpStrategy::Always, &ProgressReporter::new());
        let sp_input = dir
            .path()
            .join("B3LYP_6-31G/no_cat/reactants/R1/wB97X-V_def2-TZVPP_sp/R1_sp.in");
        let content = read_optional(&sp_input).unwrap();
        // No opt output yet: coordinates fall back to the template.
        assert!(content.contains("0.96"));
    }
}
