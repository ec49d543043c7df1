//! Lifecycle-state classification of one calculation.
//!
//! A calculation's state is recomputed from its current output and error
//! streams on every call; the external tool may still be writing, so the
//! answer can legitimately change between calls and nothing is cached.

use crate::core::io::text::read_optional;
use crate::core::models::identity::Branch;
use crate::engine::patterns;
use std::fmt;
use std::path::Path;

/// Terminal classification of one calculation's current text streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    Successful,
    Running,
    Crash,
    Terminated,
    NoFile,
    Empty,
    /// The tool reported success but the result contradicts the branch's
    /// domain expectation (convergence type / imaginary-frequency count).
    Validation,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Successful => "SUCCESSFUL",
            JobState::Running => "running",
            JobState::Crash => "CRASH",
            JobState::Terminated => "terminated",
            JobState::NoFile => "nofile",
            JobState::Empty => "empty",
            JobState::Validation => "VALIDATION",
        }
    }

    /// Parses the spelling used on the command line; case-insensitive.
    pub fn parse(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "successful" => Some(JobState::Successful),
            "running" => Some(JobState::Running),
            "crash" => Some(JobState::Crash),
            "terminated" => Some(JobState::Terminated),
            "nofile" => Some(JobState::NoFile),
            "empty" => Some(JobState::Empty),
            "validation" => Some(JobState::Validation),
            _ => None,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub state: JobState,
    pub detail: String,
}

impl JobStatus {
    fn new(state: JobState, detail: impl Into<String>) -> Self {
        Self { state, detail: detail.into() }
    }
}

/// Classifies one calculation from its primary output stream (`None` when
/// the file does not exist), its error stream, and the presence of a
/// queue-system submission marker. Checks run in priority order; the first
/// match wins.
pub fn classify(output: Option<&str>, err: &str, submission_marker: bool) -> JobStatus {
    let content = output.unwrap_or("");

    // 1. Queue-level cancellation.
    if err.contains("CANCELLED AT") {
        return JobStatus::new(JobState::Terminated, "Job cancelled by queue");
    }

    // 2. Abnormal termination, from either stream.
    let err_crashed = err.contains("Error in Q-Chem run") || err.contains("Aborted");
    if let Some(detail) = fatal_detail(content) {
        return JobStatus::new(JobState::Crash, detail);
    }
    if err_crashed {
        return JobStatus::new(JobState::Crash, "Q-Chem execution crashed");
    }

    // 3. In flight: a submission marker, or a start banner with no
    //    completion banner yet.
    let completed = content.contains("Thank you very much");
    if submission_marker || (content.contains("Running on") && !completed) {
        return JobStatus::new(JobState::Running, "Calculation in progress");
    }

    // 4. Nothing written yet.
    if output.is_none() {
        return JobStatus::new(JobState::NoFile, "Output file not found");
    }

    // 5. Clean completion.
    if completed {
        return JobStatus::new(
            JobState::Successful,
            format!("Completed in {}", job_duration(content)),
        );
    }

    // 6. Killed outside the queue's bookkeeping.
    let lower = content.to_ascii_lowercase();
    if lower.contains("killed") || lower.contains("terminating") {
        return JobStatus::new(JobState::Terminated, "Job terminated unexpectedly");
    }

    // 7./8. Anything else: unknown failure, or a blank file.
    if !content.trim().is_empty() {
        JobStatus::new(JobState::Crash, "Unknown failure")
    } else {
        JobStatus::new(JobState::Empty, "Output file is empty")
    }
}

/// First clause of the tool's own failure report, if the output carries a
/// known fatal marker.
fn fatal_detail(content: &str) -> Option<String> {
    if content.contains("fatal error occurred") {
        let detail = patterns::FATAL_ERROR_BODY
            .captures(content)
            .map(|caps| first_clause(caps[1].trim()))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Unknown fatal error".to_owned());
        return Some(detail);
    }
    if content.contains("SGeom Failed") {
        return Some("Geometry optimization failed".to_owned());
    }
    if content.contains("SCF failed to converge") {
        return Some("SCF convergence failure".to_owned());
    }
    if content.contains("Insufficient memory") {
        return Some("Out of memory".to_owned());
    }
    None
}

fn first_clause(message: &str) -> String {
    patterns::CLAUSE_BOUNDARY
        .split(message)
        .next()
        .unwrap_or(message)
        .trim()
        .to_owned()
}

/// Reported wall-clock duration, reformatted `HH:MM:SS`; falls back to the
/// tool's raw spelling when the wall field is absent.
fn job_duration(content: &str) -> String {
    let Some(raw) = patterns::TOTAL_JOB_TIME
        .captures(content)
        .map(|caps| caps[1].trim().to_owned())
    else {
        return "unknown".to_owned();
    };
    match patterns::WALL_SECONDS
        .captures(&raw)
        .and_then(|caps| caps[1].parse::<f64>().ok())
    {
        Some(seconds) => {
            let total = seconds.round() as u64;
            format!("{:02}:{:02}:{:02}", total / 3600, (total % 3600) / 60, total % 60)
        }
        None => raw,
    }
}

/// Domain-correctness check layered on top of tool-reported completion, for
/// successful optimizations only: transition-state branches must have
/// converged to a transition state with exactly one imaginary frequency,
/// every other branch to a minimum with zero. Returns the mismatch, if any.
pub fn validation_mismatch(output: &str, branch: Branch) -> Option<String> {
    let expects_ts = branch.expects_transition_state();

    let marker = patterns::OPTIMIZATION_STATUS
        .captures(output)
        .map(|caps| caps[1].to_owned());
    match marker.as_deref() {
        None => return Some("no convergence marker in output".to_owned()),
        Some("TRANSITION STATE CONVERGED") if !expects_ts => {
            return Some("converged to a transition state on a minimum branch".to_owned());
        }
        Some("OPTIMIZATION CONVERGED") if expects_ts => {
            return Some("converged to a minimum on a transition-state branch".to_owned());
        }
        _ => {}
    }

    let imaginary = patterns::IMAGINARY_FREQUENCIES
        .captures(output)
        .and_then(|caps| caps[1].parse::<u32>().ok());
    if let Some(count) = imaginary {
        let expected = if expects_ts { 1 } else { 0 };
        if count != expected {
            return Some(format!(
                "expected {expected} imaginary frequencies, found {count}"
            ));
        }
    }
    None
}

/// Applies [`validation_mismatch`] to a successful classification,
/// downgrading it to [`JobState::Validation`] on mismatch.
pub fn refine_successful(status: JobStatus, output: &str, branch: Branch) -> JobStatus {
    if status.state != JobState::Successful {
        return status;
    }
    match validation_mismatch(output, branch) {
        Some(detail) => JobStatus::new(JobState::Validation, detail),
        None => status,
    }
}

/// Whether a queue-system bookkeeping file for this input currently exists.
/// Two marker shapes are produced by the submission wrapper:
/// `{stem}.in_{job}.{task}` and `.{stem}.in.{job}.qcin.{task}`.
pub fn submission_marker_exists(input_path: &Path) -> bool {
    let Some(stem) = input_path.file_stem().map(|s| s.to_string_lossy()) else {
        return false;
    };
    let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
    let candidates = [
        parent.join(format!("{stem}.in_[0-9]*.[0-9]*")),
        parent.join(format!(".{stem}.in.[0-9]*.qcin.[0-9]*")),
    ];
    candidates.iter().any(|pattern| {
        pattern
            .to_str()
            .and_then(|p| glob::glob(p).ok())
            .map(|mut paths| paths.next().is_some())
            .unwrap_or(false)
    })
}

/// Classifies the calculation belonging to `input_path` from its sibling
/// `.out` / `.err` files and submission markers. `validate` carries the
/// branch when the enhanced success check applies (optimization mode).
pub fn status_for_input(input_path: &Path, validate: Option<Branch>) -> JobStatus {
    let output = read_optional(&input_path.with_extension("out"));
    let err = read_optional(&input_path.with_extension("err")).unwrap_or_default();
    let submission = submission_marker_exists(input_path);
    let status = classify(output.as_deref(), &err, submission);
    match (validate, output) {
        (Some(branch), Some(content)) => refine_successful(status, &content, branch),
        _ => status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLETED: &str = "\
 Running on node-17\n\
 Final energy is -100.123456\n\
 Total job time:  305.49s(wall), 2404.10s(cpu)\n\
 Thank you very much for using Q-Chem.\n";

    #[test]
    fn completion_marker_wins_regardless_of_whitespace() {
        let padded = format!("\n\n   {COMPLETED}   \n\n");
        let status = classify(Some(&padded), "", false);
        assert_eq!(status.state, JobState::Successful);
    }

    #[test]
    fn successful_detail_reports_wall_clock_as_hms() {
        let status = classify(Some(COMPLETED), "", false);
        assert_eq!(status.detail, "Completed in 00:05:05");
    }

    #[test]
    fn queue_cancellation_takes_precedence() {
        let status = classify(Some(COMPLETED), "slurmstepd: CANCELLED AT 2024-02-01", false);
        assert_eq!(status.state, JobState::Terminated);
        assert_eq!(status.detail, "Job cancelled by queue");
    }

    #[test]
    fn error_stream_crash_beats_running() {
        let status = classify(Some(" Running on node-3\n"), "Error in Q-Chem run part 1\n", true);
        assert_eq!(status.state, JobState::Crash);
    }

    #[test]
    fn fatal_error_detail_is_first_clause_of_tool_message() {
        let output = "\
 Q-Chem fatal error occurred in module scfman\n\
  SCF failed to converge; try different guess and adjust thresholds\n\n\
 trailer\n";
        let status = classify(Some(output), "Aborted (core dumped)", false);
        assert_eq!(status.state, JobState::Crash);
        assert_eq!(status.detail, "SCF failed to converge");
    }

    #[test]
    fn known_failure_markers_map_to_crash() {
        for (marker, detail) in [
            ("SGeom Failed", "Geometry optimization failed"),
            ("SCF failed to converge", "SCF convergence failure"),
            ("Insufficient memory", "Out of memory"),
        ] {
            let text = format!("some header\n{marker}\n");
            let status = classify(Some(&text), "", false);
            assert_eq!(status.state, JobState::Crash);
            assert_eq!(status.detail, detail);
        }
    }

    #[test]
    fn submission_marker_means_running_even_without_output() {
        let status = classify(None, "", true);
        assert_eq!(status.state, JobState::Running);
    }

    #[test]
    fn start_banner_without_completion_is_running() {
        let status = classify(Some(" Running on node-5\n doing work"), "", false);
        assert_eq!(status.state, JobState::Running);
    }

    #[test]
    fn missing_output_is_nofile() {
        let status = classify(None, "", false);
        assert_eq!(status.state, JobState::NoFile);
    }

    #[test]
    fn kill_marker_is_unexpected_termination() {
        let status = classify(Some("job was KILLED by the operator\n"), "", false);
        assert_eq!(status.state, JobState::Terminated);
    }

    #[test]
    fn unrecognized_content_is_unknown_crash() {
        let status = classify(Some("random garbage"), "", false);
        assert_eq!(status.state, JobState::Crash);
        assert_eq!(status.detail, "Unknown failure");
    }

    #[test]
    fn blank_output_is_empty() {
        let status = classify(Some("   \n  \n"), "", false);
        assert_eq!(status.state, JobState::Empty);
    }

    #[test]
    fn ts_branch_with_zero_imaginary_frequencies_downgrades() {
        let output = format!(
            "TRANSITION STATE CONVERGED\nThis Molecule has  0  Imaginary Frequencies\n{COMPLETED}"
        );
        let status = classify(Some(&output), "", false);
        let refined = refine_successful(status, &output, Branch::Ts);
        assert_eq!(refined.state, JobState::Validation);
        assert!(refined.detail.contains("expected 1 imaginary frequencies"));
    }

    #[test]
    fn minimum_branch_with_imaginary_mode_downgrades() {
        let output = format!(
            "OPTIMIZATION CONVERGED\nThis Molecule has  1  Imaginary Frequencies\n{COMPLETED}"
        );
        let status = classify(Some(&output), "", false);
        let refined = refine_successful(status, &output, Branch::Reactants);
        assert_eq!(refined.state, JobState::Validation);
    }

    #[test]
    fn wrong_convergence_kind_downgrades() {
        let output = format!("OPTIMIZATION CONVERGED\n{COMPLETED}");
        let status = classify(Some(&output), "", false);
        let refined = refine_successful(status, &output, Branch::Ts);
        assert_eq!(refined.state, JobState::Validation);
        assert!(refined.detail.contains("minimum on a transition-state branch"));
    }

    #[test]
    fn matching_expectation_keeps_success() {
        let output = format!(
            "TRANSITION STATE CONVERGED\nThis Molecule has  1  Imaginary Frequencies\n{COMPLETED}"
        );
        let status = classify(Some(&output), "", false);
        let refined = refine_successful(status.clone(), &output, Branch::Ts);
        assert_eq!(refined, status);
    }

    #[test]
    fn absent_frequency_count_does_not_downgrade() {
        let output = format!("OPTIMIZATION CONVERGED\n{COMPLETED}");
        let status = classify(Some(&output), "", false);
        let refined = refine_successful(status, &output, Branch::Products);
        assert_eq!(refined.state, JobState::Successful);
    }

    #[test]
    fn submission_markers_are_found_by_glob() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("nitrone_opt.in");
        std::fs::write(&input, "").unwrap();
        assert!(!submission_marker_exists(&input));

        std::fs::write(dir.path().join("nitrone_opt.in_12345.0"), "").unwrap();
        assert!(submission_marker_exists(&input));
    }

    #[test]
    fn hidden_submission_marker_shape_is_recognized() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("alkene_sp.in");
        std::fs::write(dir.path().join(".alkene_sp.in.99.qcin.1"), "").unwrap();
        assert!(submission_marker_exists(&input));
    }

    #[test]
    fn status_for_input_reads_sibling_streams() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("a_opt.in");
        std::fs::write(&input, "").unwrap();
        assert_eq!(status_for_input(&input, None).state, JobState::NoFile);

        std::fs::write(dir.path().join("a_opt.out"), COMPLETED).unwrap();
        assert_eq!(status_for_input(&input, None).state, JobState::Successful);

        // Enhanced mode: no convergence marker at all on an opt output.
        let refined = status_for_input(&input, Some(Branch::Reactants));
        assert_eq!(refined.state, JobState::Validation);
    }
}
