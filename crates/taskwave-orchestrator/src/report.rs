//! Console rendering for a wave: banner, dry-run listing, summary and the
//! machine-readable results block.

use taskwave_core::{TaskDescriptor, WaveSummary, WorkerResult};

/// Marker line that precedes the JSON result list.
pub const RESULTS_MARKER: &str = "---RESULTS---";

const RULE_WIDTH: usize = 60;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn task_lines(tasks: &[TaskDescriptor]) -> impl Iterator<Item = String> + '_ {
    tasks
        .iter()
        .map(|task| format!("  {}: {}", task.identifier, task.title))
}

/// Listing printed by `--dry-run`.
pub fn render_dry_run(tasks: &[TaskDescriptor], max_concurrent: usize) -> String {
    let mut lines = vec![format!(
        "Would resolve {} issues (max {} concurrent)",
        tasks.len(),
        max_concurrent
    )];
    lines.extend(task_lines(tasks));
    lines.join("\n")
}

/// Banner printed before the wave starts.
pub fn render_banner(tasks: &[TaskDescriptor], max_concurrent: usize) -> String {
    let mut lines = vec![
        String::new(),
        rule(),
        format!(
            "WAVE: Resolving {} issue(s), max {} concurrent",
            tasks.len(),
            max_concurrent
        ),
    ];
    lines.extend(task_lines(tasks));
    lines.push(rule());
    lines.push(String::new());
    lines.join("\n")
}

/// Summary printed after the wave: successes first, then failures with
/// their errors.
pub fn render_summary(results: &[WorkerResult]) -> String {
    let summary = WaveSummary::from_results(results);
    let mut lines = vec![
        String::new(),
        rule(),
        format!(
            "WAVE COMPLETE: {} succeeded, {} failed",
            summary.succeeded, summary.failed
        ),
    ];

    for result in results.iter().filter(|r| r.success()) {
        lines.push(format!("  + {}", result.identifier()));
    }
    for result in results.iter().filter(|r| !r.success()) {
        lines.push(format!(
            "  x {}: {}",
            result.identifier(),
            result.error().unwrap_or_default()
        ));
    }

    lines.push(rule());
    lines.push(String::new());
    lines.join("\n")
}

/// The marker line followed by the results as a single-line JSON list.
pub fn render_results_block(results: &[WorkerResult]) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(results)?;
    Ok(format!("{}\n{}", RESULTS_MARKER, json))
}
