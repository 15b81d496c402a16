// record-fuzzing/src/reporters/mod.rs
//! Reporters for fuzzing run results

use crate::runner::RunSummary;
use std::time::Duration;

/// Summary lines of a run, in print order
pub fn summary_lines(summary: &RunSummary) -> Vec<String> {
    // sub-millisecond precision only adds noise to the report
    let elapsed = Duration::from_millis(summary.elapsed.as_millis() as u64);

    let mut lines = vec![
        format!("=== Record Fuzzing Results ({}) ===", summary.config_name),
        format!("Iterations: {}", summary.iterations()),
        format!("Valid after fuzzing: {}", summary.valid_after()),
        format!("Invalid after fuzzing: {}", summary.invalid_after()),
    ];

    let escalated = summary
        .reports
        .iter()
        .filter(|report| report.escalation.is_some())
        .count();
    if escalated > 0 {
        lines.push(format!(
            "Escalations exhausted: {} of {}",
            summary.exhausted(),
            escalated
        ));
    }

    let invalid_baselines = summary
        .reports
        .iter()
        .filter(|report| !report.valid_before)
        .count();
    if invalid_baselines > 0 {
        lines.push(format!("Baselines already invalid: {}", invalid_baselines));
    }

    lines.push(format!("Elapsed: {}", humantime::format_duration(elapsed)));
    lines
}

/// Print the results of a run
pub fn report_run(summary: &RunSummary) {
    println!();
    for line in summary_lines(summary) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escalation::EscalationStatus;
    use crate::runner::IterationReport;

    fn report(iteration: u32, valid_after: bool, escalation: Option<EscalationStatus>) -> IterationReport {
        IterationReport {
            iteration,
            valid_before: true,
            valid_after,
            escalation,
            operations: 3,
            artifacts: Vec::new(),
        }
    }

    #[test]
    fn test_summary_lines() {
        let summary = RunSummary {
            config_name: "nightly".to_string(),
            reports: vec![
                report(0, false, Some(EscalationStatus::Invalidated)),
                report(1, true, Some(EscalationStatus::Exhausted)),
            ],
            elapsed: Duration::from_millis(1_500),
        };

        let lines = summary_lines(&summary);
        assert_eq!(lines[0], "=== Record Fuzzing Results (nightly) ===");
        assert!(lines.contains(&"Invalid after fuzzing: 1".to_string()));
        assert!(lines.contains(&"Escalations exhausted: 1 of 2".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("Elapsed: 1s 500ms"));
    }
}
