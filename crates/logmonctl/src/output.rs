//! Terminal rendering for logmonctl

use logmon_common::{ClusterStatus, IndexStatus, JobStatus, Liveness, ProvisionReport, RuleView};
use owo_colors::OwoColorize;
use std::fmt::Write;

/// Rules as a positioned table
pub fn render_rules(views: &[RuleView], color: bool) -> String {
    if views.is_empty() {
        return "No monitor rules defined.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>3}  {:<30} {:<10} {:<20} {:<6} {}",
        "#", "NAME", "INDEX", "TEXT", "WINDOW", "CHANNEL"
    );
    for view in views {
        let rule = &view.rule;
        let index = match (&view.physical_index, color) {
            (Some(_), _) => rule.index_key.clone(),
            (None, true) => format!("{}?", rule.index_key).yellow().to_string(),
            (None, false) => format!("{}?", rule.index_key),
        };
        let _ = writeln!(
            out,
            "{:>3}  {:<30} {:<10} {:<20} {:<6} {}",
            view.position, rule.name, index, rule.match_text, rule.scan_window, rule.channel
        );
    }
    if views.iter().any(|v| v.physical_index.is_none()) {
        out.push_str("\n? index name is not in the index mapping\n");
    }
    out
}

/// Liveness line plus one line per index
pub fn render_status(status: &ClusterStatus, color: bool) -> String {
    let mut out = String::new();
    let liveness = match (&status.liveness, color) {
        (Liveness::Running, true) => status.liveness_label.green().to_string(),
        (_, true) => status.liveness_label.red().to_string(),
        (_, false) => status.liveness_label.clone(),
    };
    let _ = writeln!(out, "Cluster: {}", liveness);

    for index in &status.indexes {
        let label = match (&index.status, color) {
            (IndexStatus::Exists, true) => index.label.green().to_string(),
            (IndexStatus::NotFound, true) => index.label.yellow().to_string(),
            (IndexStatus::Error { .. }, true) => index.label.red().to_string(),
            (_, false) => index.label.clone(),
        };
        let _ = writeln!(out, "  {} ({}): {}", index.display, index.physical, label);
    }
    out
}

/// Provisioning result lines
pub fn render_report(report: &ProvisionReport) -> String {
    let mut out = String::new();
    for line in &report.results {
        let _ = writeln!(out, "{}", line);
    }
    if !report.aborted {
        let _ = writeln!(
            out,
            "{} of {} indexes ready (cluster up after {} attempt(s))",
            report.outcomes.len() - report.failed_count(),
            report.outcomes.len(),
            report.liveness_attempts
        );
    }
    out
}

pub fn render_job(status: &JobStatus) -> String {
    format!("{}\n", status.status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use logmon_common::{IndexState, MonitorRule};

    #[test]
    fn test_render_rules_marks_unresolved_index() {
        let views = vec![
            RuleView {
                position: 0,
                rule: MonitorRule::new("a", "Index_A", "error", "5m", "c1"),
                physical_index: Some("index_a".to_string()),
            },
            RuleView {
                position: 1,
                rule: MonitorRule::new("b", "Index_X", "error", "5m", "c2"),
                physical_index: None,
            },
        ];
        let out = render_rules(&views, false);
        assert!(out.contains("Index_X?"));
        assert!(!out.contains("Index_A?"));
        assert!(out.contains("not in the index mapping"));
    }

    #[test]
    fn test_render_status_plain() {
        let status = ClusterStatus {
            liveness: Liveness::Running,
            liveness_label: "Running".to_string(),
            indexes: vec![IndexState {
                display: "Index_A".to_string(),
                physical: "index_a".to_string(),
                status: IndexStatus::NotFound,
                label: "Not found".to_string(),
            }],
        };
        assert_eq!(
            render_status(&status, false),
            "Cluster: Running\n  Index_A (index_a): Not found\n"
        );
    }
}
