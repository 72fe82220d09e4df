//! Argument parsing and rendering for logmonctl.

use chrono::Utc;
use clap::Parser;
use logmon_common::{CreateResult, IndexOutcome, MonitorRule, ProvisionReport};
use logmonctl::cli::{Cli, Commands};
use logmonctl::output::render_report;

#[test]
fn test_parse_add() {
    let cli = Cli::try_parse_from([
        "logmonctl",
        "add",
        "--name",
        "Payments errors",
        "--index",
        "Index_B",
        "--text",
        "declined",
        "--channel",
        "payments",
    ])
    .unwrap();

    match cli.command {
        Commands::Add(args) => {
            let rule = MonitorRule::from(args);
            assert_eq!(
                rule,
                MonitorRule::new("Payments errors", "Index_B", "declined", "5m", "payments")
            );
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn test_parse_edit_with_position() {
    let cli = Cli::try_parse_from([
        "logmonctl",
        "--json",
        "edit",
        "2",
        "--name",
        "n",
        "--index",
        "Index_C",
        "--text",
        "t",
        "--time",
        "1h",
        "--channel",
        "c",
    ])
    .unwrap();

    assert!(cli.json);
    match cli.command {
        Commands::Edit { position, rule } => {
            assert_eq!(position, 2);
            assert_eq!(rule.time, "1h");
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn test_parse_delete_rejects_negative_position() {
    assert!(Cli::try_parse_from(["logmonctl", "delete", "-1"]).is_err());
    assert!(Cli::try_parse_from(["logmonctl", "delete", "0"]).is_ok());
}

#[test]
fn test_parse_daemon_override() {
    let cli = Cli::try_parse_from([
        "logmonctl",
        "--daemon",
        "http://console:5000",
        "setup-indexes",
    ])
    .unwrap();
    assert_eq!(cli.daemon, "http://console:5000");
    assert!(matches!(cli.command, Commands::SetupIndexes));
}

#[test]
fn test_render_report_summary() {
    let now = Utc::now();
    let outcomes = vec![
        IndexOutcome {
            display: "Index_A".to_string(),
            physical: "index_a".to_string(),
            result: CreateResult::Ready,
        },
        IndexOutcome {
            display: "Index_B".to_string(),
            physical: "index_b".to_string(),
            result: CreateResult::Rejected {
                status: 400,
                body: "bad".to_string(),
            },
        },
    ];
    let report = ProvisionReport {
        started_at: now,
        finished_at: now,
        liveness_attempts: 2,
        aborted: false,
        results: outcomes.iter().map(|o| o.to_string()).collect(),
        outcomes,
    };

    let out = render_report(&report);
    assert!(out.contains("Failed to create index Index_B: bad"));
    assert!(out.contains("1 of 2 indexes ready (cluster up after 2 attempt(s))"));
}

#[test]
fn test_render_aborted_report_has_single_line() {
    let now = Utc::now();
    let report = ProvisionReport {
        started_at: now,
        finished_at: now,
        liveness_attempts: 5,
        aborted: true,
        outcomes: Vec::new(),
        results: vec!["Error: cluster is not available after 5 attempts".to_string()],
    };
    assert_eq!(
        render_report(&report),
        "Error: cluster is not available after 5 attempts\n"
    );
}
