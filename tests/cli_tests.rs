use std::io::Write;
use std::time::Duration;

use clap::Parser;
use learnapp::cli::commands::{cmd_explore, cmd_report};
use learnapp::cli::config::{AppConfig, Cli, Commands, DangerConfig, build_strategy, load_config};
use learnapp::explorer::strategy::ExplorationStrategy;
use learnapp::persist::records::StoredRecord;
use learnapp::persist::store::load_records;

mod common;

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_explore_minimal() {
    let cli = Cli::parse_from(["learnapp", "explore", "--app", "notes.yaml"]);
    match cli.command {
        Commands::Explore {
            app,
            package,
            output,
            max_depth,
            threshold,
            real_time,
            ..
        } => {
            assert_eq!(app, "notes.yaml");
            assert!(package.is_none());
            assert!(output.is_none());
            assert!(max_depth.is_none());
            assert!(threshold.is_none());
            assert!(!real_time);
        }
        _ => panic!("Expected Explore command"),
    }
    assert_eq!(cli.verbose, 0);
    assert!(cli.config.is_none());
}

#[test]
fn cli_parse_explore_all_args() {
    let cli = Cli::parse_from([
        "learnapp",
        "explore",
        "--app",
        "shop.json",
        "--package",
        "com.example.shop",
        "-o",
        "run.jsonl",
        "--trace",
        "trace.jsonl",
        "--max-depth",
        "4",
        "--max-duration-secs",
        "90",
        "--settle-ms",
        "250",
        "--backtrack-ms",
        "100",
        "--threshold",
        "0.8",
        "--observer-url",
        "http://localhost:9000/events",
        "--real-time",
    ]);
    match cli.command {
        Commands::Explore {
            app,
            package,
            output,
            trace,
            max_depth,
            max_duration_secs,
            settle_ms,
            backtrack_ms,
            threshold,
            observer_url,
            real_time,
        } => {
            assert_eq!(app, "shop.json");
            assert_eq!(package.as_deref(), Some("com.example.shop"));
            assert_eq!(output.as_deref(), Some("run.jsonl"));
            assert_eq!(trace.as_deref(), Some("trace.jsonl"));
            assert_eq!(max_depth, Some(4));
            assert_eq!(max_duration_secs, Some(90));
            assert_eq!(settle_ms, Some(250));
            assert_eq!(backtrack_ms, Some(100));
            assert_eq!(threshold, Some(0.8));
            assert_eq!(observer_url.as_deref(), Some("http://localhost:9000/events"));
            assert!(real_time);
        }
        _ => panic!("Expected Explore command"),
    }
}

#[test]
fn cli_parse_report_defaults_to_text() {
    let cli = Cli::parse_from(["learnapp", "report", "--input", "run.jsonl"]);
    match cli.command {
        Commands::Report { input, format, output } => {
            assert_eq!(input, "run.jsonl");
            assert_eq!(format, "text");
            assert!(output.is_none());
        }
        _ => panic!("Expected Report command"),
    }
}

#[test]
fn cli_parse_global_flags_after_subcommand() {
    let cli = Cli::parse_from([
        "learnapp",
        "report",
        "--input",
        "run.jsonl",
        "--format",
        "dot",
        "-vv",
        "--config",
        "ci.yaml",
    ]);
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.config.as_deref(), Some("ci.yaml"));
}

#[test]
fn cli_rejects_missing_app() {
    assert!(Cli::try_parse_from(["learnapp", "explore"]).is_err());
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn config_load_missing_file() {
    let config = load_config(Some("nonexistent_file_that_does_not_exist.yaml"));
    // Should return defaults without error
    assert_eq!(config.explore.max_depth, 10);
    assert_eq!(config.explore.max_duration_secs, 300);
    assert!(config.observer.url.is_none());
}

#[test]
fn config_default_values() {
    let config = AppConfig::default();
    assert_eq!(config.explore.settle_ms, 1000);
    assert_eq!(config.explore.backtrack_ms, 500);
    assert_eq!(config.explore.expandable_threshold, 0.65);
    assert_eq!(config.explore.loading_retry_limit, 3);
    assert_eq!(config.explore.pause_timeout_secs, 60);
    assert_eq!(config.explore.max_screens, 200);
    assert!(config.danger.extra_keywords.is_empty());
    assert_eq!(config.observer.timeout_ms, 2000);
}

#[test]
fn config_partial_yaml_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
explore:
  max_depth: 4
  settle_ms: 200
danger:
  extra_keywords: ["wipe data"]
observer:
  url: "http://localhost:9000/events"
"#
    )
    .unwrap();

    let config = load_config(file.path().to_str());
    assert_eq!(config.explore.max_depth, 4);
    assert_eq!(config.explore.settle_ms, 200);
    // Other explore fields get defaults
    assert_eq!(config.explore.backtrack_ms, 500);
    assert_eq!(config.danger.extra_keywords, ["wipe data"]);
    assert_eq!(config.observer.url.as_deref(), Some("http://localhost:9000/events"));
    assert_eq!(config.observer.timeout_ms, 2000);
}

#[test]
fn config_malformed_yaml_falls_back_to_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "explore: [not, a, mapping").unwrap();

    let config = load_config(file.path().to_str());
    assert_eq!(config.explore.max_depth, 10);
}

#[test]
fn config_yaml_roundtrip() {
    let config = AppConfig::default();
    let yaml = serde_yaml::to_string(&config).unwrap();
    let parsed: AppConfig = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(parsed.explore.max_depth, config.explore.max_depth);
    assert_eq!(parsed.explore.pause_poll_ms, config.explore.pause_poll_ms);
}

// ============================================================================
// Builder Tests
// ============================================================================

#[test]
fn build_strategy_from_defaults_matches_strategy_defaults() {
    let strategy = build_strategy(&AppConfig::default().explore, None, None, None, None, None);
    let expected = ExplorationStrategy::default();

    assert_eq!(strategy.max_depth, expected.max_depth);
    assert_eq!(strategy.max_duration, expected.max_duration);
    assert_eq!(strategy.settle_delay, expected.settle_delay);
    assert_eq!(strategy.backtrack_delay, expected.backtrack_delay);
    assert_eq!(strategy.expandable_threshold, expected.expandable_threshold);
    assert!(strategy.validate().is_ok());
}

#[test]
fn build_strategy_cli_overrides_config() {
    let mut explore = AppConfig::default().explore;
    explore.max_depth = 6;
    explore.settle_ms = 400;

    let strategy = build_strategy(&explore, Some(2), Some(30), None, Some(50), Some(0.9));
    assert_eq!(strategy.max_depth, 2);
    assert_eq!(strategy.max_duration, Duration::from_secs(30));
    assert_eq!(strategy.settle_delay, Duration::from_millis(400));
    assert_eq!(strategy.backtrack_delay, Duration::from_millis(50));
    assert_eq!(strategy.expandable_threshold, 0.9);
}

// ============================================================================
// Command Tests
// ============================================================================

fn write_fixture(dir: &tempfile::TempDir, name: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, common::fixture(name)).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn explore_then_report_through_commands() {
    let dir = tempfile::tempdir().unwrap();
    let app = write_fixture(&dir, "two_screens.yaml");
    let run = dir.path().join("run.jsonl");
    let trace = dir.path().join("trace.jsonl");
    let dot = dir.path().join("graph.dot");

    cmd_explore(
        &app,
        None,
        run.to_str(),
        trace.to_str(),
        ExplorationStrategy::default(),
        &DangerConfig::default(),
        None,
        Duration::from_millis(100),
        false,
        0,
    )
    .unwrap();

    let records = load_records(&run).unwrap();
    assert!(matches!(records.last(), Some(StoredRecord::Session(_))));
    assert!(std::fs::read_to_string(&trace).unwrap().lines().count() > 0);

    cmd_report(run.to_str().unwrap(), "dot", dot.to_str(), 0).unwrap();
    let content = std::fs::read_to_string(&dot).unwrap();
    assert!(content.starts_with("digraph navigation {"));
    assert!(content.contains("[label=\"Settings\"]"));
}

#[test]
fn explore_missing_app_file_is_an_error() {
    let result = cmd_explore(
        "does/not/exist.yaml",
        None,
        None,
        None,
        ExplorationStrategy::default(),
        &DangerConfig::default(),
        None,
        Duration::from_millis(100),
        false,
        0,
    );
    assert!(result.is_err());
}
