use std::path::Path;
use std::time::Duration;

use crate::cli::config::DangerConfig;
use crate::explorer::engine::ExplorationEngine;
use crate::explorer::strategy::ExplorationStrategy;
use crate::observe::observer::{ConsoleObserver, ExplorationObserver, HttpObserver, ObserverSet};
use crate::persist::store::{ExplorationStore, JsonlStore, MemoryStore, load_records};
use crate::provider::clock::{Clock, ManualClock, SystemClock};
use crate::provider::scripted::{AppScript, ScriptedApp};
use crate::report::console::format_console_summary;
use crate::report::graph::to_dot;
use crate::report::run_record::RunRecord;
use crate::trace::logger::TraceLogger;
use crate::tree::danger::KeywordDangerPolicy;

// ============================================================================
// explore subcommand
// ============================================================================

pub fn cmd_explore(
    app_path: &str,
    package: Option<&str>,
    output: Option<&str>,
    trace: Option<&str>,
    strategy: ExplorationStrategy,
    danger: &DangerConfig,
    observer_url: Option<&str>,
    observer_timeout: Duration,
    real_time: bool,
    verbose: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let script = AppScript::from_path(Path::new(app_path))?;
    let target = package.unwrap_or(&script.package).to_string();
    let mut app = ScriptedApp::new(script);

    let tracer = match trace {
        Some(path) => TraceLogger::new(path),
        None => TraceLogger::disabled(),
    };

    let mut store: Box<dyn ExplorationStore> = match output {
        Some(path) => Box::new(JsonlStore::create(Path::new(path))?),
        None => Box::new(MemoryStore::new()),
    };

    let console = ConsoleObserver { verbose };
    let http = match observer_url {
        Some(url) => Some(HttpObserver::new(url, observer_timeout)?),
        None => None,
    };
    let mut observers: Vec<&dyn ExplorationObserver> = vec![&console];
    if let Some(http) = &http {
        observers.push(http);
    }
    let observer = ObserverSet::new(observers);

    // Scripted apps react instantly; simulated time keeps runs fast while
    // still honouring the time budget.
    let system_clock;
    let manual_clock;
    let clock: &dyn Clock = if real_time {
        system_clock = SystemClock::new();
        &system_clock
    } else {
        manual_clock = ManualClock::new();
        &manual_clock
    };

    if verbose > 0 {
        eprintln!(
            "Exploring {} from {} (max_depth={}, max_duration={}s)...",
            target,
            app_path,
            strategy.max_depth,
            strategy.max_duration.as_secs()
        );
    }

    let policy = KeywordDangerPolicy::with_extra(&danger.extra_keywords);
    let mut engine = ExplorationEngine::new(strategy, &mut app, clock, store.as_mut(), &observer)
        .with_danger_policy(Box::new(policy))
        .with_tracer(&tracer);

    let summary = engine.run(&target)?;
    print!("{}", format_console_summary(&summary, engine.graph()));

    if let Some(path) = output {
        println!("Run written to {}", path);
    }
    Ok(())
}

// ============================================================================
// report subcommand
// ============================================================================

pub fn cmd_report(
    input: &str,
    format: &str,
    output: Option<&str>,
    verbose: u8,
) -> Result<(), Box<dyn std::error::Error>> {
    let records = load_records(Path::new(input))?;
    if verbose > 0 {
        eprintln!("Loaded {} records from {}", records.len(), input);
    }

    let run = RunRecord::from_records(records);
    let graph = run.to_graph();

    let content = match format {
        "dot" => {
            let labels = run.element_labels();
            to_dot(&graph, |fp| labels.get(fp).cloned())
        }
        _ => match &run.summary {
            Some(summary) => format_console_summary(summary, &graph),
            None => format!(
                "Incomplete run: {} screens, {} elements, {} edges recorded\n",
                run.screens.len(),
                run.elements.len(),
                run.edges.len()
            ),
        },
    };

    match output {
        Some(path) => std::fs::write(path, &content)?,
        None => print!("{}", content),
    }
    Ok(())
}
