use std::time::Duration;

use clap::Parser;
use learnapp::cli::commands::{cmd_explore, cmd_report};
use learnapp::cli::config::{Cli, Commands, build_strategy, load_config};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

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
            let strategy = build_strategy(
                &config.explore,
                max_depth,
                max_duration_secs,
                settle_ms,
                backtrack_ms,
                threshold,
            );

            // Resolve observer endpoint: CLI > config
            let observer_url = observer_url.as_deref().or(config.observer.url.as_deref());

            cmd_explore(
                &app,
                package.as_deref(),
                output.as_deref(),
                trace.as_deref(),
                strategy,
                &config.danger,
                observer_url,
                Duration::from_millis(config.observer.timeout_ms),
                real_time,
                cli.verbose,
            )?;
        }
        Commands::Report {
            input,
            format,
            output,
        } => {
            cmd_report(&input, &format, output.as_deref(), cli.verbose)?;
        }
    }

    Ok(())
}
