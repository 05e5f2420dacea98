use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::explorer::strategy::ExplorationStrategy;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "learnapp",
    version,
    about = "Autonomous depth-first UI explorer for accessibility trees"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: learnapp.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Explore a scripted app and record its navigation graph
    Explore {
        /// Scripted app description (YAML, or JSON with a .json extension)
        #[arg(long)]
        app: String,

        /// Target package (default: the script's package)
        #[arg(long)]
        package: Option<String>,

        /// Write discovered screens, elements and edges as JSON lines
        #[arg(short, long)]
        output: Option<String>,

        /// Write a JSON-lines decision trace
        #[arg(long)]
        trace: Option<String>,

        /// Deepest screen level to explore
        #[arg(long)]
        max_depth: Option<usize>,

        /// Session time ceiling in seconds
        #[arg(long)]
        max_duration_secs: Option<u64>,

        /// Wait after each click, in milliseconds
        #[arg(long)]
        settle_ms: Option<u64>,

        /// Wait after each back action, in milliseconds
        #[arg(long)]
        backtrack_ms: Option<u64>,

        /// Minimum confidence to treat a control as expandable (0.0 - 1.0)
        #[arg(long)]
        threshold: Option<f32>,

        /// POST progress events as JSON to this URL
        #[arg(long)]
        observer_url: Option<String>,

        /// Sleep for real instead of simulating time
        #[arg(long)]
        real_time: bool,
    },

    /// Summarize a recorded run
    Report {
        /// JSON-lines file written by `explore --output`
        #[arg(long)]
        input: String,

        /// Output format: text, dot
        #[arg(long, default_value = "text")]
        format: String,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `learnapp.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub explore: ExploreConfig,
    #[serde(default)]
    pub danger: DangerConfig,
    #[serde(default)]
    pub observer: ObserverConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExploreConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,

    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    #[serde(default = "default_backtrack_ms")]
    pub backtrack_ms: u64,

    #[serde(default = "default_backtrack_ms")]
    pub expansion_settle_ms: u64,

    #[serde(default = "default_threshold")]
    pub expandable_threshold: f32,

    #[serde(default = "default_retry_limit")]
    pub loading_retry_limit: u32,

    #[serde(default = "default_settle_ms")]
    pub loading_retry_ms: u64,

    #[serde(default = "default_retry_limit")]
    pub dismiss_retry_limit: u32,

    #[serde(default = "default_pause_timeout_secs")]
    pub pause_timeout_secs: u64,

    #[serde(default = "default_pause_poll_ms")]
    pub pause_poll_ms: u64,

    #[serde(default = "default_max_screens")]
    pub max_screens: usize,

    #[serde(default = "default_max_elements")]
    pub max_elements_per_screen: usize,

    #[serde(default = "default_retry_limit")]
    pub backtrack_retry_limit: u32,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_duration_secs: default_max_duration_secs(),
            settle_ms: default_settle_ms(),
            backtrack_ms: default_backtrack_ms(),
            expansion_settle_ms: default_backtrack_ms(),
            expandable_threshold: default_threshold(),
            loading_retry_limit: default_retry_limit(),
            loading_retry_ms: default_settle_ms(),
            dismiss_retry_limit: default_retry_limit(),
            pause_timeout_secs: default_pause_timeout_secs(),
            pause_poll_ms: default_pause_poll_ms(),
            max_screens: default_max_screens(),
            max_elements_per_screen: default_max_elements(),
            backtrack_retry_limit: default_retry_limit(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DangerConfig {
    /// Phrases treated as destructive on top of the built-in list
    #[serde(default)]
    pub extra_keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserverConfig {
    pub url: Option<String>,

    #[serde(default = "default_observer_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_ms: default_observer_timeout_ms(),
        }
    }
}

// Serde default helpers
fn default_max_depth() -> usize { 10 }
fn default_max_duration_secs() -> u64 { 300 }
fn default_settle_ms() -> u64 { 1000 }
fn default_backtrack_ms() -> u64 { 500 }
fn default_threshold() -> f32 { 0.65 }
fn default_retry_limit() -> u32 { 3 }
fn default_pause_timeout_secs() -> u64 { 60 }
fn default_pause_poll_ms() -> u64 { 2000 }
fn default_max_screens() -> usize { 200 }
fn default_max_elements() -> usize { 100 }
fn default_observer_timeout_ms() -> u64 { 2000 }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("learnapp.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => match serde_yaml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: ignoring malformed config '{}': {}", config_path, e);
                AppConfig::default()
            }
        },
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Build an ExplorationStrategy; CLI values win over the config file.
pub fn build_strategy(
    config: &ExploreConfig,
    max_depth: Option<usize>,
    max_duration_secs: Option<u64>,
    settle_ms: Option<u64>,
    backtrack_ms: Option<u64>,
    threshold: Option<f32>,
) -> ExplorationStrategy {
    ExplorationStrategy {
        max_depth: max_depth.unwrap_or(config.max_depth),
        max_duration: Duration::from_secs(max_duration_secs.unwrap_or(config.max_duration_secs)),
        settle_delay: Duration::from_millis(settle_ms.unwrap_or(config.settle_ms)),
        backtrack_delay: Duration::from_millis(backtrack_ms.unwrap_or(config.backtrack_ms)),
        expansion_settle_delay: Duration::from_millis(config.expansion_settle_ms),
        expandable_threshold: threshold.unwrap_or(config.expandable_threshold),
        loading_retry_limit: config.loading_retry_limit,
        loading_retry_delay: Duration::from_millis(config.loading_retry_ms),
        dismiss_retry_limit: config.dismiss_retry_limit,
        pause_timeout: Duration::from_secs(config.pause_timeout_secs),
        pause_poll_interval: Duration::from_millis(config.pause_poll_ms),
        max_screens: config.max_screens,
        max_elements_per_screen: config.max_elements_per_screen,
        backtrack_retry_limit: config.backtrack_retry_limit,
    }
}
