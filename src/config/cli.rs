use crate::config::toml_config::TomlConfig;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "url-enricher")]
#[command(about = "POST every URL in a CSV table to fixed endpoints and write the enriched table")]
pub struct CliArgs {
    /// Path to the TOML job file
    #[arg(short, long, default_value = "enrich.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Override dispatch.max_workers
    #[arg(long)]
    pub max_workers: Option<usize>,

    /// Override dispatch.timeout_seconds
    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// Override output.path
    #[arg(short, long)]
    pub output: Option<String>,

    /// Show what would be processed without sending any request
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    pub fn apply_overrides(&self, config: &mut TomlConfig) {
        if let Some(workers) = self.max_workers {
            tracing::info!("🔧 max_workers overridden to: {}", workers);
            config.dispatch.max_workers = workers;
        }
        if let Some(timeout) = self.timeout_seconds {
            tracing::info!("🔧 timeout_seconds overridden to: {}", timeout);
            config.dispatch.timeout_seconds = Some(timeout);
        }
        if let Some(output) = &self.output {
            tracing::info!("🔧 output path overridden to: {}", output);
            config.output.path = output.clone();
        }
    }
}
