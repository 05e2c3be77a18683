use clap::Parser;
use url_enricher::core::rows::work_items;
use url_enricher::utils::error::ErrorSeverity;
use url_enricher::utils::{logger, validation::Validate};
use url_enricher::{CliArgs, EnrichmentPipeline, EtlEngine, LocalStorage, TomlConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    if args.log_json {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting url-enricher");
    tracing::info!("📁 Loading job from: {}", args.config);

    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load job file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML");
            std::process::exit(1);
        }
    };

    args.apply_overrides(&mut config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - no requests will be sent");
        perform_dry_run(&config).await?;
        return Ok(());
    }

    let storage = LocalStorage::new(".");
    let pipeline = EnrichmentPipeline::with_http(storage, config)?;
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(report) => {
            tracing::info!("✅ Run completed: {:?}", report.summary);
            println!("✅ Enrichment completed!");
            println!(
                "📊 {} rows, {} tasks: {} succeeded, {} failed",
                report.rows,
                report.summary.submitted,
                report.summary.succeeded,
                report.summary.failed
            );
            println!("📁 Output saved to: {}", report.output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig) {
    println!("📋 Job Summary:");
    println!("  Job: {}", config.job.name);
    println!("  Input: {} (column {})", config.input.path, config.input.url_column);
    println!("  Output: {}", config.output.path);
    println!("  Workers: {}", config.dispatch.max_workers);
    if let Some(timeout) = config.dispatch.timeout_seconds {
        println!("  Timeout: {}s per request", timeout);
    }
    for endpoint in &config.endpoints {
        println!("  Endpoint: {} -> {}", endpoint.name, endpoint.url);
    }
    if config.transport.insecure_skip_hostname_verification {
        println!("  ⚠️ TLS hostname verification disabled");
    }
    println!();
}

async fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    let data = tokio::fs::read(&config.input.path).await?;
    let table = url_enricher::adapters::csv_table::read_table(&data)?;
    let items = work_items(&table, &config.input.url_column);
    let missing = items.iter().filter(|item| item.input_value.is_none()).count();

    println!("🔍 Dry Run Analysis:");
    println!("  Rows: {}", items.len());
    println!("  Rows without a URL: {}", missing);
    println!(
        "  Requests that would be sent: {}",
        (items.len() - missing) * config.endpoints.len()
    );
    println!("  Columns written:");
    for column in config.output_columns() {
        println!("    {}", column);
    }

    Ok(())
}
