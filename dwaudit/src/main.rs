//! Data warehouse column auditor.
//!
//! Loads tables from JSON files, runs the configured checks and insights on a
//! bounded worker pool and prints or saves the report.

use anyhow::Context;
use clap::Parser;
use dwaudit::data::{load_config, load_tables};
use dwaudit::output::{render, save_output};
use dwaudit::runtime::{block_on, install_panic_hook};
use dwaudit::{Cli, Command, RunArgs};
use dwaudit_core::{AuditConfig, Auditor, PluginCategory, Registry, builtin_registry, init_logging};
use std::sync::Arc;
use tracing::{error, info, warn};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;
    install_panic_hook();

    let registry = builtin_registry().context("Failed to build plugin registry")?;

    match cli.command {
        Command::List { category } => {
            list_plugins(&registry, category);
            Ok(())
        }
        Command::Describe { name, category } => {
            let info = registry.info(category, &name)?;
            println!("{}", serde_json::to_string_pretty(&info)?);
            Ok(())
        }
        Command::Run(args) => block_on(run_audit(registry, args))?,
    }
}

/// Prints registered plugins grouped by category.
fn list_plugins(registry: &Registry, category: Option<PluginCategory>) {
    let categories = match category {
        Some(category) => vec![category],
        None => PluginCategory::ALL.to_vec(),
    };
    for category in categories {
        println!("{}s:", category);
        for entry in registry.entries().iter().filter(|e| e.category == category) {
            println!("  {:<24} {}", entry.name, entry.description);
        }
    }
}

async fn run_audit(registry: Arc<Registry>, args: RunArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => load_config(path)
            .await
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => {
            info!("No configuration given; running default checks on every column");
            AuditConfig::new()
        }
    };
    if args.strict {
        config.settings = config.settings.with_strict_params(true);
    }
    if let Some(secs) = args.timeout {
        config.settings = config.settings.with_timeout_secs(secs);
    }
    config.validate()?;

    let tables = load_tables(&args.data).await?;
    let now = args.now.unwrap_or_else(chrono::Utc::now);
    let auditor = Auditor::from_config(registry, &config, now);

    let report = auditor.audit(&config, &tables).await.map_err(|e| {
        error!("Audit could not start: {}", e);
        e
    })?;
    if report.summary.failed + report.summary.not_run > 0 {
        warn!(
            "{} invocations failed and {} did not run",
            report.summary.failed, report.summary.not_run
        );
    }

    let rendered = render(&report, args.format)?;
    match &args.output {
        Some(path) => save_output(&rendered, path).await?,
        None => println!("{}", rendered),
    }
    Ok(())
}
