//! Portico CLI

mod logging;
mod reload;
mod shutdown;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use portico_config::{load_config, load_from_file, validate_config, Config};
use portico_refresh::{HttpSchemaFetcher, RefreshCoordinator};
use portico_router::{RoutePlanner, RouteTable};
use reload::TableReloader;
use shutdown::{ShutdownSignal, SignalHandler};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "portico")]
#[command(about = "Portico schema-driven API gateway", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an OpenAPI JSON document and print the compiled routes
    Compile {
        /// Path to the OpenAPI document
        file: PathBuf,

        /// Print on a single line
        #[arg(long)]
        compact: bool,
    },

    /// Fetch every service's schema once and write the route cache
    Refresh {
        /// Path to configuration file
        #[arg(short, long, default_value = "portico.yaml")]
        config: PathBuf,
    },

    /// Load routes, keep them refreshed and serve until interrupted
    Serve {
        /// Path to configuration file
        #[arg(short, long, default_value = "portico.yaml")]
        config: PathBuf,

        /// Log level (trace, debug, info, warn, error); overrides the config
        #[arg(short, long)]
        log_level: Option<String>,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "portico.yaml")]
        config: PathBuf,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile { file, compact } => compile(&file, compact),
        Commands::Refresh { config } => refresh(&config).await,
        Commands::Serve { config, log_level } => serve(&config, log_level).await,
        Commands::Validate { config } => validate(&config),
        Commands::Version => {
            println!("Portico API Gateway");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
            Ok(())
        }
    }
}

fn compile(file: &Path, compact: bool) -> Result<()> {
    logging::init_stderr("warn");

    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let document: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON document", file.display()))?;

    let spec = portico_openapi::compile(&document);
    let output = if compact {
        serde_json::to_string(&spec)?
    } else {
        serde_json::to_string_pretty(&spec)?
    };
    println!("{output}");

    Ok(())
}

async fn refresh(path: &Path) -> Result<()> {
    logging::init_stderr("info");

    let config = load_config(path)?;
    let coordinator = build_coordinator(&config, Arc::new(RouteTable::default()))?;
    let cycle = coordinator.run_cycle(false).await?;

    for record in &cycle.records {
        match &record.routes {
            Some(routes) => println!("{}: {} routes", record.service.host, routes.len()),
            None => println!("{}: no schema, wildcard fallback", record.service.host),
        }
    }
    if let Some(routes_file) = &config.refresh.routes_file {
        println!("Route cache written to {}", routes_file.display());
    }

    Ok(())
}

async fn serve(path: &Path, log_level: Option<String>) -> Result<()> {
    let config = load_from_file(path)?;
    let log_config = &config.observability.logging;
    logging::init_tracing(log_level.as_deref().unwrap_or(&log_config.level), log_config.format)?;

    tracing::info!("Starting Portico API Gateway");
    tracing::info!("Config file: {}", path.display());
    validate_config(&config)?;

    let table = Arc::new(RouteTable::default());
    let planner = RoutePlanner::from_config(&config.gateway);
    let coordinator = Arc::new(build_coordinator(&config, Arc::clone(&table))?);

    let cycle = coordinator.load().await?;
    table.replace(planner.plan(&cycle.records)?);
    for route in table.snapshot().iter() {
        tracing::debug!(
            methods = ?route.methods,
            url = %route.url,
            upstream = %route.upstream.host,
            "Route registered"
        );
    }
    tracing::info!(
        services = cycle.records.len(),
        routes = table.len(),
        from_cache = cycle.from_cache,
        "Route table installed"
    );

    let shutdown_signal = ShutdownSignal::new();
    let periodic = Arc::clone(&coordinator).spawn_periodic(shutdown_signal.subscribe());
    if periodic.is_none() {
        tracing::info!("No refresh interval configured, routes stay fixed");
    }

    SignalHandler::new(shutdown_signal).run().await;

    if let Some(handle) = periodic {
        if let Err(e) = handle.await {
            tracing::warn!(error = %e, "Periodic refresh task ended abnormally");
        }
    }
    coordinator.shutdown().await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

fn validate(path: &Path) -> Result<()> {
    logging::init_stderr("info");

    tracing::info!("Validating configuration: {}", path.display());

    match load_config(path) {
        Ok(config) => {
            tracing::info!("Configuration is valid");
            tracing::info!("  Services: {}", config.services.len());
            match config.refresh.interval {
                Some(interval) => tracing::info!("  Refresh interval: {:?}", interval),
                None => tracing::info!("  Refresh interval: disabled"),
            }
            if let Some(routes_file) = &config.refresh.routes_file {
                tracing::info!("  Routes file: {}", routes_file.display());
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Configuration validation failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn build_coordinator(config: &Config, table: Arc<RouteTable>) -> Result<RefreshCoordinator> {
    let fetcher = Arc::new(HttpSchemaFetcher::new(&config.http_client)?);
    let reloader = Arc::new(TableReloader::new(
        RoutePlanner::from_config(&config.gateway),
        table,
    ));
    Ok(RefreshCoordinator::from_config(config, fetcher, reloader))
}
