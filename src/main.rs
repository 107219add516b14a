//! MarketPulse - Main Entry Point
//!
//! Wires the provider chains, market services, batch engine, scheduler
//! and read API together, then runs until shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use marketpulse::api::{self, AppState};
use marketpulse::common::types::{RunState, TriggerKind};
use marketpulse::config::loader::load_config;
use marketpulse::engine::{
    BatchEngine, FileUniverse, MomentumScorer, SnapshotStore, SnapshotWriter,
};
use marketpulse::market::{
    BreadthService, CapitalFlowService, MarketContextService, QuoteService,
};
use marketpulse::provider::{FallbackProvider, SourceBuilder};
use marketpulse::scheduler::Scheduler;

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides the config
    #[arg(long)]
    log_level: Option<String>,

    /// Run a single analysis immediately and exit
    #[arg(long)]
    run_once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let cfg = load_config(Some(&args.config))?;

    // Initialize logging
    let level_name = args
        .log_level
        .unwrap_or_else(|| cfg.settings.log_level.clone());
    let level = match level_name.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting MarketPulse");
    info!("Configuration file: {}", args.config);

    // Provider chains per data category
    let sources = SourceBuilder::from_config(&cfg)?;
    let quotes = Arc::new(QuoteService::new(FallbackProvider::new(
        "quotes",
        sources.quote_chain(&cfg.providers.quotes)?,
        Duration::from_secs(cfg.cache.quote_ttl_seconds),
    )));
    let flow = CapitalFlowService::new(
        FallbackProvider::new(
            "capital-flow",
            sources.flow_chain(&cfg.providers.capital_flow)?,
            Duration::from_secs(cfg.cache.flow_ttl_seconds),
        ),
        cfg.engine.flow_lookback_days,
    );
    let breadth = BreadthService::new(FallbackProvider::new(
        "breadth",
        sources.breadth_chain(&cfg.providers.breadth)?,
        Duration::from_secs(cfg.cache.breadth_ttl_seconds),
    ));
    let context = Arc::new(MarketContextService::new(breadth, flow));

    let store = Arc::new(SnapshotStore::new());
    let engine = BatchEngine::new(
        quotes,
        context,
        Arc::new(MomentumScorer),
        Arc::new(FileUniverse::new(&cfg.universe.file)),
        Arc::clone(&store),
        SnapshotWriter::new(&cfg.settings.snapshot_dir),
        cfg.engine.clone(),
    );

    if args.run_once {
        return run_once(engine).await;
    }

    if cfg.scheduler.enabled {
        let scheduler = Scheduler::from_config(&cfg.scheduler, Arc::clone(&engine))?;
        tokio::spawn(scheduler.run());
    } else {
        warn!("scheduler disabled; runs must be triggered through the API");
    }

    let state = AppState {
        engine: Arc::clone(&engine),
        store,
    };
    let api_task = tokio::spawn(async move { api::serve(&cfg.api.bind, state).await });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, cleaning up...");
            engine.stop();
        }
        served = api_task => {
            served??;
        }
    }

    Ok(())
}

/// Trigger one manual run and wait for its terminal state
async fn run_once(engine: Arc<BatchEngine>) -> Result<()> {
    let mut status_rx = engine.status_rx();
    engine
        .try_trigger(TriggerKind::Manual)
        .ok_or_else(|| anyhow::anyhow!("a run is already in flight"))?;

    loop {
        let terminal = status_rx
            .borrow_and_update()
            .clone()
            .filter(|s| s.state.is_terminal());
        if let Some(status) = terminal {
            info!(
                state = ?status.state,
                processed = status.processed,
                failed = status.failed,
                "run finished"
            );
            if status.state == RunState::Failed {
                anyhow::bail!(
                    "analysis failed: {}",
                    status.message.unwrap_or_else(|| "unknown".to_string())
                );
            }
            return Ok(());
        }
        status_rx.changed().await?;
    }
}
