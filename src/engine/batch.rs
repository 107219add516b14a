//! Batch decision engine
//!
//! Coordinates one run at a time: load the universe, assemble the shared
//! market context, fan instruments out through a bounded worker pool,
//! tolerate per-instrument failures, and commit one immutable snapshot.
//! Run lifecycle is `Pending → Running → {Completed, Failed}`, published
//! through a watch channel so the API can report status without touching
//! engine internals.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use super::scorer::Scorer;
use super::snapshot::{DecisionSnapshot, SnapshotStore, SnapshotWriter};
use super::universe::UniverseSource;
use crate::common::errors::{EngineError, Result};
use crate::common::types::{Decision, Instrument, RunState, RunStatus, TriggerKind};
use crate::config::types::EngineConfig;
use crate::market::{ContextFeed, MarketContext, QuoteFeed};

/// One-run-at-a-time batch coordinator.
///
/// Triggering never queues: while a run is in flight every further
/// trigger is rejected immediately.
pub struct BatchEngine {
    quotes: Arc<dyn QuoteFeed>,
    context: Arc<dyn ContextFeed>,
    scorer: Arc<dyn Scorer>,
    universe: Arc<dyn UniverseSource>,
    store: Arc<SnapshotStore>,
    writer: SnapshotWriter,
    cfg: EngineConfig,
    running: AtomicBool,
    status_tx: watch::Sender<Option<RunStatus>>,
    stop_tx: watch::Sender<bool>,
}

impl BatchEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        quotes: Arc<dyn QuoteFeed>,
        context: Arc<dyn ContextFeed>,
        scorer: Arc<dyn Scorer>,
        universe: Arc<dyn UniverseSource>,
        store: Arc<SnapshotStore>,
        writer: SnapshotWriter,
        cfg: EngineConfig,
    ) -> Arc<Self> {
        let (status_tx, _) = watch::channel(None);
        let (stop_tx, _) = watch::channel(false);
        Arc::new(Self {
            quotes,
            context,
            scorer,
            universe,
            store,
            writer,
            cfg,
            running: AtomicBool::new(false),
            status_tx,
            stop_tx,
        })
    }

    /// Start a run if none is in flight. Returns the new status
    /// immediately, or `None` when a run is already RUNNING.
    pub fn try_trigger(self: &Arc<Self>, trigger: TriggerKind) -> Option<RunStatus> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return None;
        }

        let _ = self.stop_tx.send(false);
        let status = RunStatus::pending(trigger);
        self.status_tx.send_replace(Some(status.clone()));

        info!(?trigger, "starting batch run");
        let engine = Arc::clone(self);
        let run_status = status.clone();
        tokio::spawn(async move { engine.run(run_status).await });

        Some(status)
    }

    /// Request cooperative cancellation of the in-flight run
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Latest published run status, `None` before the first trigger
    pub fn current_status(&self) -> Option<RunStatus> {
        self.status_tx.borrow().clone()
    }

    /// Subscribe to status updates
    pub fn status_rx(&self) -> watch::Receiver<Option<RunStatus>> {
        self.status_tx.subscribe()
    }

    async fn run(self: Arc<Self>, mut status: RunStatus) {
        match self.execute(&mut status).await {
            Ok(()) => {
                status.state = RunState::Completed;
                info!(
                    processed = status.processed,
                    failed = status.failed,
                    "batch run completed"
                );
            }
            Err(e) => {
                status.state = RunState::Failed;
                status.message = Some(e.to_string());
                error!(error = %e, "batch run failed");
            }
        }
        status.finished_at = Some(Utc::now());
        self.status_tx.send_replace(Some(status));
        self.running.store(false, Ordering::SeqCst);
    }

    /// The run body. Any error returned here is run-fatal; per-instrument
    /// failures are absorbed into `status.failed` instead.
    async fn execute(&self, status: &mut RunStatus) -> Result<()> {
        let instruments = self.universe.load().await?;
        let context = self.context.current().await?;

        status.state = RunState::Running;
        self.status_tx.send_replace(Some(status.clone()));

        let deadline =
            tokio::time::Instant::now() + Duration::from_secs(self.cfg.run_deadline_seconds);
        let scoring_timeout = Duration::from_secs(self.cfg.scoring_timeout_seconds);
        let semaphore = Arc::new(Semaphore::new(self.cfg.worker_pool_size));

        let total = instruments.len();
        let mut decisions: Vec<Decision> = Vec::with_capacity(total);
        let mut dispatched = 0usize;
        let mut deadline_hit = false;

        for (batch_idx, batch) in instruments.chunks(self.cfg.batch_size).enumerate() {
            info!(
                batch = batch_idx,
                size = batch.len(),
                dispatched,
                total,
                "dispatching batch"
            );

            let mut tasks: JoinSet<(String, Result<Decision>)> = JoinSet::new();
            for instrument in batch {
                dispatched += 1;
                tasks.spawn(self.score_task(
                    instrument.clone(),
                    context.clone(),
                    Arc::clone(&semaphore),
                    scoring_timeout,
                ));
            }

            loop {
                match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                    Err(_) => {
                        // Deadline: abort what is outstanding, count it as
                        // failed alongside anything never dispatched
                        let outstanding = tasks.len();
                        tasks.abort_all();
                        while tasks.join_next().await.is_some() {}
                        status.failed += outstanding;
                        warn!(
                            outstanding,
                            "{}", EngineError::RunDeadlineExceeded
                        );
                        deadline_hit = true;
                        break;
                    }
                    Ok(None) => break,
                    Ok(Some(Ok((_, Ok(decision))))) => {
                        decisions.push(decision);
                        status.processed += 1;
                    }
                    Ok(Some(Ok((symbol, Err(e))))) => {
                        status.failed += 1;
                        warn!(symbol = %symbol, error = %e, "instrument skipped");
                    }
                    Ok(Some(Err(join_err))) => {
                        status.failed += 1;
                        warn!(error = %join_err, "scoring task aborted");
                    }
                }
            }

            self.status_tx.send_replace(Some(status.clone()));

            if deadline_hit {
                status.failed += total - dispatched;
                break;
            }
        }

        let degraded = total > 0
            && (status.failed as f64 / total as f64) > self.cfg.degraded_threshold;
        if degraded {
            warn!(
                failed = status.failed,
                total, "run degraded: failure fraction over threshold"
            );
        }

        let snapshot = DecisionSnapshot::commit(status.started_at, decisions, context, degraded);

        // Disk persistence failing does not undo a successful analysis;
        // the in-memory snapshot still commits
        if let Err(e) = self.writer.persist(&snapshot).await {
            error!(error = %e, "snapshot persistence failed");
        }
        self.store.publish(snapshot).await;

        Ok(())
    }

    /// Build the future scoring one instrument. Permit acquisition is part
    /// of the task so the JoinSet can be filled eagerly while the
    /// semaphore enforces the pool size.
    fn score_task(
        &self,
        instrument: Instrument,
        context: MarketContext,
        semaphore: Arc<Semaphore>,
        scoring_timeout: Duration,
    ) -> impl std::future::Future<Output = (String, Result<Decision>)> + Send + 'static {
        let quotes = Arc::clone(&self.quotes);
        let scorer = Arc::clone(&self.scorer);
        let mut stop = self.stop_tx.subscribe();

        async move {
            let symbol = instrument.symbol.clone();

            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return (symbol, Err(EngineError::Cancelled)),
            };
            if *stop.borrow() {
                return (symbol, Err(EngineError::Cancelled));
            }

            let work = async {
                let fetched = quotes.quote(&instrument.symbol).await?;
                let quote = fetched.payload;
                let outcome =
                    tokio::time::timeout(scoring_timeout, scorer.score(&instrument, &quote, &context))
                        .await
                        .map_err(|_| EngineError::ScoringTimeout(scoring_timeout))??;
                Ok(Decision {
                    symbol: instrument.symbol.clone(),
                    name: instrument.name.clone(),
                    action: outcome.action,
                    strength: outcome.strength,
                    rationale: outcome.rationale,
                    confidence: outcome.confidence.clamp(0.0, 1.0),
                    quote,
                    quote_source: fetched.source,
                    quote_stale: fetched.stale,
                })
            };

            tokio::pin!(work);
            let result = tokio::select! {
                changed = stop.changed() => {
                    match changed {
                        Ok(()) if *stop.borrow() => Err(EngineError::Cancelled),
                        // Flag reset or sender gone: fall through to work
                        _ => work.await,
                    }
                }
                result = &mut work => result,
            };

            (symbol, result)
        }
    }
}
