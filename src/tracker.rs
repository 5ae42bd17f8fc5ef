//! tracker.rs — the ingestion queue and its single worker.
//!
//! One `Tracker` instance owns the whole pipeline: submissions go into an
//! unbounded channel and exactly one worker task drains it, so at most one
//! record is ever in flight through scoring and storage — the core
//! serialization guarantee, enforced structurally rather than by assuming a
//! single-threaded host. Consecutive queued items are paced apart to avoid
//! tight-looping a potentially expensive scorer.
//!
//! Processing failures are logged and counted; the in-flight flag is cleared
//! by a drop guard on every exit path, and the drain continues.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use metrics::{counter, gauge};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::analyze::ScorerStack;
use crate::content::{ContentRecord, StoredItem};
use crate::storage::ContentStore;
use crate::sync::{should_auto_sync, SyncClient, SyncPayload};

/// Minimum delay between two consecutive queued items. Pacing, not
/// correctness.
const DEFAULT_PACING: Duration = Duration::from_millis(1000);

#[derive(Clone, Copy, Debug)]
pub struct TrackerCfg {
    pub pacing: Duration,
}

impl Default for TrackerCfg {
    fn default() -> Self {
        Self {
            pacing: DEFAULT_PACING,
        }
    }
}

/// Reported to the frontends via `getModelStatus`.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStatus {
    pub model_loaded: bool,
    pub is_processing: bool,
}

pub struct Tracker {
    tx: mpsc::UnboundedSender<ContentRecord>,
    in_flight: Arc<AtomicBool>,
    queue_depth: Arc<AtomicUsize>,
    model_loaded: bool,
}

impl Tracker {
    /// Construct the tracker and spawn its worker. Requires a running Tokio
    /// runtime.
    pub fn spawn(
        cfg: TrackerCfg,
        store: Arc<ContentStore>,
        scorer: Arc<ScorerStack>,
        sync: Arc<dyn SyncClient>,
    ) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let in_flight = Arc::new(AtomicBool::new(false));
        let queue_depth = Arc::new(AtomicUsize::new(0));
        let model_loaded = scorer.model_loaded();

        tokio::spawn(drain(
            rx,
            cfg,
            store,
            scorer,
            sync,
            in_flight.clone(),
            queue_depth.clone(),
        ));

        Arc::new(Self {
            tx,
            in_flight,
            queue_depth,
            model_loaded,
        })
    }

    /// Enqueue one record. Never blocks; the worker picks it up immediately
    /// when idle.
    pub fn submit(&self, record: ContentRecord) -> Result<()> {
        // Depth goes up before the send so the worker never observes a
        // received item with a zero count.
        let depth = self.queue_depth.fetch_add(1, Ordering::SeqCst) + 1;
        gauge!("tracker_queue_depth").set(depth as f64);
        if self.tx.send(record).is_err() {
            self.queue_depth.fetch_sub(1, Ordering::SeqCst);
            return Err(anyhow!("tracker worker is gone"));
        }
        Ok(())
    }

    pub fn status(&self) -> ModelStatus {
        ModelStatus {
            model_loaded: self.model_loaded,
            is_processing: self.in_flight.load(Ordering::SeqCst),
        }
    }

    /// Idle means: nothing in flight and nothing queued.
    pub fn is_idle(&self) -> bool {
        !self.in_flight.load(Ordering::SeqCst) && self.queue_depth.load(Ordering::SeqCst) == 0
    }
}

/// Clears the in-flight flag on drop, whatever path the processing took.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn engage(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

async fn drain(
    mut rx: mpsc::UnboundedReceiver<ContentRecord>,
    cfg: TrackerCfg,
    store: Arc<ContentStore>,
    scorer: Arc<ScorerStack>,
    sync: Arc<dyn SyncClient>,
    in_flight: Arc<AtomicBool>,
    queue_depth: Arc<AtomicUsize>,
) {
    let mut pending: Option<ContentRecord> = None;
    loop {
        let record = match pending.take() {
            Some(r) => r,
            None => match rx.recv().await {
                Some(r) => r,
                None => break, // all senders dropped
            },
        };
        {
            // Flag first, then drop the queue count, so the item is never
            // invisible to an idleness check in between.
            let _guard = InFlightGuard::engage(&in_flight);
            let depth = queue_depth
                .fetch_sub(1, Ordering::SeqCst)
                .saturating_sub(1);
            gauge!("tracker_queue_depth").set(depth as f64);

            if let Err(e) = process_one(&store, &scorer, &sync, record).await {
                counter!("tracker_process_errors_total").increment(1);
                tracing::warn!(error = %e, "content processing failed");
            }
        }

        // Pace only between consecutive queued items; an idle queue is
        // awaited without delay.
        if let Ok(next) = rx.try_recv() {
            pending = Some(next);
            tokio::time::sleep(cfg.pacing).await;
        }
    }
}

async fn process_one(
    store: &Arc<ContentStore>,
    scorer: &Arc<ScorerStack>,
    sync: &Arc<dyn SyncClient>,
    record: ContentRecord,
) -> Result<()> {
    counter!("tracker_submissions_total").increment(1);

    let analysis = scorer.analyze(&record).await;
    if !analysis.should_save {
        counter!("tracker_rejected_total").increment(1);
        tracing::debug!(url = %record.url, score = analysis.score, "record below save threshold");
        return Ok(());
    }

    let settings = store.settings();
    let item = StoredItem::new(record, analysis, settings.share_by_default);
    let sync_eligible = should_auto_sync(&settings, &item.analysis);

    let inserted = store.upsert(item.clone())?;
    if !inserted {
        counter!("tracker_duplicates_total").increment(1);
        tracing::debug!(url = %item.record.url, "duplicate record skipped");
        return Ok(());
    }
    counter!("tracker_saved_total").increment(1);
    tracing::info!(url = %item.record.url, score = item.analysis.score, "content saved");

    if sync_eligible {
        let payload = SyncPayload::from_item(&item);
        let url = item.record.url.clone();
        let store = store.clone();
        let sync = sync.clone();
        // Fire-and-forget: the save already succeeded, the forward only
        // flips `synced` on success.
        tokio::spawn(async move {
            match sync
                .forward(&settings.website_url, &settings.api_key, &payload)
                .await
            {
                Ok(()) => {
                    counter!("sync_forward_total", "outcome" => "ok").increment(1);
                    if let Err(e) = store.mark_synced(&url) {
                        tracing::warn!(url = %url, error = %e, "marking synced failed");
                    }
                }
                Err(e) => {
                    counter!("sync_forward_total", "outcome" => "error").increment(1);
                    tracing::warn!(url = %url, error = %e, "auto-sync forward failed");
                }
            }
        });
    }

    Ok(())
}
