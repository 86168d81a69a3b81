//! # Outbox
//!
//! Best-effort outbound write queue in front of the [`PersistenceBackend`].
//!
//! ## Delivery Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Outbox Delivery                                │
//! │                                                                         │
//! │  Terminal command                                                      │
//! │       │  handle.enqueue(WriteBatch [UpsertShift, InsertSale])           │
//! │       ▼                                                                 │
//! │  ┌──────────────────────┐   bounded mpsc (capacity from config)         │
//! │  │ #7 │ #8 │ #9 │ ...   │   full → QueueFull, batch dropped             │
//! │  └──────────┬───────────┘                                               │
//! │             ▼                                                           │
//! │  Outbox::run (one task, FIFO)                                          │
//! │    for step in batch:                                                  │
//! │      ok    → Delivered                                                 │
//! │      error → Failed, every later step in the batch → Skipped           │
//! │             │                                                           │
//! │             ▼                                                           │
//! │  DeliveryReport ──broadcast──► subscribers (status bar, tests)          │
//! │                                                                         │
//! │  No retries. A failed write is reported and forgotten.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ordering inside a batch is what keeps a sale from being stored without
//! the shift it references: the shift upsert goes first, and when it fails
//! the sale is skipped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use gastro_core::{Ingredient, Product, Sale, Shift, TaxEntry, WasteEntry};

use crate::backend::PersistenceBackend;
use crate::error::{SyncError, SyncResult};

/// Reports buffered per subscriber before the slowest one starts lagging.
const REPORT_BUFFER: usize = 128;

// =============================================================================
// Writes & Batches
// =============================================================================

/// One write against the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundWrite {
    UpsertIngredient(Ingredient),
    UpsertProduct(Product),
    UpsertShift(Shift),
    InsertSale(Sale),
    InsertTaxEntry(TaxEntry),
    InsertWaste(WasteEntry),
}

impl OutboundWrite {
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundWrite::UpsertIngredient(_) => "upsert_ingredient",
            OutboundWrite::UpsertProduct(_) => "upsert_product",
            OutboundWrite::UpsertShift(_) => "upsert_shift",
            OutboundWrite::InsertSale(_) => "insert_sale",
            OutboundWrite::InsertTaxEntry(_) => "insert_tax_entry",
            OutboundWrite::InsertWaste(_) => "insert_waste",
        }
    }

    pub fn record_id(&self) -> &str {
        match self {
            OutboundWrite::UpsertIngredient(i) => &i.id,
            OutboundWrite::UpsertProduct(p) => &p.id,
            OutboundWrite::UpsertShift(s) => &s.id,
            OutboundWrite::InsertSale(s) => &s.id,
            OutboundWrite::InsertTaxEntry(e) => &e.id,
            OutboundWrite::InsertWaste(w) => &w.id,
        }
    }

    async fn apply(&self, backend: &dyn PersistenceBackend) -> SyncResult<()> {
        match self {
            OutboundWrite::UpsertIngredient(i) => backend.upsert_ingredient(i).await,
            OutboundWrite::UpsertProduct(p) => backend.upsert_product(p).await,
            OutboundWrite::UpsertShift(s) => backend.upsert_shift(s).await,
            OutboundWrite::InsertSale(s) => backend.insert_sale(s).await,
            OutboundWrite::InsertTaxEntry(e) => backend.insert_tax_entry(e).await,
            OutboundWrite::InsertWaste(w) => backend.insert_waste(w).await,
        }
    }
}

/// Writes delivered in order, stopping at the first failure.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteBatch {
    /// What caused the batch (`"complete_sale"`, `"close_shift"`, ...).
    pub label: String,
    pub steps: Vec<OutboundWrite>,
}

impl WriteBatch {
    pub fn new(label: impl Into<String>) -> Self {
        WriteBatch {
            label: label.into(),
            steps: Vec::new(),
        }
    }

    /// Appends a step.
    pub fn then(mut self, write: OutboundWrite) -> Self {
        self.steps.push(write);
        self
    }

    pub fn push(&mut self, write: OutboundWrite) {
        self.steps.push(write);
    }

    pub fn extend(&mut self, writes: impl IntoIterator<Item = OutboundWrite>) {
        self.steps.extend(writes);
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}

// =============================================================================
// Reports
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Delivered,
    Failed { error: String },
    /// Not attempted because an earlier step in the batch failed.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub kind: &'static str,
    pub record_id: String,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    pub batch_id: u64,
    pub label: String,
    pub steps: Vec<StepReport>,
}

impl DeliveryReport {
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| s.outcome == StepOutcome::Delivered)
    }

    pub fn is_failed(&self) -> bool {
        !self.is_complete()
    }

    /// Some steps landed and some did not: e.g. the shift was written but
    /// the sale that references it was not.
    pub fn is_partial(&self) -> bool {
        let delivered = self.delivered_count();
        delivered > 0 && delivered < self.steps.len()
    }

    pub fn delivered_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Delivered)
            .count()
    }

    /// The step that failed, if any.
    pub fn failure(&self) -> Option<&StepReport> {
        self.steps
            .iter()
            .find(|s| matches!(s.outcome, StepOutcome::Failed { .. }))
    }
}

// =============================================================================
// Handle
// =============================================================================

#[derive(Debug)]
struct QueuedBatch {
    id: u64,
    batch: WriteBatch,
}

/// Cloneable handle used by the terminal to queue writes.
#[derive(Clone)]
pub struct OutboxHandle {
    batch_tx: mpsc::Sender<QueuedBatch>,
    reports_tx: broadcast::Sender<DeliveryReport>,
    shutdown_tx: mpsc::Sender<()>,
    next_id: Arc<AtomicU64>,
    capacity: usize,
}

impl OutboxHandle {
    /// Queues a batch without waiting. Returns its id.
    ///
    /// ## Errors
    /// - [`SyncError::QueueFull`] when `capacity` batches are already
    ///   waiting; the batch is dropped
    /// - [`SyncError::ShuttingDown`] once the processor has stopped
    pub fn enqueue(&self, batch: WriteBatch) -> SyncResult<u64> {
        if batch.is_empty() {
            return Err(SyncError::Internal(format!(
                "empty write batch '{}'",
                batch.label
            )));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let label = batch.label.clone();
        let steps = batch.len();

        match self.batch_tx.try_send(QueuedBatch { id, batch }) {
            Ok(()) => {
                debug!(batch_id = id, label = %label, steps, "Batch queued");
                Ok(id)
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(batch_id = id, label = %label, capacity = self.capacity, "Outbox full, batch dropped");
                Err(SyncError::QueueFull {
                    capacity: self.capacity,
                })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(SyncError::ShuttingDown),
        }
    }

    /// Receives a [`DeliveryReport`] for every batch processed after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<DeliveryReport> {
        self.reports_tx.subscribe()
    }

    /// Stops the processor after the batches already queued are delivered.
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| SyncError::ChannelError("Shutdown channel closed".into()))
    }
}

impl std::fmt::Debug for OutboxHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboxHandle")
            .field("capacity", &self.capacity)
            .field("queued", &(self.capacity - self.batch_tx.capacity()))
            .finish()
    }
}

// =============================================================================
// Processor
// =============================================================================

pub struct Outbox {
    backend: Arc<dyn PersistenceBackend>,
    batch_rx: mpsc::Receiver<QueuedBatch>,
    reports_tx: broadcast::Sender<DeliveryReport>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl Outbox {
    /// Creates a processor and its handle. Nothing is delivered until
    /// [`run`](Self::run) is spawned.
    pub fn new(backend: Arc<dyn PersistenceBackend>, capacity: usize) -> (Self, OutboxHandle) {
        let capacity = capacity.max(1);
        let (batch_tx, batch_rx) = mpsc::channel(capacity);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let (reports_tx, _) = broadcast::channel(REPORT_BUFFER);

        let outbox = Outbox {
            backend,
            batch_rx,
            reports_tx: reports_tx.clone(),
            shutdown_rx,
        };

        let handle = OutboxHandle {
            batch_tx,
            reports_tx,
            shutdown_tx,
            next_id: Arc::new(AtomicU64::new(1)),
            capacity,
        };

        (outbox, handle)
    }

    /// Creates the processor and spawns it on the current runtime.
    pub fn start(
        backend: Arc<dyn PersistenceBackend>,
        capacity: usize,
    ) -> (OutboxHandle, JoinHandle<()>) {
        let (outbox, handle) = Self::new(backend, capacity);
        let task = tokio::spawn(outbox.run());
        (handle, task)
    }

    pub async fn run(mut self) {
        info!("Outbox processor starting");

        loop {
            tokio::select! {
                biased;

                // Shutdown (or every handle dropped)
                _ = self.shutdown_rx.recv() => {
                    info!("Outbox processor shutting down");
                    break;
                }

                queued = self.batch_rx.recv() => match queued {
                    Some(queued) => self.deliver(queued).await,
                    None => break,
                },
            }
        }

        // Deliver what was accepted before the shutdown.
        self.batch_rx.close();
        while let Some(queued) = self.batch_rx.recv().await {
            self.deliver(queued).await;
        }

        info!("Outbox processor stopped");
    }

    async fn deliver(&self, queued: QueuedBatch) {
        let QueuedBatch { id, batch } = queued;
        let mut steps = Vec::with_capacity(batch.len());
        let mut failed = false;

        for write in &batch.steps {
            let outcome = if failed {
                StepOutcome::Skipped
            } else {
                match write.apply(self.backend.as_ref()).await {
                    Ok(()) => StepOutcome::Delivered,
                    Err(e) => {
                        failed = true;
                        warn!(
                            batch_id = id,
                            label = %batch.label,
                            kind = write.kind(),
                            record_id = %write.record_id(),
                            error = %e,
                            "Write failed, remaining steps skipped"
                        );
                        StepOutcome::Failed {
                            error: e.to_string(),
                        }
                    }
                }
            };
            steps.push(StepReport {
                kind: write.kind(),
                record_id: write.record_id().to_string(),
                outcome,
            });
        }

        let report = DeliveryReport {
            batch_id: id,
            label: batch.label,
            steps,
        };

        if report.is_complete() {
            debug!(batch_id = id, label = %report.label, steps = report.steps.len(), "Batch delivered");
        } else if report.is_partial() {
            warn!(
                batch_id = id,
                label = %report.label,
                delivered = report.delivered_count(),
                total = report.steps.len(),
                "Batch partially delivered"
            );
        }

        // No subscribers is fine.
        let _ = self.reports_tx.send(report);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use gastro_core::{Money, PaymentMethod, ShiftRepository, User, DEFAULT_TENANT_ID};
    use tokio::sync::RwLock;

    /// Records every write; fails the kinds listed in `fail_kinds`.
    #[derive(Default)]
    struct RecordingBackend {
        written: RwLock<Vec<String>>,
        fail_kinds: RwLock<Vec<&'static str>>,
    }

    impl RecordingBackend {
        async fn fail_on(&self, kind: &'static str) {
            self.fail_kinds.write().await.push(kind);
        }

        async fn record(&self, kind: &'static str, id: &str) -> SyncResult<()> {
            if self.fail_kinds.read().await.contains(&kind) {
                return Err(SyncError::Persistence(format!("{kind} rejected")));
            }
            self.written.write().await.push(format!("{kind}:{id}"));
            Ok(())
        }
    }

    #[async_trait]
    impl PersistenceBackend for RecordingBackend {
        async fn load_ingredients(&self) -> SyncResult<Vec<Ingredient>> {
            Ok(vec![])
        }
        async fn upsert_ingredient(&self, i: &Ingredient) -> SyncResult<()> {
            self.record("upsert_ingredient", &i.id).await
        }
        async fn load_products(&self) -> SyncResult<Vec<Product>> {
            Ok(vec![])
        }
        async fn upsert_product(&self, p: &Product) -> SyncResult<()> {
            self.record("upsert_product", &p.id).await
        }
        async fn load_sales(&self) -> SyncResult<Vec<Sale>> {
            Ok(vec![])
        }
        async fn insert_sale(&self, s: &Sale) -> SyncResult<()> {
            self.record("insert_sale", &s.id).await
        }
        async fn load_tax_entries(&self) -> SyncResult<Vec<TaxEntry>> {
            Ok(vec![])
        }
        async fn insert_tax_entry(&self, e: &TaxEntry) -> SyncResult<()> {
            self.record("insert_tax_entry", &e.id).await
        }
        async fn load_waste(&self) -> SyncResult<Vec<WasteEntry>> {
            Ok(vec![])
        }
        async fn insert_waste(&self, w: &WasteEntry) -> SyncResult<()> {
            self.record("insert_waste", &w.id).await
        }
        async fn load_active_shift(&self) -> SyncResult<Option<Shift>> {
            Ok(None)
        }
        async fn upsert_shift(&self, s: &Shift) -> SyncResult<()> {
            self.record("upsert_shift", &s.id).await
        }
        async fn load_users(&self) -> SyncResult<Vec<User>> {
            Ok(vec![])
        }
    }

    fn shift() -> Shift {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap();
        ShiftRepository::new()
            .open_shift(Money::from_cents(10000), "u1", now)
            .unwrap()
    }

    fn sale(id: &str) -> Sale {
        Sale {
            id: id.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap(),
            items: vec![],
            total: Money::from_cents(360),
            amount_paid: None,
            change: None,
            payment_method: PaymentMethod::Card,
            seller_id: "u1".into(),
            table_id: None,
            tenant_id: DEFAULT_TENANT_ID.into(),
            shift_id: Some(shift().id),
        }
    }

    fn sale_batch(id: &str) -> WriteBatch {
        WriteBatch::new("complete_sale")
            .then(OutboundWrite::UpsertShift(shift()))
            .then(OutboundWrite::InsertSale(sale(id)))
    }

    #[tokio::test]
    async fn test_batch_delivered_in_order() {
        let backend = Arc::new(RecordingBackend::default());
        let (handle, task) = Outbox::start(backend.clone(), 8);
        let mut reports = handle.subscribe();

        let id = handle.enqueue(sale_batch("v-1")).unwrap();
        let report = reports.recv().await.unwrap();

        assert_eq!(report.batch_id, id);
        assert!(report.is_complete());
        assert!(!report.is_partial());
        assert_eq!(
            *backend.written.read().await,
            vec![format!("upsert_shift:{}", shift().id), "insert_sale:v-1".to_string()]
        );

        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_shift_written_sale_failed_is_partial() {
        let backend = Arc::new(RecordingBackend::default());
        backend.fail_on("insert_sale").await;
        let (handle, _task) = Outbox::start(backend.clone(), 8);
        let mut reports = handle.subscribe();

        handle.enqueue(sale_batch("v-1")).unwrap();
        let report = reports.recv().await.unwrap();

        assert!(report.is_partial());
        assert_eq!(report.delivered_count(), 1);
        let failure = report.failure().unwrap();
        assert_eq!(failure.kind, "insert_sale");
        assert_eq!(failure.record_id, "v-1");
    }

    #[tokio::test]
    async fn test_steps_after_failure_are_skipped() {
        let backend = Arc::new(RecordingBackend::default());
        backend.fail_on("upsert_shift").await;
        let (handle, _task) = Outbox::start(backend.clone(), 8);
        let mut reports = handle.subscribe();

        handle.enqueue(sale_batch("v-1")).unwrap();
        let report = reports.recv().await.unwrap();

        assert!(report.is_failed());
        assert!(!report.is_partial());
        assert_eq!(report.steps[1].outcome, StepOutcome::Skipped);
        assert!(backend.written.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_not_retried() {
        let backend = Arc::new(RecordingBackend::default());
        backend.fail_on("insert_sale").await;
        let (handle, _task) = Outbox::start(backend.clone(), 8);
        let mut reports = handle.subscribe();

        handle
            .enqueue(WriteBatch::new("complete_sale").then(OutboundWrite::InsertSale(sale("v-1"))))
            .unwrap();
        handle
            .enqueue(WriteBatch::new("complete_sale").then(OutboundWrite::InsertSale(sale("v-2"))))
            .unwrap();

        let first = reports.recv().await.unwrap();
        let second = reports.recv().await.unwrap();
        assert!(first.batch_id < second.batch_id);
        assert_eq!(second.steps[0].record_id, "v-2");
        assert!(backend.written.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_full_queue_drops_batch() {
        let backend = Arc::new(RecordingBackend::default());
        // Processor never runs, so the queue fills up.
        let (_outbox, handle) = Outbox::new(backend, 1);

        handle.enqueue(sale_batch("v-1")).unwrap();
        let err = handle.enqueue(sale_batch("v-2")).unwrap_err();
        assert!(matches!(err, SyncError::QueueFull { capacity: 1 }));
    }

    #[tokio::test]
    async fn test_shutdown_drains_queued_batches() {
        let backend = Arc::new(RecordingBackend::default());
        let (outbox, handle) = Outbox::new(backend.clone(), 8);

        handle.enqueue(sale_batch("v-1")).unwrap();
        handle.enqueue(sale_batch("v-2")).unwrap();
        handle.shutdown().await.unwrap();

        outbox.run().await;

        assert_eq!(backend.written.read().await.len(), 4);
        assert!(matches!(
            handle.enqueue(sale_batch("v-3")),
            Err(SyncError::ShuttingDown)
        ));
    }

    #[test]
    fn test_report_serializes_outcome_inline() {
        let report = DeliveryReport {
            batch_id: 3,
            label: "complete_sale".into(),
            steps: vec![StepReport {
                kind: "insert_sale",
                record_id: "v-1".into(),
                outcome: StepOutcome::Failed {
                    error: "disk full".into(),
                },
            }],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["steps"][0]["outcome"], "failed");
        assert_eq!(json["steps"][0]["error"], "disk full");
        assert_eq!(json["batchId"], 3);
    }
}
