//! Fakes shared by the command tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use gastro_core::{Ingredient, Product, Sale, Shift, TaxEntry, User, WasteEntry};
use gastro_sync::{
    DeliveryReport, Outbox, PersistenceBackend, SyncError, SyncResult, TerminalConfig,
};

use crate::state::{Mirror, Terminal};

/// Records every write as `"kind:id"`, failing the kinds it is told to.
#[derive(Default)]
pub(crate) struct RecordingBackend {
    pub writes: RwLock<Vec<String>>,
    pub failing: RwLock<Vec<&'static str>>,
}

impl RecordingBackend {
    pub async fn fail_on(&self, kind: &'static str) {
        self.failing.write().await.push(kind);
    }

    pub async fn writes(&self) -> Vec<String> {
        self.writes.read().await.clone()
    }

    async fn record(&self, kind: &'static str, id: &str) -> SyncResult<()> {
        if self.failing.read().await.contains(&kind) {
            return Err(SyncError::Persistence(format!("{kind} rejected")));
        }
        self.writes.write().await.push(format!("{kind}:{id}"));
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

/// A till mirrored to a [`RecordingBackend`], with a report subscription
/// taken before any command runs.
pub(crate) async fn mirrored_terminal(
    config: &TerminalConfig,
) -> (Terminal, Arc<RecordingBackend>, broadcast::Receiver<DeliveryReport>) {
    let backend = Arc::new(RecordingBackend::default());
    let (outbox, _task) = Outbox::start(backend.clone(), config.outbox.capacity);
    let reports = outbox.subscribe();
    let mirror = Mirror {
        backend: backend.clone(),
        outbox,
    };
    let terminal = Terminal::boot(config, Some(mirror)).await;
    (terminal, backend, reports)
}

/// Waits for the report of `batch_id`.
pub(crate) async fn report_for(
    reports: &mut broadcast::Receiver<DeliveryReport>,
    batch_id: u64,
) -> DeliveryReport {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let report = reports.recv().await.expect("report channel closed");
            if report.batch_id == batch_id {
                return report;
            }
        }
    })
    .await
    .expect("no delivery report")
}
