// src/store/mod.rs
pub mod crop;
pub mod dataset;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use futures::future::try_join_all;
use serde::Serialize;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, PoisonError, RwLock,
    },
};
use tokio::{sync::Mutex, time::Instant};
use tracing::{debug, error, info, instrument, warn};

pub use crop::{CropRecord, SowingWindows, Spacing};
pub use dataset::{CropSowingDates, Dataset};

use crate::{
    calendar::{Language, NepaliMonth, Region},
    error::StoreError,
    fertilizer::{FertilizerMatch, FertilizerQuantities, ProductAmount},
    records::{FruitTreeRate, LimeRequirement, PhEntry},
    table::{parse_table, TableId, TableSource},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreState {
    Uninitialized,
    Loading,
    Ready,
}

/// Clears the loading flag however the load ends, including cancellation.
struct LoadingFlag<'a>(&'a AtomicBool);

impl<'a> LoadingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        LoadingFlag(flag)
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Read-only agronomic data, loaded once from a [`TableSource`] and then
/// queried synchronously.
///
/// Queries read an immutable [`Dataset`] snapshot. A load builds a complete new
/// snapshot before publishing it, so a failed or in-flight load is never
/// visible to readers.
pub struct AgroDataStore {
    source: Box<dyn TableSource>,
    dataset: RwLock<Option<Arc<Dataset>>>,
    /// Serializes loads; at most one is in flight.
    load_gate: Mutex<()>,
    loading: AtomicBool,
    load_count: AtomicUsize,
}

impl AgroDataStore {
    pub fn new(source: impl TableSource + 'static) -> Self {
        Self::from_boxed(Box::new(source))
    }

    pub fn from_boxed(source: Box<dyn TableSource>) -> Self {
        Self {
            source,
            dataset: RwLock::new(None),
            load_gate: Mutex::new(()),
            loading: AtomicBool::new(false),
            load_count: AtomicUsize::new(0),
        }
    }

    pub fn state(&self) -> StoreState {
        if self.is_ready() {
            StoreState::Ready
        } else if self.loading.load(Ordering::SeqCst) {
            StoreState::Loading
        } else {
            StoreState::Uninitialized
        }
    }

    pub fn is_ready(&self) -> bool {
        self.dataset
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Number of load attempts started so far.
    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }

    /// Load every table unless a previous call already did.
    ///
    /// Callers arriving while a load is in flight wait for it and return its
    /// outcome without loading again. On failure the store stays not ready and
    /// the next call retries.
    pub async fn initialize(&self) -> Result<()> {
        if self.is_ready() {
            return Ok(());
        }
        let _gate = self.load_gate.lock().await;
        if self.is_ready() {
            debug!("store became ready while waiting for the load gate");
            return Ok(());
        }
        self.load().await
    }

    /// Rebuild the dataset from the source. The previous snapshot keeps
    /// serving until the new one is complete, and stays if the reload fails.
    pub async fn reload(&self) -> Result<()> {
        let _gate = self.load_gate.lock().await;
        self.load().await
    }

    #[instrument(level = "info", skip(self), fields(attempt = tracing::field::Empty))]
    async fn load(&self) -> Result<()> {
        let _flag = LoadingFlag::raise(&self.loading);
        let attempt = self.load_count.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::Span::current().record("attempt", attempt as u64);

        let t0 = Instant::now();
        match self.fetch_and_build().await {
            Ok(dataset) => {
                let rows = dataset.calendar().len();
                *self.dataset.write().unwrap_or_else(PoisonError::into_inner) =
                    Some(Arc::new(dataset));
                info!(
                    tables = TableId::ALL.len(),
                    calendar_rows = rows,
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "agronomic data loaded"
                );
                Ok(())
            }
            Err(e) => {
                error!(error = %format!("{:#}", e), "loading agronomic data failed");
                Err(e)
            }
        }
    }

    async fn fetch_and_build(&self) -> Result<Dataset> {
        let tables = try_join_all(TableId::ALL.into_iter().map(|id| async move {
            let text = self
                .source
                .fetch(id)
                .await
                .with_context(|| format!("fetching table {}", id))?;
            let raw = parse_table(&text).with_context(|| format!("parsing table {}", id))?;
            if raw.dropped > 0 {
                warn!(table = %id, dropped = raw.dropped, "rows with wrong field count dropped");
            }
            debug!(table = %id, rows = raw.rows.len(), "table parsed");
            Ok::<_, anyhow::Error>((id, raw))
        }))
        .await?;

        Dataset::from_tables(tables.into_iter().collect::<HashMap<_, _>>())
    }

    /// The current snapshot.
    pub fn dataset(&self) -> Result<Arc<Dataset>, StoreError> {
        self.dataset
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(StoreError::NotReady)
    }

    pub fn crops_data(&self, lang: Language) -> Result<Vec<CropRecord>, StoreError> {
        Ok(self.dataset()?.crops_data(lang))
    }

    pub fn all_crops(&self, lang: Language) -> Result<Vec<CropRecord>, StoreError> {
        Ok(self.dataset()?.all_crops(lang))
    }

    pub fn crops_by_month(
        &self,
        month: NepaliMonth,
        region: Region,
        lang: Language,
    ) -> Result<Vec<CropRecord>, StoreError> {
        Ok(self.dataset()?.crops_by_month(month, region, lang))
    }

    pub fn search_crops(&self, query: &str, lang: Language) -> Result<Vec<CropRecord>, StoreError> {
        Ok(self.dataset()?.search_crops(query, lang))
    }

    pub fn fertilizer_info(&self, crop: &str, region: Region) -> Result<FertilizerQuantities, StoreError> {
        Ok(self.dataset()?.fertilizer_info(crop, region))
    }

    pub fn fertilizer_match(&self, crop: &str, region: Region) -> Result<FertilizerMatch, StoreError> {
        Ok(self.dataset()?.fertilizer_match(crop, region))
    }

    pub fn fertilizer_products(
        &self,
        need: &FertilizerQuantities,
        lang: Language,
    ) -> Result<Vec<ProductAmount>, StoreError> {
        Ok(self.dataset()?.fertilizer_products(need, lang))
    }

    pub fn ph_info(&self, crop: &str, lang: Language) -> Result<Option<PhEntry>, StoreError> {
        Ok(self.dataset()?.ph_info(crop, lang).cloned())
    }

    pub fn lime_requirement(&self, ph: f64, texture: &str) -> Result<Option<LimeRequirement>, StoreError> {
        Ok(self.dataset()?.lime_requirement(ph, texture).cloned())
    }

    pub fn fruit_tree_rates(&self, query: &str) -> Result<Vec<FruitTreeRate>, StoreError> {
        Ok(self
            .dataset()?
            .fruit_tree_rates(query)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn sowing_calendar(
        &self,
        region: Region,
        lang: Language,
        today: NaiveDate,
    ) -> Result<Vec<CropSowingDates>, StoreError> {
        Ok(self.dataset()?.sowing_calendar(region, lang, today))
    }
}
