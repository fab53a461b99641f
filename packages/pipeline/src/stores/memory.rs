//! In-memory storage implementation for testing and development.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{StoreError, StoreResult};
use crate::traits::store::{AnalysisStore, ListingStore};
use crate::types::analysis::JobAnalysis;
use crate::types::listing::{RawListing, StoredListing};

/// One persisted analysis row.
#[derive(Debug, Clone)]
pub struct AnalysisRow {
    pub job_id: i64,
    pub analysis: JobAnalysis,
    pub scraped_at: DateTime<Utc>,
}

/// In-memory store for listings and analyses.
///
/// Useful for testing and development. Not suitable for production as data
/// is lost on restart. Failure injection mirrors the states the Postgres
/// store can reach.
#[derive(Default)]
pub struct MemoryStore {
    listings: RwLock<Vec<StoredListing>>,
    analyses: RwLock<Vec<AnalysisRow>>,
    next_id: AtomicI64,
    unavailable: AtomicBool,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    /// Simulate a store whose connection cannot be established.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make every `save` fail with a query error.
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of all persisted listings, in insertion order.
    pub fn listings(&self) -> Vec<StoredListing> {
        self.listings.read().unwrap().clone()
    }

    /// Snapshot of all persisted analyses.
    pub fn analyses(&self) -> Vec<AnalysisRow> {
        self.analyses.read().unwrap().clone()
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("connection refused".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn insert(&self, listing: RawListing) -> StoreResult<i64> {
        self.check_available()?;

        let capped = listing.capped();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.listings.write().unwrap().push(StoredListing {
            id,
            title: capped.title,
            description: capped.description,
            company_name: capped.company_name,
            location: capped.location,
            sector: capped.sector,
            remote_type: capped.remote_type,
            scraped_at: Utc::now(),
        });

        Ok(id)
    }

    async fn fetch_unanalyzed(&self, limit: usize) -> StoreResult<Vec<StoredListing>> {
        self.check_available()?;

        let analyzed: Vec<i64> = self
            .analyses
            .read()
            .unwrap()
            .iter()
            .map(|row| row.job_id)
            .collect();

        let mut residual: Vec<StoredListing> = self
            .listings
            .read()
            .unwrap()
            .iter()
            .filter(|listing| !analyzed.contains(&listing.id))
            .cloned()
            .collect();

        // Newest-scraped first; insertion id breaks timestamp ties.
        residual.sort_by(|a, b| b.scraped_at.cmp(&a.scraped_at).then(b.id.cmp(&a.id)));
        residual.truncate(limit);

        Ok(residual)
    }
}

#[async_trait]
impl AnalysisStore for MemoryStore {
    async fn save(
        &self,
        job_id: i64,
        analysis: &JobAnalysis,
        scraped_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.check_available()?;
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Query("injected save failure".into()));
        }

        self.analyses.write().unwrap().push(AnalysisRow {
            job_id,
            analysis: analysis.clone(),
            scraped_at,
        });

        Ok(())
    }

    async fn analysis_count(&self) -> StoreResult<usize> {
        self.check_available()?;
        Ok(self.analyses.read().unwrap().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(title: &str) -> RawListing {
        RawListing {
            title: title.into(),
            description: "desc".into(),
            company_name: "Acme".into(),
            location: "Berlin".into(),
            sector: "Technology".into(),
            remote_type: "remote".into(),
        }
    }

    fn analysis() -> JobAnalysis {
        JobAnalysis {
            hard_skills: vec!["Python".into()],
            soft_skills: vec![],
            location: "Berlin".into(),
            sector: "Technology".into(),
            responsibilities: vec![],
            work_type: crate::types::analysis::WorkType::Remote,
            title_skills: vec![],
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let store = MemoryStore::new();
        let a = store.insert(listing("a")).await.unwrap();
        let b = store.insert(listing("b")).await.unwrap();
        assert!(b > a);
    }

    #[tokio::test]
    async fn test_insert_truncates_oversized_fields() {
        let store = MemoryStore::new();
        let mut oversized = listing("t");
        oversized.description = "d".repeat(9000);

        store.insert(oversized).await.unwrap();

        let stored = store.listings().pop().unwrap();
        assert_eq!(stored.description.chars().count(), 2000);
    }

    #[tokio::test]
    async fn test_fetch_unanalyzed_is_set_difference() {
        let store = MemoryStore::new();
        let a = store.insert(listing("a")).await.unwrap();
        let b = store.insert(listing("b")).await.unwrap();

        let before = store.fetch_unanalyzed(10).await.unwrap();
        assert_eq!(before.len(), 2);

        store.save(a, &analysis(), Utc::now()).await.unwrap();

        let after = store.fetch_unanalyzed(10).await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].id, b);

        store.save(b, &analysis(), Utc::now()).await.unwrap();
        assert!(store.fetch_unanalyzed(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_unanalyzed_respects_limit_and_recency() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.insert(listing(&format!("job {i}"))).await.unwrap();
        }

        let page = store.fetch_unanalyzed(2).await.unwrap();
        assert_eq!(page.len(), 2);
        // Newest first.
        assert!(page[0].id > page[1].id);
    }

    #[tokio::test]
    async fn test_unavailable_store_is_distinguishable() {
        let store = MemoryStore::new();
        store.set_unavailable(true);

        let err = store.fetch_unanalyzed(10).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
