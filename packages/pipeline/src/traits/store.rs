//! Storage traits for listings and analyses.
//!
//! Split into focused traits: the crawl only needs `ListingStore::insert`,
//! the enrichment pipeline needs both sides.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::types::analysis::JobAnalysis;
use crate::types::listing::{RawListing, StoredListing};

/// Append-only persistence of raw listings.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Insert one listing, returning the store-assigned id.
    ///
    /// Oversized fields are truncated silently; truncation is never an
    /// error. Rows are immutable after insert.
    async fn insert(&self, listing: RawListing) -> StoreResult<i64>;

    /// Listings with no matching analysis row, newest-scraped first,
    /// capped at `limit`.
    ///
    /// This anti-join is the sole idempotency mechanism for enrichment:
    /// re-running the pipeline only ever processes the residual set.
    async fn fetch_unanalyzed(&self, limit: usize) -> StoreResult<Vec<StoredListing>>;
}

/// Persistence of one analysis per listing.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Persist the analysis for `job_id`, carrying over the listing's
    /// `scraped_at`. Rolled back and reported as an error on failure.
    async fn save(
        &self,
        job_id: i64,
        analysis: &JobAnalysis,
        scraped_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Number of persisted analysis rows.
    async fn analysis_count(&self) -> StoreResult<usize>;
}

/// Composite trait for the enrichment pipeline, which reads one side and
/// writes the other.
pub trait JobStore: ListingStore + AnalysisStore {}

// Blanket implementation: anything implementing both sides is a JobStore.
impl<T: ListingStore + AnalysisStore> JobStore for T {}
