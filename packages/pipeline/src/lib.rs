//! Job listing ingestion and enrichment pipeline.
//!
//! Two pipelines over one Postgres schema:
//!
//! - **Crawl**: paginate a rendered search-results surface, extract
//!   structured fields from each listing element and persist append-only
//!   raw rows ([`crawl::crawl`]).
//! - **Enrich**: fetch rows with no analysis yet via an anti-join, ask a
//!   language model for a strict-JSON analysis, validate and persist it
//!   ([`enrich::enrich`]).
//!
//! External capabilities (browser rendering, model provider, storage) sit
//! behind traits in [`traits`], with scripted doubles in [`testing`].

pub mod config;
pub mod crawl;
pub mod drivers;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod model;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

pub use config::Config;
pub use crawl::{crawl, CrawlReport};
pub use enrich::{enrich, EnrichReport, EnrichmentClient};
pub use error::{ConfigError, DriverError, ModelError, PipelineError, Result, StoreError};
pub use traits::driver::{ListingHandle, PageDriver, PageTurn};
pub use traits::model::ModelClient;
pub use traits::store::{AnalysisStore, JobStore, ListingStore};
pub use types::analysis::{JobAnalysis, WorkType};
pub use types::listing::{RawListing, StoredListing};
