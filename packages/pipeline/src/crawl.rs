//! Crawl pipeline: paginate, extract, persist.
//!
//! Listings are visited and persisted in on-page order, pages in ascending
//! order. One listing failing never advances or aborts pagination; running
//! out of pages is clean termination, not an error.

use tracing::{info, warn};

use crate::error::Result;
use crate::extract::extract;
use crate::traits::driver::{PageDriver, PageTurn};
use crate::traits::store::ListingStore;

/// Counters reported after a crawl run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Result pages visited.
    pub pages: usize,

    /// Listing elements seen across all pages.
    pub attempted: usize,

    /// Rows successfully inserted.
    pub inserted: usize,

    /// Elements skipped after an extraction or persistence failure.
    pub skipped: usize,
}

/// Crawl every results page, extracting and persisting each listing.
///
/// Per-element failures are logged and skipped. A failure listing the
/// elements of the first page ends the run with whatever was persisted so
/// far; the residual listings are picked up by a future run.
pub async fn crawl<D, S>(driver: &mut D, store: &S) -> Result<CrawlReport>
where
    D: PageDriver + ?Sized,
    S: ListingStore + ?Sized,
{
    let mut report = CrawlReport::default();

    loop {
        let handles = match driver.listings().await {
            Ok(handles) => handles,
            Err(e) => {
                warn!(page = report.pages + 1, error = %e, "could not list elements, ending crawl");
                break;
            }
        };

        report.pages += 1;
        info!(page = report.pages, elements = handles.len(), "processing results page");

        for (index, handle) in handles.iter().enumerate() {
            report.attempted += 1;

            let listing = match extract(handle.as_ref()).await {
                Ok(listing) => listing,
                Err(e) => {
                    warn!(page = report.pages, element = index + 1, error = %e, "extraction failed, skipping element");
                    report.skipped += 1;
                    continue;
                }
            };

            match store.insert(listing).await {
                Ok(id) => {
                    info!(page = report.pages, element = index + 1, id, "listing persisted");
                    report.inserted += 1;
                }
                Err(e) => {
                    warn!(page = report.pages, element = index + 1, error = %e, "insert failed, skipping element");
                    report.skipped += 1;
                }
            }
        }

        match driver.advance().await {
            Ok(PageTurn::Advanced) => continue,
            Ok(PageTurn::End) => {
                info!(pages = report.pages, "last page reached");
                break;
            }
            Err(e) => {
                info!(pages = report.pages, error = %e, "next page control unavailable, ending crawl");
                break;
            }
        }
    }

    info!(
        pages = report.pages,
        attempted = report.attempted,
        inserted = report.inserted,
        skipped = report.skipped,
        "crawl complete"
    );

    Ok(report)
}
