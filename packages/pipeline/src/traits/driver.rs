//! Page driver trait, the seam in front of browser automation.

use async_trait::async_trait;

use crate::error::DriverResult;

/// Outcome of asking the driver for the next results page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTurn {
    /// The next page is loaded and ready.
    Advanced,
    /// The "next page" control is absent or disabled. Clean termination.
    End,
}

/// Handle on one listing element within a results page.
///
/// Waits behind these calls are expected to use bounded timeouts; an element
/// that never settles surfaces as a `DriverError`, not an indefinite block.
#[async_trait]
pub trait ListingHandle: Send + Sync {
    /// Bring the listing into view and open its detail pane.
    async fn open(&self) -> DriverResult<()>;

    /// The element's own visible text (the card, not the detail pane).
    async fn own_text(&self) -> DriverResult<String>;

    /// Text of the first node matching `selector`.
    ///
    /// Returns `DriverError::NotFound` when nothing matches, which the
    /// extractor treats as "try the next fallback".
    async fn text(&self, selector: &str) -> DriverResult<String>;

    /// Text of every node matching `selector`, in document order.
    async fn text_all(&self, selector: &str) -> DriverResult<Vec<String>>;
}

/// Driver over a paginated search-results view.
///
/// Implementations wrap whatever renders the page (a browser session, a
/// rendering service, scripted fixtures); the crawl only consumes listings
/// and page turns.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Listing elements on the current page, in on-page order.
    async fn listings(&mut self) -> DriverResult<Vec<Box<dyn ListingHandle>>>;

    /// Activate the "next page" control.
    ///
    /// An `Err` here is treated by the crawl as exhaustion, the same as
    /// `Ok(PageTurn::End)`.
    async fn advance(&mut self) -> DriverResult<PageTurn>;
}
