//! Raw job listings as scraped from a results page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Column caps for `job_listings`. Oversized input is truncated, not
/// rejected, before persistence.
pub const TITLE_MAX: usize = 255;
pub const COMPANY_MAX: usize = 255;
pub const LOCATION_MAX: usize = 255;
pub const SECTOR_MAX: usize = 255;
pub const REMOTE_TYPE_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 2000;

/// One scraped job posting's raw text fields, before the store assigns an id.
///
/// Created once per crawled element and immutable after insert. The crawl is
/// deliberately not idempotent: re-running it against already-seen listings
/// creates duplicate rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawListing {
    pub title: String,
    pub description: String,
    pub company_name: String,
    pub location: String,
    pub sector: String,
    pub remote_type: String,
}

impl RawListing {
    /// Apply the column caps, truncating on character boundaries.
    pub fn capped(self) -> Self {
        Self {
            title: truncate_chars(self.title, TITLE_MAX),
            description: truncate_chars(self.description, DESCRIPTION_MAX),
            company_name: truncate_chars(self.company_name, COMPANY_MAX),
            location: truncate_chars(self.location, LOCATION_MAX),
            sector: truncate_chars(self.sector, SECTOR_MAX),
            remote_type: truncate_chars(self.remote_type, REMOTE_TYPE_MAX),
        }
    }
}

/// A persisted listing, as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredListing {
    /// Store-assigned id.
    pub id: i64,
    pub title: String,
    pub description: String,
    pub company_name: String,
    pub location: String,
    pub sector: String,
    pub remote_type: String,
    pub scraped_at: DateTime<Utc>,
}

/// Truncate a string to at most `max` characters.
fn truncate_chars(s: String, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s,
    }
}
