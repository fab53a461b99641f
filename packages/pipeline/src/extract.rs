//! Field extraction from a listing element.
//!
//! Each field tries a primary selector and then fallbacks in a fixed
//! priority order; when everything misses, a sentinel value is assigned
//! instead of failing the listing. A listing with an unknown sector is
//! still worth keeping; a crawl that aborts on the first missing field
//! is not.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::error::{DriverError, DriverResult};
use crate::traits::driver::ListingHandle;
use crate::types::listing::RawListing;

/// CSS selectors for the job detail pane, primary first.
pub mod selectors {
    pub const DESCRIPTION: &str = ".jobs-description__container";
    pub const COMPANY: &str = ".jobs-unified-top-card__company-name";
    pub const COMPANY_FALLBACK: &str = ".artdeco-entity-lockup__subtitle";
    pub const LOCATION: &str =
        "div.job-details-jobs-unified-top-card__tertiary-description-container span";
    pub const INSIGHTS: &str = "li.job-details-jobs-unified-top-card__job-insight";
    pub const SECTOR: &str = "div.t-14.mt5";
}

/// Sentinels assigned when a field cannot be determined.
pub mod sentinels {
    pub const COMPANY: &str = "Şirket bilgisi bulunamadı";
    pub const LOCATION: &str = "Konum bilgisi bulunamadı";
    pub const SECTOR: &str = "Sektör bilgisi bulunamadı";
    pub const REMOTE_TYPE: &str = "Bilinmiyor";
}

/// Keywords that mark an insight line as describing the working arrangement.
const REMOTE_KEYWORDS: [&str; 6] = ["remote", "uzaktan", "hibrit", "hybrid", "ofis", "on-site"];

/// Extract a structured listing from one page element.
///
/// Opening the element and reading the title and description are required;
/// their failure fails this listing (the crawl loop catches it and moves
/// on). Every other field degrades per-field to its sentinel.
pub async fn extract(handle: &dyn ListingHandle) -> DriverResult<RawListing> {
    handle.open().await?;

    let title = first_line(&handle.own_text().await?).ok_or_else(|| DriverError::Parse(
        "listing card has no visible text".to_string(),
    ))?;
    let description = handle.text(selectors::DESCRIPTION).await?.trim().to_string();

    let company_name = first_match(
        handle,
        &[selectors::COMPANY, selectors::COMPANY_FALLBACK],
        sentinels::COMPANY,
    )
    .await;

    let location = match handle.text(selectors::LOCATION).await {
        Ok(raw) => location_from(&raw),
        Err(e) => {
            debug!(error = %e, "location selector missed");
            sentinels::LOCATION.to_string()
        }
    };

    let remote_type = match handle.text_all(selectors::INSIGHTS).await {
        Ok(insights) => classify_remote_type(&insights),
        Err(e) => {
            debug!(error = %e, "insight selector missed");
            sentinels::REMOTE_TYPE.to_string()
        }
    };

    let sector = match handle.text(selectors::SECTOR).await {
        Ok(raw) => clean_sector(&raw),
        Err(e) => {
            debug!(error = %e, "sector selector missed");
            sentinels::SECTOR.to_string()
        }
    };

    Ok(RawListing {
        title,
        description,
        company_name,
        location,
        sector,
        remote_type,
    })
}

/// Try selectors in priority order; fall back to the sentinel.
async fn first_match(
    handle: &dyn ListingHandle,
    candidates: &[&str],
    sentinel: &str,
) -> String {
    for selector in candidates {
        match handle.text(selector).await {
            Ok(text) if !text.trim().is_empty() => return text.trim().to_string(),
            Ok(_) => continue,
            Err(e) => {
                debug!(selector, error = %e, "selector missed, trying fallback");
            }
        }
    }
    sentinel.to_string()
}

/// The card's title is its first visible text line.
fn first_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// The tertiary description packs location and extras into one line
/// separated by middle dots; the location is the first segment.
fn location_from(raw: &str) -> String {
    let location = raw.split(" · ").next().unwrap_or(raw).trim();
    if location.is_empty() {
        sentinels::LOCATION.to_string()
    } else {
        location.to_string()
    }
}

/// Classify the working arrangement from the insight lines.
///
/// The first insight containing any known keyword wins and its full text is
/// kept as the label.
pub fn classify_remote_type(insights: &[String]) -> String {
    insights
        .iter()
        .find(|insight| {
            let lower = insight.to_lowercase();
            REMOTE_KEYWORDS.iter().any(|kw| lower.contains(kw))
        })
        .map(|insight| insight.trim().to_string())
        .unwrap_or_else(|| sentinels::REMOTE_TYPE.to_string())
}

/// Strip the trailing employee-count clause from the sector line.
///
/// The source line reads like "Technology, Information and Internet
/// 51-200 employees"; everything from the first digit run onward goes.
/// Sector stays best-effort free text, not a closed taxonomy.
pub fn clean_sector(raw: &str) -> String {
    static COUNT_CLAUSE: OnceLock<Regex> = OnceLock::new();
    let re = COUNT_CLAUSE.get_or_init(|| Regex::new(r"\d+\+*.*$").expect("valid regex"));

    let cleaned = re.replace(raw.trim(), "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        sentinels::SECTOR.to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedListing;

    fn full_listing() -> ScriptedListing {
        ScriptedListing::new("Senior Python Developer\nAcme GmbH\nBerlin")
            .with_text(selectors::DESCRIPTION, "We are hiring a Python developer.")
            .with_text(selectors::COMPANY, "Acme GmbH")
            .with_text(selectors::LOCATION, "Berlin, Germany · Reposted 2 weeks ago")
            .with_texts(
                selectors::INSIGHTS,
                ["€60K/yr - €80K/yr", "Hybrid Full-time"],
            )
            .with_text(selectors::SECTOR, "Technology, Information and Internet 51-200 employees")
    }

    #[tokio::test]
    async fn test_extracts_all_fields() {
        let listing = extract(&full_listing()).await.unwrap();

        assert_eq!(listing.title, "Senior Python Developer");
        assert_eq!(listing.description, "We are hiring a Python developer.");
        assert_eq!(listing.company_name, "Acme GmbH");
        assert_eq!(listing.location, "Berlin, Germany");
        assert_eq!(listing.remote_type, "Hybrid Full-time");
        assert_eq!(listing.sector, "Technology, Information and Internet");
    }

    #[tokio::test]
    async fn test_company_fallback_ordering() {
        // Primary selector misses; the secondary value must win over the
        // sentinel.
        let handle = full_listing()
            .without_text(selectors::COMPANY)
            .with_text(selectors::COMPANY_FALLBACK, "Acme Subsidiary");

        let listing = extract(&handle).await.unwrap();
        assert_eq!(listing.company_name, "Acme Subsidiary");
    }

    #[tokio::test]
    async fn test_missing_optional_fields_degrade_to_sentinels() {
        let handle = ScriptedListing::new("Data Engineer")
            .with_text(selectors::DESCRIPTION, "desc");

        let listing = extract(&handle).await.unwrap();
        assert_eq!(listing.company_name, sentinels::COMPANY);
        assert_eq!(listing.location, sentinels::LOCATION);
        assert_eq!(listing.sector, sentinels::SECTOR);
        assert_eq!(listing.remote_type, sentinels::REMOTE_TYPE);
    }

    #[tokio::test]
    async fn test_missing_description_fails_listing() {
        let handle = ScriptedListing::new("Data Engineer");
        assert!(extract(&handle).await.is_err());
    }

    #[test]
    fn test_remote_classification_first_match_wins() {
        let insights = vec![
            "Full-time".to_string(),
            "Uzaktan çalışma".to_string(),
            "Hybrid".to_string(),
        ];
        assert_eq!(classify_remote_type(&insights), "Uzaktan çalışma");
    }

    #[test]
    fn test_remote_classification_without_keyword() {
        let insights = vec!["Full-time".to_string(), "Mid-Senior level".to_string()];
        assert_eq!(classify_remote_type(&insights), sentinels::REMOTE_TYPE);
    }

    #[test]
    fn test_sector_count_clause_stripped() {
        assert_eq!(clean_sector("Financial Services 10.001+ employees"), "Financial Services");
        assert_eq!(clean_sector("Healthcare"), "Healthcare");
    }

    #[test]
    fn test_all_numeric_sector_degrades() {
        assert_eq!(clean_sector("50+ employees"), sentinels::SECTOR);
    }
}
