//! Page driver backed by a browserless rendering service.
//!
//! Fetches fully rendered HTML for each results page through the
//! `/content` endpoint and answers selector lookups against the parsed
//! document. Pagination is URL-driven via a `start` offset. Everything a
//! real browser session would do beyond rendering (login, clicking
//! through detail panes) stays outside this driver.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::debug;

use crate::error::{DriverError, DriverResult};
use crate::traits::driver::{ListingHandle, PageDriver, PageTurn};

/// One listing card per result row.
const LISTING_CARD: &str = "li.scaffold-layout__list-item";

/// The pagination control; absent or disabled means the last page.
const NEXT_BUTTON: &str = "button.jobs-search-pagination__button--next";

/// Listings per results page, used for the `start` offset.
const PAGE_SIZE: usize = 25;

/// Rendered-HTML page driver.
pub struct BrowserlessDriver {
    client: Client,
    base_url: String,
    token: Option<String>,
    search_url: String,
    page: usize,
    current_html: Option<String>,
}

impl BrowserlessDriver {
    /// Create a driver for one search-results URL.
    ///
    /// Fails if the HTTP client cannot be constructed; every request the
    /// driver makes carries a bounded timeout.
    pub fn new(
        base_url: &str,
        token: Option<&str>,
        search_url: impl Into<String>,
    ) -> DriverResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DriverError::Transport(e.to_string().into()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            search_url: search_url.into(),
            page: 0,
            current_html: None,
        })
    }

    fn page_url(&self, page: usize) -> String {
        if page == 0 {
            return self.search_url.clone();
        }
        let separator = if self.search_url.contains('?') { '&' } else { '?' };
        format!("{}{}start={}", self.search_url, separator, page * PAGE_SIZE)
    }

    /// Fetch rendered HTML for a URL via the `/content` endpoint.
    async fn content(&self, url: &str) -> DriverResult<String> {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(token) = &self.token {
            endpoint.push_str(&format!("?token={token}"));
        }

        let response = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({ "url": url }))
            .send()
            .await
            .map_err(|e| DriverError::Transport(e.to_string().into()))?;

        if !response.status().is_success() {
            return Err(DriverError::Interaction(format!(
                "render service returned {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| DriverError::Transport(e.to_string().into()))
    }

    async fn ensure_current(&mut self) -> DriverResult<&str> {
        if self.current_html.is_none() {
            let url = self.page_url(self.page);
            debug!(page = self.page + 1, url = %url, "rendering results page");
            let html = self.content(&url).await?;
            self.current_html = Some(html);
        }
        Ok(self.current_html.as_deref().unwrap_or_default())
    }
}

#[async_trait]
impl PageDriver for BrowserlessDriver {
    async fn listings(&mut self) -> DriverResult<Vec<Box<dyn ListingHandle>>> {
        self.ensure_current().await?;
        let document = self.current_html.clone().unwrap_or_default();

        let cards = select_all_html(&document, LISTING_CARD)?;
        Ok(cards
            .into_iter()
            .map(|card| {
                Box::new(RenderedListing {
                    card_html: card,
                    document_html: document.clone(),
                }) as Box<dyn ListingHandle>
            })
            .collect())
    }

    async fn advance(&mut self) -> DriverResult<PageTurn> {
        let current = self.current_html.as_deref().unwrap_or_default();
        if !has_enabled_next_button(current)? {
            return Ok(PageTurn::End);
        }

        let next_url = self.page_url(self.page + 1);
        let html = self.content(&next_url).await?;
        if select_all_html(&html, LISTING_CARD)?.is_empty() {
            return Ok(PageTurn::End);
        }

        self.page += 1;
        self.current_html = Some(html);
        Ok(PageTurn::Advanced)
    }
}

/// A listing materialized from rendered HTML.
///
/// Selector lookups try the card's own markup first and fall back to the
/// surrounding document (where the detail pane of the rendered page lives).
struct RenderedListing {
    card_html: String,
    document_html: String,
}

#[async_trait]
impl ListingHandle for RenderedListing {
    async fn open(&self) -> DriverResult<()> {
        // The rendered document already carries the detail pane.
        Ok(())
    }

    async fn own_text(&self) -> DriverResult<String> {
        Ok(fragment_text(&self.card_html))
    }

    async fn text(&self, selector: &str) -> DriverResult<String> {
        if let Some(text) = select_first_text(&self.card_html, selector)? {
            return Ok(text);
        }
        select_first_text(&self.document_html, selector)?
            .ok_or_else(|| DriverError::NotFound { selector: selector.to_string() })
    }

    async fn text_all(&self, selector: &str) -> DriverResult<Vec<String>> {
        let mut texts = select_all_text(&self.card_html, selector)?;
        if texts.is_empty() {
            texts = select_all_text(&self.document_html, selector)?;
        }
        if texts.is_empty() {
            return Err(DriverError::NotFound { selector: selector.to_string() });
        }
        Ok(texts)
    }
}

fn parse_selector(selector: &str) -> DriverResult<Selector> {
    Selector::parse(selector)
        .map_err(|e| DriverError::Parse(format!("bad selector {selector}: {e}")))
}

fn element_text(element: scraper::ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn fragment_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .text()
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn select_first_text(html: &str, selector: &str) -> DriverResult<Option<String>> {
    let parsed = parse_selector(selector)?;
    let fragment = Html::parse_fragment(html);
    Ok(fragment.select(&parsed).next().map(element_text))
}

fn select_all_text(html: &str, selector: &str) -> DriverResult<Vec<String>> {
    let parsed = parse_selector(selector)?;
    let fragment = Html::parse_fragment(html);
    Ok(fragment.select(&parsed).map(element_text).collect())
}

fn select_all_html(html: &str, selector: &str) -> DriverResult<Vec<String>> {
    let parsed = parse_selector(selector)?;
    let document = Html::parse_document(html);
    Ok(document.select(&parsed).map(|el| el.html()).collect())
}

fn has_enabled_next_button(html: &str) -> DriverResult<bool> {
    let parsed = parse_selector(NEXT_BUTTON)?;
    let document = Html::parse_document(html);
    Ok(document
        .select(&parsed)
        .any(|button| button.value().attr("disabled").is_none()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <ul>
            <li class="scaffold-layout__list-item">Backend Engineer\nAcme</li>
            <li class="scaffold-layout__list-item">Data Engineer\nGlobex</li>
          </ul>
          <div class="jobs-description__container">Great job.</div>
          <button class="jobs-search-pagination__button--next">Next</button>
        </body></html>
    "#;

    const LAST_PAGE: &str = r#"
        <html><body>
          <li class="scaffold-layout__list-item">Only one</li>
          <button class="jobs-search-pagination__button--next" disabled>Next</button>
        </body></html>
    "#;

    #[test]
    fn test_cards_selected_in_document_order() {
        let cards = select_all_html(PAGE, LISTING_CARD).unwrap();
        assert_eq!(cards.len(), 2);
        assert!(cards[0].contains("Backend Engineer"));
    }

    #[test]
    fn test_next_button_states() {
        assert!(has_enabled_next_button(PAGE).unwrap());
        assert!(!has_enabled_next_button(LAST_PAGE).unwrap());
        assert!(!has_enabled_next_button("<html><body></body></html>").unwrap());
    }

    #[tokio::test]
    async fn test_handle_falls_back_to_document() {
        let handle = RenderedListing {
            card_html: r#"<li class="scaffold-layout__list-item">Backend Engineer</li>"#.into(),
            document_html: PAGE.to_string(),
        };

        let description = handle.text(".jobs-description__container").await.unwrap();
        assert_eq!(description, "Great job.");

        let missing = handle.text(".does-not-exist").await;
        assert!(matches!(missing, Err(DriverError::NotFound { .. })));
    }

    #[test]
    fn test_page_url_offsets() {
        let driver = BrowserlessDriver::new(
            "http://localhost:3000",
            None,
            "https://example.com/jobs/search?keywords=python",
        )
        .unwrap();

        assert_eq!(driver.page_url(0), "https://example.com/jobs/search?keywords=python");
        assert_eq!(
            driver.page_url(2),
            "https://example.com/jobs/search?keywords=python&start=50"
        );
    }

    #[test]
    fn test_new_surfaces_client_construction() {
        // Construction returns a result so a failed client build is an
        // error, never a fallback client without the request timeout.
        let driver = BrowserlessDriver::new("http://localhost:3000/", Some("secret"), "u");
        assert!(driver.is_ok());
        assert_eq!(driver.unwrap().base_url, "http://localhost:3000");
    }
}
