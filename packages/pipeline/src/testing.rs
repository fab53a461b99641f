//! Test doubles for the driver and model capabilities.
//!
//! Scripted implementations with no I/O; unit and integration tests drive
//! the pipelines against these instead of a browser session or a paid API.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{DriverError, DriverResult, ModelError, ModelResult};
use crate::traits::driver::{ListingHandle, PageDriver, PageTurn};
use crate::traits::model::ModelClient;

/// A listing element scripted with per-selector text.
#[derive(Debug, Clone, Default)]
pub struct ScriptedListing {
    own_text: String,
    texts: HashMap<String, Vec<String>>,
    broken: bool,
}

impl ScriptedListing {
    /// A listing whose card shows the given text.
    pub fn new(own_text: impl Into<String>) -> Self {
        Self {
            own_text: own_text.into(),
            ..Self::default()
        }
    }

    /// A listing that fails on open.
    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    /// Script a single text for a selector.
    pub fn with_text(mut self, selector: &str, text: impl Into<String>) -> Self {
        self.texts.insert(selector.to_string(), vec![text.into()]);
        self
    }

    /// Script multiple texts for a selector.
    pub fn with_texts<I, T>(mut self, selector: &str, texts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.texts
            .insert(selector.to_string(), texts.into_iter().map(Into::into).collect());
        self
    }

    /// Remove a scripted selector so lookups miss.
    pub fn without_text(mut self, selector: &str) -> Self {
        self.texts.remove(selector);
        self
    }
}

#[async_trait]
impl ListingHandle for ScriptedListing {
    async fn open(&self) -> DriverResult<()> {
        if self.broken {
            return Err(DriverError::Interaction("scripted open failure".to_string()));
        }
        Ok(())
    }

    async fn own_text(&self) -> DriverResult<String> {
        Ok(self.own_text.clone())
    }

    async fn text(&self, selector: &str) -> DriverResult<String> {
        self.texts
            .get(selector)
            .and_then(|texts| texts.first())
            .cloned()
            .ok_or_else(|| DriverError::NotFound { selector: selector.to_string() })
    }

    async fn text_all(&self, selector: &str) -> DriverResult<Vec<String>> {
        self.texts
            .get(selector)
            .cloned()
            .ok_or_else(|| DriverError::NotFound { selector: selector.to_string() })
    }
}

/// A page driver scripted with a fixed sequence of pages.
pub struct ScriptedDriver {
    pages: Vec<Vec<ScriptedListing>>,
    current: usize,
    failing_advance: bool,
    failing_listings: bool,
}

impl ScriptedDriver {
    pub fn new(pages: Vec<Vec<ScriptedListing>>) -> Self {
        Self {
            pages,
            current: 0,
            failing_advance: false,
            failing_listings: false,
        }
    }

    /// Make the next-page turn fail.
    pub fn failing_advance(mut self) -> Self {
        self.failing_advance = true;
        self
    }

    /// Make listing enumeration fail.
    pub fn failing_listings(mut self) -> Self {
        self.failing_listings = true;
        self
    }
}

#[async_trait]
impl PageDriver for ScriptedDriver {
    async fn listings(&mut self) -> DriverResult<Vec<Box<dyn ListingHandle>>> {
        if self.failing_listings {
            return Err(DriverError::Interaction("scripted listing failure".to_string()));
        }
        let page = self.pages.get(self.current).cloned().unwrap_or_default();
        Ok(page
            .into_iter()
            .map(|listing| Box::new(listing) as Box<dyn ListingHandle>)
            .collect())
    }

    async fn advance(&mut self) -> DriverResult<PageTurn> {
        if self.failing_advance {
            return Err(DriverError::NotFound {
                selector: "scripted next button".to_string(),
            });
        }
        if self.current + 1 < self.pages.len() {
            self.current += 1;
            Ok(PageTurn::Advanced)
        } else {
            Ok(PageTurn::End)
        }
    }
}

/// A model client scripted with queued responses.
///
/// Responses are consumed in order; an exhausted queue answers with an
/// empty-response error. Prompts are recorded for assertions.
#[derive(Default)]
pub struct MockModel {
    responses: Mutex<VecDeque<ModelResult<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl MockModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response.
    pub fn with_response(self, response: impl Into<String>) -> Self {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(Ok(response.into()));
        }
        self
    }

    /// Queue a provider error.
    pub fn with_error(self, message: impl Into<String>) -> Self {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(Err(ModelError::Api(message.into())));
        }
        self
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Number of completion calls made.
    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ModelClient for MockModel {
    async fn complete_json(&self, prompt: &str) -> ModelResult<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.responses
            .lock()
            .ok()
            .and_then(|mut responses| responses.pop_front())
            .unwrap_or(Err(ModelError::EmptyResponse))
    }
}
