//! Model-derived analysis of a listing.

use serde::{Deserialize, Serialize};

/// Sentinel stored when the model leaves a scalar field empty.
pub const UNSPECIFIED: &str = "Belirtilmemiş";

/// Working arrangement reported by the model.
///
/// The prompt demands one of `remote`, `hybrid` or `on-site`, but models
/// occasionally answer with free text; that is preserved as a best-effort
/// label rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WorkType {
    Remote,
    Hybrid,
    OnSite,
    Other(String),
}

impl From<String> for WorkType {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "remote" => Self::Remote,
            "hybrid" => Self::Hybrid,
            "on-site" | "onsite" | "on site" => Self::OnSite,
            _ => Self::Other(raw),
        }
    }
}

impl From<WorkType> for String {
    fn from(work_type: WorkType) -> Self {
        work_type.as_str().to_string()
    }
}

impl WorkType {
    /// The label persisted to `job_analysis.work_type`.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Remote => "remote",
            Self::Hybrid => "hybrid",
            Self::OnSite => "on-site",
            Self::Other(label) => label,
        }
    }
}

/// Structured enrichment of one listing.
///
/// Exactly one row per `job_listings.id`; created by the enrichment pipeline
/// and never mutated. The uniqueness is upheld by the fetch-unanalyzed
/// anti-join, not a database constraint, so only one enrichment run may
/// execute at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobAnalysis {
    pub hard_skills: Vec<String>,
    pub soft_skills: Vec<String>,
    pub location: String,
    pub sector: String,
    pub responsibilities: Vec<String>,
    pub work_type: WorkType,
    pub title_skills: Vec<String>,
}

impl JobAnalysis {
    /// Validate a raw model payload against the response schema.
    ///
    /// All seven keys must be present; the four skill fields must be JSON
    /// arrays of strings and the scalars must be strings. Anything else is
    /// malformed and rejected rather than coerced. Unknown extra keys are
    /// ignored.
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }

    /// Substitute the sentinel for empty scalar fields before persistence.
    pub fn with_defaults(mut self) -> Self {
        if self.location.trim().is_empty() {
            self.location = UNSPECIFIED.to_string();
        }
        if self.sector.trim().is_empty() {
            self.sector = UNSPECIFIED.to_string();
        }
        if let WorkType::Other(label) = &self.work_type {
            if label.trim().is_empty() {
                self.work_type = WorkType::Other(UNSPECIFIED.to_string());
            }
        }
        self
    }
}
