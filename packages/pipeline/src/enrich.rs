//! Enrichment pipeline: turn free-text descriptions into validated
//! structured analyses via the model capability.
//!
//! A failed enrichment never removes a job from the residual set; the job
//! stays unanalyzed and becomes eligible again on the next run. There is no
//! retry within a single run.

use tracing::{info, warn};

use crate::error::Result;
use crate::traits::model::ModelClient;
use crate::traits::store::JobStore;
use crate::types::analysis::JobAnalysis;
use crate::types::listing::StoredListing;

/// Characters of description embedded into the prompt.
pub const PROMPT_DESCRIPTION_CAP: usize = 3000;

/// Counters reported after an enrichment run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichReport {
    /// Unanalyzed listings fetched.
    pub fetched: usize,

    /// Analyses persisted.
    pub saved: usize,

    /// Jobs where the model call or validation failed.
    pub failed: usize,

    /// Set when the store could not be reached; the run was a no-op and
    /// every job remains eligible for the next invocation.
    pub store_unavailable: bool,
}

/// Client for the structured-extraction call.
pub struct EnrichmentClient<M> {
    model: M,
}

impl<M: ModelClient> EnrichmentClient<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// The underlying model client.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Analyze one listing.
    ///
    /// Returns `None` on any provider error or malformed payload: the job
    /// stays unanalyzed and is retried by a future run, never by this one.
    pub async fn analyze(&self, job: &StoredListing) -> Option<JobAnalysis> {
        let prompt = build_prompt(job);

        let response = match self.model.complete_json(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                warn!(job_id = job.id, error = %e, "model call failed");
                return None;
            }
        };

        match parse_analysis(&response) {
            Some(analysis) => Some(analysis),
            None => {
                warn!(job_id = job.id, "model returned malformed analysis payload");
                None
            }
        }
    }
}

/// Build the fixed-schema prompt for one listing.
pub fn build_prompt(job: &StoredListing) -> String {
    let description: String = job.description.chars().take(PROMPT_DESCRIPTION_CAP).collect();

    format!(
        r#"Analyze the job listing below and reply in STRICT JSON. Reply with the JSON object only, no explanation and no markers:
{{
    "hard_skills": ["list of technical skills"],
    "soft_skills": ["list of interpersonal skills"],
    "location": "City, Country",
    "sector": "Sector name",
    "responsibilities": ["list of responsibilities"],
    "work_type": "exactly remote / hybrid / on-site. If the description does not state it directly, estimate it; never answer with unknown or unspecified.",
    "title_skills": ["the best matching position title derived from the listing title"]
}}

Listing details:
Company: {}
Title: {}
Location: {}
Sector: {}
Working arrangement: {}
Description: {}"#,
        job.company_name, job.title, job.location, job.sector, job.remote_type, description
    )
}

/// Strip optional Markdown code-fence markers around a JSON payload.
pub fn strip_fences(response: &str) -> &str {
    let mut cleaned = response.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest;
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest;
    }
    cleaned.trim()
}

/// Parse and validate a model response into an analysis.
///
/// Rejects (returns `None`) rather than coercing: missing keys, non-array
/// skill fields or unparseable JSON all count as malformed.
pub fn parse_analysis(response: &str) -> Option<JobAnalysis> {
    let value: serde_json::Value = serde_json::from_str(strip_fences(response)).ok()?;
    JobAnalysis::from_value(value)
}

/// Run the enrichment pipeline: fetch unanalyzed listings, analyze each,
/// persist the successes.
///
/// Sequential by design; a second concurrent run could insert duplicate
/// analysis rows because uniqueness rests on the anti-join alone.
pub async fn enrich<S, M>(store: &S, client: &EnrichmentClient<M>, limit: usize) -> Result<EnrichReport>
where
    S: JobStore + ?Sized,
    M: ModelClient,
{
    let mut report = EnrichReport::default();

    let jobs = match store.fetch_unanalyzed(limit).await {
        Ok(jobs) => jobs,
        Err(e) => {
            warn!(error = %e, "could not fetch unanalyzed listings, skipping run");
            report.store_unavailable = true;
            return Ok(report);
        }
    };

    report.fetched = jobs.len();
    if jobs.is_empty() {
        info!("no unanalyzed listings");
        return Ok(report);
    }
    info!(count = jobs.len(), "enriching unanalyzed listings");

    for job in &jobs {
        let Some(analysis) = client.analyze(job).await else {
            report.failed += 1;
            continue;
        };

        let analysis = analysis.with_defaults();
        match store.save(job.id, &analysis, job.scraped_at).await {
            Ok(()) => {
                info!(job_id = job.id, "analysis persisted");
                report.saved += 1;
            }
            Err(e) => {
                warn!(job_id = job.id, error = %e, "analysis save failed");
                report.failed += 1;
            }
        }
    }

    info!(
        fetched = report.fetched,
        saved = report.saved,
        failed = report.failed,
        "enrichment complete"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn job() -> StoredListing {
        StoredListing {
            id: 7,
            title: "Python Developer".into(),
            description: "Seeking a remote Python developer in Berlin".into(),
            company_name: "Acme".into(),
            location: "Berlin".into(),
            sector: "Technology".into(),
            remote_type: "remote".into(),
            scraped_at: Utc::now(),
        }
    }

    #[test]
    fn test_prompt_embeds_listing_fields() {
        let prompt = build_prompt(&job());

        assert!(prompt.contains("Company: Acme"));
        assert!(prompt.contains("Title: Python Developer"));
        assert!(prompt.contains("Seeking a remote Python developer"));
        for key in [
            "hard_skills",
            "soft_skills",
            "location",
            "sector",
            "responsibilities",
            "work_type",
            "title_skills",
        ] {
            assert!(prompt.contains(key), "prompt missing key {key}");
        }
    }

    #[test]
    fn test_prompt_caps_description() {
        let mut long = job();
        long.description = "x".repeat(10_000);

        let prompt = build_prompt(&long);
        let embedded = prompt.matches('x').count();
        assert_eq!(embedded, PROMPT_DESCRIPTION_CAP);
    }

    #[test]
    fn test_strip_fences_variants() {
        assert_eq!(strip_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_fences("  ```json {\"a\":1} ```  "), "{\"a\":1}");
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(parse_analysis("I could not analyze this posting.").is_none());
    }

    #[test]
    fn test_parse_rejects_missing_keys() {
        assert!(parse_analysis(r#"{"hard_skills": ["Python"]}"#).is_none());
    }

    #[test]
    fn test_parse_accepts_fenced_payload() {
        let response = r#"```json
{"hard_skills":["Python"],"soft_skills":[],"location":"Berlin, Germany","sector":"Technology","responsibilities":[],"work_type":"remote","title_skills":["Python Developer"]}
```"#;

        let analysis = parse_analysis(response).unwrap();
        assert_eq!(analysis.hard_skills, vec!["Python"]);
    }
}
