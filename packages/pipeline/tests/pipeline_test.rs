//! End-to-end pipeline tests over scripted capabilities and the in-memory
//! store: crawl a paginated surface into raw rows, then enrich the residual
//! set into validated analyses.

use pipeline::extract::selectors;
use pipeline::stores::MemoryStore;
use pipeline::testing::{MockModel, ScriptedDriver, ScriptedListing};
use pipeline::types::analysis::WorkType;
use pipeline::{crawl, enrich, EnrichmentClient, ListingStore};

const ANALYSIS_JSON: &str = r#"{
    "hard_skills": ["Python", "PostgreSQL"],
    "soft_skills": ["Communication"],
    "location": "Berlin, Germany",
    "sector": "Technology",
    "responsibilities": ["Build data pipelines"],
    "work_type": "remote",
    "title_skills": ["Data Engineer"]
}"#;

fn listing(title: &str) -> ScriptedListing {
    ScriptedListing::new(format!("{title}\nAcme GmbH"))
        .with_text(selectors::DESCRIPTION, format!("{title} builds things in Python."))
        .with_text(selectors::COMPANY, "Acme GmbH")
        .with_text(selectors::LOCATION, "Berlin, Germany · 3 days ago")
        .with_texts(selectors::INSIGHTS, ["Remote Full-time"])
        .with_text(selectors::SECTOR, "Technology 51-200 employees")
}

#[tokio::test]
async fn test_crawl_persists_across_pages_and_skips_broken_elements() {
    let mut driver = ScriptedDriver::new(vec![
        vec![listing("Backend Engineer"), ScriptedListing::broken(), listing("Data Engineer")],
        vec![listing("ML Engineer"), listing("Platform Engineer"), listing("SRE")],
    ]);
    let store = MemoryStore::new();

    let report = crawl(&mut driver, &store).await.unwrap();

    assert_eq!(report.pages, 2);
    assert_eq!(report.attempted, 6);
    assert_eq!(report.inserted, 5);
    assert_eq!(report.skipped, 1);

    let stored = store.listings();
    assert_eq!(stored.len(), 5);
    assert_eq!(stored[0].title, "Backend Engineer");
    assert_eq!(stored[0].company_name, "Acme GmbH");
    assert_eq!(stored[0].location, "Berlin, Germany");
    assert_eq!(stored[4].title, "SRE");
}

#[tokio::test]
async fn test_enrich_persists_validated_analysis() {
    let store = MemoryStore::new();
    let mut driver = ScriptedDriver::new(vec![vec![listing("Data Engineer")]]);
    crawl(&mut driver, &store).await.unwrap();

    let model = MockModel::new().with_response(ANALYSIS_JSON);
    let client = EnrichmentClient::new(model);

    let report = enrich(&store, &client, 100).await.unwrap();

    assert_eq!(report.fetched, 1);
    assert_eq!(report.saved, 1);
    assert_eq!(report.failed, 0);

    let rows = store.analyses();
    assert_eq!(rows.len(), 1);
    let stored = store.listings();
    assert_eq!(rows[0].job_id, stored[0].id);
    assert_eq!(rows[0].analysis.work_type, WorkType::Remote);
    assert_eq!(rows[0].analysis.hard_skills, vec!["Python", "PostgreSQL"]);
}

#[tokio::test]
async fn test_enrich_is_idempotent_across_runs() {
    let store = MemoryStore::new();
    let mut driver = ScriptedDriver::new(vec![vec![listing("Data Engineer")]]);
    crawl(&mut driver, &store).await.unwrap();

    let model = MockModel::new()
        .with_response(ANALYSIS_JSON)
        .with_response(ANALYSIS_JSON);
    let client = EnrichmentClient::new(model);

    let first = enrich(&store, &client, 100).await.unwrap();
    assert_eq!(first.saved, 1);

    let second = enrich(&store, &client, 100).await.unwrap();
    assert_eq!(second.fetched, 0);
    assert_eq!(second.saved, 0);

    assert_eq!(store.analyses().len(), 1);
}

#[tokio::test]
async fn test_malformed_model_output_leaves_job_unanalyzed() {
    let store = MemoryStore::new();
    let mut driver = ScriptedDriver::new(vec![vec![listing("Data Engineer")]]);
    crawl(&mut driver, &store).await.unwrap();

    let model = MockModel::new().with_response("Sorry, I cannot analyze this posting.");
    let client = EnrichmentClient::new(model);

    let report = enrich(&store, &client, 100).await.unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.saved, 0);
    assert!(store.analyses().is_empty());

    // Still eligible for the next run.
    assert_eq!(store.fetch_unanalyzed(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unavailable_store_makes_enrich_a_noop() {
    let store = MemoryStore::new();
    store.set_unavailable(true);

    let model = MockModel::new().with_response(ANALYSIS_JSON);
    let client = EnrichmentClient::new(model);

    let report = enrich(&store, &client, 100).await.unwrap();

    assert!(report.store_unavailable);
    assert_eq!(report.fetched, 0);
    assert_eq!(client.model().call_count(), 0);
}

#[tokio::test]
async fn test_failed_save_keeps_job_eligible() {
    let store = MemoryStore::new();
    let mut driver = ScriptedDriver::new(vec![vec![listing("Data Engineer")]]);
    crawl(&mut driver, &store).await.unwrap();
    store.set_fail_saves(true);

    let model = MockModel::new().with_response(ANALYSIS_JSON);
    let client = EnrichmentClient::new(model);

    let report = enrich(&store, &client, 100).await.unwrap();
    assert_eq!(report.failed, 1);
    assert!(store.analyses().is_empty());
    assert_eq!(store.fetch_unanalyzed(10).await.unwrap().len(), 1);
}
