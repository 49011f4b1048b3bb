//! End-to-end orchestrator runs against the stub backend: gate rejections
//! drive regeneration, exhausted retries become explicit gaps, and every
//! run lands in the history store exactly once.

use draftforge::backends::stub::StubBackend;
use draftforge::config::Config;
use draftforge::corpus::StaticCorpus;
use draftforge::error::{ForgeError, OrchestratorError};
use draftforge::history::{HistoryFilter, RunStatus};
use draftforge::orchestrator::Orchestrator;
use std::path::Path;
use tempfile::TempDir;

fn test_config(root: &Path) -> Config {
    let mut config = Config {
        workspace_dir: root.to_path_buf(),
        config_path: root.join("config.toml"),
        ..Config::default()
    };
    config.generation.min_sections = 1;
    config.generation.max_sections = 3;
    config.generation.min_words = 1;
    config.generation.max_words = 400;
    // No corpus in these tests, so grounding checks are neutralized.
    config.gate.min_grounding_overlap = 0.0;
    config.gate.copy_risk_overlap = 1.0;
    config
}

fn outline_json(section_titles: &[&str]) -> String {
    let sections: Vec<serde_json::Value> = section_titles
        .iter()
        .map(|t| serde_json::json!({"title": t, "description": format!("About {t}.")}))
        .collect();
    serde_json::json!({
        "title": "Test Draft",
        "thesis": "A thesis for testing.",
        "classification": "essay",
        "audience": "general",
        "sections": sections
    })
    .to_string()
}

fn orchestrator(config: &Config, backend: StubBackend) -> Orchestrator {
    Orchestrator::new(
        Box::new(backend),
        Box::new(StaticCorpus::new(Vec::new())),
        config,
    )
    .unwrap()
}

#[tokio::test]
async fn blocklisted_section_is_regenerated_with_feedback() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.gate.blocklist_terms = vec!["synergy".into()];
    config.generation.section_retries = 2;

    let backend = StubBackend::with_responses([
        outline_json(&["Only Section"]),
        "This attempt leans on synergy and must be rejected.".to_string(),
        "A clean second attempt with ordinary wording.".to_string(),
    ]);
    let mut orchestrator = orchestrator(&config, backend);

    let outcome = orchestrator.run("retry topic").await.unwrap();

    assert_eq!(outcome.status, RunStatus::Complete);
    assert_eq!(outcome.draft.sections.len(), 1);
    assert!(outcome.draft.gaps.is_empty());
    assert!(!outcome.draft.sections[0].text.contains("synergy"));

    // Exactly one history entry for the whole run, retries included.
    let runs = orchestrator
        .history()
        .list(HistoryFilter::default())
        .unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].id, outcome.history_id);
}

#[tokio::test]
async fn exhausted_section_retries_become_a_gap() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.gate.blocklist_terms = vec!["synergy".into()];
    config.generation.section_retries = 1;

    let backend = StubBackend::with_responses([
        outline_json(&["Doomed Section"]),
        "First synergy attempt.".to_string(),
        "Second synergy attempt.".to_string(),
    ]);
    let mut orchestrator = orchestrator(&config, backend);

    let outcome = orchestrator.run("gap topic").await.unwrap();

    assert_eq!(outcome.status, RunStatus::Partial);
    assert!(outcome.draft.sections.is_empty());
    assert_eq!(outcome.draft.gaps.len(), 1);
    let gap = &outcome.draft.gaps[0];
    assert_eq!(gap.index, 0);
    assert_eq!(gap.title, "Doomed Section");
    assert!(gap.reasons.iter().any(|r| r.contains("synergy")));

    // The exported Markdown names the gap instead of hiding it.
    let markdown = outcome.draft.to_markdown();
    assert!(markdown.contains("section failed"));

    let entry = orchestrator.history().get(&outcome.history_id).unwrap();
    assert_eq!(entry.status, RunStatus::Partial);
}

#[tokio::test]
async fn outline_shape_failures_retry_then_error() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.generation.outline_retries = 2;

    let backend = StubBackend::with_responses(["not json", "still not json", "nope"]);
    let mut orchestrator = orchestrator(&config, backend);

    let err = orchestrator.run("broken outline").await.unwrap_err();

    match err {
        ForgeError::Orchestrator(OrchestratorError::StructureParse { attempts, .. }) => {
            assert_eq!(attempts, 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // Failed runs are never recorded.
    assert!(orchestrator
        .history()
        .list(HistoryFilter::default())
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn code_fenced_outline_is_accepted() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    let fenced = format!("```json\n{}\n```", outline_json(&["Fenced"]));
    let backend = StubBackend::with_responses([
        fenced,
        "Plain prose for the fenced section.".to_string(),
    ]);
    let mut orchestrator = orchestrator(&config, backend);

    let outcome = orchestrator.run("fenced topic").await.unwrap();
    assert_eq!(outcome.outline.sections.len(), 1);
    assert_eq!(outcome.status, RunStatus::Complete);
}

#[tokio::test]
async fn batch_mode_collects_sections_in_outline_order() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.exchange.batch = true;

    let backend = StubBackend::with_responses([
        outline_json(&["Alpha", "Beta"]),
        "Prose for the first slot.".to_string(),
        "Prose for the second slot.".to_string(),
    ]);
    let mut orchestrator = orchestrator(&config, backend);

    let outcome = orchestrator.run("batch topic").await.unwrap();

    assert_eq!(outcome.status, RunStatus::Complete);
    let titles: Vec<_> = outcome
        .draft
        .sections
        .iter()
        .map(|s| s.title.as_str())
        .collect();
    assert_eq!(titles, vec!["Alpha", "Beta"]);
    assert_eq!(outcome.draft.sections[0].text, "Prose for the first slot.");
    assert_eq!(outcome.draft.sections[1].text, "Prose for the second slot.");
}

#[tokio::test]
async fn repeated_runs_keep_their_own_exports() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    let backend = StubBackend::with_responses([
        outline_json(&["Single"]),
        "Prose from the first run.".to_string(),
        outline_json(&["Single"]),
        "Prose from the second run.".to_string(),
    ]);
    let mut orchestrator = orchestrator(&config, backend);

    let first = orchestrator.run("same topic").await.unwrap();
    let second = orchestrator.run("same topic").await.unwrap();

    // Same title, so the second export must pick a fresh filename.
    let first_path = first.output_path.unwrap();
    let second_path = second.output_path.unwrap();
    assert_ne!(first_path, second_path);

    let first_contents = std::fs::read_to_string(&first_path).unwrap();
    let second_contents = std::fs::read_to_string(&second_path).unwrap();
    assert!(first_contents.contains("Prose from the first run."));
    assert!(second_contents.contains("Prose from the second run."));

    // Each history entry still points at its own artifact.
    let first_entry = orchestrator.history().get(&first.history_id).unwrap();
    assert_eq!(first_entry.output_path.as_deref(), Some(first_path.as_path()));
}

#[tokio::test]
async fn markdown_export_lands_in_the_workspace() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    let backend = StubBackend::with_responses([
        outline_json(&["Single"]),
        "Some accepted prose.".to_string(),
    ]);
    let mut orchestrator = orchestrator(&config, backend);

    let outcome = orchestrator.run("export topic").await.unwrap();

    let path = outcome.output_path.expect("draft should be exported");
    assert!(path.starts_with(dir.path()));
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("# Test Draft"));
    assert!(contents.contains("Some accepted prose."));
}
