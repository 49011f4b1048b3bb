//! Full run over the file-exchange backend with an out-of-process-style
//! responder: requests appear as files, answers are written back by id in
//! whatever order the responder pleases, and the draft still assembles in
//! outline order.

use draftforge::backends::file_exchange::FileExchangeBackend;
use draftforge::backends::{
    GenerationKind, GenerationResponse, RequestQueue, ResponseQueue,
};
use draftforge::config::Config;
use draftforge::corpus::StaticCorpus;
use draftforge::history::RunStatus;
use draftforge::orchestrator::Orchestrator;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

fn test_config(root: &Path) -> Config {
    let mut config = Config {
        workspace_dir: root.to_path_buf(),
        config_path: root.join("config.toml"),
        ..Config::default()
    };
    config.exchange.poll_interval_ms = 10;
    config.exchange.response_timeout_secs = 30;
    config.exchange.batch = true;
    config.generation.min_sections = 3;
    config.generation.max_sections = 3;
    config.generation.min_words = 1;
    config.generation.max_words = 400;
    config.gate.min_grounding_overlap = 0.0;
    config.gate.copy_risk_overlap = 1.0;
    config
}

fn outline_json() -> String {
    serde_json::json!({
        "title": "Exchange Draft",
        "thesis": "Files are a fine transport.",
        "classification": "essay",
        "audience": "general",
        "sections": [
            {"title": "First", "description": "Opening."},
            {"title": "Second", "description": "Middle."},
            {"title": "Third", "description": "Closing."}
        ]
    })
    .to_string()
}

/// Answers the outline request, then waits until all three section
/// requests are visible and answers them in reverse order.
async fn responder(requests: RequestQueue, responses: ResponseQueue) {
    loop {
        let pending = requests.pending().unwrap();
        if let Some(outline) = pending.iter().find(|r| r.kind == GenerationKind::Outline) {
            responses
                .write(outline.id, &GenerationResponse::stop(outline_json()))
                .unwrap();
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    loop {
        let pending = requests.pending().unwrap();
        let sections: Vec<_> = pending
            .iter()
            .filter(|r| r.kind == GenerationKind::Section)
            .cloned()
            .collect();
        if sections.len() == 3 {
            for request in sections.iter().rev() {
                let section = request.metadata["section"].as_str().unwrap_or("?");
                responses
                    .write(
                        request.id,
                        &GenerationResponse::stop(format!("Prose written for {section}.")),
                    )
                    .unwrap();
                requests.remove(request.id).unwrap();
            }
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn out_of_order_answers_assemble_in_outline_order() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());

    let backend = FileExchangeBackend::new(&config.workspace_dir, &config.exchange).unwrap();
    let requests = RequestQueue::new(backend.request_queue().dir()).unwrap();
    let responses = ResponseQueue::new(backend.response_queue().dir()).unwrap();

    let mut orchestrator = Orchestrator::new(
        Box::new(backend),
        Box::new(StaticCorpus::new(Vec::new())),
        &config,
    )
    .unwrap();

    let responder = tokio::spawn(responder(requests.clone(), responses));
    let outcome = orchestrator.run("files as transport").await.unwrap();
    responder.await.unwrap();

    assert_eq!(outcome.status, RunStatus::Complete);
    let titles: Vec<_> = outcome
        .draft
        .sections
        .iter()
        .map(|s| s.title.as_str())
        .collect();
    assert_eq!(titles, vec!["First", "Second", "Third"]);
    // Correlation is by id, so each slot got its own answer despite the
    // reverse-order responder.
    for section in &outcome.draft.sections {
        assert_eq!(section.text, format!("Prose written for {}.", section.title));
    }

    // Both exchange directories are fully drained.
    assert!(requests.pending().unwrap().is_empty());
}

#[tokio::test]
async fn unanswered_request_times_out_but_stays_published() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.exchange.response_timeout_secs = 0;
    config.exchange.batch = false;

    let backend = FileExchangeBackend::new(&config.workspace_dir, &config.exchange).unwrap();
    let requests = RequestQueue::new(backend.request_queue().dir()).unwrap();

    let mut orchestrator = Orchestrator::new(
        Box::new(backend),
        Box::new(StaticCorpus::new(Vec::new())),
        &config,
    )
    .unwrap();

    let err = orchestrator.run("nobody answers").await.unwrap_err();
    assert!(err.to_string().contains("timed out"));

    // The outline request file survives for a late responder.
    let pending = requests.pending().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].kind, GenerationKind::Outline);
}
