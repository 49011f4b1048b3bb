use crate::error::CorpusError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A scored excerpt retrieved from the document corpus. Read-only: the
/// core never mutates snippets, only cites them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snippet {
    pub text: String,
    pub source: String,
    /// Similarity score in 0.0..=1.0.
    pub score: f64,
}

/// The corpus port. Embedding computation and index construction live
/// behind this trait; the core only ever asks for ranked snippets.
pub trait SnippetSearch: Send + Sync {
    fn search(&self, query: &str, k: usize) -> Result<Vec<Snippet>, CorpusError>;
}

/// In-memory corpus with naive lexical ranking, loaded from a JSONL file
/// of `{"text": ..., "source": ...}` records. Good enough for local
/// corpora and tests; a vector index plugs in through the same trait.
#[derive(Debug)]
pub struct StaticCorpus {
    documents: Vec<(String, String)>,
}

impl StaticCorpus {
    pub fn new(documents: Vec<(String, String)>) -> Self {
        Self { documents }
    }

    pub fn load_jsonl(path: &Path) -> Result<Self, CorpusError> {
        #[derive(Deserialize)]
        struct Record {
            text: String,
            source: String,
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| CorpusError::Load(format!("{}: {e}", path.display())))?;

        let mut documents = Vec::new();
        for (line_no, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record: Record = serde_json::from_str(line)
                .map_err(|e| CorpusError::Load(format!("line {}: {e}", line_no + 1)))?;
            documents.push((record.text, record.source));
        }
        Ok(Self::new(documents))
    }

    fn score(query_terms: &[String], text: &str) -> f64 {
        if query_terms.is_empty() {
            return 0.0;
        }
        let text_lower = text.to_lowercase();
        let hits = query_terms
            .iter()
            .filter(|term| text_lower.contains(term.as_str()))
            .count();
        hits as f64 / query_terms.len() as f64
    }
}

impl SnippetSearch for StaticCorpus {
    fn search(&self, query: &str, k: usize) -> Result<Vec<Snippet>, CorpusError> {
        let terms: Vec<String> = query
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 2)
            .map(str::to_string)
            .collect();

        let mut scored: Vec<Snippet> = self
            .documents
            .iter()
            .map(|(text, source)| Snippet {
                text: text.clone(),
                source: source.clone(),
                score: Self::score(&terms, text),
            })
            .filter(|s| s.score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }
}
