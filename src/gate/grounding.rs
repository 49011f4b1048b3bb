use crate::corpus::Snippet;
use std::collections::HashSet;

/// Lowercased content words of length > 2.
fn content_words(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(str::to_string)
        .collect()
}

/// Fraction of the candidate's distinct content words that also appear in
/// `snippet`. 0.0 when the candidate has no content words.
pub fn overlap(candidate: &str, snippet: &str) -> f64 {
    let candidate_words = content_words(candidate);
    if candidate_words.is_empty() {
        return 0.0;
    }
    let snippet_words = content_words(snippet);
    let shared = candidate_words
        .iter()
        .filter(|w| snippet_words.contains(*w))
        .count();
    shared as f64 / candidate_words.len() as f64
}

/// Best lexical overlap between the candidate and any retrieved snippet.
/// `None` when no snippets were provided, which the gate treats the same
/// as zero overlap.
pub fn best_overlap(candidate: &str, snippets: &[Snippet]) -> Option<f64> {
    snippets
        .iter()
        .map(|s| overlap(candidate, &s.text))
        .max_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
}
