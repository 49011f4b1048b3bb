use crate::error::GateError;
use regex::Regex;

/// Compiled blocklist: literal terms plus regex patterns.
///
/// Literal terms match case-insensitively unless the configured entry is
/// prefixed with `cs:`. Patterns always match case-insensitively.
#[derive(Debug)]
pub struct Blocklist {
    insensitive_terms: Vec<String>,
    sensitive_terms: Vec<String>,
    patterns: Vec<Regex>,
}

impl Blocklist {
    pub fn compile(terms: &[String], patterns: &[String]) -> Result<Self, GateError> {
        let mut insensitive_terms = Vec::new();
        let mut sensitive_terms = Vec::new();
        for term in terms {
            if let Some(exact) = term.strip_prefix("cs:") {
                sensitive_terms.push(exact.to_string());
            } else {
                insensitive_terms.push(term.to_lowercase());
            }
        }

        let patterns = patterns
            .iter()
            .map(|pattern| {
                Regex::new(&format!("(?i){pattern}")).map_err(|e| GateError::InvalidPattern {
                    pattern: pattern.clone(),
                    detail: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            insensitive_terms,
            sensitive_terms,
            patterns,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.insensitive_terms.is_empty()
            && self.sensitive_terms.is_empty()
            && self.patterns.is_empty()
    }

    /// Every blocklisted term or pattern present in `text`.
    pub fn matches(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let mut hits = Vec::new();

        for term in &self.insensitive_terms {
            if lowered.contains(term.as_str()) {
                hits.push(term.clone());
            }
        }
        for term in &self.sensitive_terms {
            if text.contains(term.as_str()) {
                hits.push(term.clone());
            }
        }
        for pattern in &self.patterns {
            if let Some(found) = pattern.find(text) {
                hits.push(found.as_str().to_string());
            }
        }
        hits
    }
}
