pub mod blocklist;
pub mod grounding;
pub mod style;

use crate::config::GateConfig;
use crate::corpus::Snippet;
use crate::error::GateError;
use blocklist::Blocklist;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    BlocklistViolation,
    Ungrounded,
    CopyRisk,
    Style,
    Length,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Fatal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub detail: String,
}

/// Outcome of evaluating one candidate text. Never persisted on its own;
/// it only gates whether a draft section advances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub accepted: bool,
    pub issues: Vec<Issue>,
    /// Weighted severity sum of the non-fatal issues.
    pub score: f64,
}

impl Verdict {
    pub fn has_fatal(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Fatal)
    }

    pub fn fatal_blocklist_term(&self) -> Option<&str> {
        self.issues
            .iter()
            .find(|i| i.kind == IssueKind::BlocklistViolation)
            .map(|i| i.detail.as_str())
    }

    /// Rejection reasons in issue order, for corrective retry prompts.
    pub fn reasons(&self) -> Vec<String> {
        self.issues
            .iter()
            .map(|i| match i.kind {
                IssueKind::BlocklistViolation => {
                    format!("remove the disallowed term {:?}", i.detail)
                }
                IssueKind::Ungrounded => i.detail.clone(),
                IssueKind::CopyRisk => i.detail.clone(),
                IssueKind::Style => format!("avoid {}", i.detail),
                IssueKind::Length => i.detail.clone(),
            })
            .collect()
    }
}

/// Pure, deterministic evaluation of candidate text against the
/// configured blocklist, grounding, style, and length policies. A fatal
/// issue always rejects; otherwise the weighted severity sum decides.
pub struct QualityGate {
    config: GateConfig,
    blocklist: Blocklist,
    min_words: usize,
    max_words: usize,
}

impl QualityGate {
    pub fn new(config: GateConfig, min_words: usize, max_words: usize) -> Result<Self, GateError> {
        let blocklist = Blocklist::compile(&config.blocklist_terms, &config.blocklist_patterns)?;
        Ok(Self {
            config,
            blocklist,
            min_words,
            max_words,
        })
    }

    fn weight(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Low => self.config.weight_low,
            Severity::Medium => self.config.weight_medium,
            Severity::High => self.config.weight_high,
            Severity::Fatal => 0.0,
        }
    }

    pub fn evaluate(&self, text: &str, snippets: &[Snippet]) -> Verdict {
        let mut issues = Vec::new();

        // Blocklist: every match is fatal.
        for term in self.blocklist.matches(text) {
            issues.push(Issue {
                kind: IssueKind::BlocklistViolation,
                severity: Severity::Fatal,
                detail: term,
            });
        }

        // Corpus grounding: overlap with the best-matching snippet.
        let overlap = grounding::best_overlap(text, snippets).unwrap_or(0.0);
        if overlap < self.config.min_grounding_overlap {
            issues.push(Issue {
                kind: IssueKind::Ungrounded,
                severity: Severity::High,
                detail: "text is not grounded in any provided excerpt".into(),
            });
        } else if overlap >= self.config.copy_risk_overlap {
            issues.push(Issue {
                kind: IssueKind::CopyRisk,
                severity: Severity::Medium,
                detail: "text is a near-verbatim copy of a source excerpt; paraphrase it".into(),
            });
        }

        // Style anti-patterns.
        for violation in style::violations(
            text,
            &self.config.banned_punctuation,
            &self.config.banned_phrases,
        ) {
            issues.push(Issue {
                kind: IssueKind::Style,
                severity: Severity::Low,
                detail: violation,
            });
        }

        // Word-count band.
        let words = text.split_whitespace().count();
        if words < self.min_words || words > self.max_words {
            issues.push(Issue {
                kind: IssueKind::Length,
                severity: Severity::Medium,
                detail: format!(
                    "text is {words} words, outside the {}-{} word band",
                    self.min_words, self.max_words
                ),
            });
        }

        let score: f64 = issues.iter().map(|i| self.weight(i.severity)).sum();
        let accepted = !issues.iter().any(|i| i.severity == Severity::Fatal)
            && score <= self.config.reject_threshold;

        Verdict {
            accepted,
            issues,
            score,
        }
    }
}
