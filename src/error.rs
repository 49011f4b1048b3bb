use crate::backends::request::RequestId;
use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for draftforge.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum ForgeError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Backend / transport ─────────────────────────────────────────────
    #[error("backend: {0}")]
    Backend(#[from] BackendError),

    // ── Quality gate ────────────────────────────────────────────────────
    #[error("gate: {0}")]
    Gate(#[from] GateError),

    // ── Orchestrator ────────────────────────────────────────────────────
    #[error("orchestrator: {0}")]
    Orchestrator(#[from] OrchestratorError),

    // ── History store ───────────────────────────────────────────────────
    #[error("history: {0}")]
    History(#[from] HistoryError),

    // ── Prompt / Template ───────────────────────────────────────────────
    #[error("prompt: {0}")]
    Prompt(#[from] PromptError),

    // ── Corpus port ─────────────────────────────────────────────────────
    #[error("corpus: {0}")]
    Corpus(#[from] CorpusError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Backend / transport errors ─────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum BackendError {
    /// No response observed within the deadline. The request file (if any)
    /// is left in place; retries must allocate a fresh id.
    #[error("request {id} timed out waiting for a response")]
    Timeout { id: RequestId },

    #[error("request {id} received a malformed response: {detail}")]
    MalformedResponse { id: RequestId, detail: String },

    #[error("backend {backend} request failed: {message}")]
    Request { backend: String, message: String },

    #[error("backend {backend} does not support batched submission")]
    BatchingUnsupported { backend: String },

    #[error("response id {got} does not match request id {expected}")]
    IdMismatch { expected: RequestId, got: RequestId },

    #[error("interactive input closed before a response was entered")]
    InputClosed,

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Quality gate errors ────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum GateError {
    /// A blocklisted term survived every bounded corrective retry.
    #[error("blocklist violation in section '{section}': {term}")]
    BlocklistViolation { section: String, term: String },

    #[error("invalid blocklist pattern '{pattern}': {detail}")]
    InvalidPattern { pattern: String, detail: String },

    #[error("failed to load blocklist: {0}")]
    Load(String),
}

// ─── Orchestrator errors ────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("outline structure invalid after {attempts} attempts: {detail}")]
    StructureParse { attempts: u32, detail: String },

    #[error("run deadline elapsed before generation completed")]
    DeadlineElapsed,
}

// ─── History store errors ───────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("entry not found: {0}")]
    NotFound(String),

    #[error("index corrupt: {0}")]
    IndexCorrupt(String),

    #[error("serde: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Prompt / Template errors ───────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("template render failed: {0}")]
    Render(String),

    #[error("template not found: {0}")]
    NotFound(String),
}

// ─── Corpus port errors ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("search failed: {0}")]
    Search(String),

    #[error("failed to load snippet corpus: {0}")]
    Load(String),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, ForgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_displays_correctly() {
        let err = ForgeError::Config(ConfigError::Validation("bad threshold".into()));
        assert!(err.to_string().contains("validation failed"));
    }

    #[test]
    fn backend_timeout_carries_request_id() {
        let err = ForgeError::Backend(BackendError::Timeout { id: 42 });
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn gate_violation_names_term_and_section() {
        let err = ForgeError::Gate(GateError::BlocklistViolation {
            section: "Methodology".into(),
            term: "synergy".into(),
        });
        assert!(err.to_string().contains("Methodology"));
        assert!(err.to_string().contains("synergy"));
    }

    #[test]
    fn anyhow_interop() {
        let anyhow_err = anyhow::anyhow!("something went wrong");
        let forge_err: ForgeError = anyhow_err.into();
        assert!(forge_err.to_string().contains("something went wrong"));
    }

    #[test]
    fn structure_parse_displays_attempts() {
        let err = ForgeError::Orchestrator(OrchestratorError::StructureParse {
            attempts: 3,
            detail: "expected 5-7 sections, got 2".into(),
        });
        assert!(err.to_string().contains("3 attempts"));
    }
}
