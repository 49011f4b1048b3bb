use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// ── Top-level config ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Workspace directory - computed from home, not serialized
    #[serde(skip)]
    pub workspace_dir: PathBuf,
    /// Path to config.toml - computed from home, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub exchange: ExchangeConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub gate: GateConfig,

    #[serde(default)]
    pub corpus: CorpusConfig,

    #[serde(default)]
    pub history: HistoryConfig,
}

// ── Backend selection ─────────────────────────────────────────────

/// Which backend variant answers generation requests. Resolved once at
/// construction time into a concrete instance; business logic never
/// re-reads this switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    #[default]
    Stub,
    Interactive,
    FileExchange,
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,
    /// Model identifier passed through to the remote backend.
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Explicit API key; falls back to DRAFTFORGE_API_KEY when absent.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL for the remote backend (OpenAI-compatible).
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}

fn default_temperature() -> f64 {
    0.7
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            model: default_model(),
            temperature: default_temperature(),
            api_key: None,
            base_url: None,
        }
    }
}

// ── File exchange protocol ────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// Pending request files live here. Relative paths resolve against the
    /// workspace directory.
    #[serde(default = "default_requests_dir")]
    pub requests_dir: PathBuf,
    #[serde(default = "default_responses_dir")]
    pub responses_dir: PathBuf,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Per-call wait before a request is declared timed out.
    #[serde(default = "default_response_timeout_secs")]
    pub response_timeout_secs: u64,
    /// Optional whole-run deadline; caps every poll wait in the run.
    #[serde(default)]
    pub run_deadline_secs: Option<u64>,
    /// Enqueue every section request before blocking (reduces human
    /// round-trips; responders may answer out of order).
    #[serde(default)]
    pub batch: bool,
}

fn default_requests_dir() -> PathBuf {
    PathBuf::from("exchange/requests")
}

fn default_responses_dir() -> PathBuf {
    PathBuf::from("exchange/responses")
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_response_timeout_secs() -> u64 {
    600
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            requests_dir: default_requests_dir(),
            responses_dir: default_responses_dir(),
            poll_interval_ms: default_poll_interval_ms(),
            response_timeout_secs: default_response_timeout_secs(),
            run_deadline_secs: None,
            batch: false,
        }
    }
}

// ── Generation constraints ────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_min_sections")]
    pub min_sections: usize,
    #[serde(default = "default_max_sections")]
    pub max_sections: usize,
    /// Outline shape failures are retried this many times with a
    /// corrective instruction before the run fails.
    #[serde(default = "default_outline_retries")]
    pub outline_retries: u32,
    /// Rejected sections are regenerated at most this many times.
    #[serde(default = "default_section_retries")]
    pub section_retries: u32,
    #[serde(default = "default_min_words")]
    pub min_words: usize,
    #[serde(default = "default_max_words")]
    pub max_words: usize,
    /// Intended audience, passed into every prompt.
    #[serde(default)]
    pub audience: Option<String>,
    /// Terminology the draft must keep using.
    #[serde(default)]
    pub required_terms: Vec<String>,
}

fn default_min_sections() -> usize {
    5
}

fn default_max_sections() -> usize {
    7
}

fn default_outline_retries() -> u32 {
    2
}

fn default_section_retries() -> u32 {
    2
}

fn default_min_words() -> usize {
    150
}

fn default_max_words() -> usize {
    600
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            min_sections: default_min_sections(),
            max_sections: default_max_sections(),
            outline_retries: default_outline_retries(),
            section_retries: default_section_retries(),
            min_words: default_min_words(),
            max_words: default_max_words(),
            audience: None,
            required_terms: Vec::new(),
        }
    }
}

// ── Quality gate thresholds ───────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Weighted severity sum above this rejects the candidate.
    #[serde(default = "default_reject_threshold")]
    pub reject_threshold: f64,
    #[serde(default = "default_weight_low")]
    pub weight_low: f64,
    #[serde(default = "default_weight_medium")]
    pub weight_medium: f64,
    #[serde(default = "default_weight_high")]
    pub weight_high: f64,
    /// Minimum lexical overlap with the best-matching snippet.
    #[serde(default = "default_min_grounding_overlap")]
    pub min_grounding_overlap: f64,
    /// Overlap with a single snippet above this flags a copy risk.
    #[serde(default = "default_copy_risk_overlap")]
    pub copy_risk_overlap: f64,
    /// Literal blocklist terms; matched case-insensitively unless the
    /// entry is prefixed with `cs:`.
    #[serde(default)]
    pub blocklist_terms: Vec<String>,
    /// Blocklist regex patterns (matched case-insensitively).
    #[serde(default)]
    pub blocklist_patterns: Vec<String>,
    #[serde(default = "default_banned_phrases")]
    pub banned_phrases: Vec<String>,
    #[serde(default = "default_banned_punctuation")]
    pub banned_punctuation: Vec<String>,
}

fn default_reject_threshold() -> f64 {
    0.75
}

fn default_weight_low() -> f64 {
    0.15
}

fn default_weight_medium() -> f64 {
    0.4
}

fn default_weight_high() -> f64 {
    1.0
}

fn default_min_grounding_overlap() -> f64 {
    0.1
}

fn default_copy_risk_overlap() -> f64 {
    0.9
}

fn default_banned_phrases() -> Vec<String> {
    [
        "delve into",
        "in today's fast-paced world",
        "it is important to note",
        "at the end of the day",
        "game changer",
    ]
    .map(String::from)
    .to_vec()
}

fn default_banned_punctuation() -> Vec<String> {
    vec!["\u{2014}".into()]
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            reject_threshold: default_reject_threshold(),
            weight_low: default_weight_low(),
            weight_medium: default_weight_medium(),
            weight_high: default_weight_high(),
            min_grounding_overlap: default_min_grounding_overlap(),
            copy_risk_overlap: default_copy_risk_overlap(),
            blocklist_terms: Vec::new(),
            blocklist_patterns: Vec::new(),
            banned_phrases: default_banned_phrases(),
            banned_punctuation: default_banned_punctuation(),
        }
    }
}

// ── Corpus port ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// JSONL snippet file for the built-in lexical searcher. Relative
    /// paths resolve against the workspace directory.
    #[serde(default)]
    pub snippets_path: Option<PathBuf>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    5
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            snippets_path: None,
            top_k: default_top_k(),
        }
    }
}

// ── History store ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_history_dir")]
    pub dir: PathBuf,
}

fn default_history_dir() -> PathBuf {
    PathBuf::from("history")
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            dir: default_history_dir(),
        }
    }
}

// ── Load / save / validate ────────────────────────────────────────

impl Config {
    pub fn load_or_init() -> Result<Self> {
        let home = UserDirs::new()
            .map(|u| u.home_dir().to_path_buf())
            .context("Could not find home directory")?;
        let forge_dir = home.join(".draftforge");
        Self::load_or_init_at(&forge_dir)
    }

    /// Same as `load_or_init` but rooted at an explicit directory.
    /// Lets tests and multi-tenant batch runs use disjoint workspaces.
    pub fn load_or_init_at(forge_dir: &Path) -> Result<Self> {
        let config_path = forge_dir.join("config.toml");

        if !forge_dir.exists() {
            fs::create_dir_all(forge_dir).context("Failed to create .draftforge directory")?;
            fs::create_dir_all(forge_dir.join("workspace"))
                .context("Failed to create workspace directory")?;
        }

        if config_path.exists() {
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            config.config_path.clone_from(&config_path);
            config.workspace_dir = forge_dir.join("workspace");
            config.validate()?;
            Ok(config)
        } else {
            let config = Self {
                config_path: config_path.clone(),
                workspace_dir: forge_dir.join("workspace"),
                ..Self::default()
            };
            config.validate()?;
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.config_path, contents).context("Failed to write config file")?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.backend.temperature) {
            anyhow::bail!("backend.temperature must be between 0.0 and 2.0");
        }
        if self.generation.min_sections == 0
            || self.generation.min_sections > self.generation.max_sections
        {
            anyhow::bail!("generation section bounds must satisfy 0 < min <= max");
        }
        if self.generation.min_words >= self.generation.max_words {
            anyhow::bail!("generation word band must satisfy min < max");
        }
        if !(0.0..=1.0).contains(&self.gate.min_grounding_overlap) {
            anyhow::bail!("gate.min_grounding_overlap must be within 0.0..=1.0");
        }
        if !(0.0..=1.0).contains(&self.gate.copy_risk_overlap) {
            anyhow::bail!("gate.copy_risk_overlap must be within 0.0..=1.0");
        }
        if self.gate.min_grounding_overlap > self.gate.copy_risk_overlap {
            anyhow::bail!("gate.min_grounding_overlap must not exceed gate.copy_risk_overlap");
        }
        if self.exchange.poll_interval_ms == 0 {
            anyhow::bail!("exchange.poll_interval_ms must be non-zero");
        }
        Ok(())
    }

    /// Resolve a possibly-relative path against the workspace directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn init_creates_config_and_workspace() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("forge");
        let config = Config::load_or_init_at(&root).unwrap();

        assert!(root.join("config.toml").exists());
        assert!(config.workspace_dir.ends_with("workspace"));
        assert_eq!(config.backend.kind, BackendKind::Stub);
    }

    #[test]
    fn reload_round_trips_saved_values() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("forge");
        let mut config = Config::load_or_init_at(&root).unwrap();
        config.backend.kind = BackendKind::FileExchange;
        config.exchange.batch = true;
        config.save().unwrap();

        let reloaded = Config::load_or_init_at(&root).unwrap();
        assert_eq!(reloaded.backend.kind, BackendKind::FileExchange);
        assert!(reloaded.exchange.batch);
    }

    #[test]
    fn validate_rejects_inverted_word_band() {
        let mut config = Config::default();
        config.generation.min_words = 500;
        config.generation.max_words = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_overlap() {
        let mut config = Config::default();
        config.gate.min_grounding_overlap = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn backend_kind_uses_kebab_case() {
        let kind: BackendKind = toml::from_str::<BackendConfig>("kind = \"file-exchange\"")
            .unwrap()
            .kind;
        assert_eq!(kind, BackendKind::FileExchange);
    }

    #[test]
    fn resolve_path_keeps_absolute_paths() {
        let mut config = Config::default();
        config.workspace_dir = PathBuf::from("/tmp/ws");
        assert_eq!(
            config.resolve_path(Path::new("/etc/corpus.jsonl")),
            PathBuf::from("/etc/corpus.jsonl")
        );
        assert_eq!(
            config.resolve_path(Path::new("corpus.jsonl")),
            PathBuf::from("/tmp/ws/corpus.jsonl")
        );
    }
}
