use crate::draft::Draft;
use crate::error::HistoryError;
use crate::outline::Outline;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Complete,
    Partial,
}

/// Input parameters of a run, recorded for audit and re-export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunParameters {
    pub topic: String,
    pub backend: String,
    pub batch: bool,
}

/// One completed (accepted-or-partial) generation run. Append-only: never
/// mutated after creation, deletable only by explicit user action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub created_at: String,
    pub status: RunStatus,
    pub parameters: RunParameters,
    pub outline: Outline,
    pub draft: Draft,
    /// Workspace-relative path of the exported Markdown, when written.
    #[serde(default)]
    pub output_path: Option<PathBuf>,
}

/// Index row kept alongside the entry files for fast listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySummary {
    pub id: String,
    pub created_at: String,
    pub status: RunStatus,
    pub topic: String,
    pub title: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Index {
    entries: Vec<HistorySummary>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryFilter<'a> {
    pub status: Option<RunStatus>,
    pub topic_contains: Option<&'a str>,
}

/// One JSON file per entry plus a single index file mapping ids to
/// summaries. `append` is the orchestrator's only write path and runs
/// exactly once per completed run, never per section.
pub struct HistoryStore {
    dir: PathBuf,
}

impl HistoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let dir = dir.into();
        fs::create_dir_all(dir.join("entries"))?;
        Ok(Self { dir })
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join("index.json")
    }

    fn entry_path(&self, id: &str) -> PathBuf {
        self.dir.join("entries").join(format!("{id}.json"))
    }

    fn load_index(&self) -> Result<Index, HistoryError> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(Index::default());
        }
        let contents = fs::read_to_string(&path)?;
        serde_json::from_str(&contents)
            .map_err(|e| HistoryError::IndexCorrupt(format!("{}: {e}", path.display())))
    }

    fn write_atomic(&self, path: &Path, payload: &[u8]) -> Result<(), HistoryError> {
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Record a completed run. Allocates a fresh id, so appending the same
    /// content twice yields two distinct entries.
    pub fn append(
        &self,
        status: RunStatus,
        parameters: RunParameters,
        outline: Outline,
        draft: Draft,
        output_path: Option<PathBuf>,
    ) -> Result<String, HistoryError> {
        let entry = HistoryEntry {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now().to_rfc3339(),
            status,
            parameters,
            outline,
            draft,
            output_path,
        };

        let payload = serde_json::to_vec_pretty(&entry)?;
        self.write_atomic(&self.entry_path(&entry.id), &payload)?;

        let mut index = self.load_index()?;
        index.entries.push(HistorySummary {
            id: entry.id.clone(),
            created_at: entry.created_at.clone(),
            status: entry.status,
            topic: entry.parameters.topic.clone(),
            title: entry.outline.title.clone(),
        });
        let index_payload = serde_json::to_vec_pretty(&index)?;
        self.write_atomic(&self.index_path(), &index_payload)?;

        Ok(entry.id)
    }

    pub fn get(&self, id: &str) -> Result<HistoryEntry, HistoryError> {
        let path = self.entry_path(id);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(HistoryError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn list(&self, filter: HistoryFilter<'_>) -> Result<Vec<HistorySummary>, HistoryError> {
        let index = self.load_index()?;
        Ok(index
            .entries
            .into_iter()
            .filter(|e| filter.status.is_none_or(|s| e.status == s))
            .filter(|e| {
                filter
                    .topic_contains
                    .is_none_or(|needle| e.topic.contains(needle))
            })
            .collect())
    }

    pub fn delete(&self, id: &str) -> Result<(), HistoryError> {
        let path = self.entry_path(id);
        if !path.exists() {
            return Err(HistoryError::NotFound(id.to_string()));
        }
        fs::remove_file(&path)?;

        let mut index = self.load_index()?;
        index.entries.retain(|e| e.id != id);
        let payload = serde_json::to_vec_pretty(&index)?;
        self.write_atomic(&self.index_path(), &payload)?;
        Ok(())
    }
}
