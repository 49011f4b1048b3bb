use super::request::{GenerationRequest, GenerationResponse, RequestId};
use crate::error::BackendError;
use std::fs;
use std::path::{Path, PathBuf};

/// Pending requests, one JSON file per id, drained by the responder.
///
/// Every write goes through a temp file followed by an atomic rename, so a
/// consumer can never observe a partially written payload. A file's
/// existence is the only readiness signal the protocol carries.
#[derive(Debug, Clone)]
pub struct RequestQueue {
    dir: PathBuf,
}

impl RequestQueue {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: RequestId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Serialize and atomically publish a request. Called exactly once per
    /// request id.
    pub fn enqueue(&self, request: &GenerationRequest) -> Result<(), BackendError> {
        let payload = serde_json::to_vec_pretty(request).map_err(|e| {
            BackendError::MalformedResponse {
                id: request.id,
                detail: format!("failed to serialize request: {e}"),
            }
        })?;
        let tmp = self.dir.join(format!(".{}.json.tmp", request.id));
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, self.path_for(request.id))?;
        Ok(())
    }

    /// All request files still awaiting an answer, ordered by id.
    pub fn pending(&self) -> Result<Vec<GenerationRequest>, BackendError> {
        let mut requests = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            // The file may be consumed between read_dir and here.
            let contents = match fs::read_to_string(&path) {
                Ok(contents) => contents,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if let Ok(request) = serde_json::from_str::<GenerationRequest>(&contents) {
                requests.push(request);
            }
        }
        requests.sort_by_key(|r| r.id);
        Ok(requests)
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.path_for(id).exists()
    }

    /// Drain a consumed request file. Responders call this after the
    /// matching response has been published.
    pub fn remove(&self, id: RequestId) -> Result<(), BackendError> {
        match fs::remove_file(self.path_for(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Answered requests, one JSON file named by the originating id.
///
/// Consumption removes the file, which is what makes "already consumed"
/// distinguishable from "not yet answered" and enforces at-most-once
/// delivery to the caller.
#[derive(Debug, Clone)]
pub struct ResponseQueue {
    dir: PathBuf,
}

impl ResponseQueue {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: RequestId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Publish a response with create-if-absent semantics: when two
    /// responders race on the same id, the second writer's answer is a
    /// lost write, never a torn or duplicated file.
    pub fn write(&self, id: RequestId, response: &GenerationResponse) -> Result<bool, BackendError> {
        let payload =
            serde_json::to_vec_pretty(response).map_err(|e| BackendError::MalformedResponse {
                id,
                detail: format!("failed to serialize response: {e}"),
            })?;
        let tmp = self.dir.join(format!(".{id}.json.tmp"));
        fs::write(&tmp, payload)?;

        // hard_link fails with AlreadyExists when the target is present,
        // while still making the complete payload visible atomically.
        let published = match fs::hard_link(&tmp, self.path_for(id)) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => false,
            Err(e) => {
                let _ = fs::remove_file(&tmp);
                return Err(e.into());
            }
        };
        fs::remove_file(&tmp)?;
        Ok(published)
    }

    /// Consume the response for `id` if one has been published.
    ///
    /// `Ok(None)` means not yet answered. A successful take removes the
    /// file, so a second take for the same id always yields `Ok(None)`.
    /// An unparseable payload is archived aside (never re-polled) and
    /// reported as malformed.
    pub fn take(&self, id: RequestId) -> Result<Option<GenerationResponse>, BackendError> {
        let path = self.path_for(id);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<GenerationResponse>(&contents) {
            Ok(response) => {
                fs::remove_file(&path)?;
                Ok(Some(response))
            }
            Err(e) => {
                let archived = path.with_extension("json.invalid");
                fs::rename(&path, archived)?;
                Err(BackendError::MalformedResponse {
                    id,
                    detail: e.to_string(),
                })
            }
        }
    }
}
