use super::file_exchange::FileExchangeBackend;
use super::interactive::InteractiveBackend;
use super::remote::RemoteApiBackend;
use super::stub::StubBackend;
use super::traits::Backend;
use crate::config::{BackendKind, Config};

/// Resolve the API key for the remote backend.
///
/// Resolution order:
/// 1. Explicitly configured `backend.api_key` (trimmed, filtered if empty)
/// 2. `DRAFTFORGE_API_KEY`
/// 3. `OPENAI_API_KEY` (most compatible endpoints accept it)
fn resolve_api_key(explicit: Option<&str>) -> Option<String> {
    if let Some(key) = explicit.map(str::trim).filter(|k| !k.is_empty()) {
        return Some(key.to_string());
    }

    for env_var in ["DRAFTFORGE_API_KEY", "OPENAI_API_KEY"] {
        if let Ok(value) = std::env::var(env_var) {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }

    None
}

/// Resolve the configured variant once into a concrete backend instance.
/// Business logic downstream only ever sees `dyn Backend`.
pub fn create_backend(config: &Config) -> anyhow::Result<Box<dyn Backend>> {
    match config.backend.kind {
        BackendKind::Stub => Ok(Box::new(StubBackend::new())),
        BackendKind::Interactive => Ok(Box::new(InteractiveBackend::new())),
        BackendKind::FileExchange => Ok(Box::new(FileExchangeBackend::new(
            &config.workspace_dir,
            &config.exchange,
        )?)),
        BackendKind::Remote => {
            let api_key = resolve_api_key(config.backend.api_key.as_deref());
            Ok(Box::new(RemoteApiBackend::new(
                config.backend.base_url.as_deref(),
                api_key.as_deref(),
                &config.backend.model,
                config.backend.temperature,
            )))
        }
    }
}
