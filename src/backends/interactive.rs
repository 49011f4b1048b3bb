use super::request::{GenerationRequest, GenerationResponse};
use super::traits::Backend;
use crate::error::BackendError;
use async_trait::async_trait;
use console::style;
use std::io::{BufRead, Write};

/// Read a multi-line completion, terminated by a line containing only `.`.
///
/// `None` means the input closed before anything was typed. Lines typed
/// before an early close are kept. Shared by this backend and the
/// file-exchange responder so the terminator semantics cannot drift.
pub fn read_multiline(input: impl BufRead) -> std::io::Result<Option<String>> {
    let mut lines = Vec::new();
    let mut saw_terminator = false;
    for line in input.lines() {
        let line = line?;
        if line.trim() == "." {
            saw_terminator = true;
            break;
        }
        lines.push(line);
    }

    if !saw_terminator && lines.is_empty() {
        return Ok(None);
    }
    Ok(Some(lines.join("\n")))
}

/// Backend that blocks on a human typing the completion at the terminal.
///
/// The prompt is printed to stderr so stdout stays clean for piping; the
/// answer is read from stdin, terminated by a line containing only `.`.
pub struct InteractiveBackend;

impl InteractiveBackend {
    pub fn new() -> Self {
        Self
    }

    fn read_completion(request: &GenerationRequest) -> Result<String, BackendError> {
        let mut stderr = std::io::stderr();
        writeln!(
            stderr,
            "\n{} request {} ({})",
            style("draftforge").cyan().bold(),
            request.id,
            request.kind
        )?;
        writeln!(stderr, "{}", style(&request.prompt).dim())?;
        writeln!(
            stderr,
            "{}",
            style("Type the completion, end with a single '.' line:").yellow()
        )?;

        match read_multiline(std::io::stdin().lock())? {
            Some(content) => Ok(content),
            None => Err(BackendError::InputClosed),
        }
    }
}

impl Default for InteractiveBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for InteractiveBackend {
    fn name(&self) -> &str {
        "interactive"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, BackendError> {
        let request = request.clone();
        let content = tokio::task::spawn_blocking(move || Self::read_completion(&request))
            .await
            .map_err(|e| BackendError::Request {
                backend: "interactive".into(),
                message: e.to_string(),
            })??;
        Ok(GenerationResponse::stop(content))
    }
}
