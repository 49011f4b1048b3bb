use crate::backends::{Backend, GenerationKind, GenerationRequest, RequestSequence};
use crate::config::{Config, GenerationConfig};
use crate::corpus::{Snippet, SnippetSearch};
use crate::draft::{Draft, SectionContent, SectionGap};
use crate::error::{ForgeError, OrchestratorError, Result};
use crate::gate::QualityGate;
use crate::history::{HistoryStore, RunParameters, RunStatus};
use crate::outline::{parse_outline, Outline, OutlineSection};
use crate::prompt::{build_outline_prompt, build_section_prompt, TeraEngine};
use std::io::Write;
use std::path::PathBuf;

/// Result of one generation run. Partial progress is preserved: failed
/// sections appear as explicit gaps in the draft, never as silent holes.
#[derive(Debug)]
pub struct RunOutcome {
    pub outline: Outline,
    pub draft: Draft,
    pub status: RunStatus,
    pub history_id: String,
    pub output_path: Option<PathBuf>,
}

/// Drives outline and draft production: prompt builder -> backend ->
/// quality gate -> retry-or-accept, then records the whole run in the
/// history store exactly once.
///
/// Sections are generated sequentially because later prose may reference
/// earlier prose; batch mode exists to cut human round-trips on the file
/// exchange, not to parallelize.
pub struct Orchestrator {
    backend: Box<dyn Backend>,
    corpus: Box<dyn SnippetSearch>,
    history: HistoryStore,
    gate: QualityGate,
    generation: GenerationConfig,
    top_k: usize,
    batch: bool,
    workspace_dir: PathBuf,
    engine: TeraEngine,
    sequence: RequestSequence,
}

impl Orchestrator {
    pub fn new(
        backend: Box<dyn Backend>,
        corpus: Box<dyn SnippetSearch>,
        config: &Config,
    ) -> Result<Self> {
        let gate = QualityGate::new(
            config.gate.clone(),
            config.generation.min_words,
            config.generation.max_words,
        )?;
        let history = HistoryStore::new(config.resolve_path(&config.history.dir))?;

        Ok(Self {
            backend,
            corpus,
            history,
            gate,
            generation: config.generation.clone(),
            top_k: config.corpus.top_k,
            batch: config.exchange.batch,
            workspace_dir: config.workspace_dir.clone(),
            engine: TeraEngine::new()?,
            sequence: RequestSequence::new(),
        })
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Run the full pipeline for one topic: outline, then draft, then a
    /// single history append covering the whole run.
    pub async fn run(&mut self, topic: &str) -> Result<RunOutcome> {
        let outline = self.generate_outline(topic).await?;
        tracing::info!(
            title = %outline.title,
            sections = outline.sections.len(),
            "outline accepted"
        );

        let draft = self.generate_draft(&outline).await?;
        let status = if draft.is_complete() {
            RunStatus::Complete
        } else {
            RunStatus::Partial
        };

        let output_path = self.export_markdown(&draft)?;
        let parameters = RunParameters {
            topic: topic.to_string(),
            backend: self.backend.name().to_string(),
            batch: self.batch,
        };
        let history_id = self.history.append(
            status,
            parameters,
            outline.clone(),
            draft.clone(),
            output_path.clone(),
        )?;

        Ok(RunOutcome {
            outline,
            draft,
            status,
            history_id,
            output_path,
        })
    }

    // ── Outline flow ─────────────────────────────────────────────────

    /// BUILD_PROMPT -> AWAIT_BACKEND -> PARSE_STRUCTURE, with bounded
    /// corrective retries on shape failures.
    pub async fn generate_outline(&mut self, topic: &str) -> Result<Outline> {
        let max_attempts = self.generation.outline_retries + 1;
        let mut feedback: Vec<String> = Vec::new();

        for attempt in 1..=max_attempts {
            let prompt =
                build_outline_prompt(&mut self.engine, topic, &self.generation, &feedback)?;
            let request = GenerationRequest::new(
                self.sequence.next_id(),
                GenerationKind::Outline,
                prompt,
            );
            let response = self.backend.generate(&request).await?;

            match parse_outline(&response.content, &self.generation) {
                Ok(outline) => return Ok(outline),
                Err(shape) => {
                    let detail = shape.to_string();
                    tracing::warn!(attempt, %detail, "outline rejected");
                    feedback = vec![detail.clone()];
                    if attempt == max_attempts {
                        return Err(ForgeError::Orchestrator(
                            OrchestratorError::StructureParse {
                                attempts: max_attempts,
                                detail,
                            },
                        ));
                    }
                }
            }
        }
        unreachable!("outline attempt loop always returns");
    }

    // ── Draft flow ───────────────────────────────────────────────────

    /// Per section: BUILD_SECTION_PROMPT -> RETRIEVE_SNIPPETS ->
    /// AWAIT_BACKEND -> QUALITY_GATE -> ACCEPT | bounded RETRY |
    /// FAIL_SECTION (recorded as a gap).
    pub async fn generate_draft(&mut self, outline: &Outline) -> Result<Draft> {
        let mut draft = Draft::new(outline.title.clone(), outline.thesis.clone());

        if self.batch && self.backend.supports_batching() {
            self.draft_batched(outline, &mut draft).await?;
        } else {
            self.draft_sequential(outline, &mut draft).await?;
        }
        Ok(draft)
    }

    async fn draft_sequential(&mut self, outline: &Outline, draft: &mut Draft) -> Result<()> {
        for (index, section) in outline.sections.iter().enumerate() {
            let snippets = self.retrieve(section)?;
            let prior: Vec<String> = draft.sections.iter().map(|s| s.title.clone()).collect();

            match self
                .attempt_section(outline, section, &snippets, &prior, Vec::new(), None)
                .await?
            {
                SectionResult::Accepted(content) => draft.sections.push(content),
                SectionResult::Failed(reasons) => {
                    tracing::warn!(section = %section.title, "section failed, recording gap");
                    draft.gaps.push(SectionGap {
                        title: section.title.clone(),
                        index,
                        reasons,
                    });
                }
            }
        }
        Ok(())
    }

    /// Enqueue every section request before blocking, then collect by id
    /// in outline order. Responders may answer out of order; correlation
    /// is by id alone, never by arrival order.
    async fn draft_batched(&mut self, outline: &Outline, draft: &mut Draft) -> Result<()> {
        let mut submissions = Vec::with_capacity(outline.sections.len());
        for section in &outline.sections {
            let snippets = self.retrieve(section)?;
            let prompt = build_section_prompt(
                &mut self.engine,
                &outline.title,
                &outline.thesis,
                &section.title,
                &section.description,
                &snippets,
                &self.generation,
                &[],
                &[],
            )?;
            let request =
                GenerationRequest::new(self.sequence.next_id(), GenerationKind::Section, prompt)
                    .with_metadata(serde_json::json!({ "section": section.title }));
            self.backend.submit(&request).await?;
            submissions.push((request.id, snippets));
        }

        for (index, (section, (id, snippets))) in outline
            .sections
            .iter()
            .zip(submissions.into_iter())
            .enumerate()
        {
            let response = self.backend.collect(id).await?;
            let verdict = self.gate.evaluate(&response.content, &snippets);

            let result = if verdict.accepted {
                SectionResult::Accepted(Self::accept(section, response.content, &snippets))
            } else {
                // Fall back to sequential bounded retries with fresh ids.
                let prior: Vec<String> = draft.sections.iter().map(|s| s.title.clone()).collect();
                self.attempt_section(
                    outline,
                    section,
                    &snippets,
                    &prior,
                    verdict.reasons(),
                    Some(verdict),
                )
                .await?
            };

            match result {
                SectionResult::Accepted(content) => draft.sections.push(content),
                SectionResult::Failed(reasons) => draft.gaps.push(SectionGap {
                    title: section.title.clone(),
                    index,
                    reasons,
                }),
            }
        }
        Ok(())
    }

    /// Bounded regeneration of one section, each attempt appending the
    /// previous rejection reasons so the backend can self-correct. Every
    /// attempt allocates a fresh request id.
    async fn attempt_section(
        &mut self,
        outline: &Outline,
        section: &OutlineSection,
        snippets: &[Snippet],
        prior: &[String],
        mut feedback: Vec<String>,
        spent_verdict: Option<crate::gate::Verdict>,
    ) -> Result<SectionResult> {
        let mut attempts_left = self.generation.section_retries + 1;
        // A rejected batched attempt already consumed one try.
        if spent_verdict.is_some() {
            attempts_left = attempts_left.saturating_sub(1);
        }
        let mut last_reasons = feedback.clone();
        let mut last_fatal_term: Option<String> = spent_verdict
            .as_ref()
            .and_then(|v| v.fatal_blocklist_term().map(String::from));

        while attempts_left > 0 {
            attempts_left -= 1;
            let prompt = build_section_prompt(
                &mut self.engine,
                &outline.title,
                &outline.thesis,
                &section.title,
                &section.description,
                snippets,
                &self.generation,
                prior,
                &feedback,
            )?;
            let request =
                GenerationRequest::new(self.sequence.next_id(), GenerationKind::Section, prompt)
                    .with_metadata(serde_json::json!({ "section": section.title }));

            let response = self.backend.generate(&request).await?;
            let verdict = self.gate.evaluate(&response.content, snippets);

            if verdict.accepted {
                return Ok(SectionResult::Accepted(Self::accept(
                    section,
                    response.content,
                    snippets,
                )));
            }

            tracing::warn!(
                section = %section.title,
                score = verdict.score,
                issues = verdict.issues.len(),
                "section rejected"
            );
            last_reasons = verdict.reasons();
            last_fatal_term = verdict.fatal_blocklist_term().map(String::from);
            feedback = last_reasons.clone();
        }

        // A blocklist hit that survived every corrective retry is surfaced
        // by name, not buried among the softer rejection reasons.
        if let Some(term) = last_fatal_term {
            let violation = crate::error::GateError::BlocklistViolation {
                section: section.title.clone(),
                term,
            };
            tracing::error!(%violation, "section exhausted its retries");
            last_reasons.insert(0, violation.to_string());
        }

        Ok(SectionResult::Failed(last_reasons))
    }

    fn accept(
        section: &OutlineSection,
        text: String,
        snippets: &[Snippet],
    ) -> SectionContent {
        SectionContent {
            title: section.title.clone(),
            text,
            sources: snippets.iter().map(|s| s.source.clone()).collect(),
        }
    }

    fn retrieve(&self, section: &OutlineSection) -> Result<Vec<Snippet>> {
        let query = format!("{} {}", section.title, section.description);
        Ok(self.corpus.search(&query, self.top_k)?)
    }

    fn export_markdown(&self, draft: &Draft) -> Result<Option<PathBuf>> {
        let drafts_dir = self.workspace_dir.join("drafts");
        std::fs::create_dir_all(&drafts_dir).map_err(|e| {
            ForgeError::Other(anyhow::anyhow!("failed to create drafts directory: {e}"))
        })?;

        let slug: String = draft
            .title
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-");
        // Earlier exports stay intact: a repeat run with the same title
        // gets a numbered filename, so every history entry keeps pointing
        // at its own artifact.
        for attempt in 1u32.. {
            let name = if attempt == 1 {
                format!("{slug}.md")
            } else {
                format!("{slug}-{attempt}.md")
            };
            let path = drafts_dir.join(name);
            let mut file = match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(ForgeError::Other(anyhow::anyhow!(
                        "failed to create draft file: {e}"
                    )))
                }
            };
            file.write_all(draft.to_markdown().as_bytes())
                .map_err(|e| ForgeError::Other(anyhow::anyhow!("failed to write draft: {e}")))?;
            return Ok(Some(path));
        }
        unreachable!("export filename loop always returns");
    }
}

enum SectionResult {
    Accepted(SectionContent),
    Failed(Vec<String>),
}
