use crate::backends::create_backend;
use crate::cli::commands::{Cli, Commands, HistoryCommands};
use crate::config::{BackendKind, Config};
use crate::corpus::StaticCorpus;
use crate::history::{HistoryFilter, HistoryStore, RunStatus};
use crate::orchestrator::Orchestrator;
use anyhow::{bail, Result};
use console::style;
use std::path::PathBuf;

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Generate {
            topic,
            backend,
            batch,
            corpus,
        } => run_generate(config, &topic, backend, batch, corpus).await,
        Commands::Respond { watch } => super::respond::run(&config, watch).await,
        Commands::History { history_command } => run_history(&config, history_command),
    }
}

fn parse_backend_kind(name: &str) -> Result<BackendKind> {
    Ok(match name {
        "stub" => BackendKind::Stub,
        "interactive" => BackendKind::Interactive,
        "file-exchange" => BackendKind::FileExchange,
        "remote" => BackendKind::Remote,
        other => bail!("unknown backend {other:?} (expected stub, interactive, file-exchange, or remote)"),
    })
}

async fn run_generate(
    mut config: Config,
    topic: &str,
    backend_override: Option<String>,
    batch: bool,
    corpus_override: Option<PathBuf>,
) -> Result<()> {
    if let Some(name) = backend_override.as_deref() {
        config.backend.kind = parse_backend_kind(name)?;
    }
    if batch {
        config.exchange.batch = true;
    }
    if corpus_override.is_some() {
        config.corpus.snippets_path = corpus_override;
    }

    let corpus = match config.corpus.snippets_path.as_deref() {
        Some(path) => StaticCorpus::load_jsonl(&config.resolve_path(path))?,
        None => {
            tracing::warn!("no corpus configured; drafts cannot be grounded");
            StaticCorpus::new(Vec::new())
        }
    };

    let backend = create_backend(&config)?;
    let mut orchestrator = Orchestrator::new(backend, Box::new(corpus), &config)?;

    println!(
        "{} {topic}",
        style("Generating draft for:").cyan().bold()
    );
    let outcome = orchestrator.run(topic).await?;

    let status_label = match outcome.status {
        RunStatus::Complete => style("complete").green().bold(),
        RunStatus::Partial => style("partial").yellow().bold(),
    };
    println!();
    println!(
        "{} {} ({} sections, {} gaps) [{status_label}]",
        style("Draft:").cyan().bold(),
        outcome.draft.title,
        outcome.draft.sections.len(),
        outcome.draft.gaps.len(),
    );
    for gap in &outcome.draft.gaps {
        println!(
            "  {} {}: {}",
            style("gap").yellow(),
            gap.title,
            gap.reasons.join("; ")
        );
    }
    if let Some(path) = &outcome.output_path {
        println!("{} {}", style("Written to:").cyan(), path.display());
    }
    println!("{} {}", style("History id:").cyan(), outcome.history_id);
    Ok(())
}

fn run_history(config: &Config, command: HistoryCommands) -> Result<()> {
    let store = HistoryStore::new(config.resolve_path(&config.history.dir))?;

    match command {
        HistoryCommands::List { status, topic } => {
            let status = match status.as_deref() {
                None => None,
                Some("complete") => Some(RunStatus::Complete),
                Some("partial") => Some(RunStatus::Partial),
                Some(other) => bail!("unknown status {other:?} (expected complete or partial)"),
            };
            let filter = HistoryFilter {
                status,
                topic_contains: topic.as_deref(),
            };
            let entries = store.list(filter)?;
            if entries.is_empty() {
                println!("No recorded runs.");
                return Ok(());
            }
            for summary in entries {
                let status_label = match summary.status {
                    RunStatus::Complete => style("complete").green(),
                    RunStatus::Partial => style("partial").yellow(),
                };
                println!(
                    "{}  {}  [{status_label}]  {}",
                    style(&summary.id).dim(),
                    summary.created_at,
                    summary.title,
                );
            }
        }
        HistoryCommands::Show { id } => {
            let entry = store.get(&id)?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
        HistoryCommands::Export { id, output } => {
            let entry = store.get(&id)?;
            let markdown = entry.draft.to_markdown();
            match output {
                Some(path) => {
                    std::fs::write(&path, markdown)?;
                    println!("{} {}", style("Written to:").cyan(), path.display());
                }
                None => print!("{markdown}"),
            }
        }
        HistoryCommands::Delete { id } => {
            store.delete(&id)?;
            println!("Deleted {id}");
        }
    }
    Ok(())
}
