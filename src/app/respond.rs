use crate::backends::interactive::read_multiline;
use crate::backends::{GenerationRequest, GenerationResponse, RequestQueue, ResponseQueue};
use crate::config::Config;
use anyhow::Result;
use console::style;
use std::io::Write;
use std::time::Duration;

/// Terminal responder for the file exchange: drains pending request files,
/// asks the operator for each completion, and publishes the answers.
///
/// Answers are published create-if-absent, so two responders working the
/// same directory never clobber each other; the loser just moves on.
pub async fn run(config: &Config, watch: bool) -> Result<()> {
    let requests = RequestQueue::new(config.resolve_path(&config.exchange.requests_dir))?;
    let responses = ResponseQueue::new(config.resolve_path(&config.exchange.responses_dir))?;
    let poll = Duration::from_millis(config.exchange.poll_interval_ms);

    eprintln!(
        "{} watching {}",
        style("draftforge respond").cyan().bold(),
        requests.dir().display()
    );

    loop {
        let pending = requests.pending()?;
        if pending.is_empty() {
            if !watch {
                eprintln!("No pending requests.");
                return Ok(());
            }
            tokio::time::sleep(poll).await;
            continue;
        }

        for request in pending {
            let id = request.id;
            let content = match read_answer(&request)? {
                Some(content) => content,
                None => {
                    eprintln!("stdin closed, stopping");
                    return Ok(());
                }
            };

            let published = responses.write(id, &GenerationResponse::stop(content))?;
            if published {
                requests.remove(id)?;
                eprintln!("{} answered request {id}", style("ok").green());
            } else {
                eprintln!(
                    "{} request {id} was already answered elsewhere",
                    style("skipped").yellow()
                );
            }
        }

        if !watch {
            return Ok(());
        }
    }
}

fn read_answer(request: &GenerationRequest) -> Result<Option<String>> {
    let mut stderr = std::io::stderr();
    writeln!(
        stderr,
        "\n{} request {} ({})",
        style("pending").cyan().bold(),
        request.id,
        request.kind
    )?;
    writeln!(stderr, "{}", style(&request.prompt).dim())?;
    writeln!(
        stderr,
        "{}",
        style("Type the completion, end with a single '.' line:").yellow()
    )?;

    Ok(read_multiline(std::io::stdin().lock())?)
}
