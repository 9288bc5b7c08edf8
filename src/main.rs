mod artifacts;
mod cli;
mod config;
mod error;
mod generation;
mod prompts;
mod session;
mod state_machine;
mod stats;
mod ui;
mod workflow;

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use artifacts::{ArtifactError, ArtifactId, ArtifactKind, ArtifactStore};
use cli::{Cli, Command, ShowArg};
use config::DraftsmithConfig;
use error::WorkflowError;
use generation::{OllamaClient, TextGenerator};
use session::SessionFile;
use state_machine::JobSummary;
use ui::StepProgress;
use workflow::Workflow;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        ui::error(&format!("{e:#}"));
        if let Some(failure) = e.downcast_ref::<WorkflowError>() {
            debug!(kind = %failure.kind(), "command failed");
            if failure.is_retryable() {
                ui::warning("The assignment was left unchanged; try the command again");
            }
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = DraftsmithConfig::load()?.with_overrides(cli.overrides())?;
    debug!(?config, "configuration loaded");

    let session = SessionFile::new(&config.session_file);
    let mut job = session.load_or_new(config.max_revisions)?;

    let client = OllamaClient::new(&config.base_url, config.request_timeout())?;
    let store = ArtifactStore::open(&config.artifacts_dir)?;
    let mut wf = Workflow::new(client, store, config.model_config());

    let mutates = cli.command.mutates_job();
    match cli.command {
        Command::Plan { params } => {
            let spinner = begin(&mut wf, "Planning");
            let result = wf.create_plan(&mut job, params.to_params()).await;
            spinner.finish();
            ui::print_report("Plan", &result?);
        }
        Command::EditPlan { file } => {
            let text = read_text(file.as_deref())?;
            let report = wf.edit_plan(&mut job, &text)?;
            ui::print_report("Plan (edited)", &report);
        }
        Command::Draft => {
            let spinner = begin(&mut wf, "Drafting");
            let result = wf.create_draft(&mut job).await;
            spinner.finish();
            ui::print_report("Draft", &result?);
        }
        Command::EditDraft { file } => {
            let text = read_text(file.as_deref())?;
            let report = wf.edit_draft(&mut job, &text)?;
            ui::print_report("Draft (edited)", &report);
        }
        Command::Critique => {
            let spinner = begin(&mut wf, "Critiquing");
            let result = wf.request_critique(&mut job).await;
            spinner.finish();
            ui::print_report("Critique", &result?);
            if !wf.can_revise(&job) {
                ui::warning(&format!(
                    "Maximum revisions ({}) reached; finalize or reset the assignment",
                    job.max_revisions
                ));
            }
        }
        Command::Revise => {
            let spinner = begin(&mut wf, "Revising");
            let result = wf.revise_draft(&mut job).await;
            spinner.finish();
            let report = result?;
            ui::print_report(&format!("Revision {}", job.revisions_done()), &report);
        }
        Command::Back => {
            let stage = wf.back(&mut job)?;
            ui::success(&format!("Back to stage {stage}"));
        }
        Command::Finalize => {
            wf.finalize(&mut job)?;
            ui::success("Assignment finalized; use `draftsmith export` to save it as text");
        }
        Command::Reset => {
            wf.reset(&mut job);
            ui::success("Started a new assignment; saved plans and drafts are kept");
        }
        Command::Status { json } => {
            ui::print_summary(&JobSummary::from_job(&job), json);
        }
        Command::Plans => {
            ui::print_artifacts(ArtifactKind::Plan, &wf.store().list(ArtifactKind::Plan));
        }
        Command::Drafts => {
            ui::print_artifacts(ArtifactKind::Draft, &wf.store().list(ArtifactKind::Draft));
        }
        Command::Load { id } => {
            let id = ArtifactId::new(id);
            match id.kind() {
                Some(ArtifactKind::Plan) => wf.load_plan(&mut job, &id)?,
                Some(ArtifactKind::Draft) => wf.load_draft(&mut job, &id)?,
                None => return Err(ArtifactError::NotFound(id.to_string()).into()),
            }
            ui::success(&format!("Loaded {id}"));
        }
        Command::Resume {
            plan,
            draft,
            params,
        } => {
            let plan = match plan {
                Some(id) => ArtifactId::new(id),
                None => wf
                    .store()
                    .latest(ArtifactKind::Plan)
                    .context("no saved plans to resume from")?,
            };
            let draft = draft.map(ArtifactId::new);
            job = wf.resume(params.to_params(), &plan, draft.as_ref(), config.max_revisions)?;
            ui::print_summary(&JobSummary::from_job(&job), false);
        }
        Command::Show { what, id } => {
            let text = match (what, id) {
                (_, Some(id)) => {
                    let id = ArtifactId::new(id);
                    let artifact = wf.store().load_artifact(&id)?;
                    let created = artifact
                        .created_at
                        .map(|at| at.to_string())
                        .unwrap_or_else(|| "unknown".into());
                    ui::note(&format!(
                        "{} ({}, created {created})",
                        wf.store().path_of(&id)?.display(),
                        artifact.topic
                    ));
                    Some(artifact.body)
                }
                (Some(ShowArg::Plan), None) => job.plan_text().map(str::to_string),
                (Some(ShowArg::Draft), None) => job.draft_text().map(str::to_string),
                (Some(ShowArg::Critique), None) => job.critique_text().map(str::to_string),
                (None, None) => None,
            };
            match text {
                Some(text) => println!("{text}"),
                None => ui::warning("Nothing to show yet"),
            }
        }
        Command::Export { dir } => {
            let path = wf.export_final(&job, &dir)?;
            ui::success(&format!("Exported to {}", path.display()));
        }
        Command::Stats { top } => {
            let Some(draft) = job.draft_text() else {
                bail!("there is no draft to analyze");
            };
            let stats = stats::analyze(draft, top);
            let fit = stats::length_fit(stats.words, job.params.length);
            ui::print_stats(&stats, job.params.length, fit);
        }
        Command::Models => {
            let client = wf.generator();
            let models = client
                .list_models()
                .await
                .with_context(|| format!("could not reach Ollama at {}", client.base_url()))?;
            ui::print_models(&models, &config.model);
        }
    }

    if mutates {
        session.save(&job)?;
    }
    Ok(())
}

/// Starts a spinner wired to the workflow's fragment stream.
fn begin<G: TextGenerator>(wf: &mut Workflow<G>, action: &str) -> StepProgress {
    let spinner = StepProgress::start(&format!("{action} with {}", wf.model().model));
    wf.set_progress(spinner.sink());
    spinner
}

fn read_text(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read from stdin")?;
            Ok(text)
        }
    }
}
