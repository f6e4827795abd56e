//! Runs the full pipeline for one client, start to finish, without pausing.

use anyhow::{bail, Context, Result};
use clap::Parser;
use copyflow::prelude::*;
use dialoguer::Input;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "copyflow", version, about = "Generate a content package from a client brief")]
struct Args {
    /// Client name; the brief is read from `{briefs_dir}/{slug}.md`
    #[arg(short, long)]
    client: Option<String>,

    /// TOML configuration file
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// File of brand guidelines passed verbatim to every stage
    #[arg(short, long)]
    guidelines: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = AppConfig::load(args.config.as_deref())?;
    init_logging(&config.logging)?;

    let client = match args.client {
        Some(client) => client,
        None => Input::<String>::new()
            .with_prompt("Client name")
            .interact_text()
            .context("Failed to read client name")?,
    };

    let runner = PipelineRunner::from_config(&config)?.with_pause_policy(PausePolicy::Never);
    let brief = runner.store().read_brief(&client).await.with_context(|| {
        format!(
            "No brief found for '{client}' (expected {})",
            runner.store().brief_path(&slugify(&client)).display()
        )
    })?;

    let mut request = StartRequest::new(brief.client_name(), brief.text());
    if let Some(path) = &args.guidelines {
        let guidelines = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read guidelines from {}", path.display()))?;
        request = request.with_brand_guidelines(guidelines);
    }

    match runner.start(request, &LoggingEventSink::default()).await? {
        RunOutcome::Completed { path } => {
            println!("{}", path.display());
            Ok(())
        }
        RunOutcome::Paused(_) => bail!("Pipeline paused unexpectedly"),
    }
}
