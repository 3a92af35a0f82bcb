mod adapt;
mod config;
mod errors;
mod latex;
mod llm_client;
mod repair;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::adapt::{adapt_cv, AdaptOptions};
use crate::config::Config;
use crate::llm_client::LlmClient;

/// Adapts a LaTeX CV to a job description with Claude, preserving the
/// document's structure.
#[derive(Parser, Debug)]
#[command(name = "cvtailor", about = "Adapt a LaTeX CV to a job description")]
struct Cli {
    /// Path to the LaTeX CV file
    #[arg(long, default_value = "./LaTeX/resume.tex")]
    cv: PathBuf,

    /// Job description given literally on the command line
    #[arg(long, required_unless_present = "job_file", conflicts_with = "job_file")]
    job: Option<String>,

    /// Path to a file containing the job description
    #[arg(long)]
    job_file: Option<PathBuf>,

    /// Path to write the adapted CV
    #[arg(long, default_value = "./LaTeX/resume_adapted.tex")]
    output: PathBuf,

    /// Skip the xelatex compilation check
    #[arg(long)]
    skip_compile: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.rust_log)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Reading original CV from {}", cli.cv.display());
    let original_cv = tokio::fs::read_to_string(&cli.cv)
        .await
        .with_context(|| format!("Failed to read CV file {}", cli.cv.display()))?;

    let job_description = load_job_description(&cli).await?;

    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_timeout);
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    let options = AdaptOptions {
        style_dir: config.style_dir.clone(),
        compile_timeout: config.compile_timeout,
        skip_compile: cli.skip_compile,
    };

    let adapted_cv = adapt_cv(&llm, &original_cv, &job_description, &options).await?;

    info!("Saving adapted CV to {}", cli.output.display());
    write_atomic(&cli.output, &adapted_cv)?;

    info!("CV adaptation complete");
    Ok(())
}

/// Resolves the job description from `--job` or `--job-file`. The two flags
/// are explicit so literal text that happens to look like a path is never
/// silently read from disk.
async fn load_job_description(cli: &Cli) -> Result<String> {
    if let Some(path) = &cli.job_file {
        info!("Reading job description from {}", path.display());
        return tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read job description file {}", path.display()));
    }
    match &cli.job {
        Some(text) => Ok(text.clone()),
        None => bail!("Either --job or --job-file is required"),
    }
}

/// Writes via a temp file in the target directory and renames into place,
/// so a failed run never leaves a partially-written or clobbered output.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(content.as_bytes())?;
    tmp.persist(path)
        .with_context(|| format!("Failed to write output to {}", path.display()))?;
    Ok(())
}
