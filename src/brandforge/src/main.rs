//! BrandForge: creative-production pipeline with critique-driven
//! refinement.
//!
//! Entry point that wires the demo providers and drives a single run
//! end to end. Real deployments replace the demo collaborators with
//! actual generation, repair, and evaluation backends.

use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;

use brandforge_core::config::AppConfig;
use brandforge_core::types::MediaKind;
use brandforge_workflow::demo::demo_engine;
use brandforge_workflow::types::RunRequest;

#[derive(Parser, Debug)]
#[command(name = "brandforge")]
#[command(about = "Creative-production pipeline with critique-driven refinement")]
#[command(version)]
struct Cli {
    /// What to produce
    #[arg(long, default_value = "A vibrant summer sale banner for a sports brand")]
    prompt: String,

    /// Media kind: image or video
    #[arg(long, default_value = "image")]
    media: String,

    /// Brand source (upload path or website URL) for profile extraction
    #[arg(long)]
    style_source: Option<String>,

    /// Maximum regeneration attempts (overrides config)
    #[arg(long, env = "BRANDFORGE__WORKFLOW__MAX_RETRIES")]
    max_retries: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "brandforge=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("BrandForge starting up");

    // Load configuration
    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(max_retries) = cli.max_retries {
        config.workflow.max_retries = max_retries;
    }

    let media_kind = match cli.media.as_str() {
        "image" => MediaKind::Image,
        "video" => MediaKind::Video,
        other => bail!("unknown media kind '{other}', expected image or video"),
    };

    info!(
        node_id = %config.node_id,
        max_retries = config.workflow.max_retries,
        media = %media_kind,
        "Configuration loaded"
    );

    let engine = demo_engine(config);

    let outcome = engine
        .execute(RunRequest {
            prompt: cli.prompt,
            media_kind,
            style_source: cli.style_source,
        })
        .await;

    info!(
        run_id = %outcome.run_id,
        status = ?outcome.status,
        retries = outcome.retry_count,
        "Run finished"
    );

    if let Some(view) = engine.status(outcome.run_id) {
        println!("{}", serde_json::to_string_pretty(&view)?);
    }

    if !outcome.success() {
        bail!(
            "run ended {:?}: {}",
            outcome.status,
            outcome.error.unwrap_or_else(|| "no detail".into())
        );
    }

    Ok(())
}
