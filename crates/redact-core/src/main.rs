//! `redact` command-line driver for the remediation service.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use redact_client::{HttpRemediationClient, ReferenceImage, RemediationService};
use redact_core::{
    ActionParams, CensorWorkflow, CoreConfig, RegionClassifier, RegionWorkflow, SegmentField,
};
use redact_models::timestamp::parse_timestamp;
use redact_models::{ActionCompletion, CensorMode, ClipBounds, JobHandle, NormalizedRegion};

#[derive(Parser)]
#[command(name = "redact", version, about = "Drive remediation actions against a remote job")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct JobArgs {
    /// Remote job handle
    #[arg(long)]
    job: String,
}

#[derive(Args)]
struct RegionArgs {
    /// Playhead position (seconds or HH:MM:SS.mmm)
    #[arg(long, default_value = "0")]
    time: String,
    #[arg(long)]
    top: f64,
    #[arg(long)]
    left: f64,
    #[arg(long)]
    width: f64,
    #[arg(long)]
    height: f64,
}

impl RegionArgs {
    fn timestamp(&self) -> Result<f64> {
        parse_timestamp(&self.time).with_context(|| format!("invalid --time '{}'", self.time))
    }

    fn region(&self) -> NormalizedRegion {
        NormalizedRegion::new(self.top, self.left, self.width, self.height)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Ask the classifier what a region contains
    Classify {
        #[command(flatten)]
        job: JobArgs,
        #[command(flatten)]
        region: RegionArgs,
    },
    /// Detect the object name inside a region
    Detect {
        #[command(flatten)]
        job: JobArgs,
        #[command(flatten)]
        region: RegionArgs,
    },
    /// Run one action (blur, pixelate, mask, replace-*, censor-*)
    Execute {
        #[command(flatten)]
        job: JobArgs,
        #[arg(long)]
        kind: String,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        prompt: Option<String>,
        /// Reference image for replacement backends
        #[arg(long)]
        reference: Option<PathBuf>,
        #[arg(long)]
        negative_prompt: Option<String>,
        #[arg(long)]
        strength: Option<u32>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        opacity: Option<f64>,
        #[arg(long)]
        duration: Option<u32>,
        /// Clip start (requires --end)
        #[arg(long, requires = "end")]
        start: Option<String>,
        #[arg(long, requires = "start")]
        end: Option<String>,
    },
    /// Scan the job's audio for profanity
    Scan {
        #[command(flatten)]
        job: JobArgs,
    },
    /// Scan, optionally enrich, then censor the whole job
    Censor {
        #[command(flatten)]
        job: JobArgs,
        #[arg(long, default_value = "beep")]
        mode: CensorMode,
        /// Fetch a suggested replacement for every match before submitting
        #[arg(long)]
        suggest: bool,
        /// Explicit replacement, `word=replacement` (repeatable)
        #[arg(long = "replace")]
        replacements: Vec<String>,
    },
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("redact=info,redact_core=info,redact_client=info"));

    // stdout carries the JSON results
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_completion(completion: &ActionCompletion) {
    match serde_json::to_string_pretty(completion) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to encode completion: {}", e),
    }
}

fn parse_replacement(pair: &str) -> Result<(String, String)> {
    match pair.split_once('=') {
        Some((word, replacement)) if !word.trim().is_empty() => {
            Ok((word.trim().to_string(), replacement.trim().to_string()))
        }
        _ => bail!("expected word=replacement, got '{}'", pair),
    }
}

async fn load_reference(path: &Path) -> Result<ReferenceImage> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read reference image {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "reference.png".to_string());
    Ok(ReferenceImage::from_file_name(file_name, bytes))
}

async fn run(cli: Cli, service: Arc<dyn RemediationService>, config: CoreConfig) -> Result<()> {
    match cli.command {
        Command::Classify { job, region } => {
            let classifier = RegionClassifier::new(service);
            let outcome = classifier
                .classify_or_fallback(&JobHandle::from_string(job.job), region.timestamp()?, region.region())
                .await;
            print_json(&serde_json::json!({
                "fallback": outcome.is_fallback(),
                "classification": outcome.result(),
            }))
        }
        Command::Detect { job, region } => {
            let classifier = RegionClassifier::new(service);
            let name = classifier
                .detect_object_name(&JobHandle::from_string(job.job), region.timestamp()?, region.region())
                .await;
            print_json(&serde_json::json!({ "objectName": name }))
        }
        Command::Execute {
            job,
            kind,
            label,
            prompt,
            reference,
            negative_prompt,
            strength,
            color,
            opacity,
            duration,
            start,
            end,
        } => {
            let mut params = ActionParams {
                target_label: label,
                strength,
                color,
                opacity,
                prompt,
                negative_prompt,
                duration,
                ..ActionParams::default()
            };
            if let Some(path) = reference {
                params.reference_image = Some(load_reference(&path).await?);
            }
            if let (Some(start), Some(end)) = (start, end) {
                params.clip = Some(ClipBounds::parse(&start, &end).context("invalid clip bounds")?);
            }

            let mut workflow = RegionWorkflow::new(service, JobHandle::from_string(job.job), &config);
            workflow.on_complete(print_completion);
            workflow
                .run_named(&kind, params)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            Ok(())
        }
        Command::Scan { job } => {
            let mut workflow = CensorWorkflow::new(service, JobHandle::from_string(job.job), &config);
            workflow.scan().await.map_err(|e| anyhow::anyhow!(e.user_message()))?;
            print_json(workflow.segments().entries())
        }
        Command::Censor {
            job,
            mode,
            suggest,
            replacements,
        } => {
            let overrides = replacements
                .iter()
                .map(|pair| parse_replacement(pair))
                .collect::<Result<Vec<_>>>()?;

            let mut workflow = CensorWorkflow::new(service, JobHandle::from_string(job.job), &config);
            workflow.on_complete(print_completion);
            let found = workflow.scan().await.map_err(|e| anyhow::anyhow!(e.user_message()))?;
            info!(matches = found, "Scan finished");

            for (word, replacement) in &overrides {
                let ids: Vec<_> = workflow
                    .segments()
                    .entries()
                    .iter()
                    .filter(|e| e.word.eq_ignore_ascii_case(word))
                    .map(|e| e.id)
                    .collect();
                for id in ids {
                    workflow
                        .segments_mut()
                        .update_by_id(id, SegmentField::Replacement(replacement.clone()))?;
                }
            }

            if suggest && mode == CensorMode::Dub {
                let outcomes = workflow.enrich_all().await;
                let applied = outcomes.iter().filter(|(_, o)| o.is_applied()).count();
                info!(applied, requested = outcomes.len(), "Suggestions applied");
            }

            workflow
                .submit(mode)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    let _ = rustls::crypto::ring::default_provider().install_default();

    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = CoreConfig::from_env();
    info!("Core config: {:?}", config);

    let service: Arc<dyn RemediationService> = match HttpRemediationClient::from_env() {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to create remediation client: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli, service, config).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
