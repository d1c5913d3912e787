//! # Autopost
//!
//! Posts the configured content to every configured group through a Chrome
//! started with remote debugging.
//!
//! ## Usage
//! ```text
//! autopost [CONFIG]
//! ```
//! The config path comes from the first argument, then `AUTOPOST_CONFIG`,
//! then `config/config.toml`. `AUTOPOST_*` variables override file values.
//!
//! Exits with status 1 when the run aborts (landing page never loads, no
//! upload control for the media) or the inputs cannot be loaded.

use anyhow::Context;
use autopost::{
    config::Config,
    input::{load_content, load_cookies, scan_media_folder},
    session::CdpLauncher,
    workflow::{GroupOutcome, GroupPostOrchestrator, GroupTarget, RunReport, TokioSleeper},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "config/config.toml";

fn config_path() -> (PathBuf, bool) {
    match std::env::args().nth(1).or_else(|| std::env::var("AUTOPOST_CONFIG").ok()) {
        Some(path) => (PathBuf::from(path), true),
        None => (PathBuf::from(DEFAULT_CONFIG), false),
    }
}

fn load_config() -> anyhow::Result<Config> {
    let (path, explicit) = config_path();

    let config = if explicit || path.exists() {
        Config::from_file(&path).with_context(|| format!("loading {}", path.display()))?
    } else {
        Config::default()
    };

    let config = config.apply_env()?;
    config.validate()?;
    Ok(config)
}

fn init_tracing(level: &str) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn log_summary(report: &RunReport) {
    for group in &report.groups {
        let status = match group.outcome {
            GroupOutcome::Posted => "posted",
            GroupOutcome::Failed => "failed",
        };
        info!("Group {}: {} after {} attempt(s)", group.group, status, group.attempts.len());
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config()?;
    init_tracing(&config.log_level);

    info!("Autopost v{}", autopost::VERSION);
    info!("Posting to {} group(s) via {}", config.groups.len(), config.cdp_endpoint);

    let cookies = load_cookies(&config.cookies_path)?;
    let content = load_content(&config.content_path)?;

    let media = match &config.media_folder {
        Some(folder) if folder.exists() => scan_media_folder(folder)?,
        Some(folder) => {
            warn!("Media folder {} does not exist, posting without media", folder.display());
            Vec::new()
        }
        None => Vec::new(),
    };
    info!("Found {} media files", media.len());

    let groups: Vec<GroupTarget> = config.groups.iter().map(|id| GroupTarget::from(id.as_str())).collect();

    let mut orchestrator = GroupPostOrchestrator::with_launcher(
        Arc::new(CdpLauncher::new(config.cdp_endpoint.clone())),
        cookies,
        &config,
        Arc::new(TokioSleeper),
    )?;

    match orchestrator.run(&groups, &content, &media).await {
        Ok(report) => {
            log_summary(&report);
            info!("All groups processed");
            Ok(())
        }
        Err(abort) => {
            log_summary(&abort.report);
            error!("{}", abort);
            Err(abort.into())
        }
    }
}
