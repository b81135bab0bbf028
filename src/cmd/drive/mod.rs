// drive-rs: Git-backed Drive
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Drive commands: `ls`, `rm` and `watch`.
//!
//! ```text
//! open_drive(config)
//!   ShellBackend::from_config --> Pipeline::start (clone or open, blocking)
//!   Drive::new(repo.path, handle)
//!
//! rm PATH            progress bar until the push result
//! rm PATH --events   SSE frames on stdout
//! rm PATH --detach   print id; shutdown still pushes
//! ```

use std::sync::OnceLock;

use anyhow::{Context, anyhow, bail};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::cli::drive::{LsArgs, RmArgs};
use crate::config::Config;
use crate::drive::events::relay;
use crate::drive::{DirEntry, Drive};
use crate::error::Result;
use crate::git::ShellBackend;
use crate::pipeline::{Pipeline, PipelineOptions, Status, Subscription};

#[cfg(test)]
mod tests;

/// Starts the pipeline for the configured working copy.
async fn open_drive(config: &Config) -> Result<(Pipeline, Drive)> {
    let backend = ShellBackend::from_config(&config.repo)?;
    let options = PipelineOptions::from(&config.pipeline);
    let root = backend.path().to_path_buf();

    let pipeline = tokio::task::spawn_blocking(move || Pipeline::start(backend, &options))
        .await
        .context("pipeline start task failed")??;
    let drive = Drive::new(root, pipeline.handle());
    Ok((pipeline, drive))
}

/// Main handler for the `ls` command.
///
/// # Errors
///
/// Returns an error if the pipeline cannot start or the directory cannot be
/// listed.
pub async fn run_ls_command(args: &LsArgs, config: &Config) -> Result<()> {
    let (pipeline, drive) = open_drive(config).await?;
    let listed = drive.read_dir(&args.path).await;
    pipeline.shutdown().await?;

    let entries = listed?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("Directory is empty");
    } else {
        for entry in &entries {
            println!("{}", format_entry(entry));
        }
    }
    Ok(())
}

/// Main handler for the `rm` command.
///
/// # Errors
///
/// Returns an error if the path cannot be removed, the event stream cannot be
/// written, or the operation fails.
pub async fn run_rm_command(args: &RmArgs, config: &Config) -> Result<()> {
    let (pipeline, drive) = open_drive(config).await?;

    let outcome = if args.detach {
        match drive.remove(&args.path).await {
            Ok(id) => {
                println!("{id}");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    } else {
        match drive.remove_and_listen(&args.path).await {
            Ok((_, subscription)) if args.events => relay(subscription, &mut tokio::io::stdout())
                .await
                .context("failed to write events"),
            Ok((_, subscription)) => follow(subscription).await,
            Err(e) => Err(e.into()),
        }
    };

    pipeline.shutdown().await?;
    outcome
}

/// Main handler for the `watch` command: keeps pulling until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the pipeline cannot start or stop cleanly.
pub async fn run_watch_command(config: &Config) -> Result<()> {
    let (pipeline, drive) = open_drive(config).await?;
    info!(root = %drive.root().display(), "watching, press Ctrl-C to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C, stopping");
    }
    pipeline.shutdown().await?;
    Ok(())
}

/// Shows a subscription on a progress bar until it closes.
async fn follow(mut subscription: Subscription) -> Result<()> {
    let id = subscription.id();
    let pb = ProgressBar::new(100);
    pb.set_style(bar_style());

    let mut last = None;
    while let Some(op) = subscription.next().await {
        pb.set_position(u64::from(op.progress));
        pb.set_message(op.stage.to_string());
        last = Some(op);
    }

    match last {
        Some(op) if op.status == Status::Success => {
            pb.finish_with_message("pushed");
            Ok(())
        }
        Some(op) if op.status == Status::Failed => {
            pb.abandon_with_message("failed");
            bail!("operation {id} failed: {}", op.data)
        }
        _ => {
            pb.abandon();
            Err(anyhow!("operation {id} ended without a result"))
        }
    }
}

/// One listing line: kind, size in MB, name.
pub(crate) fn format_entry(entry: &DirEntry) -> String {
    let kind = if entry.is_dir { "dir" } else { "file" };
    format!("{kind:<4} {:>10.2} MB  {}", entry.size_mb, entry.name)
}

/// Pre-validated progress bar style for operation stages.
fn bar_style() -> ProgressStyle {
    static STYLE: OnceLock<ProgressStyle> = OnceLock::new();
    STYLE
        .get_or_init(|| {
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos:>3}% {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
        })
        .clone()
}
