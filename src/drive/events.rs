// drive-rs: Git-backed Drive
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Server-sent-event rendering of operation snapshots.
//!
//! ```text
//! data: {"id":..,"stage":"add","progress":33,"status":"pending","data":""}
//!
//! event: error                       (failed snapshots only)
//! data: {..."status":"failed","data":"network unreachable"}
//!
//! event: close                       (after the terminal snapshot)
//! data: close
//! ```

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, trace};

use crate::pipeline::{Operation, Status, Subscription};

/// Frame sent once the operation has finished.
pub const CLOSE_FRAME: &str = "event: close\ndata: close\n\n";

/// Renders one snapshot as an SSE frame.
#[must_use]
pub fn frame(operation: &Operation) -> String {
    // Operation has only plain string and number fields
    let json = serde_json::to_string(operation).unwrap_or_default();
    if operation.status == Status::Failed {
        format!("event: error\ndata: {json}\n\n")
    } else {
        format!("data: {json}\n\n")
    }
}

/// Streams every snapshot of `subscription` into `writer`, then the close
/// frame.
///
/// A write error stops relaying; the operation itself keeps running.
///
/// # Errors
///
/// Returns the first I/O error from `writer`.
pub async fn relay<W>(mut subscription: Subscription, writer: &mut W) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let id = subscription.id();
    while let Some(operation) = subscription.next().await {
        trace!(%id, stage = %operation.stage, "relaying snapshot");
        if let Err(e) = write_frame(writer, &frame(&operation)).await {
            debug!(%id, error = %e, "event writer closed, detaching");
            return Err(e);
        }
    }
    write_frame(writer, CLOSE_FRAME).await
}

async fn write_frame<W>(writer: &mut W, frame: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(frame.as_bytes()).await?;
    writer.flush().await
}
