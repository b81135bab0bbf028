// drive-rs: Git-backed Drive
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Drive command arguments.
//!
//! ```text
//! ls [PATH] [--json]
//!   → sorted listing, .git hidden
//! rm PATH
//!   → delete, then follow the operation to completion
//!     --detach  print the operation id and return once accepted
//!     --events  stream SSE frames to stdout instead of a progress bar
//! ```

use clap::Args;

/// Arguments for the `ls` command.
#[derive(Debug, Clone, Args)]
pub struct LsArgs {
    /// Directory to list, relative to the drive root.
    #[arg(value_name = "PATH", default_value = "/")]
    pub path: String,

    /// Prints the listing as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `rm` command.
#[derive(Debug, Clone, Args)]
pub struct RmArgs {
    /// File or directory to remove, relative to the drive root.
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Returns as soon as the deletion is accepted, without waiting for the push.
    #[arg(short = 'd', long, conflicts_with = "events")]
    pub detach: bool,

    /// Writes the operation's progress as server-sent events to stdout.
    #[arg(short = 'e', long)]
    pub events: bool,
}
