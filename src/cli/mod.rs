// drive-rs: Git-backed Drive
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module for drive-rs using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! drive [global options] <command>
//! version
//! options
//! configs
//! ls [PATH] [--json]
//! rm PATH [--detach | --events]
//! watch
//! ```

pub mod drive;
pub mod global;


use crate::cli::drive::{LsArgs, RmArgs};
use crate::cli::global::GlobalOptions;
use clap::{Parser, Subcommand};

/// Git-backed Drive
///
/// Exposes a git working copy as a drive; deletions are committed and pushed
/// in the background.
#[derive(Debug, Parser)]
#[command(
    name = "drive",
    author,
    version,
    about = "Git-backed Drive",
    long_about = "drive-rs Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Exposes a git working copy as a drive. Removing a file deletes\n\
                  it locally, commits the deletion and pushes it with the next\n\
                  batch. See `drive <command> --help` for more information about\n\
                  a command.",
    after_help = "CONFIG FILES:\n\n\
                  drive loads `drive.toml` from the current directory if present,\n\
                  then every file given with --config, in order. Environment\n\
                  variables such as DRIVE_REPO__PATH override the files, and\n\
                  --set and the logging flags override everything."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Shows the version.
    #[command(visible_alias = "-v")]
    Version,

    /// Lists all options and their effective values.
    Options,

    /// Lists the configuration files that were loaded.
    Configs,

    /// Lists a directory of the drive.
    Ls(LsArgs),

    /// Removes a file or directory and publishes the deletion.
    Rm(RmArgs),

    /// Keeps the working copy in sync with the remote until interrupted.
    Watch,
}

/// Parses command-line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Tries to parse command-line arguments, returning an error on failure.
///
/// # Errors
///
/// Returns a `clap::Error` if the arguments are invalid or if help/version information
/// was requested.
pub fn try_parse() -> Result<Cli, clap::Error> {
    Cli::try_parse()
}
