// drive-rs: Git-backed Drive
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Library root.
//!
//! # Crate Architecture
//!
//! ```text
//!                        main.rs
//!                           |
//!                +----------+----------+
//!                v                     v
//!             cli (clap)          cmd (handlers)
//!                |            ls / rm / watch
//!                +----------+----------+
//!                           v
//!              ,---------------------------,
//!              |           drive           |
//!              |  read_dir, remove, listen |
//!              |  events (SSE frames)      |
//!              '-------------+-------------'
//!                            v
//!              ,---------------------------,
//!              |         pipeline          |
//!              |  handle --mpsc--> thread  |
//!              |  registry   queue         |
//!              '-------------+-------------'
//!                            v
//!                    git (Backend trait)
//!                  ShellBackend, gix query
//!
//!   +-----------------------------------------+
//!   |  foundation   error, logging, config    |
//!   +-----------------------------------------+
//! ```

pub mod cli;
pub mod cmd;
pub mod config;
pub mod drive;
pub mod error;
pub mod git;
pub mod logging;
pub mod pipeline;
pub mod queue;
