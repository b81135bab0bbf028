// drive-rs: Git-backed Drive
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Git operations module.
//!
//! ```text
//!         pipeline::Dispatcher
//!                 |
//!                 v
//!      ,---------------------,
//!      |  backend (trait)    |
//!      |  tolerate()         |
//!      '----------+----------'
//!                 |
//!                 v
//!           ShellBackend  ----> query.rs (gix, read-only)
//!        clone/pull/add/         is_work_tree
//!        commit/push (CLI)       current_branch
//! ```
//!
//! **`ShellBackend`**: git CLI for every write and network operation.
//! **`query`**: pure Rust gix, no subprocess.

pub mod backend;
pub mod query;
pub mod shell;

pub use backend::{Backend, BackendResult, tolerate};
pub use shell::ShellBackend;
