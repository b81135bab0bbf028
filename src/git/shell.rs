// drive-rs: Git-backed Drive
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Production backend driving the git CLI.
//!
//! ```text
//! open_or_clone  gix::open (work tree?) | git clone --origin <remote>
//! pull           git pull --rebase --autostash <remote> [branch]
//! stage          git add --all -- <path>        (stages deletions too)
//! commit         git [-c user.*] commit -m <message>
//! push           git push <remote> HEAD[:branch]
//! ```
//!
//! Clone, pull and push talk to the remote and are killed after
//! `network_timeout`; the failure is reported like any other git error.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use bon::Builder;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, info, trace, warn};

use super::backend::{Backend, BackendResult};
use super::query;
use crate::config::types::RepoConfig;
use crate::error::{DriveResult, GitError, ProcessError};

/// Git CLI backend for one working copy.
#[derive(Debug, Clone, Builder)]
pub struct ShellBackend {
    #[builder(into)]
    path: PathBuf,
    #[builder(into)]
    url: String,
    #[builder(into, default = String::from("origin"))]
    remote: String,
    #[builder(into)]
    branch: Option<String>,
    #[builder(into)]
    author_name: Option<String>,
    #[builder(into)]
    author_email: Option<String>,
    /// Limit for each clone, pull and push.
    #[builder(default = DEFAULT_NETWORK_TIMEOUT)]
    network_timeout: Duration,
}

pub const DEFAULT_NETWORK_TIMEOUT: Duration = Duration::from_secs(120);

/// Checks that a `git` executable is reachable.
///
/// # Errors
///
/// Returns `ProcessError::ExecutableNotFound` if `git` is not in PATH.
pub fn ensure_git() -> DriveResult<PathBuf> {
    which::which("git").map_err(|_| {
        ProcessError::ExecutableNotFound {
            name: "git".to_string(),
        }
        .into()
    })
}

impl ShellBackend {
    /// Builds a backend from the `[repo]` configuration section.
    ///
    /// # Errors
    ///
    /// Returns an error if `git` is missing or no remote URL can be derived.
    pub fn from_config(repo: &RepoConfig) -> DriveResult<Self> {
        ensure_git()?;
        let url = repo.remote_url()?;
        Ok(Self::builder()
            .path(repo.path.clone())
            .url(url)
            .remote(repo.remote.clone())
            .maybe_branch(repo.branch.clone())
            .maybe_author_name(repo.author_name.clone())
            .maybe_author_email(repo.author_email.clone())
            .network_timeout(Duration::from_secs(repo.network_timeout_secs))
            .build())
    }

    /// Working copy location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs git with prompts disabled; returns trimmed stdout. With a
    /// `timeout`, git is killed once it elapses and the call fails.
    fn git_command(args: &[&str], cwd: &Path, timeout: Option<Duration>) -> BackendResult<String> {
        trace!(?args, cwd = %cwd.display(), ?timeout, "running git");
        let command_line = format!("git {}", args.join(" "));
        let failed = |message: String| GitError::CommandFailed {
            command: command_line.clone(),
            message,
        };

        let mut command = Command::new("git");
        command
            .args(args)
            .current_dir(cwd)
            .env("GCM_INTERACTIVE", "never")
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // the calling thread may already drive a runtime; the child gets its own
        let output = std::thread::scope(|scope| scope.spawn(|| run_child(command, timeout)).join())
            .map_err(|_| failed("git runner thread panicked".to_string()))?
            .map_err(|e| failed(format!("failed to execute git: {e}")))?;

        let Some(output) = output else {
            return Err(failed(format!(
                "timed out after {:?}",
                timeout.unwrap_or_default()
            )));
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            // "nothing to commit" and friends are reported on stdout
            let message = if stderr.is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr
            };
            return Err(failed(message));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn run(&self, args: &[&str]) -> BackendResult<String> {
        Self::git_command(args, &self.path, None)
    }

    fn run_remote(&self, args: &[&str]) -> BackendResult<String> {
        Self::git_command(args, &self.path, Some(self.network_timeout))
    }

    fn path_str(&self) -> String {
        self.path.display().to_string()
    }
}

/// Waits for `command` on a private runtime. `Ok(None)` means it was killed
/// after `timeout`.
fn run_child(mut command: Command, timeout: Option<Duration>) -> std::io::Result<Option<Output>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let mut child = command.spawn()?;
        let stdout = tokio::spawn(read_all(child.stdout.take()));
        let stderr = tokio::spawn(read_all(child.stderr.take()));

        let status = if let Some(limit) = timeout {
            tokio::select! {
                status = child.wait() => status?,
                () = tokio::time::sleep(limit) => {
                    warn!(pid = ?child.id(), timeout = ?limit, "git timed out, killing it");
                    child.kill().await?;
                    return Ok(None);
                }
            }
        } else {
            child.wait().await?
        };

        Ok(Some(Output {
            status,
            stdout: stdout.await.unwrap_or_default(),
            stderr: stderr.await.unwrap_or_default(),
        }))
    })
}

async fn read_all<R: AsyncRead + Unpin>(reader: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut reader) = reader {
        // a read error just truncates what is reported
        let _ = reader.read_to_end(&mut buf).await;
    }
    buf
}

/// Extracts the git-reported message from a raw command failure.
fn message_of(err: GitError) -> String {
    match err {
        GitError::CommandFailed { message, .. } => message,
        other => other.reason(),
    }
}

impl Backend for ShellBackend {
    fn open_or_clone(&mut self) -> BackendResult<()> {
        if query::is_work_tree(&self.path) {
            let branch = query::current_branch(&self.path)?;
            info!(path = %self.path.display(), branch = ?branch, "opened working copy");
            return Ok(());
        }

        let occupied = std::fs::read_dir(&self.path).is_ok_and(|mut it| it.next().is_some());
        if occupied {
            return Err(GitError::OpenFailed {
                path: self.path_str(),
                message: "directory exists and is not a git working copy".to_string(),
            });
        }

        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).map_err(|e| GitError::CloneFailed {
            url: self.url.clone(),
            message: format!("failed to create {}: {e}", parent.display()),
        })?;

        let dest = self.path_str();
        let mut args = vec!["clone", "--quiet", "--origin", self.remote.as_str()];
        if let Some(branch) = &self.branch {
            args.extend(["--branch", branch.as_str()]);
        }
        args.extend([self.url.as_str(), dest.as_str()]);

        info!(url = %self.url, path = %dest, "cloning working copy");
        Self::git_command(&args, parent, Some(self.network_timeout)).map_err(|e| {
            GitError::CloneFailed {
                url: self.url.clone(),
                message: message_of(e),
            }
        })?;
        Ok(())
    }

    fn pull(&mut self) -> BackendResult<()> {
        let mut args = vec![
            "pull",
            "--quiet",
            "--rebase",
            "--autostash",
            self.remote.as_str(),
        ];
        if let Some(branch) = &self.branch {
            args.push(branch.as_str());
        }
        self.run_remote(&args).map_err(|e| GitError::PullFailed {
            message: message_of(e),
        })?;
        Ok(())
    }

    fn stage(&mut self, paths: &[String]) -> BackendResult<()> {
        for path in paths {
            self.run(&["add", "--all", "--", path.as_str()])
                .map_err(|e| GitError::StageFailed {
                    path: path.clone(),
                    message: message_of(e),
                })?;
            debug!(path = %path, "staged path");
        }
        Ok(())
    }

    fn commit(&mut self, message: &str) -> BackendResult<()> {
        let name = self.author_name.as_ref().map(|n| format!("user.name={n}"));
        let email = self.author_email.as_ref().map(|e| format!("user.email={e}"));

        let mut args = Vec::new();
        for setting in [&name, &email].into_iter().flatten() {
            args.extend(["-c", setting.as_str()]);
        }
        args.extend(["commit", "--quiet", "-m", message]);

        self.run(&args).map_err(|e| GitError::CommitFailed {
            message: message_of(e),
        })?;
        debug!(message, "committed");
        Ok(())
    }

    fn push(&mut self) -> BackendResult<()> {
        let refspec = self
            .branch
            .as_ref()
            .map_or_else(|| "HEAD".to_string(), |b| format!("HEAD:{b}"));
        self.run_remote(&["push", "--quiet", self.remote.as_str(), refspec.as_str()])
            .map_err(|e| GitError::PushFailed {
                message: message_of(e),
            })?;
        Ok(())
    }
}
