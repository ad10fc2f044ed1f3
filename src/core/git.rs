#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde::Serialize;

use crate::error::InvarError;

/// One entry of the commit audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitInfo {
    pub hash: String,
    pub date: String,
    pub message: String,
}

/// A git working tree rooted at the task data directory. Commits are made
/// with a fixed local identity so the store works without global git config.
#[derive(Debug, Clone)]
pub struct Repo {
    root: PathBuf,
}

impl Repo {
    /// Opens the repository at `root`, initializing one if `.git` is absent.
    /// The directory itself must already exist.
    pub fn init_or_open(root: &Path) -> Result<Self, InvarError> {
        let repo = Self {
            root: root.to_path_buf(),
        };
        if !root.join(".git").exists() {
            let _ = repo.run(&["init"])?;
        }
        Ok(repo)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stages the entire working tree and commits it. A clean tree is a
    /// no-op, not an error.
    pub fn commit_all(&self, message: &str) -> Result<(), InvarError> {
        let _ = self.run(&["add", "-A"])?;

        let status = self.run(&["status", "--porcelain"])?;
        if status.trim().is_empty() {
            return Ok(());
        }

        let _ = self.run(&[
            "-c",
            "user.name=Invar",
            "-c",
            "user.email=invar@localhost",
            "-c",
            "commit.gpgsign=false",
            "commit",
            "-m",
            message,
        ])?;
        Ok(())
    }

    /// Returns the commit history, newest first. An unborn HEAD (no commits
    /// yet) yields an empty history.
    pub fn log(&self) -> Result<Vec<CommitInfo>, InvarError> {
        if !self.has_commits() {
            return Ok(Vec::new());
        }
        let out = self.run(&["log", "--pretty=format:%h|%ad|%s", "--date=short"])?;
        let mut commits = Vec::new();
        for line in out.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut parts = line.splitn(3, '|');
            let (Some(hash), Some(date), Some(message)) =
                (parts.next(), parts.next(), parts.next())
            else {
                continue;
            };
            commits.push(CommitInfo {
                hash: hash.to_owned(),
                date: date.to_owned(),
                message: message.to_owned(),
            });
        }
        Ok(commits)
    }

    fn has_commits(&self) -> bool {
        self.run_raw(&["rev-parse", "--verify", "HEAD"])
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    fn run(&self, args: &[&str]) -> Result<String, InvarError> {
        let out = self.run_raw(args)?;
        if out.status.success() {
            Ok(String::from_utf8_lossy(&out.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&out.stderr);
            Err(InvarError::Git(format!(
                "git {}: {}",
                args.join(" "),
                stderr.trim()
            )))
        }
    }

    fn run_raw(&self, args: &[&str]) -> Result<Output, InvarError> {
        Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => InvarError::GitNotFound,
                _ => InvarError::Git(format!("failed to run git: {e}")),
            })
    }
}
