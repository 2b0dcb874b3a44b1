//! Subprocess wrapper around the `git` binary. Every interaction with git
//! anywhere in this crate — the snapshot store's VCS backend (`snapshot.rs`)
//! and the commit sequencer (`commit.rs`) — goes through this module, never
//! through a linked git object-database library.

use std::{path::Path, process::Command};

use crate::error::BootstrapError;

/// Resolve an abbreviated or full commit identifier to its full hash.
/// Returns `None` if the identifier does not resolve to a commit at all
/// (distinct from the path not existing at that commit).
pub fn resolve_commit(repo_dir: &Path, commit: &str) -> Result<Option<String>, BootstrapError> {
   let output = Command::new("git")
      .args(["rev-parse", "--verify", "--quiet", &format!("{commit}^{{commit}}")])
      .current_dir(repo_dir)
      .output()
      .map_err(|e| BootstrapError::SnapshotSource(format!("failed to run git rev-parse: {e}")))?;

   if !output.status.success() {
      return Ok(None);
   }
   Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
}

/// Whether `path` exists in the tree of `commit`.
pub fn file_exists_at(repo_dir: &Path, commit: &str, path: &str) -> bool {
   Command::new("git")
      .args(["cat-file", "-e", &format!("{commit}:{path}")])
      .current_dir(repo_dir)
      .status()
      .is_ok_and(|status| status.success())
}

/// Read the bytes of `path` at `commit`. Distinguishes a missing commit from
/// a missing path at an existing commit via a preceding `resolve_commit`
/// check at the call site.
pub fn read_blob(repo_dir: &Path, commit: &str, path: &str) -> Result<Vec<u8>, BootstrapError> {
   let output = Command::new("git")
      .args(["show", &format!("{commit}:{path}")])
      .current_dir(repo_dir)
      .output()
      .map_err(|e| BootstrapError::SnapshotSource(format!("failed to run git show: {e}")))?;

   if !output.status.success() {
      return Err(BootstrapError::FileNotFound { commit: commit.to_string(), path: path.to_string() });
   }
   Ok(output.stdout)
}

/// Initialize an empty repository at `dir`, creating it if necessary.
pub fn init(dir: &Path) -> Result<(), BootstrapError> {
   std::fs::create_dir_all(dir)?;
   run(dir, &["init", "--quiet"]).map(|_| ())
}

/// Stage every change in the working tree.
pub fn add_all(dir: &Path) -> Result<(), BootstrapError> {
   run(dir, &["add", "-A"]).map(|_| ())
}

/// Create a commit with the given message, threading author/committer
/// identity from the process environment when present.
pub fn commit(dir: &Path, message: &str, author_name: &str, author_email: &str) -> Result<(), BootstrapError> {
   let mut cmd = Command::new("git");
   cmd.args(["commit", "--quiet", "--allow-empty", "-m", message]).current_dir(dir);

   cmd.env(
      "GIT_AUTHOR_NAME",
      std::env::var("GIT_AUTHOR_NAME").unwrap_or_else(|_| author_name.to_string()),
   );
   cmd.env(
      "GIT_AUTHOR_EMAIL",
      std::env::var("GIT_AUTHOR_EMAIL").unwrap_or_else(|_| author_email.to_string()),
   );
   cmd.env(
      "GIT_COMMITTER_NAME",
      std::env::var("GIT_COMMITTER_NAME").unwrap_or_else(|_| author_name.to_string()),
   );
   cmd.env(
      "GIT_COMMITTER_EMAIL",
      std::env::var("GIT_COMMITTER_EMAIL").unwrap_or_else(|_| author_email.to_string()),
   );

   let output = cmd
      .output()
      .map_err(|e| BootstrapError::CommitSequencer(format!("failed to run git commit: {e}")))?;

   if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(BootstrapError::CommitSequencer(format!("git commit failed: {stderr}")));
   }
   Ok(())
}

/// Return the commit log as a list of subject lines, oldest first.
pub fn log_subjects(dir: &Path) -> Result<Vec<String>, BootstrapError> {
   let output = Command::new("git")
      .args(["log", "--reverse", "--format=%s"])
      .current_dir(dir)
      .output()
      .map_err(|e| BootstrapError::CommitSequencer(format!("failed to run git log: {e}")))?;

   if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(BootstrapError::CommitSequencer(format!("git log failed: {stderr}")));
   }
   Ok(String::from_utf8_lossy(&output.stdout).lines().map(str::to_string).collect())
}

fn run(dir: &Path, args: &[&str]) -> Result<String, BootstrapError> {
   let output = Command::new("git")
      .args(args)
      .current_dir(dir)
      .output()
      .map_err(|e| BootstrapError::CommitSequencer(format!("failed to run git {}: {e}", args.join(" "))))?;

   if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(BootstrapError::CommitSequencer(format!("git {} failed: {stderr}", args.join(" "))));
   }
   Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
