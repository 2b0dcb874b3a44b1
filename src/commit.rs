//! Commit Sequencer (component 6): initializes the target repository with
//! a baseline commit, then creates one commit per replayed manifest whose
//! sequence number has a ledger entry.

use std::{collections::HashMap, path::Path};

use crate::{
   config::EngineConfig,
   error::Result,
   vcs,
};

pub const BASELINE_MESSAGE: &str = "chore(init): scaffold project from Spring Initializr";

/// Initialize `target_dir` as a version-control repository, stage the
/// skeleton files already extracted there, and create the baseline
/// commit.
pub fn commit_baseline(target_dir: &Path, config: &EngineConfig) -> Result<()> {
   vcs::init(target_dir)?;
   vcs::add_all(target_dir)?;
   vcs::commit(target_dir, BASELINE_MESSAGE, &config.default_author_name, &config.default_author_email)
}

/// After a manifest's writes complete, stage all changes and create a
/// commit using the message looked up by sequence number in `ledger`. If
/// no sequence number, or no ledger entry, the commit phase is skipped —
/// returns `Ok(None)` with the reason for the caller to report as a
/// warning, never a failure.
pub fn commit_manifest(
   target_dir: &Path,
   sequence: u64,
   ledger: &HashMap<u64, String>,
   config: &EngineConfig,
) -> Result<Option<String>> {
   let Some(message) = ledger.get(&sequence) else {
      return Ok(None);
   };

   vcs::add_all(target_dir)?;
   vcs::commit(target_dir, message, &config.default_author_name, &config.default_author_email)?;
   Ok(Some(message.clone()))
}
