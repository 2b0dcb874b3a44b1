//! Transactional Writer (component 5): writes refactored artifacts to the
//! target directory and records every filesystem mutation on a rollback
//! journal, owned exclusively by the orchestrator.

use std::path::{Path, PathBuf};

use crate::{
   error::{BootstrapError, Result},
   types::ArtifactMap,
};

/// One recorded filesystem mutation.
#[derive(Debug, Clone)]
enum Mutation {
   FileCreated { path: PathBuf },
   FileModified { path: PathBuf, prior_bytes: Vec<u8> },
   DirectoryCreated { path: PathBuf },
}

/// Append-only ordered log of filesystem mutations. Owned by the
/// orchestrator; only the Transactional Writer appends to it, via
/// `&mut RollbackJournal`.
#[derive(Debug, Default)]
pub struct RollbackJournal {
   mutations: Vec<Mutation>,
}

impl RollbackJournal {
   pub fn new() -> Self {
      Self::default()
   }

   pub fn is_empty(&self) -> bool {
      self.mutations.is_empty()
   }

   /// Acknowledge durable success: drop all recorded mutations without
   /// undoing them.
   pub fn clear(&mut self) {
      self.mutations.clear();
   }

   /// Replay the journal in strict reverse order, undoing every mutation.
   /// Idempotent: once drained, a second call is a no-op. Best-effort:
   /// errors are collected and returned but do not abort the remaining
   /// replay (a directory non-empty because of files the core did not
   /// create is expected and not fatal).
   pub fn rollback(&mut self) -> Vec<String> {
      let mut warnings = Vec::new();
      while let Some(mutation) = self.mutations.pop() {
         match mutation {
            Mutation::FileCreated { path } => {
               if let Err(e) = std::fs::remove_file(&path) {
                  if e.kind() != std::io::ErrorKind::NotFound {
                     warnings.push(format!("failed to remove {}: {e}", path.display()));
                  }
               }
            },
            Mutation::FileModified { path, prior_bytes } => {
               if let Err(e) = std::fs::write(&path, &prior_bytes) {
                  warnings.push(format!("failed to restore {}: {e}", path.display()));
               }
            },
            Mutation::DirectoryCreated { path } => match std::fs::remove_dir(&path) {
               Ok(()) | Err(_) => {
                  // A non-empty-directory error means the core did not create
                  // everything inside it; that is expected, not fatal.
               },
            },
         }
      }
      warnings
   }
}

/// Writes `(path, bytes)` pairs beneath `target_dir`, journaling every
/// mutation. Refuses (fatally) to write outside `target_dir` after
/// canonicalization.
pub struct TransactionalWriter<'a> {
   target_dir: PathBuf,
   journal:    &'a mut RollbackJournal,
}

impl<'a> TransactionalWriter<'a> {
   pub fn new(target_dir: impl Into<PathBuf>, journal: &'a mut RollbackJournal) -> Self {
      Self { target_dir: target_dir.into(), journal }
   }

   /// Write every artifact in `files`, each relative to `target_dir` unless
   /// overridden (the caller is responsible for grouping entries by their
   /// effective target root before calling this, per per-entry
   /// `targetDirectory` overrides).
   pub fn write_all(&mut self, files: &ArtifactMap) -> Result<()> {
      for (path, bytes) in files {
         self.write_one(path, bytes)?;
      }
      Ok(())
   }

   pub fn write_one(&mut self, relative_path: &str, bytes: &[u8]) -> Result<()> {
      let destination = self.resolve_within_root(relative_path)?;

      if destination.exists() {
         let prior = std::fs::read(&destination)
            .map_err(|e| BootstrapError::Write { path: relative_path.to_string(), reason: e.to_string() })?;
         std::fs::write(&destination, bytes)
            .map_err(|e| BootstrapError::Write { path: relative_path.to_string(), reason: e.to_string() })?;
         self.journal.mutations.push(Mutation::FileModified { path: destination, prior_bytes: prior });
      } else {
         std::fs::write(&destination, bytes)
            .map_err(|e| BootstrapError::Write { path: relative_path.to_string(), reason: e.to_string() })?;
         self.journal.mutations.push(Mutation::FileCreated { path: destination });
      }

      Ok(())
   }

   /// Resolve `relative_path` beneath the target directory, journaling every
   /// missing ancestor directory created along the way, and verify — after
   /// canonicalization — that the result remains within the root. Any escape
   /// is a fatal security violation.
   fn resolve_within_root(&mut self, relative_path: &str) -> Result<PathBuf> {
      if Path::new(relative_path).is_absolute()
         || relative_path.split('/').any(|part| part == "..")
      {
         return Err(BootstrapError::SecurityViolation(relative_path.to_string()));
      }

      std::fs::create_dir_all(&self.target_dir)?;
      let root = self.target_dir.canonicalize()?;
      let candidate = self.target_dir.join(relative_path);

      let parent = candidate.parent().unwrap_or(&candidate).to_path_buf();
      self.ensure_dir(&parent)?;
      let canonical_parent = parent.canonicalize()?;

      if !canonical_parent.starts_with(&root) {
         return Err(BootstrapError::SecurityViolation(relative_path.to_string()));
      }

      Ok(canonical_parent.join(candidate.file_name().unwrap_or_default()))
   }

   /// Create `dir` and any missing ancestors, journaling each one as
   /// `DirectoryCreated` in the order created (shallowest first) so rollback
   /// removes them deepest first. A no-op if `dir` already exists.
   fn ensure_dir(&mut self, dir: &Path) -> Result<()> {
      if dir.exists() {
         return Ok(());
      }
      let mut to_create = Vec::new();
      let mut cursor = dir;
      while !cursor.exists() {
         to_create.push(cursor.to_path_buf());
         match cursor.parent() {
            Some(parent) => cursor = parent,
            None => break,
         }
      }
      for created in to_create.into_iter().rev() {
         std::fs::create_dir(&created)?;
         self.journal.mutations.push(Mutation::DirectoryCreated { path: created });
      }
      Ok(())
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn writes_new_file_and_records_creation() {
      let dir = tempfile::tempdir().unwrap();
      let mut journal = RollbackJournal::new();
      {
         let mut writer = TransactionalWriter::new(dir.path(), &mut journal);
         writer.write_one("a/b/c.txt", b"hello").unwrap();
      }
      assert_eq!(std::fs::read(dir.path().join("a/b/c.txt")).unwrap(), b"hello");
      assert!(!journal.is_empty());
   }

   #[test]
   fn rollback_removes_created_file_and_directories() {
      let dir = tempfile::tempdir().unwrap();
      let mut journal = RollbackJournal::new();
      {
         let mut writer = TransactionalWriter::new(dir.path(), &mut journal);
         writer.write_one("a/b/c.txt", b"hello").unwrap();
      }
      journal.rollback();
      assert!(!dir.path().join("a/b/c.txt").exists());
      assert!(!dir.path().join("a").exists());
   }

   #[test]
   fn rollback_restores_modified_file_bytes() {
      let dir = tempfile::tempdir().unwrap();
      std::fs::write(dir.path().join("existing.txt"), b"original").unwrap();

      let mut journal = RollbackJournal::new();
      {
         let mut writer = TransactionalWriter::new(dir.path(), &mut journal);
         writer.write_one("existing.txt", b"modified").unwrap();
      }
      assert_eq!(std::fs::read(dir.path().join("existing.txt")).unwrap(), b"modified");

      journal.rollback();
      assert_eq!(std::fs::read(dir.path().join("existing.txt")).unwrap(), b"original");
   }

   #[test]
   fn rollback_is_idempotent() {
      let dir = tempfile::tempdir().unwrap();
      let mut journal = RollbackJournal::new();
      {
         let mut writer = TransactionalWriter::new(dir.path(), &mut journal);
         writer.write_one("x.txt", b"hi").unwrap();
      }
      journal.rollback();
      let warnings_second = journal.rollback();
      assert!(warnings_second.is_empty());
   }

   #[test]
   fn clear_acknowledges_success_without_undoing() {
      let dir = tempfile::tempdir().unwrap();
      let mut journal = RollbackJournal::new();
      {
         let mut writer = TransactionalWriter::new(dir.path(), &mut journal);
         writer.write_one("keep.txt", b"data").unwrap();
      }
      journal.clear();
      assert!(journal.is_empty());
      assert!(dir.path().join("keep.txt").exists());
   }

   #[test]
   fn escape_attempt_is_rejected() {
      let dir = tempfile::tempdir().unwrap();
      let mut journal = RollbackJournal::new();
      let mut writer = TransactionalWriter::new(dir.path(), &mut journal);
      let err = writer.write_one("../../etc/passwd", b"x").unwrap_err();
      assert!(matches!(err, BootstrapError::SecurityViolation(_)));
   }
}
