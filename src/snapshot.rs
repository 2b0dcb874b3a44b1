//! Snapshot Store (component 1): a uniform read interface over two
//! snapshot backends. Modeled as a tagged variant rather than a trait-object
//! hierarchy, per the chosen re-architecture.

use std::{
   collections::HashMap,
   fs::File,
   io::Read,
   path::{Path, PathBuf},
};

use regex::Regex;
use std::sync::LazyLock;

use crate::{
   error::{BootstrapError, Result},
   vcs,
};

static ZIP_NAME: LazyLock<Regex> =
   LazyLock::new(|| Regex::new(r"-([a-fA-F0-9]{7,40})\.zip$").expect("valid regex"));

/// Read-only interface over a historical snapshot source. Two variants:
/// a VCS working copy, or a directory of ZIP archives named by commit.
pub enum SnapshotStore {
   Vcs { repo_dir: PathBuf },
   ZipArchives { index: HashMap<String, PathBuf> },
}

impl SnapshotStore {
   /// Open a VCS working-copy directory as the snapshot source.
   pub fn open_vcs(repo_dir: impl Into<PathBuf>) -> Result<Self> {
      let repo_dir = repo_dir.into();
      if !repo_dir.is_dir() {
         return Err(BootstrapError::SnapshotSource(format!(
            "{} is not a directory",
            repo_dir.display()
         )));
      }
      Ok(Self::Vcs { repo_dir })
   }

   /// Scan `dir` for files matching `<anything>-<hex>.zip` and index each
   /// by its commit identifier, both full hex and first-7 prefix, stored
   /// case-folded.
   pub fn open_zip_archives(dir: impl AsRef<Path>) -> Result<Self> {
      let dir = dir.as_ref();
      if !dir.is_dir() {
         return Err(BootstrapError::SnapshotSource(format!("{} is not a directory", dir.display())));
      }

      let mut index = HashMap::new();
      for entry in std::fs::read_dir(dir)? {
         let entry = entry?;
         let path = entry.path();
         let Some(name) = path.file_name().and_then(|n| n.to_str()) else { continue };
         let Some(captures) = ZIP_NAME.captures(name) else { continue };
         let full = captures[1].to_lowercase();
         index.insert(full.clone(), path.clone());
         if full.len() > 7 {
            index.entry(full[..7].to_string()).or_insert_with(|| path.clone());
         }
      }

      Ok(Self::ZipArchives { index })
   }

   /// Whether `commit` exists in this source. Accepts 7+ char abbreviated
   /// or full identifiers, case-insensitive.
   pub fn commit_exists(&self, commit: &str) -> bool {
      match self {
         Self::Vcs { repo_dir } => {
            vcs::resolve_commit(repo_dir, commit).ok().flatten().is_some()
         },
         Self::ZipArchives { index } => index.contains_key(&commit.to_lowercase()),
      }
   }

   /// Whether `path` exists at `commit` without reading its bytes.
   pub fn file_exists_at(&self, commit: &str, path: &str) -> Result<bool> {
      match self {
         Self::Vcs { repo_dir } => {
            let Some(full) = vcs::resolve_commit(repo_dir, commit)? else {
               return Err(BootstrapError::CommitNotFound {
                  commit: commit.to_string(),
                  source: repo_dir.display().to_string(),
               });
            };
            Ok(vcs::file_exists_at(repo_dir, &full, path))
         },
         Self::ZipArchives { index } => {
            let archive_path = self.locate_archive(index, commit)?;
            let file = File::open(&archive_path)?;
            let mut zip = zip::ZipArchive::new(file)?;
            Ok(find_entry(&mut zip, path).is_some())
         },
      }
   }

   /// Read the bytes of `path` at `commit`. Never returns a silent empty
   /// read on failure: missing commit and missing path are distinct,
   /// typed errors.
   pub fn read_bytes(&self, commit: &str, path: &str) -> Result<Vec<u8>> {
      match self {
         Self::Vcs { repo_dir } => {
            let Some(full) = vcs::resolve_commit(repo_dir, commit)? else {
               return Err(BootstrapError::CommitNotFound {
                  commit: commit.to_string(),
                  source: repo_dir.display().to_string(),
               });
            };
            vcs::read_blob(repo_dir, &full, path)
         },
         Self::ZipArchives { index } => {
            let archive_path = self.locate_archive(index, commit)?;
            let file = File::open(&archive_path)?;
            let mut zip = zip::ZipArchive::new(file)?;
            let Some(idx) = find_entry(&mut zip, path) else {
               return Err(BootstrapError::FileNotFound {
                  commit: commit.to_string(),
                  path:   path.to_string(),
               });
            };
            let mut entry = zip.by_index(idx)?;
            let mut buf = Vec::new();
            entry.read_to_end(&mut buf)?;
            Ok(buf)
         },
      }
   }

   /// List every commit identifier this source knows about.
   pub fn list_available_commits(&self) -> Result<Vec<String>> {
      match self {
         Self::Vcs { repo_dir } => vcs::log_subjects(repo_dir).map(|_| Vec::new()),
         Self::ZipArchives { index } => {
            let mut commits: Vec<String> = index.keys().filter(|k| k.len() > 7).cloned().collect();
            commits.sort();
            Ok(commits)
         },
      }
   }

   fn locate_archive(&self, index: &HashMap<String, PathBuf>, commit: &str) -> Result<PathBuf> {
      let key = commit.to_lowercase();
      index.get(&key).or_else(|| (key.len() >= 7).then(|| index.get(&key[..7])).flatten()).cloned().ok_or_else(
         || BootstrapError::CommitNotFound { commit: commit.to_string(), source: "zip archives".to_string() },
      )
   }
}

/// Find an entry in `zip` matching `path` exactly, or — tolerating
/// archives that wrap contents under a single top-level directory, as
/// produced by common VCS-hosting "download ZIP" buttons — any entry whose
/// name ends with `/<path>`.
fn find_entry<R: Read + std::io::Seek>(zip: &mut zip::ZipArchive<R>, path: &str) -> Option<usize> {
   if let Ok(idx) = zip.index_for_name(path) {
      return Some(idx);
   }
   let suffix = format!("/{path}");
   for i in 0..zip.len() {
      if let Ok(entry) = zip.by_index(i) {
         if entry.name().ends_with(&suffix) {
            return Some(i);
         }
      }
   }
   None
}
