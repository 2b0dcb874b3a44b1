//! Harvester (component 3): pulls each manifest entry's snapshot into
//! memory, keyed by destination path.

use crate::{
   error::{BootstrapError, Result},
   progress::{ProgressEvent, ProgressSink},
   snapshot::SnapshotStore,
   types::{ArtifactMap, Manifest},
};

/// Harvest every entry of `manifest` from `store` into an `ArtifactMap`
/// keyed by destination path, preserving manifest order. On any entry
/// failure, collects an error but keeps going so the caller gets a full
/// failure report in one pass; the first collected error (if any) is
/// returned to the orchestrator, which aborts the replay.
pub fn harvest(manifest: &Manifest, store: &SnapshotStore, sink: &dyn ProgressSink) -> Result<ArtifactMap> {
   let mut artifacts = ArtifactMap::new();
   let mut failures: Vec<BootstrapError> = Vec::new();

   for entry in &manifest.files {
      match store.read_bytes(&entry.commit, &entry.source_path) {
         Ok(bytes) => {
            sink.emit(ProgressEvent::HarvestEntry {
               destination: entry.destination_path.clone(),
               success:     true,
            });
            artifacts.insert(entry.destination_path.clone(), bytes);
         },
         Err(e) => {
            sink.emit(ProgressEvent::HarvestEntry {
               destination: entry.destination_path.clone(),
               success:     false,
            });
            failures.push(e);
         },
      }
   }

   if let Some(first) = failures.into_iter().next() {
      return Err(first);
   }
   Ok(artifacts)
}

/// Validation-mode harvest: checks `commit_exists` + `file_exists_at` for
/// every entry without reading bytes. Used by the Validator (component 8).
pub fn validate(manifest: &Manifest, store: &SnapshotStore) -> Vec<(String, BootstrapError)> {
   let mut problems = Vec::new();

   for entry in &manifest.files {
      if !store.commit_exists(&entry.commit) {
         problems.push((
            entry.destination_path.clone(),
            BootstrapError::CommitNotFound {
               commit: entry.commit.clone(),
               source: manifest.source_repository.clone(),
            },
         ));
         continue;
      }
      match store.file_exists_at(&entry.commit, &entry.source_path) {
         Ok(true) => {},
         Ok(false) => problems.push((
            entry.destination_path.clone(),
            BootstrapError::FileNotFound {
               commit: entry.commit.clone(),
               path:   entry.source_path.clone(),
            },
         )),
         Err(e) => problems.push((entry.destination_path.clone(), e)),
      }
   }

   problems
}
