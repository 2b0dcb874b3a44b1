//! Orchestrator (component 7): drives the fixed phase ordering across all
//! manifests, owns the rollback journal, routes progress events,
//! categorizes errors.

use std::collections::HashMap;

use crate::{
   commit, config::EngineConfig, error::Result, harvest, ledger, manifest,
   progress::{ProgressEvent, ProgressSink},
   refactor,
   skeleton::{self, SkeletonFetcher},
   snapshot::SnapshotStore,
   types::{Manifest, ManifestEntry, ProjectConfig, SourceType},
   write::{RollbackJournal, TransactionalWriter},
};

/// Summary emitted on successful completion of all manifests.
#[derive(Debug)]
pub struct RunSummary {
   pub commits_created: usize,
   pub warnings:        Vec<String>,
}

/// Run the full bootstrap pipeline: fetch skeleton, baseline commit, then
/// harvest/refactor/write/commit for every manifest in sequence order.
/// On any failure, rolls back and returns the original error; the
/// filesystem is left in its pre-run state.
pub fn run(
   project: &ProjectConfig,
   engine_config: &EngineConfig,
   manifests: Vec<Manifest>,
   ledger_text: Option<&str>,
   fetcher: &dyn SkeletonFetcher,
   sink: &dyn ProgressSink,
) -> Result<RunSummary> {
   let mut journal = RollbackJournal::new();
   let ledger_map = ledger_text.map(ledger::parse).unwrap_or_default();
   let mut warnings = Vec::new();
   let mut commits_created = 0usize;

   let outcome = run_inner(
      project,
      engine_config,
      &manifests,
      &ledger_map,
      fetcher,
      sink,
      &mut journal,
      &mut commits_created,
      &mut warnings,
   );

   match outcome {
      Ok(()) => {
         journal.clear();
         let finished_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
         sink.emit(ProgressEvent::Success { commits: commits_created, finished_at });
         Ok(RunSummary { commits_created, warnings })
      },
      Err(e) => {
         if e.requires_rollback() {
            sink.emit(ProgressEvent::RollbackStarted);
            let rollback_warnings = journal.rollback();
            for w in &rollback_warnings {
               sink.emit(ProgressEvent::RollbackEntry { description: w.clone() });
            }
            sink.emit(ProgressEvent::RollbackComplete);
         }
         Err(e)
      },
   }
}

#[allow(clippy::too_many_arguments)]
fn run_inner(
   project: &ProjectConfig,
   engine_config: &EngineConfig,
   manifests: &[Manifest],
   ledger_map: &HashMap<u64, String>,
   fetcher: &dyn SkeletonFetcher,
   sink: &dyn ProgressSink,
   journal: &mut RollbackJournal,
   commits_created: &mut usize,
   warnings: &mut Vec<String>,
) -> Result<()> {
   // Phase 1: fetch skeleton, extract, init repo, baseline commit.
   sink.emit(ProgressEvent::FetchingSkeleton);
   let archive = fetcher.fetch(project)?;
   // Skeleton extraction runs before the rollback journal has anything to
   // undo; a failure at this phase leaves no manifest writes to roll back,
   // so its own created directories are not journaled.
   skeleton::extract(&archive, &project.target_dir)?;
   sink.emit(ProgressEvent::SkeletonReady);

   commit::commit_baseline(&project.target_dir, engine_config)?;
   sink.emit(ProgressEvent::BaselineCommitted);

   let ordered = sorted_by_sequence(manifests);
   let total = ordered.len();

   for (index, m) in ordered.iter().enumerate() {
      sink.emit(ProgressEvent::ManifestStarted {
         sequence: m.effective_sequence,
         total,
         index: index + 1,
      });

      let store = open_store(m, project)?;
      let harvested = harvest::harvest(m, &store, sink)?;

      let path_old_pkg =
         manifest::infer_base_package(m, manifest::PackageAxis::Destination).unwrap_or_else(|| project.old_package.clone());
      let refactored = refactor::refactor_all(harvested, &project.old_package, &project.new_package, &path_old_pkg)?;

      for destination in refactored.keys() {
         sink.emit(ProgressEvent::RefactorEntry { destination: destination.clone() });
      }

      write_with_overrides(m, &refactored, project, &path_old_pkg, journal, sink)?;

      match commit::commit_manifest(&project.target_dir, m.effective_sequence, ledger_map, engine_config)? {
         Some(message) => {
            *commits_created += 1;
            sink.emit(ProgressEvent::ManifestCommitted { sequence: m.effective_sequence, message });
         },
         None => {
            let reason = if m.sequence_number.is_none() {
               "manifest has no sequence number".to_string()
            } else {
               "no ledger entry for this sequence number".to_string()
            };
            warnings.push(format!("manifest {}: {reason}", m.effective_sequence));
            sink.emit(ProgressEvent::ManifestCommitSkipped { sequence: m.effective_sequence, reason });
         },
      }
   }

   Ok(())
}

fn sorted_by_sequence(manifests: &[Manifest]) -> Vec<Manifest> {
   let mut sorted = manifests.to_vec();
   sorted.sort_by_key(|m| m.effective_sequence);
   sorted
}

fn open_store(m: &Manifest, _project: &ProjectConfig) -> Result<SnapshotStore> {
   match m.source_type {
      SourceType::Vcs => SnapshotStore::open_vcs(m.source_repository.clone()),
      SourceType::ZipArchives => SnapshotStore::open_zip_archives(&m.source_repository),
   }
}

/// Write refactored artifacts, honoring per-entry `targetDirectory`
/// overrides by joining them with the (already path-transformed) relative
/// destination. A `targetDirectory` override is itself subject to the same
/// package-to-path transform as every other destination path, so an override
/// naming the old package layout still lands under the rewritten one.
/// Entries are written in the manifest's declared order, matching the
/// harvested map's insertion order.
fn write_with_overrides(
   m: &Manifest,
   refactored: &crate::types::ArtifactMap,
   project: &ProjectConfig,
   path_old_pkg: &str,
   journal: &mut RollbackJournal,
   sink: &dyn ProgressSink,
) -> Result<()> {
   let mut writer = TransactionalWriter::new(&project.target_dir, journal);

   for (entry, (new_path, bytes)) in m.files.iter().zip(refactored.iter()) {
      let relative = match &entry.target_directory {
         Some(dir) => {
            let transformed_dir = refactor::transform_path(dir, path_old_pkg, &project.new_package);
            format!("{transformed_dir}/{new_path}")
         },
         None => new_path.clone(),
      };
      sink.emit(ProgressEvent::WriteEntry { destination: relative.clone() });
      writer.write_one(&relative, bytes)?;
   }

   Ok(())
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn sorted_by_sequence_orders_ascending() {
      let make = |seq: u64| Manifest {
         source_repository: "repo".to_string(),
         source_type: SourceType::ZipArchives,
         sequence_number: Some(seq),
         files: vec![],
         effective_sequence: seq,
         origin_path: std::path::PathBuf::new(),
      };
      let manifests = vec![make(3), make(1), make(2)];
      let sorted = sorted_by_sequence(&manifests);
      let sequences: Vec<u64> = sorted.iter().map(|m| m.effective_sequence).collect();
      assert_eq!(sequences, vec![1, 2, 3]);
   }

   #[test]
   fn write_with_overrides_transforms_target_directory() {
      let dir = tempfile::tempdir().unwrap();
      let project = ProjectConfig {
         group_id: "g".to_string(),
         artifact_id: "a".to_string(),
         project_name: "p".to_string(),
         version: "0.1.0".to_string(),
         framework_version: "1".to_string(),
         runtime_version: "1".to_string(),
         capabilities: vec![],
         old_package: "com.old.app".to_string(),
         new_package: "com.new.api".to_string(),
         target_dir: dir.path().to_path_buf(),
      };
      let m = Manifest {
         source_repository: "repo".to_string(),
         source_type: SourceType::ZipArchives,
         sequence_number: Some(1),
         files: vec![ManifestEntry {
            commit: "abc".to_string(),
            source_path: "extra.txt".to_string(),
            destination_path: "extra.txt".to_string(),
            target_directory: Some("src/main/java/com/old/app".to_string()),
         }],
         effective_sequence: 1,
         origin_path: std::path::PathBuf::new(),
      };
      let mut refactored = crate::types::ArtifactMap::new();
      refactored.insert("extra.txt".to_string(), b"hello".to_vec());

      let mut journal = RollbackJournal::new();
      let sink = crate::progress::BufferingSink::default();
      write_with_overrides(&m, &refactored, &project, "com.old.app", &mut journal, &sink).unwrap();

      assert!(dir.path().join("src/main/java/com/new/api/extra.txt").exists());
      assert!(!dir.path().join("src/main/java/com/old/app/extra.txt").exists());
   }
}
