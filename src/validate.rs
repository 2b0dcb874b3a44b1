//! Validator (component 8): walks the same pipeline as the orchestrator in
//! read-only mode. Makes no filesystem writes and creates no commits.

use crate::{
   harvest, manifest,
   refactor::{self, Dispatch},
   snapshot::SnapshotStore,
   types::{Manifest, ProjectConfig, ValidationError, ValidationResult},
};

/// Validate every manifest against its snapshot source: structural checks
/// already done at parse time, plus per-entry `commit_exists`/
/// `file_exists_at` probes and a parse-only pass over Java sources.
pub fn validate(manifests: &[Manifest], project: &ProjectConfig) -> ValidationResult {
   let mut result = ValidationResult::default();

   result.pass("manifest structure", Some(format!("{} manifest(s) parsed", manifests.len())));

   for m in manifests {
      let store = match open_store(m) {
         Ok(store) => store,
         Err(e) => {
            result.fail(
               format!("snapshot source for manifest {}", m.effective_sequence),
               None,
               ValidationError {
                  message:    e.to_string(),
                  file:       Some(m.origin_path.display().to_string()),
                  line:       None,
                  commit:     None,
                  suggestion: Some("check sourceRepository and sourceType".to_string()),
               },
            );
            continue;
         },
      };

      let problems = harvest::validate(m, &store);
      if problems.is_empty() {
         result.pass(
            format!("entries resolvable for manifest {}", m.effective_sequence),
            Some(format!("{} entries checked", m.files.len())),
         );
      } else {
         for (destination, error) in problems {
            result.fail(
               format!("entry resolvable: {destination}"),
               None,
               ValidationError {
                  message:    error.to_string(),
                  file:       Some(destination),
                  line:       None,
                  commit:     None,
                  suggestion: Some("confirm the commit and source path exist in the snapshot source".to_string()),
               },
            );
         }
         continue;
      }

      validate_java_entries(m, &store, &mut result, project);
   }

   result
}

fn open_store(m: &Manifest) -> crate::error::Result<SnapshotStore> {
   match m.source_type {
      crate::types::SourceType::Vcs => SnapshotStore::open_vcs(m.source_repository.clone()),
      crate::types::SourceType::ZipArchives => SnapshotStore::open_zip_archives(&m.source_repository),
   }
}

/// Attempt to parse every `.java` entry without rewriting it, surfacing
/// syntax errors the refactor phase would otherwise hit mid-run.
fn validate_java_entries(m: &Manifest, store: &SnapshotStore, result: &mut ValidationResult, project: &ProjectConfig) {
   for entry in &m.files {
      if refactor::dispatch_for(&entry.destination_path) != Dispatch::Java {
         continue;
      }
      let Ok(bytes) = store.read_bytes(&entry.commit, &entry.source_path) else {
         continue; // already reported by the resolvability pass above
      };

      let path_old_pkg =
         manifest::infer_base_package(m, manifest::PackageAxis::Destination).unwrap_or_else(|| project.old_package.clone());
      match refactor::rewrite_content_for_validation(&entry.destination_path, &bytes, &project.old_package, &project.new_package, &path_old_pkg) {
         Ok(()) => result.pass(format!("java syntax: {}", entry.destination_path), None),
         Err(e) => result.fail(
            format!("java syntax: {}", entry.destination_path),
            None,
            ValidationError {
               message:    e.to_string(),
               file:       Some(entry.destination_path.clone()),
               line:       None,
               commit:     Some(entry.commit.clone()),
               suggestion: Some("check the source file for syntax errors at that commit".to_string()),
            },
         ),
      }
   }
}

#[cfg(test)]
mod tests {
   use std::io::Write;

   use super::*;
   use crate::types::{ManifestEntry, SourceType};

   fn write_zip(path: &std::path::Path, entries: &[(&str, &[u8])]) {
      let file = std::fs::File::create(path).unwrap();
      let mut writer = zip::ZipWriter::new(file);
      let options = zip::write::FileOptions::<()>::default()
         .compression_method(zip::CompressionMethod::Deflated);
      for (name, data) in entries {
         writer.start_file(*name, options).unwrap();
         writer.write_all(data).unwrap();
      }
      writer.finish().unwrap();
   }

   fn project() -> ProjectConfig {
      ProjectConfig {
         group_id:          "com.example".to_string(),
         artifact_id:       "demo".to_string(),
         project_name:      "demo".to_string(),
         version:           "0.1.0".to_string(),
         framework_version: "3.3.0".to_string(),
         runtime_version:   "21".to_string(),
         capabilities:      vec![],
         old_package:       "com.old.app".to_string(),
         new_package:       "com.new.api".to_string(),
         target_dir:        std::path::PathBuf::new(),
      }
   }

   #[test]
   fn validate_reports_missing_entries() {
      let dir = tempfile::tempdir().unwrap();
      let archive = dir.path().join("proj-abc1234.zip");
      write_zip(&archive, &[("a.txt", b"A")]);

      let manifest = Manifest {
         source_repository: dir.path().display().to_string(),
         source_type:       SourceType::ZipArchives,
         sequence_number:   Some(1),
         files:             vec![ManifestEntry {
            commit:           "abc1234".to_string(),
            source_path:      "missing.txt".to_string(),
            destination_path: "out.txt".to_string(),
            target_directory: None,
         }],
         effective_sequence: 1,
         origin_path:        std::path::PathBuf::new(),
      };

      let result = validate(&[manifest], &project());
      assert!(!result.is_ok());
   }

   #[test]
   fn validate_passes_clean_manifest() {
      let dir = tempfile::tempdir().unwrap();
      let archive = dir.path().join("proj-abc1234.zip");
      write_zip(&archive, &[("a.txt", b"A")]);

      let manifest = Manifest {
         source_repository: dir.path().display().to_string(),
         source_type:       SourceType::ZipArchives,
         sequence_number:   Some(1),
         files:             vec![ManifestEntry {
            commit:           "abc1234".to_string(),
            source_path:      "a.txt".to_string(),
            destination_path: "out.txt".to_string(),
            target_directory: None,
         }],
         effective_sequence: 1,
         origin_path:        std::path::PathBuf::new(),
      };

      let result = validate(&[manifest], &project());
      assert!(result.is_ok());
   }
}
