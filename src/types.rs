use std::path::PathBuf;

use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Frozen per-run configuration. Built once from CLI flags (plus, when not
/// running non-interactively, the out-of-scope prompt layer) and never
/// mutated afterward.
#[derive(Debug, Clone)]
pub struct ProjectConfig {
   pub group_id:          String,
   pub artifact_id:       String,
   pub project_name:      String,
   pub version:           String,
   pub framework_version: String,
   pub runtime_version:   String,
   pub capabilities:      Vec<String>,
   pub old_package:       String,
   pub new_package:       String,
   pub target_dir:        PathBuf,
}

/// Source backend tag for a manifest (component 1: Snapshot Store).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SourceType {
   #[serde(rename = "git")]
   Vcs,
   #[serde(rename = "zip")]
   ZipArchives,
}

impl Default for SourceType {
   fn default() -> Self {
      Self::ZipArchives
   }
}

/// One entry in a manifest's `files` list.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
   pub commit: String,
   #[serde(rename = "sourcePath")]
   pub source_path: String,
   #[serde(rename = "destinationPath")]
   pub destination_path: String,
   #[serde(rename = "targetDirectory")]
   pub target_directory: Option<String>,
}

/// A single parsed `commit-<N>.yaml` manifest file, plus its resolved
/// sequence number (filename-derived, possibly overridden by the YAML
/// field) and originating file path for error reporting.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
   #[serde(rename = "sourceRepository")]
   pub source_repository: String,
   #[serde(rename = "sourceType", default)]
   pub source_type: SourceType,
   #[serde(rename = "sequenceNumber")]
   pub sequence_number: Option<u64>,
   pub files: Vec<ManifestEntry>,

   /// Resolved at parse time: `sequence_number` if present, else the number
   /// embedded in the filename. Not part of the YAML schema.
   #[serde(skip)]
   pub effective_sequence: u64,
   #[serde(skip)]
   pub origin_path: PathBuf,
}

/// Map from destination path to its harvested bytes, preserving manifest
/// insertion order (component 3: Harvester). An `IndexMap` is load-bearing
/// here: the write order of artifacts must be insertion order, not
/// lexicographic.
pub type ArtifactMap = IndexMap<String, Vec<u8>>;

/// One named pass/fail check in a `ValidationResult`.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationCheck {
   pub name:   String,
   pub passed: bool,
   pub detail: Option<String>,
}

/// One error collected during validation, with as much structured context
/// as is available at the point of failure.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationError {
   pub message:    String,
   pub file:       Option<String>,
   pub line:       Option<usize>,
   pub commit:     Option<String>,
   pub suggestion: Option<String>,
}

/// Aggregate result of a dry-run validation pass (component 8: Validator).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationResult {
   pub checks: Vec<ValidationCheck>,
   pub errors: Vec<ValidationError>,
}

impl ValidationResult {
   pub fn pass(&mut self, name: impl Into<String>, detail: Option<String>) {
      self.checks.push(ValidationCheck { name: name.into(), passed: true, detail });
   }

   pub fn fail(&mut self, name: impl Into<String>, detail: Option<String>, error: ValidationError) {
      self.checks.push(ValidationCheck { name: name.into(), passed: false, detail });
      self.errors.push(error);
   }

   pub fn is_ok(&self) -> bool {
      self.errors.is_empty()
   }
}

// === CLI surface (component 11, ambient) ===

#[derive(Parser, Debug)]
#[command(author, version, about = "Materialize a new project by replaying historical snapshots onto a generated skeleton", long_about = None)]
pub struct Args {
   /// Path to a manifest file, or a directory containing one or more
   /// `commit-<N>.yaml` manifests
   pub manifest: Option<PathBuf>,

   /// Output directory for the materialized project
   #[arg(long, short = 'o')]
   pub output: Option<PathBuf>,

   /// Maven/Gradle group id
   #[arg(long)]
   pub group_id: Option<String>,

   /// Artifact id
   #[arg(long)]
   pub artifact_id: Option<String>,

   /// Human-readable project name
   #[arg(long)]
   pub project_name: Option<String>,

   /// Project version
   #[arg(long)]
   pub version: Option<String>,

   /// Baseline framework version (e.g. Spring Boot version)
   #[arg(long)]
   pub framework_version: Option<String>,

   /// Target language runtime version (e.g. Java version)
   #[arg(long)]
   pub runtime_version: Option<String>,

   /// Framework capability tags (repeatable)
   #[arg(long)]
   pub capability: Vec<String>,

   /// Package to rewrite from. Inferred from the manifest set if omitted.
   #[arg(long)]
   pub old_package: Option<String>,

   /// Package to rewrite to
   #[arg(long)]
   pub new_package: Option<String>,

   /// Skip the confirmation prompt
   #[arg(long, short = 'y')]
   pub yes: bool,

   /// Run only the validator; make no filesystem changes
   #[arg(long)]
   pub dry_run: bool,

   /// Disable colored output
   #[arg(long)]
   pub no_color: bool,

   /// Print additional internal trace information on failure
   #[arg(long, short = 'v')]
   pub verbose: bool,

   /// Path to an engine config file
   #[arg(long)]
   pub config: Option<PathBuf>,

   #[command(subcommand)]
   pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
   /// Initialize an empty version-control repository at a given directory
   Init {
      /// Directory to initialize
      dir: PathBuf,
   },
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn validation_result_tracks_pass_and_fail() {
      let mut result = ValidationResult::default();
      result.pass("manifest structure", None);
      assert!(result.is_ok());

      result.fail(
         "commit exists",
         Some("abc1234".to_string()),
         ValidationError {
            message:    "commit not found".to_string(),
            file:       None,
            line:       None,
            commit:     Some("abc1234".to_string()),
            suggestion: None,
         },
      );
      assert!(!result.is_ok());
      assert_eq!(result.checks.len(), 2);
      assert_eq!(result.errors.len(), 1);
   }

   #[test]
   fn source_type_defaults_to_zip_archives() {
      #[derive(Deserialize)]
      struct Wrapper {
         #[serde(default)]
         source_type: SourceType,
      }
      let w: Wrapper = serde_yaml::from_str("source_type: zip").unwrap();
      assert_eq!(w.source_type, SourceType::ZipArchives);
   }

   #[test]
   fn source_type_accepts_git_literal() {
      #[derive(Deserialize)]
      struct Wrapper {
         source_type: SourceType,
      }
      let w: Wrapper = serde_yaml::from_str("source_type: git").unwrap();
      assert_eq!(w.source_type, SourceType::Vcs);
   }
}
