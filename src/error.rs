use thiserror::Error;

/// Flat error taxonomy for the bootstrap engine. Each variant maps to exactly
/// one exit code via [`BootstrapError::exit_code`]; the orchestrator is the
/// only place that inspects this mapping.
#[derive(Debug, Error)]
pub enum BootstrapError {
   #[error("configuration error: {0}")]
   Configuration(String),

   #[error("manifest error in {file}: {reason}")]
   Manifest {
      file:   String,
      reason: String,
      line:   Option<usize>,
   },

   #[error("commit {commit} not found in {source}")]
   CommitNotFound { commit: String, source: String },

   #[error("{path} not found at commit {commit}")]
   FileNotFound { commit: String, path: String },

   #[error("snapshot source unreadable: {0}")]
   SnapshotSource(String),

   #[error("failed to parse {file}: {reason}")]
   RefactorParse {
      file:   String,
      reason: String,
      line:   Option<usize>,
   },

   #[error("skeleton service returned HTTP {status}: {body}")]
   SkeletonService { status: u16, body: String },

   #[error("skeleton archive malformed: {0}")]
   SkeletonArchive(String),

   #[error("network error: {0}")]
   Network(#[from] reqwest::Error),

   #[error("refused to write outside target directory: {0}")]
   SecurityViolation(String),

   #[error("failed to write {path}: {reason}")]
   Write { path: String, reason: String },

   #[error("git command failed: {0}")]
   CommitSequencer(String),

   #[error("validation failed: {0} check(s) did not pass")]
   Validation(usize),

   #[error("I/O error: {0}")]
   Io(#[from] std::io::Error),

   #[error("YAML error: {0}")]
   Yaml(#[from] serde_yaml::Error),

   #[error("TOML error: {0}")]
   Toml(#[from] toml::de::Error),

   #[error("ZIP archive error: {0}")]
   Zip(#[from] zip::result::ZipError),

   #[error("{0}")]
   Unknown(String),
}

impl BootstrapError {
   /// Maps this error to the process exit code table (external interfaces,
   /// exit codes).
   pub const fn exit_code(&self) -> i32 {
      match self {
         Self::Configuration(_) => 1,
         Self::Manifest { .. } => 1,
         Self::Validation(_) => 2,
         Self::CommitNotFound { .. } | Self::FileNotFound { .. } | Self::SnapshotSource(_) => 3,
         Self::RefactorParse { .. } => 4,
         Self::SkeletonService { .. } | Self::SkeletonArchive(_) => 5,
         Self::Network(_) => 6,
         Self::SecurityViolation(_) | Self::Write { .. } => 3,
         Self::CommitSequencer(_) => 3,
         Self::Io(_) | Self::Yaml(_) | Self::Toml(_) | Self::Zip(_) | Self::Unknown(_) => 99,
      }
   }

   /// Short category name used in progress/error reporting.
   pub const fn category(&self) -> &'static str {
      match self {
         Self::Configuration(_) => "configuration",
         Self::Manifest { .. } => "manifest",
         Self::CommitNotFound { .. } | Self::FileNotFound { .. } | Self::SnapshotSource(_) => {
            "snapshot"
         },
         Self::RefactorParse { .. } => "refactor",
         Self::SkeletonService { .. } | Self::SkeletonArchive(_) => "skeleton-service",
         Self::Network(_) => "network",
         Self::SecurityViolation(_) | Self::Write { .. } => "write",
         Self::CommitSequencer(_) => "commit-sequencer",
         Self::Validation(_) => "validation",
         Self::Io(_) | Self::Yaml(_) | Self::Toml(_) | Self::Zip(_) | Self::Unknown(_) => "unknown",
      }
   }

   /// Whether a rollback should be attempted if this error occurs mid-run.
   /// Validation and configuration errors occur before any mutation.
   pub const fn requires_rollback(&self) -> bool {
      !matches!(self, Self::Configuration(_) | Self::Manifest { .. } | Self::Validation(_))
   }
}

pub type Result<T> = std::result::Result<T, BootstrapError>;

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn exit_codes_match_taxonomy() {
      assert_eq!(BootstrapError::Configuration("x".into()).exit_code(), 1);
      assert_eq!(BootstrapError::Validation(3).exit_code(), 2);
      assert_eq!(
         BootstrapError::CommitNotFound { commit: "abc".into(), source: "repo".into() }.exit_code(),
         3
      );
      assert_eq!(
         BootstrapError::RefactorParse { file: "f".into(), reason: "r".into(), line: None }
            .exit_code(),
         4
      );
      assert_eq!(
         BootstrapError::SkeletonService { status: 500, body: String::new() }.exit_code(),
         5
      );
      assert_eq!(BootstrapError::Unknown("x".into()).exit_code(), 99);
   }

   #[test]
   fn rollback_required_skips_prerun_errors() {
      assert!(!BootstrapError::Configuration("x".into()).requires_rollback());
      assert!(!BootstrapError::Validation(1).requires_rollback());
      assert!(BootstrapError::CommitSequencer("x".into()).requires_rollback());
   }
}
