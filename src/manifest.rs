//! Manifest discovery, parsing and base-package inference (component 2).

use std::path::{Path, PathBuf};

use crate::{
   error::{BootstrapError, Result},
   types::Manifest,
};

/// Discover every `commit-<N>.y(a)ml` sibling of `anchor` and parse them in
/// ascending sequence order. If `anchor` is a file that does not match the
/// naming pattern, it is parsed alone.
pub fn discover(anchor: &Path) -> Result<Vec<Manifest>> {
   let (dir, single) = if anchor.is_dir() {
      (anchor.to_path_buf(), None)
   } else {
      (
         anchor.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf),
         Some(anchor.to_path_buf()),
      )
   };

   let mut candidates: Vec<(u64, PathBuf)> = Vec::new();
   for entry in std::fs::read_dir(&dir)? {
      let entry = entry?;
      let path = entry.path();
      if let Some(n) = filename_sequence(&path) {
         candidates.push((n, path));
      }
   }

   let mut manifests = if candidates.is_empty() {
      let path = single.ok_or_else(|| {
         BootstrapError::Manifest {
            file:   dir.display().to_string(),
            reason: "no commit-<N>.yaml manifests found".to_string(),
            line:   None,
         }
      })?;
      vec![(filename_sequence(&path).unwrap_or(1), path)]
   } else {
      candidates
   };

   manifests.sort_by_key(|(n, _)| *n);

   manifests.into_iter().map(|(n, path)| parse_one(&path, n)).collect()
}

/// Extract `N` from a filename matching `commit-<N>.yaml` or `commit-<N>.yml`.
fn filename_sequence(path: &Path) -> Option<u64> {
   let name = path.file_name()?.to_str()?;
   let stem = name.strip_prefix("commit-")?;
   let stem = stem.strip_suffix(".yaml").or_else(|| stem.strip_suffix(".yml"))?;
   stem.parse().ok()
}

fn parse_one(path: &Path, filename_seq: u64) -> Result<Manifest> {
   let contents = std::fs::read_to_string(path).map_err(|e| BootstrapError::Manifest {
      file:   path.display().to_string(),
      reason: e.to_string(),
      line:   None,
   })?;

   let mut manifest: Manifest =
      serde_yaml::from_str(&contents).map_err(|e| BootstrapError::Manifest {
         file:   path.display().to_string(),
         reason: e.to_string(),
         line:   e.location().map(|l| l.line()),
      })?;

   if manifest.files.is_empty() {
      return Err(BootstrapError::Configuration(format!(
         "manifest {} has zero entries",
         path.display()
      )));
   }

   validate_entries(path, &manifest)?;

   manifest.effective_sequence = manifest.sequence_number.unwrap_or(filename_seq);
   manifest.origin_path = path.to_path_buf();
   Ok(manifest)
}

fn validate_entries(path: &Path, manifest: &Manifest) -> Result<()> {
   let mut seen = std::collections::HashSet::new();
   for entry in &manifest.files {
      if !seen.insert(entry.destination_path.clone()) {
         return Err(BootstrapError::Manifest {
            file:   path.display().to_string(),
            reason: format!("duplicate destination path: {}", entry.destination_path),
            line:   None,
         });
      }
      if is_traversal_unsafe(&entry.source_path) || is_traversal_unsafe(&entry.destination_path) {
         return Err(BootstrapError::Manifest {
            file:   path.display().to_string(),
            reason: format!(
               "path traversal in entry (source={}, destination={})",
               entry.source_path, entry.destination_path
            ),
            line:   None,
         });
      }
      let len = entry.commit.len();
      if !(7..=40).contains(&len) || !entry.commit.chars().all(|c| c.is_ascii_hexdigit()) {
         return Err(BootstrapError::Manifest {
            file:   path.display().to_string(),
            reason: format!("invalid commit identifier: {}", entry.commit),
            line:   None,
         });
      }
   }
   Ok(())
}

fn is_traversal_unsafe(path: &str) -> bool {
   Path::new(path).is_absolute() || path.split('/').any(|part| part == "..")
}

/// Which package-inference target is being computed: the structure
/// embedded in source paths (used for content rewriting) or the structure
/// of destination paths (used for path rewriting). These may differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageAxis {
   Source,
   Destination,
}

/// Infer the dominant Java package from the manifest's `.java` entries by
/// finding the longest common dot-separated prefix of each file's enclosing
/// package. Returns `None` if no `.java` entries under a recognized
/// `src/(main|test)/java/` root are present, or if the common prefix is
/// empty.
pub fn infer_base_package(manifest: &Manifest, axis: PackageAxis) -> Option<String> {
   let mut packages = Vec::new();

   for entry in &manifest.files {
      let path = match axis {
         PackageAxis::Source => &entry.source_path,
         PackageAxis::Destination => &entry.destination_path,
      };
      if let Some(pkg) = package_of(path) {
         packages.push(pkg);
      }
   }

   longest_common_prefix(&packages)
}

fn package_of(path: &str) -> Option<String> {
   if !path.ends_with(".java") {
      return None;
   }
   for root in ["src/main/java/", "src/test/java/"] {
      if let Some(rest) = path.strip_prefix(root) {
         let dir = rest.rsplit_once('/').map_or("", |(dir, _)| dir);
         if dir.is_empty() {
            return None;
         }
         return Some(dir.replace('/', "."));
      }
   }
   None
}

fn longest_common_prefix(packages: &[String]) -> Option<String> {
   let first = packages.first()?;
   let mut segments: Vec<&str> = first.split('.').collect();

   for pkg in &packages[1..] {
      let other: Vec<&str> = pkg.split('.').collect();
      let common = segments.iter().zip(other.iter()).take_while(|(a, b)| a == b).count();
      segments.truncate(common);
      if segments.is_empty() {
         return None;
      }
   }

   if segments.is_empty() { None } else { Some(segments.join(".")) }
}

#[cfg(test)]
mod tests {
   use super::*;

   fn entry(source: &str, dest: &str) -> crate::types::ManifestEntry {
      crate::types::ManifestEntry {
         commit:            "abc1234".to_string(),
         source_path:       source.to_string(),
         destination_path:  dest.to_string(),
         target_directory:  None,
      }
   }

   fn manifest(files: Vec<crate::types::ManifestEntry>) -> Manifest {
      Manifest {
         source_repository: "repo".to_string(),
         source_type: crate::types::SourceType::ZipArchives,
         sequence_number: None,
         files,
         effective_sequence: 0,
         origin_path: PathBuf::new(),
      }
   }

   #[test]
   fn filename_sequence_parses_n() {
      assert_eq!(filename_sequence(Path::new("commit-7.yaml")), Some(7));
      assert_eq!(filename_sequence(Path::new("commit-3.yml")), Some(3));
      assert_eq!(filename_sequence(Path::new("readme.md")), None);
   }

   #[test]
   fn infer_base_package_finds_common_prefix() {
      let m = manifest(vec![
         entry("src/main/java/com/old/app/Svc.java", "src/main/java/com/old/app/Svc.java"),
         entry("src/main/java/com/old/app/util/Helper.java", "src/main/java/com/old/app/util/Helper.java"),
      ]);
      assert_eq!(infer_base_package(&m, PackageAxis::Source), Some("com.old.app".to_string()));
   }

   #[test]
   fn infer_base_package_none_without_java_entries() {
      let m = manifest(vec![entry("README.md", "README.md")]);
      assert_eq!(infer_base_package(&m, PackageAxis::Source), None);
   }

   #[test]
   fn duplicate_destination_rejected() {
      let mut m = manifest(vec![entry("a.txt", "b.txt"), entry("c.txt", "b.txt")]);
      m.effective_sequence = 1;
      let path = PathBuf::from("commit-1.yaml");
      let err = validate_entries(&path, &m).unwrap_err();
      assert!(matches!(err, BootstrapError::Manifest { .. }));
   }

   #[test]
   fn traversal_in_destination_rejected() {
      let m = manifest(vec![entry("a.txt", "../b.txt")]);
      let path = PathBuf::from("commit-1.yaml");
      assert!(validate_entries(&path, &m).is_err());
   }

   #[test]
   fn short_commit_id_rejected() {
      let mut m = manifest(vec![entry("a.txt", "b.txt")]);
      m.files[0].commit = "abc123".to_string(); // 6 chars
      let path = PathBuf::from("commit-1.yaml");
      assert!(validate_entries(&path, &m).is_err());
   }
}
