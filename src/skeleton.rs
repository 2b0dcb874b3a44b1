//! Skeleton fetch + extraction. The project-skeleton generator itself is an
//! out-of-scope external collaborator (an HTTP service returning a ZIP
//! archive); the core consumes only a `fetch_skeleton` operation and
//! extracts the result into the target directory.

use std::{
   io::Read,
   path::{Path, PathBuf},
};

use crate::{
   config::EngineConfig,
   error::{BootstrapError, Result},
   types::ProjectConfig,
};

/// Fetches a skeleton archive for the given project configuration. The
/// default implementation calls the external HTTP service; tests supply a
/// fake implementation instead.
pub trait SkeletonFetcher {
   fn fetch(&self, config: &ProjectConfig) -> Result<Vec<u8>>;
}

/// Default fetcher: calls the external skeleton-generator service over
/// HTTP and returns the response body as a ZIP archive's bytes.
pub struct HttpSkeletonFetcher<'a> {
   pub engine_config: &'a EngineConfig,
}

impl SkeletonFetcher for HttpSkeletonFetcher<'_> {
   fn fetch(&self, config: &ProjectConfig) -> Result<Vec<u8>> {
      let client = reqwest::blocking::Client::builder()
         .timeout(std::time::Duration::from_secs(self.engine_config.request_timeout_secs))
         .connect_timeout(std::time::Duration::from_secs(self.engine_config.connect_timeout_secs))
         .build()?;

      let response = client
         .get(format!("{}/starter.zip", self.engine_config.skeleton_base_url))
         .query(&[
            ("groupId", config.group_id.as_str()),
            ("artifactId", config.artifact_id.as_str()),
            ("name", config.project_name.as_str()),
            ("version", config.version.as_str()),
            ("bootVersion", config.framework_version.as_str()),
            ("javaVersion", config.runtime_version.as_str()),
            ("dependencies", &config.capabilities.join(",")),
         ])
         .send()?;

      let status = response.status();
      if !status.is_success() {
         let body = response.text().unwrap_or_default();
         return Err(BootstrapError::SkeletonService { status: status.as_u16(), body });
      }

      let bytes = response.bytes()?;
      Ok(bytes.to_vec())
   }
}

/// Extract `archive_bytes` (a ZIP archive, streamed entry-by-entry rather
/// than materialized in memory as a whole) into `target_dir`. Returns the
/// set of created directories in extraction order, for journaling.
pub fn extract(archive_bytes: &[u8], target_dir: &Path) -> Result<Vec<PathBuf>> {
   std::fs::create_dir_all(target_dir)?;
   let cursor = std::io::Cursor::new(archive_bytes);
   let mut archive = zip::ZipArchive::new(cursor)?;

   let mut created_dirs = Vec::new();

   for i in 0..archive.len() {
      let mut entry = archive.by_index(i)?;
      let Some(enclosed) = entry.enclosed_name() else {
         return Err(BootstrapError::SkeletonArchive(format!(
            "unsafe entry path in skeleton archive: {}",
            entry.name()
         )));
      };
      let out_path = target_dir.join(&enclosed);

      if entry.is_dir() {
         if !out_path.exists() {
            std::fs::create_dir_all(&out_path)?;
            created_dirs.push(out_path);
         }
         continue;
      }

      if let Some(parent) = out_path.parent() {
         if !parent.exists() {
            std::fs::create_dir_all(parent)?;
            created_dirs.push(parent.to_path_buf());
         }
      }

      let mut buf = Vec::with_capacity(entry.size() as usize);
      entry.read_to_end(&mut buf)?;
      std::fs::write(&out_path, buf)?;
   }

   Ok(created_dirs)
}

#[cfg(test)]
mod tests {
   use std::io::Write;

   use super::*;

   fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
      let mut buf = Vec::new();
      {
         let cursor = std::io::Cursor::new(&mut buf);
         let mut writer = zip::ZipWriter::new(cursor);
         let options = zip::write::FileOptions::<()>::default()
            .compression_method(zip::CompressionMethod::Deflated);
         for (name, data) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
         }
         writer.finish().unwrap();
      }
      buf
   }

   #[test]
   fn extracts_flat_archive() {
      let zip = build_zip(&[("pom.xml", b"<project/>"), ("src/Main.java", b"class Main {}")]);
      let dir = tempfile::tempdir().unwrap();
      extract(&zip, dir.path()).unwrap();

      assert_eq!(std::fs::read(dir.path().join("pom.xml")).unwrap(), b"<project/>");
      assert_eq!(std::fs::read(dir.path().join("src/Main.java")).unwrap(), b"class Main {}");
   }

   struct FakeFetcher {
      bytes: Vec<u8>,
   }

   impl SkeletonFetcher for FakeFetcher {
      fn fetch(&self, _config: &ProjectConfig) -> Result<Vec<u8>> {
         Ok(self.bytes.clone())
      }
   }

   #[test]
   fn fake_fetcher_roundtrips_into_extract() {
      let zip = build_zip(&[("README.md", b"hello")]);
      let fetcher = FakeFetcher { bytes: zip };
      let config = ProjectConfig {
         group_id:          "com.example".to_string(),
         artifact_id:       "demo".to_string(),
         project_name:      "demo".to_string(),
         version:           "0.1.0".to_string(),
         framework_version: "3.3.0".to_string(),
         runtime_version:   "21".to_string(),
         capabilities:      vec![],
         old_package:       "com.example".to_string(),
         new_package:       "com.example".to_string(),
         target_dir:        PathBuf::new(),
      };
      let dir = tempfile::tempdir().unwrap();
      let bytes = fetcher.fetch(&config).unwrap();
      extract(&bytes, dir.path()).unwrap();
      assert_eq!(std::fs::read(dir.path().join("README.md")).unwrap(), b"hello");
   }
}
