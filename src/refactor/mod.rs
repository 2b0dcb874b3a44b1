//! Refactor Engine (component 4): for each harvested artifact, rewrites
//! package identifiers in Java ASTs and, for other text-like resources, via
//! bounded textual substitution; simultaneously transforms destination
//! paths.

mod java;
mod path;
mod text;

pub use path::transform as transform_path;

use crate::{
   error::Result,
   types::ArtifactMap,
};

const TEXT_EXTENSIONS: &[&str] =
   &["properties", "yml", "yaml", "xml", "json", "md", "txt", "gradle", "sql", "gitignore"];

/// Result of refactoring one artifact, used by the orchestrator for
/// progress reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
   Java,
   Text,
   Passthrough,
}

pub fn dispatch_for(path: &str) -> Dispatch {
   match path.rsplit_once('.') {
      Some((_, "java")) => Dispatch::Java,
      Some((_, ext)) if TEXT_EXTENSIONS.contains(&ext) => Dispatch::Text,
      _ => Dispatch::Passthrough,
   }
}

/// Rewrite a single artifact's content according to its destination-path
/// extension.
fn rewrite_content(destination: &str, bytes: &[u8], content_old_pkg: &str, new_pkg: &str) -> Result<Vec<u8>> {
   match dispatch_for(destination) {
      Dispatch::Java => java::rewrite(bytes, content_old_pkg, new_pkg, destination),
      Dispatch::Text => {
         let text = String::from_utf8_lossy(bytes);
         Ok(text::rewrite_resource(&text, content_old_pkg, new_pkg).into_bytes())
      },
      Dispatch::Passthrough => Ok(bytes.to_vec()),
   }
}

/// Parse-only variant of [`rewrite_content`] for the Validator: runs the
/// same rewrite and discards the result, surfacing only a parse failure.
pub fn rewrite_content_for_validation(
   destination: &str,
   bytes: &[u8],
   content_old_pkg: &str,
   new_pkg: &str,
   _path_old_pkg: &str,
) -> Result<()> {
   rewrite_content(destination, bytes, content_old_pkg, new_pkg).map(|_| ())
}

/// The engine's top-level operation: transforms every key via path
/// transformation using `(path_old_pkg, new_pkg)`, rewrites every value's
/// content using `(content_old_pkg, new_pkg)`, and returns the map keyed by
/// the new paths.
///
/// Two old-package arguments because the source files' embedded package
/// declarations match the *source* path structure, while the manifest's
/// destination paths may already use a transitional naming; decoupling the
/// two prevents double-rewriting and silent misalignment.
pub fn refactor_all(
   files: ArtifactMap,
   content_old_pkg: &str,
   new_pkg: &str,
   path_old_pkg: &str,
) -> Result<ArtifactMap> {
   let mut out = ArtifactMap::with_capacity(files.len());
   for (destination, bytes) in files {
      let new_path = path::transform(&destination, path_old_pkg, new_pkg);
      let new_bytes = rewrite_content(&destination, &bytes, content_old_pkg, new_pkg)?;
      out.insert(new_path, new_bytes);
   }
   Ok(out)
}
