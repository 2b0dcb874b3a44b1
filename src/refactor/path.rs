//! Destination path transformation: rewrites a file's location from one
//! package's on-disk layout to another.

const JAVA_ROOTS: [&str; 2] = ["src/main/java/", "src/test/java/"];

/// Transform `path` by rewriting the portion beneath a recognized Java
/// source root (or, failing that, a bare prefix match) from `old_pkg`'s
/// on-disk layout to `new_pkg`'s. Returns `path` unchanged if neither old
/// package location is present.
pub fn transform(path: &str, old_pkg: &str, new_pkg: &str) -> String {
   if old_pkg.is_empty() {
      return path.to_string();
   }
   let old_pkg_path = old_pkg.replace('.', "/");
   let new_pkg_path = new_pkg.replace('.', "/");

   for root in JAVA_ROOTS {
      let prefix = format!("{root}{old_pkg_path}");
      if let Some(rest) = path.strip_prefix(&prefix) {
         if rest.is_empty() || rest.starts_with('/') {
            return format!("{root}{new_pkg_path}{rest}");
         }
      }
   }

   if let Some(rest) = path.strip_prefix(&format!("{old_pkg_path}/")) {
      return format!("{new_pkg_path}/{rest}");
   }
   if path == old_pkg_path {
      return new_pkg_path;
   }

   path.to_string()
}
