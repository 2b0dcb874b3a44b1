//! Java AST rewrite: package declaration, imports and fully-qualified name
//! occurrences are rewritten in place using a tolerant incremental parser.
//! Rewrites are spliced into the original byte spans reported by the
//! concrete syntax tree rather than rebuilt through a pretty-printer, so
//! output stays byte-identical outside the rewritten spans.

use tree_sitter::{Node, Parser, Tree};

use crate::error::{BootstrapError, Result};

/// Rewrite every package declaration, import and fully-qualified name in
/// `source` beginning with `old_pkg` (or equal to it) to the corresponding
/// name under `new_pkg`.
pub fn rewrite(source: &[u8], old_pkg: &str, new_pkg: &str, file: &str) -> Result<Vec<u8>> {
   let mut parser = Parser::new();
   parser
      .set_language(&tree_sitter_java::LANGUAGE.into())
      .expect("tree-sitter-java grammar is statically linked and always valid");

   let tree: Tree = parser.parse(source, None).ok_or_else(|| BootstrapError::RefactorParse {
      file:   file.to_string(),
      reason: "tree-sitter produced no tree".to_string(),
      line:   None,
   })?;

   if let Some(line) = first_error_line(tree.root_node()) {
      return Err(BootstrapError::RefactorParse {
         file: file.to_string(),
         reason: "syntax error".to_string(),
         line: Some(line),
      });
   }

   if old_pkg == new_pkg {
      return Ok(source.to_vec());
   }

   let mut replacements = Vec::new();
   collect_replacements(tree.root_node(), source, old_pkg, new_pkg, &mut replacements);
   // Apply back-to-front so earlier byte offsets stay valid.
   replacements.sort_by(|a, b| b.0.cmp(&a.0));

   let mut out = source.to_vec();
   for (start, end, replacement) in replacements {
      out.splice(start..end, replacement.into_bytes());
   }
   Ok(out)
}

fn first_error_line(node: Node) -> Option<usize> {
   if node.is_error() || node.is_missing() {
      return Some(node.start_position().row + 1);
   }
   let mut cursor = node.walk();
   for child in node.children(&mut cursor) {
      if let Some(line) = first_error_line(child) {
         return Some(line);
      }
   }
   None
}

/// Walk the tree collecting `(start_byte, end_byte, replacement)` for every
/// `scoped_identifier` or `scoped_type_identifier` node whose text is
/// `old_pkg` or begins with `old_pkg + "."`. `scoped_identifier` covers
/// package declarations, import targets and qualified-expression usages;
/// `scoped_type_identifier` covers qualified *type* references (field and
/// parameter types, `extends`/`implements`, generics, casts, `instanceof`) —
/// a distinct node kind in the grammar, and unlike `scoped_identifier` it
/// nests recursively down to a bare `identifier` rather than bottoming out
/// at a `scoped_identifier`, so without this second kind a field typed
/// `com.old.app.Other` would never match at all. Matched nodes are not
/// descended into, so a qualified name is replaced once as a whole; the
/// trailing, unmatched portion of the node's text (the final type name for
/// `scoped_type_identifier`, e.g. the `.Other` in `com.old.app.Other`) is
/// preserved verbatim by only ever replacing the `old_pkg`-length prefix.
fn collect_replacements(
   node: Node,
   source: &[u8],
   old_pkg: &str,
   new_pkg: &str,
   out: &mut Vec<(usize, usize, String)>,
) {
   if matches!(node.kind(), "scoped_identifier" | "scoped_type_identifier") {
      if let Ok(text) = node.utf8_text(source) {
         if text == old_pkg || text.starts_with(&format!("{old_pkg}.")) {
            let replacement = format!("{new_pkg}{}", &text[old_pkg.len()..]);
            out.push((node.start_byte(), node.end_byte(), replacement));
            return;
         }
      }
   }

   let mut cursor = node.walk();
   for child in node.children(&mut cursor) {
      collect_replacements(child, source, old_pkg, new_pkg, out);
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn rewrites_package_declaration() {
      let source = b"package com.old.app;\n\npublic class Svc {}\n";
      let result = rewrite(source, "com.old.app", "com.new.api", "Svc.java").unwrap();
      let text = String::from_utf8(result).unwrap();
      assert!(text.starts_with("package com.new.api;"));
   }

   #[test]
   fn rewrites_import_and_qualified_usage() {
      let source = b"package com.old.app;\n\nimport com.old.app.util.Helper;\n\npublic class Svc {\n   com.old.app.Other x;\n}\n";
      let result = rewrite(source, "com.old.app", "com.new.api", "Svc.java").unwrap();
      let text = String::from_utf8(result).unwrap();
      assert!(text.contains("import com.new.api.util.Helper;"));
      assert!(text.contains("com.new.api.Other"));
      assert!(!text.contains("com.old.app"));
   }

   #[test]
   fn rewrites_qualified_type_in_extends_and_generic_argument() {
      let source =
         b"package com.old.app;\n\npublic class Svc extends com.old.app.Base<com.old.app.Helper> {}\n";
      let result = rewrite(source, "com.old.app", "com.new.api", "Svc.java").unwrap();
      let text = String::from_utf8(result).unwrap();
      assert!(text.contains("extends com.new.api.Base<com.new.api.Helper>"));
      assert!(!text.contains("com.old.app"));
   }

   #[test]
   fn rewrites_qualified_type_in_cast_and_instanceof() {
      let source = b"package com.old.app;\n\npublic class Svc {\n   void m(Object o) {\n      if (o instanceof com.old.app.Other) {\n         com.old.app.Other x = (com.old.app.Other) o;\n      }\n   }\n}\n";
      let result = rewrite(source, "com.old.app", "com.new.api", "Svc.java").unwrap();
      let text = String::from_utf8(result).unwrap();
      assert!(!text.contains("com.old.app"));
      assert_eq!(text.matches("com.new.api.Other").count(), 3);
   }

   #[test]
   fn leaves_unrelated_package_alone() {
      let source = b"package com.oldish.app;\n\npublic class Svc {}\n";
      let result = rewrite(source, "com.old", "com.new", "Svc.java").unwrap();
      let text = String::from_utf8(result).unwrap();
      assert!(text.contains("package com.oldish.app;"));
   }

   #[test]
   fn no_op_refactor_preserves_content_when_old_equals_new() {
      let source = b"package com.same.thing;\n\npublic class Svc {}\n";
      let result = rewrite(source, "com.same.thing", "com.same.thing", "Svc.java").unwrap();
      assert_eq!(result, source);
   }

   #[test]
   fn syntax_error_surfaces_refactor_parse_error() {
      let source = b"package com.old.app\n\npublic class {{{ broken";
      let err = rewrite(source, "com.old.app", "com.new.api", "Broken.java").unwrap_err();
      assert!(matches!(err, BootstrapError::RefactorParse { .. }));
   }
}
