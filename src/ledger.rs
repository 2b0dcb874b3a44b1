//! Commit message ledger: a text document mapping sequence numbers to
//! commit-message bodies, co-located with a manifest set's source.

use std::collections::HashMap;

use regex::Regex;
use std::sync::LazyLock;

static HEADER: LazyLock<Regex> =
   LazyLock::new(|| Regex::new(r"^(\d+)\.\s+([a-f0-9]{7,40})\s*$").expect("valid regex"));

/// Parse a ledger document into sequence number -> message body. Entries
/// that fail to parse are skipped (non-fatal per the spec: that replay
/// commit is later skipped with a warning, not a hard failure here).
pub fn parse(contents: &str) -> HashMap<u64, String> {
   let mut ledger = HashMap::new();

   for block in contents.split("\n---\n") {
      let block = block.trim_matches('\n');
      let mut lines = block.lines();
      let Some(header) = lines.find(|l| !l.trim().is_empty()) else {
         continue;
      };
      let Some(captures) = HEADER.captures(header.trim_end()) else {
         continue;
      };
      let Ok(seq) = captures[1].parse::<u64>() else {
         continue;
      };

      let body: String = lines.collect::<Vec<_>>().join("\n");
      let body = body.trim().to_string();
      if body.is_empty() {
         continue;
      }
      ledger.insert(seq, body);
   }

   ledger
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn parses_single_entry() {
      let ledger = parse("1. abc1234\n\nfeat: add svc\n");
      assert_eq!(ledger.get(&1), Some(&"feat: add svc".to_string()));
   }

   #[test]
   fn parses_multiple_entries_separated_by_dashes() {
      let text = "1. abc1234\n\nfeat: add svc\n---\n3. def5678\n\nfix: patch bug\n";
      let ledger = parse(text);
      assert_eq!(ledger.get(&1), Some(&"feat: add svc".to_string()));
      assert_eq!(ledger.get(&3), Some(&"fix: patch bug".to_string()));
      assert_eq!(ledger.get(&2), None);
   }

   #[test]
   fn multiline_body_preserved() {
      let text = "1. abc1234\n\nfeat: add svc\n\nlonger description here\n";
      let ledger = parse(text);
      assert_eq!(ledger.get(&1).unwrap(), "feat: add svc\n\nlonger description here");
   }

   #[test]
   fn malformed_header_skipped() {
      let text = "not a header\n\nsome text\n";
      assert!(parse(text).is_empty());
   }

   #[test]
   fn empty_ledger_produces_empty_map() {
      assert!(parse("").is_empty());
   }
}
