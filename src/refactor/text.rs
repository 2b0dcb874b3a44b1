//! Bounded textual substitution for non-Java, text-like resources
//! (properties, YAML, XML, JSON, Markdown, ...).

/// Replace every occurrence of `old` in `text` with `new`, but only when
/// the character immediately following the match is one of: end-of-input,
/// a period, or a non-word character other than period. This is what
/// prevents rewriting `com.oldcompany` when `old` is `com.old`.
///
/// Applied twice by the caller: once for the dot-separated package name,
/// once for its `/`-separated classpath form.
pub fn bounded_replace(text: &str, old: &str, new: &str) -> String {
   if old.is_empty() {
      return text.to_string();
   }

   let bytes = text.as_bytes();
   let old_bytes = old.as_bytes();
   let mut out = String::with_capacity(text.len());
   let mut i = 0;

   while i < bytes.len() {
      if bytes[i..].starts_with(old_bytes) {
         let after = i + old_bytes.len();
         let boundary_ok = match bytes.get(after) {
            None => true,
            Some(&b'.') => true,
            Some(&c) => !is_word_byte(c),
         };
         if boundary_ok {
            out.push_str(new);
            i = after;
            continue;
         }
      }
      // Advance by one char (not byte) to stay on UTF-8 boundaries.
      let ch_len = utf8_char_len(bytes[i]);
      out.push_str(&text[i..i + ch_len]);
      i += ch_len;
   }

   out
}

fn is_word_byte(b: u8) -> bool {
   b.is_ascii_alphanumeric() || b == b'_'
}

fn utf8_char_len(first_byte: u8) -> usize {
   if first_byte & 0x80 == 0 {
      1
   } else if first_byte & 0xE0 == 0xC0 {
      2
   } else if first_byte & 0xF0 == 0xE0 {
      3
   } else {
      4
   }
}

/// Apply bounded substitution for both the dot-separated package name and
/// its `/`-separated classpath form, in that order.
pub fn rewrite_resource(text: &str, old_pkg: &str, new_pkg: &str) -> String {
   let dot_rewritten = bounded_replace(text, old_pkg, new_pkg);
   let old_path = old_pkg.replace('.', "/");
   let new_path = new_pkg.replace('.', "/");
   bounded_replace(&dot_rewritten, &old_path, &new_path)
}
