//! Progress event routing (ambient stack, §10.3). The orchestrator never
//! formats or colors anything itself; it writes structured events to a
//! `ProgressSink` trait object, and a concrete sink renders them.

use std::sync::Mutex;

/// A structured progress event emitted by the orchestrator at phase
/// boundaries and per-entry within harvest/refactor/write.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
   FetchingSkeleton,
   SkeletonReady,
   BaselineCommitted,
   ManifestStarted { sequence: u64, total: usize, index: usize },
   HarvestEntry { destination: String, success: bool },
   RefactorEntry { destination: String },
   WriteEntry { destination: String },
   ManifestCommitted { sequence: u64, message: String },
   ManifestCommitSkipped { sequence: u64, reason: String },
   RollbackStarted,
   RollbackEntry { description: String },
   RollbackComplete,
   Success { commits: usize, finished_at: String },
   Warning { message: String },
}

pub trait ProgressSink: Send + Sync {
   fn emit(&self, event: ProgressEvent);
}

/// Console renderer: `NO_COLOR`-aware, mirrors the terminal-styling
/// conventions used elsewhere in this codebase (success/warning/info color
/// helpers, a boxed summary panel).
pub struct ConsoleSink {
   pub color: bool,
}

impl ProgressSink for ConsoleSink {
   fn emit(&self, event: ProgressEvent) {
      let paint = |s: &str, f: fn(&str) -> String| if self.color { f(s) } else { s.to_string() };

      match event {
         ProgressEvent::FetchingSkeleton => println!("{}", paint("fetching project skeleton...", info)),
         ProgressEvent::SkeletonReady => println!("{}", paint("skeleton extracted", success)),
         ProgressEvent::BaselineCommitted => {
            println!("{}", paint("baseline commit created", success));
         },
         ProgressEvent::ManifestStarted { sequence, total, index } => {
            println!("{}", paint(&format!("manifest {index}/{total} (sequence {sequence})"), bold));
         },
         ProgressEvent::HarvestEntry { destination, success } => {
            let icon = if success { "+" } else { "x" };
            println!("  {icon} {destination}");
         },
         ProgressEvent::RefactorEntry { destination } => println!("  ~ {destination}"),
         ProgressEvent::WriteEntry { destination } => println!("  > {destination}"),
         ProgressEvent::ManifestCommitted { sequence, message } => {
            println!("{}", paint(&format!("commit {sequence}: {message}"), success));
         },
         ProgressEvent::ManifestCommitSkipped { sequence, reason } => {
            println!("{}", paint(&format!("skipped commit for manifest {sequence}: {reason}"), warning));
         },
         ProgressEvent::RollbackStarted => println!("{}", paint("rolling back...", warning)),
         ProgressEvent::RollbackEntry { description } => println!("  - {description}"),
         ProgressEvent::RollbackComplete => {
            println!("{}", paint("rollback complete. No changes were made.", warning));
         },
         ProgressEvent::Success { commits, finished_at } => {
            let body = format!("{commits} commit(s) created\nfinished at {finished_at}");
            println!("{}", boxed_message("bootstrap complete", &body, term_width(), self.color));
         },
         ProgressEvent::Warning { message } => println!("{}", paint(&format!("warning: {message}"), warning)),
      }
   }
}

fn success(s: &str) -> String {
   use owo_colors::OwoColorize;
   s.green().bold().to_string()
}

fn warning(s: &str) -> String {
   use owo_colors::OwoColorize;
   s.yellow().to_string()
}

fn info(s: &str) -> String {
   use owo_colors::OwoColorize;
   s.cyan().to_string()
}

fn bold(s: &str) -> String {
   use owo_colors::OwoColorize;
   s.bold().to_string()
}

/// Whether color output should be used, respecting `NO_COLOR`.
pub fn colors_enabled(no_color_flag: bool) -> bool {
   if no_color_flag || std::env::var("NO_COLOR").is_ok() {
      return false;
   }
   supports_color::on(supports_color::Stream::Stdout).is_some_and(|level| level.has_basic)
}

/// Get terminal width, capped at 120 columns.
fn term_width() -> usize {
   terminal_size::terminal_size().map_or(80, |(w, _)| w.0 as usize).min(120)
}

mod box_chars {
   pub const TOP_LEFT: char = '\u{256D}';
   pub const TOP_RIGHT: char = '\u{256E}';
   pub const BOTTOM_LEFT: char = '\u{2570}';
   pub const BOTTOM_RIGHT: char = '\u{256F}';
   pub const HORIZONTAL: char = '\u{2500}';
   pub const VERTICAL: char = '\u{2502}';
}

fn wrap_line(line: &str, max_width: usize) -> Vec<String> {
   if line.is_empty() {
      return vec![String::new()];
   }

   let mut lines = Vec::new();
   let mut current = String::new();

   for word in line.split_whitespace() {
      let word_len = word.chars().count();
      let current_len = current.chars().count();

      if current.is_empty() {
         current = word.to_string();
      } else if current_len + 1 + word_len <= max_width {
         current.push(' ');
         current.push_str(word);
      } else {
         lines.push(current);
         current = word.to_string();
      }
   }

   if !current.is_empty() {
      lines.push(current);
   }

   lines
}

/// Render a box-framed message with word wrapping, used for the final
/// run summary.
fn boxed_message(title: &str, content: &str, width: usize, color: bool) -> String {
   use box_chars::{BOTTOM_LEFT, BOTTOM_RIGHT, HORIZONTAL, TOP_LEFT, TOP_RIGHT, VERTICAL};

   let mut out = String::new();
   let inner_width = width.saturating_sub(4);

   let title_len = title.chars().count();
   let border_width = width.saturating_sub(2);
   let padding = border_width.saturating_sub(title_len + 2);
   let left_pad = padding / 2;
   let right_pad = padding - left_pad;

   out.push(TOP_LEFT);
   out.push_str(&HORIZONTAL.to_string().repeat(left_pad));
   out.push(' ');
   out.push_str(&if color { bold(title) } else { title.to_string() });
   out.push(' ');
   out.push_str(&HORIZONTAL.to_string().repeat(right_pad));
   out.push(TOP_RIGHT);
   out.push('\n');

   for line in content.lines() {
      for wrapped_line in wrap_line(line, inner_width) {
         out.push(VERTICAL);
         out.push(' ');
         let line_chars = wrapped_line.chars().count();
         out.push_str(&wrapped_line);
         out.push_str(&" ".repeat(inner_width.saturating_sub(line_chars)));
         out.push(' ');
         out.push(VERTICAL);
         out.push('\n');
      }
   }

   out.push(BOTTOM_LEFT);
   out.push_str(&HORIZONTAL.to_string().repeat(border_width));
   out.push(BOTTOM_RIGHT);
   out
}

/// Buffering sink: collects events into a `Vec` for tests, so pipeline
/// tests can assert on emitted events without capturing stdout.
#[derive(Default)]
pub struct BufferingSink {
   events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressSink for BufferingSink {
   fn emit(&self, event: ProgressEvent) {
      self.events.lock().expect("buffering sink mutex poisoned").push(event);
   }
}

impl BufferingSink {
   pub fn events(&self) -> Vec<ProgressEvent> {
      self.events.lock().expect("buffering sink mutex poisoned").clone()
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn buffering_sink_collects_events_in_order() {
      let sink = BufferingSink::default();
      sink.emit(ProgressEvent::FetchingSkeleton);
      sink.emit(ProgressEvent::SkeletonReady);
      let events = sink.events();
      assert_eq!(events.len(), 2);
      assert!(matches!(events[0], ProgressEvent::FetchingSkeleton));
      assert!(matches!(events[1], ProgressEvent::SkeletonReady));
   }

   #[test]
   fn boxed_message_frames_content_within_width() {
      let rendered = boxed_message("summary", "3 commit(s) created", 40, false);
      let lines: Vec<&str> = rendered.lines().collect();
      assert!(lines.first().unwrap().starts_with('\u{256D}'));
      assert!(lines.last().unwrap().starts_with('\u{2570}'));
      assert!(lines.iter().any(|l| l.contains("3 commit(s) created")));
   }

   #[test]
   fn wrap_line_splits_on_word_boundaries() {
      let wrapped = wrap_line("one two three four", 9);
      assert_eq!(wrapped, vec!["one two".to_string(), "three".to_string(), "four".to_string()]);
   }
}
