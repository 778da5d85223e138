//! Splitting a digest body into entries and pulling fields out of each entry.
//!
//! arXiv digests separate papers with a line holding only `\\`, and every paper block starts with
//! `arXiv:<id>`. Splitting on `"\n\\\\\na"` therefore eats the leading `a`, which is why real
//! entries start with [`ENTRY_PREFIX`] (`rXiv:`) and the text before the first paper does not.
//!
//! Inside an entry the header lines (`Date:`, `Title:`, `Authors:`) come first, followed by the
//! abstract between two `\\` lines:
//!
//! ```text
//! rXiv:1234.5678
//! Date: 1 Jan 2024 (v1)
//! Title: A Study
//! Authors: A. Smith
//! \\
//! Line one.
//! Line two.
//! \\ ( https://arxiv.org/abs/1234.5678 ,  12kb)
//! ```
//!
//! # Examples
//!
//! ```
//! use gleaner::extract::parse_entry;
//!
//! let entry = "rXiv:1234.5678\nDate: 1 Jan 2024 (v1)\nTitle: A Study\nAuthors: A. \
//!              Smith\n\\\\\nLine one.\nLine two.\n\\\\\n";
//! let paper = parse_entry(entry);
//! assert_eq!(paper.id.as_deref(), Some("1234.5678"));
//! assert_eq!(paper.date.as_deref(), Some("1 Jan 2024"));
//! assert_eq!(paper.abstract_text.as_deref(), Some("Line one.\nLine two."));
//! ```

use super::*;

/// Separator between consecutive entries in a digest body.
pub const ENTRY_DELIMITER: &str = "\n\\\\\na";

/// What a real entry starts with once the delimiter has consumed the `a` of `arXiv:`.
pub const ENTRY_PREFIX: &str = "rXiv:";

/// Line prefix that ends an entry outright.
pub const END_MARKER: &str = "%%--";

/// Paragraph-break marker around the abstract.
pub const BREAK_MARKER: &str = "\\\\";

lazy_static! {
  /// Matches the `Date:` label and any parenthesized annotation such as `(v1)` or `(45kb)`.
  static ref DATE_NOISE: Regex = Regex::new(r"Date:| \(.*\)").unwrap();
}

/// Splits a digest body into candidate entries.
///
/// No filtering happens here: the first candidate is normally the digest preamble and must be
/// discarded by the caller (see [`extract_papers`]).
pub fn split_entries(body: &str) -> Vec<&str> { body.split(ENTRY_DELIMITER).collect() }

/// Extracts every paper in a digest body, in digest order.
pub fn extract_papers(body: &str) -> RecordStore {
  let candidates = split_entries(body);
  trace!("Digest split into {} candidates", candidates.len());

  let papers: Vec<PaperRecord> = candidates
    .into_iter()
    .filter(|candidate| candidate.starts_with(ENTRY_PREFIX))
    .map(parse_entry)
    .collect();

  debug!("Extracted {} papers from digest", papers.len());
  RecordStore::from(papers)
}

/// Scanner position within one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
  /// Reading header lines, abstract not started yet
  SeekingHeader,
  /// Between the two break markers
  CollectingAbstract,
  /// Nothing more to read
  Done,
}

/// Classification of a single trimmed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind<'a> {
  /// `rXiv:<id>`
  Identifier(&'a str),
  /// `Date: ...`
  Date(&'a str),
  /// `Title: ...`
  Title(&'a str),
  /// `Authors: ...`
  Authors(&'a str),
  /// `%%--...`
  EndMarker,
  /// `\\...`
  Break,
  /// Anything else
  Text(&'a str),
}

/// What the scanner does with a line besides changing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
  /// Store a header field
  SetField,
  /// Append the line to the abstract
  Collect,
  /// Accept the collected lines as the abstract
  Close,
  /// Drop the line
  Ignore,
}

/// The remainder of `line` after its first `:`, trimmed.
fn after_colon(line: &str) -> &str { line.split_once(':').map_or("", |(_, rest)| rest.trim()) }

impl<'a> LineKind<'a> {
  /// Classifies a trimmed line. Header prefixes win over the current scanner state.
  fn classify(line: &'a str) -> Self {
    if line.starts_with(ENTRY_PREFIX) {
      LineKind::Identifier(after_colon(line))
    } else if line.starts_with("Date:") {
      LineKind::Date(line)
    } else if line.starts_with("Title:") {
      LineKind::Title(after_colon(line))
    } else if line.starts_with("Authors:") {
      LineKind::Authors(after_colon(line))
    } else if line.starts_with(END_MARKER) {
      LineKind::EndMarker
    } else if line.starts_with(BREAK_MARKER) {
      LineKind::Break
    } else {
      LineKind::Text(line)
    }
  }
}

impl ScanState {
  /// Transition table of the entry scanner.
  fn step(self, kind: &LineKind) -> (ScanState, Action) {
    use LineKind::*;
    use ScanState::*;

    match (self, kind) {
      (Done, _) => (Done, Action::Ignore),
      (CollectingAbstract, EndMarker) => (Done, Action::Close),
      (SeekingHeader, EndMarker) => (Done, Action::Ignore),
      (SeekingHeader, Break) => (CollectingAbstract, Action::Ignore),
      (CollectingAbstract, Break) => (Done, Action::Close),
      (state, Identifier(_) | Date(_) | Title(_) | Authors(_)) => (state, Action::SetField),
      (CollectingAbstract, Text(_)) => (CollectingAbstract, Action::Collect),
      (SeekingHeader, Text(_)) => (SeekingHeader, Action::Ignore),
    }
  }
}

/// Normalizes a `Date:` line, e.g. `Date: Mon, 1 Jan 2024 10:00:00 GMT (12kb)`.
fn clean_date(line: &str) -> String { DATE_NOISE.replace_all(line, "").trim().to_string() }

/// Parses one candidate entry into a [`PaperRecord`].
///
/// Fields are only set when their header line is present. The abstract is always set: it holds
/// the lines after the first break marker up to the second one, or up to an end marker. It is
/// empty when the entry runs out before either closes it (no break marker, or a single one).
/// Lines after an end marker are never read.
pub fn parse_entry(entry: &str) -> PaperRecord {
  let mut paper = PaperRecord::default();
  let mut state = ScanState::SeekingHeader;
  let mut abstract_lines: Vec<&str> = Vec::new();
  let mut closed = false;

  for line in entry.split('\n').map(str::trim) {
    let kind = LineKind::classify(line);
    let (next, action) = state.step(&kind);

    match (action, kind) {
      (Action::SetField, LineKind::Identifier(id)) => paper.id = Some(id.to_string()),
      (Action::SetField, LineKind::Date(raw)) => paper.date = Some(clean_date(raw)),
      (Action::SetField, LineKind::Title(title)) => paper.title = Some(title.to_string()),
      (Action::SetField, LineKind::Authors(authors)) => paper.authors = Some(authors.to_string()),
      (Action::Collect, LineKind::Text(text)) => abstract_lines.push(text),
      (Action::Close, _) => closed = true,
      _ => {},
    }

    state = next;
    if state == ScanState::Done {
      break;
    }
  }

  if !closed {
    abstract_lines.clear();
  }
  paper.abstract_text = Some(abstract_lines.join("\n").trim().to_string());
  paper
}

#[cfg(test)]
mod tests {
  use super::*;

  fn entry(id: &str, breaks: usize) -> String {
    let mut text = format!(
      "rXiv:{id}\nDate: Mon, 1 Jan 2024 10:00:00 GMT   (12kb)\nTitle: Paper {id}\nAuthors: A. \
       Smith, B. Jones\nCategories: astro-ph.GA\n"
    );
    for i in 0..breaks {
      text.push_str("\\\\\n");
      if i == 0 {
        text.push_str("  First abstract line.\nSecond abstract line.  \n");
      }
    }
    text
  }

  #[test]
  fn test_split_counts() {
    let body = format!(
      "Preamble text\n------------\n\\\\\na{}\\\\\na{}\\\\\na{}",
      entry("2401.00001", 2),
      entry("2401.00002", 2),
      entry("2401.00003", 2)
    );
    assert_eq!(split_entries(&body).len(), 4);

    let store = extract_papers(&body);
    assert_eq!(store.len(), 3);
    let ids: Vec<_> = store.iter().map(|p| p.id.clone().unwrap()).collect();
    assert_eq!(ids, ["2401.00001", "2401.00002", "2401.00003"]);
  }

  #[test]
  fn test_spec_example_entry() {
    let text = "rXiv:1234.5678\nDate: 1 Jan 2024 (v1)\nTitle: A Study\nAuthors: A. \
                Smith\n\\\\\nLine one.\nLine two.\n\\\\\n";
    let paper = parse_entry(text);
    assert_eq!(paper.id.as_deref(), Some("1234.5678"));
    assert_eq!(paper.date.as_deref(), Some("1 Jan 2024"));
    assert_eq!(paper.title.as_deref(), Some("A Study"));
    assert_eq!(paper.authors.as_deref(), Some("A. Smith"));
    assert_eq!(paper.abstract_text.as_deref(), Some("Line one.\nLine two."));
    assert!(paper.topic.is_none());
  }

  #[test]
  fn test_break_marker_counts() {
    assert_eq!(parse_entry(&entry("1", 0)).abstract_text.as_deref(), Some(""));
    assert_eq!(parse_entry(&entry("1", 1)).abstract_text.as_deref(), Some(""));
    assert_eq!(
      parse_entry(&entry("1", 2)).abstract_text.as_deref(),
      Some("First abstract line.\nSecond abstract line.")
    );

    let mut extra = entry("1", 2);
    extra.push_str("Trailing text\n\\\\\nNever reached\n\\\\\n");
    assert_eq!(
      parse_entry(&extra).abstract_text.as_deref(),
      Some("First abstract line.\nSecond abstract line.")
    );
  }

  #[test]
  fn test_date_cleanup() {
    assert_eq!(
      clean_date("Date: Mon, 1 Jan 2024 10:00:00 GMT   (12kb)"),
      "Mon, 1 Jan 2024 10:00:00 GMT"
    );
    assert_eq!(clean_date("Date: 1 Jan 2024 (v1), revised 3 Jan 2024 (v2)"), "1 Jan 2024");
    assert_eq!(clean_date("Date: 1 Jan 2024"), "1 Jan 2024");
  }

  #[test]
  fn test_end_marker_stops_scanning() {
    let text = "rXiv:2401.00009\nTitle: Kept\n\\\\\nCut short\n%%--%%--%%\nAuthors: Dropped\n\\\\\n";
    let paper = parse_entry(text);
    assert_eq!(paper.title.as_deref(), Some("Kept"));
    assert!(paper.authors.is_none());
    assert_eq!(paper.abstract_text.as_deref(), Some("Cut short"));

    let before_abstract = parse_entry("rXiv:2401.00013\n%%--%%--\n\\\\\nLost\n\\\\\n");
    assert_eq!(before_abstract.id.as_deref(), Some("2401.00013"));
    assert_eq!(before_abstract.abstract_text.as_deref(), Some(""));
  }

  #[test]
  fn test_break_line_with_link_annotation() {
    let text = "rXiv:2401.00010\nTitle: T\n\\\\\nBody.\n\\\\ ( https://arxiv.org/abs/2401.00010 ,  \
                8kb)\nAfter\n";
    assert_eq!(parse_entry(text).abstract_text.as_deref(), Some("Body."));
  }

  #[test]
  fn test_header_inside_abstract_sets_field() {
    let text = "rXiv:2401.00011\n\\\\\nBody.\nTitle: Late title\nMore.\n\\\\\n";
    let paper = parse_entry(text);
    assert_eq!(paper.title.as_deref(), Some("Late title"));
    assert_eq!(paper.abstract_text.as_deref(), Some("Body.\nMore."));
  }

  #[test]
  fn test_missing_headers_stay_absent() {
    let paper = parse_entry("rXiv:2401.00012\n");
    assert_eq!(paper.id.as_deref(), Some("2401.00012"));
    assert!(paper.date.is_none());
    assert!(paper.title.is_none());
    assert!(paper.authors.is_none());
  }

  #[test]
  fn test_preamble_is_discarded() {
    let store = extract_papers("Nothing but a preamble\n");
    assert!(store.is_empty());
  }
}
