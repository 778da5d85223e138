//! The ordered record collection passed between pipeline stages.
//!
//! A [`RecordStore`] is a plain sequence: duplicate identifiers are kept in place, and order is
//! digest order. On disk it is a pretty-printed JSON array with four-space indentation and
//! non-ASCII text written verbatim, so the Chinese keywords stay readable in a diff.

use std::{
  fs,
  io::Write,
  ops::{Deref, DerefMut},
};

use serde_json::ser::PrettyFormatter;

use super::*;

/// Ordered collection of [`PaperRecord`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordStore {
  /// Records in digest order
  papers: Vec<PaperRecord>,
}

impl RecordStore {
  /// Creates an empty store.
  pub fn new() -> Self { Self::default() }

  /// Reads a store from a JSON file.
  ///
  /// # Errors
  ///
  /// Returns [`GleanerError::NotFound`] if `path` does not exist, and a JSON error if the file is
  /// not an array of records.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if !path.exists() {
      return Err(GleanerError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let store: RecordStore = serde_json::from_str(&content)?;
    debug!("Loaded {} records from {}", store.len(), path.display());
    Ok(store)
  }

  /// Serializes the store the way it is written to disk.
  pub fn to_json(&self) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    self.serialize(&mut serializer)?;
    // serde_json only ever emits UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
  }

  /// Writes the whole store to `path`, replacing any previous content.
  ///
  /// The data goes to a sibling temporary file first and is then renamed over `path`, so an
  /// interrupted write leaves the previous file intact.
  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      fs::create_dir_all(parent)?;
    }

    let json = self.to_json()?;
    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    fs::rename(&tmp_path, path)?;

    debug!("Saved {} records to {}", self.len(), path.display());
    Ok(())
  }

  /// Consumes the store, returning the records.
  pub fn into_inner(self) -> Vec<PaperRecord> { self.papers }
}

impl From<Vec<PaperRecord>> for RecordStore {
  fn from(papers: Vec<PaperRecord>) -> Self { Self { papers } }
}

impl FromIterator<PaperRecord> for RecordStore {
  fn from_iter<I: IntoIterator<Item = PaperRecord>>(iter: I) -> Self {
    Self { papers: iter.into_iter().collect() }
  }
}

impl Deref for RecordStore {
  type Target = Vec<PaperRecord>;

  fn deref(&self) -> &Self::Target { &self.papers }
}

impl DerefMut for RecordStore {
  fn deref_mut(&mut self) -> &mut Self::Target { &mut self.papers }
}

impl<'a> IntoIterator for &'a RecordStore {
  type IntoIter = std::slice::Iter<'a, PaperRecord>;
  type Item = &'a PaperRecord;

  fn into_iter(self) -> Self::IntoIter { self.papers.iter() }
}
