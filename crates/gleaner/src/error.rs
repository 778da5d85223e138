//! Error types for the gleaner library.
//!
//! Stage-level problems (a missing record file, an unreadable maildir) surface as
//! [`GleanerError`] values. Per-paper enrichment problems are also built from these variants, but
//! the enricher turns them into a message on the paper itself instead of failing the whole run.
//!
//! # Examples
//!
//! ```
//! use gleaner::{error::GleanerError, store::RecordStore};
//!
//! match RecordStore::load("does/not/exist.json") {
//!   Err(GleanerError::NotFound(path)) => println!("no record file at {}", path.display()),
//!   Err(e) => println!("Other error: {}", e),
//!   Ok(_) => println!("Success!"),
//! }
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Error type alias used for the [`gleaner`](crate) crate.
pub type Result<T> = core::result::Result<T, GleanerError>;

/// Errors that can occur while fetching, extracting, enriching or rendering digests.
#[derive(Error, Debug)]
pub enum GleanerError {
  /// A network request to the model backend failed.
  ///
  /// This covers connection failures, TLS errors and non-success HTTP statuses.
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// The model backend did not answer within the configured timeout.
  #[error("The request timed out")]
  Timeout,

  /// The model backend answered, but with an empty `response` field.
  #[error("No valid response from the model")]
  EmptyResponse,

  /// The model output contained no parseable fenced JSON block.
  ///
  /// Both the raw text and the escape-repaired text are kept for inspection.
  #[error("Failed to parse JSON response: {reason}")]
  MalformedResponse {
    /// Why the fenced block could not be decoded.
    reason:   String,
    /// The model output exactly as received.
    raw:      String,
    /// The model output after escape repair.
    repaired: String,
  },

  /// A key the relevance payload requires was not present.
  #[error("missing field `{0}` in model response")]
  MissingField(String),

  /// The model produced a topic label outside of ISM, StarFormation and Other.
  #[error("unrecognized topic label {0:?}")]
  InvalidTopic(String),

  /// A required input file does not exist.
  #[error("File not found: {}", .0.display())]
  NotFound(PathBuf),

  /// A file system operation failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),

  /// Reading or writing the record store JSON failed.
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  /// Reading the saved digest XML failed.
  #[error(transparent)]
  XmlDe(#[from] quick_xml::DeError),

  /// Writing the digest XML failed.
  #[error(transparent)]
  XmlSe(#[from] quick_xml::SeError),

  /// The configuration file could not be parsed.
  #[error(transparent)]
  TomlDe(#[from] toml::de::Error),

  /// The configuration could not be serialized.
  #[error(transparent)]
  TomlSe(#[from] toml::ser::Error),

  /// Invalid configuration value.
  #[error("{0}")]
  Config(String),

  /// A message in the maildir could not be understood.
  #[error("Mail error: {0}")]
  Mail(String),
}
