//! Error type of the `gleaner` binary.

use thiserror::Error;

use super::*;

/// Error type alias used for the `gleaner` binary.
pub type Result<T> = core::result::Result<T, GleanerCliError>;

/// Errors that stop the command line pipeline.
#[derive(Error, Debug)]
pub enum GleanerCliError {
  /// An error from the library.
  #[error(transparent)]
  Gleaner(#[from] GleanerError),

  /// Writing to the terminal or a file failed.
  #[error(transparent)]
  Io(#[from] std::io::Error),
}
