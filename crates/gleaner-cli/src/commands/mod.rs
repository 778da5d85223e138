//! The pipeline stages and the file hand-off between them.

use super::*;

pub mod analyze;
pub mod extract;
pub mod fetch;
pub mod generate;

pub use analyze::analyze;
pub use extract::extract;
pub use fetch::fetch;
pub use generate::generate;

/// Files the stages read and write.
///
/// `base` is the digest path without extension; the saved digest is `<base>.xml` and its records
/// are `<base>.json`. `json` is set once a record file is known for certain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Targets {
  /// Digest path without extension
  pub base: Option<PathBuf>,
  /// Record file
  pub json: Option<PathBuf>,
}

impl Targets {
  /// Interprets a `--file` argument.
  ///
  /// `.xml` names the digest, `.json` names the record file (and its digest), anything else is
  /// taken as the base path.
  pub fn from_file(file: &Path) -> Self {
    match file.extension().and_then(|ext| ext.to_str()) {
      Some("xml") => Self { base: Some(file.with_extension("")), json: None },
      Some("json") => Self { base: Some(file.with_extension("")), json: Some(file.to_path_buf()) },
      _ => Self::from_base(file.to_path_buf()),
    }
  }

  /// Targets derived from a base path alone.
  pub fn from_base(base: PathBuf) -> Self { Self { base: Some(base), json: None } }

  /// The record file to work on: the known one, or `<base>.json` if that exists.
  pub fn json_path(&self) -> Option<PathBuf> {
    if let Some(json) = &self.json {
      return Some(json.clone());
    }
    let candidate = with_suffix(self.base.as_ref()?, ".json");
    candidate.exists().then_some(candidate)
  }
}

/// Appends `suffix` to `base`. Unlike `with_extension`, dots already in the name are kept.
pub fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
  let mut path = base.as_os_str().to_owned();
  path.push(suffix);
  PathBuf::from(path)
}

/// Prints a stage failure and turns it into `None`.
pub fn report<T>(result: gleaner::error::Result<T>) -> Option<T> {
  match result {
    Ok(value) => Some(value),
    Err(e) => {
      println!("{} {}", style(ERROR_PREFIX).red(), style(e).red());
      None
    },
  }
}

/// Prints why a stage did not run.
pub fn skip(message: &str) { println!("{} {}", style(WARNING_PREFIX).yellow(), message); }
