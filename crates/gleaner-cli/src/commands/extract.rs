//! Module for the `--extract-data` stage

use super::*;

/// Reads `<base>.xml`, extracts its papers and saves them to `<base>.json`.
///
/// Returns the path of the record file.
pub fn extract(base: &Path) -> gleaner::error::Result<PathBuf> {
  let xml = with_suffix(base, ".xml");
  let message = DigestMessage::load(&xml)?;
  trace!("Loaded digest {:?} with {} bytes of body", message.subject, message.body.len());

  let store = extract_papers(&message.body);
  let json = with_suffix(base, ".json");
  store.save(&json)?;

  println!(
    "{} Saved {} papers to {}",
    style(SUCCESS_PREFIX).green(),
    style(store.len()).cyan(),
    style(json.display()).yellow()
  );
  Ok(json)
}
