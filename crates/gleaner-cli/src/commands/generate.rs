//! Module for the `--generate-md` stage

use super::*;

/// Renders the record file at `json` to `arxiv_<today>.md` in the output directory.
pub fn generate(config: &Config, json: &Path, today: NaiveDate) -> gleaner::error::Result<PathBuf> {
  let store = RecordStore::load(json)?;
  let path = config.markdown_path(today);
  write_markdown(&store, &path)?;

  println!(
    "{} Markdown written to {}",
    style(SUCCESS_PREFIX).green(),
    style(path.display()).yellow()
  );
  Ok(path)
}
