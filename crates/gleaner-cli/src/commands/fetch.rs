//! Module for the `--fetch-email` stage

use super::*;

/// Saves today's newest digest to the downloads directory.
///
/// Returns the saved digest's base path, or `None` if the folder holds no digest from today.
pub fn fetch(config: &Config, today: NaiveDate) -> gleaner::error::Result<Option<PathBuf>> {
  let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
  println!(
    "{} Looking for today's digest in {} (folder {})",
    style(INFO_PREFIX).cyan(),
    style(config.maildir.display()).yellow(),
    style(&config.folder).yellow()
  );

  let maildir = Maildir::new(&config.maildir);
  let Some(message) = maildir.latest(&config.folder, today, tomorrow)? else {
    println!("{} No digest from {today} in the maildir", style(WARNING_PREFIX).yellow());
    return Ok(None);
  };

  println!("{} Latest digest:", style(SUCCESS_PREFIX).green());
  println!("   {} {}", style("Subject:").green().bold(), style(&message.subject).white());
  println!("   {} {}", style("From:").green().bold(), style(&message.from).white());
  println!("   {} {}", style("Date:").green().bold(), style(&message.date).white());

  let xml = config.downloads_dir.join(message.file_name(today));
  message.save(&xml)?;
  println!("{} Digest saved as {}", style(SUCCESS_PREFIX).green(), style(xml.display()).yellow());

  Ok(Some(xml.with_extension("")))
}
