//! Digest retrieval from a local maildir and the saved digest artifact.
//!
//! The fetch stage asks a [`MailSource`] for the newest digest of a day and stores it as a small
//! XML document so later stages (and later runs) can work without touching the mailbox again:
//!
//! ```xml
//! <?xml version="1.0" encoding="utf-8"?>
//! <email><subject>cs daily</subject><from>no-reply@arxiv.org</from><date>...</date><body>...</body></email>
//! ```
//!
//! Only what the digests need is understood: RFC 2822 headers with folding, a `Date` header in
//! the forms real mailers produce, and the first `text/plain` part of a multipart message. Charset
//! and transfer encodings are left alone.

use super::*;

/// Declaration written at the top of every saved digest.
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Root element of a saved digest.
const XML_ROOT: &str = "email";

lazy_static! {
  static ref BOUNDARY: Regex = Regex::new(r#"(?i)boundary\s*=\s*"?([^";]+)"?"#).unwrap();
}

/// One digest email, reduced to the four parts the pipeline uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestMessage {
  /// `Subject` header as received
  pub subject: String,
  /// `From` header as received
  pub from:    String,
  /// `Date` header as received
  pub date:    String,
  /// Plain-text body with LF line endings
  pub body:    String,
}

impl DigestMessage {
  /// Artifact file name for this message fetched on `day`, e.g. `arXiv_cs_daily_20240131.xml`.
  pub fn file_name(&self, day: NaiveDate) -> String {
    format!("{}_{}.xml", sanitize_filename(&self.subject), day.format("%Y%m%d"))
  }

  /// Serializes the message as an XML document.
  pub fn to_xml(&self) -> Result<String> {
    let element = quick_xml::se::to_string_with_root(XML_ROOT, self)?;
    Ok(format!("{XML_DECLARATION}\n{element}\n"))
  }

  /// Parses a document written by [`DigestMessage::to_xml`].
  pub fn from_xml(xml: &str) -> Result<Self> { Ok(quick_xml::de::from_str(xml)?) }

  /// Writes the message to `path`, creating parent directories.
  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, self.to_xml()?)?;
    debug!("Saved digest {:?} to {}", self.subject, path.display());
    Ok(())
  }

  /// Reads a saved digest.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if !path.exists() {
      return Err(GleanerError::NotFound(path.to_path_buf()));
    }
    Self::from_xml(&std::fs::read_to_string(path)?)
  }
}

/// Replaces characters that are not allowed in file names with `_`.
pub fn sanitize_filename(name: &str) -> String {
  name
    .chars()
    .map(|c| if matches!(c, '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|') { '_' } else { c })
    .collect()
}

/// Somewhere digests can be fetched from.
pub trait MailSource {
  /// Returns the newest message in `folder` sent on or after `since` and before `before`.
  ///
  /// Days are compared in local time. `Ok(None)` means the folder holds no such message.
  fn latest(&self, folder: &str, since: NaiveDate, before: NaiveDate)
    -> Result<Option<DigestMessage>>;
}

/// A maildir on the local file system, typically kept in sync by a tool such as `mbsync`.
#[derive(Debug, Clone)]
pub struct Maildir {
  root: PathBuf,
}

impl Maildir {
  /// Opens the maildir rooted at `root`.
  pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }

  /// Directory holding `folder`.
  ///
  /// An empty name or `INBOX` is the root itself. Otherwise both the plain layout (`root/folder`)
  /// and the Maildir++ layout (`root/.folder`) are accepted.
  pub fn folder_path(&self, folder: &str) -> PathBuf {
    if folder.is_empty() || folder.eq_ignore_ascii_case("INBOX") {
      return self.root.clone();
    }
    let plain = self.root.join(folder);
    if plain.is_dir() {
      plain
    } else {
      self.root.join(format!(".{folder}"))
    }
  }

  /// Every message file in the `cur/` and `new/` subdirectories of `folder`.
  fn message_files(&self, folder: &str) -> Result<Vec<PathBuf>> {
    let dir = self.folder_path(folder);
    if !dir.is_dir() {
      return Err(GleanerError::NotFound(dir));
    }

    let mut files = Vec::new();
    for sub in ["cur", "new"] {
      let sub = dir.join(sub);
      if !sub.is_dir() {
        continue;
      }
      for entry in std::fs::read_dir(&sub)? {
        let path = entry?.path();
        if path.is_file() {
          files.push(path);
        }
      }
    }
    trace!("Found {} message files under {}", files.len(), dir.display());
    Ok(files)
  }
}

impl MailSource for Maildir {
  fn latest(
    &self,
    folder: &str,
    since: NaiveDate,
    before: NaiveDate,
  ) -> Result<Option<DigestMessage>> {
    let mut newest: Option<(DateTime<FixedOffset>, PathBuf, ParsedMessage)> = None;

    for path in self.message_files(folder)? {
      let raw = String::from_utf8_lossy(&std::fs::read(&path)?).replace("\r\n", "\n");
      let message = ParsedMessage::parse(&raw);
      let Some(sent) = message.header("date").and_then(parse_date) else {
        warn!("Skipping {} without a readable Date header", path.display());
        continue;
      };
      let day = sent.with_timezone(&Local).date_naive();
      if day < since || day >= before {
        continue;
      }
      if newest.as_ref().map_or(true, |(best, ..)| sent > *best) {
        newest = Some((sent, path, message));
      }
    }

    let Some((sent, path, message)) = newest else {
      debug!("No message in {folder:?} between {since} and {before}");
      return Ok(None);
    };
    info!("Using message {} sent {}", path.display(), sent);

    let body = message.plain_text().ok_or_else(|| {
      GleanerError::Mail(format!("{} has no text/plain part", path.display()))
    })?;
    Ok(Some(DigestMessage {
      subject: message.header("subject").unwrap_or_default().to_string(),
      from:    message.header("from").unwrap_or_default().to_string(),
      date:    message.header("date").unwrap_or_default().to_string(),
      body,
    }))
  }
}

/// Brings a `Date` header into a form `parse_from_rfc2822` accepts.
///
/// A trailing comment such as `(UTC)` is dropped and `-0000` is read as `+0000`.
fn normalize_date(mut date: &str) -> std::borrow::Cow<'_, str> {
  if date.ends_with(')') {
    if let Some(pos) = date.rfind('(') {
      date = &date[..pos];
    }
  }
  date = date.trim();
  match date.strip_suffix("-0000") {
    Some(rest) => format!("{rest}+0000").into(),
    None => date.into(),
  }
}

fn parse_date(date: &str) -> Option<DateTime<FixedOffset>> {
  DateTime::parse_from_rfc2822(&normalize_date(date)).ok()
}

/// A message split into unfolded headers and the raw body.
#[derive(Debug, Clone)]
struct ParsedMessage {
  /// Header names lower-cased, in order of appearance
  headers: Vec<(String, String)>,
  body:    String,
}

impl ParsedMessage {
  /// Parses LF-terminated message text. Continuation lines are joined onto their header.
  fn parse(text: &str) -> Self {
    let (head, body) = match text.split_once("\n\n") {
      Some((head, body)) => (head, body),
      None => (text, ""),
    };

    let mut headers: Vec<(String, String)> = Vec::new();
    for line in head.lines() {
      if line.starts_with([' ', '\t']) {
        if let Some((_, value)) = headers.last_mut() {
          value.push(' ');
          value.push_str(line.trim());
        }
        continue;
      }
      if let Some((name, value)) = line.split_once(':') {
        headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
      }
    }
    Self { headers, body: body.to_string() }
  }

  /// First value of header `name` (lower-case).
  fn header(&self, name: &str) -> Option<&str> {
    self.headers.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
  }

  fn content_type(&self) -> String {
    self.header("content-type").unwrap_or("text/plain").to_ascii_lowercase()
  }

  fn is_attachment(&self) -> bool {
    self
      .header("content-disposition")
      .is_some_and(|d| d.trim_start().to_ascii_lowercase().starts_with("attachment"))
  }

  /// Body of the first `text/plain` part that is not an attachment.
  fn plain_text(&self) -> Option<String> {
    let content_type = self.content_type();
    if !content_type.starts_with("multipart/") {
      return (content_type.starts_with("text/plain") && !self.is_attachment())
        .then(|| self.body.clone());
    }

    let boundary = BOUNDARY.captures(self.header("content-type")?)?.get(1)?.as_str().trim();
    let delimiter = format!("--{boundary}");
    self
      .body
      .split(delimiter.as_str())
      .skip(1)
      .take_while(|part| !part.starts_with("--"))
      .map(|part| ParsedMessage::parse(part.strip_prefix('\n').unwrap_or(part)))
      .find_map(|part| part.plain_text())
      .map(|text| text.strip_suffix('\n').map(str::to_string).unwrap_or(text))
  }
}
