//! Markdown rendering of a record store.
//!
//! Papers are grouped under `# Type: <topic>` headings in the fixed order ISM, StarFormation,
//! Other, Unknown; empty groups are left out. Missing values are shown as `N/A`. This is the only
//! place where such placeholders are produced.

use std::fmt::{self, Formatter};

use super::*;

/// Placeholder for missing values.
pub const NOT_AVAILABLE: &str = "N/A";

/// Base of the per-paper link.
pub const ABS_URL: &str = "https://arxiv.org/abs/";

/// Group headings in output order.
const GROUP_ORDER: [&str; 4] = ["ISM", "StarFormation", "Other", UNKNOWN_TOPIC];

/// Flattens an abstract onto one line.
///
/// `&` becomes `\` so the text cannot clash with table or entity markup downstream. Abstracts
/// starting with `%%` are digest footer debris and render as `N/A`.
pub fn single_line_abstract(text: &str) -> String {
  if text.starts_with("%%") {
    return NOT_AVAILABLE.to_string();
  }
  text.replace('\n', " ").replace('&', "\\")
}

/// Renders the store as a Markdown document.
pub fn render_markdown(store: &RecordStore) -> String { Document(store).to_string() }

/// A record store formatted as a Markdown document.
struct Document<'a>(&'a RecordStore);

impl Display for Document<'_> {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    let mut groups: BTreeMap<&str, Vec<&PaperRecord>> = BTreeMap::new();
    for paper in self.0 {
      groups.entry(paper.topic_label()).or_default().push(paper);
    }

    for label in GROUP_ORDER {
      let Some(papers) = groups.get(label) else { continue };
      write!(f, "# Type: {label}\n\n")?;
      for paper in papers {
        write_paper(f, paper)?;
      }
    }
    Ok(())
  }
}

/// Writes one paper section.
fn write_paper(f: &mut Formatter<'_>, paper: &PaperRecord) -> fmt::Result {
  let or_na = |value: &Option<String>| value.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string());

  let abstract_line =
    paper.abstract_text.as_deref().map_or_else(|| NOT_AVAILABLE.to_string(), single_line_abstract);

  write!(f, "\n### **{}** \n\n", or_na(&paper.title))?;
  writeln!(f, "Paper Link: {ABS_URL}{} ", or_na(&paper.id))?;
  write!(f, "Date: {}\n\n", or_na(&paper.date))?;

  f.write_str("**Keywords**: ")?;
  for keyword in paper.keywords.iter().flatten() {
    write!(f, "#{} ", keyword.replace(' ', "_"))?;
  }
  f.write_str("\n")?;
  for keyword in paper.keywords_cn.iter().flatten() {
    write!(f, " **{keyword}**  ")?;
  }
  f.write_str("\n\n")?;

  write!(f, "**Authors**: {}\n\n", or_na(&paper.authors))?;
  write!(f, "**Abstract**: {abstract_line}\n\n")?;
  if let Some(abstract_cn) = &paper.abstract_cn {
    write!(f, "**Abstract (CN)**: {}\n\n", abstract_cn.replace('\n', " "))?;
  }
  if let Some(error) = &paper.error {
    write!(f, "**Error**: {error}\n\n")?;
  }
  writeln!(f, "**Summary**: \n ``` \n{}\n ```", or_na(&paper.summary))?;
  f.write_str("---\n\n")
}

/// Renders the store and writes it to `path`, creating parent directories.
pub fn write_markdown(store: &RecordStore, path: impl AsRef<Path>) -> Result<()> {
  let path = path.as_ref();
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(path, render_markdown(store))?;
  info!("Wrote {} papers to {}", store.len(), path.display());
  Ok(())
}

/// Default document name for a given day, e.g. `arxiv_2024-01-31.md`.
pub fn markdown_file_name(date: NaiveDate) -> String { format!("arxiv_{}.md", date.format("%Y-%m-%d")) }
