//! Paper records as they move through the pipeline.
//!
//! A [`PaperRecord`] starts out holding only what the extractor found in the digest entry
//! (identifier, date, title, authors, abstract). Enrichment later adds a [`Topic`], keyword lists
//! and the model's commentary, or an `error` message when the model call failed.
//!
//! Serialized field names follow the JSON files the pipeline has always written (`Title`,
//! `Authors`, `Abstract`, `Type`, `keywords_CN`, ...), so older record files remain readable.
//! Absent fields are skipped rather than written as `null`; placeholder values such as `N/A`
//! only ever appear in rendered output.
//!
//! # Examples
//!
//! ```
//! use gleaner::paper::{PaperRecord, Topic};
//!
//! let mut paper = PaperRecord::default();
//! paper.id = Some("2401.01234".to_string());
//! paper.abstract_text = Some("-----".to_string());
//!
//! assert!(paper.has_sentinel_abstract());
//! assert_eq!(paper.topic_label(), "Unknown");
//! assert_eq!("StarFormation".parse::<Topic>().unwrap(), Topic::StarFormation);
//! ```

use serde::Deserializer;

use super::*;

/// Bucket used by the renderer for papers that were never classified.
pub const UNKNOWN_TOPIC: &str = "Unknown";

/// One paper entry from a digest, plus whatever enrichment has been applied to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
  /// Source identifier, e.g. `2401.01234`
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id:            Option<String>,
  /// Date line of the entry with version annotations removed
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub date:          Option<String>,
  /// Paper title
  #[serde(rename = "Title", default, skip_serializing_if = "Option::is_none")]
  pub title:         Option<String>,
  /// Author line, verbatim
  #[serde(rename = "Authors", default, skip_serializing_if = "Option::is_none")]
  pub authors:       Option<String>,
  /// Abstract text, possibly empty or a dash sentinel
  #[serde(rename = "Abstract", default, skip_serializing_if = "Option::is_none")]
  pub abstract_text: Option<String>,
  /// Topic assigned by relevance analysis
  #[serde(
    rename = "Type",
    default,
    deserialize_with = "lenient_topic",
    skip_serializing_if = "Option::is_none"
  )]
  pub topic:         Option<Topic>,
  /// English keywords, position-aligned with `keywords_cn`
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub keywords:      Option<Vec<String>>,
  /// Chinese keywords
  #[serde(rename = "keywords_CN", default, skip_serializing_if = "Option::is_none")]
  pub keywords_cn:   Option<Vec<String>>,
  /// Model commentary preceding its JSON answer
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub summary:       Option<String>,
  /// Chinese translation of the abstract
  #[serde(rename = "Abstract_CN", default, skip_serializing_if = "Option::is_none")]
  pub abstract_cn:   Option<String>,
  /// Why enrichment failed, if it did
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error:         Option<String>,
}

/// Topic labels the relevance analysis may assign.
///
/// Priority when a paper touches several areas is ISM first, then star formation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Topic {
  /// Interstellar medium
  #[serde(rename = "ISM")]
  Ism,
  /// Star formation activity
  StarFormation,
  /// Anything else
  Other,
}

impl Topic {
  /// All labels in rendering order.
  pub const ORDER: [Topic; 3] = [Topic::Ism, Topic::StarFormation, Topic::Other];

  /// The label as stored and rendered.
  pub fn as_str(&self) -> &'static str {
    match self {
      Topic::Ism => "ISM",
      Topic::StarFormation => "StarFormation",
      Topic::Other => "Other",
    }
  }
}

impl Display for Topic {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for Topic {
  type Err = GleanerError;

  /// Case-insensitive, surrounding whitespace ignored.
  fn from_str(s: &str) -> Result<Self> {
    let label = s.trim();
    Topic::ORDER
      .into_iter()
      .find(|topic| topic.as_str().eq_ignore_ascii_case(label))
      .ok_or_else(|| GleanerError::InvalidTopic(s.to_string()))
  }
}

/// Reads a stored `Type` through [`Topic::from_str`].
///
/// Older record files hold the label as the model wrote it (`ism`, `ISM/StarFormation`, ...).
/// Unrecognized labels load as `None` and render under [`UNKNOWN_TOPIC`].
fn lenient_topic<'de, D: Deserializer<'de>>(
  deserializer: D,
) -> std::result::Result<Option<Topic>, D::Error> {
  let Some(label) = Option::<String>::deserialize(deserializer)? else { return Ok(None) };
  match label.parse() {
    Ok(topic) => Ok(Some(topic)),
    Err(_) => {
      warn!("Unrecognized topic {label:?} in record file, treating it as unknown");
      Ok(None)
    },
  }
}

/// Whether `text` is the "no abstract" placeholder: one or more `-` and nothing else.
pub fn is_sentinel_abstract(text: &str) -> bool { !text.is_empty() && text.chars().all(|c| c == '-') }

impl PaperRecord {
  /// Whether the abstract is the dash placeholder used upstream for "no abstract".
  pub fn has_sentinel_abstract(&self) -> bool {
    self.abstract_text.as_deref().is_some_and(is_sentinel_abstract)
  }

  /// Whether relevance analysis has been applied successfully.
  pub fn is_enriched(&self) -> bool { self.topic.is_some() }

  /// Rendering bucket for this paper.
  pub fn topic_label(&self) -> &'static str {
    self.topic.as_ref().map_or(UNKNOWN_TOPIC, Topic::as_str)
  }
}
