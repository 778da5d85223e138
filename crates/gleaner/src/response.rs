//! Turning free-form model output into structured payloads.
//!
//! Local reasoning models wrap their JSON in commentary (often a `<think>` block) and regularly
//! emit escape sequences JSON does not allow, such as `\alpha` copied from a LaTeX abstract.
//! Decoding runs as three small steps, each usable on its own:
//!
//! 1. [`repair_escapes`] doubles every backslash that does not start a valid JSON escape.
//! 2. [`split_fenced_json`] finds the first ```` ```json ```` block and returns the text before it
//!    together with the block's interior.
//! 3. [`decode_relevance`] / [`decode_translation`] parse the interior into a payload.

use serde_json::Value;

use super::*;

/// Opening fence of the JSON block.
pub const JSON_FENCE: &str = "```json";

/// Closing fence.
pub const FENCE: &str = "```";

/// Characters allowed after a backslash in a JSON string.
const VALID_ESCAPES: [char; 8] = ['"', '\\', '/', 'b', 'f', 'n', 'r', 't'];

/// Escapes every backslash that does not begin a valid JSON escape.
///
/// Valid pairs are copied through as a unit, so the pass is idempotent: `\x` becomes `\\x`, and
/// repairing `\\x` again leaves it alone.
///
/// ```
/// use gleaner::response::repair_escapes;
///
/// assert_eq!(repair_escapes(r#"{"t": "\alpha \n"}"#), r#"{"t": "\\alpha \n"}"#);
/// ```
pub fn repair_escapes(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut chars = text.chars().peekable();

  while let Some(c) = chars.next() {
    if c != '\\' {
      out.push(c);
      continue;
    }
    match chars.peek() {
      Some(&next) if VALID_ESCAPES.contains(&next) => {
        out.push('\\');
        out.push(next);
        chars.next();
      },
      _ => out.push_str("\\\\"),
    }
  }
  out
}

/// Splits `text` around its first fenced JSON block.
///
/// Returns the text preceding the opening fence and the interior of the block, or `None` when
/// there is no opening fence or it is never closed.
pub fn split_fenced_json(text: &str) -> Option<(&str, &str)> {
  let (before, rest) = text.split_once(JSON_FENCE)?;
  let (inner, _) = rest.split_once(FENCE)?;
  Some((before, inner))
}

/// Relevance answer: topic, keywords and the commentary around them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelevancePayload {
  /// Assigned topic
  pub topic:       Topic,
  /// English keywords
  pub keywords:    Vec<String>,
  /// Chinese keywords, aligned with `keywords`
  pub keywords_cn: Vec<String>,
  /// Text the model wrote before its JSON block
  pub summary:     String,
}

/// Translation answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TranslationPayload {
  /// Chinese abstract
  #[serde(rename = "Abstract_CN", default)]
  pub abstract_cn: String,
  /// Chinese keywords
  #[serde(rename = "keywords_CN", default)]
  pub keywords_cn: Vec<String>,
}

/// Repairs `raw` and parses its fenced JSON block into a generic value.
///
/// Returns the value and the text before the fence. Any failure is reported as
/// [`GleanerError::MalformedResponse`] carrying both texts.
fn parse_fenced(raw: &str) -> Result<(Value, String)> {
  let repaired = repair_escapes(raw);

  let parsed = match split_fenced_json(&repaired) {
    Some((before, inner)) => serde_json::from_str::<Value>(inner)
      .map(|value| (value, before.to_string()))
      .map_err(|e| e.to_string()),
    None => Err(format!("no {JSON_FENCE} block in model output")),
  };

  parsed.map_err(move |reason| GleanerError::MalformedResponse {
    reason,
    raw: raw.to_string(),
    repaired,
  })
}

/// Looks up a required key of the relevance payload.
fn required<'a>(value: &'a Value, key: &str) -> Result<&'a Value> {
  value.get(key).ok_or_else(|| GleanerError::MissingField(key.to_string()))
}

/// Reads a JSON array of strings.
fn string_list(value: &Value) -> Result<Vec<String>> { Ok(serde_json::from_value(value.clone())?) }

/// Decodes a relevance answer.
///
/// `Type`, `keywords` and `keywords_CN` must all be present.
pub fn decode_relevance(raw: &str) -> Result<RelevancePayload> {
  let (value, summary) = parse_fenced(raw)?;

  let label = required(&value, "Type")?;
  let topic = match label.as_str() {
    Some(label) => label.parse::<Topic>()?,
    None => return Err(GleanerError::InvalidTopic(label.to_string())),
  };
  let keywords = string_list(required(&value, "keywords")?)?;
  let keywords_cn = string_list(required(&value, "keywords_CN")?)?;

  trace!("Decoded relevance payload: {topic}, {keywords:?}");
  Ok(RelevancePayload { topic, keywords, keywords_cn, summary })
}

/// Decodes a translation answer. Absent keys default to empty.
pub fn decode_translation(raw: &str) -> Result<TranslationPayload> {
  let (value, _) = parse_fenced(raw)?;
  let mut payload: TranslationPayload = serde_json::from_value(value)?;
  payload.abstract_cn = payload.abstract_cn.trim().to_string();
  Ok(payload)
}
