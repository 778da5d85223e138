//! Relevance analysis and abstract translation for paper records.
//!
//! Each paper is handled on its own: one prompt, one backend call, one merge. A failure on one
//! paper never stops the others; it is written into that paper's `error` field instead.
//!
//! Merging only ever adds enrichment fields. The bibliographic fields produced by the extractor
//! (`id`, `date`, `Title`, `Authors`, `Abstract`) are never touched.
//!
//! # Examples
//!
//! ```no_run
//! use gleaner::{enrich::Enricher, llm::OllamaClient, store::RecordStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = RecordStore::load("digest.json")?;
//! let backend = OllamaClient::new();
//! let enricher = Enricher::new(&backend);
//!
//! for paper in store.iter_mut() {
//!   let outcome = enricher.analyze(paper).await;
//!   println!("{:?}: {:?}", paper.id, outcome);
//! }
//! store.save("digest.json")?;
//! # Ok(())
//! # }
//! ```

use crate::{
  llm::Backend,
  response::{decode_relevance, decode_translation, RelevancePayload, TranslationPayload},
};

use super::*;

/// What happened to a single paper during an enrichment pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  /// Enrichment fields were merged into the paper.
  Enriched,
  /// The paper has no usable abstract and was left untouched.
  Skipped,
  /// The model answered, but its JSON could not be decoded.
  ///
  /// Both texts are kept so the answer can be inspected by hand.
  Malformed {
    /// Human-readable failure message, also stored on the paper
    message:  String,
    /// Model output as received
    raw:      String,
    /// Model output after escape repair
    repaired: String,
  },
  /// The call or decoding failed for another reason.
  Failed(String),
}

/// Builds the relevance instruction for `abstract_text`.
pub fn relevance_prompt(abstract_text: &str) -> String {
  format!(
    r#"请阅读下面的论文摘要并完成分类。
分类规则（按优先级依次判断）：
1. 如果论文与星际介质相关，Type 返回 "ISM"；
2. 否则，如果论文与恒星形成活动相关，Type 返回 "StarFormation"；
3. 两者都不相关时，Type 返回 "Other"。
然后给出 3 到 5 个英文关键词，以及与之一一对应的中文翻译。

摘要内容: {abstract_text}

请只输出一个 ```json 代码块，不要添加任何额外注释或文本，格式如下:
```json
{{
    "Type": "ISM" | "StarFormation" | "Other",
    "keywords": ["英文关键词1", "英文关键词2", "英文关键词3"],
    "keywords_CN": ["中文关键词1", "中文关键词2", "中文关键词3"]
}}
```"#
  )
}

/// Builds the translation instruction for `abstract_text`.
pub fn translation_prompt(abstract_text: &str) -> String {
  format!(
    r#"请将下面的论文摘要翻译成中文，并给出 3 到 5 个中文关键词。

摘要内容: {abstract_text}

请只输出一个 ```json 代码块，不要添加任何额外注释或文本，格式如下:
```json
{{
    "Abstract_CN": "中文翻译内容",
    "keywords_CN": ["关键词1", "关键词2", "关键词3"]
}}
```"#
  )
}

/// Message stored on a paper for a failed enrichment.
pub fn failure_message(error: &GleanerError) -> String {
  match error {
    GleanerError::Network(e) => format!("Request failed: {e}"),
    GleanerError::Timeout | GleanerError::EmptyResponse | GleanerError::MalformedResponse { .. } =>
      error.to_string(),
    other => format!("An unexpected error occurred: {other}"),
  }
}

/// Writes a successful relevance answer into `paper`.
///
/// The four relevance fields are set together and any earlier `error` is cleared.
pub fn merge_relevance(paper: &mut PaperRecord, payload: RelevancePayload) {
  let RelevancePayload { topic, keywords, keywords_cn, summary } = payload;
  paper.topic = Some(topic);
  paper.keywords = Some(keywords);
  paper.keywords_cn = Some(keywords_cn);
  paper.summary = Some(summary);
  paper.error = None;
}

/// Records a failed relevance analysis on `paper`.
///
/// The relevance fields are cleared so a paper never carries both a result and an error.
pub fn merge_failure(paper: &mut PaperRecord, message: String) {
  paper.topic = None;
  paper.keywords = None;
  paper.keywords_cn = None;
  paper.summary = None;
  paper.error = Some(message);
}

/// Writes a translation answer into `paper`.
///
/// Only `abstract_cn` is taken. The translation's keywords are not aligned with the English ones
/// and would break up the relevance group, so they are dropped.
pub fn merge_translation(paper: &mut PaperRecord, payload: TranslationPayload) {
  if !payload.keywords_cn.is_empty() {
    trace!("Dropping {} translated keywords for {:?}", payload.keywords_cn.len(), paper.id);
  }
  paper.abstract_cn = Some(payload.abstract_cn);
}

/// The abstract to send, or `None` if the paper must not be sent at all.
fn usable_abstract(paper: &PaperRecord) -> Option<&str> {
  match paper.abstract_text.as_deref() {
    None => None,
    Some(text) if is_sentinel_abstract(text) => None,
    Some(text) => Some(text),
  }
}

/// Runs enrichment prompts against a [`Backend`].
pub struct Enricher<'a, B: Backend + ?Sized> {
  /// Where prompts are sent
  backend: &'a B,
}

impl<'a, B: Backend + ?Sized> Enricher<'a, B> {
  /// Creates an enricher sending prompts to `backend`.
  pub fn new(backend: &'a B) -> Self { Self { backend } }

  /// Asks the backend for a relevance payload. Pure with respect to the paper.
  pub async fn relevance(&self, abstract_text: &str) -> Result<RelevancePayload> {
    let raw = self.backend.generate(&relevance_prompt(abstract_text)).await?;
    if raw.is_empty() {
      return Err(GleanerError::EmptyResponse);
    }
    debug!("Raw model output:\n{raw}");
    decode_relevance(&raw)
  }

  /// Asks the backend for a translation payload. Pure with respect to the paper.
  pub async fn translation(&self, abstract_text: &str) -> Result<TranslationPayload> {
    let raw = self.backend.generate(&translation_prompt(abstract_text)).await?;
    if raw.is_empty() {
      return Err(GleanerError::EmptyResponse);
    }
    debug!("Raw model output:\n{raw}");
    decode_translation(&raw)
  }

  /// Classifies `paper` and merges the result, or the failure, into it.
  pub async fn analyze(&self, paper: &mut PaperRecord) -> Outcome {
    let Some(abstract_text) = usable_abstract(paper) else {
      debug!("Skipping {:?}: no abstract", paper.id);
      return Outcome::Skipped;
    };

    match self.relevance(abstract_text).await {
      Ok(payload) => {
        info!("Classified {:?} as {}", paper.id, payload.topic);
        merge_relevance(paper, payload);
        Outcome::Enriched
      },
      Err(error) => {
        let message = failure_message(&error);
        warn!("Analysis of {:?} failed: {message}", paper.id);
        merge_failure(paper, message.clone());
        match error {
          GleanerError::MalformedResponse { raw, repaired, .. } => {
            warn!("Raw model output for {:?}:\n{raw}", paper.id);
            warn!("Repaired model output for {:?}:\n{repaired}", paper.id);
            Outcome::Malformed { message, raw, repaired }
          },
          _ => Outcome::Failed(message),
        }
      },
    }
  }

  /// Translates the abstract of `paper` and merges the result into it.
  ///
  /// A failed translation is reported but leaves the paper unchanged, so an earlier relevance
  /// result is never discarded because of it.
  pub async fn translate(&self, paper: &mut PaperRecord) -> Outcome {
    let Some(abstract_text) = usable_abstract(paper) else {
      return Outcome::Skipped;
    };

    match self.translation(abstract_text).await {
      Ok(payload) => {
        merge_translation(paper, payload);
        Outcome::Enriched
      },
      Err(GleanerError::MalformedResponse { reason, raw, repaired }) => {
        let message = format!("Failed to parse JSON response: {reason}");
        warn!("Translation of {:?} failed: {message}", paper.id);
        warn!("Raw model output for {:?}:\n{raw}", paper.id);
        warn!("Repaired model output for {:?}:\n{repaired}", paper.id);
        Outcome::Malformed { message, raw, repaired }
      },
      Err(error) => {
        let message = failure_message(&error);
        warn!("Translation of {:?} failed: {message}", paper.id);
        Outcome::Failed(message)
      },
    }
  }
}
