//! arXiv digest processing library.
//!
//! `gleaner` turns the daily arXiv notification email into a categorized reading list:
//!
//! - Digest retrieval from a local maildir folder
//! - Entry splitting and field extraction from the plain-text digest body
//! - A persisted, ordered record store (JSON)
//! - Topic classification and bilingual keywords from a local Ollama model
//! - Markdown rendering grouped by topic
//!
//! # Getting Started
//!
//! ```no_run
//! use gleaner::{
//!   enrich::Enricher,
//!   extract::extract_papers,
//!   llm::{Model, OllamaClient},
//!   render::render_markdown,
//! };
//!
//! # async fn example(body: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = extract_papers(body);
//!
//! let backend = OllamaClient::new().with_model(Model::DeepseekR1p8b);
//! let enricher = Enricher::new(&backend);
//! for paper in store.iter_mut() {
//!   enricher.analyze(paper).await;
//! }
//!
//! println!("{}", render_markdown(&store));
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`extract`]: Digest splitting and per-entry field extraction
//! - [`paper`]: The paper record and topic labels
//! - [`store`]: Ordered record collection and its on-disk form
//! - [`llm`]: Ollama client behind the [`llm::Backend`] trait
//! - [`response`]: Repair and decoding of free-form model output
//! - [`enrich`]: Relevance and translation enrichment of records
//! - [`render`]: Markdown output
//! - [`mail`]: Maildir access and the saved digest artifact
//! - [`config`]: Paths, hosts and models

#![warn(missing_docs)]

use std::{
  collections::BTreeMap,
  fmt::Display,
  path::{Path, PathBuf},
  str::FromStr,
  time::Duration,
};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};
#[cfg(test)]
use {tempfile::tempdir, tracing_test::traced_test};

pub mod config;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod llm;
pub mod mail;
pub mod paper;
pub mod render;
pub mod response;
pub mod store;

use crate::{error::*, paper::*, store::*};

/// Common traits and types for ergonomic imports.
///
/// ```no_run
/// use gleaner::prelude::*;
///
/// fn example() -> Result<(), GleanerError> {
///   let store = RecordStore::load("digest.json")?;
///   println!("{} papers", store.len());
///   Ok(())
/// }
/// ```
pub mod prelude {
  pub use crate::{
    error::GleanerError,
    llm::Backend,
    mail::MailSource,
    paper::{PaperRecord, Topic},
    store::RecordStore,
  };
}
