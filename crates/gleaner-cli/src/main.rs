//! Command line pipeline for turning the daily arXiv digest email into a reading list.
//!
//! The pipeline has four stages, each switched on by its own flag:
//! - `--fetch-email`: take the newest digest of today from the maildir and save it as XML
//! - `--extract-data`: split the saved digest into paper records (XML -> JSON)
//! - `--analyze-data`: classify every paper with the local model and store the result
//! - `--generate-md`: render the records as a Markdown document grouped by topic
//!
//! # Usage
//!
//! ```bash
//! # Run everything for today's digest
//! gleaner --all
//!
//! # Re-run analysis and rendering for an earlier digest
//! gleaner --analyze-data --generate-md --file downloads/astro-ph_20240116.json
//!
//! # Also translate abstracts, with more logging
//! gleaner --all --translate -vv
//! ```
//!
//! A stage that cannot run explains why and the stages depending on it are skipped; the process
//! still exits normally. Paths, the Ollama host and the models come from the configuration file
//! (see [`gleaner::config`]).

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use chrono::{Days, Local, NaiveDate};
use clap::{builder::ArgAction, CommandFactory, Parser};
use console::style;
use gleaner::{
  config::Config,
  enrich::{Enricher, Outcome},
  error::GleanerError,
  extract::extract_papers,
  mail::{DigestMessage, Maildir},
  prelude::*,
  render::write_markdown,
};
use tracing::{debug, trace};
use tracing_subscriber::EnvFilter;

pub mod commands;
pub mod error;

use crate::{commands::*, error::*};

/// Prefix for information messages
static INFO_PREFIX: &str = "ℹ ";
/// Prefix for success messages
static SUCCESS_PREFIX: &str = "✓ ";
/// Prefix for warning messages
static WARNING_PREFIX: &str = "⚠️ ";
/// Prefix for error messages
static ERROR_PREFIX: &str = "✗ ";

/// Command line interface configuration and argument parsing
#[derive(Parser)]
#[command(author, version, about = "Turn the daily arXiv digest email into a categorized reading list")]
pub struct Cli {
  /// Verbose mode (-v, -vv, -vvv) for different levels of logging detail
  #[arg(
        short,
        long,
        action = ArgAction::Count,
        help = "Increase logging verbosity"
    )]
  verbose: u8,

  /// Fetch today's newest digest from the maildir and save it as XML
  #[arg(long)]
  fetch_email: bool,

  /// Parse the saved digest into paper records (XML -> JSON)
  #[arg(long)]
  extract_data: bool,

  /// Classify the papers in the record file with the local model
  #[arg(long)]
  analyze_data: bool,

  /// Render the record file as a Markdown document
  #[arg(long)]
  generate_md: bool,

  /// Run every stage (fetch -> extract -> analyze -> render)
  #[arg(long)]
  all: bool,

  /// Use this digest instead of fetching one: `.xml`, `.json`, or a path without extension
  #[arg(long)]
  file: Option<PathBuf>,

  /// Also translate abstracts to Chinese during analysis
  #[arg(long)]
  translate: bool,

  /// Configuration file. Defaults to the platform configuration directory.
  #[arg(long, short)]
  config: Option<PathBuf>,

  /// Directory for the rendered document, overriding the configuration
  #[arg(long, short)]
  output: Option<PathBuf>,
}

impl Cli {
  /// Turns `--all` into the individual stage flags.
  fn expand_all(&mut self) {
    if self.all {
      self.fetch_email = true;
      self.extract_data = true;
      self.analyze_data = true;
      self.generate_md = true;
    }
  }

  /// Whether any stage was requested.
  fn has_stage(&self) -> bool {
    self.fetch_email || self.extract_data || self.analyze_data || self.generate_md
  }

  /// Loads the configuration named on the command line, or the default one.
  fn load_config(&self) -> Result<Config> {
    let config = match &self.config {
      Some(path) => Config::load(path)?,
      None => Config::load_or_default()?,
    };
    Ok(match &self.output {
      Some(output) => config.with_output_dir(output),
      None => config,
    })
  }
}

/// Configures the logging system based on the verbosity level
///
/// # Arguments
///
/// * `verbosity` - Number of times the verbose flag was used
///
/// The verbosity levels are:
/// - 0: error (default)
/// - 1: warn
/// - 2: info
/// - 3: debug
/// - 4+: trace
fn setup_logging(verbosity: u8) {
  let filter = match verbosity {
    0 => "error",
    1 => "warn",
    2 => "info",
    3 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_file(true)
    .with_line_number(true)
    .with_thread_ids(true)
    .with_target(true)
    .init();
}

/// Entry point for the gleaner CLI application
///
/// Runs the requested stages in pipeline order. Each stage hands its output file to the next one;
/// when a stage has nothing to hand over, the stages after it report that and do nothing.
///
/// # Errors
///
/// Only problems that prevent the pipeline from starting are returned, such as an explicitly
/// named configuration file that is missing or invalid.
#[tokio::main]
async fn main() -> Result<()> {
  let mut cli = Cli::parse();
  cli.expand_all();

  if !cli.has_stage() {
    Cli::command().print_help()?;
    return Ok(());
  }

  setup_logging(cli.verbose);
  let config = cli.load_config()?;
  trace!("Using configuration: {config:?}");

  let today = Local::now().date_naive();
  let mut targets = cli.file.as_deref().map(Targets::from_file).unwrap_or_default();
  debug!("Starting with {targets:?}");

  if cli.fetch_email {
    if let Some(base) = report(fetch(&config, today)).flatten() {
      targets = Targets::from_base(base);
    }
  }

  if cli.extract_data {
    match &targets.base {
      Some(base) => targets.json = report(extract(base)).or(targets.json.take()),
      None => skip("Cannot extract: no digest file was given and none was fetched."),
    }
  }

  if cli.analyze_data {
    match targets.json_path() {
      Some(json) => {
        report(analyze(&config, &json, cli.translate).await);
      },
      None => skip("Cannot analyze: no record file found."),
    }
  }

  if cli.generate_md {
    match targets.json_path() {
      Some(json) => {
        report(generate(&config, &json, today));
      },
      None => skip("Cannot generate Markdown: no record file found."),
    }
  }

  Ok(())
}
