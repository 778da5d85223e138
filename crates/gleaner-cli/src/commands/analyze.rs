//! Module for the `--analyze-data` stage

use super::*;

/// Prints the outcome for one paper.
fn print_outcome(paper: &PaperRecord, outcome: &Outcome) {
  let id = paper.id.as_deref().unwrap_or("?");
  match outcome {
    Outcome::Enriched => println!(
      "{} {} {}",
      style(SUCCESS_PREFIX).green(),
      style(id).yellow(),
      style(paper.topic_label()).cyan()
    ),
    Outcome::Skipped =>
      println!("{} {} skipped: no abstract", style(INFO_PREFIX).cyan(), style(id).yellow()),
    Outcome::Malformed { message, .. } | Outcome::Failed(message) =>
      println!("{} {} {}", style(ERROR_PREFIX).red(), style(id).yellow(), style(message).red()),
  }
}

/// Classifies every paper in the record file at `json` and saves the file again.
///
/// With `translate`, the abstracts of successfully classified papers are also translated with
/// the translation model. Papers are handled one after another; failures are stored on the paper
/// and do not stop the run.
pub async fn analyze(config: &Config, json: &Path, translate: bool) -> gleaner::error::Result<()> {
  let mut store = RecordStore::load(json)?;
  println!(
    "{} Analyzing {} papers with {} at {}",
    style(INFO_PREFIX).cyan(),
    style(store.len()).cyan(),
    style(&config.relevance_model).yellow(),
    style(&config.ollama_host).yellow()
  );

  let relevance_backend = config.relevance_client()?;
  let relevance = Enricher::new(&relevance_backend);
  let translation_backend = config.translation_client()?;
  let translation = Enricher::new(&translation_backend);

  let mut enriched = 0;
  for paper in store.iter_mut() {
    let outcome = relevance.analyze(paper).await;
    print_outcome(paper, &outcome);
    if outcome == Outcome::Enriched {
      enriched += 1;
    }

    if translate && outcome == Outcome::Enriched {
      let outcome = translation.translate(paper).await;
      if outcome != Outcome::Enriched {
        print_outcome(paper, &outcome);
      }
    }
  }

  store.save(json)?;
  println!(
    "{} Classified {}/{} papers, saved to {}",
    style(SUCCESS_PREFIX).green(),
    style(enriched).cyan(),
    style(store.len()).cyan(),
    style(json.display()).yellow()
  );
  Ok(())
}
