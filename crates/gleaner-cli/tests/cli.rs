//! Integration tests for the gleaner CLI stages.
//!
//! Every test writes its own configuration into a temporary directory so nothing outside of it is
//! read or written. Tests run in serial since they all spawn the binary.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use gleaner::{mail::DigestMessage, paper::PaperRecord, store::RecordStore};
use predicates::prelude::*;
use serial_test::serial;
use tempfile::tempdir;

const DIGEST: &str = "Send any comments regarding submissions directly to submitter.
------------------------------------------------------------------------------
\\\\
arXiv:2401.00001
Date: Tue, 16 Jan 2024 10:00:00 GMT   (12kb)

Title: Dust grains in molecular clouds
Authors: A. Smith, B. Jones
Categories: astro-ph.GA
\\\\
  We study dust grains.
\\\\ ( https://arxiv.org/abs/2401.00001 ,  12kb)
------------------------------------------------------------------------------
\\\\
arXiv:2401.00002
Date: Tue, 16 Jan 2024 11:00:00 GMT   (20kb)

Title: Cosmic shear
Authors: C. Wu
Categories: astro-ph.CO
\\\\
  We measure shear.
\\\\ ( https://arxiv.org/abs/2401.00002 ,  20kb)
%%--%%--%%--%%--%%--%%--%%--%%--%%--%%--%%--%%--%%--%%--%%--%%--%%--%%--%%--%%--
";

// Helper function to create a clean command instance
fn gleaner() -> Command { Command::cargo_bin("gleaner").unwrap() }

// Helper to write a configuration pointing everything into `dir`
fn temp_config(dir: &Path) -> PathBuf {
  let config = dir.join("config.toml");
  std::fs::write(
    &config,
    format!(
      "maildir = {:?}\nfolder = \"arxiv\"\ndownloads_dir = {:?}\noutput_dir = {:?}\nollama_host = \
       \"http://127.0.0.1:9\"\ntimeout_secs = 5\n",
      dir.join("Maildir"),
      dir.join("downloads"),
      dir.join("notes"),
    ),
  )
  .unwrap();
  config
}

fn markdown_files(dir: &Path) -> Vec<PathBuf> {
  match std::fs::read_dir(dir) {
    Ok(entries) => entries
      .map(|entry| entry.unwrap().path())
      .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
      .collect(),
    Err(_) => Vec::new(),
  }
}

#[test]
#[serial]
fn test_no_stage_prints_help() {
  gleaner()
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"))
    .stdout(predicate::str::contains("--fetch-email"));
}

#[test]
#[serial]
fn test_missing_config_is_an_error() {
  let dir = tempdir().unwrap();
  gleaner()
    .arg("--generate-md")
    .arg("--config")
    .arg(dir.path().join("missing.toml"))
    .assert()
    .failure();
}

#[test]
#[serial]
fn test_extract_from_xml() {
  let dir = tempdir().unwrap();
  let config = temp_config(dir.path());
  let xml = dir.path().join("downloads").join("digest.xml");
  DigestMessage { subject: "astro-ph daily".into(), body: DIGEST.into(), ..Default::default() }
    .save(&xml)
    .unwrap();

  gleaner()
    .arg("--extract-data")
    .arg("--file")
    .arg(&xml)
    .arg("--config")
    .arg(&config)
    .assert()
    .success()
    .stdout(predicate::str::contains("Saved 2 papers"));

  let store = RecordStore::load(dir.path().join("downloads").join("digest.json")).unwrap();
  assert_eq!(store[0].id.as_deref(), Some("2401.00001"));
  assert_eq!(store[1].title.as_deref(), Some("Cosmic shear"));
}

#[test]
#[serial]
fn test_extract_missing_file() {
  let dir = tempdir().unwrap();
  let config = temp_config(dir.path());

  gleaner()
    .arg("--extract-data")
    .arg("--file")
    .arg(dir.path().join("nope.xml"))
    .arg("--config")
    .arg(&config)
    .assert()
    .success()
    .stdout(predicate::str::contains("File not found"));
}

#[test]
#[serial]
fn test_stages_without_input_are_skipped() {
  let dir = tempdir().unwrap();
  let config = temp_config(dir.path());

  gleaner()
    .arg("--extract-data")
    .arg("--analyze-data")
    .arg("--generate-md")
    .arg("--config")
    .arg(&config)
    .assert()
    .success()
    .stdout(predicate::str::contains("Cannot extract"))
    .stdout(predicate::str::contains("Cannot analyze"))
    .stdout(predicate::str::contains("Cannot generate Markdown"));

  assert!(markdown_files(&dir.path().join("notes")).is_empty());
}

#[test]
#[serial]
fn test_analyze_skips_papers_without_abstract() {
  let dir = tempdir().unwrap();
  let config = temp_config(dir.path());
  let json = dir.path().join("records.json");
  let papers = RecordStore::from(vec![
    PaperRecord {
      id: Some("2401.00003".into()),
      abstract_text: Some("---".into()),
      ..Default::default()
    },
    PaperRecord { id: Some("2401.00004".into()), ..Default::default() },
  ]);
  papers.save(&json).unwrap();

  // Nothing listens on the configured host, so any request would fail loudly.
  gleaner()
    .arg("--analyze-data")
    .arg("--file")
    .arg(&json)
    .arg("--config")
    .arg(&config)
    .assert()
    .success()
    .stdout(predicate::str::contains("2401.00003 skipped"))
    .stdout(predicate::str::contains("Classified 0/2 papers"));

  assert_eq!(RecordStore::load(&json).unwrap(), papers);
}

#[test]
#[serial]
fn test_generate_markdown() {
  let dir = tempdir().unwrap();
  let config = temp_config(dir.path());
  let json = dir.path().join("records.json");
  RecordStore::from(vec![PaperRecord {
    id: Some("2401.00001".into()),
    title: Some("Dust grains".into()),
    ..Default::default()
  }])
  .save(&json)
  .unwrap();
  let output = dir.path().join("elsewhere");

  gleaner()
    .arg("--generate-md")
    .arg("--file")
    .arg(&json)
    .arg("--config")
    .arg(&config)
    .arg("--output")
    .arg(&output)
    .assert()
    .success()
    .stdout(predicate::str::contains("Markdown written to"));

  let files = markdown_files(&output);
  assert_eq!(files.len(), 1);
  let name = files[0].file_name().unwrap().to_string_lossy().to_string();
  assert!(name.starts_with("arxiv_"));
  let doc = std::fs::read_to_string(&files[0]).unwrap();
  assert!(doc.starts_with("# Type: Unknown"));
  assert!(doc.contains("### **Dust grains**"));
}

#[test]
#[serial]
fn test_fetch_and_extract() {
  let dir = tempdir().unwrap();
  let config = temp_config(dir.path());
  let new = dir.path().join("Maildir").join("arxiv").join("new");
  std::fs::create_dir_all(&new).unwrap();
  let message = format!(
    "From: no-reply@arxiv.org\r\nSubject: astro-ph daily: 2 new\r\nDate: {}\r\nContent-Type: \
     text/plain\r\n\r\n{}",
    chrono::Local::now().to_rfc2822(),
    DIGEST.replace('\n', "\r\n")
  );
  std::fs::write(new.join("1705400000.M1P1.host"), message).unwrap();

  gleaner()
    .arg("--fetch-email")
    .arg("--extract-data")
    .arg("--config")
    .arg(&config)
    .assert()
    .success()
    .stdout(predicate::str::contains("Digest saved as"))
    .stdout(predicate::str::contains("Saved 2 papers"));

  let downloads: Vec<_> = std::fs::read_dir(dir.path().join("downloads"))
    .unwrap()
    .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
    .collect();
  assert_eq!(downloads.len(), 2);
  assert!(downloads.iter().all(|name| name.starts_with("astro-ph daily_ 2 new_")));
}

#[test]
#[serial]
fn test_fetch_without_mail() {
  let dir = tempdir().unwrap();
  let config = temp_config(dir.path());
  std::fs::create_dir_all(dir.path().join("Maildir").join("arxiv").join("cur")).unwrap();

  gleaner()
    .arg("--fetch-email")
    .arg("--extract-data")
    .arg("--config")
    .arg(&config)
    .assert()
    .success()
    .stdout(predicate::str::contains("No digest from"))
    .stdout(predicate::str::contains("Cannot extract"));
}

#[test]
#[serial]
fn test_translate_only_after_classification() {
  let dir = tempdir().unwrap();
  let config = temp_config(dir.path());
  let json = dir.path().join("records.json");
  RecordStore::from(vec![PaperRecord {
    id: Some("2401.00005".into()),
    abstract_text: Some("We study jets.".into()),
    ..Default::default()
  }])
  .save(&json)
  .unwrap();

  // The configured host refuses connections, so classification fails.
  let output = gleaner()
    .arg("--analyze-data")
    .arg("--translate")
    .arg("--file")
    .arg(&json)
    .arg("--config")
    .arg(&config)
    .assert()
    .success()
    .stdout(predicate::str::contains("Classified 0/1 papers"))
    .get_output()
    .stdout
    .clone();
  let stdout = String::from_utf8(output).unwrap();
  assert_eq!(stdout.matches("2401.00005 ").count(), 1);

  let store = RecordStore::load(&json).unwrap();
  assert!(store[0].error.as_deref().unwrap().starts_with("Request failed"));
  assert!(store[0].abstract_cn.is_none());
  assert!(store[0].keywords_cn.is_none());
}
