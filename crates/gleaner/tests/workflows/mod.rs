use super::*;

mod digest_pipeline;

#[test]
fn test_fixture_extraction() {
  let store = extract_papers(DIGEST);
  assert_eq!(store.len(), 4);

  let pah = &store[0];
  assert_eq!(pah.id.as_deref(), Some("2401.08001"));
  assert_eq!(pah.date.as_deref(), Some("Tue, 16 Jan 2024 08:12:44 GMT"));
  assert_eq!(
    pah.title.as_deref(),
    Some("Polycyclic aromatic hydrocarbons in the diffuse interstellar medium")
  );
  assert_eq!(pah.authors.as_deref(), Some("L. Chen, M. Rossi and K. Tanaka"));
  assert!(pah.abstract_text.as_deref().unwrap().starts_with("We present infrared spectroscopy"));
  assert!(pah.abstract_text.as_deref().unwrap().ends_with("in every cloud."));

  assert!(store[2].has_sentinel_abstract());
  assert_eq!(store[3].id.as_deref(), Some("2401.08004"));
}

#[test]
fn test_digest_artifact_keeps_body() -> TestResult<()> {
  let dir = tempdir()?;
  let message = DigestMessage {
    subject: "astro-ph daily Title/author listing".into(),
    from:    "no-reply@arxiv.org".into(),
    date:    "Tue, 16 Jan 2024 20:00:02 -0500".into(),
    body:    DIGEST.to_string(),
  };
  let path = dir.path().join("digest.xml");
  message.save(&path)?;

  let loaded = DigestMessage::load(&path)?;
  assert_eq!(loaded.subject, message.subject);
  assert_eq!(extract_papers(&loaded.body), extract_papers(DIGEST));
  Ok(())
}
