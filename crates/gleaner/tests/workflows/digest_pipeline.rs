use super::*;

fn relevance_answer(topic: &str, keywords: &str, keywords_cn: &str) -> String {
  format!(
    "<think>\nThe abstract mentions \\sim values and {topic}.\n</think>\n\n```json\n{{\n  \"Type\": \
     \"{topic}\",\n  \"keywords\": {keywords},\n  \"keywords_CN\": {keywords_cn}\n}}\n```"
  )
}

fn script() -> Vec<(&'static str, String)> {
  vec![
    (
      "Abstract_CN\": \"中文翻译内容",
      "```json\n{\"Abstract_CN\": \"我们给出了多环芳烃发射的红外光谱。\", \"keywords_CN\": \
       [\"多环芳烃\"]}\n```"
        .to_string(),
    ),
    (
      "PAH emission",
      relevance_answer("ISM", r#"["PAH", "diffuse ISM"]"#, r#"["多环芳烃", "弥漫星际介质"]"#),
    ),
    (
      "Bright-rimmed clouds",
      relevance_answer("StarFormation", r#"["triggered star formation"]"#, r#"["触发式恒星形成"]"#),
    ),
    (
      "convergence maps",
      "```json\n{\"Type\": \"Other\", \"keywords\": [\"lensing\"\n```".to_string(),
    ),
  ]
}

#[tokio::test]
async fn test_extract_enrich_render() -> TestResult<()> {
  let dir = tempdir()?;
  let json = dir.path().join("astro-ph_20240116.json");

  extract_papers(DIGEST).save(&json)?;
  let mut store = RecordStore::load(&json)?;

  let backend = Scripted::new(script());
  let enricher = Enricher::new(&backend);
  let mut outcomes = Vec::new();
  for paper in store.iter_mut() {
    outcomes.push(enricher.analyze(paper).await);
  }

  assert_eq!(outcomes[0], Outcome::Enriched);
  assert_eq!(outcomes[1], Outcome::Enriched);
  assert_eq!(outcomes[2], Outcome::Skipped);
  assert!(matches!(&outcomes[3], Outcome::Malformed { raw, .. } if raw.contains("lensing")));
  assert_eq!(backend.calls().len(), 3);

  let pah = &store[0];
  assert_eq!(pah.topic, Some(Topic::Ism));
  assert_eq!(pah.keywords.as_deref(), Some(&["PAH".to_string(), "diffuse ISM".to_string()][..]));
  assert!(pah.summary.as_deref().unwrap().contains("\\sim values"));
  assert!(pah.error.is_none());

  let withdrawn = &store[2];
  assert!(withdrawn.topic.is_none() && withdrawn.error.is_none());

  let lensing = &store[3];
  assert!(lensing.topic.is_none());
  assert!(lensing.error.as_deref().unwrap().starts_with("Failed to parse JSON response"));
  assert!(lensing.title.as_deref().unwrap().starts_with("Weak lensing mass maps"));

  assert_eq!(enricher.translate(&mut store[0]).await, Outcome::Enriched);
  assert_eq!(store[0].abstract_cn.as_deref(), Some("我们给出了多环芳烃发射的红外光谱。"));
  assert_eq!(store[0].keywords_cn.as_ref().map(Vec::len), Some(2));

  store.save(&json)?;
  let store = RecordStore::load(&json)?;
  let doc = render_markdown(&store);

  let ism = doc.find("# Type: ISM").unwrap();
  let star = doc.find("# Type: StarFormation").unwrap();
  let unknown = doc.find("# Type: Unknown").unwrap();
  assert!(ism < star && star < unknown);
  assert!(!doc.contains("# Type: Other"));
  assert!(doc.contains("Paper Link: https://arxiv.org/abs/2401.08001 \n"));
  assert!(doc.contains("#PAH #diffuse_ISM \n **多环芳烃**   **弥漫星际介质**  \n"));
  assert!(doc.contains("interstellar medium \\ find a 3.3 micron"));
  assert!(doc.contains("**Abstract (CN)**: 我们给出了多环芳烃发射的红外光谱。"));
  assert!(doc.contains("**Abstract**: ---\n"));
  assert!(doc.contains("**Error**: Failed to parse JSON response"));
  Ok(())
}

#[tokio::test]
async fn test_backend_failure_is_recorded() -> TestResult<()> {
  let mut store = extract_papers(DIGEST);
  let backend = Scripted::new(Vec::new());
  let enricher = Enricher::new(&backend);

  for paper in store.iter_mut() {
    enricher.analyze(paper).await;
  }

  for (index, paper) in store.iter().enumerate() {
    if index == 2 {
      assert!(paper.error.is_none());
    } else {
      assert_eq!(paper.error.as_deref(), Some("The request timed out"));
      assert!(paper.keywords.is_none());
    }
  }
  Ok(())
}
