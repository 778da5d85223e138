//! Client for a locally running Ollama server.
//!
//! The enricher only needs "prompt in, text out", which is what the [`Backend`] trait expresses.
//! [`OllamaClient`] implements it on top of Ollama's `/api/generate` endpoint with streaming
//! disabled, so every call blocks until the whole answer is available or the timeout expires.
//!
//! # Examples
//!
//! ```no_run
//! use gleaner::llm::{Backend, Model, OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new()
//!   .with_host("http://localhost:11434")
//!   .with_model(Model::DeepseekR1p8b);
//!
//! let answer = client.generate("What is the interstellar medium?").await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

use super::*;

/// Default address of a local Ollama server.
pub const DEFAULT_HOST: &str = "http://localhost:11434";

/// Default per-request timeout. Reasoning models on consumer hardware are slow.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Anything that turns a prompt into a complete text answer.
#[async_trait]
pub trait Backend: Send + Sync {
  /// Sends `prompt` and waits for the full answer.
  ///
  /// # Errors
  ///
  /// Implementations report transport problems as [`GleanerError::Network`], an expired timeout
  /// as [`GleanerError::Timeout`] and an empty answer as [`GleanerError::EmptyResponse`].
  async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Path of the non-chat completion endpoint.
pub const GENERATE_PATH: &str = "/api/generate";

/// Models known to work with the prompts in [`crate::enrich`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Model {
  /// DeepSeek R1 distilled 8B, used for relevance analysis
  DeepseekR1p8b,
  /// DeepSeek R1 distilled 14B, used for translation
  DeepseekR1p14b,
  /// Llama 3.2 3B
  Llama3p2c3b,
  /// Any other model tag the server knows about
  Custom(String),
}

impl Display for Model {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Model::DeepseekR1p8b => write!(f, "deepseek-r1:8b"),
      Model::DeepseekR1p14b => write!(f, "deepseek-r1:14b"),
      Model::Llama3p2c3b => write!(f, "llama3.2:3b"),
      Model::Custom(tag) => write!(f, "{tag}"),
    }
  }
}

impl FromStr for Model {
  type Err = GleanerError;

  fn from_str(s: &str) -> Result<Self> {
    let tag = s.trim();
    if tag.is_empty() {
      return Err(GleanerError::Config("model tag must not be empty".to_string()));
    }
    Ok(match tag {
      "deepseek-r1:8b" => Model::DeepseekR1p8b,
      "deepseek-r1:14b" => Model::DeepseekR1p14b,
      "llama3.2:3b" => Model::Llama3p2c3b,
      other => Model::Custom(other.to_string()),
    })
  }
}

/// Body of a `/api/generate` request.
#[derive(Debug, Serialize)]
pub struct GenerateRequest<'a> {
  /// Model tag
  pub model:  String,
  /// The complete instruction
  pub prompt: &'a str,
  /// Always `false`: answers are read in one piece
  pub stream: bool,
}

/// Body of a non-streaming `/api/generate` response.
///
/// Only `response` is relied upon; the timing fields are logged when present.
#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
  /// Name of the model used
  #[serde(default)]
  pub model:          String,
  /// Timestamp of response creation
  #[serde(default)]
  pub created_at:     String,
  /// Generated text
  #[serde(default)]
  pub response:       String,
  /// Whether generation is complete
  #[serde(default)]
  pub done:           bool,
  /// Reason for completion
  #[serde(default)]
  pub done_reason:    Option<String>,
  /// Total processing time in nanoseconds
  #[serde(default)]
  pub total_duration: Option<u64>,
  /// Number of generated tokens
  #[serde(default)]
  pub eval_count:     Option<u64>,
}

/// Request builder and [`Backend`] for an Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
  /// Full URL of the generate endpoint
  url:     Url,
  /// Model to run
  model:   Model,
  /// Per-request timeout
  timeout: Duration,
}

impl Default for OllamaClient {
  fn default() -> Self {
    Self {
      url:     generate_url(DEFAULT_HOST),
      model:   Model::DeepseekR1p8b,
      timeout: DEFAULT_TIMEOUT,
    }
  }
}

/// Builds the generate endpoint for `host`, falling back to the local default server.
fn generate_url(host: &str) -> Url {
  let fallback = || Url::parse(DEFAULT_HOST).and_then(|url| url.join(GENERATE_PATH)).unwrap();

  match Url::parse(host) {
    Ok(base) => base.join(GENERATE_PATH).unwrap_or_else(|_| {
      warn!("Failed to set endpoint on {host}, using {DEFAULT_HOST}{GENERATE_PATH}");
      fallback()
    }),
    Err(e) => {
      warn!("Invalid Ollama host {host:?} ({e}), using {DEFAULT_HOST}");
      fallback()
    },
  }
}

impl OllamaClient {
  /// Creates a client for the local server with default model and timeout.
  pub fn new() -> Self { Self::default() }

  /// Sets the server address, e.g. `http://gpu-box:11434`.
  pub fn with_host(mut self, host: &str) -> Self {
    self.url = generate_url(host);
    self
  }

  /// Sets the model to run.
  pub fn with_model(mut self, model: Model) -> Self {
    self.model = model;
    self
  }

  /// Sets the per-request timeout.
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  /// The generate endpoint this client posts to.
  pub fn url(&self) -> &Url { &self.url }

  /// The configured model.
  pub fn model(&self) -> &Model { &self.model }

  /// Sends one prompt and returns the decoded response body.
  ///
  /// # Errors
  ///
  /// This function will return an error if:
  /// - The server cannot be reached or answers with a non-success status
  /// - The timeout expires
  /// - The response body is not the expected JSON
  pub async fn send(&self, prompt: &str) -> Result<GenerateResponse> {
    let request = GenerateRequest { model: self.model.to_string(), prompt, stream: false };
    debug!("Sending {} prompt characters to {} ({})", prompt.len(), self.url, self.model);

    let client = reqwest::Client::builder().timeout(self.timeout).build()?;
    let response = client
      .post(self.url.clone())
      .json(&request)
      .send()
      .await
      .and_then(reqwest::Response::error_for_status)
      .map_err(classify)?;
    let body: GenerateResponse = response.json().await.map_err(classify)?;

    trace!(
      "Model {} finished (done: {}, reason: {:?}, tokens: {:?}, duration: {:?})",
      body.model,
      body.done,
      body.done_reason,
      body.eval_count,
      body.total_duration
    );
    Ok(body)
  }
}

/// Separates timeouts from other transport errors.
fn classify(error: reqwest::Error) -> GleanerError {
  if error.is_timeout() {
    GleanerError::Timeout
  } else {
    GleanerError::Network(error)
  }
}

#[async_trait]
impl Backend for OllamaClient {
  async fn generate(&self, prompt: &str) -> Result<String> {
    let body = self.send(prompt).await?;
    if body.response.is_empty() {
      return Err(GleanerError::EmptyResponse);
    }
    Ok(body.response)
  }
}
