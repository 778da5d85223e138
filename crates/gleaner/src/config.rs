//! Runtime configuration.
//!
//! Everything that used to be a hard-coded path or host lives here and is handed to the
//! components that need it. The file is TOML:
//!
//! ```toml
//! maildir           = "/home/me/Mail"
//! folder            = "arxiv"
//! downloads_dir     = "./downloads"
//! output_dir        = "/home/me/Documents/arxiv"
//! ollama_host       = "http://localhost:11434"
//! relevance_model   = "deepseek-r1:8b"
//! translation_model = "deepseek-r1:14b"
//! timeout_secs      = 300
//! ```
//!
//! Every key is optional; missing keys take the values of [`Config::default`].

use super::*;

/// Paths, backend address and models used by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Root of the local maildir holding the digests
  pub maildir:           PathBuf,
  /// Maildir folder the digests are filed into
  pub folder:            String,
  /// Where fetched digests and extracted record files go
  pub downloads_dir:     PathBuf,
  /// Where rendered Markdown documents go
  pub output_dir:        PathBuf,
  /// Base URL of the Ollama server
  pub ollama_host:       String,
  /// Model used for relevance analysis
  pub relevance_model:   String,
  /// Model used for abstract translation
  pub translation_model: String,
  /// Per-request timeout in seconds
  pub timeout_secs:      u64,
}

impl Default for Config {
  fn default() -> Self {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    Self {
      maildir:           home.join("Maildir"),
      folder:            "arxiv".to_string(),
      downloads_dir:     PathBuf::from("downloads"),
      output_dir:        dirs::document_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gleaner"),
      ollama_host:       llm::DEFAULT_HOST.to_string(),
      relevance_model:   llm::Model::DeepseekR1p8b.to_string(),
      translation_model: llm::Model::DeepseekR1p14b.to_string(),
      timeout_secs:      llm::DEFAULT_TIMEOUT.as_secs(),
    }
  }
}

impl Config {
  /// Default location of the configuration file.
  ///
  /// - On Linux: `~/.config/gleaner/config.toml`
  /// - On macOS: `~/Library/Application Support/gleaner/config.toml`
  /// - On Windows: `%APPDATA%\gleaner\config.toml`
  pub fn default_path() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("gleaner").join("config.toml")
  }

  /// Reads the configuration at `path`.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if !path.exists() {
      return Err(GleanerError::NotFound(path.to_path_buf()));
    }
    let config: Config = toml::from_str(&std::fs::read_to_string(path)?)?;
    config.validate()?;
    debug!("Loaded configuration from {}", path.display());
    Ok(config)
  }

  /// Reads the configuration at the default path, or returns defaults if there is none.
  pub fn load_or_default() -> Result<Self> {
    let path = Self::default_path();
    if path.exists() {
      Self::load(path)
    } else {
      debug!("No configuration at {}, using defaults", path.display());
      Ok(Self::default())
    }
  }

  /// Writes the configuration to `path` as TOML.
  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(self)?)?;
    Ok(())
  }

  /// Rejects values that cannot work.
  pub fn validate(&self) -> Result<()> {
    if self.timeout_secs == 0 {
      return Err(GleanerError::Config("timeout_secs must be greater than zero".to_string()));
    }
    Url::parse(&self.ollama_host).map_err(|e| {
      GleanerError::Config(format!("ollama_host {:?} is not a valid URL: {e}", self.ollama_host))
    })?;
    self.relevance_model.parse::<llm::Model>()?;
    self.translation_model.parse::<llm::Model>()?;
    Ok(())
  }

  /// Sets the maildir root.
  pub fn with_maildir(mut self, maildir: &Path) -> Self {
    self.maildir = maildir.to_path_buf();
    self
  }

  /// Sets the maildir folder holding the digests.
  pub fn with_folder(mut self, folder: &str) -> Self {
    self.folder = folder.to_string();
    self
  }

  /// Sets the directory for fetched digests and record files.
  pub fn with_downloads_dir(mut self, downloads_dir: &Path) -> Self {
    self.downloads_dir = downloads_dir.to_path_buf();
    self
  }

  /// Sets the directory for rendered documents.
  pub fn with_output_dir(mut self, output_dir: &Path) -> Self {
    self.output_dir = output_dir.to_path_buf();
    self
  }

  /// Sets the Ollama server address.
  pub fn with_ollama_host(mut self, host: &str) -> Self {
    self.ollama_host = host.to_string();
    self
  }

  /// The per-request timeout.
  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }

  /// Client for relevance analysis.
  pub fn relevance_client(&self) -> Result<llm::OllamaClient> {
    Ok(
      llm::OllamaClient::new()
        .with_host(&self.ollama_host)
        .with_model(self.relevance_model.parse()?)
        .with_timeout(self.timeout()),
    )
  }

  /// Client for abstract translation.
  pub fn translation_client(&self) -> Result<llm::OllamaClient> {
    Ok(
      llm::OllamaClient::new()
        .with_host(&self.ollama_host)
        .with_model(self.translation_model.parse()?)
        .with_timeout(self.timeout()),
    )
  }

  /// Path of the rendered document for `date`.
  pub fn markdown_path(&self, date: NaiveDate) -> PathBuf {
    self.output_dir.join(render::markdown_file_name(date))
  }
}
