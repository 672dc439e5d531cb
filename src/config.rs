use crate::ai_provider::AiProvider;
use crate::error::{AssistError, Result};
use reading_companion_common::{LexileRange, DEFAULT_MAX_CONTEXT_CHARS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Login page of the reading platform
    pub base_url: String,
    /// Only read from the environment, never written to disk
    #[serde(skip)]
    pub username: Option<String>,
    #[serde(skip)]
    pub password: Option<String>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://scholasticlearningzone.com".into(),
            username: None,
            password: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub chromedriver_path: Option<PathBuf>,
    pub chrome_binary: Option<PathBuf>,
    pub headless: bool,
    /// Port the spawned chromedriver listens on
    pub port: u16,
    pub username_selector: String,
    pub password_selector: String,
    pub lexile_min_selector: String,
    pub lexile_max_selector: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            chromedriver_path: None,
            chrome_binary: None,
            headless: false,
            port: 9515,
            username_selector: "input[name='username'], input[formcontrolname='username']".into(),
            password_selector:
                "input[type='password'], input[name='password'], input[formcontrolname='password']"
                    .into(),
            lexile_min_selector: "input[formcontrolname='lexileMin'], input[name='lexileMin']".into(),
            lexile_max_selector: "input[formcontrolname='lexileMax'], input[name='lexileMax']".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// tesseract executable
    pub command: String,
    /// tesseract language code(s), e.g. `eng` or `eng+spa`
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: "tesseract".into(),
            language: "eng".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: AiProvider,
    /// Falls back to the provider's default endpoint
    pub base_url: Option<String>,
    /// Falls back to the provider's default model
    pub model: Option<String>,
    pub temperature: f32,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
    pub max_context_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: AiProvider::OpenAi,
            base_url: None,
            model: None,
            temperature: 0.2,
            api_key: None,
            timeout_seconds: 60,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
        }
    }
}

impl LlmConfig {
    pub fn base_url(&self) -> String {
        self.base_url
            .as_deref()
            .unwrap_or(self.provider.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }

    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or(self.provider.default_model())
    }

    pub fn get_api_key(&self) -> Result<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(AssistError::MissingApiKey)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reader: ReaderConfig,
    pub browser: BrowserConfig,
    pub lexile: Option<LexileRange>,
    pub ocr: OcrConfig,
    pub llm: LlmConfig,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reader: ReaderConfig::default(),
            browser: BrowserConfig::default(),
            lexile: None,
            ocr: OcrConfig::default(),
            llm: LlmConfig::default(),
            log_level: "info".into(),
        }
    }
}

impl Config {
    /// Load `.env`, the JSON settings file (if present) and environment overrides.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Read a settings file; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| AssistError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("reading-companion").join("config.json"))
    }

    /// Apply environment overrides. `lookup` is `std::env::var` in production.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get("READER_BASE_URL") {
            self.reader.base_url = url;
        }
        if let Some(username) = get("READER_USERNAME") {
            self.reader.username = Some(username);
        }
        if let Some(password) = get("READER_PASSWORD") {
            self.reader.password = Some(password);
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = get("LLM_BASE_URL") {
            self.llm.base_url = Some(url);
        }
        if let Some(model) = get("LLM_MODEL") {
            self.llm.model = Some(model);
        }
        if let Some(path) = get("CHROMEDRIVER_PATH") {
            self.browser.chromedriver_path = Some(PathBuf::from(path));
        }
        if let Some(path) = get("CHROME_BINARY") {
            self.browser.chrome_binary = Some(PathBuf::from(path));
        }
        if let Some(cmd) = get("TESSERACT_CMD") {
            self.ocr.command = cmd;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(range) = &self.lexile {
            range.validate()?;
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(AssistError::Config(format!(
                "llm.temperature must be within 0..=2, got {}",
                self.llm.temperature
            )));
        }
        if self.llm.model().trim().is_empty() {
            return Err(AssistError::Config("llm.model must not be empty".into()));
        }
        if self.reader.base_url.trim().is_empty() {
            return Err(AssistError::Config("reader.base_url must not be empty".into()));
        }
        Ok(())
    }

    /// Human-readable settings with secrets redacted.
    pub fn summary_lines(&self) -> Vec<String> {
        let set = |present: bool| if present { "set" } else { "not set" };
        vec![
            format!("  Reader URL: {}", self.reader.base_url),
            format!("  Reader login: {}", set(self.reader.username.is_some() && self.reader.password.is_some())),
            format!("  LLM provider: {}", self.llm.provider.name()),
            format!("  LLM endpoint: {}", self.llm.base_url()),
            format!("  LLM model: {}", self.llm.model()),
            format!("  LLM temperature: {}", self.llm.temperature),
            format!("  API key: {}", set(self.llm.api_key.is_some())),
            format!("  OCR: {} (lang {})", self.ocr.command, self.ocr.language),
            format!(
                "  Lexile: {}",
                self.lexile
                    .map(|r| format!("{}L-{}L", r.min, r.max))
                    .unwrap_or_else(|| "not set".into())
            ),
        ]
    }
}
