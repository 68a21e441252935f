//! Application configuration structures.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{LayoutRegistry, StructuredLayout, TextUsed};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Target board and crawl bounds
    #[serde(default)]
    pub board: BoardSettings,

    /// HTTP client, rate limit and retry settings
    #[serde(default)]
    pub http: HttpSettings,

    /// Diagnostics for layout drift
    #[serde(default)]
    pub debug: DebugSettings,

    /// Host and path rules
    #[serde(default)]
    pub safety: SafetySettings,

    /// Boards with a non-generic layout, merged over the built-in registry
    #[serde(default)]
    pub layouts: Vec<StructuredLayout>,

    /// Sentiment inference settings
    #[serde(default)]
    pub sentiment: SentimentSettings,

    /// Publishing sink settings
    #[serde(default)]
    pub sink: SinkSettings,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, or return defaults if the file does not exist.
    ///
    /// An unreadable or malformed file is a configuration error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(AppError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                log::warn!("Config file {:?} not found. Using defaults.", path);
                Ok(Self::default())
            }
            Err(e) => Err(AppError::config(format!(
                "failed to load {}: {e}",
                path.display()
            ))),
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.board.id == 0 {
            return Err(AppError::config("board.id must be > 0"));
        }
        url::Url::parse(&self.board.base_url).map_err(|e| {
            AppError::config(format!(
                "board.base_url '{}' is not a valid URL: {e}",
                self.board.base_url
            ))
        })?;
        self.http.fetch_config()?;
        self.safety.validate()?;
        self.layout_registry().validate()?;
        self.sentiment.validate()?;
        if self.debug.dump_html_on_empty && self.debug.dump_html_path.as_os_str().is_empty() {
            return Err(AppError::config(
                "debug.dump_html_path is empty while dump_html_on_empty is set",
            ));
        }
        Ok(())
    }

    /// Built-in layouts with configured ones layered on top.
    pub fn layout_registry(&self) -> LayoutRegistry {
        let mut registry = LayoutRegistry::with_defaults();
        for layout in &self.layouts {
            registry.register(layout.clone());
        }
        registry
    }

    /// Where to dump an empty first list page, if enabled.
    pub fn dump_path(&self) -> Option<PathBuf> {
        self.debug
            .dump_html_on_empty
            .then(|| self.debug.dump_html_path.clone())
    }
}

/// Target board and crawl bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSettings {
    /// Numeric board id, as it appears in post URLs
    #[serde(default = "defaults::board_id")]
    pub id: u32,

    /// List page URL for page 1
    #[serde(default = "defaults::board_base_url")]
    pub base_url: String,

    /// Upper bound on list pages per run
    #[serde(default = "defaults::max_list_pages")]
    pub max_list_pages: usize,

    /// Upper bound on posts per run
    #[serde(default = "defaults::max_posts_per_run")]
    pub max_posts_per_run: usize,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            id: defaults::board_id(),
            base_url: defaults::board_base_url(),
            max_list_pages: defaults::max_list_pages(),
            max_posts_per_run: defaults::max_posts_per_run(),
        }
    }
}

/// HTTP client settings as written in the config file (seconds as floats).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    #[serde(default = "defaults::timeout")]
    pub timeout_secs: f64,

    /// Fixed delay before every request
    #[serde(default = "defaults::delay")]
    pub delay_secs: f64,

    /// Upper bound of the random delay added to `delay_secs`
    #[serde(default = "defaults::jitter")]
    pub jitter_secs: f64,

    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    #[serde(default = "defaults::backoff_base")]
    pub backoff_base_secs: f64,

    #[serde(default = "defaults::backoff_max")]
    pub backoff_max_secs: f64,

    /// Upper bound of the random delay added to each backoff
    #[serde(default = "defaults::backoff_jitter")]
    pub backoff_jitter_secs: f64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            delay_secs: defaults::delay(),
            jitter_secs: defaults::jitter(),
            max_retries: defaults::max_retries(),
            backoff_base_secs: defaults::backoff_base(),
            backoff_max_secs: defaults::backoff_max(),
            backoff_jitter_secs: defaults::backoff_jitter(),
        }
    }
}

impl HttpSettings {
    /// Settings with every delay zeroed, for local servers and tests.
    pub fn without_delays() -> Self {
        Self {
            delay_secs: 0.0,
            jitter_secs: 0.0,
            backoff_base_secs: 0.0,
            backoff_max_secs: 0.0,
            backoff_jitter_secs: 0.0,
            ..Self::default()
        }
    }

    /// Convert to a validated fetcher configuration.
    pub fn fetch_config(&self) -> Result<FetchConfig> {
        let timeout = duration("http.timeout_secs", self.timeout_secs)?;
        if timeout.is_zero() {
            return Err(AppError::config("http.timeout_secs must be > 0"));
        }
        if self.user_agent.trim().is_empty() {
            return Err(AppError::config("http.user_agent is empty"));
        }

        Ok(FetchConfig {
            timeout,
            fixed_delay: duration("http.delay_secs", self.delay_secs)?,
            jitter_bound: duration("http.jitter_secs", self.jitter_secs)?,
            max_retries: self.max_retries,
            backoff_base: duration("http.backoff_base_secs", self.backoff_base_secs)?,
            backoff_cap: duration("http.backoff_max_secs", self.backoff_max_secs)?,
            backoff_jitter: duration("http.backoff_jitter_secs", self.backoff_jitter_secs)?,
            user_agent: self.user_agent.clone(),
            accept_language: defaults::accept_language(),
        })
    }
}

fn duration(name: &str, secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(AppError::config(format!(
            "{name} must be a finite number >= 0, got {secs}"
        )));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| AppError::config(format!("{name} is out of range ({secs}): {e}")))
}

/// Validated, immutable fetcher configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    timeout: Duration,
    fixed_delay: Duration,
    jitter_bound: Duration,
    max_retries: u32,
    backoff_base: Duration,
    backoff_cap: Duration,
    backoff_jitter: Duration,
    user_agent: String,
    accept_language: String,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn accept_language(&self) -> &str {
        &self.accept_language
    }

    /// Delay before an attempt: `fixed_delay + uniform(0, jitter_bound)`.
    pub fn rate_limit_delay<R: Rng>(&self, rng: &mut R) -> Duration {
        self.fixed_delay.saturating_add(uniform(rng, self.jitter_bound))
    }

    /// Delay after failed attempt `attempt` (0-based):
    /// `min(backoff_base * 2^attempt, backoff_cap) + uniform(0, backoff_jitter)`.
    pub fn backoff_delay<R: Rng>(&self, attempt: u32, rng: &mut R) -> Duration {
        self.backoff_floor(attempt)
            .saturating_add(uniform(rng, self.backoff_jitter))
    }

    /// Deterministic part of the backoff for `attempt`.
    pub fn backoff_floor(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.backoff_base
            .saturating_mul(factor)
            .min(self.backoff_cap)
    }
}

fn uniform<R: Rng>(rng: &mut R, bound: Duration) -> Duration {
    if bound.is_zero() {
        return Duration::ZERO;
    }
    let secs = rng.random_range(0.0..=bound.as_secs_f64());
    Duration::try_from_secs_f64(secs).map_or(bound, |d| d.min(bound))
}

/// Diagnostics for layout drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugSettings {
    /// Write the first list page to disk when it yields no posts
    #[serde(default = "defaults::dump_html_on_empty")]
    pub dump_html_on_empty: bool,

    #[serde(default = "defaults::dump_html_path")]
    pub dump_html_path: PathBuf,
}

impl Default for DebugSettings {
    fn default() -> Self {
        Self {
            dump_html_on_empty: defaults::dump_html_on_empty(),
            dump_html_path: defaults::dump_html_path(),
        }
    }
}

/// Host allow-list and path deny-list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetySettings {
    #[serde(default = "defaults::allowed_hosts")]
    pub allowed_hosts: Vec<String>,

    /// Regexes matched against URL paths
    #[serde(default = "defaults::disallowed_paths")]
    pub disallowed_paths: Vec<String>,
}

impl Default for SafetySettings {
    fn default() -> Self {
        Self {
            allowed_hosts: defaults::allowed_hosts(),
            disallowed_paths: defaults::disallowed_paths(),
        }
    }
}

impl SafetySettings {
    fn validate(&self) -> Result<()> {
        if self.allowed_hosts.is_empty() {
            return Err(AppError::config("safety.allowed_hosts is empty"));
        }
        for pattern in &self.disallowed_paths {
            regex::Regex::new(pattern).map_err(|e| {
                AppError::config(format!("invalid disallowed path '{pattern}': {e}"))
            })?;
        }
        Ok(())
    }
}

/// Sentiment inference settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentSettings {
    /// Inference endpoint accepting `{"texts": [...]}`
    #[serde(default = "defaults::sentiment_endpoint")]
    pub endpoint: String,

    #[serde(default = "defaults::model_version")]
    pub model_version: String,

    #[serde(default)]
    pub text_used: TextUsed,

    #[serde(default = "defaults::batch_size")]
    pub batch_size: usize,

    /// Token limit forwarded to the backend
    #[serde(default = "defaults::max_length")]
    pub max_length: usize,

    /// Below this top probability the label is forced to neutral; 0 disables
    #[serde(default)]
    pub neutral_floor: f64,
}

impl Default for SentimentSettings {
    fn default() -> Self {
        Self {
            endpoint: defaults::sentiment_endpoint(),
            model_version: defaults::model_version(),
            text_used: TextUsed::default(),
            batch_size: defaults::batch_size(),
            max_length: defaults::max_length(),
            neutral_floor: 0.0,
        }
    }
}

impl SentimentSettings {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(AppError::config("sentiment.batch_size must be > 0"));
        }
        if self.max_length == 0 {
            return Err(AppError::config("sentiment.max_length must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.neutral_floor) {
            return Err(AppError::config("sentiment.neutral_floor must be in [0, 1]"));
        }
        Ok(())
    }
}

/// Publishing sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkSettings {
    /// JSON lines file receiving published records
    #[serde(default = "defaults::sink_path")]
    pub path: PathBuf,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            path: defaults::sink_path(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Board defaults
    pub fn board_id() -> u32 {
        5558
    }
    pub fn board_base_url() -> String {
        "https://m.inven.co.kr/board/lostark/5558".into()
    }
    pub fn max_list_pages() -> usize {
        1
    }
    pub fn max_posts_per_run() -> usize {
        30
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            .into()
    }
    pub fn accept_language() -> String {
        "ko-KR,ko;q=0.9,en;q=0.8".into()
    }
    pub fn timeout() -> f64 {
        15.0
    }
    pub fn delay() -> f64 {
        0.8
    }
    pub fn jitter() -> f64 {
        0.25
    }
    pub fn max_retries() -> u32 {
        3
    }
    pub fn backoff_base() -> f64 {
        1.0
    }
    pub fn backoff_max() -> f64 {
        20.0
    }
    pub fn backoff_jitter() -> f64 {
        0.5
    }

    // Debug defaults
    pub fn dump_html_on_empty() -> bool {
        true
    }
    pub fn dump_html_path() -> PathBuf {
        PathBuf::from("debug_board_list.html")
    }

    // Safety defaults
    pub fn allowed_hosts() -> Vec<String> {
        vec![
            "m.inven.co.kr".into(),
            "www.inven.co.kr".into(),
            "inven.co.kr".into(),
        ]
    }
    pub fn disallowed_paths() -> Vec<String> {
        vec![
            r"^/board/prevnext\.php$".into(),
            r"^/powerbbs/prevnext\.php$".into(),
            r"^/staff/.*".into(),
            r"^/webzine/prevnext\.php$".into(),
        ]
    }

    // Sentiment defaults
    pub fn sentiment_endpoint() -> String {
        "http://127.0.0.1:8000/predict".into()
    }
    pub fn model_version() -> String {
        "kcbert-finetuned-v1".into()
    }
    pub fn batch_size() -> usize {
        16
    }
    pub fn max_length() -> usize {
        256
    }

    // Sink defaults
    pub fn sink_path() -> PathBuf {
        PathBuf::from("out/posts.jsonl")
    }
}
