//! Application configuration. Provider credentials, paths, limits.
//!
//! Read from `JOBFINDER_*` environment variables (and `.env`) plus an optional file named by
//! `JOBFINDER_CONFIG`. Every field is optional; accessors supply the defaults.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_LLM_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_FALLBACK_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_FALLBACK_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Database, exports, search settings. Read from JOBFINDER_DATA_DIR.
    #[serde(default)]
    pub data_dir: Option<String>,

    // Language model
    #[serde(default)]
    pub llm_api_key: Option<String>,
    #[serde(default)]
    pub llm_api_url: Option<String>,
    #[serde(default)]
    pub llm_model: Option<String>,
    #[serde(default)]
    pub llm_max_tokens: Option<u32>,
    #[serde(default)]
    pub llm_temperature: Option<f32>,

    /// Second provider tried when the first fails (Groq by default). Enabled by its key.
    #[serde(default)]
    pub fallback_api_key: Option<String>,
    #[serde(default)]
    pub fallback_api_url: Option<String>,
    #[serde(default)]
    pub fallback_model: Option<String>,

    // jobup.ch
    #[serde(default)]
    pub jobup_search_url: Option<String>,
    #[serde(default)]
    pub jobup_site_url: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Result pages fetched concurrently per scrape.
    #[serde(default)]
    pub max_concurrent_pages: Option<usize>,
    /// Capacity of the channel between page fetchers and the store writer.
    #[serde(default)]
    pub buffer_size: Option<usize>,

    /// Sleep between scheduler cycles in seconds (default 3600).
    #[serde(default)]
    pub scheduler_interval_secs: Option<u64>,

    // Browser automation
    #[serde(default)]
    pub webdriver_url: Option<String>,
    #[serde(default)]
    pub headless: Option<bool>,
    /// Browser profile holding the logged-in jobup session.
    #[serde(default)]
    pub browser_profile_dir: Option<String>,
    /// true clicks "apply"; false only saves the application on the site.
    #[serde(default)]
    pub direct_apply: Option<bool>,
    /// Cap on submissions per auto-apply run. Unset means no cap.
    #[serde(default)]
    pub max_applications: Option<usize>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("JOBFINDER").try_parsing(true));
        if let Ok(path) = std::env::var("JOBFINDER_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        c.build()?.try_deserialize()
    }

    /// Defaults to `<local data dir>/jobfinder`, or `./data` when the OS has none.
    pub fn data_dir_or_default(&self) -> PathBuf {
        self.data_dir
            .as_deref()
            .map(PathBuf::from)
            .or_else(|| dirs::data_local_dir().map(|d| d.join("jobfinder")))
            .unwrap_or_else(|| PathBuf::from("./data"))
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir_or_default().join("exports")
    }

    pub fn search_settings_path(&self) -> PathBuf {
        self.data_dir_or_default().join("search.json")
    }

    pub fn llm_api_key(&self) -> Option<String> {
        self.llm_api_key.clone().filter(|k| !k.trim().is_empty())
    }

    pub fn llm_api_url_or_default(&self) -> String {
        self.llm_api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_LLM_URL.to_string())
    }

    pub fn llm_model_or_default(&self) -> String {
        self.llm_model
            .clone()
            .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string())
    }

    pub fn llm_max_tokens_or_default(&self) -> u32 {
        self.llm_max_tokens.unwrap_or(1500)
    }

    pub fn llm_temperature_or_default(&self) -> f32 {
        self.llm_temperature.unwrap_or(0.7)
    }

    /// Returns true if a language model key is configured.
    pub fn is_llm_configured(&self) -> bool {
        self.llm_api_key().is_some()
    }

    pub fn fallback_api_key(&self) -> Option<String> {
        self.fallback_api_key.clone().filter(|k| !k.trim().is_empty())
    }

    pub fn fallback_api_url_or_default(&self) -> String {
        self.fallback_api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_FALLBACK_URL.to_string())
    }

    pub fn fallback_model_or_default(&self) -> String {
        self.fallback_model
            .clone()
            .unwrap_or_else(|| DEFAULT_FALLBACK_MODEL.to_string())
    }

    pub fn jobup_search_url_or_default(&self) -> String {
        self.jobup_search_url
            .clone()
            .unwrap_or_else(|| crate::adapters::jobup::urls::DEFAULT_SEARCH_URL.to_string())
    }

    pub fn jobup_site_url_or_default(&self) -> String {
        self.jobup_site_url
            .clone()
            .unwrap_or_else(|| crate::adapters::jobup::urls::DEFAULT_SITE_URL.to_string())
    }

    pub fn user_agent_or_default(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string())
    }

    pub fn max_concurrent_pages_or_default(&self) -> usize {
        self.max_concurrent_pages
            .unwrap_or(crate::usecases::scrape_service::DEFAULT_MAX_CONCURRENT_PAGES)
    }

    pub fn buffer_size_or_default(&self) -> usize {
        self.buffer_size
            .unwrap_or(crate::usecases::scrape_service::DEFAULT_BUFFER_SIZE)
    }

    pub fn scheduler_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler_interval_secs.unwrap_or(3600).max(1))
    }

    pub fn webdriver_url_or_default(&self) -> String {
        self.webdriver_url
            .clone()
            .unwrap_or_else(|| DEFAULT_WEBDRIVER_URL.to_string())
    }

    pub fn headless_or_default(&self) -> bool {
        self.headless.unwrap_or(true)
    }

    /// Defaults to `<data dir>/browser-profile` so the site login survives restarts.
    pub fn browser_profile_dir_or_default(&self) -> PathBuf {
        self.browser_profile_dir
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.data_dir_or_default().join("browser-profile"))
    }

    pub fn direct_apply_or_default(&self) -> bool {
        self.direct_apply.unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.llm_model_or_default(), DEFAULT_LLM_MODEL);
        assert_eq!(cfg.max_concurrent_pages_or_default(), 3);
        assert_eq!(cfg.buffer_size_or_default(), 100);
        assert_eq!(cfg.scheduler_interval(), Duration::from_secs(3600));
        assert!(cfg.headless_or_default());
        assert!(!cfg.direct_apply_or_default());
        assert!(!cfg.is_llm_configured());
        assert!(cfg.search_settings_path().ends_with("search.json"));
    }

    #[test]
    fn blank_keys_count_as_unset() {
        let cfg = AppConfig {
            llm_api_key: Some("  ".into()),
            data_dir: Some("/tmp/jf".into()),
            ..AppConfig::default()
        };
        assert!(!cfg.is_llm_configured());
        assert_eq!(
            cfg.browser_profile_dir_or_default(),
            PathBuf::from("/tmp/jf/browser-profile")
        );
        assert_eq!(cfg.exports_dir(), PathBuf::from("/tmp/jf/exports"));
    }
}
