use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use twelf::config;

#[config]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Upstream providers
    pub fanqie_api_base_url: String,
    pub qimao_api_base_url: String,
    pub biquge_api_base_url: String,
    pub rain_api_key: Option<String>,
    pub api_timeout_secs: u64,
    pub api_retry_times: u32,

    // Storage
    pub database_url: String,
    pub data_dir: PathBuf,

    // Quota
    pub daily_word_limit: i64,

    // Download engine
    pub concurrent_downloads: usize,
    pub download_delay_secs: f64,

    // Server
    pub host: String,
    pub port: u16,
    pub debug: bool,

    // Auth
    pub app_password: Option<String>,
    pub secret_key: String,
    pub session_expire_hours: i64,

    // Logging
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub log_max_size_mb: u64,
    pub log_backup_count: u32,
    pub log_format: String,

    // EPUB generation
    pub epub_language: String,
    pub epub_publisher: String,
    pub epub_cover_width: u32,
    pub epub_cover_height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            fanqie_api_base_url: String::new(),
            qimao_api_base_url: String::new(),
            biquge_api_base_url: String::new(),
            rain_api_key: None,
            api_timeout_secs: 30,
            api_retry_times: 3,
            database_url: "sqlite://data/novelforge.db?mode=rwc".into(),
            data_dir: PathBuf::from("data"),
            daily_word_limit: 20_000_000,
            concurrent_downloads: 3,
            download_delay_secs: 0.5,
            host: "0.0.0.0".into(),
            port: 3000,
            debug: false,
            app_password: None,
            secret_key: String::new(),
            session_expire_hours: 24 * 7,
            log_level: "info".into(),
            log_file: None,
            log_max_size_mb: 10,
            log_backup_count: 5,
            log_format: "pretty".into(),
            epub_language: "zh-CN".into(),
            epub_publisher: "novelforge".into(),
            epub_cover_width: 600,
            epub_cover_height: 800,
        }
    }
}

impl Config {
    /// Loads a layered configuration: defaults, then an optional YAML file,
    /// then environment variables prefixed `NOVELFORGE_` (double underscore
    /// separates nesting, matching twelf's default convention).
    pub fn load(config_path: Option<&std::path::Path>) -> anyhow::Result<Self> {
        let mut layers = Vec::new();
        if let Some(path) = config_path {
            if path.exists() {
                layers.push(twelf::Layer::Yaml(path.into()));
            }
        }
        layers.push(twelf::Layer::Env(Some("NOVELFORGE_".to_string())));

        let config = if layers
            .iter()
            .any(|l| matches!(l, twelf::Layer::Yaml(_)))
        {
            Config::with_layers(&layers)?
        } else {
            // No config file present: start from defaults, then env overlay.
            let defaults = Config::default();
            let serialized = serde_yml::to_string(&defaults)?;
            let tmp = std::env::temp_dir().join("novelforge-default-config.yaml");
            std::fs::write(&tmp, serialized)?;
            let mut layers = vec![twelf::Layer::Yaml(tmp.clone())];
            layers.push(twelf::Layer::Env(Some("NOVELFORGE_".to_string())));
            let config = Config::with_layers(&layers)?;
            let _ = std::fs::remove_file(&tmp);
            config
        };
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.concurrent_downloads == 0 {
            return Err("concurrent_downloads must be at least 1".into());
        }
        if self.daily_word_limit <= 0 {
            return Err("daily_word_limit must be positive".into());
        }
        if self.database_url.is_empty() {
            return Err("database_url is missing".into());
        }
        if self.app_password.is_some() && self.secret_key.is_empty() {
            return Err("secret_key is required when app_password is configured".into());
        }
        Ok(())
    }

    pub fn books_dir(&self) -> PathBuf {
        self.data_dir.join("books")
    }

    pub fn epubs_dir(&self) -> PathBuf {
        self.data_dir.join("epubs")
    }

    pub fn txts_dir(&self) -> PathBuf {
        self.data_dir.join("txts")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut config = Config::default();
        config.concurrent_downloads = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn app_password_without_secret_key_is_rejected() {
        let mut config = Config::default();
        config.app_password = Some("hunter2".to_string());
        config.secret_key = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn app_password_with_secret_key_is_accepted() {
        let mut config = Config::default();
        config.app_password = Some("hunter2".to_string());
        config.secret_key = "a-real-secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn data_dir_subpaths_are_joined_consistently() {
        let config = Config::default();
        assert_eq!(config.books_dir(), config.data_dir.join("books"));
        assert_eq!(config.epubs_dir(), config.data_dir.join("epubs"));
        assert_eq!(config.txts_dir(), config.data_dir.join("txts"));
    }
}
