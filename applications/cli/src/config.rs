/// CLI configuration
use crate::error::{CliError, Result};
use earshot_client::{BackendConfig, DEFAULT_BUCKET};
use earshot_feed::FeedConfig;
use earshot_playback::PlayerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file read when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "earshot.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EarshotConfig {
    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub auth: AuthSettings,

    #[serde(default)]
    pub playback: PlayerConfig,

    #[serde(default)]
    pub feed: FeedConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendSettings {
    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub anon_key: String,

    #[serde(default = "default_bucket")]
    pub bucket: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            bucket: default_bucket(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthSettings {
    pub email: Option<String>,
    pub password: Option<String>,
    /// Stored session, used when no password is configured
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

fn default_bucket() -> String {
    DEFAULT_BUCKET.to_string()
}

impl EarshotConfig {
    /// Load configuration from file and environment.
    ///
    /// `path` defaults to `earshot.toml` in the working directory and is
    /// optional either way. `EARSHOT_*` variables override the file, with
    /// `__` between section and key (`EARSHOT_BACKEND__ANON_KEY`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        let config_path = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);
        if config_path.exists() {
            settings = settings.add_source(config::File::from(config_path));
        } else if let Some(path) = path {
            return Err(CliError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        settings = settings.add_source(
            config::Environment::with_prefix("EARSHOT")
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("playback.rates")
                .try_parsing(true),
        );

        Ok(settings.build()?.try_deserialize()?)
    }

    /// Parse TOML text only
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.backend.url.is_empty() {
            return Err(CliError::Config(
                "Backend URL is required (set EARSHOT_BACKEND__URL)".to_string(),
            ));
        }

        if self.backend.anon_key.is_empty() {
            return Err(CliError::Config(
                "Anonymous key is required (set EARSHOT_BACKEND__ANON_KEY)".to_string(),
            ));
        }

        if self.playback.rates.is_empty() || self.playback.rates.iter().any(|r| *r <= 0.0) {
            return Err(CliError::Config(
                "Playback rates must be a non-empty list of positive numbers".to_string(),
            ));
        }

        if self.playback.seek_step_seconds <= 0.0 {
            return Err(CliError::Config(
                "Seek step must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Client configuration, carrying the stored session if there is one
    pub fn backend_config(&self) -> BackendConfig {
        let mut config = BackendConfig::new(&self.backend.url, &self.backend.anon_key);
        config.bucket = self.backend.bucket.clone();
        config.access_token = self.auth.access_token.clone();
        config.refresh_token = self.auth.refresh_token.clone();
        config
    }

    /// Email and password, when both are configured
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.auth.email, &self.auth.password) {
            (Some(email), Some(password)) => Some((email.as_str(), password.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
        [backend]
        url = "https://xyz.example.co"
        anon_key = "anon"

        [auth]
        email = "ana@example.com"
        password = "secret"

        [playback]
        seek_step_seconds = 15.0
        rates = [1.0, 1.25, 1.5]

        [feed]
        echo_window_ms = 2000
    "#;

    #[test]
    fn parses_every_section() {
        let config = EarshotConfig::from_toml(FULL).unwrap();
        config.validate().unwrap();

        assert_eq!(config.backend.bucket, "audio-clips");
        assert_eq!(config.credentials(), Some(("ana@example.com", "secret")));
        assert_eq!(config.playback.seek_step_seconds, 15.0);
        assert_eq!(config.playback.rates, vec![1.0, 1.25, 1.5]);
        assert_eq!(config.feed.echo_window_ms, 2000);

        let backend = config.backend_config();
        assert_eq!(backend.url, "https://xyz.example.co");
        assert!(backend.access_token.is_none());
    }

    #[test]
    fn sections_default() {
        let config = EarshotConfig::from_toml(
            r#"
            [backend]
            url = "https://xyz.example.co"
            anon_key = "anon"
            "#,
        )
        .unwrap();
        config.validate().unwrap();

        assert_eq!(config.playback.rates, vec![1.0, 1.5, 2.0]);
        assert_eq!(config.playback.seek_step_seconds, 10.0);
        assert_eq!(config.feed.echo_window_ms, 5000);
        assert!(config.credentials().is_none());
    }

    #[test]
    fn validation_rejects_missing_backend() {
        let config = EarshotConfig::from_toml("").unwrap();
        match config.validate() {
            Err(CliError::Config(msg)) => assert!(msg.contains("URL")),
            other => panic!("Expected Config error, got: {:?}", other),
        }

        let config = EarshotConfig::from_toml(
            r#"
            [backend]
            url = "https://xyz.example.co"
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_bad_rates() {
        let config = EarshotConfig::from_toml(
            r#"
            [backend]
            url = "https://xyz.example.co"
            anon_key = "anon"

            [playback]
            rates = []
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(EarshotConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn loads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("earshot.toml");
        std::fs::write(&path, FULL).unwrap();

        let config = EarshotConfig::load(Some(&path)).unwrap();
        assert_eq!(config.backend.anon_key, "anon");
    }
}
