use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, OptionExt, Result, eyre};
use serde::{Deserialize, Serialize};

use crate::engine::recommender::DEFAULT_RECOMMENDATION_LIMIT;
use crate::engine::{Locale, PageSize};

const DEFAULT_CONFIG: &str = r#"# Where the ratings database lives
database = "~/.local/share/track-rater/tracks.db"

# Display locale: "en" or "ja"
locale = "en"

# User whose ratings are used when a request does not name one
user_id = 1

recommendation_limit = 25

# Tracks per page: "all" or a positive number
page_size = "all"
"#;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    database: String,
    #[serde(default)]
    pub locale: Locale,
    #[serde(default = "default_user_id")]
    pub user_id: i64,
    #[serde(default = "default_recommendation_limit")]
    pub recommendation_limit: usize,
    #[serde(default)]
    pub page_size: PageSize,
}

fn default_user_id() -> i64 {
    1
}

fn default_recommendation_limit() -> usize {
    DEFAULT_RECOMMENDATION_LIMIT
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&contents)
            .wrap_err_with(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        if config.recommendation_limit == 0 {
            return Err(eyre!("recommendation_limit must be at least 1"));
        }
        Ok(config)
    }

    /// Default config file location
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("track-rater").join("config.toml"))
    }

    /// Load config from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path().ok_or_eyre("No config directory on this platform")?;
        Self::from_file(&config_path)
    }

    /// Write the default config to the default location
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path().ok_or_eyre("No config directory on this platform")?;
        Self::write_default(&path)?;
        Ok(path)
    }

    /// Write the default config to `path`, leaving an existing file alone
    pub fn write_default(path: &Path) -> Result<bool> {
        if path.exists() {
            log::info!("Config already exists at {}", path.display());
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(path, DEFAULT_CONFIG)
            .wrap_err_with(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(true)
    }

    /// Expand ~ to home directory
    fn expand_path(&self, path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(rest);
        }
        PathBuf::from(path)
    }

    /// Get expanded database path
    pub fn database_path(&self) -> PathBuf {
        self.expand_path(&self.database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::parse("database = \"/tmp/tracks.db\"").unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/tmp/tracks.db"));
        assert_eq!(config.locale, Locale::En);
        assert_eq!(config.user_id, 1);
        assert_eq!(config.recommendation_limit, 25);
        assert_eq!(config.page_size, PageSize::All);
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"
            database = "/tmp/tracks.db"
            locale = "ja"
            user_id = 3
            recommendation_limit = 10
            page_size = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.locale, Locale::Ja);
        assert_eq!(config.user_id, 3);
        assert_eq!(config.recommendation_limit, 10);
        assert_eq!(config.page_size, PageSize::Fixed(50));
    }

    #[test]
    fn test_unsupported_locale_falls_back() {
        let config = Config::parse("database = \"x.db\"\nlocale = \"fr\"").unwrap();
        assert_eq!(config.locale, Locale::En);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::parse("locale = \"en\"").is_err());
        assert!(Config::parse("database = \"x.db\"\npage_size = \"lots\"").is_err());
        assert!(Config::parse("database = \"x.db\"\nrecommendation_limit = 0").is_err());
    }

    #[test]
    fn test_expand_home() {
        let config = Config::parse("database = \"~/ratings/tracks.db\"").unwrap();
        if let Some(home) = dirs::home_dir() {
            assert_eq!(config.database_path(), home.join("ratings/tracks.db"));
        }
    }

    #[test]
    fn test_default_config_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track-rater").join("config.toml");

        assert!(Config::write_default(&path).unwrap());
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.user_id, 1);
        assert_eq!(config.page_size, PageSize::All);

        // Second write keeps the existing file
        std::fs::write(&path, "database = \"mine.db\"").unwrap();
        assert!(!Config::write_default(&path).unwrap());
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.database_path(), PathBuf::from("mine.db"));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let err = Config::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }
}
