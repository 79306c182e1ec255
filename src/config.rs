use crate::error::{ClipstormError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API key for the Whisper transcription endpoint.
    pub openai_api_key: Option<String>,
    /// Concurrent composition jobs.
    pub concurrency: usize,
    /// Where batch directories are created.
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            concurrency: 4,
            output_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                if let Ok(file_config) = toml::from_str::<Config>(&contents) {
                    config = file_config;
                }
            }
        }

        // Override with environment variables
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.openai_api_key = Some(key);
        }
        if let Ok(concurrency) = std::env::var("CLIPSTORM_CONCURRENCY") {
            if let Ok(c) = concurrency.parse() {
                config.concurrency = c;
            }
        }
        if let Ok(dir) = std::env::var("CLIPSTORM_OUTPUT_DIR") {
            config.output_dir = Some(PathBuf::from(dir));
        }

        Ok(config)
    }

    /// The API key is only needed when captions are requested.
    pub fn validate(&self, captions: bool) -> Result<()> {
        if captions && self.openai_api_key.is_none() {
            return Err(ClipstormError::Config(
                "OPENAI_API_KEY not set. Captions need it; export it with: export OPENAI_API_KEY=sk-..."
                    .to_string(),
            ));
        }

        if self.concurrency == 0 {
            return Err(ClipstormError::Config(
                "Concurrency must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("clipstorm").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.concurrency, 4);
        assert!(config.openai_api_key.is_none());
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn test_validate_captions_need_key() {
        let config = Config::default();
        assert!(config.validate(false).is_ok());
        assert!(config.validate(true).is_err());

        let mut with_key = Config::default();
        with_key.openai_api_key = Some("sk-test".to_string());
        assert!(with_key.validate(true).is_ok());
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let mut config = Config::default();
        config.concurrency = 0;
        assert!(config.validate(false).is_err());
    }
}
