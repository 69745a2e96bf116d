//! Browser configuration.
//!
//! A small TOML file; every field has a default, so a missing or partial
//! file is fine and a malformed one falls back wholesale.

use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub homepage: String,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub user_agent: String,
    pub max_redirects: usize,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub download_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            homepage: "about:blank".to_string(),
            viewport_width: 1024.0,
            viewport_height: 768.0,
            user_agent: "tern/0.1".to_string(),
            max_redirects: 5,
            connect_timeout_secs: 10,
            read_timeout_secs: 30,
            download_dir: "downloads".to_string(),
        }
    }
}

impl Config {
    /// Load from a TOML file; missing or malformed files yield defaults.
    pub fn load(path: &str) -> Config {
        match std::fs::read_to_string(path) {
            Ok(text) => match toml::from_str(&text) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path, error = %e, "malformed config, using defaults");
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let c = Config::default();
        assert_eq!(c.homepage, "about:blank");
        assert_eq!(c.max_redirects, 5);
        assert!(c.viewport_width > 0.0);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c: Config = toml::from_str("homepage = \"https://example.com/\"").unwrap();
        assert_eq!(c.homepage, "https://example.com/");
        assert_eq!(c.max_redirects, 5);
    }

    #[test]
    fn missing_file_is_default() {
        let c = Config::load("/nonexistent/definitely/not/here.toml");
        assert_eq!(c.homepage, "about:blank");
    }
}
