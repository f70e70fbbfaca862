// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf, time::Duration};
use tracing::{debug, info};

use crate::{
    calendar::{Language, Region},
    table::{DirSource, HttpSource, TableSource},
};

pub const CONFIG_PATH_VAR: &str = "KRISHI_CONFIG";

/// Runtime settings: where the tables come from and the default query context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the CSV tables; used when `data_url` is unset.
    pub data_dir: PathBuf,
    /// Base URL serving the CSV tables.
    pub data_url: Option<String>,
    pub language: Language,
    pub region: Region,
    pub http_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            data_url: None,
            language: Language::English,
            region: Region::Mid,
            http_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Defaults, then the YAML file named by `KRISHI_CONFIG` (if set), then
    /// `KRISHI_*` environment overrides.
    pub fn load() -> Result<Config> {
        let mut config = match env::var(CONFIG_PATH_VAR) {
            Ok(path) => {
                info!(path = %path, "reading config file");
                let text = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {}", path))?;
                Config::from_yaml_str(&text).with_context(|| format!("parsing {}", path))?
            }
            Err(_) => Config::default(),
        };
        config.apply_env(|key| env::var(key).ok())?;
        debug!(?config, "configuration resolved");
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Config> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(dir) = lookup("KRISHI_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("KRISHI_DATA_URL") {
            self.data_url = Some(url).filter(|u| !u.trim().is_empty());
        }
        if let Some(lang) = lookup("KRISHI_LANG") {
            self.language = lang.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(region) = lookup("KRISHI_REGION") {
            self.region = region.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(secs) = lookup("KRISHI_HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = secs
                .trim()
                .parse()
                .with_context(|| format!("KRISHI_HTTP_TIMEOUT_SECS is not a number: `{}`", secs))?;
        }
        Ok(())
    }

    /// The HTTP source when `data_url` is set, the data directory otherwise.
    pub fn table_source(&self) -> Result<Box<dyn TableSource>> {
        match &self.data_url {
            Some(url) => {
                let timeout = Duration::from_secs(self.http_timeout_secs);
                Ok(Box::new(HttpSource::new(url, timeout)?))
            }
            None => Ok(Box::new(DirSource::new(&self.data_dir))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_yaml_fills_missing_fields_with_defaults() -> Result<()> {
        let config = Config::from_yaml_str("language: ne\nregion: terai\n")?;
        assert_eq!(config.language, Language::Nepali);
        assert_eq!(config.region, Region::Terai);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.http_timeout_secs, 30);
        Ok(())
    }

    #[test]
    fn test_env_overrides_file() -> Result<()> {
        let mut config = Config::from_yaml_str("data_dir: /srv/tables\nlanguage: english\n")?;
        let env = vars(&[
            ("KRISHI_LANG", "nepali"),
            ("KRISHI_REGION", "high"),
            ("KRISHI_DATA_URL", "https://example.org/data"),
            ("KRISHI_HTTP_TIMEOUT_SECS", " 5 "),
        ]);
        config.apply_env(|k| env.get(k).cloned())?;

        assert_eq!(config.language, Language::Nepali);
        assert_eq!(config.region, Region::High);
        assert_eq!(config.data_dir, PathBuf::from("/srv/tables"));
        assert_eq!(config.data_url.as_deref(), Some("https://example.org/data"));
        assert_eq!(config.http_timeout_secs, 5);
        Ok(())
    }

    #[test]
    fn test_bad_env_values_are_errors() {
        let mut config = Config::default();
        let env = vars(&[("KRISHI_REGION", "Far West")]);
        assert!(config.apply_env(|k| env.get(k).cloned()).is_err());

        let env = vars(&[("KRISHI_HTTP_TIMEOUT_SECS", "soon")]);
        assert!(config.apply_env(|k| env.get(k).cloned()).is_err());
    }

    #[test]
    fn test_table_source_selection() -> Result<()> {
        let mut config = Config::default();
        assert!(config.table_source().is_ok());

        config.data_url = Some("not a url".to_string());
        assert!(config.table_source().is_err());
        Ok(())
    }
}
