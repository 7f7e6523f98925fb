//! CLI Configuration

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub api_url: Option<String>,
    pub default_format: Option<String>,
    /// Schema used by `submit` and `fill` when none is given.
    pub default_schema: Option<String>,
}

impl Config {
    pub fn load(profile: Option<&str>) -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path(profile)?)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn save(&self, profile: Option<&str>) -> anyhow::Result<PathBuf> {
        let path = Self::config_path(profile)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> anyhow::Result<Option<&str>> {
        Ok(match key {
            "api_url" => self.api_url.as_deref(),
            "default_format" => self.default_format.as_deref(),
            "default_schema" => self.default_schema.as_deref(),
            _ => return Err(anyhow!("Unknown config key: {key}")),
        })
    }

    pub fn set(&mut self, key: &str, value: String) -> anyhow::Result<()> {
        let slot = match key {
            "api_url" => &mut self.api_url,
            "default_format" => &mut self.default_format,
            "default_schema" => &mut self.default_schema,
            _ => return Err(anyhow!("Unknown config key: {key}")),
        };
        *slot = Some(value);
        Ok(())
    }

    pub const KEYS: [&'static str; 3] = ["api_url", "default_format", "default_schema"];

    fn config_path(profile: Option<&str>) -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Cannot find home directory"))?;
        let filename = match profile {
            Some(p) => format!("config.{p}.toml"),
            None => "config.toml".to_string(),
        };
        Ok(home.join(".formdesk").join(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set("api_url", "http://forms.internal:5000".into()).unwrap();
        config.set("default_schema", "user-registration".into()).unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.get("default_format").unwrap(), None);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load_from(&dir.path().join("absent.toml")).unwrap(), Config::default());
    }

    #[test]
    fn test_unknown_key() {
        let mut config = Config::default();
        assert!(config.set("api_key", "x".into()).is_err());
        assert!(config.get("tenant_id").is_err());
    }
}
