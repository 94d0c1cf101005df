use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use inti_client::StoredSession;
use inti_client::client::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct ProfileConfig {
    pub server: Option<String>,
    pub format: Option<String>,
}

pub type ConfigFile = HashMap<String, ProfileConfig>;

fn config_dir() -> Result<PathBuf> {
    let dir = dirs::home_dir()
        .context("Cannot determine home directory")?
        .join(".inti");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn load_all() -> Result<ConfigFile> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(ConfigFile::new());
    }
    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let cfg: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(cfg)
}

pub fn load_profile(profile: &str) -> Result<ProfileConfig> {
    let mut all = load_all()?;
    Ok(all.remove(profile).unwrap_or_default())
}

pub fn save_profile(profile: &str, config: &ProfileConfig) -> Result<()> {
    let mut all = load_all()?;
    all.insert(profile.to_string(), config.clone());
    let content = toml::to_string_pretty(&all)?;
    fs::write(config_path()?, content)?;
    Ok(())
}

/// Picks the backend URL: `--server` / `INTI_URL`, then the profile's
/// config, then the server the stored session was created against, then
/// the public deployment.
pub fn resolve_server(
    cli_server: Option<&str>,
    config: &ProfileConfig,
    stored: &StoredSession,
) -> String {
    let non_empty = |s: &&str| !s.trim().is_empty();
    cli_server
        .filter(non_empty)
        .or_else(|| config.server.as_deref().filter(non_empty))
        .or_else(|| stored.server.as_deref().filter(non_empty))
        .unwrap_or(DEFAULT_BASE_URL)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(server: Option<&str>) -> StoredSession {
        StoredSession {
            server: server.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_flag_wins() {
        let cfg = ProfileConfig {
            server: Some("http://config".into()),
            format: None,
        };
        assert_eq!(
            resolve_server(Some("http://flag"), &cfg, &stored(Some("http://stored"))),
            "http://flag"
        );
    }

    #[test]
    fn test_config_then_stored_then_default() {
        let cfg = ProfileConfig {
            server: Some("http://config".into()),
            format: None,
        };
        assert_eq!(resolve_server(None, &cfg, &stored(None)), "http://config");
        assert_eq!(
            resolve_server(Some("  "), &ProfileConfig::default(), &stored(Some("http://stored"))),
            "http://stored"
        );
        assert_eq!(
            resolve_server(None, &ProfileConfig::default(), &stored(None)),
            DEFAULT_BASE_URL
        );
    }

    #[test]
    fn test_config_file_format() {
        let content = r#"
[default]
server = "http://localhost:8080"

[staging]
server = "https://staging.example"
format = "table"
"#;
        let cfg: ConfigFile = toml::from_str(content).unwrap();
        assert_eq!(cfg["default"].server.as_deref(), Some("http://localhost:8080"));
        assert_eq!(cfg["staging"].format.as_deref(), Some("table"));
    }
}
