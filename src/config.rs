use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanionConfig {
    /// Single fixed endpoint for the simulated Xbox Live backend.
    #[serde(default = "default_xbox_api_url")]
    pub xbox_api_url: String,

    /// Placeholder token passed through on connect requests.
    #[serde(default = "default_xbox_token")]
    pub xbox_token: String,

    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Simulated typing latency before a companion reply appears.
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,

    /// Pause between the connect call and the follow-up friend request.
    #[serde(default = "default_friend_request_delay_ms")]
    pub friend_request_delay_ms: u64,

    /// XP granted per successful chat exchange.
    #[serde(default = "default_xp_per_message")]
    pub xp_per_message: u32,
}

fn default_xbox_api_url() -> String {
    "http://localhost:8080/xbox-auth".to_string()
}

fn default_xbox_token() -> String {
    "demo_token".to_string()
}

fn default_database_path() -> String {
    "craftpal.db".to_string()
}

fn default_reply_delay_ms() -> u64 {
    1500
}

fn default_friend_request_delay_ms() -> u64 {
    1000
}

fn default_xp_per_message() -> u32 {
    25
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            xbox_api_url: default_xbox_api_url(),
            xbox_token: default_xbox_token(),
            database_path: default_database_path(),
            reply_delay_ms: default_reply_delay_ms(),
            friend_request_delay_ms: default_friend_request_delay_ms(),
            xp_per_message: default_xp_per_message(),
        }
    }
}

impl CompanionConfig {
    /// Get the directory containing the executable
    fn get_base_dir() -> PathBuf {
        match std::env::current_exe() {
            Ok(exe_path) => exe_path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")),
            Err(_) => PathBuf::from("."),
        }
    }

    /// Path to the config file (next to executable)
    pub fn config_path() -> PathBuf {
        Self::get_base_dir().join("craftpal_config.toml")
    }

    /// Load config from craftpal_config.toml, falling back to env vars.
    pub fn load() -> Self {
        let path = Self::config_path();

        if let Ok(contents) = fs::read_to_string(&path) {
            match toml::from_str::<CompanionConfig>(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {:?}", path);
                    return config;
                }
                Err(e) => {
                    tracing::error!("Failed to parse {:?}: {}", path, e);
                }
            }
        }

        tracing::warn!("No config file found, using defaults + env vars");
        Self::from_env()
    }

    /// Save config to file (next to executable)
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        let toml_string = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, toml_string)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Load from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = env::var("CRAFTPAL_XBOX_API_URL") {
            config.xbox_api_url = url;
        }

        if let Ok(token) = env::var("CRAFTPAL_XBOX_TOKEN") {
            config.xbox_token = token;
        }

        if let Ok(path) = env::var("CRAFTPAL_DATABASE_PATH") {
            if !path.trim().is_empty() {
                config.database_path = path;
            }
        }

        if let Ok(delay) = env::var("CRAFTPAL_REPLY_DELAY_MS") {
            if let Ok(millis) = delay.parse() {
                config.reply_delay_ms = millis;
            }
        }

        if let Ok(xp) = env::var("CRAFTPAL_XP_PER_MESSAGE") {
            if let Ok(amount) = xp.parse() {
                config.xp_per_message = amount;
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: CompanionConfig = toml::from_str("").unwrap();
        assert_eq!(config.xp_per_message, 25);
        assert_eq!(config.reply_delay_ms, 1500);
        assert_eq!(config.xbox_token, "demo_token");
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config: CompanionConfig =
            toml::from_str("xp_per_message = 50\nreply_delay_ms = 10").unwrap();
        assert_eq!(config.xp_per_message, 50);
        assert_eq!(config.reply_delay_ms, 10);
        assert_eq!(config.database_path, "craftpal.db");
    }
}
