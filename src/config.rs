//! Configuration loading and management
//!
//! Handles parsing of `helpline.toml` in the helpline home directory.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lock::DEFAULT_LOCK_TIMEOUT_MS;

/// Name of the configuration file inside the home directory
pub const CONFIG_FILENAME: &str = "helpline.toml";

/// Largest leaderboard a config may ask for
const MAX_LEADERBOARD_LIMIT: usize = 1000;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Actor configuration
    #[serde(default)]
    pub actor: ActorConfig,

    /// Store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Leaderboard configuration
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,

    /// Notification configuration
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

/// Actor-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorConfig {
    /// Username used when no actor is given anywhere else
    #[serde(default = "default_actor")]
    pub default: String,
}

fn default_actor() -> String {
    "anonymous".to_string()
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            default: default_actor(),
        }
    }
}

/// Store-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// How long a write waits for the store lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

/// Leaderboard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    /// Number of volunteers shown
    #[serde(default = "default_leaderboard_limit")]
    pub limit: usize,
}

fn default_leaderboard_limit() -> usize {
    50
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            limit: default_leaderboard_limit(),
        }
    }
}

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Broadcast a notification to every other user when a post is created
    #[serde(default = "default_true")]
    pub broadcast_new_posts: bool,
}

fn default_true() -> bool {
    true
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            broadcast_new_posts: true,
        }
    }
}

impl Config {
    /// Load configuration from a `helpline.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the home directory, or return defaults
    pub fn load_from_home(home: &Path) -> Self {
        let config_path = home.join(CONFIG_FILENAME);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %config_path.display(), error = %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.actor.default.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "actor.default cannot be empty".to_string(),
            ));
        }
        if self.store.lock_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "store.lock_timeout_ms must be > 0".to_string(),
            ));
        }
        if self.leaderboard.limit == 0 {
            return Err(Error::InvalidConfig(
                "leaderboard.limit must be > 0".to_string(),
            ));
        }
        if self.leaderboard.limit > MAX_LEADERBOARD_LIMIT {
            return Err(Error::InvalidConfig(format!(
                "leaderboard.limit must be <= {MAX_LEADERBOARD_LIMIT}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.actor.default, "anonymous");
        assert_eq!(cfg.store.lock_timeout_ms, 5000);
        assert_eq!(cfg.leaderboard.limit, 50);
        assert!(cfg.notifications.broadcast_new_posts);
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILENAME);
        let content = r#"
[actor]
default = "dispatcher"

[store]
lock_timeout_ms = 250

[leaderboard]
limit = 10

[notifications]
broadcast_new_posts = false
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.actor.default, "dispatcher");
        assert_eq!(cfg.store.lock_timeout_ms, 250);
        assert_eq!(cfg.leaderboard.limit, 10);
        assert!(!cfg.notifications.broadcast_new_posts);
    }

    #[test]
    fn zero_leaderboard_limit_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "[leaderboard]\nlimit = 0\n").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        match err {
            Error::InvalidConfig(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn load_from_home_defaults_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from_home(dir.path());
        assert_eq!(cfg.leaderboard.limit, 50);
    }

    #[test]
    fn load_from_home_falls_back_on_invalid_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join(CONFIG_FILENAME), "[store]\nlock_timeout_ms = 0\n")
            .expect("write config");

        let cfg = Config::load_from_home(dir.path());
        assert_eq!(cfg.store.lock_timeout_ms, 5000);
    }

    #[test]
    fn save_writes_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.toml");
        Config::default().save(&path).expect("save config");

        let written = fs::read_to_string(&path).expect("read config");
        assert!(written.contains("limit = 50"));
        assert!(written.contains("default = \"anonymous\""));
    }
}
