//! Acting user resolution.
//!
//! Resolution order:
//! 1) CLI --as (explicit)
//! 2) HELPLINE_ACTOR environment variable
//! 3) Persisted value in `<home>/actor`
//! 4) Config default (actor.default)

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Error, Result};

const ACTOR_FILENAME: &str = "actor";
pub const ACTOR_ENV: &str = "HELPLINE_ACTOR";

/// Resolve the acting username using CLI, environment, persisted value, and config.
pub fn resolve_actor(home: &Path, cli_actor: Option<&str>) -> Result<String> {
    if let Some(actor) = non_empty(cli_actor) {
        return Ok(actor.to_string());
    }

    if let Ok(env_actor) = std::env::var(ACTOR_ENV) {
        if let Some(actor) = non_empty(Some(env_actor.as_str())) {
            return Ok(actor.to_string());
        }
    }

    if let Some(actor) = load_persisted_actor(home)? {
        return Ok(actor);
    }

    Ok(Config::load_from_home(home).actor.default)
}

/// Persist the acting username in `<home>/actor`.
pub fn persist_actor(home: &Path, actor: &str) -> Result<()> {
    let actor = non_empty(Some(actor))
        .ok_or_else(|| Error::InvalidArgument("actor name cannot be empty".to_string()))?;

    std::fs::create_dir_all(home)?;
    std::fs::write(actor_path(home), format!("{actor}\n"))?;
    Ok(())
}

/// Load the acting username from `<home>/actor`, if present.
pub fn load_persisted_actor(home: &Path) -> Result<Option<String>> {
    let path = actor_path(home);
    if !path.exists() {
        return Ok(None);
    }

    let raw = std::fs::read_to_string(path)?;
    Ok(non_empty(Some(raw.as_str())).map(str::to_string))
}

fn actor_path(home: &Path) -> PathBuf {
    home.join(ACTOR_FILENAME)
}

fn non_empty(input: Option<&str>) -> Option<&str> {
    input
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
