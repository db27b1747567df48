//! helpline init command implementation
//!
//! Creates the home directory, an empty store and a default config.

use std::path::{Path, PathBuf};

use crate::cli::GlobalOptions;
use crate::config::{Config, CONFIG_FILENAME};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::storage::{Storage, DB_FILENAME};

#[derive(serde::Serialize)]
struct InitReport {
    home: PathBuf,
    created: InitCreated,
}

#[derive(serde::Serialize)]
struct InitCreated {
    home: bool,
    store: bool,
    config: bool,
}

pub fn run(global: GlobalOptions) -> Result<()> {
    let home = global.home();
    let created_home = ensure_dir(&home)?;
    let created_config = ensure_config(&home)?;

    let config = Config::load(&home.join(CONFIG_FILENAME))?;
    let storage = Storage::new(home.clone()).with_lock_timeout(config.store.lock_timeout_ms);
    let created_store = storage.init()?;

    let report = InitReport {
        home: home.clone(),
        created: InitCreated {
            home: created_home,
            store: created_store,
            config: created_config,
        },
    };

    let mut created_items = Vec::new();
    if created_home {
        created_items.push("home/");
    }
    if created_store {
        created_items.push(DB_FILENAME);
    }
    if created_config {
        created_items.push(CONFIG_FILENAME);
    }

    let header = if created_items.is_empty() {
        "helpline init: nothing to do".to_string()
    } else {
        "helpline init: initialized store".to_string()
    };

    let mut human = HumanOutput::new(header);
    human.push_summary("home", home.display().to_string());
    human.push_summary(
        "created",
        if created_items.is_empty() {
            "none".to_string()
        } else {
            created_items.join(", ")
        },
    );
    human.push_next_step("helpline user add <username>");
    human.push_next_step("helpline actor set <username>");

    emit_success(
        OutputOptions {
            json: global.json,
            quiet: global.quiet,
        },
        "init",
        &report,
        Some(&human),
    )
}

fn ensure_config(home: &Path) -> Result<bool> {
    let config_path = home.join(CONFIG_FILENAME);
    if config_path.exists() {
        if !config_path.is_file() {
            return Err(Error::OperationFailed(format!(
                "{CONFIG_FILENAME} exists but is not a file: {}",
                config_path.display()
            )));
        }
        return Ok(false);
    }

    Config::default().save(&config_path)?;
    Ok(true)
}

fn ensure_dir(path: &Path) -> Result<bool> {
    if path.exists() {
        if !path.is_dir() {
            return Err(Error::OperationFailed(format!(
                "Expected directory at {}",
                path.display()
            )));
        }
        return Ok(false);
    }

    std::fs::create_dir_all(path)?;
    Ok(true)
}
