//! helpline actor command implementation
//!
//! Provides acting-user helpers (set/show).

use std::path::PathBuf;

use crate::actor;
use crate::cli::GlobalOptions;
use crate::desk::HelpDesk;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};

/// Options for `helpline actor set`
pub struct SetOptions {
    pub username: String,
    pub global: GlobalOptions,
}

#[derive(serde::Serialize)]
struct ActorSetReport {
    actor: String,
    path: PathBuf,
    registered: bool,
}

#[derive(serde::Serialize)]
struct ActorShowReport {
    actor: String,
    registered: bool,
}

/// Whether `name` is a known user. A missing store counts as unknown.
fn is_registered(home: PathBuf, name: &str) -> bool {
    let desk = HelpDesk::open(home);
    desk.storage().is_initialized() && desk.find_user(name).is_ok()
}

pub fn run_set(options: SetOptions) -> Result<()> {
    let home = options.global.home();
    actor::persist_actor(&home, &options.username)?;

    let actor_name = actor::resolve_actor(&home, Some(options.username.as_str()))?;
    let actor_path = home.join("actor");
    let registered = is_registered(home, &actor_name);

    let report = ActorSetReport {
        actor: actor_name.clone(),
        path: actor_path.clone(),
        registered,
    };

    let mut human = HumanOutput::new(format!("helpline actor set: {actor_name}"));
    human.push_summary("actor", actor_name.clone());
    human.push_summary("path", actor_path.display().to_string());
    if !registered {
        human.push_warning(format!("{actor_name} is not a registered user"));
        human.push_next_step(format!("helpline user add {actor_name}"));
    }

    emit_success(
        OutputOptions {
            json: options.global.json,
            quiet: options.global.quiet,
        },
        "actor set",
        &report,
        Some(&human),
    )
}

pub fn run_show(global: GlobalOptions) -> Result<()> {
    let home = global.home();
    let actor_name = actor::resolve_actor(&home, global.actor.as_deref())?;
    let registered = is_registered(home, &actor_name);

    let report = ActorShowReport {
        actor: actor_name.clone(),
        registered,
    };

    let mut human = HumanOutput::new(format!("helpline actor: {actor_name}"));
    human.push_summary("actor", actor_name.clone());
    human.push_summary("registered", registered.to_string());
    if !registered {
        human.push_warning("acting user is not registered".to_string());
        human.push_next_step("helpline actor set <username>");
    }

    emit_success(
        OutputOptions {
            json: global.json,
            quiet: global.quiet,
        },
        "actor show",
        &report,
        Some(&human),
    )
}
