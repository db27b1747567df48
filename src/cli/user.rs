//! helpline user command implementation

use serde::Serialize;

use crate::cli::{GlobalOptions, Session};
use crate::error::Result;
use crate::events::EventKind;
use crate::model::User;
use crate::output::{emit_success, HumanOutput};

pub struct AddOptions {
    pub username: String,
    pub email: Option<String>,
    pub global: GlobalOptions,
}

pub struct RmOptions {
    pub username: String,
    pub global: GlobalOptions,
}

#[derive(Serialize)]
struct UserListReport {
    total: usize,
    users: Vec<User>,
}

#[derive(Serialize)]
struct UserRemovedReport {
    user: User,
    posts_deleted: usize,
    responses_deleted: usize,
    notifications_deleted: usize,
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let mut session = Session::open(&options.global)?;
    let user = session
        .desk
        .register_user(&options.username, options.email.as_deref())?;

    let actor = session.actor_name().ok();
    let warning = session.emit(EventKind::UserRegistered, actor.as_deref(), &user);

    let mut human = HumanOutput::new(format!("User registered: {}", user.username));
    human.push_summary("id", user.id.to_string());
    if let Some(email) = &user.email {
        human.push_summary("email", email.clone());
    }
    if let Some(warning) = warning {
        human.push_warning(warning);
    }
    human.push_next_step(format!("helpline actor set {}", user.username));

    emit_success(session.output, "user add", &user, Some(&human))
}

pub fn run_list(global: GlobalOptions) -> Result<()> {
    let session = Session::open(&global)?;
    let users = session.desk.list_users()?;

    let mut human = HumanOutput::new(format!("Users ({})", users.len()));
    for user in &users {
        match &user.email {
            Some(email) => human.push_detail(format!("{} {} <{}>", user.id, user.username, email)),
            None => human.push_detail(format!("{} {}", user.id, user.username)),
        }
    }

    let report = UserListReport {
        total: users.len(),
        users,
    };
    emit_success(session.output, "user list", &report, Some(&human))
}

pub fn run_rm(options: RmOptions) -> Result<()> {
    let mut session = Session::open(&options.global)?;
    let user = session.desk.find_user(&options.username)?;
    let removal = session.desk.remove_user(user.id)?;

    let report = UserRemovedReport {
        user: removal.user.unwrap_or(user),
        posts_deleted: removal.posts_deleted,
        responses_deleted: removal.responses_deleted,
        notifications_deleted: removal.notifications_deleted,
    };

    let actor = session.actor_name().ok();
    let warning = session.emit(EventKind::UserRemoved, actor.as_deref(), &report);

    let mut human = HumanOutput::new(format!("User removed: {}", report.user.username));
    human.push_summary("posts deleted", report.posts_deleted.to_string());
    human.push_summary("responses deleted", report.responses_deleted.to_string());
    human.push_summary(
        "notifications deleted",
        report.notifications_deleted.to_string(),
    );
    if let Some(warning) = warning {
        human.push_warning(warning);
    }

    emit_success(session.output, "user rm", &report, Some(&human))
}
