//! helpline notif command implementation

use crate::cli::{GlobalOptions, Session};
use crate::error::Result;
use crate::events::EventKind;
use crate::model::NotificationId;
use crate::output::{emit_success, HumanOutput};

pub struct ListOptions {
    pub unread: bool,
    pub global: GlobalOptions,
}

pub struct ReadOptions {
    pub id: NotificationId,
    pub unread: bool,
    pub global: GlobalOptions,
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let session = Session::open(&options.global)?;
    let user = session.acting_user()?;
    let inbox = session.desk.list_notifications(user.id, options.unread)?;

    let mut human = HumanOutput::new(format!(
        "Notifications for {} ({} unread)",
        user.username, inbox.unread
    ));
    for notification in &inbox.notifications {
        human.push_detail(format!(
            "{} {} {}",
            notification.id,
            if notification.is_read { " " } else { "*" },
            notification.message
        ));
    }
    if let Some(first) = inbox.notifications.iter().find(|n| !n.is_read) {
        human.push_next_step(format!("helpline notif read {}", first.id));
    }

    emit_success(session.output, "notif list", &inbox, Some(&human))
}

pub fn run_read(options: ReadOptions) -> Result<()> {
    let mut session = Session::open(&options.global)?;
    let user = session.acting_user()?;
    let notification = session
        .desk
        .mark_notification_read(options.id, user.id, !options.unread)?;

    let warning = session.emit(
        EventKind::NotificationRead,
        Some(user.username.as_str()),
        &notification,
    );

    let mut human = HumanOutput::new(format!(
        "Notification {} marked {}",
        notification.id,
        if notification.is_read { "read" } else { "unread" }
    ));
    human.push_summary("message", notification.message.clone());
    if let Some(warning) = warning {
        human.push_warning(warning);
    }

    emit_success(session.output, "notif read", &notification, Some(&human))
}
