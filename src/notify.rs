//! Notification emitter.
//!
//! Three triggers produce notifications: a new post (broadcast to everyone
//! but the author), a volunteer responding (to the author) and a task being
//! completed (to each credited responder). Delivery is best-effort per
//! recipient: a pending duplicate is a conflict that is logged and skipped,
//! never surfaced to the action that triggered it.

use serde::Serialize;
use tracing::debug;

use crate::db::{Database, NewNotification};
use crate::error::Result;
use crate::model::{HelpPost, Notification, NotificationId, NotificationKind, User, UserId};

/// Longest message stored, in characters
pub const MAX_MESSAGE_CHARS: usize = 255;

/// Outcome of a broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FanOut {
    pub delivered: Vec<NotificationId>,
    pub skipped: usize,
}

pub fn new_post_message(post: &HelpPost) -> String {
    format!(
        "New help request: {} at {}",
        post.display_title(),
        post.location
    )
}

pub fn on_the_way_message(volunteer: &User, post: &HelpPost) -> String {
    format!(
        "{} is on the way to help your request: {}",
        volunteer.username,
        post.display_title()
    )
}

pub fn completed_message(post: &HelpPost) -> String {
    format!(
        "Task '{}' was marked completed. Your help has been counted!",
        post.display_title()
    )
}

/// Cut a message down to [`MAX_MESSAGE_CHARS`] on a char boundary.
pub fn truncate_message(message: String) -> String {
    match message.char_indices().nth(MAX_MESSAGE_CHARS) {
        Some((idx, _)) => message[..idx].to_string(),
        None => message,
    }
}

/// Broadcast a new post to every user except its author.
pub fn broadcast_new_post(db: &mut Database, post: &HelpPost) -> Result<FanOut> {
    let mut recipients: Vec<UserId> = db
        .users
        .iter()
        .map(|user| user.id)
        .filter(|id| *id != post.author_id)
        .collect();
    recipients.sort_unstable();

    let message = truncate_message(new_post_message(post));
    let mut fan_out = FanOut::default();
    for user_id in recipients {
        let delivered = deliver(
            db,
            NewNotification {
                user_id,
                actor_id: Some(post.author_id),
                post_id: Some(post.id),
                kind: NotificationKind::NewPost,
                message: message.clone(),
            },
        )?;
        match delivered {
            Some(notification) => fan_out.delivered.push(notification.id),
            None => fan_out.skipped += 1,
        }
    }

    debug!(
        post_id = post.id,
        delivered = fan_out.delivered.len(),
        skipped = fan_out.skipped,
        "new post broadcast"
    );
    Ok(fan_out)
}

/// Tell the author that a volunteer is on the way.
pub fn notify_on_the_way(
    db: &mut Database,
    post: &HelpPost,
    volunteer: &User,
) -> Result<Option<Notification>> {
    deliver(
        db,
        NewNotification {
            user_id: post.author_id,
            actor_id: Some(volunteer.id),
            post_id: Some(post.id),
            kind: NotificationKind::VolunteerOnTheWay,
            message: truncate_message(on_the_way_message(volunteer, post)),
        },
    )
}

/// Tell a responder that the task they helped with is complete.
pub fn notify_completed(
    db: &mut Database,
    post: &HelpPost,
    responder_id: UserId,
) -> Result<Option<Notification>> {
    deliver(
        db,
        NewNotification {
            user_id: responder_id,
            actor_id: Some(post.author_id),
            post_id: Some(post.id),
            kind: NotificationKind::TaskCompleted,
            message: truncate_message(completed_message(post)),
        },
    )
}

fn deliver(db: &mut Database, new: NewNotification) -> Result<Option<Notification>> {
    let recipient = new.user_id;
    let kind = new.kind;
    match db.insert_notification(new) {
        Ok(notification) => Ok(Some(notification)),
        Err(err) if err.is_unique_violation() => {
            debug!(recipient, ?kind, error = %err, "notification skipped");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
