//! Read projections: posts with nested responses, location search and
//! notification inboxes.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::Database;
use crate::error::{Error, Result};
use crate::model::{
    HelpPost, Notification, NotificationId, NotificationKind, PostId, PostState, ResponseId,
    ResponseStatus, UserId,
};
use crate::stats::{summarize, UserSummary};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseView {
    pub id: ResponseId,
    pub volunteer: UserSummary,
    pub status: ResponseStatus,
    pub responded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostView {
    pub id: PostId,
    pub author: UserSummary,
    pub title: Option<String>,
    pub location: String,
    pub exact_location: Option<String>,
    pub image: Option<String>,
    pub description: String,
    pub is_completed: bool,
    pub state: PostState,
    pub created_at: DateTime<Utc>,
    pub responders_count: u32,
    pub responses: Vec<ResponseView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationView {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
    pub post: Option<PostId>,
    pub user: UserSummary,
    pub actor: Option<UserSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inbox {
    pub unread: usize,
    pub notifications: Vec<NotificationView>,
}

/// True when every whitespace-separated term of `query` occurs in `haystack`,
/// ignoring case. An empty query matches everything.
pub fn matches_terms(haystack: &str, query: &str) -> bool {
    let haystack = haystack.to_lowercase();
    query
        .split_whitespace()
        .all(|term| haystack.contains(&term.to_lowercase()))
}

pub fn post_view(db: &Database, post: &HelpPost) -> Result<PostView> {
    let mut responses = db
        .responses_for(post.id)
        .map(|response| {
            Ok(ResponseView {
                id: response.id,
                volunteer: summarize(db, response.volunteer_id)?,
                status: response.status,
                responded_at: response.responded_at,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    responses.sort_by_key(|response| response.id);

    Ok(PostView {
        id: post.id,
        author: summarize(db, post.author_id)?,
        title: post.title.clone(),
        location: post.location.clone(),
        exact_location: post.exact_location.clone(),
        image: post.image.clone(),
        description: post.description.clone(),
        is_completed: post.is_completed,
        state: post.state(),
        created_at: post.created_at,
        responders_count: post.responders_count,
        responses,
    })
}

fn newest_first<'a>(posts: impl Iterator<Item = &'a HelpPost>) -> Vec<&'a HelpPost> {
    let mut posts: Vec<&HelpPost> = posts.collect();
    posts.sort_by(|left, right| {
        right
            .created_at
            .cmp(&left.created_at)
            .then_with(|| right.id.cmp(&left.id))
    });
    posts
}

/// Every post, newest first, optionally capped.
pub fn list_posts(db: &Database, limit: Option<usize>) -> Result<Vec<PostView>> {
    let mut posts = newest_first(db.posts.iter());
    if let Some(limit) = limit {
        posts.truncate(limit);
    }
    posts.into_iter().map(|post| post_view(db, post)).collect()
}

pub fn get_post(db: &Database, post_id: PostId) -> Result<PostView> {
    post_view(db, db.require_post(post_id)?)
}

/// Posts whose location matches `query`, newest first.
pub fn search_posts(db: &Database, query: &str) -> Result<Vec<PostView>> {
    newest_first(
        db.posts
            .iter()
            .filter(|post| matches_terms(&post.location, query)),
    )
    .into_iter()
    .map(|post| post_view(db, post))
    .collect()
}

fn notification_view(db: &Database, notification: &Notification) -> Result<NotificationView> {
    Ok(NotificationView {
        id: notification.id,
        kind: notification.kind,
        message: notification.message.clone(),
        created_at: notification.created_at,
        is_read: notification.is_read,
        post: notification.post_id,
        user: summarize(db, notification.user_id)?,
        actor: notification
            .actor_id
            .map(|actor_id| summarize(db, actor_id))
            .transpose()?,
    })
}

/// A user's notifications, newest first.
pub fn list_notifications(db: &Database, user_id: UserId, unread_only: bool) -> Result<Inbox> {
    db.require_user(user_id)?;

    let mut own: Vec<&Notification> = db
        .notifications
        .iter()
        .filter(|notification| notification.user_id == user_id)
        .collect();
    let unread = own.iter().filter(|notification| !notification.is_read).count();
    if unread_only {
        own.retain(|notification| !notification.is_read);
    }
    own.sort_by(|left, right| {
        right
            .created_at
            .cmp(&left.created_at)
            .then_with(|| right.id.cmp(&left.id))
    });

    let notifications = own
        .into_iter()
        .map(|notification| notification_view(db, notification))
        .collect::<Result<Vec<_>>>()?;
    Ok(Inbox {
        unread,
        notifications,
    })
}

/// Set the read flag on one of the caller's own notifications.
///
/// Notifications addressed to someone else are reported as not found.
pub fn mark_notification_read(
    db: &mut Database,
    notification_id: NotificationId,
    user_id: UserId,
    is_read: bool,
) -> Result<NotificationView> {
    let notification = db
        .notification_mut(notification_id)
        .filter(|notification| notification.user_id == user_id)
        .ok_or_else(|| Error::not_found("notification", notification_id))?;
    notification.is_read = is_read;
    let notification = notification.clone();

    notification_view(db, &notification)
}
