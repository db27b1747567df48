//! In-memory relational snapshot persisted by [`crate::storage::Storage`].
//!
//! Tables mirror the entities in [`crate::model`] plus the station directory.
//! Ids come from per-table sequences and are never reused. Constraints:
//!
//! - `users.username` is unique
//! - `responses (post_id, volunteer_id)` is unique
//! - `stats.user_id` is unique
//! - an unread notification is unique per `(user_id, actor_id, post_id, kind)`
//! - `posts.responders_count` equals the number of responses for the post
//!
//! Deleting rows follows the ownership rules: posts cascade to responses,
//! users cascade to everything they own, and notifications only lose their
//! weak post/actor references.

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    HelpPost, Notification, NotificationId, NotificationKind, PostDraft, PostId, ResponseStatus,
    User, UserId, VolunteerResponse, VolunteerStat,
};
use crate::stations::{Station, StationCategory};

pub const DB_SCHEMA_VERSION: &str = "helpline.db.v1";

fn default_schema_version() -> String {
    DB_SCHEMA_VERSION.to_string()
}

/// Last id handed out per table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequences {
    #[serde(default)]
    pub users: u64,
    #[serde(default)]
    pub posts: u64,
    #[serde(default)]
    pub responses: u64,
    #[serde(default)]
    pub notifications: u64,
    #[serde(default)]
    pub station_categories: u64,
    #[serde(default)]
    pub stations: u64,
}

pub(crate) fn next_id(counter: &mut u64) -> u64 {
    *counter += 1;
    *counter
}

/// A notification about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub user_id: UserId,
    pub actor_id: Option<UserId>,
    pub post_id: Option<PostId>,
    pub kind: NotificationKind,
    pub message: String,
}

/// What a user removal took with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserRemoval {
    pub user: Option<User>,
    pub posts_deleted: usize,
    pub responses_deleted: usize,
    pub notifications_deleted: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default)]
    pub sequences: Sequences,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub posts: Vec<HelpPost>,
    #[serde(default)]
    pub responses: Vec<VolunteerResponse>,
    #[serde(default)]
    pub stats: Vec<VolunteerStat>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub station_categories: Vec<StationCategory>,
    #[serde(default)]
    pub stations: Vec<Station>,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            sequences: Sequences::default(),
            users: Vec::new(),
            posts: Vec::new(),
            responses: Vec::new(),
            stats: Vec::new(),
            notifications: Vec::new(),
            station_categories: Vec::new(),
            stations: Vec::new(),
        }
    }
}

impl Database {
    // =========================================================================
    // Users
    // =========================================================================

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn require_user(&self, id: UserId) -> Result<&User> {
        self.user(id).ok_or_else(|| Error::not_found("user", id))
    }

    pub fn user_by_username(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|user| user.username == username)
    }

    pub fn insert_user(&mut self, username: String, email: Option<String>) -> Result<User> {
        if self.user_by_username(&username).is_some() {
            return Err(Error::UniqueViolation {
                table: "users",
                key: username,
            });
        }

        let user = User {
            id: next_id(&mut self.sequences.users),
            username,
            email,
            joined_at: Utc::now(),
        };
        self.users.push(user.clone());
        Ok(user)
    }

    /// Remove a user and everything the user owns.
    pub fn delete_user(&mut self, id: UserId) -> UserRemoval {
        let idx = match self.users.iter().position(|user| user.id == id) {
            Some(idx) => idx,
            None => return UserRemoval::default(),
        };
        let user = self.users.remove(idx);

        let authored: Vec<PostId> = self
            .posts
            .iter()
            .filter(|post| post.author_id == id)
            .map(|post| post.id)
            .collect();
        let mut responses_deleted = 0;
        for post_id in &authored {
            responses_deleted += self.delete_post(*post_id).map(|(_, n)| n).unwrap_or(0);
        }

        let touched: HashSet<PostId> = self
            .responses
            .iter()
            .filter(|response| response.volunteer_id == id)
            .map(|response| response.post_id)
            .collect();
        let before = self.responses.len();
        self.responses.retain(|response| response.volunteer_id != id);
        responses_deleted += before - self.responses.len();
        for post_id in touched {
            self.refresh_responders_count(post_id);
        }

        self.stats.retain(|stat| stat.user_id != id);

        let before = self.notifications.len();
        self.notifications.retain(|notification| notification.user_id != id);
        let notifications_deleted = before - self.notifications.len();
        for notification in &mut self.notifications {
            if notification.actor_id == Some(id) {
                notification.actor_id = None;
            }
        }

        UserRemoval {
            user: Some(user),
            posts_deleted: authored.len(),
            responses_deleted,
            notifications_deleted,
        }
    }

    // =========================================================================
    // Posts
    // =========================================================================

    pub fn post(&self, id: PostId) -> Option<&HelpPost> {
        self.posts.iter().find(|post| post.id == id)
    }

    pub fn post_mut(&mut self, id: PostId) -> Option<&mut HelpPost> {
        self.posts.iter_mut().find(|post| post.id == id)
    }

    pub fn require_post(&self, id: PostId) -> Result<&HelpPost> {
        self.post(id).ok_or_else(|| Error::not_found("post", id))
    }

    pub fn require_post_mut(&mut self, id: PostId) -> Result<&mut HelpPost> {
        self.post_mut(id).ok_or_else(|| Error::not_found("post", id))
    }

    /// Insert an open post with no responders. The draft must already be validated.
    pub fn insert_post(&mut self, author_id: UserId, draft: PostDraft) -> Result<HelpPost> {
        self.require_user(author_id)?;

        let post = HelpPost {
            id: next_id(&mut self.sequences.posts),
            author_id,
            title: draft.title,
            location: draft.location,
            exact_location: draft.exact_location,
            image: draft.image,
            description: draft.description,
            is_completed: false,
            created_at: Utc::now(),
            responders_count: 0,
        };
        self.posts.push(post.clone());
        Ok(post)
    }

    /// Delete a post with its responses. Returns the post and the number of
    /// responses removed.
    pub fn delete_post(&mut self, id: PostId) -> Option<(HelpPost, usize)> {
        let idx = self.posts.iter().position(|post| post.id == id)?;
        let post = self.posts.remove(idx);

        let before = self.responses.len();
        self.responses.retain(|response| response.post_id != id);
        let removed = before - self.responses.len();

        for notification in &mut self.notifications {
            if notification.post_id == Some(id) {
                notification.post_id = None;
            }
        }

        Some((post, removed))
    }

    // =========================================================================
    // Responses
    // =========================================================================

    pub fn responses_for(&self, post_id: PostId) -> impl Iterator<Item = &VolunteerResponse> {
        self.responses
            .iter()
            .filter(move |response| response.post_id == post_id)
    }

    pub fn response_for(&self, post_id: PostId, volunteer_id: UserId) -> Option<&VolunteerResponse> {
        self.responses
            .iter()
            .find(|response| response.post_id == post_id && response.volunteer_id == volunteer_id)
    }

    /// Insert an `on_the_way` response, enforcing the (post, volunteer) key.
    pub fn insert_response(
        &mut self,
        post_id: PostId,
        volunteer_id: UserId,
    ) -> Result<VolunteerResponse> {
        if self.response_for(post_id, volunteer_id).is_some() {
            return Err(Error::UniqueViolation {
                table: "responses",
                key: format!("({post_id}, {volunteer_id})"),
            });
        }

        let response = VolunteerResponse {
            id: next_id(&mut self.sequences.responses),
            post_id,
            volunteer_id,
            status: ResponseStatus::OnTheWay,
            responded_at: Utc::now(),
        };
        self.responses.push(response.clone());
        Ok(response)
    }

    /// Recount responses for a post and store the count. Returns the new count.
    pub fn refresh_responders_count(&mut self, post_id: PostId) -> u32 {
        let count = self.responses_for(post_id).count() as u32;
        if let Some(post) = self.post_mut(post_id) {
            post.responders_count = count;
        }
        count
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    pub fn notification(&self, id: NotificationId) -> Option<&Notification> {
        self.notifications
            .iter()
            .find(|notification| notification.id == id)
    }

    pub fn notification_mut(&mut self, id: NotificationId) -> Option<&mut Notification> {
        self.notifications
            .iter_mut()
            .find(|notification| notification.id == id)
    }

    /// Insert a notification; an identical unread one already pending is a conflict.
    pub fn insert_notification(&mut self, new: NewNotification) -> Result<Notification> {
        let pending = self.notifications.iter().any(|existing| {
            !existing.is_read
                && existing.user_id == new.user_id
                && existing.actor_id == new.actor_id
                && existing.post_id == new.post_id
                && existing.kind == new.kind
        });
        if pending {
            return Err(Error::UniqueViolation {
                table: "notifications",
                key: format!(
                    "({}, {:?}, {:?}, {:?})",
                    new.user_id, new.actor_id, new.post_id, new.kind
                ),
            });
        }

        let notification = Notification {
            id: next_id(&mut self.sequences.notifications),
            user_id: new.user_id,
            actor_id: new.actor_id,
            post_id: new.post_id,
            kind: new.kind,
            message: new.message,
            is_read: false,
            created_at: Utc::now(),
        };
        self.notifications.push(notification.clone());
        Ok(notification)
    }

    // =========================================================================
    // Constraint check
    // =========================================================================

    /// Check every table constraint. Run before a snapshot is persisted.
    pub fn validate(&self) -> Result<()> {
        let mut usernames = HashSet::new();
        for user in &self.users {
            if !usernames.insert(user.username.as_str()) {
                return Err(integrity(format!("duplicate username: {}", user.username)));
            }
        }

        for post in &self.posts {
            if self.user(post.author_id).is_none() {
                return Err(integrity(format!(
                    "post {} references missing author {}",
                    post.id, post.author_id
                )));
            }
            let count = self.responses_for(post.id).count() as u32;
            if post.responders_count != count {
                return Err(integrity(format!(
                    "post {} responders_count {} != {} responses",
                    post.id, post.responders_count, count
                )));
            }
        }

        let mut pairs = HashSet::new();
        for response in &self.responses {
            if !pairs.insert((response.post_id, response.volunteer_id)) {
                return Err(integrity(format!(
                    "duplicate response ({}, {})",
                    response.post_id, response.volunteer_id
                )));
            }
            if self.post(response.post_id).is_none() {
                return Err(integrity(format!(
                    "response {} references missing post {}",
                    response.id, response.post_id
                )));
            }
        }

        let mut stat_users = HashSet::new();
        for stat in &self.stats {
            if !stat_users.insert(stat.user_id) {
                return Err(integrity(format!("duplicate stat for user {}", stat.user_id)));
            }
        }

        let max_ids = [
            ("users", self.users.iter().map(|r| r.id).max(), self.sequences.users),
            ("posts", self.posts.iter().map(|r| r.id).max(), self.sequences.posts),
            (
                "responses",
                self.responses.iter().map(|r| r.id).max(),
                self.sequences.responses,
            ),
            (
                "notifications",
                self.notifications.iter().map(|r| r.id).max(),
                self.sequences.notifications,
            ),
            (
                "station_categories",
                self.station_categories.iter().map(|r| r.id).max(),
                self.sequences.station_categories,
            ),
            (
                "stations",
                self.stations.iter().map(|r| r.id).max(),
                self.sequences.stations,
            ),
        ];
        for (table, max_id, sequence) in max_ids {
            if max_id.unwrap_or(0) > sequence {
                return Err(integrity(format!("sequence for {table} is behind its rows")));
            }
        }

        Ok(())
    }
}

fn integrity(message: String) -> Error {
    Error::OperationFailed(format!("integrity check failed: {message}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_with_users(names: &[&str]) -> Database {
        let mut db = Database::default();
        for name in names {
            db.insert_user(name.to_string(), None).unwrap();
        }
        db
    }

    #[test]
    fn usernames_are_unique() {
        let mut db = db_with_users(&["ann"]);
        let err = db.insert_user("ann".to_string(), None).unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[test]
    fn response_pair_is_unique() {
        let mut db = db_with_users(&["ann", "ben"]);
        let post = db.insert_post(1, PostDraft::new("Main St", "help")).unwrap();

        db.insert_response(post.id, 2).unwrap();
        let err = db.insert_response(post.id, 2).unwrap_err();
        assert!(matches!(err, Error::UniqueViolation { table: "responses", .. }));
    }

    #[test]
    fn ids_are_never_reused() {
        let mut db = db_with_users(&["ann"]);
        let first = db.insert_post(1, PostDraft::new("A", "a")).unwrap();
        db.delete_post(first.id);
        let second = db.insert_post(1, PostDraft::new("B", "b")).unwrap();
        assert_eq!(second.id, first.id + 1);
    }

    #[test]
    fn pending_duplicate_notification_conflicts_until_read() {
        let mut db = db_with_users(&["ann", "ben"]);
        let new = NewNotification {
            user_id: 1,
            actor_id: Some(2),
            post_id: None,
            kind: NotificationKind::VolunteerOnTheWay,
            message: "hi".to_string(),
        };

        let first = db.insert_notification(new.clone()).unwrap();
        assert!(db.insert_notification(new.clone()).is_err());

        db.notification_mut(first.id).unwrap().is_read = true;
        assert!(db.insert_notification(new).is_ok());
    }

    #[test]
    fn deleting_post_cascades_responses_and_nulls_notifications() {
        let mut db = db_with_users(&["ann", "ben"]);
        let post = db.insert_post(1, PostDraft::new("Main St", "help")).unwrap();
        db.insert_response(post.id, 2).unwrap();
        db.refresh_responders_count(post.id);
        let note = db
            .insert_notification(NewNotification {
                user_id: 2,
                actor_id: Some(1),
                post_id: Some(post.id),
                kind: NotificationKind::NewPost,
                message: "new".to_string(),
            })
            .unwrap();

        let (_, removed) = db.delete_post(post.id).unwrap();
        assert_eq!(removed, 1);
        assert!(db.responses.is_empty());
        assert_eq!(db.notification(note.id).unwrap().post_id, None);
        db.validate().unwrap();
    }

    #[test]
    fn deleting_user_cascades_and_recounts() {
        let mut db = db_with_users(&["ann", "ben", "cat"]);
        let ann_post = db.insert_post(1, PostDraft::new("Main St", "help")).unwrap();
        let cat_post = db.insert_post(3, PostDraft::new("Elm St", "help")).unwrap();
        db.insert_response(ann_post.id, 2).unwrap();
        db.insert_response(cat_post.id, 2).unwrap();
        db.insert_response(cat_post.id, 1).unwrap();
        db.refresh_responders_count(ann_post.id);
        db.refresh_responders_count(cat_post.id);
        db.insert_notification(NewNotification {
            user_id: 3,
            actor_id: Some(1),
            post_id: Some(cat_post.id),
            kind: NotificationKind::VolunteerOnTheWay,
            message: "ann is on the way".to_string(),
        })
        .unwrap();

        let removal = db.delete_user(1);
        assert_eq!(removal.posts_deleted, 1);
        assert_eq!(removal.responses_deleted, 2);
        assert_eq!(db.post(cat_post.id).unwrap().responders_count, 1);
        assert_eq!(db.notifications[0].actor_id, None);
        db.validate().unwrap();
    }

    #[test]
    fn validate_catches_stale_responder_count() {
        let mut db = db_with_users(&["ann", "ben"]);
        let post = db.insert_post(1, PostDraft::new("Main St", "help")).unwrap();
        db.insert_response(post.id, 2).unwrap();

        let err = db.validate().unwrap_err();
        assert!(matches!(err, Error::OperationFailed(_)));

        db.refresh_responders_count(post.id);
        db.validate().unwrap();
    }
}
