//! `HelpDesk`: the operation surface.
//!
//! Each method is one unit of work against [`Storage`]. Writes go through
//! [`Storage::transaction`]; reads through [`Storage::read`].

use std::path::PathBuf;

use crate::config::Config;
use crate::db::UserRemoval;
use crate::error::Result;
use crate::lifecycle::{self, CompleteOutcome, CreatedPost, RespondOutcome};
use crate::model::{HelpPost, NotificationId, PostDraft, PostId, PostPatch, User, UserId};
use crate::query::{self, Inbox, NotificationView, PostView};
use crate::stations::{self, CategoryView, Station, StationCategory, StationDraft};
use crate::stats::{self, StatEntry};
use crate::storage::Storage;
use crate::users;

#[derive(Debug, Clone)]
pub struct HelpDesk {
    storage: Storage,
    config: Config,
}

impl HelpDesk {
    /// Open the desk rooted at `home`, reading `helpline.toml` if present.
    pub fn open(home: PathBuf) -> Self {
        let config = Config::load_from_home(&home);
        Self::with_config(home, config)
    }

    pub fn with_config(home: PathBuf, config: Config) -> Self {
        let storage = Storage::new(home).with_lock_timeout(config.store.lock_timeout_ms);
        Self { storage, config }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn init(&self) -> Result<bool> {
        self.storage.init()
    }

    // =========================================================================
    // Users
    // =========================================================================

    pub fn register_user(&self, username: &str, email: Option<&str>) -> Result<User> {
        self.storage
            .transaction(|db| users::register(db, username, email))
    }

    pub fn find_user(&self, username: &str) -> Result<User> {
        self.storage
            .read(|db| users::lookup(db, username).cloned())
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        self.storage.read(|db| Ok(users::list(db)))
    }

    pub fn remove_user(&self, user_id: UserId) -> Result<UserRemoval> {
        self.storage.transaction(|db| users::remove(db, user_id))
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub fn create_post(&self, author_id: UserId, draft: PostDraft) -> Result<CreatedPost> {
        let broadcast = self.config.notifications.broadcast_new_posts;
        self.storage
            .transaction(|db| lifecycle::create_post(db, author_id, draft, broadcast))
    }

    pub fn respond(&self, post_id: PostId, volunteer_id: UserId) -> Result<RespondOutcome> {
        self.storage
            .transaction(|db| lifecycle::respond(db, post_id, volunteer_id))
    }

    pub fn complete(&self, post_id: PostId, actor_id: UserId) -> Result<CompleteOutcome> {
        self.storage
            .transaction(|db| lifecycle::complete(db, post_id, actor_id))
    }

    pub fn update_post(
        &self,
        post_id: PostId,
        actor_id: UserId,
        patch: PostPatch,
    ) -> Result<HelpPost> {
        self.storage
            .transaction(|db| lifecycle::update_post(db, post_id, actor_id, patch))
    }

    pub fn delete_post(&self, post_id: PostId, actor_id: UserId) -> Result<HelpPost> {
        self.storage
            .transaction(|db| lifecycle::delete_post(db, post_id, actor_id))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn list_posts(&self, limit: Option<usize>) -> Result<Vec<PostView>> {
        self.storage.read(|db| query::list_posts(db, limit))
    }

    pub fn get_post(&self, post_id: PostId) -> Result<PostView> {
        self.storage.read(|db| query::get_post(db, post_id))
    }

    pub fn search_posts(&self, location: &str) -> Result<Vec<PostView>> {
        self.storage.read(|db| query::search_posts(db, location))
    }

    pub fn leaderboard(&self) -> Result<Vec<StatEntry>> {
        let limit = self.config.leaderboard.limit;
        self.storage.read(|db| stats::leaderboard(db, limit))
    }

    /// Writes, since the stat record is created on first access.
    pub fn my_stats(&self, user_id: UserId) -> Result<StatEntry> {
        self.storage.transaction(|db| stats::my_stats(db, user_id))
    }

    pub fn list_notifications(&self, user_id: UserId, unread_only: bool) -> Result<Inbox> {
        self.storage
            .read(|db| query::list_notifications(db, user_id, unread_only))
    }

    pub fn mark_notification_read(
        &self,
        notification_id: NotificationId,
        user_id: UserId,
        is_read: bool,
    ) -> Result<NotificationView> {
        self.storage.transaction(|db| {
            query::mark_notification_read(db, notification_id, user_id, is_read)
        })
    }

    // =========================================================================
    // Station directory
    // =========================================================================

    pub fn list_stations(&self) -> Result<Vec<CategoryView>> {
        self.storage.read(|db| Ok(stations::list(db)))
    }

    pub fn search_stations(&self, location: &str) -> Result<Vec<Station>> {
        self.storage.read(|db| Ok(stations::search(db, location)))
    }

    pub fn add_station_category(&self, name: &str) -> Result<StationCategory> {
        self.storage
            .transaction(|db| stations::add_category(db, name))
    }

    pub fn add_station(&self, category: &str, draft: StationDraft) -> Result<Station> {
        self.storage
            .transaction(|db| stations::add_station(db, category, draft))
    }
}
