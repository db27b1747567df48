//! User directory.
//!
//! Authentication happens elsewhere; this only records who exists so posts,
//! responses and notifications have someone to point at.

use tracing::info;

use crate::db::{Database, UserRemoval};
use crate::error::{Error, Result};
use crate::model::{validate_email, validate_username, User, UserId};

pub fn register(db: &mut Database, username: &str, email: Option<&str>) -> Result<User> {
    let username = validate_username(username)?;
    let email = validate_email(email)?;
    let user = db.insert_user(username, email)?;
    info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}

pub fn lookup<'a>(db: &'a Database, username: &str) -> Result<&'a User> {
    let username = username.trim();
    db.user_by_username(username)
        .ok_or_else(|| Error::not_found("user", username))
}

/// Remove a user along with their posts, responses, stat and inbox.
pub fn remove(db: &mut Database, user_id: UserId) -> Result<UserRemoval> {
    db.require_user(user_id)?;
    let removal = db.delete_user(user_id);
    info!(
        user_id,
        posts = removal.posts_deleted,
        responses = removal.responses_deleted,
        "user removed"
    );
    Ok(removal)
}

pub fn list(db: &Database) -> Vec<User> {
    let mut users = db.users.clone();
    users.sort_by(|left, right| left.username.cmp(&right.username));
    users
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_validates_and_rejects_duplicates() {
        let mut db = Database::default();
        let ann = register(&mut db, " ann ", Some("ann@example.org")).unwrap();
        assert_eq!(ann.username, "ann");
        assert_eq!(ann.email.as_deref(), Some("ann@example.org"));

        assert!(register(&mut db, "ann", None).unwrap_err().is_unique_violation());
        assert_eq!(
            register(&mut db, "bad name", None).unwrap_err().code(),
            "validation_error"
        );
    }

    #[test]
    fn lookup_and_list() {
        let mut db = Database::default();
        register(&mut db, "cat", None).unwrap();
        register(&mut db, "ann", None).unwrap();

        assert_eq!(lookup(&db, "cat").unwrap().id, 1);
        assert_eq!(lookup(&db, "zed").unwrap_err().code(), "not_found");

        let names: Vec<String> = list(&db).into_iter().map(|u| u.username).collect();
        assert_eq!(names, vec!["ann", "cat"]);
    }

    #[test]
    fn remove_unknown_user_is_not_found() {
        let mut db = Database::default();
        assert_eq!(remove(&mut db, 4).unwrap_err().code(), "not_found");
    }
}
