//! Persisted entities: users, help posts, volunteer responses, stats and
//! notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub type UserId = u64;
pub type PostId = u64;
pub type ResponseId = u64;
pub type NotificationId = u64;

const MAX_TITLE_CHARS: usize = 255;
const MAX_LOCATION_CHARS: usize = 500;
const MAX_USERNAME_CHARS: usize = 150;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub joined_at: DateTime<Utc>,
}

/// Lifecycle state of a help post. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostState {
    Open,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelpPost {
    pub id: PostId,
    pub author_id: UserId,
    #[serde(default)]
    pub title: Option<String>,
    pub location: String,
    #[serde(default)]
    pub exact_location: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    pub description: String,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub responders_count: u32,
}

impl HelpPost {
    pub fn state(&self) -> PostState {
        if self.is_completed {
            PostState::Completed
        } else {
            PostState::Open
        }
    }

    /// Title as shown in notification text; an untitled post renders as `None`.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("None")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    OnTheWay,
    Completed,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::OnTheWay => "on_the_way",
            ResponseStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerResponse {
    pub id: ResponseId,
    pub post_id: PostId,
    pub volunteer_id: UserId,
    pub status: ResponseStatus,
    pub responded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolunteerStat {
    pub user_id: UserId,
    pub completed_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewPost,
    VolunteerOnTheWay,
    TaskCompleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    #[serde(default)]
    pub actor_id: Option<UserId>,
    #[serde(default)]
    pub post_id: Option<PostId>,
    pub kind: NotificationKind,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields a user supplies when asking for help.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostDraft {
    pub title: Option<String>,
    pub location: String,
    pub exact_location: Option<String>,
    pub image: Option<String>,
    pub description: String,
}

impl PostDraft {
    pub fn new(location: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_exact_location(mut self, exact_location: impl Into<String>) -> Self {
        self.exact_location = Some(exact_location.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Trim every field, turn blank optionals into `None`, and check limits.
    pub fn validated(self) -> Result<Self> {
        Ok(Self {
            title: optional_text("title", self.title, MAX_TITLE_CHARS)?,
            location: required_text("location", &self.location, MAX_LOCATION_CHARS)?,
            exact_location: optional_text(
                "exact_location",
                self.exact_location,
                MAX_LOCATION_CHARS,
            )?,
            image: self
                .image
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            description: required_text("description", &self.description, usize::MAX)?,
        })
    }
}

/// Partial edit of a post. `None` leaves a field alone; for optional fields an
/// empty string clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostPatch {
    pub title: Option<String>,
    pub location: Option<String>,
    pub exact_location: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.location.is_none()
            && self.exact_location.is_none()
            && self.image.is_none()
            && self.description.is_none()
    }

    /// Apply onto the post's current content, validating the result as a draft.
    pub fn apply(self, post: &mut HelpPost) -> Result<()> {
        let draft = PostDraft {
            title: self.title.or_else(|| post.title.clone()),
            location: self.location.unwrap_or_else(|| post.location.clone()),
            exact_location: self.exact_location.or_else(|| post.exact_location.clone()),
            image: self.image.or_else(|| post.image.clone()),
            description: self.description.unwrap_or_else(|| post.description.clone()),
        }
        .validated()?;

        post.title = draft.title;
        post.location = draft.location;
        post.exact_location = draft.exact_location;
        post.image = draft.image;
        post.description = draft.description;
        Ok(())
    }
}

pub fn validate_username(raw: &str) -> Result<String> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(Error::Validation("username cannot be empty".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(Error::Validation(format!(
            "username must be at most {MAX_USERNAME_CHARS} characters"
        )));
    }
    if let Some(bad) = username
        .chars()
        .find(|ch| !(ch.is_alphanumeric() || matches!(ch, '@' | '.' | '+' | '-' | '_')))
    {
        return Err(Error::Validation(format!(
            "username contains invalid character '{bad}'"
        )));
    }
    Ok(username.to_string())
}

pub fn validate_email(raw: Option<&str>) -> Result<Option<String>> {
    let email = match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(email) => email,
        None => return Ok(None),
    };
    let valid = email
        .split_once('@')
        .map(|(local, domain)| !local.is_empty() && !domain.is_empty())
        .unwrap_or(false);
    if !valid {
        return Err(Error::Validation(format!("invalid email address: {email}")));
    }
    Ok(Some(email.to_string()))
}

pub(crate) fn required_text(field: &str, raw: &str, max_chars: usize) -> Result<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(Error::Validation(format!("{field} cannot be empty")));
    }
    if value.chars().count() > max_chars {
        return Err(Error::Validation(format!(
            "{field} must be at most {max_chars} characters"
        )));
    }
    Ok(value.to_string())
}

fn optional_text(field: &str, raw: Option<String>, max_chars: usize) -> Result<Option<String>> {
    match raw.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => required_text(field, value, max_chars).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_validation_trims_and_drops_blank_optionals() {
        let draft = PostDraft::new("  Main St ", " need water ")
            .with_title("   ")
            .with_exact_location("")
            .validated()
            .unwrap();

        assert_eq!(draft.location, "Main St");
        assert_eq!(draft.description, "need water");
        assert_eq!(draft.title, None);
        assert_eq!(draft.exact_location, None);
    }

    #[test]
    fn draft_requires_location_and_description() {
        let err = PostDraft::new(" ", "help").validated().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = PostDraft::new("Main St", "").validated().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn draft_rejects_overlong_title() {
        let err = PostDraft::new("Main St", "help")
            .with_title("x".repeat(256))
            .validated()
            .unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }

    #[test]
    fn username_rules() {
        assert_eq!(validate_username(" ann.b+c@x_y-z ").unwrap(), "ann.b+c@x_y-z");
        assert!(validate_username("").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"a".repeat(151)).is_err());
    }

    #[test]
    fn email_rules() {
        assert_eq!(validate_email(None).unwrap(), None);
        assert_eq!(validate_email(Some("  ")).unwrap(), None);
        assert_eq!(
            validate_email(Some("a@b.org")).unwrap(),
            Some("a@b.org".to_string())
        );
        assert!(validate_email(Some("nope")).is_err());
        assert!(validate_email(Some("@b.org")).is_err());
    }
}
