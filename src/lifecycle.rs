//! Help-request lifecycle: the post state machine and its guards.
//!
//! A post starts `open` and ends `completed`. Volunteers respond while it is
//! open; only the author may complete, edit or delete it. Every function here
//! runs inside one [`crate::storage::Storage::transaction`], so a failure at
//! any step leaves no trace.

use serde::Serialize;
use tracing::{debug, info};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::model::{
    HelpPost, PostDraft, PostId, PostPatch, ResponseStatus, UserId, VolunteerResponse,
};
use crate::notify::{self, FanOut};
use crate::stats;

#[derive(Debug, Clone, Serialize)]
pub struct CreatedPost {
    pub post: HelpPost,
    pub fan_out: FanOut,
}

#[derive(Debug, Clone, Serialize)]
pub struct RespondOutcome {
    pub response: VolunteerResponse,
    pub created: bool,
    pub responders_count: u32,
}

/// A responder credited by a completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credit {
    pub volunteer_id: UserId,
    pub completed_count: u32,
    pub notified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CompleteOutcome {
    Completed { credited: Vec<Credit> },
    AlreadyCompleted,
}

fn ensure_author(post: &HelpPost, actor_id: UserId, action: &str) -> Result<()> {
    if post.author_id != actor_id {
        return Err(Error::Forbidden(format!(
            "only the author can {action} post {}",
            post.id
        )));
    }
    Ok(())
}

/// Create an open post and, when `broadcast` is set, notify every other user.
pub fn create_post(
    db: &mut Database,
    author_id: UserId,
    draft: PostDraft,
    broadcast: bool,
) -> Result<CreatedPost> {
    let draft = draft.validated()?;
    let post = db.insert_post(author_id, draft)?;

    let fan_out = if broadcast {
        notify::broadcast_new_post(db, &post)?
    } else {
        FanOut::default()
    };

    info!(post_id = post.id, author_id, "post created");
    Ok(CreatedPost { post, fan_out })
}

/// Record that `volunteer_id` is on the way.
///
/// Responding twice returns the existing response with `created = false`.
pub fn respond(db: &mut Database, post_id: PostId, volunteer_id: UserId) -> Result<RespondOutcome> {
    let post = db.require_post(post_id)?.clone();
    let volunteer = db.require_user(volunteer_id)?.clone();

    if post.is_completed {
        return Err(Error::InvalidState(format!(
            "post {post_id} is already completed"
        )));
    }
    if post.author_id == volunteer_id {
        return Err(Error::Forbidden(
            "authors cannot respond to their own post".to_string(),
        ));
    }

    let response = match db.insert_response(post_id, volunteer_id) {
        Ok(response) => response,
        Err(err) if err.is_unique_violation() => {
            let existing = db
                .response_for(post_id, volunteer_id)
                .cloned()
                .ok_or(err)?;
            debug!(post_id, volunteer_id, "response already recorded");
            return Ok(RespondOutcome {
                response: existing,
                created: false,
                responders_count: post.responders_count,
            });
        }
        Err(err) => return Err(err),
    };

    let responders_count = db.refresh_responders_count(post_id);
    notify::notify_on_the_way(db, &post, &volunteer)?;

    info!(post_id, volunteer_id, responders_count, "volunteer responded");
    Ok(RespondOutcome {
        response,
        created: true,
        responders_count,
    })
}

/// Mark a post completed and credit its responders.
///
/// Each `on_the_way` response moves to `completed`, its volunteer's counter
/// goes up by one and the volunteer is notified. Responses already
/// `completed` are left alone. Completing twice is a no-op.
pub fn complete(db: &mut Database, post_id: PostId, actor_id: UserId) -> Result<CompleteOutcome> {
    let post = db.require_post(post_id)?.clone();
    ensure_author(&post, actor_id, "complete")?;

    if post.is_completed {
        debug!(post_id, "post already completed");
        return Ok(CompleteOutcome::AlreadyCompleted);
    }

    db.require_post_mut(post_id)?.is_completed = true;

    let mut advancing: Vec<(u64, UserId)> = db
        .responses_for(post_id)
        .filter(|response| response.status == ResponseStatus::OnTheWay)
        .map(|response| (response.id, response.volunteer_id))
        .collect();
    advancing.sort_unstable();

    let mut credited = Vec::with_capacity(advancing.len());
    for (response_id, volunteer_id) in advancing {
        if let Some(response) = db.responses.iter_mut().find(|r| r.id == response_id) {
            response.status = ResponseStatus::Completed;
        }
        let completed_count = stats::credit(db, volunteer_id)?;
        let notified = notify::notify_completed(db, &post, volunteer_id)?.is_some();
        credited.push(Credit {
            volunteer_id,
            completed_count,
            notified,
        });
    }

    info!(post_id, credited = credited.len(), "post completed");
    Ok(CompleteOutcome::Completed { credited })
}

/// Edit a post's content. Never touches completion or the responder count.
pub fn update_post(
    db: &mut Database,
    post_id: PostId,
    actor_id: UserId,
    patch: PostPatch,
) -> Result<HelpPost> {
    let post = db.require_post_mut(post_id)?;
    ensure_author(post, actor_id, "edit")?;
    if patch.is_empty() {
        return Err(Error::InvalidArgument("nothing to update".to_string()));
    }

    patch.apply(post)?;
    info!(post_id, "post updated");
    Ok(post.clone())
}

/// Delete a post with its responses. Credited stats are kept.
pub fn delete_post(db: &mut Database, post_id: PostId, actor_id: UserId) -> Result<HelpPost> {
    ensure_author(db.require_post(post_id)?, actor_id, "delete")?;

    let (post, responses) = db
        .delete_post(post_id)
        .ok_or_else(|| Error::not_found("post", post_id))?;
    info!(post_id, responses, "post deleted");
    Ok(post)
}
