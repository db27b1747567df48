//! helpline post command implementation
//!
//! Create, browse and edit help requests, respond as a volunteer, and
//! complete a request as its author.

use serde::Serialize;

use crate::cli::{GlobalOptions, Session};
use crate::error::Result;
use crate::events::EventKind;
use crate::lifecycle::CompleteOutcome;
use crate::model::{PostDraft, PostId, PostPatch};
use crate::output::{emit_success, HumanOutput};
use crate::query::PostView;

pub struct NewOptions {
    pub location: String,
    pub description: String,
    pub title: Option<String>,
    pub exact_location: Option<String>,
    pub image: Option<String>,
    pub global: GlobalOptions,
}

pub struct ListOptions {
    pub limit: Option<usize>,
    pub global: GlobalOptions,
}

/// Options for commands that take a single post id.
pub struct ShowOptions {
    pub id: PostId,
    pub global: GlobalOptions,
}

pub struct SearchOptions {
    pub query: String,
    pub global: GlobalOptions,
}

pub struct EditOptions {
    pub id: PostId,
    pub title: Option<String>,
    pub location: Option<String>,
    pub exact_location: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub global: GlobalOptions,
}

#[derive(Serialize)]
struct PostListReport {
    total: usize,
    posts: Vec<PostView>,
}

#[derive(Serialize)]
struct PostCreatedReport {
    post: PostView,
    notified: usize,
}

#[derive(Serialize)]
struct PostDeletedReport {
    id: PostId,
    title: Option<String>,
    location: String,
}

#[derive(Serialize)]
struct RespondReport {
    post_id: PostId,
    response_id: u64,
    status: &'static str,
    created: bool,
    responders_count: u32,
}

#[derive(Serialize)]
struct CompleteReport {
    post_id: PostId,
    outcome: CompleteOutcome,
}

pub fn run_new(options: NewOptions) -> Result<()> {
    let mut session = Session::open(&options.global)?;
    let author = session.acting_user()?;

    let mut draft = PostDraft::new(options.location, options.description);
    draft.title = options.title;
    draft.exact_location = options.exact_location;
    draft.image = options.image;

    let created = session.desk.create_post(author.id, draft)?;
    let post = session.desk.get_post(created.post.id)?;
    let report = PostCreatedReport {
        post,
        notified: created.fan_out.delivered.len(),
    };

    let actor = Some(author.username.as_str());
    let warning = session.emit(EventKind::PostCreated, actor, &report.post);

    let mut human = HumanOutput::new(format!("Post created: {}", report.post.id));
    push_post_summary(&mut human, &report.post);
    human.push_summary("notified", report.notified.to_string());
    if let Some(warning) = warning {
        human.push_warning(warning);
    }
    human.push_next_step(format!("helpline post show {}", report.post.id));

    emit_success(session.output, "post new", &report, Some(&human))
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let session = Session::open(&options.global)?;
    let posts = session.desk.list_posts(options.limit)?;
    emit_post_list(&session, "post list", "Posts", posts)
}

pub fn run_search(options: SearchOptions) -> Result<()> {
    let session = Session::open(&options.global)?;
    let posts = session.desk.search_posts(&options.query)?;
    let header = format!("Posts matching '{}'", options.query);
    emit_post_list(&session, "post search", &header, posts)
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let session = Session::open(&options.global)?;
    let post = session.desk.get_post(options.id)?;

    let mut human = HumanOutput::new(format!(
        "Post {}: {}",
        post.id,
        post.title.as_deref().unwrap_or("(untitled)")
    ));
    push_post_summary(&mut human, &post);
    human.push_detail(post.description.clone());
    for response in &post.responses {
        human.push_detail(format!(
            "{} {} since {}",
            response.volunteer.username,
            response.status.as_str(),
            response.responded_at.to_rfc3339()
        ));
    }
    if !post.is_completed {
        human.push_next_step(format!("helpline post respond {}", post.id));
    }

    emit_success(session.output, "post show", &post, Some(&human))
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let mut session = Session::open(&options.global)?;
    let actor = session.acting_user()?;

    let patch = PostPatch {
        title: options.title,
        location: options.location,
        exact_location: options.exact_location,
        image: options.image,
        description: options.description,
    };
    session.desk.update_post(options.id, actor.id, patch)?;
    let post = session.desk.get_post(options.id)?;

    let warning = session.emit(EventKind::PostUpdated, Some(actor.username.as_str()), &post);

    let mut human = HumanOutput::new(format!("Post updated: {}", post.id));
    push_post_summary(&mut human, &post);
    if let Some(warning) = warning {
        human.push_warning(warning);
    }

    emit_success(session.output, "post edit", &post, Some(&human))
}

pub fn run_rm(options: ShowOptions) -> Result<()> {
    let mut session = Session::open(&options.global)?;
    let actor = session.acting_user()?;
    let post = session.desk.delete_post(options.id, actor.id)?;

    let report = PostDeletedReport {
        id: post.id,
        title: post.title,
        location: post.location,
    };
    let warning = session.emit(EventKind::PostDeleted, Some(actor.username.as_str()), &report);

    let mut human = HumanOutput::new(format!("Post deleted: {}", report.id));
    human.push_summary("location", report.location.clone());
    if let Some(warning) = warning {
        human.push_warning(warning);
    }

    emit_success(session.output, "post rm", &report, Some(&human))
}

pub fn run_respond(options: ShowOptions) -> Result<()> {
    let mut session = Session::open(&options.global)?;
    let volunteer = session.acting_user()?;
    let outcome = session.desk.respond(options.id, volunteer.id)?;

    let report = RespondReport {
        post_id: options.id,
        response_id: outcome.response.id,
        status: outcome.response.status.as_str(),
        created: outcome.created,
        responders_count: outcome.responders_count,
    };

    let warning = if outcome.created {
        session.emit(
            EventKind::VolunteerResponded,
            Some(volunteer.username.as_str()),
            &report,
        )
    } else {
        None
    };

    let header = if outcome.created {
        format!("On the way to post {}", options.id)
    } else {
        format!("Already responded to post {}", options.id)
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("status", report.status);
    human.push_summary("responders", report.responders_count.to_string());
    if let Some(warning) = warning {
        human.push_warning(warning);
    }

    emit_success(session.output, "post respond", &report, Some(&human))
}

pub fn run_complete(options: ShowOptions) -> Result<()> {
    let mut session = Session::open(&options.global)?;
    let author = session.acting_user()?;
    let outcome = session.desk.complete(options.id, author.id)?;

    let report = CompleteReport {
        post_id: options.id,
        outcome,
    };

    let mut human = match &report.outcome {
        CompleteOutcome::Completed { credited } => {
            let mut human = HumanOutput::new(format!("Post completed: {}", options.id));
            human.push_summary("credited", credited.len().to_string());
            for credit in credited {
                human.push_detail(format!(
                    "volunteer {} now has {} completed",
                    credit.volunteer_id, credit.completed_count
                ));
            }
            human
        }
        CompleteOutcome::AlreadyCompleted => {
            HumanOutput::new(format!("Post {} was already completed", options.id))
        }
    };

    if matches!(report.outcome, CompleteOutcome::Completed { .. }) {
        let actor = Some(author.username.as_str());
        if let Some(warning) = session.emit(EventKind::PostCompleted, actor, &report) {
            human.push_warning(warning);
        }
    }
    human.push_next_step("helpline leaderboard");

    emit_success(session.output, "post complete", &report, Some(&human))
}

fn emit_post_list(
    session: &Session,
    command: &str,
    header: &str,
    posts: Vec<PostView>,
) -> Result<()> {
    let mut human = HumanOutput::new(format!("{header} ({})", posts.len()));
    for post in &posts {
        human.push_detail(format!(
            "{} [{}] {} @ {} ({} responding)",
            post.id,
            if post.is_completed { "completed" } else { "open" },
            post.title.as_deref().unwrap_or("(untitled)"),
            post.location,
            post.responders_count
        ));
    }

    let report = PostListReport {
        total: posts.len(),
        posts,
    };
    emit_success(session.output, command, &report, Some(&human))
}

fn push_post_summary(human: &mut HumanOutput, post: &PostView) {
    human.push_summary("author", post.author.username.clone());
    human.push_summary("location", post.location.clone());
    if let Some(exact) = &post.exact_location {
        human.push_summary("exact location", exact.clone());
    }
    if let Some(image) = &post.image {
        human.push_summary("image", image.clone());
    }
    human.push_summary(
        "state",
        if post.is_completed { "completed" } else { "open" },
    );
    human.push_summary("responders", post.responders_count.to_string());
    human.push_summary("created", post.created_at.to_rfc3339());
}
