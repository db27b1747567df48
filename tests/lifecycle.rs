mod support;

use helpline::lifecycle::CompleteOutcome;
use helpline::model::{NotificationKind, PostDraft, PostPatch, ResponseStatus};
use helpline::stats;
use helpline::Error;

use support::TestDesk;

#[test]
fn respond_is_idempotent_per_volunteer() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDesk::init()?;
    let ann = t.user("ann")?;
    let ben = t.user("ben")?;
    let post = t.post(&ann, "Flood", "River Rd")?;

    let first = t.desk().respond(post.id, ben.id)?;
    let second = t.desk().respond(post.id, ben.id)?;
    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.response.id, second.response.id);

    let db = t.read_db()?;
    assert_eq!(db.responses.len(), 1);
    assert_eq!(db.post(post.id).map(|p| p.responders_count), Some(1));
    let on_the_way = db
        .notifications
        .iter()
        .filter(|n| n.kind == NotificationKind::VolunteerOnTheWay)
        .count();
    assert_eq!(on_the_way, 1);
    Ok(())
}

#[test]
fn respond_guards() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDesk::init()?;
    let ann = t.user("ann")?;
    let ben = t.user("ben")?;
    let post = t.post(&ann, "Flood", "River Rd")?;

    let err = t.desk().respond(post.id, ann.id).unwrap_err();
    assert!(matches!(err, Error::Forbidden(_)));
    assert_eq!(err.exit_code(), 3);

    t.desk().complete(post.id, ann.id)?;
    let err = t.desk().respond(post.id, ben.id).unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));

    let err = t.desk().respond(post.id + 100, ben.id).unwrap_err();
    assert_eq!(err.code(), "not_found");
    let err = t.desk().respond(post.id, 999).unwrap_err();
    assert_eq!(err.code(), "not_found");

    assert!(t.read_db()?.responses.is_empty());
    Ok(())
}

#[test]
fn complete_is_author_only_in_every_state() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDesk::init()?;
    let ann = t.user("ann")?;
    let ben = t.user("ben")?;
    let post = t.post(&ann, "Flood", "River Rd")?;
    t.desk().respond(post.id, ben.id)?;

    assert!(matches!(
        t.desk().complete(post.id, ben.id),
        Err(Error::Forbidden(_))
    ));
    assert!(!t.desk().get_post(post.id)?.is_completed);

    t.desk().complete(post.id, ann.id)?;
    assert!(matches!(
        t.desk().complete(post.id, ben.id),
        Err(Error::Forbidden(_))
    ));
    Ok(())
}

#[test]
fn complete_with_no_responders_only_flips_the_flag() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDesk::init()?;
    let ann = t.user("ann")?;
    let post = t.post(&ann, "Flood", "River Rd")?;

    let outcome = t.desk().complete(post.id, ann.id)?;
    assert_eq!(outcome, CompleteOutcome::Completed { credited: vec![] });
    assert!(t.desk().get_post(post.id)?.is_completed);
    assert!(t.read_db()?.stats.is_empty());
    Ok(())
}

#[test]
fn failed_completion_leaves_no_partial_state() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDesk::init()?;
    let ann = t.user("ann")?;
    let ben = t.user("ben")?;
    let cat = t.user("cat")?;
    let post = t.post(&ann, "Flood", "River Rd")?;
    t.desk().respond(post.id, ben.id)?;
    t.desk().respond(post.id, cat.id)?;

    // Cat's counter is full, so crediting Cat fails after Ben was credited.
    t.desk().storage().transaction(|db| {
        stats::stat_for(db, cat.id)?.completed_count = u32::MAX;
        Ok(())
    })?;
    let before = t.read_db()?;

    let err = t.desk().complete(post.id, ann.id).unwrap_err();
    assert_eq!(err.code(), "operation_failed");

    let after = t.read_db()?;
    assert_eq!(before.posts, after.posts);
    assert_eq!(before.responses, after.responses);
    assert_eq!(before.stats, after.stats);
    assert_eq!(before.notifications, after.notifications);
    assert!(after
        .responses
        .iter()
        .all(|r| r.status == ResponseStatus::OnTheWay));
    Ok(())
}

#[test]
fn edit_and_delete_are_author_only() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDesk::init()?;
    let ann = t.user("ann")?;
    let ben = t.user("ben")?;
    let post = t.post(&ann, "Flood", "River Rd")?;
    t.desk().respond(post.id, ben.id)?;

    let patch = PostPatch {
        exact_location: Some("behind the mill".to_string()),
        ..PostPatch::default()
    };
    assert!(matches!(
        t.desk().update_post(post.id, ben.id, patch.clone()),
        Err(Error::Forbidden(_))
    ));
    let updated = t.desk().update_post(post.id, ann.id, patch)?;
    assert_eq!(updated.exact_location.as_deref(), Some("behind the mill"));
    assert_eq!(updated.responders_count, 1);

    let invalid = PostPatch {
        location: Some("   ".to_string()),
        ..PostPatch::default()
    };
    let err = t.desk().update_post(post.id, ann.id, invalid).unwrap_err();
    assert_eq!(err.code(), "validation_error");

    assert!(matches!(
        t.desk().delete_post(post.id, ben.id),
        Err(Error::Forbidden(_))
    ));
    t.desk().delete_post(post.id, ann.id)?;
    assert_eq!(t.desk().get_post(post.id).unwrap_err().code(), "not_found");
    assert!(t.read_db()?.responses.is_empty());
    Ok(())
}

#[test]
fn create_validates_and_stores_optional_fields() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDesk::init()?;
    let ann = t.user("ann")?;

    let err = t
        .desk()
        .create_post(ann.id, PostDraft::new("  ", "help"))
        .unwrap_err();
    assert_eq!(err.code(), "validation_error");

    let err = t
        .desk()
        .create_post(ann.id, PostDraft::new("Main St", ""))
        .unwrap_err();
    assert_eq!(err.code(), "validation_error");

    let err = t
        .desk()
        .create_post(ann.id, PostDraft::new("Main St", "help").with_title("x".repeat(256)))
        .unwrap_err();
    assert_eq!(err.code(), "validation_error");

    let draft = PostDraft::new(" Main St ", "smoke")
        .with_exact_location("12 Main St, 3rd floor")
        .with_image("photos/fire.jpg");
    let created = t.desk().create_post(ann.id, draft)?;
    assert_eq!(created.post.location, "Main St");
    assert_eq!(created.post.title, None);
    assert_eq!(created.post.image.as_deref(), Some("photos/fire.jpg"));
    Ok(())
}

#[test]
fn removing_a_user_cascades() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDesk::init()?;
    let ann = t.user("ann")?;
    let ben = t.user("ben")?;
    let cat = t.user("cat")?;
    let anns = t.post(&ann, "Flood", "River Rd")?;
    let bens = t.post(&ben, "Gas leak", "Elm St")?;
    t.desk().respond(anns.id, ben.id)?;
    t.desk().respond(anns.id, cat.id)?;
    t.desk().respond(bens.id, cat.id)?;

    let removal = t.desk().remove_user(ben.id)?;
    assert_eq!(removal.posts_deleted, 1);
    assert_eq!(removal.responses_deleted, 2);

    let db = t.read_db()?;
    assert!(db.user(ben.id).is_none());
    assert!(db.post(bens.id).is_none());
    assert_eq!(db.post(anns.id).map(|p| p.responders_count), Some(1));
    assert!(db.notifications.iter().all(|n| n.user_id != ben.id));
    assert!(db.notifications.iter().all(|n| n.actor_id != Some(ben.id)));
    Ok(())
}
