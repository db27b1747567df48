mod support;

use helpline::model::{NotificationKind, PostDraft};
use helpline::notify::MAX_MESSAGE_CHARS;

use support::TestDesk;

#[test]
fn pending_duplicate_is_skipped_without_failing_the_action(
) -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDesk::init()?;
    let ann = t.user("ann")?;
    let ben = t.user("ben")?;
    let post = t.post(&ann, "Flood", "River Rd")?;
    t.desk().respond(post.id, ben.id)?;

    // Drop Ben's response behind the desk's back so he can respond again
    // while Ann's first notification is still unread.
    t.desk().storage().transaction(|db| {
        db.responses.clear();
        db.refresh_responders_count(post.id);
        Ok(())
    })?;

    let again = t.desk().respond(post.id, ben.id)?;
    assert!(again.created);
    assert_eq!(again.responders_count, 1);
    assert_eq!(t.desk().list_notifications(ann.id, false)?.notifications.len(), 1);

    // Once read, the same notification may be delivered again.
    let first = t.desk().list_notifications(ann.id, false)?.notifications[0].id;
    t.desk().mark_notification_read(first, ann.id, true)?;
    t.desk().storage().transaction(|db| {
        db.responses.clear();
        db.refresh_responders_count(post.id);
        Ok(())
    })?;
    t.desk().respond(post.id, ben.id)?;

    let inbox = t.desk().list_notifications(ann.id, false)?;
    assert_eq!(inbox.notifications.len(), 2);
    assert_eq!(inbox.unread, 1);
    Ok(())
}

#[test]
fn inbox_is_private() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDesk::init()?;
    let ann = t.user("ann")?;
    let ben = t.user("ben")?;
    t.post(&ann, "Flood", "River Rd")?;

    let bens = t.desk().list_notifications(ben.id, false)?;
    let id = bens.notifications[0].id;

    let err = t.desk().mark_notification_read(id, ann.id, true).unwrap_err();
    assert_eq!(err.code(), "not_found");
    assert_eq!(t.desk().list_notifications(ben.id, true)?.unread, 1);

    let read = t.desk().mark_notification_read(id, ben.id, true)?;
    assert!(read.is_read);
    assert!(t
        .desk()
        .list_notifications(ben.id, true)?
        .notifications
        .is_empty());

    let unread = t.desk().mark_notification_read(id, ben.id, false)?;
    assert!(!unread.is_read);
    Ok(())
}

#[test]
fn long_messages_are_truncated() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDesk::init()?;
    let ann = t.user("ann")?;
    let ben = t.user("ben")?;

    let location = "Ç".repeat(400);
    t.desk()
        .create_post(ann.id, PostDraft::new(location, "help").with_title("Fire"))?;

    let inbox = t.desk().list_notifications(ben.id, false)?;
    let message = &inbox.notifications[0].message;
    assert_eq!(message.chars().count(), MAX_MESSAGE_CHARS);
    assert!(message.starts_with("New help request: Fire at "));
    Ok(())
}

#[test]
fn untitled_posts_render_as_none() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDesk::init()?;
    let ann = t.user("ann")?;
    let ben = t.user("ben")?;
    let post = t
        .desk()
        .create_post(ann.id, PostDraft::new("Main St", "help"))?
        .post;

    let inbox = t.desk().list_notifications(ben.id, false)?;
    assert_eq!(
        inbox.notifications[0].message,
        "New help request: None at Main St"
    );

    t.desk().respond(post.id, ben.id)?;
    let inbox = t.desk().list_notifications(ann.id, false)?;
    assert_eq!(inbox.notifications[0].kind, NotificationKind::VolunteerOnTheWay);
    assert_eq!(
        inbox.notifications[0].message,
        "ben is on the way to help your request: None"
    );
    Ok(())
}

#[test]
fn broadcast_can_be_disabled() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDesk::with_config("[notifications]\nbroadcast_new_posts = false\n")?;
    let ann = t.user("ann")?;
    let ben = t.user("ben")?;

    let created = t
        .desk()
        .create_post(ann.id, PostDraft::new("Main St", "help"))?;
    assert!(created.fan_out.delivered.is_empty());
    assert!(t
        .desk()
        .list_notifications(ben.id, false)?
        .notifications
        .is_empty());
    Ok(())
}
