mod support;

use helpline::model::User;

use support::TestDesk;

/// Have each of `volunteers` complete one fresh post authored by `author`.
fn complete_one(
    t: &TestDesk,
    author: &User,
    volunteers: &[&User],
) -> Result<(), Box<dyn std::error::Error>> {
    let post = t.post(author, "Help", "Main St")?;
    for volunteer in volunteers {
        t.desk().respond(post.id, volunteer.id)?;
    }
    t.desk().complete(post.id, author.id)?;
    Ok(())
}

fn ranking(t: &TestDesk) -> Result<Vec<(String, u32)>, helpline::Error> {
    Ok(t
        .desk()
        .leaderboard()?
        .into_iter()
        .map(|entry| (entry.user.username, entry.completed_count))
        .collect())
}

#[test]
fn ordered_by_count_then_username() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDesk::init()?;
    let host = t.user("host")?;
    let zed = t.user("zed")?;
    let amy = t.user("amy")?;
    let bob = t.user("bob")?;

    complete_one(&t, &host, &[&zed, &amy, &bob])?;
    complete_one(&t, &host, &[&zed, &bob])?;
    complete_one(&t, &host, &[&zed])?;

    assert_eq!(
        ranking(&t)?,
        vec![
            ("zed".to_string(), 3),
            ("bob".to_string(), 2),
            ("amy".to_string(), 1),
        ]
    );

    // A tie falls back to username order.
    complete_one(&t, &host, &[&amy])?;
    let names: Vec<String> = ranking(&t)?.into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["zed", "amy", "bob"]);
    Ok(())
}

#[test]
fn limit_comes_from_config() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDesk::with_config("[leaderboard]\nlimit = 2\n")?;
    let host = t.user("host")?;
    let amy = t.user("amy")?;
    let bob = t.user("bob")?;
    let cyd = t.user("cyd")?;

    complete_one(&t, &host, &[&amy, &bob, &cyd])?;
    complete_one(&t, &host, &[&cyd])?;

    assert_eq!(
        ranking(&t)?,
        vec![("cyd".to_string(), 2), ("amy".to_string(), 1)]
    );
    Ok(())
}

#[test]
fn my_stats_starts_at_zero() -> Result<(), Box<dyn std::error::Error>> {
    let t = TestDesk::init()?;
    let amy = t.user("amy")?;

    let stats = t.desk().my_stats(amy.id)?;
    assert_eq!(stats.completed_count, 0);
    assert_eq!(stats.user.username, "amy");

    // The zero record is materialized and listed.
    assert_eq!(ranking(&t)?, vec![("amy".to_string(), 0)]);

    assert_eq!(t.desk().my_stats(404).unwrap_err().code(), "not_found");
    Ok(())
}
