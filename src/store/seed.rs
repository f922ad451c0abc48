// Demo data seeding - a small world of users, groups, posts, comments and
// follow edges for local runs and test fixtures.

use tracing::info;

use crate::error::AppResult;
use crate::store::ContentStore;

/// What the seeder created, for callers that need the counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedSummary {
    pub users: usize,
    pub groups: usize,
    pub posts: usize,
    pub comments: usize,
    pub follows: usize,
}

/// Populate the store with demo content. Expects an empty store; usernames
/// and slugs collide with existing rows otherwise.
pub async fn seed_demo_data(store: &dyn ContentStore) -> AppResult<SeedSummary> {
    let usernames = ["auth", "boba", "biba"];
    let mut users = Vec::with_capacity(usernames.len());
    for username in usernames {
        users.push(store.create_user(username).await?);
    }

    let group_rows = [
        ("Test group", "test_slug", "Posts used by the test scenarios"),
        ("Другая группа", "other_slug", "A second group to post into"),
    ];
    let mut groups = Vec::with_capacity(group_rows.len());
    for (title, slug, description) in group_rows {
        groups.push(store.create_group(title, slug, description).await?);
    }

    // boba follows auth; biba follows nobody.
    let follows = [(users[1].id, users[0].id)];
    for (user_id, author_id) in follows {
        store.insert_follow(user_id, author_id).await?;
    }

    let post_rows = [
        (users[0].id, "Тестовый текст первого поста", Some(groups[0].id)),
        (users[0].id, "Заметка без группы", None),
        (users[1].id, "Ответный пост", Some(groups[1].id)),
    ];
    let mut posts = Vec::with_capacity(post_rows.len());
    for (author_id, text, group_id) in post_rows {
        posts.push(store.create_post(author_id, text, group_id, None).await?);
    }

    let comment_rows = [(posts[0].id, users[1].id, "Хороший пост")];
    for (post_id, author_id, text) in comment_rows {
        store.create_comment(post_id, author_id, text).await?;
    }

    let summary = SeedSummary {
        users: users.len(),
        groups: groups.len(),
        posts: posts.len(),
        comments: comment_rows.len(),
        follows: follows.len(),
    };
    info!(
        "Seeded {} users, {} groups, {} posts, {} comments, {} follows",
        summary.users, summary.groups, summary.posts, summary.comments, summary.follows
    );
    Ok(summary)
}
