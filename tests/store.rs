// Content store behavior: persistence, sessions, conflict-tolerant follows.

use microblog::error::AppError;
use microblog::store::{seed_demo_data, ContentStore, SqliteStore};

#[tokio::test]
async fn data_persists_across_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("blog.db").display());

    let post_id = {
        let store = SqliteStore::connect(&url).await.unwrap();
        store.init().await.unwrap();
        let user = store.create_user("auth").await.unwrap();
        let post = store
            .create_post(user.id, "durable post", None, None)
            .await
            .unwrap();
        post.id
    };

    let store = SqliteStore::connect(&url).await.unwrap();
    store.init().await.unwrap();
    let post = store.find_post(post_id).await.unwrap().unwrap();
    assert_eq!(post.text, "durable post");
    let user = store.find_user_by_username("auth").await.unwrap().unwrap();
    assert_eq!(user.id, post.author_id);
}

#[tokio::test]
async fn session_token_resolves_to_its_user() {
    let store = SqliteStore::new_in_memory().await.unwrap();
    let user = store.create_user("auth").await.unwrap();

    let token = store.create_session(user.id).await.unwrap();
    let resolved = store.find_session_user(&token).await.unwrap().unwrap();
    assert_eq!(resolved.id, user.id);

    assert!(store.find_session_user("bogus").await.unwrap().is_none());
}

#[tokio::test]
async fn update_of_missing_post_is_not_found() {
    let store = SqliteStore::new_in_memory().await.unwrap();
    match store.update_post(42, "text", None, None).await {
        Err(AppError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn duplicate_follow_insert_hits_the_constraint_not_an_error() {
    let store = SqliteStore::new_in_memory().await.unwrap();
    let boba = store.create_user("boba").await.unwrap();
    let auth = store.create_user("auth").await.unwrap();

    assert!(store.insert_follow(boba.id, auth.id).await.unwrap());
    assert!(!store.insert_follow(boba.id, auth.id).await.unwrap());
    assert!(store.follow_exists(boba.id, auth.id).await.unwrap());
}

#[tokio::test]
async fn seeded_demo_data_is_queryable() {
    let store = SqliteStore::new_in_memory().await.unwrap();
    let summary = seed_demo_data(&store).await.unwrap();

    assert_eq!(summary.users, 3);
    assert_eq!(summary.groups, 2);
    assert_eq!(store.count_posts().await.unwrap(), summary.posts as u64);

    let auth = store.find_user_by_username("auth").await.unwrap().unwrap();
    let boba = store.find_user_by_username("boba").await.unwrap().unwrap();
    assert!(store.follow_exists(boba.id, auth.id).await.unwrap());

    let group = store.find_group_by_slug("test_slug").await.unwrap().unwrap();
    assert_eq!(store.count_posts_in_group(group.id).await.unwrap(), 1);
    assert!(store.count_posts_by_followed(boba.id).await.unwrap() > 0);
}

#[tokio::test]
async fn update_post_keeps_author_and_changes_content() {
    let store = SqliteStore::new_in_memory().await.unwrap();
    let user = store.create_user("auth").await.unwrap();
    let group = store
        .create_group("Group", "slug", "description")
        .await
        .unwrap();
    let created = store
        .create_post(user.id, "before", None, None)
        .await
        .unwrap();
    let stored = store.find_post(created.id).await.unwrap().unwrap();

    store
        .update_post(created.id, "after", Some(group.id), Some("assets/pic.png"))
        .await
        .unwrap();

    let updated = store.find_post(created.id).await.unwrap().unwrap();
    assert_eq!(updated.text, "after");
    assert_eq!(updated.group_id, Some(group.id));
    assert_eq!(updated.image.as_deref(), Some("assets/pic.png"));
    assert_eq!(updated.author_id, user.id);
    assert_eq!(updated.created_at, stored.created_at);
}
