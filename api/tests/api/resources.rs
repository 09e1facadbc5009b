use payloads::responses;
use reqwest::StatusCode;

use test_helpers::{assert_status_code, spawn_app};

#[tokio::test]
async fn lists_every_resource() -> anyhow::Result<()> {
    let app = spawn_app().await;

    let users = app.client.get_users().await?;
    assert_eq!(users.len(), 10);
    assert_eq!(users[0].username, "Bret");

    let posts = app.client.get_posts().await?;
    assert_eq!(posts.len(), 100);
    assert!(posts.iter().all(|post| (1..=10).contains(&post.user_id)));

    assert_eq!(app.client.get_albums().await?.len(), 100);

    let todos = app.client.get_todos().await?;
    assert_eq!(todos.len(), 200);
    assert!(todos.iter().any(|todo| todo.completed));
    assert!(todos.iter().any(|todo| !todo.completed));

    Ok(())
}

#[tokio::test]
async fn single_item_by_id() -> anyhow::Result<()> {
    let app = spawn_app().await;

    let user: responses::User =
        app.client.fetch_json(&app.identifier("users/2")).await?;
    assert_eq!(user.id, 2);
    assert_eq!(user.name, "Ervin Howell");

    let missing = app
        .client
        .fetch_json::<responses::Post>(&app.identifier("posts/1000"))
        .await;
    assert_status_code(missing, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn unknown_resource_is_not_found() -> anyhow::Result<()> {
    let app = spawn_app().await;

    let result = app
        .client
        .fetch_json::<serde_json::Value>(&app.identifier("comments"))
        .await;
    assert_status_code(result, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn slow_resource_still_arrives() -> anyhow::Result<()> {
    let app = spawn_app().await;

    let albums: Vec<responses::Album> = app
        .client
        .fetch_json(&app.slow_identifier("albums", 20))
        .await?;
    assert_eq!(albums.len(), 100);

    Ok(())
}
