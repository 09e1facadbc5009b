use payloads::ClientError;
use reqwest::StatusCode;

use test_helpers::{assert_status_code, spawn_app, unreachable_client};

#[tokio::test]
async fn requested_status_is_returned() -> anyhow::Result<()> {
    let app = spawn_app().await;

    for code in [StatusCode::NOT_FOUND, StatusCode::INTERNAL_SERVER_ERROR] {
        let result = app
            .client
            .fetch_json::<serde_json::Value>(
                &app.status_identifier(code.as_u16()),
            )
            .await;
        assert_status_code(result, code);
    }

    Ok(())
}

#[tokio::test]
async fn status_error_message_names_the_code() -> anyhow::Result<()> {
    let app = spawn_app().await;

    let err = app
        .client
        .fetch_json::<serde_json::Value>(&app.status_identifier(404))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "HTTP error! status: 404");

    Ok(())
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() -> anyhow::Result<()> {
    let app = spawn_app().await;

    let result = app
        .client
        .fetch_json::<serde_json::Value>(&app.identifier("malformed"))
        .await;
    assert!(matches!(result, Err(ClientError::Decode(_))));

    Ok(())
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() -> anyhow::Result<()> {
    let client = unreachable_client();

    let result = client.health_check().await;
    assert!(matches!(result, Err(ClientError::Network(_))));

    Ok(())
}
