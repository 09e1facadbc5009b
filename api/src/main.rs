use api::{
    Config, build,
    telemetry::{get_subscriber, init_subscriber, log_error},
};

/// Fixture API server for UI development
///
/// Environment variables can be set directly or loaded from a .env file in the
/// project root. All are optional:
/// - IP_ADDRESS: Server bind address (default 127.0.0.1)
/// - PORT: Server port (default 8000, 0 for an os-assigned port)
/// - ALLOWED_ORIGINS: CORS origins ("*" for any origin, or a comma-separated
///   list)
///
/// Example development command:
/// cargo run -p api
///
/// Then serve the UI against it:
/// cd ui && BACKEND_URL=http://127.0.0.1:8000 trunk serve
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if available
    // This will silently ignore if the file doesn't exist
    let _ = dotenvy::dotenv();

    let subscriber = get_subscriber("info".into());
    init_subscriber(subscriber)?;

    let mut config = Config::from_env()?;
    let server = build(&mut config)?;
    tracing::info!(
        "fixture api listening on http://{}:{}/api",
        config.ip,
        config.port
    );
    if let Err(e) = server.await {
        log_error(e);
    }
    Ok(())
}
