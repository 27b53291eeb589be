use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;

/// Main entry point for the KidneyCompanion application
///
/// Starts the REST API server: the analyze event stream, the narration
/// endpoint, the health check, and the Swagger UI.
///
/// # Environment Variables
/// - `KC_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `FRIENDLI_API_KEY`: inference credential
/// - `KC_UPSTREAM_URL`: chat-completions endpoint
/// - `KC_MODEL`: deployed model identifier
/// - `ELEVENLABS_API_KEY`: speech credential
/// - `KC_TTS_URL`: speech API base URL
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("kc=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("kc_inference=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("KC_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("++ Starting KidneyCompanion REST on {}", rest_addr);

    let state = AppState::from_env()?;
    api_rest::serve(&rest_addr, state).await
}
