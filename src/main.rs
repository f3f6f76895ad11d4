use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::sync::Arc;

use api_rest::{api_key_from_env_value, core_config_from_env, serve, AppState};
use clinic_core::CoreConfig;

/// Main entry point for the clinic application
///
/// Loads `.env`, prepares the data directory and serves the REST API with its Swagger UI.
/// Every request except `/health` must carry the `x-api-key` and `x-user-id` headers.
///
/// # Environment Variables
/// - `CLINIC_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `CLINIC_DATA_DIR`: Directory for clinic records (default: "clinic_data")
/// - `CLINIC_UTC_OFFSET`: Clinic UTC offset used for "today" (default: UTC)
/// - `API_KEY`: API key for REST authentication (required)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If `API_KEY` is unset, or startup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("clinic_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("CLINIC_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let api_key = api_key_from_env_value(std::env::var("API_KEY").ok())?;

    let cfg: Arc<CoreConfig> = core_config_from_env()?;
    tracing::info!(
        data_dir = %cfg.data_dir().display(),
        utc_offset = %cfg.utc_offset(),
        "clinic configuration loaded"
    );

    let state = AppState::new(cfg, api_key)?;
    serve(state, &rest_addr).await
}
