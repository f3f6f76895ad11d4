//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! Useful for development and debugging. The workspace's main `clinic-run` binary serves the
//! same router; both read their configuration from the environment (and `.env`).

use api_rest::{api_key_from_env_value, core_config_from_env, serve, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the clinic REST API server
///
/// # Environment Variables
/// - `CLINIC_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `CLINIC_DATA_DIR`, `CLINIC_UTC_OFFSET`: see [`core_config_from_env`]
/// - `API_KEY`: Key every client must send in `x-api-key`
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid or `API_KEY` is unset,
/// - the data directory cannot be prepared, or
/// - the server address cannot be bound.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("clinic_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CLINIC_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let api_key = api_key_from_env_value(std::env::var("API_KEY").ok())?;

    let state = AppState::new(core_config_from_env()?, api_key)?;
    serve(state, &addr).await
}
