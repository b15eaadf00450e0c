//! Pipeline trigger endpoint.
//!
//! Any GET to `/run` executes one full fetch → transform → load batch and
//! reports the outcome as plain text. The request carries no parameters;
//! the run is entirely driven by the loaded configuration.

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Router,
};
use sqlx::PgPool;
use tracing::{error, info};

use crate::pipeline::{self, PipelineError, PipelineOutcome};
use crate::Config;

// ---

pub fn router() -> Router<(PgPool, Config)> {
    // ---
    Router::new().route("/run", get(handler))
}

async fn handler(State((pool, config)): State<(PgPool, Config)>) -> impl IntoResponse {
    // ---
    info!("GET /run - Starting pipeline");

    let client = reqwest::Client::new();

    match pipeline::run(&pool, &client, &config).await {
        Ok(PipelineOutcome::Loaded(count)) => {
            info!("Pipeline complete, loaded {} rows", count);
            (
                StatusCode::OK,
                format!("SUCCESS: Loaded {} rows into {}", count, config.table_name),
            )
        }
        Ok(PipelineOutcome::NoData) => {
            info!("Pipeline complete, no rows matched");
            (StatusCode::OK, "No data matched filters.".to_string())
        }
        Err(e @ PipelineError::Fetch(_)) => {
            error!("Pipeline failed: {}", e);
            (StatusCode::BAD_GATEWAY, format!("ERROR: {e}"))
        }
        Err(e @ PipelineError::Load(_)) => {
            error!("Pipeline failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, format!("ERROR: {e}"))
        }
    }
}
