//! Pipeline orchestration: fetch → transform → load.
//!
//! One call to [`run`] is one complete batch. The pipeline holds no state
//! between invocations; the destination table is fully replaced on every
//! successful run, so re-running against an unchanged upstream response is
//! idempotent.

use chrono::Utc;
use reqwest::Client;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use crate::{fetch, load, transform, Config};

// ---

/// Failure kinds for a pipeline run. Neither is retried; the first failure
/// aborts the invocation.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Upstream API transport or HTTP error. Nothing was written.
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Destination write error. The replace transaction was rolled back.
    #[error("load failed: {0}")]
    Load(String),
}

/// Result of a successful run.
#[derive(Debug, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The destination table now holds exactly this many rows.
    Loaded(usize),

    /// No fetched record passed the area filter; the destination was left
    /// untouched. A normal outcome, not an error.
    NoData,
}

/// Run one full batch.
///
/// An empty transform result short-circuits before the load stage, leaving
/// the previous table contents in place.
pub async fn run(
    pool: &PgPool,
    client: &Client,
    config: &Config,
) -> Result<PipelineOutcome, PipelineError> {
    // ---
    let devices = fetch::fetch_devices(client, config).await?;

    // One timestamp per run so every row of the batch agrees on ingested_at
    let ingested_at = Utc::now();
    let rows = transform::transform(&devices, &config.area_prefixes, ingested_at);
    info!(
        "Transformed {} of {} fetched records ({} dropped by area filter)",
        rows.len(),
        devices.len(),
        devices.len() - rows.len()
    );

    if rows.is_empty() {
        info!("No records matched the area filter, skipping load");
        return Ok(PipelineOutcome::NoData);
    }

    load::replace_all(pool, &config.table_name, &rows).await?;

    Ok(PipelineOutcome::Loaded(rows.len()))
}
