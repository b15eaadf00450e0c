//! Fetch stage: one GET against the OpenChargeMap POI endpoint.

use reqwest::Client;
use tracing::info;

use crate::pipeline::PipelineError;
use crate::{Config, RawDevice};

// ---

/// Fetch charge-point records for the configured geographic query.
///
/// Issues a single request; there is no pagination (the API caps the result
/// at `maxresults`) and no retry. Any transport error or non-success status
/// aborts the run with [`PipelineError::Fetch`].
pub async fn fetch_devices(client: &Client, config: &Config) -> Result<Vec<RawDevice>, PipelineError> {
    // ---
    let query: &[(&str, String)] = &[
        ("output", "json".to_string()),
        ("countrycode", config.country_code.clone()),
        ("maxresults", config.max_results.to_string()),
        ("compact", "false".to_string()),
        ("key", config.ocm_api_key.clone()),
        ("latitude", config.latitude.to_string()),
        ("longitude", config.longitude.to_string()),
        ("distance", config.distance_miles.to_string()),
        ("distanceunit", "Miles".to_string()),
    ];

    let devices: Vec<RawDevice> = client
        .get(&config.ocm_api_url)
        .query(query)
        .header(reqwest::header::USER_AGENT, &config.user_agent)
        .send()
        .await
        .map_err(|e| PipelineError::Fetch(e.to_string()))?
        .error_for_status()
        .map_err(|e| PipelineError::Fetch(e.to_string()))?
        .json()
        .await
        .map_err(|e| PipelineError::Fetch(format!("invalid response body: {e}")))?;

    info!("Fetched {} records from {}", devices.len(), config.ocm_api_url);
    Ok(devices)
}
