// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

//! HTTP client for the live rail API.

pub mod servers;
pub mod trains;

pub use servers::ServersFeed;
pub use trains::TrainsFeed;

use crate::fetch_scheduler::FetchError;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Envelope every endpoint wraps its payload in.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub result: bool,
    pub data: Vec<T>,
    #[serde(default)]
    pub description: Option<String>,
}

pub fn make_reqwest_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::ClientBuilder::new()
        .use_rustls_tls()
        .user_agent("Railgraph Juniper")
        .timeout(Duration::from_secs(20))
        .connect_timeout(Duration::from_secs(10))
        .deflate(true)
        .gzip(true)
        .brotli(true)
        .build()
}

pub async fn get_api_data<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
) -> Result<Vec<T>, FetchError> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(FetchError::Status(response.status()));
    }

    let bytes = response.bytes().await?;
    let parsed: ApiResponse<T> = serde_json::from_slice(&bytes)?;

    if !parsed.result {
        return Err(FetchError::Other(format!(
            "{} answered without a result: {}",
            url,
            parsed.description.unwrap_or_default()
        )));
    }

    Ok(parsed.data)
}
