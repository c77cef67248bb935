// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use super::get_api_data;
use crate::fetch_scheduler::{FetchError, Fetcher};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RawServer {
    #[serde(rename = "ServerCode")]
    pub server_code: String,
    #[serde(rename = "ServerName", default)]
    pub server_name: Option<String>,
    #[serde(rename = "IsActive", default)]
    pub is_active: bool,
}

pub fn active_server_codes(servers: Vec<RawServer>) -> Vec<String> {
    servers
        .into_iter()
        .filter(|server| server.is_active)
        .map(|server| server.server_code)
        .collect()
}

/// List of servers that currently have trains running.
pub struct ServersFeed {
    client: reqwest::Client,
    url: String,
}

impl ServersFeed {
    pub fn new(client: reqwest::Client, api_base: &str) -> Self {
        Self {
            client,
            url: format!("{}/servers-open", api_base),
        }
    }
}

impl Fetcher for ServersFeed {
    type Output = Vec<String>;

    fn name(&self) -> &str {
        "servers"
    }

    async fn fetch(&self) -> Result<Vec<String>, FetchError> {
        let servers: Vec<RawServer> = get_api_data(&self.client, &self.url).await?;
        Ok(active_server_codes(servers))
    }
}
