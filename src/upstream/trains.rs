// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use super::get_api_data;
use crate::fetch_scheduler::{FetchError, Latest, PerEntityFetcher};
use crate::telemetry::TelemetryObservation;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
pub struct RawTrain {
    pub id: String,
    #[serde(rename = "TrainNoLocal")]
    pub train_no_local: String,
    #[serde(rename = "TrainName", default)]
    pub train_name: Option<String>,
    #[serde(rename = "ServerCode", default)]
    pub server_code: Option<String>,
    #[serde(rename = "TrainData")]
    pub train_data: RawTrainData,
}

//field names are spelled the way upstream spells them
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTrainData {
    #[serde(rename = "Latititute", default)]
    pub latitude: Option<f64>,
    #[serde(rename = "Longitute", default)]
    pub longitude: Option<f64>,
    #[serde(rename = "Velocity", default)]
    pub velocity: Option<f64>,
    #[serde(rename = "SignalInFront", default)]
    pub signal_in_front: Option<String>,
    #[serde(rename = "DistanceToSignalInFront", default)]
    pub distance_to_signal_in_front: Option<f64>,
    #[serde(rename = "SignalInFrontSpeed", default)]
    pub signal_in_front_speed: Option<f64>,
}

impl From<RawTrain> for TelemetryObservation {
    fn from(train: RawTrain) -> Self {
        let data = train.train_data;

        TelemetryObservation {
            vehicle_id: train.id,
            route_id: train.train_no_local,
            latitude: data.latitude,
            longitude: data.longitude,
            signal_in_front: data.signal_in_front.filter(|s| !s.trim().is_empty()),
            distance_to_signal: data.distance_to_signal_in_front,
            signal_speed: data
                .signal_in_front_speed
                .filter(|speed| speed.is_finite())
                .map(|speed| speed.round() as i32),
        }
    }
}

/// Trains of every active server, one request per server.
pub struct TrainsFeed {
    client: reqwest::Client,
    api_base: String,
    servers: Latest<Vec<String>>,
}

impl TrainsFeed {
    pub fn new(client: reqwest::Client, api_base: &str, servers: Latest<Vec<String>>) -> Self {
        Self {
            client,
            api_base: api_base.to_string(),
            servers,
        }
    }
}

impl PerEntityFetcher for TrainsFeed {
    type Entity = String;
    type Output = Vec<TelemetryObservation>;

    fn name(&self) -> &str {
        "trains"
    }

    async fn entities(&self) -> Result<Vec<String>, FetchError> {
        match self.servers.read().await.as_ref() {
            Some(servers) => Ok(servers.to_vec()),
            None => {
                debug!("Server list not fetched yet, no trains this cycle");
                Ok(Vec::new())
            }
        }
    }

    async fn fetch_entity(
        &self,
        server_code: &String,
    ) -> Result<Vec<TelemetryObservation>, FetchError> {
        let url = format!("{}/trains-open?serverCode={}", self.api_base, server_code);
        let trains: Vec<RawTrain> = get_api_data(&self.client, &url).await?;

        Ok(trains.into_iter().map(TelemetryObservation::from).collect())
    }
}
