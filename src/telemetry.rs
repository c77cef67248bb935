// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One vehicle as seen in one fetch cycle.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TelemetryObservation {
    pub vehicle_id: String,
    pub route_id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// `signalId` or `signalId@extra`
    pub signal_in_front: Option<String>,
    pub distance_to_signal: Option<f64>,
    pub signal_speed: Option<i32>,
}

impl TelemetryObservation {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }

    /// Approached signal split into `(signal_id, extra)`, `None` when the field is empty.
    pub fn approached_signal(&self) -> Option<(&str, &str)> {
        match self.signal_in_front.as_deref() {
            Some(raw) if !raw.trim().is_empty() => {
                Some(crate::signal_topology::patterns::split_signal_field(raw))
            }
            _ => None,
        }
    }
}

/// Immutable snapshot handed to each engine.
pub type TelemetryBatch = Arc<Vec<TelemetryObservation>>;

#[cfg(test)]
pub(crate) fn observation(vehicle_id: &str, route_id: &str, lat: f64, lon: f64) -> TelemetryObservation {
    TelemetryObservation {
        vehicle_id: vehicle_id.to_string(),
        route_id: route_id.to_string(),
        latitude: Some(lat),
        longitude: Some(lon),
        signal_in_front: None,
        distance_to_signal: None,
        signal_speed: None,
    }
}
