// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use crate::fetch_scheduler::EntityEvent;
use crate::telemetry::{TelemetryBatch, TelemetryObservation};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

pub type TrainsEvent = EntityEvent<String, Vec<TelemetryObservation>>;

/// An engine that consumes whole telemetry batches on its own task.
pub trait BatchAnalyzer: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn analyze_batch(&self, batch: TelemetryBatch) -> impl Future<Output = ()> + Send;
}

/// Aggregate events become one immutable batch, per-entity events are ignored.
pub fn batch_from_event(event: &TrainsEvent) -> Option<TelemetryBatch> {
    match event {
        EntityEvent::Aggregate(servers) => Some(Arc::new(
            servers
                .values()
                .flat_map(|trains| trains.iter().cloned())
                .collect(),
        )),
        EntityEvent::Entity(..) => None,
    }
}

/// Feeds every aggregate batch to `engine`, each on a fresh task so a slow analysis
/// never holds up the channel. Overlap is left to the engine's own guard.
pub async fn run_engine_worker<A: BatchAnalyzer>(
    engine: Arc<A>,
    mut receiver: broadcast::Receiver<TrainsEvent>,
) {
    loop {
        match receiver.recv().await {
            Ok(event) => {
                let Some(batch) = batch_from_event(&event) else {
                    continue;
                };

                let engine = Arc::clone(&engine);
                tokio::spawn(async move {
                    engine.analyze_batch(batch).await;
                });
            }
            Err(RecvError::Lagged(missed)) => {
                warn!("{} worker fell behind, {} events missed", engine.name(), missed);
            }
            Err(RecvError::Closed) => {
                info!("{} worker stopping, telemetry channel closed", engine.name());
                break;
            }
        }
    }
}
