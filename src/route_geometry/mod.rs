// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

//! Grows a point cloud per route out of the positions trains report while driving it.
//!
//! A reported position is kept only when it is farther than [`MIN_POINT_SEPARATION`]
//! from every point already known for that route, so the cloud fills in gaps without
//! piling up duplicates. The full set is written back to disk every
//! [`FLUSH_EVERY_N_BATCHES`] batches.

pub mod point_store;

use crate::single_flight::{AnalysisOutcome, SingleFlight};
use crate::telemetry::{TelemetryBatch, TelemetryObservation};
use crate::workers::BatchAnalyzer;
use ahash::AHashMap;
use point_store::{RoutePoint, load_routes_dir, write_route_file};
use rstar::{PointDistance, RTree};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Planar distance in degrees, not metres.
pub const MIN_POINT_SEPARATION: f64 = 0.0001;
pub const FLUSH_EVERY_N_BATCHES: u64 = 11;
const SLOW_FLUSH: Duration = Duration::from_secs(1);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GeometryReport {
    pub added: usize,
    pub discarded: usize,
    pub skipped: usize,
    pub flushed: bool,
}

#[derive(Default)]
struct RouteGeometryState {
    //points stored [lat, lon]
    routes: AHashMap<String, RTree<[f64; 2]>>,
    batches: u64,
}

impl RouteGeometryState {
    fn nearest_distance(&self, route_id: &str, lat: f64, lon: f64) -> f64 {
        let query = [lat, lon];

        self.routes
            .get(route_id)
            .and_then(|tree| tree.nearest_neighbor(&query))
            .map(|nearest| nearest.distance_2(&query).sqrt())
            .unwrap_or(f64::INFINITY)
    }
}

pub struct RouteGeometryEngine {
    routes_dir: PathBuf,
    state: Mutex<RouteGeometryState>,
    flight: SingleFlight,
}

impl RouteGeometryEngine {
    /// Starts from whatever is already on disk under `routes_dir`. An unreadable
    /// directory is logged and the engine starts empty.
    pub async fn load(routes_dir: PathBuf) -> Self {
        let start = Instant::now();
        let routes = match load_routes_dir(&routes_dir).await {
            Ok(routes) => routes,
            Err(e) => {
                warn!("Starting with no route points: {}", e);
                AHashMap::new()
            }
        };

        let engine = Self::with_points(routes_dir, routes);
        let total: usize = engine.state.lock().await.routes.values().map(RTree::size).sum();

        info!("Loaded {} route points in {:?}", total, start.elapsed());

        engine
    }

    pub fn with_points(routes_dir: PathBuf, routes: AHashMap<String, Vec<RoutePoint>>) -> Self {
        let routes = routes
            .into_iter()
            .map(|(route_id, points)| {
                let points = points.into_iter().map(|p| [p.lat, p.lon]).collect();
                (route_id, RTree::bulk_load(points))
            })
            .collect();

        Self {
            routes_dir,
            state: Mutex::new(RouteGeometryState {
                routes,
                batches: 0,
            }),
            flight: SingleFlight::new(),
        }
    }

    pub async fn point_count(&self, route_id: &str) -> usize {
        self.state
            .lock()
            .await
            .routes
            .get(route_id)
            .map(RTree::size)
            .unwrap_or(0)
    }

    pub async fn analyze(&self, batch: &[TelemetryObservation]) -> AnalysisOutcome<GeometryReport> {
        let Some(_flight) = self.flight.try_begin() else {
            warn!(
                "Route geometry analysis already running, dropping batch of {} trains",
                batch.len()
            );
            return AnalysisOutcome::Skipped;
        };

        let mut report = GeometryReport::default();
        let mut state = self.state.lock().await;

        for observation in batch {
            let Some((lat, lon)) = observation.coordinates() else {
                warn!(
                    "Train {} on route {} has no position, skipping",
                    observation.vehicle_id, observation.route_id
                );
                report.skipped += 1;
                continue;
            };

            if state.nearest_distance(&observation.route_id, lat, lon) > MIN_POINT_SEPARATION {
                state
                    .routes
                    .entry(observation.route_id.clone())
                    .or_default()
                    .insert([lat, lon]);
                report.added += 1;
            } else {
                report.discarded += 1;
            }
        }

        state.batches += 1;
        if state.batches % FLUSH_EVERY_N_BATCHES == 0 {
            self.flush(&state).await;
            report.flushed = true;
        }

        AnalysisOutcome::Completed(report)
    }

    async fn flush(&self, state: &RouteGeometryState) {
        let start = Instant::now();
        let mut failures = 0;

        for (route_id, tree) in &state.routes {
            let points = tree.iter().map(|p| RoutePoint {
                lat: p[0],
                lon: p[1],
            });

            if let Err(e) = write_route_file(&self.routes_dir, route_id, points).await {
                failures += 1;
                error!("Failed to save route {}: {}", route_id, e);
            }
        }

        let elapsed = start.elapsed();

        if failures > 0 {
            error!(
                "Route point flush finished with {} failures after {:?}",
                failures, elapsed
            );
        }

        if elapsed > SLOW_FLUSH {
            warn!("Flushing {} routes took {:?}", state.routes.len(), elapsed);
        }
    }
}

impl BatchAnalyzer for RouteGeometryEngine {
    fn name(&self) -> &'static str {
        "route_geometry"
    }

    async fn analyze_batch(&self, batch: TelemetryBatch) {
        match self.analyze(&batch).await {
            AnalysisOutcome::Completed(report) => info!(
                "Route geometry: {} added, {} discarded, {} skipped",
                report.added, report.discarded, report.skipped
            ),
            AnalysisOutcome::Skipped => {}
        }
    }
}
