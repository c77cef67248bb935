// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

//! Live signal topology inference.
//!
//! Every train reports the signal it is approaching. When that signal changes the
//! train has passed the previous one, which gives a directed `previous -> current`
//! edge. Noisy approach sequences leave block signals with several candidate
//! neighbours, those are pruned back to the one that shares the direction suffix
//! and sits nearest to the train.
//!
//! Fixes taken within a few metres of a signal refine its stored position and
//! classification. New signals are only ever created by [`import`].

pub mod import;
#[cfg(test)]
pub mod memory_store;
pub mod patterns;
pub mod store;

pub use store::{EdgeDirection, PgSignalStore, Signal, SignalGraphStore, SignalType, StoreError};

use crate::single_flight::{AnalysisOutcome, SingleFlight};
use crate::telemetry::{TelemetryBatch, TelemetryObservation};
use crate::workers::BatchAnalyzer;
use ahash::{AHashMap, AHashSet};
use cached::{Cached, TimedCache};
use patterns::{classify, is_block_signal, is_directional};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Reported distances below this are trusted as a position fix for the signal.
pub const CLOSE_TO_SIGNAL_DISTANCE: f64 = 5.0;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LiveReport {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub transitions: usize,
    pub edges_inserted: usize,
    pub prunes: usize,
    pub positions_refined: usize,
    pub classified: usize,
    pub discovered: usize,
}

pub struct SignalTopologyEngine<S> {
    store: Arc<S>,
    //train id -> last approached signal id
    train_signals: Mutex<TimedCache<String, String>>,
    flight: SingleFlight,
}

impl<S: SignalGraphStore> SignalTopologyEngine<S> {
    pub fn new(store: Arc<S>, cache_ttl: Duration) -> Self {
        Self {
            store,
            train_signals: Mutex::new(train_signal_cache(cache_ttl)),
            flight: SingleFlight::new(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Runs one batch. A batch arriving while another is in progress is dropped.
    pub async fn analyze(&self, batch: &[TelemetryObservation]) -> AnalysisOutcome<LiveReport> {
        let Some(_flight) = self.flight.try_begin() else {
            warn!(
                "Signal analysis already running, dropping batch of {} trains",
                batch.len()
            );
            return AnalysisOutcome::Skipped;
        };

        let start = Instant::now();
        let mut report = LiveReport::default();
        let mut train_signals = self.train_signals.lock().await;
        train_signals.flush();

        //approached signals plus the ones these trains passed last, so transitions can
        //check both ends against the same snapshot
        let mut signal_ids: AHashSet<String> = AHashSet::new();
        for observation in batch {
            let Some((signal_id, _)) = observation.approached_signal() else {
                continue;
            };
            signal_ids.insert(signal_id.to_string());

            //only trains that get processed below, those refresh their entry anyway
            if observation.coordinates().is_none() {
                continue;
            }
            if let Some(previous) = train_signals.cache_get(&observation.vehicle_id) {
                signal_ids.insert(previous.clone());
            }
        }
        let signal_ids: Vec<String> = signal_ids.into_iter().collect();

        let mut known: AHashMap<String, Signal> = match self.store.get_signals(&signal_ids).await {
            Ok(signals) => signals
                .into_iter()
                .map(|signal| (signal.name.clone(), signal))
                .collect(),
            Err(e) => {
                error!("Could not load signals for this batch, abandoning it: {}", e);
                report.failed = batch.len();
                return AnalysisOutcome::Completed(report);
            }
        };

        for observation in batch {
            if let Err(e) = self
                .process_observation(observation, &mut known, &mut train_signals, &mut report)
                .await
            {
                report.failed += 1;
                warn!(
                    "Signal analysis failed for train {}: {}",
                    observation.vehicle_id, e
                );
            }
        }

        debug!("Signal analysis took {:?}: {:?}", start.elapsed(), report);

        AnalysisOutcome::Completed(report)
    }

    async fn process_observation(
        &self,
        observation: &TelemetryObservation,
        known: &mut AHashMap<String, Signal>,
        train_signals: &mut TimedCache<String, String>,
        report: &mut LiveReport,
    ) -> Result<(), StoreError> {
        let Some((lat, lon)) = observation.coordinates() else {
            warn!(
                "Train {} has no position, skipping signal analysis",
                observation.vehicle_id
            );
            report.skipped += 1;
            return Ok(());
        };

        let Some((signal_id, extra)) = observation.approached_signal() else {
            report.skipped += 1;
            return Ok(());
        };

        report.processed += 1;

        if let Some(previous) = train_signals
            .cache_get(&observation.vehicle_id)
            .filter(|previous| previous.as_str() != signal_id)
            .cloned()
        {
            report.transitions += 1;
            self.record_transition(&previous, signal_id, lat, lon, known, report)
                .await?;
        }

        let _ = train_signals.cache_set(observation.vehicle_id.clone(), signal_id.to_string());

        if let Some(distance) = observation
            .distance_to_signal
            .filter(|d| (0.0..CLOSE_TO_SIGNAL_DISTANCE).contains(d))
        {
            match known.get_mut(signal_id) {
                Some(signal) => {
                    self.refine_signal(signal, observation, lat, lon, distance, report)
                        .await?;
                }
                None => {
                    info!(
                        "Discovered unknown signal {} (extra {:?}) at {}, {}",
                        signal_id, extra, lat, lon
                    );
                    report.discovered += 1;
                }
            }
        }

        Ok(())
    }

    async fn record_transition(
        &self,
        previous: &str,
        current: &str,
        lat: f64,
        lon: f64,
        known: &AHashMap<String, Signal>,
        report: &mut LiveReport,
    ) -> Result<(), StoreError> {
        let both_known = known.contains_key(previous) && known.contains_key(current);

        if both_known {
            self.store
                .insert_edge(EdgeDirection::Next, previous, current)
                .await?;
            report.edges_inserted += 1;
        }

        self.prune_if_ambiguous(
            EdgeDirection::Next,
            previous,
            previous,
            current,
            lat,
            lon,
            report,
        )
        .await?;

        if both_known {
            self.store
                .insert_edge(EdgeDirection::Prev, current, previous)
                .await?;
            report.edges_inserted += 1;
        }

        self.prune_if_ambiguous(
            EdgeDirection::Prev,
            current,
            previous,
            current,
            lat,
            lon,
            report,
        )
        .await
    }

    /// Cuts `owner`'s edges in `direction` down to the direction-consistent candidate
    /// nearest to the train. Only block-to-block transitions are pruned.
    #[allow(clippy::too_many_arguments)]
    async fn prune_if_ambiguous(
        &self,
        direction: EdgeDirection,
        owner: &str,
        previous: &str,
        current: &str,
        lat: f64,
        lon: f64,
        report: &mut LiveReport,
    ) -> Result<(), StoreError> {
        let candidates = self.store.edges(direction, owner).await?;

        if candidates.len() <= 1 || !is_block_signal(previous) || !is_block_signal(current) {
            return Ok(());
        }

        let owner_directional = is_directional(owner);

        let filtered: Vec<String> = candidates
            .into_iter()
            .filter(|candidate| is_directional(candidate) == owner_directional)
            .collect();

        if filtered.is_empty() {
            debug!(
                "No {:?} candidate of {} matches its direction, leaving edges alone",
                direction, owner
            );
            return Ok(());
        }

        let located = self.store.get_signals(&filtered).await?;

        match nearest_signal(&located, lat, lon) {
            Some(nearest) => {
                self.store
                    .delete_edges_except(direction, owner, &nearest.name)
                    .await?;
                report.prunes += 1;
                debug!(
                    "Pruned {:?} edges of {} down to {}",
                    direction, owner, nearest.name
                );
            }
            None => {
                warn!(
                    "None of the {:?} candidates of {} have a stored position",
                    direction, owner
                );
            }
        }

        Ok(())
    }

    async fn refine_signal(
        &self,
        signal: &mut Signal,
        observation: &TelemetryObservation,
        lat: f64,
        lon: f64,
        distance: f64,
        report: &mut LiveReport,
    ) -> Result<(), StoreError> {
        if signal.accuracy > distance {
            self.store
                .update_signal_position(&signal.name, lat, lon, distance)
                .await?;
            report.positions_refined += 1;

            //later fixes in this batch compare against the new values
            signal.lat = lat;
            signal.lon = lon;
            signal.accuracy = distance;
        }

        if signal.signal_type.is_none() {
            if let Some(signal_type) = classify(observation.signal_speed, &signal.name) {
                self.store
                    .update_signal_type(&signal.name, signal_type)
                    .await?;
                signal.signal_type = Some(signal_type);
                report.classified += 1;
                info!("Classified {} as {}", signal.name, signal_type.as_str());
            }
        }

        Ok(())
    }
}

/// Sliding expiry: every read pushes the entry's deadline out by `ttl` again.
pub fn train_signal_cache(ttl: Duration) -> TimedCache<String, String> {
    TimedCache::with_lifespan_and_refresh(ttl, true)
}

fn nearest_signal(signals: &[Signal], lat: f64, lon: f64) -> Option<&Signal> {
    let mut by_distance: Vec<(f64, &Signal)> = signals
        .iter()
        .map(|signal| (signal.planar_distance_to(lat, lon), signal))
        .collect();

    by_distance.sort_by(|a, b| a.0.total_cmp(&b.0));

    by_distance.first().map(|(_, signal)| *signal)
}

impl<S: SignalGraphStore> BatchAnalyzer for SignalTopologyEngine<S> {
    fn name(&self) -> &'static str {
        "signal_topology"
    }

    async fn analyze_batch(&self, batch: TelemetryBatch) {
        match self.analyze(&batch).await {
            AnalysisOutcome::Completed(report) => info!(
                "Signals: {} trains, {} transitions, {} edges, {} prunes, {} refined, {} failed",
                report.processed,
                report.transitions,
                report.edges_inserted,
                report.prunes,
                report.positions_refined,
                report.failed
            ),
            AnalysisOutcome::Skipped => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory_store::MemorySignalStore;
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    fn signal(name: &str, lat: f64, lon: f64, accuracy: f64) -> Signal {
        Signal {
            name: name.to_string(),
            lat,
            lon,
            accuracy,
            extra: String::new(),
            signal_type: None,
        }
    }

    fn approaching(
        train: &str,
        signal_field: &str,
        lat: f64,
        lon: f64,
        distance: f64,
        speed: Option<i32>,
    ) -> TelemetryObservation {
        TelemetryObservation {
            vehicle_id: train.to_string(),
            route_id: "501".to_string(),
            latitude: Some(lat),
            longitude: Some(lon),
            signal_in_front: Some(signal_field.to_string()),
            distance_to_signal: Some(distance),
            signal_speed: speed,
        }
    }

    fn completed(outcome: AnalysisOutcome<LiveReport>) -> LiveReport {
        match outcome {
            AnalysisOutcome::Completed(report) => report,
            AnalysisOutcome::Skipped => panic!("analysis was skipped"),
        }
    }

    fn engine_with(store: MemorySignalStore) -> SignalTopologyEngine<MemorySignalStore> {
        SignalTopologyEngine::new(Arc::new(store), TTL)
    }

    #[tokio::test]
    async fn transition_between_known_signals_records_both_edges() {
        let store = MemorySignalStore::new();
        store.seed(signal("A1_1", 50.0, 19.0, 10.0));
        store.seed(signal("A1_2", 50.01, 19.0, 10.0));
        let engine = engine_with(store);

        completed(
            engine
                .analyze(&[approaching("t1", "A1_1", 49.99, 19.0, 900.0, None)])
                .await,
        );
        let report = completed(
            engine
                .analyze(&[approaching("t1", "A1_2@7700", 50.005, 19.0, 400.0, None)])
                .await,
        );

        assert_eq!(report.transitions, 1);
        assert_eq!(report.edges_inserted, 2);
        assert_eq!(
            engine.store().edge_list(EdgeDirection::Next, "A1_1"),
            vec!["A1_2"]
        );
        assert_eq!(
            engine.store().edge_list(EdgeDirection::Prev, "A1_2"),
            vec!["A1_1"]
        );
    }

    #[tokio::test]
    async fn repeated_transition_keeps_a_single_edge() {
        let store = MemorySignalStore::new();
        store.seed(signal("A1_1", 50.0, 19.0, 10.0));
        store.seed(signal("A1_2", 50.01, 19.0, 10.0));
        let engine = engine_with(store);

        for train in ["t1", "t2"] {
            engine
                .analyze(&[approaching(train, "A1_1", 49.99, 19.0, 900.0, None)])
                .await;
            engine
                .analyze(&[approaching(train, "A1_2", 50.005, 19.0, 400.0, None)])
                .await;
        }

        assert_eq!(
            engine.store().edge_list(EdgeDirection::Next, "A1_1"),
            vec!["A1_2"]
        );
    }

    #[tokio::test]
    async fn unknown_signal_is_not_linked() {
        let store = MemorySignalStore::new();
        store.seed(signal("A1_1", 50.0, 19.0, 10.0));
        let engine = engine_with(store);

        engine
            .analyze(&[approaching("t1", "A1_1", 49.99, 19.0, 900.0, None)])
            .await;
        let report = completed(
            engine
                .analyze(&[approaching("t1", "Z9_9", 50.005, 19.0, 400.0, None)])
                .await,
        );

        assert_eq!(report.transitions, 1);
        assert_eq!(report.edges_inserted, 0);
        assert!(engine
            .store()
            .edge_list(EdgeDirection::Next, "A1_1")
            .is_empty());
    }

    #[tokio::test]
    async fn ambiguous_next_edges_prune_to_nearest_candidate() {
        let store = MemorySignalStore::new();
        store.seed(signal("A1_1", 50.000, 19.0, 10.0));
        store.seed(signal("A1_2", 50.010, 19.0, 10.0));
        store.seed(signal("A1_3", 50.002, 19.0, 10.0));
        store.seed(signal("A1_5", 50.030, 19.0, 10.0));
        store.seed_edge(EdgeDirection::Next, "A1_1", "A1_2");
        store.seed_edge(EdgeDirection::Next, "A1_1", "A1_5");
        let engine = engine_with(store);

        engine
            .analyze(&[approaching("t1", "A1_1", 49.999, 19.0, 100.0, None)])
            .await;
        let report = completed(
            engine
                .analyze(&[approaching("t1", "A1_3", 50.001, 19.0, 100.0, None)])
                .await,
        );

        assert!(report.prunes >= 1);
        assert_eq!(
            engine.store().edge_list(EdgeDirection::Next, "A1_1"),
            vec!["A1_3"]
        );
    }

    #[tokio::test]
    async fn direction_filter_beats_distance() {
        let store = MemorySignalStore::new();
        store.seed(signal("A1_1", 50.000, 19.0, 10.0));
        store.seed(signal("A1_2", 50.0045, 19.0, 10.0));
        //right where the train is, but the wrong direction for A1_1
        store.seed(signal("A1_2A", 50.001, 19.0, 10.0));
        store.seed_edge(EdgeDirection::Next, "A1_1", "A1_2A");
        let engine = engine_with(store);

        engine
            .analyze(&[approaching("t1", "A1_1", 49.999, 19.0, 100.0, None)])
            .await;
        engine
            .analyze(&[approaching("t1", "A1_2", 50.001, 19.0, 50.0, None)])
            .await;

        assert_eq!(
            engine.store().edge_list(EdgeDirection::Next, "A1_1"),
            vec!["A1_2"]
        );
    }

    #[tokio::test]
    async fn ambiguous_prev_edges_prune_to_nearest_candidate() {
        let store = MemorySignalStore::new();
        store.seed(signal("A1_2", 50.000, 19.0, 10.0));
        store.seed(signal("A1_3", 50.004, 19.0, 10.0));
        store.seed(signal("B4_7", 50.100, 19.2, 10.0));
        store.seed_edge(EdgeDirection::Prev, "A1_3", "B4_7");
        let engine = engine_with(store);

        engine
            .analyze(&[approaching("t1", "A1_2", 49.999, 19.0, 100.0, None)])
            .await;
        engine
            .analyze(&[approaching("t1", "A1_3", 50.002, 19.0, 200.0, None)])
            .await;

        assert_eq!(
            engine.store().edge_list(EdgeDirection::Prev, "A1_3"),
            vec!["A1_2"]
        );
    }

    #[tokio::test]
    async fn non_block_transition_leaves_ambiguity() {
        let store = MemorySignalStore::new();
        store.seed(signal("Kr_M", 50.000, 19.0, 10.0));
        store.seed(signal("A1_2", 50.010, 19.0, 10.0));
        store.seed(signal("A1_5", 50.030, 19.0, 10.0));
        store.seed_edge(EdgeDirection::Next, "Kr_M", "A1_5");
        let engine = engine_with(store);

        engine
            .analyze(&[approaching("t1", "Kr_M", 49.999, 19.0, 100.0, None)])
            .await;
        engine
            .analyze(&[approaching("t1", "A1_2", 50.005, 19.0, 100.0, None)])
            .await;

        assert_eq!(
            engine.store().edge_list(EdgeDirection::Next, "Kr_M"),
            vec!["A1_2", "A1_5"]
        );
    }

    #[tokio::test]
    async fn close_fix_refines_position_and_classifies() {
        let store = MemorySignalStore::new();
        store.seed(signal("A12_34", 50.0, 19.0, 100.0));
        store.seed(signal("B07_12A", 50.2, 19.2, 100.0));
        let engine = engine_with(store);

        let report = completed(
            engine
                .analyze(&[
                    approaching("t1", "A12_34", 50.0001, 19.0001, 3.0, Some(100)),
                    approaching("t2", "B07_12A", 50.2001, 19.2001, 1.5, None),
                ])
                .await,
        );

        assert_eq!(report.positions_refined, 2);
        assert_eq!(report.classified, 2);

        let main = engine.store().signal("A12_34").unwrap();
        assert_eq!(main.signal_type, Some(SignalType::Main));
        assert_eq!(main.accuracy, 3.0);
        assert_eq!((main.lat, main.lon), (50.0001, 19.0001));

        let block = engine.store().signal("B07_12A").unwrap();
        assert_eq!(block.signal_type, Some(SignalType::Block));
    }

    #[tokio::test]
    async fn accuracy_never_gets_worse() {
        let store = MemorySignalStore::new();
        store.seed(signal("A1_1", 50.0, 19.0, 2.0));
        let engine = engine_with(store);

        let report = completed(
            engine
                .analyze(&[approaching("t1", "A1_1", 50.1, 19.1, 4.0, None)])
                .await,
        );

        assert_eq!(report.positions_refined, 0);
        let stored = engine.store().signal("A1_1").unwrap();
        assert_eq!(stored.accuracy, 2.0);
        assert_eq!((stored.lat, stored.lon), (50.0, 19.0));
    }

    #[tokio::test]
    async fn second_close_fix_in_a_batch_only_counts_when_better() {
        let store = MemorySignalStore::new();
        store.seed(signal("A12_34", 50.0, 19.0, 10.0));
        let engine = engine_with(store);

        let report = completed(
            engine
                .analyze(&[
                    approaching("t1", "A12_34", 50.0001, 19.0001, 3.0, Some(100)),
                    approaching("t2", "A12_34", 50.0002, 19.0002, 4.0, Some(60)),
                    approaching("t3", "A12_34", 50.0003, 19.0003, 1.0, None),
                ])
                .await,
        );

        assert_eq!(report.positions_refined, 2);
        assert_eq!(report.classified, 1);

        let stored = engine.store().signal("A12_34").unwrap();
        assert_eq!(stored.accuracy, 1.0);
        assert_eq!((stored.lat, stored.lon), (50.0003, 19.0003));
    }

    #[tokio::test]
    async fn store_failure_abandons_only_that_train() {
        let store = MemorySignalStore::failing_on(&["A1_1"]);
        store.seed(signal("A1_1", 50.0, 19.0, 10.0));
        store.seed(signal("A1_2", 50.01, 19.0, 10.0));
        store.seed(signal("A1_3", 50.02, 19.0, 10.0));
        let engine = engine_with(store);

        let report = completed(
            engine
                .analyze(&[
                    approaching("t1", "A1_1", 50.0, 19.0, 2.0, None),
                    approaching("t2", "A1_2", 50.01, 19.0, 1.0, None),
                ])
                .await,
        );

        assert_eq!(report.failed, 1);
        assert_eq!(report.processed, 2);
        assert_eq!(report.positions_refined, 1);
        assert_eq!(engine.store().signal("A1_2").unwrap().accuracy, 1.0);

        //t2 was remembered despite t1 failing before it
        let report = completed(
            engine
                .analyze(&[approaching("t2", "A1_3", 50.015, 19.0, 300.0, None)])
                .await,
        );
        assert_eq!(report.transitions, 1);
        assert_eq!(
            engine.store().edge_list(EdgeDirection::Next, "A1_2"),
            vec!["A1_3"]
        );
    }

    #[test]
    fn train_cache_reads_extend_the_deadline() {
        let mut cache = train_signal_cache(Duration::from_millis(300));
        let _ = cache.cache_set("t1".to_string(), "A1_1".to_string());

        std::thread::sleep(Duration::from_millis(200));
        assert_eq!(cache.cache_get("t1").cloned(), Some("A1_1".to_string()));

        //400ms after insert, alive only because of the read at 200ms
        std::thread::sleep(Duration::from_millis(200));
        assert_eq!(cache.cache_get("t1").cloned(), Some("A1_1".to_string()));

        std::thread::sleep(Duration::from_millis(450));
        assert_eq!(cache.cache_get("t1"), None);
    }

    #[tokio::test]
    async fn expired_train_state_is_not_a_transition() {
        let store = MemorySignalStore::new();
        store.seed(signal("A1_1", 50.0, 19.0, 10.0));
        store.seed(signal("A1_2", 50.01, 19.0, 10.0));
        let engine = SignalTopologyEngine::new(Arc::new(store), Duration::from_millis(150));

        engine
            .analyze(&[approaching("t1", "A1_1", 49.99, 19.0, 900.0, None)])
            .await;
        tokio::time::sleep(Duration::from_millis(300)).await;

        let report = completed(
            engine
                .analyze(&[approaching("t1", "A1_2", 50.005, 19.0, 400.0, None)])
                .await,
        );
        assert_eq!(report.transitions, 0);
        assert!(engine
            .store()
            .edge_list(EdgeDirection::Next, "A1_1")
            .is_empty());
    }

    #[tokio::test]
    async fn live_path_only_logs_unknown_signals() {
        let engine = engine_with(MemorySignalStore::new());

        let report = completed(
            engine
                .analyze(&[approaching("t1", "N1_1@x", 50.0, 19.0, 1.0, Some(60))])
                .await,
        );

        assert_eq!(report.discovered, 1);
        assert_eq!(engine.store().signal_count(), 0);
    }

    #[tokio::test]
    async fn trains_without_position_or_signal_are_skipped() {
        let engine = engine_with(MemorySignalStore::new());

        let mut no_position = approaching("t1", "A1_1", 50.0, 19.0, 1.0, None);
        no_position.latitude = None;
        let mut no_signal = approaching("t2", "A1_1", 50.0, 19.0, 1.0, None);
        no_signal.signal_in_front = None;

        let report = completed(engine.analyze(&[no_position, no_signal]).await);

        assert_eq!(report.skipped, 2);
        assert_eq!(report.processed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_batch_is_dropped() {
        let store = MemorySignalStore::with_delay(Duration::from_millis(100));
        store.seed(signal("A1_1", 50.0, 19.0, 10.0));
        store.seed(signal("A1_2", 50.01, 19.0, 10.0));
        let engine = Arc::new(engine_with(store));

        let first = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                engine
                    .analyze(&[approaching("t1", "A1_1", 49.99, 19.0, 900.0, None)])
                    .await
            })
        };

        //let the first run reach its slow prefetch
        tokio::time::sleep(Duration::from_millis(1)).await;

        let second = engine
            .analyze(&[approaching("t1", "A1_2", 50.005, 19.0, 400.0, None)])
            .await;
        assert_eq!(second, AnalysisOutcome::Skipped);

        completed(first.await.unwrap());

        assert!(engine
            .store()
            .edge_list(EdgeDirection::Next, "A1_1")
            .is_empty());

        //the dropped batch never reached the cache, so this is not a transition either
        let report = completed(
            engine
                .analyze(&[approaching("t1", "A1_1", 49.99, 19.0, 900.0, None)])
                .await,
        );
        assert_eq!(report.transitions, 0);
    }
}
