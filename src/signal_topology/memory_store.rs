//! In-process stand-in for the signal database, used by the engine and importer tests.

use super::store::{EdgeDirection, Signal, SignalGraphStore, SignalType, StoreError};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
struct Graph {
    signals: BTreeMap<String, Signal>,
    next: BTreeSet<(String, String)>,
    prev: BTreeSet<(String, String)>,
}

#[derive(Default)]
pub struct MemorySignalStore {
    graph: Mutex<Graph>,
    delay: Option<Duration>,
    //writes touching these names fail
    failing: HashSet<String>,
}

impl MemorySignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps first, for overlapping-run tests.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn failing_on(names: &[&str]) -> Self {
        Self {
            failing: names.iter().map(|n| n.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn seed(&self, signal: Signal) {
        self.graph
            .lock()
            .unwrap()
            .signals
            .insert(signal.name.clone(), signal);
    }

    pub fn seed_edge(&self, direction: EdgeDirection, signal: &str, other: &str) {
        let mut graph = self.graph.lock().unwrap();
        let set = match direction {
            EdgeDirection::Next => &mut graph.next,
            EdgeDirection::Prev => &mut graph.prev,
        };
        set.insert((signal.to_string(), other.to_string()));
    }

    pub fn signal(&self, name: &str) -> Option<Signal> {
        self.graph.lock().unwrap().signals.get(name).cloned()
    }

    pub fn signal_count(&self) -> usize {
        self.graph.lock().unwrap().signals.len()
    }

    pub fn edge_list(&self, direction: EdgeDirection, signal: &str) -> Vec<String> {
        let graph = self.graph.lock().unwrap();
        let set = match direction {
            EdgeDirection::Next => &graph.next,
            EdgeDirection::Prev => &graph.prev,
        };
        set.iter()
            .filter(|(from, _)| from == signal)
            .map(|(_, to)| to.clone())
            .collect()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check(&self, name: &str) -> Result<(), StoreError> {
        if self.failing.contains(name) {
            return Err(StoreError::Pool(format!("injected failure for {}", name)));
        }
        Ok(())
    }
}

impl SignalGraphStore for MemorySignalStore {
    async fn get_signals(&self, names: &[String]) -> Result<Vec<Signal>, StoreError> {
        self.pause().await;
        let graph = self.graph.lock().unwrap();
        Ok(names
            .iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .filter_map(|name| graph.signals.get(name).cloned())
            .collect())
    }

    async fn insert_signal(&self, signal: &Signal) -> Result<(), StoreError> {
        self.pause().await;
        self.check(&signal.name)?;
        self.graph
            .lock()
            .unwrap()
            .signals
            .entry(signal.name.clone())
            .or_insert_with(|| signal.clone());
        Ok(())
    }

    async fn update_signal_accuracy(&self, name: &str, accuracy: f64) -> Result<(), StoreError> {
        self.pause().await;
        self.check(name)?;
        if let Some(signal) = self.graph.lock().unwrap().signals.get_mut(name) {
            if accuracy < signal.accuracy {
                signal.accuracy = accuracy;
            }
        }
        Ok(())
    }

    async fn update_signal_type(
        &self,
        name: &str,
        signal_type: SignalType,
    ) -> Result<(), StoreError> {
        self.pause().await;
        self.check(name)?;
        if let Some(signal) = self.graph.lock().unwrap().signals.get_mut(name) {
            if signal.signal_type.is_none() {
                signal.signal_type = Some(signal_type);
            }
        }
        Ok(())
    }

    async fn update_signal_position(
        &self,
        name: &str,
        lat: f64,
        lon: f64,
        accuracy: f64,
    ) -> Result<(), StoreError> {
        self.pause().await;
        self.check(name)?;
        if let Some(signal) = self.graph.lock().unwrap().signals.get_mut(name) {
            if accuracy < signal.accuracy {
                signal.lat = lat;
                signal.lon = lon;
                signal.accuracy = accuracy;
            }
        }
        Ok(())
    }

    async fn insert_edge(
        &self,
        direction: EdgeDirection,
        signal: &str,
        other: &str,
    ) -> Result<(), StoreError> {
        self.pause().await;
        self.check(signal)?;
        self.seed_edge(direction, signal, other);
        Ok(())
    }

    async fn edges(&self, direction: EdgeDirection, signal: &str) -> Result<Vec<String>, StoreError> {
        self.pause().await;
        Ok(self.edge_list(direction, signal))
    }

    async fn delete_edges_except(
        &self,
        direction: EdgeDirection,
        signal: &str,
        keep: &str,
    ) -> Result<(), StoreError> {
        self.pause().await;
        self.check(signal)?;
        let mut graph = self.graph.lock().unwrap();
        let set = match direction {
            EdgeDirection::Next => &mut graph.next,
            EdgeDirection::Prev => &mut graph.prev,
        };
        set.retain(|(from, to)| from != signal || to == keep);
        Ok(())
    }
}
