// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

//! Self-rescheduling fetch loops.
//!
//! A scheduler runs one fetch, publishes the result, records how long it took and
//! then sleeps for whatever is left of its interval. A fetch that overruns the
//! interval is followed straight away by the next one, so there is never more than
//! one fetch in flight and never a backlog.

pub mod stats;

use ahash::AHashMap;
use stats::{FetchTimings, StatsSink};
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{RwLock, broadcast};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream answered with status {0}")]
    Status(reqwest::StatusCode),
    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

/// Most recent value a scheduler has published, `None` until the first success.
pub type Latest<T> = Arc<RwLock<Option<Arc<T>>>>;

pub trait Fetcher: Send + Sync + 'static {
    type Output: Send + Sync + 'static;

    fn name(&self) -> &str;

    fn fetch(&self) -> impl Future<Output = Result<Self::Output, FetchError>> + Send;
}

/// A feed that is fetched once per upstream entity, for example per game server.
pub trait PerEntityFetcher: Send + Sync + 'static {
    type Entity: Clone + Eq + Hash + Display + Send + Sync + 'static;
    type Output: Send + Sync + 'static;

    fn name(&self) -> &str;

    fn entities(&self) -> impl Future<Output = Result<Vec<Self::Entity>, FetchError>> + Send;

    fn fetch_entity(
        &self,
        entity: &Self::Entity,
    ) -> impl Future<Output = Result<Self::Output, FetchError>> + Send;
}

#[derive(Debug)]
pub enum EntityEvent<K, V> {
    Entity(K, Arc<V>),
    Aggregate(Arc<AHashMap<K, Arc<V>>>),
}

impl<K: Clone, V> Clone for EntityEvent<K, V> {
    fn clone(&self) -> Self {
        match self {
            EntityEvent::Entity(key, value) => EntityEvent::Entity(key.clone(), Arc::clone(value)),
            EntityEvent::Aggregate(map) => EntityEvent::Aggregate(Arc::clone(map)),
        }
    }
}

/// Time left in the interval, never negative.
pub fn next_delay(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}

pub struct FetchScheduler<F: Fetcher> {
    fetcher: F,
    interval: Duration,
    sender: broadcast::Sender<Arc<F::Output>>,
    latest: Latest<F::Output>,
    timings: Arc<RwLock<FetchTimings>>,
    stats: Option<StatsSink>,
}

impl<F: Fetcher> FetchScheduler<F> {
    pub fn new(fetcher: F, interval: Duration) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);

        Self {
            fetcher,
            interval,
            sender,
            latest: Arc::new(RwLock::new(None)),
            timings: Arc::new(RwLock::new(FetchTimings::default())),
            stats: None,
        }
    }

    pub fn with_stats(mut self, stats: StatsSink) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<F::Output>> {
        self.sender.subscribe()
    }

    pub fn latest(&self) -> Latest<F::Output> {
        Arc::clone(&self.latest)
    }

    pub fn timings(&self) -> Arc<RwLock<FetchTimings>> {
        Arc::clone(&self.timings)
    }

    /// One fetch, publish and record. Returns how long the cycle took.
    pub async fn run_cycle(&self) -> Duration {
        let start = Instant::now();
        let result = self.fetcher.fetch().await;
        let elapsed = start.elapsed();

        let success = match result {
            Ok(output) => {
                let output = Arc::new(output);
                *self.latest.write().await = Some(Arc::clone(&output));

                if self.sender.send(output).is_err() {
                    debug!("No subscribers for {}", self.fetcher.name());
                }
                true
            }
            Err(e) => {
                error!("Fetch of {} failed after {:?}: {}", self.fetcher.name(), elapsed, e);
                false
            }
        };

        let cycles = {
            let mut timings = self.timings.write().await;
            timings.record(elapsed, success);
            timings.cycles
        };

        if let Some(stats) = &self.stats {
            stats.record(elapsed, cycles, None).await;
        }

        elapsed
    }

    pub async fn run(self) {
        info!(
            "Starting {} fetch loop every {:?}",
            self.fetcher.name(),
            self.interval
        );

        loop {
            let elapsed = self.run_cycle().await;
            tokio::time::sleep(next_delay(self.interval, elapsed)).await;
        }
    }
}

pub struct PerEntityScheduler<F: PerEntityFetcher> {
    fetcher: F,
    interval: Duration,
    sender: broadcast::Sender<EntityEvent<F::Entity, F::Output>>,
    timings: Arc<RwLock<FetchTimings>>,
    stats: Option<StatsSink>,
}

impl<F: PerEntityFetcher> PerEntityScheduler<F> {
    pub fn new(fetcher: F, interval: Duration) -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);

        Self {
            fetcher,
            interval,
            sender,
            timings: Arc::new(RwLock::new(FetchTimings::default())),
            stats: None,
        }
    }

    pub fn with_stats(mut self, stats: StatsSink) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EntityEvent<F::Entity, F::Output>> {
        self.sender.subscribe()
    }

    pub fn timings(&self) -> Arc<RwLock<FetchTimings>> {
        Arc::clone(&self.timings)
    }

    fn publish(&self, event: EntityEvent<F::Entity, F::Output>) {
        if self.sender.send(event).is_err() {
            debug!("No subscribers for {}", self.fetcher.name());
        }
    }

    /// Fans out one fetch per entity, all awaited together, then publishes.
    pub async fn run_cycle(&self) -> Duration {
        let start = Instant::now();
        let name = self.fetcher.name();

        let (success, entity_count) = match self.fetcher.entities().await {
            Ok(entities) => {
                let results = futures::future::join_all(entities.iter().map(|entity| async move {
                    (entity.clone(), self.fetcher.fetch_entity(entity).await)
                }))
                .await;

                let mut aggregate: AHashMap<F::Entity, Arc<F::Output>> = AHashMap::new();
                let mut failures = 0;

                for (entity, result) in results {
                    match result {
                        Ok(output) => {
                            let output = Arc::new(output);
                            self.publish(EntityEvent::Entity(entity.clone(), Arc::clone(&output)));
                            aggregate.insert(entity, output);
                        }
                        Err(e) => {
                            failures += 1;
                            warn!("Fetch of {} for {} failed: {}", name, entity, e);
                        }
                    }
                }

                let entity_count = aggregate.len();
                self.publish(EntityEvent::Aggregate(Arc::new(aggregate)));

                (failures == 0, entity_count)
            }
            Err(e) => {
                error!("Could not list entities for {}: {}", name, e);
                (false, 0)
            }
        };

        let elapsed = start.elapsed();

        let cycles = {
            let mut timings = self.timings.write().await;
            timings.record(elapsed, success);
            timings.cycles
        };

        if let Some(stats) = &self.stats {
            stats.record(elapsed, cycles, Some(entity_count)).await;
        }

        elapsed
    }

    pub async fn run(self) {
        info!(
            "Starting {} per-entity fetch loop every {:?}",
            self.fetcher.name(),
            self.interval
        );

        loop {
            let elapsed = self.run_cycle().await;
            tokio::time::sleep(next_delay(self.interval, elapsed)).await;
        }
    }
}
