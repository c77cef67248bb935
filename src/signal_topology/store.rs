// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use crate::models::{SignalNextRow, SignalPrevRow, SignalRow};
use crate::postgis_to_diesel::{diesel_point_to_lat_lon, lat_lon_to_diesel};
use crate::postgres_tools::RailgraphPostgresPool;
use crate::schema::signals::signal_next::dsl as next_dsl;
use crate::schema::signals::signal_prev::dsl as prev_dsl;
use crate::schema::signals::signals::dsl as signals_dsl;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use geo::{Distance, Euclidean};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignalType {
    Main,
    Block,
}

impl SignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::Main => "main",
            SignalType::Block => "block",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "main" => Some(SignalType::Main),
            "block" => Some(SignalType::Block),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Signal {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// metres, smaller is better
    pub accuracy: f64,
    pub extra: String,
    pub signal_type: Option<SignalType>,
}

impl Signal {
    /// Planar distance in raw degrees. Only meaningful for ranking nearby candidates.
    pub fn planar_distance_to(&self, lat: f64, lon: f64) -> f64 {
        Euclidean.distance(
            geo::Point::new(self.lon, self.lat),
            geo::Point::new(lon, lat),
        )
    }
}

impl From<SignalRow> for Signal {
    fn from(row: SignalRow) -> Self {
        let (lat, lon) = diesel_point_to_lat_lon(&row.point);

        Signal {
            name: row.name,
            lat,
            lon,
            accuracy: row.accuracy,
            extra: row.extra,
            signal_type: row.signal_type.as_deref().and_then(SignalType::parse),
        }
    }
}

impl From<&Signal> for SignalRow {
    fn from(signal: &Signal) -> Self {
        SignalRow {
            name: signal.name.clone(),
            point: lat_lon_to_diesel(signal.lat, signal.lon),
            accuracy: signal.accuracy,
            extra: signal.extra.clone(),
            signal_type: signal.signal_type.map(|t| t.as_str().to_string()),
        }
    }
}

/// Which edge relation of the graph an operation targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeDirection {
    Prev,
    Next,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Diesel(#[from] diesel::result::Error),
    #[error("could not get a pooled connection: {0}")]
    Pool(String),
}

/// Everything the inference engine and the importer need from the signal database.
pub trait SignalGraphStore: Send + Sync + 'static {
    fn get_signals(
        &self,
        names: &[String],
    ) -> impl Future<Output = Result<Vec<Signal>, StoreError>> + Send;

    fn insert_signal(&self, signal: &Signal)
    -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Only applied when `accuracy` is smaller than the stored value.
    fn update_signal_accuracy(
        &self,
        name: &str,
        accuracy: f64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Only applied while the stored type is unset.
    fn update_signal_type(
        &self,
        name: &str,
        signal_type: SignalType,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Only applied when `accuracy` is smaller than the stored value.
    fn update_signal_position(
        &self,
        name: &str,
        lat: f64,
        lon: f64,
        accuracy: f64,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// No-op when the edge already exists.
    fn insert_edge(
        &self,
        direction: EdgeDirection,
        signal: &str,
        other: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn edges(
        &self,
        direction: EdgeDirection,
        signal: &str,
    ) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;

    fn delete_edges_except(
        &self,
        direction: EdgeDirection,
        signal: &str,
        keep: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

pub struct PgSignalStore {
    pool: Arc<RailgraphPostgresPool>,
}

impl PgSignalStore {
    pub fn new(pool: Arc<RailgraphPostgresPool>) -> Self {
        Self { pool }
    }
}

fn pool_error(e: impl std::fmt::Display) -> StoreError {
    StoreError::Pool(e.to_string())
}

impl SignalGraphStore for PgSignalStore {
    async fn get_signals(&self, names: &[String]) -> Result<Vec<Signal>, StoreError> {
        if names.is_empty() {
            return Ok(vec![]);
        }

        let conn_pre = self.pool.get().await;
        let conn = &mut conn_pre.map_err(pool_error)?;

        let rows = signals_dsl::signals
            .filter(signals_dsl::name.eq_any(names))
            .select(SignalRow::as_select())
            .load::<SignalRow>(conn)
            .await?;

        Ok(rows.into_iter().map(Signal::from).collect())
    }

    async fn insert_signal(&self, signal: &Signal) -> Result<(), StoreError> {
        let conn_pre = self.pool.get().await;
        let conn = &mut conn_pre.map_err(pool_error)?;

        diesel::insert_into(signals_dsl::signals)
            .values(SignalRow::from(signal))
            .on_conflict_do_nothing()
            .execute(conn)
            .await?;

        Ok(())
    }

    async fn update_signal_accuracy(&self, name: &str, accuracy: f64) -> Result<(), StoreError> {
        let conn_pre = self.pool.get().await;
        let conn = &mut conn_pre.map_err(pool_error)?;

        diesel::update(
            signals_dsl::signals
                .filter(signals_dsl::name.eq(name))
                .filter(signals_dsl::accuracy.gt(accuracy)),
        )
        .set(signals_dsl::accuracy.eq(accuracy))
        .execute(conn)
        .await?;

        Ok(())
    }

    async fn update_signal_type(
        &self,
        name: &str,
        signal_type: SignalType,
    ) -> Result<(), StoreError> {
        let conn_pre = self.pool.get().await;
        let conn = &mut conn_pre.map_err(pool_error)?;

        diesel::update(
            signals_dsl::signals
                .filter(signals_dsl::name.eq(name))
                .filter(signals_dsl::signal_type.is_null()),
        )
        .set(signals_dsl::signal_type.eq(signal_type.as_str()))
        .execute(conn)
        .await?;

        Ok(())
    }

    async fn update_signal_position(
        &self,
        name: &str,
        lat: f64,
        lon: f64,
        accuracy: f64,
    ) -> Result<(), StoreError> {
        let conn_pre = self.pool.get().await;
        let conn = &mut conn_pre.map_err(pool_error)?;

        diesel::update(
            signals_dsl::signals
                .filter(signals_dsl::name.eq(name))
                .filter(signals_dsl::accuracy.gt(accuracy)),
        )
        .set((
            signals_dsl::point.eq(lat_lon_to_diesel(lat, lon)),
            signals_dsl::accuracy.eq(accuracy),
        ))
        .execute(conn)
        .await?;

        Ok(())
    }

    async fn insert_edge(
        &self,
        direction: EdgeDirection,
        signal: &str,
        other: &str,
    ) -> Result<(), StoreError> {
        let conn_pre = self.pool.get().await;
        let conn = &mut conn_pre.map_err(pool_error)?;

        match direction {
            EdgeDirection::Next => {
                diesel::insert_into(next_dsl::signal_next)
                    .values(SignalNextRow {
                        signal: signal.to_string(),
                        next_signal: other.to_string(),
                    })
                    .on_conflict_do_nothing()
                    .execute(conn)
                    .await?;
            }
            EdgeDirection::Prev => {
                diesel::insert_into(prev_dsl::signal_prev)
                    .values(SignalPrevRow {
                        signal: signal.to_string(),
                        prev_signal: other.to_string(),
                    })
                    .on_conflict_do_nothing()
                    .execute(conn)
                    .await?;
            }
        }

        Ok(())
    }

    async fn edges(&self, direction: EdgeDirection, signal: &str) -> Result<Vec<String>, StoreError> {
        let conn_pre = self.pool.get().await;
        let conn = &mut conn_pre.map_err(pool_error)?;

        let others = match direction {
            EdgeDirection::Next => {
                next_dsl::signal_next
                    .filter(next_dsl::signal.eq(signal))
                    .select(next_dsl::next_signal)
                    .load::<String>(conn)
                    .await?
            }
            EdgeDirection::Prev => {
                prev_dsl::signal_prev
                    .filter(prev_dsl::signal.eq(signal))
                    .select(prev_dsl::prev_signal)
                    .load::<String>(conn)
                    .await?
            }
        };

        Ok(others)
    }

    async fn delete_edges_except(
        &self,
        direction: EdgeDirection,
        signal: &str,
        keep: &str,
    ) -> Result<(), StoreError> {
        let conn_pre = self.pool.get().await;
        let conn = &mut conn_pre.map_err(pool_error)?;

        match direction {
            EdgeDirection::Next => {
                diesel::delete(
                    next_dsl::signal_next
                        .filter(next_dsl::signal.eq(signal))
                        .filter(next_dsl::next_signal.ne(keep)),
                )
                .execute(conn)
                .await?;
            }
            EdgeDirection::Prev => {
                diesel::delete(
                    prev_dsl::signal_prev
                        .filter(prev_dsl::signal.eq(signal))
                        .filter(prev_dsl::prev_signal.ne(keep)),
                )
                .execute(conn)
                .await?;
            }
        }

        Ok(())
    }
}
