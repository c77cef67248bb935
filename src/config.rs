// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

//! Environment driven settings for the juniper service.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://panel.simrail.eu:8084";
pub const DEFAULT_SIGNAL_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base: String,
    pub routes_dir: PathBuf,
    pub signals_file: PathBuf,
    pub stats_dir: PathBuf,
    pub signal_cache_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let signal_cache_ttl = lookup("SIGNAL_CACHE_TTL_SECS")
            .and_then(|secs| secs.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SIGNAL_CACHE_TTL);

        Config {
            api_base: lookup("RAIL_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            routes_dir: lookup("ROUTES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/routes")),
            signals_file: lookup("SIGNALS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/signals.csv")),
            stats_dir: lookup("STATS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/stats")),
            signal_cache_ttl,
        }
    }
}

/// `trains` -> `TRAINS_REFRESH_INTERVAL_MS`
pub fn feed_interval_env_key(feed_name: &str) -> String {
    let normalised: String = feed_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();

    format!("{}_REFRESH_INTERVAL_MS", normalised)
}

pub fn refresh_interval_for_feed(feed_name: &str, default: Duration) -> Duration {
    refresh_interval_from_lookup(feed_name, default, |key| std::env::var(key).ok())
}

pub fn refresh_interval_from_lookup(
    feed_name: &str,
    default: Duration,
    lookup: impl Fn(&str) -> Option<String>,
) -> Duration {
    let key = feed_interval_env_key(feed_name);

    match lookup(&key) {
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                tracing::warn!("{} is not a number of milliseconds: {:?}", key, raw);
                default
            }
        },
        None => default,
    }
}
