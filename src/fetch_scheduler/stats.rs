// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

use chrono::{DateTime, SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::warn;

/// Running fetch timings for one feed.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FetchTimings {
    pub average_ms: f64,
    pub cycles: u64,
    pub failures: u64,
    pub last_ms: f64,
}

impl FetchTimings {
    pub fn record(&mut self, duration: Duration, success: bool) {
        let latest = duration.as_secs_f64() * 1000.0;

        //two point moving average, seeded by the first sample
        self.average_ms = match self.cycles {
            0 => latest,
            _ => (self.average_ms + latest) / 2.0,
        };

        self.last_ms = latest;
        self.cycles += 1;

        if !success {
            self.failures += 1;
        }
    }
}

pub fn format_stats_line(
    timestamp: DateTime<Utc>,
    duration: Duration,
    cycles: u64,
    entity_count: Option<usize>,
) -> String {
    let mut line = format!(
        "{},{},{}",
        timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        duration.as_millis(),
        cycles
    );

    if let Some(entity_count) = entity_count {
        line.push(',');
        line.push_str(&entity_count.to_string());
    }

    line
}

/// Append-only per-feed statistics file, `<dir>/<feed>.csv`.
#[derive(Debug, Clone)]
pub struct StatsSink {
    dir: PathBuf,
    path: PathBuf,
}

impl StatsSink {
    pub fn new(dir: &Path, feed_name: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            path: dir.join(format!("{}.csv", feed_name)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails the caller, a lost stats line is only logged.
    pub async fn record(&self, duration: Duration, cycles: u64, entity_count: Option<usize>) {
        let line = format_stats_line(Utc::now(), duration, cycles, entity_count);

        if let Err(e) = self.append(&line).await {
            warn!(
                "Could not write stats line to {}: {}",
                self.path.display(),
                e
            );
        }
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(format!("{}\n", line).as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }
}
