// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

//! Offline signal import.
//!
//! One record per line: `name;lat;lon;extra;accuracy;type;prev,ids;next,ids`.
//! New signals are inserted together with their declared neighbours, known
//! signals only get a better accuracy or a missing type. Consumed files are
//! renamed, never deleted.

use super::store::{EdgeDirection, Signal, SignalGraphStore, SignalType, StoreError};
use ahash::AHashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Clone, Debug, PartialEq)]
pub struct ImportRecord {
    pub signal: Signal,
    pub prev: Vec<String>,
    pub next: Vec<String>,
}

#[derive(Error, Debug, PartialEq)]
pub enum ImportLineError {
    #[error("expected 8 fields, found {0}")]
    FieldCount(usize),
    #[error("field {field} is not a number: {value:?}")]
    Number { field: &'static str, value: String },
    #[error("signal name is empty")]
    EmptyName,
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("I/O error accessing '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub records: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub malformed: usize,
    pub edges_inserted: usize,
    pub edges_failed: usize,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.edges_failed == 0
    }
}

enum RecordOutcome {
    Inserted,
    Updated,
    Unchanged,
}

fn parse_number(field: &'static str, value: &str) -> Result<f64, ImportLineError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| ImportLineError::Number {
            field,
            value: value.to_string(),
        })
}

fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(|id| id.to_string())
        .collect()
}

pub fn parse_import_line(line: &str) -> Result<ImportRecord, ImportLineError> {
    let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(';').collect();

    if fields.len() != 8 {
        return Err(ImportLineError::FieldCount(fields.len()));
    }

    let name = fields[0].trim();
    if name.is_empty() {
        return Err(ImportLineError::EmptyName);
    }

    Ok(ImportRecord {
        signal: Signal {
            name: name.to_string(),
            lat: parse_number("lat", fields[1])?,
            lon: parse_number("lon", fields[2])?,
            extra: fields[3].to_string(),
            accuracy: parse_number("accuracy", fields[4])?,
            signal_type: SignalType::parse(fields[5]),
        },
        prev: parse_id_list(fields[6]),
        next: parse_id_list(fields[7]),
    })
}

/// Parses every non-blank line, later records for the same name replace earlier ones.
pub fn parse_import_lines<'a>(
    lines: impl Iterator<Item = &'a str>,
    report: &mut ImportReport,
) -> Vec<ImportRecord> {
    let mut records: Vec<ImportRecord> = vec![];
    let mut index_by_name: AHashMap<String, usize> = AHashMap::new();

    for (line_number, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        match parse_import_line(line) {
            Ok(record) => match index_by_name.get(&record.signal.name) {
                Some(&index) => records[index] = record,
                None => {
                    index_by_name.insert(record.signal.name.clone(), records.len());
                    records.push(record);
                }
            },
            Err(e) => {
                warn!("Skipping signal import line {}: {}", line_number + 1, e);
                report.malformed += 1;
            }
        }
    }

    records
}

async fn import_one<S: SignalGraphStore>(
    store: &S,
    record: &ImportRecord,
) -> Result<RecordOutcome, StoreError> {
    let existing = store
        .get_signals(std::slice::from_ref(&record.signal.name))
        .await?;

    match existing.into_iter().next() {
        None => {
            store.insert_signal(&record.signal).await?;
            Ok(RecordOutcome::Inserted)
        }
        Some(current) => {
            let mut changed = false;

            if record.signal.accuracy < current.accuracy {
                store
                    .update_signal_accuracy(&current.name, record.signal.accuracy)
                    .await?;
                changed = true;
            }

            if current.signal_type.is_none() {
                if let Some(signal_type) = record.signal.signal_type {
                    store.update_signal_type(&current.name, signal_type).await?;
                    changed = true;
                }
            }

            match changed {
                true => Ok(RecordOutcome::Updated),
                false => Ok(RecordOutcome::Unchanged),
            }
        }
    }
}

/// Writes all records concurrently, then the queued edges one at a time.
pub async fn import_records<S: SignalGraphStore>(
    store: &S,
    records: &[ImportRecord],
    report: &mut ImportReport,
) {
    let start = Instant::now();
    report.records += records.len();

    let outcomes =
        futures::future::join_all(records.iter().map(|record| import_one(store, record))).await;

    let mut queued_edges: Vec<(EdgeDirection, &str, &str)> = vec![];

    for (record, outcome) in records.iter().zip(outcomes) {
        match outcome {
            Ok(RecordOutcome::Inserted) => {
                report.inserted += 1;

                for prev in &record.prev {
                    queued_edges.push((
                        EdgeDirection::Prev,
                        record.signal.name.as_str(),
                        prev.as_str(),
                    ));
                }
                for next in &record.next {
                    queued_edges.push((
                        EdgeDirection::Next,
                        record.signal.name.as_str(),
                        next.as_str(),
                    ));
                }
            }
            Ok(RecordOutcome::Updated) => report.updated += 1,
            Ok(RecordOutcome::Unchanged) => report.unchanged += 1,
            Err(e) => {
                report.failed += 1;
                warn!("Failed to import signal {}: {}", record.signal.name, e);
            }
        }
    }

    if report.failed > 0 {
        error!(
            "{} of {} signal records failed to import",
            report.failed,
            records.len()
        );
    }

    for (direction, signal, other) in queued_edges {
        match store.insert_edge(direction, signal, other).await {
            Ok(()) => report.edges_inserted += 1,
            Err(e) => {
                report.edges_failed += 1;
                error!(
                    "Failed to insert {:?} edge {} -> {}: {}",
                    direction, signal, other, e
                );
            }
        }
    }

    info!(
        "Signal import finished in {:?}: {} inserted, {} updated, {} edges",
        start.elapsed(),
        report.inserted,
        report.updated,
        report.edges_inserted
    );
}

/// `data/signals.csv` -> `data/signals.csv.old`
pub fn old_file_path(signals_file: &Path) -> PathBuf {
    let mut name = signals_file.as_os_str().to_owned();
    name.push(".old");
    PathBuf::from(name)
}

fn imported_file_path(file: &Path, unix_ms: u128) -> PathBuf {
    let mut name = file.as_os_str().to_owned();
    name.push(format!(".{}.imported", unix_ms));
    PathBuf::from(name)
}

async fn read_if_present(path: &Path) -> Result<Option<String>, ImportError> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ImportError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Imports `signals_file` merged with a leftover `<signals_file>.old`.
///
/// After a clean pass every consumed file is renamed to `<file>.<unix_ms>.imported`.
/// When any record or edge failed the files stay where they are so the next start
/// runs the (idempotent) import again.
pub async fn import_signal_file<S: SignalGraphStore>(
    store: &S,
    signals_file: &Path,
) -> Result<ImportReport, ImportError> {
    let mut report = ImportReport::default();

    let old_file = old_file_path(signals_file);

    let mut consumed: Vec<PathBuf> = vec![];
    let mut contents: Vec<String> = vec![];

    //old first, so the newer file wins for duplicated names
    for path in [old_file.as_path(), signals_file] {
        if let Some(text) = read_if_present(path).await? {
            consumed.push(path.to_path_buf());
            contents.push(text);
        }
    }

    if consumed.is_empty() {
        warn!(
            "No signal import file at {}, nothing to import",
            signals_file.display()
        );
        return Ok(report);
    }

    let records = parse_import_lines(contents.iter().flat_map(|text| text.lines()), &mut report);

    import_records(store, &records, &mut report).await;

    if !report.is_clean() {
        warn!(
            "Signal import had failures, leaving {:?} in place for the next run",
            consumed
        );
        return Ok(report);
    }

    let unix_ms = crate::duration_since_unix_epoch().as_millis();

    for path in consumed {
        let target = imported_file_path(&path, unix_ms);
        if let Err(e) = tokio::fs::rename(&path, &target).await {
            error!(
                "Could not rename {} to {}: {}",
                path.display(),
                target.display(),
                e
            );
        }
    }

    Ok(report)
}
