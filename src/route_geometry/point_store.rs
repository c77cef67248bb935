// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

//! Route point files, one per route, each line `routeId;lat;lon`.

use ahash::AHashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutePoint {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Error)]
pub enum PointStoreError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub fn parse_line(line: &str) -> Option<(String, RoutePoint)> {
    let mut parts = line.trim().split(';');

    let route_id = parts.next()?.trim();
    let lat = parts.next()?.trim().parse::<f64>().ok()?;
    let lon = parts.next()?.trim().parse::<f64>().ok()?;

    if route_id.is_empty() || parts.next().is_some() || !lat.is_finite() || !lon.is_finite() {
        return None;
    }

    Some((route_id.to_string(), RoutePoint { lat, lon }))
}

pub fn format_line(route_id: &str, point: &RoutePoint) -> String {
    format!("{};{};{}", route_id, point.lat, point.lon)
}

/// File name for a route. Anything outside `[A-Za-z0-9-]`, the `_` escape included,
/// becomes `_XX` per UTF-8 byte so distinct ids never share a file.
pub fn route_file_name(route_id: &str) -> String {
    let mut name = String::with_capacity(route_id.len() + 4);

    for byte in route_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            name.push(byte as char);
        } else {
            name.push_str(&format!("_{:02X}", byte));
        }
    }

    name.push_str(".csv");
    name
}

/// Reads every route file in `dir`. A missing directory is an empty set.
pub async fn load_routes_dir(
    dir: &Path,
) -> Result<AHashMap<String, Vec<RoutePoint>>, PointStoreError> {
    let mut routes: AHashMap<String, Vec<RoutePoint>> = AHashMap::new();

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(
                "Route point directory {} does not exist, starting empty",
                dir.display()
            );
            return Ok(routes);
        }
        Err(source) => {
            return Err(PointStoreError::Read {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    while let Some(entry) =
        entries
            .next_entry()
            .await
            .map_err(|source| PointStoreError::Read {
                path: dir.to_path_buf(),
                source,
            })?
    {
        let path = entry.path();

        //half written flush from a previous run
        if path.extension().is_some_and(|ext| ext == "tmp") || !path.is_file() {
            continue;
        }

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Could not read route file {}: {}", path.display(), e);
                continue;
            }
        };

        for line in contents.lines().filter(|line| !line.trim().is_empty()) {
            match parse_line(line) {
                Some((route_id, point)) => routes.entry(route_id).or_default().push(point),
                None => warn!("Skipping malformed line in {}: {}", path.display(), line),
            }
        }
    }

    Ok(routes)
}

fn write_err(path: &Path) -> impl FnOnce(std::io::Error) -> PointStoreError + use<> {
    let path = path.to_path_buf();
    move |source| PointStoreError::Write { path, source }
}

/// Overwrites the route's file with `points`, through a `.tmp` sibling.
pub async fn write_route_file(
    dir: &Path,
    route_id: &str,
    points: impl Iterator<Item = RoutePoint>,
) -> Result<(), PointStoreError> {
    let file_path = dir.join(route_file_name(route_id));
    let temp_file_path = dir.join(format!("{}.tmp", route_file_name(route_id)));

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(write_err(dir))?;

    let mut contents = String::new();
    for point in points {
        contents.push_str(&format_line(route_id, &point));
        contents.push('\n');
    }

    tokio::fs::write(&temp_file_path, contents)
        .await
        .map_err(write_err(&temp_file_path))?;

    tokio::fs::rename(&temp_file_path, &file_path)
        .await
        .map_err(write_err(&file_path))?;

    Ok(())
}
