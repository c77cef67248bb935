// Copyright Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Attribution cannot be removed

//! Juniper: watches live trains, grows route geometry and learns the signal graph.

use anyhow::Context;
use clap::Parser;
use railgraph::config::{Config, refresh_interval_for_feed};
use railgraph::fetch_scheduler::stats::StatsSink;
use railgraph::fetch_scheduler::{FetchScheduler, PerEntityScheduler};
use railgraph::postgres_tools::make_async_pool;
use railgraph::route_geometry::RouteGeometryEngine;
use railgraph::signal_topology::import::import_signal_file;
use railgraph::signal_topology::{PgSignalStore, SignalTopologyEngine};
use railgraph::upstream::{ServersFeed, TrainsFeed, make_reqwest_client};
use railgraph::workers::run_engine_worker;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

const DEFAULT_SERVERS_INTERVAL: Duration = Duration::from_millis(30_000);
const DEFAULT_TRAINS_INTERVAL: Duration = Duration::from_millis(5_000);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Do not run the bulk signal import at startup
    #[arg(long)]
    skip_import: bool,
    /// Run the bulk signal import and exit
    #[arg(long, conflicts_with = "skip_import")]
    import_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    info!("Starting juniper against {}", config.api_base);

    let pool = Arc::new(
        make_async_pool()
            .await
            .context("could not connect to postgres")?,
    );
    let store = Arc::new(PgSignalStore::new(Arc::clone(&pool)));

    if !args.skip_import {
        match import_signal_file(store.as_ref(), &config.signals_file).await {
            Ok(report) => info!("Signal import finished: {:?}", report),
            Err(e) => error!("Signal import failed: {}", e),
        }
    }

    if args.import_only {
        return Ok(());
    }

    let route_engine = Arc::new(RouteGeometryEngine::load(config.routes_dir.clone()).await);
    let signal_engine = Arc::new(SignalTopologyEngine::new(
        Arc::clone(&store),
        config.signal_cache_ttl,
    ));

    let client = make_reqwest_client().context("could not build http client")?;

    let servers = FetchScheduler::new(
        ServersFeed::new(client.clone(), &config.api_base),
        refresh_interval_for_feed("servers", DEFAULT_SERVERS_INTERVAL),
    )
    .with_stats(StatsSink::new(&config.stats_dir, "servers"));

    let trains = PerEntityScheduler::new(
        TrainsFeed::new(client, &config.api_base, servers.latest()),
        refresh_interval_for_feed("trains", DEFAULT_TRAINS_INTERVAL),
    )
    .with_stats(StatsSink::new(&config.stats_dir, "trains"));

    let mut set = JoinSet::new();

    set.spawn(run_engine_worker(route_engine, trains.subscribe()));
    set.spawn(run_engine_worker(signal_engine, trains.subscribe()));
    set.spawn(servers.run());
    set.spawn(trains.run());

    while let Some(res) = set.join_next().await {
        if let Err(e) = res {
            warn!("Juniper task ended: {}", e);
        }
    }

    Ok(())
}
