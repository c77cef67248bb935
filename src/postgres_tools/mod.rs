// Copyright: Kyler Chin <kyler@catenarymaps.org>
// Catenary Transit Initiatives
// Removal of the attribution is not allowed, as covered under the AGPL license
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::ManagerConfig;
use diesel_async::pooled_connection::RecyclingMethod;
use diesel_async::pooled_connection::bb8::Pool;
use std::env;

/// This type alias is the pool, which can be quried for connections.
/// It is typically wrapped in Arc so the signal store and the importer share it
pub type RailgraphPostgresPool =
    bb8::Pool<AsyncDieselConnectionManager<diesel_async::AsyncPgConnection>>;

#[derive(thiserror::Error, Debug)]
pub enum PoolSetupError {
    #[error("DATABASE_URL must be set")]
    MissingDatabaseUrl,
    #[error("could not build the postgres pool: {0}")]
    Build(String),
}

/// Builds the pool against `DATABASE_URL`.
/// The live path runs one query at a time, the importer fans out per record,
/// so the pool is sized for the import burst.
pub async fn make_async_pool() -> Result<RailgraphPostgresPool, PoolSetupError> {
    let database_url = database_url_for_env().ok_or(PoolSetupError::MissingDatabaseUrl)?;

    let mut custom_conf = ManagerConfig::default();

    custom_conf.recycling_method = RecyclingMethod::Fast;

    let config: AsyncDieselConnectionManager<diesel_async::AsyncPgConnection> =
        AsyncDieselConnectionManager::<diesel_async::AsyncPgConnection>::new_with_config(
            database_url,
            custom_conf,
        );
    let pool = Pool::builder()
        .max_size(32)
        .min_idle(Some(2))
        .build(config)
        .await
        .map_err(|e| PoolSetupError::Build(e.to_string()))?;

    Ok(pool)
}

fn database_url_for_env() -> Option<String> {
    env::var("DATABASE_URL").ok()
}
