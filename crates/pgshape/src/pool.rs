//! Connection pool for concurrent catalog reads.
//!
//! Each table is introspected on its own pooled connection, so the pool
//! size bounds how many tables are read at once.

use deadpool_postgres::{Manager, Pool};
use tokio_postgres::NoTls;

use crate::error::Error;
use crate::Result;

/// Default number of tables introspected at once.
pub const DEFAULT_POOL_SIZE: usize = 4;

/// Build a pool for `database_url`.
///
/// No connection is opened here; the first [`Pool::get`] connects.
pub fn connect(database_url: &str, max_size: usize) -> Result<Pool> {
    let pg_config: tokio_postgres::Config = database_url.parse().map_err(Error::connection)?;
    let manager = Manager::new(pg_config, NoTls);
    Pool::builder(manager)
        .max_size(max_size.max(1))
        .build()
        .map_err(Error::connection)
}

/// Take a connection out of the pool, mapping failures to [`Error::Connection`].
pub async fn checkout(pool: &Pool) -> Result<deadpool_postgres::Object> {
    pool.get().await.map_err(Error::connection)
}
