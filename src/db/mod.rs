use std::time::Duration;

use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::block_in_place;

use crate::error::Result;

pub mod client;
pub mod models;
pub mod schema;
pub mod sweeper;
pub mod token;

pub use client::{ClientStoreOptions, DbClientStore};
pub use token::{DbTokenStore, TokenStoreOptions};

#[cfg(not(any(feature = "postgres", feature = "sqlite")))]
compile_error!("enable either the `postgres` or the `sqlite` feature");

#[cfg(feature = "postgres")]
pub type DbConnection = diesel::pg::PgConnection;

#[cfg(all(feature = "sqlite", not(feature = "postgres")))]
pub type DbConnection = diesel::sqlite::SqliteConnection;

pub type DbPool = Pool<ConnectionManager<DbConnection>>;
pub type DbPooledConnection = PooledConnection<ConnectionManager<DbConnection>>;

pub const DEFAULT_MAX_OPEN_CONNS: u32 = 50;
pub const DEFAULT_MAX_IDLE_CONNS: u32 = 25;
pub const DEFAULT_MAX_LIFETIME: Duration = Duration::from_secs(2 * 60 * 60);

/// Connection pool limits shared by both stores.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolOptions {
    pub max_open_conns: u32,
    /// Connections kept open while idle. Never more than `max_open_conns`.
    pub max_idle_conns: u32,
    pub max_lifetime: Option<Duration>,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_open_conns: DEFAULT_MAX_OPEN_CONNS,
            max_idle_conns: DEFAULT_MAX_IDLE_CONNS,
            max_lifetime: Some(DEFAULT_MAX_LIFETIME),
        }
    }
}

impl PoolOptions {
    pub fn max_open_conns(mut self, max_open_conns: u32) -> Self {
        self.max_open_conns = max_open_conns;
        self
    }

    pub fn max_idle_conns(mut self, max_idle_conns: u32) -> Self {
        self.max_idle_conns = max_idle_conns;
        self
    }

    pub fn max_lifetime(mut self, max_lifetime: Option<Duration>) -> Self {
        self.max_lifetime = max_lifetime;
        self
    }

    pub fn build(&self, database_url: &str) -> Result<DbPool> {
        let max_size = self.max_open_conns.max(1);

        let builder = DbPool::builder()
            .max_size(max_size)
            .min_idle(Some(self.max_idle_conns.min(max_size)))
            .max_lifetime(self.max_lifetime);

        #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
        let builder = builder.connection_customizer(Box::new(sqlite::BusyTimeout(
            sqlite::BUSY_TIMEOUT,
        )));

        let pool = builder.build(ConnectionManager::new(database_url))?;
        Ok(pool)
    }
}

pub(crate) fn conn(pool: &DbPool) -> Result<DbPooledConnection> {
    Ok(pool.get()?)
}

/// Runs blocking database work from any calling context.
///
/// On a multi-threaded runtime the worker hands its other tasks off first.
/// `block_in_place` is unavailable on a current-thread runtime, so there and
/// outside tokio `f` runs directly.
pub(crate) fn blocking<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    match Handle::try_current().map(|handle| handle.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => block_in_place(f),
        _ => f(),
    }
}

#[cfg(all(feature = "sqlite", not(feature = "postgres")))]
mod sqlite {
    use std::time::Duration;

    use diesel::connection::SimpleConnection;
    use diesel::r2d2::{CustomizeConnection, Error};
    use diesel::sqlite::SqliteConnection;

    pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

    /// Makes writers wait on the database file lock instead of failing with
    /// `SQLITE_BUSY` while the sweep holds it.
    #[derive(Debug)]
    pub struct BusyTimeout(pub Duration);

    impl CustomizeConnection<SqliteConnection, Error> for BusyTimeout {
        fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), Error> {
            conn.batch_execute(&format!("PRAGMA busy_timeout = {};", self.0.as_millis()))
                .map_err(Error::QueryError)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_defaults() {
        let options = PoolOptions::default();
        assert_eq!(options.max_open_conns, 50);
        assert_eq!(options.max_idle_conns, 25);
        assert_eq!(options.max_lifetime, Some(Duration::from_secs(7200)));
    }

    #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
    #[test]
    fn idle_connections_never_exceed_open_connections() {
        let pool = PoolOptions::default()
            .max_open_conns(3)
            .max_idle_conns(10)
            .build(":memory:")
            .unwrap();

        assert_eq!(pool.max_size(), 3);
        assert_eq!(pool.min_idle(), Some(3));
    }

    #[cfg(all(feature = "sqlite", not(feature = "postgres")))]
    #[test]
    fn zero_open_connections_still_allows_one() {
        let pool = PoolOptions::default()
            .max_open_conns(0)
            .max_idle_conns(5)
            .max_lifetime(None)
            .build(":memory:")
            .unwrap();

        assert_eq!(pool.max_size(), 1);
        assert_eq!(pool.min_idle(), Some(1));
        assert_eq!(pool.max_lifetime(), None);
    }

    #[test]
    fn blocking_outside_a_runtime() {
        assert_eq!(blocking(|| 1 + 1), 2);
    }

    #[tokio::test]
    async fn blocking_on_current_thread_runtime() {
        assert_eq!(blocking(|| "inline"), "inline");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn blocking_on_multi_thread_runtime() {
        assert_eq!(blocking(|| "in place"), "in place");
    }
}
