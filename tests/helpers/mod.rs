#![allow(dead_code)]

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::NaiveDateTime;
use diesel::RunQueryDsl;
use oauth2_diesel_store::core::types::Expiry;
use oauth2_diesel_store::db::{DbPool, PoolOptions};

/// A pool on a scratch database.
///
/// With the `postgres` feature this is `DATABASE_URL`; otherwise a temporary
/// SQLite file removed on drop.
pub struct TestDb {
    pool: DbPool,
    #[cfg(not(feature = "postgres"))]
    _temp_file: tempfile::NamedTempFile,
}

fn pool_options() -> PoolOptions {
    PoolOptions::default().max_open_conns(4).max_idle_conns(1)
}

impl TestDb {
    #[cfg(feature = "postgres")]
    pub fn new() -> Self {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for postgres tests");
        let pool = pool_options().build(&url).expect("Failed to build pool");
        Self { pool }
    }

    #[cfg(not(feature = "postgres"))]
    pub fn new() -> Self {
        let temp_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        let path = temp_file.path().to_str().expect("Invalid temp file path");
        let pool = pool_options().build(path).expect("Failed to build pool");
        Self {
            pool,
            _temp_file: temp_file,
        }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }

    /// Runs a raw statement, for setting up rows the stores would never write.
    pub fn execute(&self, statement: &str) {
        let conn = self.pool.get().expect("Failed to get connection");
        diesel::sql_query(statement)
            .execute(&conn)
            .expect("Failed to execute statement");
    }
}

pub fn unique(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Clock before epoch")
        .as_nanos();
    format!("{}_{}", prefix, nanos)
}

pub fn ago(secs: u64) -> SystemTime {
    SystemTime::now() - Duration::from_secs(secs)
}

/// `time` as the stores write it to a timestamp column.
pub fn stored(time: SystemTime) -> NaiveDateTime {
    Expiry::at(time).into()
}
