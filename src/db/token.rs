use std::fmt::Debug;
use std::time::{Duration, SystemTime};

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sql_types::{Text, Timestamp};
use tokio::runtime::Handle;
use tracing::{event, Level};

use crate::core::models::Token;
use crate::core::types::Expiry;
use crate::error::{Error, Result};
use crate::store::TokenStore;

use super::models::{NewTokenRow, RowCount, TokenRow};
use super::sweeper::Sweeper;
use super::{blocking, conn, schema, DbPool};

pub const DEFAULT_TABLE_NAME: &str = "oauth2_tokens";
pub const DEFAULT_GC_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Rows that are expired or no longer reachable by any lookup key.
const SWEEP_FILTER: &str = "expired_at <= $1 OR (code = '' AND access = '' AND refresh = '')";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenStoreOptions {
    pub table_name: String,
    pub gc_interval: Duration,
    pub gc_disabled: bool,
    pub init_table_disabled: bool,
}

impl Default for TokenStoreOptions {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            gc_interval: DEFAULT_GC_INTERVAL,
            gc_disabled: false,
            init_table_disabled: false,
        }
    }
}

impl TokenStoreOptions {
    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    pub fn gc_interval(mut self, gc_interval: Duration) -> Self {
        self.gc_interval = gc_interval;
        self
    }

    /// Don't run the periodic sweep. `DbTokenStore::clean_up` still works.
    pub fn gc_disabled(mut self) -> Self {
        self.gc_disabled = true;
        self
    }

    pub fn init_table_disabled(mut self) -> Self {
        self.init_table_disabled = true;
        self
    }
}

#[derive(Clone, Copy, Debug)]
enum Lookup {
    Code,
    Access,
    Refresh,
}

impl Lookup {
    fn column(self) -> &'static str {
        match self {
            Lookup::Code => "code",
            Lookup::Access => "access",
            Lookup::Refresh => "refresh",
        }
    }
}

/// Builds the row stored for `info`.
///
/// An authorization code takes precedence. Otherwise the access token is
/// stored, and a refresh token, when present, decides the expiry.
fn token_row(info: &Token, data: String, now: Expiry) -> NewTokenRow {
    let mut row = NewTokenRow {
        created_at: now.into(),
        expired_at: Expiry::at(SystemTime::UNIX_EPOCH).into(),
        code: String::new(),
        access: String::new(),
        refresh: String::new(),
        data,
    };

    if !info.code.is_empty() {
        row.code = info.code.clone();
        row.expired_at = Expiry::expires_at(info.code_create_at, info.code_expires_in).into();
    } else {
        row.access = info.access.clone();
        row.expired_at = Expiry::expires_at(info.access_create_at, info.access_expires_in).into();

        if !info.refresh.is_empty() {
            row.refresh = info.refresh.clone();
            row.expired_at = Expiry::expires_at(info.refresh_create_at, info.refresh_expires_in).into();
        }
    }

    row
}

/// Deletes expired and orphaned rows, returning how many went.
fn sweep(pool: &DbPool, table_name: &str) -> Result<usize> {
    let now: NaiveDateTime = Expiry::now().into();
    let conn = conn(pool)?;

    let pending = diesel::sql_query(format!(
        "SELECT COUNT(*) AS count FROM {} WHERE {}",
        table_name, SWEEP_FILTER
    ))
    .bind::<Timestamp, _>(now)
    .get_result::<RowCount>(&conn)?
    .count;

    if pending == 0 {
        return Ok(0);
    }

    let removed = diesel::sql_query(format!("DELETE FROM {} WHERE {}", table_name, SWEEP_FILTER))
        .bind::<Timestamp, _>(now)
        .execute(&conn)?;

    Ok(removed)
}

pub struct DbTokenStore {
    pool: DbPool,
    table_name: String,
    sweeper: Option<Sweeper>,
}

impl DbTokenStore {
    /// Creates the store, provisioning its table and starting the periodic
    /// sweep unless `options` turn them off.
    ///
    /// The sweep is spawned on the current tokio runtime, so with it enabled
    /// this must be called from within one.
    pub fn new(pool: DbPool, options: TokenStoreOptions) -> Result<Self> {
        let mut store = Self {
            pool,
            table_name: options.table_name,
            sweeper: None,
        };

        if !options.init_table_disabled {
            store.init_table()?;
        }

        if !options.gc_disabled {
            let runtime = Handle::try_current()?;
            let pool = store.pool.clone();
            let table_name = store.table_name.clone();

            event!(
                Level::DEBUG,
                table = %table_name,
                interval = ?options.gc_interval,
                "Starting token sweep"
            );
            store.sweeper = Some(Sweeper::start(&runtime, options.gc_interval, move || {
                sweep(&pool, &table_name)
            }));
        }

        Ok(store)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Creates the token table and its indexes if they do not exist yet.
    #[tracing::instrument(skip(self), fields(table = %self.table_name))]
    pub fn init_table(&self) -> Result<()> {
        blocking(|| -> Result<()> {
            let conn = conn(&self.pool)?;
            for statement in schema::token_table(&self.table_name) {
                diesel::sql_query(statement).execute(&conn)?;
            }
            Ok(())
        })
    }

    /// Runs one sweep now, independently of the schedule.
    pub fn clean_up(&self) -> Result<usize> {
        blocking(|| sweep(&self.pool, &self.table_name))
    }

    /// Stops the periodic sweep. Calling it again does nothing; dropping the
    /// store has the same effect.
    pub fn close(&mut self) {
        if let Some(mut sweeper) = self.sweeper.take() {
            sweeper.stop();
        }
    }

    fn get_by(&self, lookup: Lookup, key: &str) -> Result<Option<Token>> {
        if key.is_empty() {
            event!(Level::DEBUG, column = lookup.column(), "Empty lookup key");
            return Ok(None);
        }

        let query = format!(
            "SELECT id, code, access, refresh, data, created_at, expired_at FROM {} WHERE {} = $1 LIMIT 1",
            self.table_name,
            lookup.column()
        );

        let found = blocking(|| -> Result<_> {
            let conn = conn(&self.pool)?;
            let row = diesel::sql_query(query)
                .bind::<Text, _>(key)
                .get_result::<TokenRow>(&conn)
                .optional()?;
            Ok(row)
        })?;

        match found {
            Some(row) => Ok(Some(
                serde_json::from_str(&row.data).map_err(Error::Deserialize)?,
            )),
            None => Ok(None),
        }
    }

    fn remove_by(&self, lookup: Lookup, key: &str) -> Result<()> {
        // Unused key columns hold '', so an empty key would hit unrelated rows.
        if key.is_empty() {
            event!(Level::DEBUG, column = lookup.column(), "Empty removal key");
            return Ok(());
        }

        let query = format!(
            "DELETE FROM {table} WHERE id IN (SELECT id FROM {table} WHERE {column} = $1 LIMIT 1)",
            table = self.table_name,
            column = lookup.column()
        );

        let removed = blocking(|| -> Result<usize> {
            let conn = conn(&self.pool)?;
            Ok(diesel::sql_query(query).bind::<Text, _>(key).execute(&conn)?)
        })?;

        event!(Level::DEBUG, column = lookup.column(), removed, "Removed token");
        Ok(())
    }
}

impl Debug for DbTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbTokenStore")
            .field("table_name", &self.table_name)
            .field("sweeper", &self.sweeper)
            .finish()
    }
}

impl TokenStore for DbTokenStore {
    #[tracing::instrument(skip_all, fields(table = %self.table_name))]
    fn create(&self, info: &Token) -> Result<()> {
        let data = serde_json::to_string(info).map_err(Error::Serialize)?;
        let row = token_row(info, data, Expiry::now());

        let query = format!(
            "INSERT INTO {} (created_at, expired_at, code, access, refresh, data) VALUES ($1, $2, $3, $4, $5, $6)",
            self.table_name
        );

        blocking(|| -> Result<()> {
            let conn = conn(&self.pool)?;
            diesel::sql_query(query)
                .bind::<Timestamp, _>(row.created_at)
                .bind::<Timestamp, _>(row.expired_at)
                .bind::<Text, _>(&row.code)
                .bind::<Text, _>(&row.access)
                .bind::<Text, _>(&row.refresh)
                .bind::<Text, _>(&row.data)
                .execute(&conn)?;
            Ok(())
        })?;

        event!(Level::DEBUG, expired_at = %row.expired_at, "Stored token");
        Ok(())
    }

    fn remove_by_code(&self, code: &str) -> Result<()> {
        self.remove_by(Lookup::Code, code)
    }

    fn remove_by_access(&self, access: &str) -> Result<()> {
        self.remove_by(Lookup::Access, access)
    }

    fn remove_by_refresh(&self, refresh: &str) -> Result<()> {
        self.remove_by(Lookup::Refresh, refresh)
    }

    fn get_by_code(&self, code: &str) -> Result<Option<Token>> {
        self.get_by(Lookup::Code, code)
    }

    fn get_by_access(&self, access: &str) -> Result<Option<Token>> {
        self.get_by(Lookup::Access, access)
    }

    fn get_by_refresh(&self, refresh: &str) -> Result<Option<Token>> {
        self.get_by(Lookup::Refresh, refresh)
    }
}
