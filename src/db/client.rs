use std::fmt::Debug;

use diesel::prelude::*;
use diesel::sql_types::Text;
use tracing::{event, Level};

use crate::core::models::Client;
use crate::error::{Error, Result};
use crate::store::ClientStore;

use super::models::ClientRow;
use super::{blocking, conn, schema, DbPool};

pub const DEFAULT_TABLE_NAME: &str = "oauth2_clients";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientStoreOptions {
    pub table_name: String,
    pub init_table_disabled: bool,
}

impl Default for ClientStoreOptions {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            init_table_disabled: false,
        }
    }
}

impl ClientStoreOptions {
    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Skip creating the table when the store is constructed.
    pub fn init_table_disabled(mut self) -> Self {
        self.init_table_disabled = true;
        self
    }
}

pub struct DbClientStore {
    pool: DbPool,
    table_name: String,
}

impl DbClientStore {
    pub fn new(pool: DbPool, options: ClientStoreOptions) -> Result<Self> {
        let store = Self {
            pool,
            table_name: options.table_name,
        };

        if !options.init_table_disabled {
            store.init_table()?;
        }

        Ok(store)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Creates the client table if it does not exist yet.
    #[tracing::instrument(skip(self), fields(table = %self.table_name))]
    pub fn init_table(&self) -> Result<()> {
        blocking(|| -> Result<()> {
            let conn = conn(&self.pool)?;
            for statement in schema::client_table(&self.table_name) {
                diesel::sql_query(statement).execute(&conn)?;
            }
            Ok(())
        })
    }
}

impl Debug for DbClientStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbClientStore")
            .field("table_name", &self.table_name)
            .finish()
    }
}

impl ClientStore for DbClientStore {
    fn get_by_id(&self, id: &str) -> Result<Option<Client>> {
        if id.is_empty() {
            return Ok(None);
        }

        let query = format!(
            "SELECT id, secret, domain, data FROM {} WHERE id = $1",
            self.table_name
        );

        let found = blocking(|| -> Result<_> {
            let conn = conn(&self.pool)?;
            let row = diesel::sql_query(query)
                .bind::<Text, _>(id)
                .get_result::<ClientRow>(&conn)
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

    #[tracing::instrument(skip(self, info), fields(client_id = %info.id))]
    fn create(&self, info: &Client) -> Result<()> {
        let data = serde_json::to_string(info).map_err(Error::Serialize)?;

        let query = format!(
            "INSERT INTO {} (id, secret, domain, data) VALUES ($1, $2, $3, $4)",
            self.table_name
        );

        blocking(|| -> Result<()> {
            let conn = conn(&self.pool)?;
            diesel::sql_query(query)
                .bind::<Text, _>(&info.id)
                .bind::<Text, _>(&info.secret)
                .bind::<Text, _>(&info.domain)
                .bind::<Text, _>(&data)
                .execute(&conn)?;
            Ok(())
        })?;

        event!(Level::DEBUG, "Stored client");
        Ok(())
    }
}
