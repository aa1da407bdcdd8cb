//! Table definitions.
//!
//! Table names are chosen at runtime, so the statements are built as strings
//! rather than with `table!`. Every statement is create-if-absent.

#[cfg(feature = "postgres")]
const SURROGATE_KEY: &str = "id BIGSERIAL PRIMARY KEY";

#[cfg(all(feature = "sqlite", not(feature = "postgres")))]
const SURROGATE_KEY: &str = "id INTEGER PRIMARY KEY AUTOINCREMENT";

pub fn client_table(table: &str) -> Vec<String> {
    vec![format!(
        "CREATE TABLE IF NOT EXISTS {} (
            id VARCHAR(255) NOT NULL PRIMARY KEY,
            secret VARCHAR(255) NOT NULL,
            domain VARCHAR(255) NOT NULL,
            data TEXT NOT NULL
        )",
        table
    )]
}

pub fn token_table(table: &str) -> Vec<String> {
    let mut statements = vec![format!(
        "CREATE TABLE IF NOT EXISTS {} (
            {},
            code VARCHAR(255) NOT NULL DEFAULT '',
            access VARCHAR(255) NOT NULL DEFAULT '',
            refresh VARCHAR(255) NOT NULL DEFAULT '',
            data TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL,
            expired_at TIMESTAMP NOT NULL
        )",
        table, SURROGATE_KEY
    )];

    for column in &["code", "access", "refresh", "expired_at"] {
        statements.push(format!(
            "CREATE INDEX IF NOT EXISTS {table}_{column}_idx ON {table} ({column})",
            table = table,
            column = column
        ));
    }

    statements
}
