use chrono::NaiveDateTime;
use diesel::sql_types::{BigInt, Text, Timestamp};

#[derive(Debug, QueryableByName)]
pub struct ClientRow {
    #[sql_type = "Text"]
    pub id: String,
    #[sql_type = "Text"]
    pub secret: String,
    #[sql_type = "Text"]
    pub domain: String,
    #[sql_type = "Text"]
    pub data: String,
}

#[derive(Debug, QueryableByName)]
pub struct TokenRow {
    #[sql_type = "BigInt"]
    pub id: i64,
    #[sql_type = "Text"]
    pub code: String,
    #[sql_type = "Text"]
    pub access: String,
    #[sql_type = "Text"]
    pub refresh: String,
    #[sql_type = "Text"]
    pub data: String,
    #[sql_type = "Timestamp"]
    pub created_at: NaiveDateTime,
    #[sql_type = "Timestamp"]
    pub expired_at: NaiveDateTime,
}

/// A token row about to be inserted.
#[derive(Debug, PartialEq, Eq)]
pub struct NewTokenRow {
    pub created_at: NaiveDateTime,
    pub expired_at: NaiveDateTime,
    pub code: String,
    pub access: String,
    pub refresh: String,
    pub data: String,
}

#[derive(Debug, QueryableByName)]
pub struct RowCount {
    #[sql_type = "BigInt"]
    pub count: i64,
}
