//! Client and token storage for OAuth 2.0 servers, kept in SQL tables through
//! diesel.
//!
//! Each record is stored as a JSON payload next to the columns it is looked up
//! by. [`db::DbTokenStore`] also sweeps expired token rows on a timer.

#[macro_use]
extern crate diesel;

pub mod core;
pub mod db;
pub mod error;
pub mod store;
pub mod util;

pub use crate::core::models::{Client, Token};
pub use crate::error::{Error, Result};
pub use crate::store::{ClientStore, TokenStore};
