//! The storage contract an OAuth 2.0 server drives.
//!
//! Lookups return `Ok(None)` for anything that is not stored, including the
//! empty key. Removals succeed whether or not a row matched.

use crate::core::models::{Client, Token};
use crate::error::Result;

pub trait ClientStore {
    fn get_by_id(&self, id: &str) -> Result<Option<Client>>;
    fn create(&self, info: &Client) -> Result<()>;
}

pub trait TokenStore {
    fn create(&self, info: &Token) -> Result<()>;

    fn remove_by_code(&self, code: &str) -> Result<()>;
    fn remove_by_access(&self, access: &str) -> Result<()>;
    fn remove_by_refresh(&self, refresh: &str) -> Result<()>;

    fn get_by_code(&self, code: &str) -> Result<Option<Token>>;
    fn get_by_access(&self, access: &str) -> Result<Option<Token>>;
    fn get_by_refresh(&self, refresh: &str) -> Result<Option<Token>>;
}
