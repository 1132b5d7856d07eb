//! Data layer
//!
//! SQLite persistence for users, accounts, and keywords.

mod database;
mod models;

pub use database::Database;
pub use models::*;
