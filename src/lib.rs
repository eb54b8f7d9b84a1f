//! Catalog of tracked manga ("items"), the sites hosting them ("feeds"),
//! their tags and reading positions, stored in SQLite.
//!
//! [`db::Repository`] is the single entry point: catalog CRUD, link
//! management and assembled [`models::ItemView`]s.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod slug;

pub use db::Repository;
pub use error::{AppError, Result};
