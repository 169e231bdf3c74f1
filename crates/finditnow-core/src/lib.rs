//! # FindItNow Core
//!
//! Shared logic for the FindItNow lost-and-found registry: the item model,
//! the lost/found matching engine, and the item store abstraction.
//!
//! This crate contains no tokio, sqlx, or filesystem I/O. The application
//! crate supplies the SQLite store, CLI, and HTTP server.

pub mod error;
pub mod matching;
pub mod models;
pub mod store;

pub use error::{MatchError, RegistryError};
pub use matching::{find_matches, find_matches_in, Match, MatchResult, ScoreBreakdown};
pub use models::{Classification, Item, ItemUpdate, NewItem};
pub use store::{memory::InMemoryStore, ItemStore};
