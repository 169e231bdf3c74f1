//! # FindItNow
//!
//! A campus lost-and-found registry. Students report lost and found items;
//! every newly reported item is matched against items of the opposite kind
//! so owners and finders can be put in touch.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌──────────┐
//! │ CLI / HTTP   │──▶│ finditnow-core   │◀──│  SQLite   │
//! │ (findit)     │   │ matcher + model  │   │  items    │
//! └──────────────┘   └──────────────────┘   └──────────┘
//! ```
//!
//! The matching engine lives in [`finditnow_core::matching`] and is a pure
//! function of a catalogue snapshot. This crate supplies the snapshot (via
//! [`sqlite_store::SqliteItemStore`]) and the surfaces around it.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Item schema |
//! | [`sqlite_store`] | SQLite item store |
//! | [`items`] | Import, create, list, get, delete |
//! | [`matches`] | `findit match` output |
//! | [`server`] | HTTP API |

pub mod config;
pub mod db;
pub mod items;
pub mod matches;
pub mod migrate;
pub mod server;
pub mod sqlite_store;
