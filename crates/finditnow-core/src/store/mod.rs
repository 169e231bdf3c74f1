//! Storage abstraction for the item catalogue.
//!
//! The [`ItemStore`] trait is the seam between the matching engine and
//! whatever holds the items (SQLite in the application, memory in tests).
//! The engine only ever reads a full snapshot via
//! [`list_items`](ItemStore::list_items); the write operations exist for
//! the registry surfaces that create and retire items.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Item;

/// Abstract item storage backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`list_items`](ItemStore::list_items) | Full catalogue snapshot, insertion order |
/// | [`get_item`](ItemStore::get_item) | Single item by id |
/// | [`insert_item`](ItemStore::insert_item) | Add a new item |
/// | [`insert_items`](ItemStore::insert_items) | Add a batch, all or nothing |
/// | [`update_item`](ItemStore::update_item) | Replace an existing item |
/// | [`delete_item`](ItemStore::delete_item) | Remove an item |
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// All items in insertion order. Match ties are broken by this order.
    async fn list_items(&self) -> Result<Vec<Item>>;

    async fn get_item(&self, id: &str) -> Result<Option<Item>>;

    /// Insert a new item. Fails if the id is already taken.
    async fn insert_item(&self, item: &Item) -> Result<()>;

    /// Insert a batch atomically. If any id is taken (or repeated within
    /// the batch) nothing is inserted.
    async fn insert_items(&self, items: &[Item]) -> Result<()>;

    /// Replace the item with the same id. Returns `false` if none existed.
    async fn update_item(&self, item: &Item) -> Result<bool>;

    /// Returns `false` if no item had this id.
    async fn delete_item(&self, id: &str) -> Result<bool>;
}
