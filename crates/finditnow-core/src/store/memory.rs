//! In-memory [`ItemStore`] implementation for tests and embedding.
//!
//! Items live in a `Vec` behind `std::sync::RwLock`, so listing order is
//! insertion order.

use std::collections::HashSet;
use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::models::Item;

use super::ItemStore;

/// In-memory item store.
pub struct InMemoryStore {
    items: RwLock<Vec<Item>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
        }
    }

    /// Build a store pre-loaded with `items`, in order.
    pub fn with_items(items: Vec<Item>) -> Self {
        Self {
            items: RwLock::new(items),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("in-memory item store lock poisoned")
}

#[async_trait]
impl ItemStore for InMemoryStore {
    async fn list_items(&self) -> Result<Vec<Item>> {
        let items = self.items.read().map_err(poisoned)?;
        Ok(items.clone())
    }

    async fn get_item(&self, id: &str) -> Result<Option<Item>> {
        let items = self.items.read().map_err(poisoned)?;
        Ok(items.iter().find(|i| i.id == id).cloned())
    }

    async fn insert_item(&self, item: &Item) -> Result<()> {
        let mut items = self.items.write().map_err(poisoned)?;
        if items.iter().any(|i| i.id == item.id) {
            bail!("item already exists: {}", item.id);
        }
        items.push(item.clone());
        Ok(())
    }

    async fn insert_items(&self, batch: &[Item]) -> Result<()> {
        let mut items = self.items.write().map_err(poisoned)?;
        let mut seen: HashSet<&str> = items.iter().map(|i| i.id.as_str()).collect();
        for item in batch {
            if !seen.insert(item.id.as_str()) {
                bail!("item already exists: {}", item.id);
            }
        }
        items.extend(batch.iter().cloned());
        Ok(())
    }

    async fn update_item(&self, item: &Item) -> Result<bool> {
        let mut items = self.items.write().map_err(poisoned)?;
        match items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => {
                *existing = item.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_item(&self, id: &str) -> Result<bool> {
        let mut items = self.items.write().map_err(poisoned)?;
        let before = items.len();
        items.retain(|i| i.id != id);
        Ok(items.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Classification;

    fn item(id: &str) -> Item {
        Item {
            id: id.to_string(),
            title: Some(format!("item {}", id)),
            description: None,
            image_url: None,
            category: "misc".to_string(),
            date: None,
            location: None,
            kind: Classification::Lost,
            user_id: None,
            secret_question: None,
            secret_answer: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let store = InMemoryStore::new();
        for id in ["c", "a", "b"] {
            store.insert_item(&item(id)).await.unwrap();
        }
        let ids: Vec<String> = store
            .list_items()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = InMemoryStore::new();
        store.insert_item(&item("a")).await.unwrap();
        assert!(store.insert_item(&item("a")).await.is_err());
    }

    #[tokio::test]
    async fn test_batch_insert_is_all_or_nothing() {
        let store = InMemoryStore::with_items(vec![item("a")]);

        assert!(store
            .insert_items(&[item("b"), item("c"), item("b")])
            .await
            .is_err());
        assert!(store.insert_items(&[item("d"), item("a")]).await.is_err());
        assert_eq!(store.list_items().await.unwrap().len(), 1);

        store.insert_items(&[item("b"), item("c")]).await.unwrap();
        let ids: Vec<String> = store
            .list_items()
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = InMemoryStore::with_items(vec![item("a"), item("b")]);

        let mut changed = item("a");
        changed.kind = Classification::Recovered;
        assert!(store.update_item(&changed).await.unwrap());
        assert!(!store.update_item(&item("zz")).await.unwrap());
        assert_eq!(
            store.get_item("a").await.unwrap().unwrap().kind,
            Classification::Recovered
        );

        assert!(store.delete_item("a").await.unwrap());
        assert!(!store.delete_item("a").await.unwrap());
        assert!(store.get_item("a").await.unwrap().is_none());
        assert_eq!(store.list_items().await.unwrap().len(), 1);
    }
}
