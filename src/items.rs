//! Item registry operations.
//!
//! Shared by the `findit` CLI commands and the HTTP server: importing a
//! catalogue, reporting a new item (which immediately runs the matcher for
//! it), updates, lookup, listing, and deletion.
//!
//! Client mistakes come back as [`RegistryError`] inside the `anyhow`
//! chain so the HTTP layer can map them to status codes.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;

use finditnow_core::error::RegistryError;
use finditnow_core::matching::{find_matches_in, MatchResult};
use finditnow_core::models::{validate_category, Classification, Item, ItemUpdate, NewItem};
use finditnow_core::store::ItemStore;

use crate::config::Config;
use crate::sqlite_store::SqliteItemStore;
use crate::{db, migrate};

/// Open the configured item database, creating the schema if needed.
pub async fn open_store(config: &Config) -> Result<SqliteItemStore> {
    let pool = db::connect(config).await?;
    migrate::apply_schema(&pool).await?;
    Ok(SqliteItemStore::new(pool))
}

/// Parse a JSON array of item records. Legacy `status` fields are accepted.
pub fn read_items_file(path: &Path) -> Result<Vec<Item>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read items file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse items file: {}", path.display()))
}

/// Insert every item from `items`, in order. Returns the number inserted.
///
/// The batch is checked up front and inserted atomically: a repeated or
/// already-stored id rejects the whole file and leaves the store untouched.
pub async fn import_items<S: ItemStore + ?Sized>(store: &S, items: &[Item]) -> Result<usize> {
    let existing: HashSet<String> = store
        .list_items()
        .await?
        .into_iter()
        .map(|i| i.id)
        .collect();
    let mut seen = HashSet::new();
    for item in items {
        validate_category(&item.category)?;
        if existing.contains(&item.id) || !seen.insert(item.id.as_str()) {
            return Err(RegistryError::Duplicate(item.id.clone()).into());
        }
    }

    store.insert_items(items).await?;
    tracing::info!(count = items.len(), "imported items");
    Ok(items.len())
}

/// Report a new item and look for its counterparts.
///
/// Each returned match is logged as a `potential match` event; delivering
/// notifications to owners happens outside this crate.
pub async fn create_item<S: ItemStore + ?Sized>(
    store: &S,
    new_item: NewItem,
) -> Result<(Item, Vec<MatchResult>)> {
    validate_category(&new_item.category)?;

    let item = new_item.into_item();
    store.insert_item(&item).await?;
    tracing::info!(id = %item.id, kind = %item.kind, category = %item.category, "item created");

    let matches = find_matches_in(store, &item.id).await?;
    for m in &matches {
        tracing::info!(
            item = %item.id,
            candidate = %m.item.id,
            owner = m.item.user_id.as_deref().unwrap_or("-"),
            score = m.score,
            "potential match"
        );
    }

    Ok((item, matches))
}

/// List items, optionally filtered by kind and exact category.
pub async fn list_items<S: ItemStore + ?Sized>(
    store: &S,
    kind: Option<Classification>,
    category: Option<&str>,
) -> Result<Vec<Item>> {
    let items = store.list_items().await?;
    Ok(items
        .into_iter()
        .filter(|i| kind.map_or(true, |k| i.kind == k))
        .filter(|i| category.map_or(true, |c| i.category == c))
        .collect())
}

/// Fetch a single item, failing with [`RegistryError::NotFound`] if absent.
pub async fn get_item<S: ItemStore + ?Sized>(store: &S, id: &str) -> Result<Item> {
    match store.get_item(id).await? {
        Some(item) => Ok(item),
        None => Err(RegistryError::NotFound(id.to_string()).into()),
    }
}

/// Merge `update` into the stored item and save it.
///
/// The matcher is not rerun; a `recovered` kind simply drops the item out
/// of future match results.
pub async fn update_item<S: ItemStore + ?Sized>(
    store: &S,
    id: &str,
    update: ItemUpdate,
) -> Result<Item> {
    if let Some(ref category) = update.category {
        validate_category(category)?;
    }

    let mut item = get_item(store, id).await?;
    update.apply_to(&mut item);
    if !store.update_item(&item).await? {
        return Err(RegistryError::NotFound(id.to_string()).into());
    }
    tracing::info!(id = %item.id, kind = %item.kind, "item updated");
    Ok(item)
}

/// Remove an item, failing with [`RegistryError::NotFound`] if absent.
pub async fn delete_item<S: ItemStore + ?Sized>(store: &S, id: &str) -> Result<()> {
    if !store.delete_item(id).await? {
        return Err(RegistryError::NotFound(id.to_string()).into());
    }
    tracing::info!(id = %id, "item deleted");
    Ok(())
}

pub async fn run_import(config: &Config, path: &Path) -> Result<()> {
    let items = read_items_file(path)?;
    let store = open_store(config).await?;
    let count = import_items(&store, &items).await?;
    store.pool().close().await;
    println!("imported items: {}", count);
    Ok(())
}

pub async fn run_create(config: &Config, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read item file: {}", path.display()))?;
    let new_item: NewItem = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse item file: {}", path.display()))?;

    let store = open_store(config).await?;
    let (item, matches) = create_item(&store, new_item).await?;
    store.pool().close().await;

    println!("created item: {}", item.id);
    if matches.is_empty() {
        println!("No potential matches.");
    } else {
        println!("Potential matches ({}):", matches.len());
        for (rank, m) in matches.iter().enumerate() {
            println!(
                "{}. [{:.2}] {} {}",
                rank + 1,
                m.score,
                m.item.id,
                m.item.title.as_deref().unwrap_or("(untitled)")
            );
        }
    }
    Ok(())
}

pub async fn run_list(
    config: &Config,
    kind: Option<Classification>,
    category: Option<String>,
) -> Result<()> {
    let store = open_store(config).await?;
    let items = list_items(&store, kind, category.as_deref()).await?;
    store.pool().close().await;

    if items.is_empty() {
        println!("No items.");
        return Ok(());
    }

    for item in &items {
        println!(
            "{:<36}  {:<9}  {:<14}  {:<10}  {}",
            item.id,
            item.kind,
            item.category,
            item.date.as_deref().unwrap_or("-"),
            item.title.as_deref().unwrap_or("(untitled)")
        );
    }
    Ok(())
}

pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let store = open_store(config).await?;
    let result = get_item(&store, id).await;
    store.pool().close().await;
    let item = result?;

    println!("--- Item ---");
    println!("id:          {}", item.id);
    println!(
        "title:       {}",
        item.title.as_deref().unwrap_or("(untitled)")
    );
    println!("kind:        {}", item.kind);
    println!("category:    {}", item.category);
    println!("date:        {}", item.date.as_deref().unwrap_or("-"));
    println!("location:    {}", item.location.as_deref().unwrap_or("-"));
    if let Some(ref url) = item.image_url {
        println!("image_url:   {}", url);
    }
    if let Some(ref owner) = item.user_id {
        println!("owner:       {}", owner);
    }
    if let Some(ref question) = item.secret_question {
        println!("question:    {}", question);
    }
    println!();
    println!("--- Description ---");
    println!("{}", item.description.as_deref().unwrap_or(""));

    Ok(())
}

pub async fn run_update(config: &Config, id: &str, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read update file: {}", path.display()))?;
    let update: ItemUpdate = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse update file: {}", path.display()))?;

    let store = open_store(config).await?;
    let result = update_item(&store, id, update).await;
    store.pool().close().await;
    let item = result?;

    println!("updated item: {} ({})", item.id, item.kind);
    Ok(())
}

pub async fn run_delete(config: &Config, id: &str) -> Result<()> {
    let store = open_store(config).await?;
    let result = delete_item(&store, id).await;
    store.pool().close().await;
    result?;

    println!("deleted item: {}", id);
    Ok(())
}
