//! Core data models for the lost-and-found registry.
//!
//! [`Item`] is the record every other module reads. Its wire shape is the
//! camelCase JSON the registry has always exchanged, with one boundary
//! rule: the lost/found axis is a single canonical `kind` field, while
//! older records that only carry `status` are still accepted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Which side of the lost/found axis an item sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Lost,
    Found,
    /// Reunited with its owner. Recovered items are neither match sources
    /// nor match candidates.
    Recovered,
}

impl Classification {
    /// The classification a candidate must carry to pair with `self`.
    ///
    /// `None` for [`Classification::Recovered`].
    pub fn opposite(self) -> Option<Classification> {
        match self {
            Classification::Lost => Some(Classification::Found),
            Classification::Found => Some(Classification::Lost),
            Classification::Recovered => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Classification::Lost => "lost",
            Classification::Found => "found",
            Classification::Recovered => "recovered",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lost" => Ok(Classification::Lost),
            "found" => Ok(Classification::Found),
            "recovered" => Ok(Classification::Recovered),
            other => anyhow::bail!(
                "Unknown item kind: '{}'. Must be lost, found, or recovered.",
                other
            ),
        }
    }
}

/// A reported lost or found item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ItemRecord")]
pub struct Item {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Reference to an uploaded image. Never dereferenced by the engine.
    pub image_url: Option<String>,
    pub category: String,
    /// Calendar date the item was lost or found, `YYYY-MM-DD`.
    pub date: Option<String>,
    pub location: Option<String>,
    pub kind: Classification,
    /// Owner reference.
    pub user_id: Option<String>,
    pub secret_question: Option<String>,
    #[serde(skip_serializing)]
    pub secret_answer: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Boundary shape accepted on deserialization.
///
/// Both `kind` and the legacy `status` may appear; `kind` wins.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemRecord {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    category: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    kind: Option<Classification>,
    #[serde(default)]
    status: Option<Classification>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    secret_question: Option<String>,
    #[serde(default)]
    secret_answer: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

/// Blank categories are rejected wherever items enter the registry.
pub fn validate_category(category: &str) -> Result<(), RegistryError> {
    if category.trim().is_empty() {
        return Err(RegistryError::Invalid(
            "category must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn resolve_kind(
    kind: Option<Classification>,
    status: Option<Classification>,
    what: &str,
) -> Result<Classification, RegistryError> {
    kind.or(status)
        .ok_or_else(|| RegistryError::Invalid(format!("{} has neither kind nor status", what)))
}

impl TryFrom<ItemRecord> for Item {
    type Error = RegistryError;

    fn try_from(r: ItemRecord) -> Result<Self, Self::Error> {
        let kind = resolve_kind(r.kind, r.status, &format!("item {}", r.id))?;
        validate_category(&r.category)?;
        Ok(Item {
            id: r.id,
            title: r.title,
            description: r.description,
            image_url: r.image_url,
            category: r.category,
            date: r.date,
            location: r.location,
            kind,
            user_id: r.user_id,
            secret_question: r.secret_question,
            secret_answer: r.secret_answer,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Payload for reporting a new item. The registry assigns id and timestamps.
///
/// Accepts `kind`, the legacy `status`, or both (`kind` wins).
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "NewItemRecord")]
pub struct NewItem {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category: String,
    pub date: Option<String>,
    pub location: Option<String>,
    pub kind: Classification,
    pub user_id: Option<String>,
    pub secret_question: Option<String>,
    pub secret_answer: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewItemRecord {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    category: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    kind: Option<Classification>,
    #[serde(default)]
    status: Option<Classification>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    secret_question: Option<String>,
    #[serde(default)]
    secret_answer: Option<String>,
}

impl TryFrom<NewItemRecord> for NewItem {
    type Error = RegistryError;

    fn try_from(r: NewItemRecord) -> Result<Self, Self::Error> {
        let kind = resolve_kind(r.kind, r.status, "new item")?;
        validate_category(&r.category)?;
        Ok(NewItem {
            title: r.title,
            description: r.description,
            image_url: r.image_url,
            category: r.category,
            date: r.date,
            location: r.location,
            kind,
            user_id: r.user_id,
            secret_question: r.secret_question,
            secret_answer: r.secret_answer,
        })
    }
}

impl NewItem {
    pub fn into_item(self) -> Item {
        let now = Utc::now();
        Item {
            id: uuid::Uuid::new_v4().to_string(),
            title: self.title,
            description: self.description,
            image_url: self.image_url,
            category: self.category,
            date: self.date,
            location: self.location,
            kind: self.kind,
            user_id: self.user_id,
            secret_question: self.secret_question,
            secret_answer: self.secret_answer,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

/// Partial update of an existing item. Absent fields keep their value.
///
/// Marking an item `recovered` through an update takes it out of matching.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "ItemUpdateRecord")]
pub struct ItemUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub location: Option<String>,
    pub kind: Option<Classification>,
    pub secret_question: Option<String>,
    pub secret_answer: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemUpdateRecord {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    kind: Option<Classification>,
    #[serde(default)]
    status: Option<Classification>,
    #[serde(default)]
    secret_question: Option<String>,
    #[serde(default)]
    secret_answer: Option<String>,
}

impl TryFrom<ItemUpdateRecord> for ItemUpdate {
    type Error = RegistryError;

    fn try_from(r: ItemUpdateRecord) -> Result<Self, Self::Error> {
        if let Some(ref category) = r.category {
            validate_category(category)?;
        }
        Ok(ItemUpdate {
            title: r.title,
            description: r.description,
            image_url: r.image_url,
            category: r.category,
            date: r.date,
            location: r.location,
            kind: r.kind.or(r.status),
            secret_question: r.secret_question,
            secret_answer: r.secret_answer,
        })
    }
}

impl ItemUpdate {
    /// Merge the present fields into `item` and bump `updated_at`.
    /// Id, owner, and `created_at` never change.
    pub fn apply_to(self, item: &mut Item) {
        fn merge<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        merge(&mut item.title, self.title);
        merge(&mut item.description, self.description);
        merge(&mut item.image_url, self.image_url);
        merge(&mut item.date, self.date);
        merge(&mut item.location, self.location);
        merge(&mut item.secret_question, self.secret_question);
        merge(&mut item.secret_answer, self.secret_answer);
        if let Some(category) = self.category {
            item.category = category;
        }
        if let Some(kind) = self.kind {
            item.kind = kind;
        }
        item.updated_at = Some(Utc::now());
    }
}
