use thiserror::Error;

/// Errors surfaced by the matching engine.
///
/// Soft data-quality faults (malformed dates, absent text) are absorbed
/// while scoring and never show up here.
#[derive(Error, Debug)]
pub enum MatchError {
    #[error("item not found: {0}")]
    ItemNotFound(String),

    /// The store could not produce a catalogue snapshot.
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Client-facing failures of registry operations (create, import, update,
/// lookup). Storage faults stay `anyhow` errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("item not found: {0}")]
    NotFound(String),

    #[error("invalid item: {0}")]
    Invalid(String),

    #[error("item already exists: {0}")]
    Duplicate(String),
}
