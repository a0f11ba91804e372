//! Serializable response envelopes.

use crate::change::ChangeUpdate;
use biblio_model::{Book, Contributor};
use serde::Serialize;
use std::collections::BTreeMap;

/// What happened to one entity during a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeAction {
    Added,
    Updated,
    Deleted,
    Error,
}

/// One entity's entry in a [`ChangeSummary`]: the action taken, the entity
/// as it stands after the mutation (absent for `ERROR` entries), and a
/// message when the action is `ERROR`.
#[derive(Debug, Clone, Serialize)]
pub struct EntityChange<T> {
    pub action: ChangeAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> EntityChange<T> {
    pub fn added(entity: T) -> Self {
        Self { action: ChangeAction::Added, entity: Some(entity), error: None }
    }

    pub fn updated(entity: T) -> Self {
        Self { action: ChangeAction::Updated, entity: Some(entity), error: None }
    }

    pub fn deleted(entity: T) -> Self {
        Self { action: ChangeAction::Deleted, entity: Some(entity), error: None }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { action: ChangeAction::Error, entity: None, error: Some(message.into()) }
    }
}

/// The envelope every mutation answers with: the touched entities keyed by
/// id, plus the change-token pair the mutation produced (`lastChangeId` is
/// the token retired by this mutation, `changeId` the one now live).
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSummary {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub books: BTreeMap<i64, EntityChange<Book>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub contributors: BTreeMap<i64, EntityChange<Contributor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_change_id: Option<String>,
    pub change_id: String,
}

impl ChangeSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_book(&mut self, id: i64, change: EntityChange<Book>) {
        self.books.insert(id, change);
    }

    pub fn record_contributor(&mut self, id: i64, change: EntityChange<Contributor>) {
        self.contributors.insert(id, change);
    }

    /// Stamps the envelope with the rotation this mutation performed.
    pub fn sealed(mut self, update: ChangeUpdate) -> Self {
        self.last_change_id = Some(update.before);
        self.change_id = update.after;
        self
    }
}

/// A read response: the requested data plus the change token that was live
/// when it was assembled.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot<T> {
    pub change_id: String,
    pub data: T,
}

impl<T> Snapshot<T> {
    pub fn new(change_id: String, data: T) -> Self {
        Self { change_id, data }
    }
}
