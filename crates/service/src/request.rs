//! Deserializable request bodies.
//!
//! The transport layer hands these over already parsed from JSON; the
//! service still validates them (`validate()`) before touching the store,
//! so a malformed request fails with [`ErrorKind::Validation`] rather than
//! a half-applied mutation.
//!
//! [`ErrorKind::Validation`]: crate::error::ErrorKind::Validation

use crate::error::{ErrorKind, Result};
use biblio_model::ContributorRole;
use serde::Deserialize;

/// A reference to a contributor inside a book mutation: either an existing
/// record by id, or a name to be resolved (reusing an existing contributor
/// with the same content hash, or creating a fresh one).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ContributorRef {
    ById {
        id: i64,
        #[serde(rename = "type", default)]
        role: ContributorRole,
    },
    ByName {
        name: String,
        #[serde(rename = "type", default)]
        role: ContributorRole,
    },
}

impl ContributorRef {
    pub fn role(&self) -> ContributorRole {
        match self {
            ContributorRef::ById { role, .. } | ContributorRef::ByName { role, .. } => *role,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    /// Kept as the raw wire string so an unrecognized format surfaces as a
    /// validation error, not a deserialization failure upstream.
    pub format: String,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub pages: Option<i64>,
    #[serde(default)]
    pub contributors: Vec<ContributorRef>,
}

impl CreateBookRequest {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            exn::bail!(ErrorKind::Validation("title must not be blank".to_string()));
        }
        if self.contributors.is_empty() {
            exn::bail!(ErrorKind::Validation("a book requires at least one contributor".to_string()));
        }
        validate_refs(&self.contributors)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateContributorRequest {
    pub name: String,
}

impl CreateContributorRequest {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            exn::bail!(ErrorKind::Validation("name must not be blank".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachContributorsRequest {
    pub contributors: Vec<ContributorRef>,
}

impl AttachContributorsRequest {
    pub fn validate(&self) -> Result<()> {
        if self.contributors.is_empty() {
            exn::bail!(ErrorKind::Validation("at least one contributor is required".to_string()));
        }
        validate_refs(&self.contributors)
    }
}

fn validate_refs(refs: &[ContributorRef]) -> Result<()> {
    for r in refs {
        if let ContributorRef::ByName { name, .. } = r
            && name.trim().is_empty()
        {
            exn::bail!(ErrorKind::Validation("contributor name must not be blank".to_string()));
        }
    }
    Ok(())
}
