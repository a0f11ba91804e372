//! In-memory catalogue entities.
//!
//! A catalogue record has three identity-adjacent fields, all derived from
//! its display text by [`biblio_text`]:
//! - the display form (`title`/`name`), title-cased;
//! - the `cataloguing` key, used for alphabetical shelf ordering and
//!   explicitly *not* unique (`"Dr. Diane Maxwell"` and `"Diane Maxwell Jr."`
//!   share a key);
//! - the `sha256` content hash, the one field that *is* unique per entity
//!   type across the store.
//!
//! A book's hash additionally covers its credited contributors in attach
//! order, so attaching or removing a credit changes the book's identity.

mod book;
mod contributor;
mod entity;
pub mod error;
mod format;
mod role;

pub use crate::book::{Book, Credit};
pub use crate::contributor::{Contribution, Contributor};
pub use crate::entity::CatalogEntity;
pub use crate::format::BookFormat;
pub use crate::role::ContributorRole;
