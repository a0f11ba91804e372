//! SQLite catalogue store.
//!
//! This crate is the persistence bridge for the catalogue: entities go in
//! and come out as [`biblio_model`] types, and every composite write (an
//! entity plus its association rows, or a replace of one entity by another)
//! happens inside a single transaction so a mid-sequence failure leaves no
//! partial state behind.
//!
//! # Lookup semantics
//! Batch lookups are tri-state: all requested ids resolved is `Ok`, zero
//! resolved is [`ErrorKind::NotFound`], and some-but-not-all is
//! [`ErrorKind::PartialResult`] carrying the missing ids. The distinction
//! matters to callers — a partial hit means the batch touched real data and
//! must not be treated as if nothing existed.
//!
//! [`ErrorKind::NotFound`]: crate::error::ErrorKind::NotFound
//! [`ErrorKind::PartialResult`]: crate::error::ErrorKind::PartialResult

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::repo::Repository;
