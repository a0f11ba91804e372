//! Catalogue service layer.
//!
//! Sits between a transport (HTTP, CLI, whatever drives it) and the store,
//! and owns the three things the store deliberately does not:
//! - the **relationship rules** — a book never ends a successful operation
//!   with zero credits, and a contributor left without books is removed;
//! - the **change token** — one UUID per service instance, rotated exactly
//!   once per successful mutation, so clients can tell whether the catalogue
//!   moved under them;
//! - the **response envelope** — every mutation answers with a
//!   [`ChangeSummary`](response::ChangeSummary) describing what happened to
//!   each touched entity, including the per-item failures the orphan sweep
//!   absorbs instead of aborting on.

pub mod catalog;
pub mod change;
pub mod error;
pub mod graph;
pub mod request;
pub mod response;

pub use crate::catalog::CatalogService;
pub use crate::change::ChangeTracker;
