//! Catalogue operations.
//!
//! Reads answer with a [`Snapshot`] carrying the live change token;
//! mutations answer with a [`ChangeSummary`] and rotate the token exactly
//! once, after the store write succeeded. Book mutations live in `books`,
//! contributor mutations in `contributors`; this module holds the service
//! itself, the read operations and the plumbing both sides share.

mod books;
mod contributors;

use crate::change::ChangeTracker;
use crate::error::{ErrorKind, ModelResultExt, Result, StoreResultExt};
use crate::request::ContributorRef;
use crate::response::{ChangeSummary, EntityChange, Snapshot};
use biblio_model::{Book, Contributor, ContributorRole, Credit};
use biblio_store::Repository;
use exn::OptionExt;
use std::collections::HashMap;
use tracing::debug;

/// The catalogue service: relationship upkeep, change tracking and the
/// operations a transport layer drives.
#[derive(Debug)]
pub struct CatalogService {
    repo: Repository,
    tracker: ChangeTracker,
}

/// A contributor reference resolved against the store: the entity (still
/// without an id when freshly built from a name), the role it should be
/// credited with, and whether it needs to be created.
pub(crate) struct ResolvedRef {
    pub(crate) contributor: Contributor,
    pub(crate) role: ContributorRole,
    pub(crate) created: bool,
}

impl CatalogService {
    pub fn new(repo: Repository) -> Self {
        Self::with_tracker(repo, ChangeTracker::new())
    }

    /// Builds the service around an externally owned change tracker, for
    /// embedders that construct the tracker once at startup.
    pub fn with_tracker(repo: Repository, tracker: ChangeTracker) -> Self {
        Self { repo, tracker }
    }

    /// The change tracker this service rotates.
    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn list_books(&self) -> Result<Snapshot<Vec<Book>>> {
        let books = self.repo.list_books().await.lift()?;
        Ok(Snapshot::new(self.tracker.current(), books))
    }

    pub async fn get_book(&self, id: i64) -> Result<Snapshot<Book>> {
        let book = self.require_book(id).await?;
        Ok(Snapshot::new(self.tracker.current(), book))
    }

    pub async fn list_contributors(&self) -> Result<Snapshot<Vec<Contributor>>> {
        let contributors = self.repo.list_contributors().await.lift()?;
        Ok(Snapshot::new(self.tracker.current(), contributors))
    }

    pub async fn get_contributor(&self, id: i64) -> Result<Snapshot<Contributor>> {
        let contributor =
            self.repo.get_contributor(id).await.lift()?.ok_or_raise(|| ErrorKind::NotFound)?;
        Ok(Snapshot::new(self.tracker.current(), contributor))
    }

    /// The contributors credited on a book, in credit order.
    pub async fn contributors_of_book(&self, book_id: i64) -> Result<Snapshot<Vec<Contributor>>> {
        let book = self.require_book(book_id).await?;
        let ids: Vec<i64> = book.credits().iter().filter_map(|c| c.contributor_id).collect();
        let contributors = self.repo.fetch_contributors_by_ids(&ids).await.lift()?;
        Ok(Snapshot::new(self.tracker.current(), contributors))
    }

    // =========================================================================
    // Shared plumbing
    // =========================================================================

    pub(crate) async fn require_book(&self, id: i64) -> Result<Book> {
        self.repo.get_book(id).await.lift()?.ok_or_raise(|| ErrorKind::NotFound)
    }

    /// Resolves contributor references in request order, deduplicated by
    /// content hash.
    ///
    /// By-id references go through the store's tri-state batch fetch, so a
    /// batch where some ids are missing surfaces as
    /// [`ErrorKind::PartialResult`] with the missing ids. By-name references
    /// reuse an existing contributor with the same content hash, or come
    /// back as an unpersisted candidate marked `created`.
    pub(crate) async fn resolve_refs(&self, refs: &[ContributorRef]) -> Result<Vec<ResolvedRef>> {
        let ids: Vec<i64> = refs
            .iter()
            .filter_map(|r| match r {
                ContributorRef::ById { id, .. } => Some(*id),
                ContributorRef::ByName { .. } => None,
            })
            .collect();
        let by_id: HashMap<i64, Contributor> = self
            .repo
            .fetch_contributors_by_ids(&ids)
            .await
            .lift()?
            .into_iter()
            .filter_map(|c| c.id.map(|id| (id, c)))
            .collect();

        let mut resolved: Vec<ResolvedRef> = Vec::with_capacity(refs.len());
        for r in refs {
            let (contributor, role, created) = match r {
                ContributorRef::ById { id, role } => {
                    let contributor = by_id.get(id).cloned().ok_or_raise(|| ErrorKind::NotFound)?;
                    (contributor, *role, false)
                },
                ContributorRef::ByName { name, role } => {
                    let candidate = Contributor::new(name).lift_validation()?;
                    match self.repo.find_contributor_by_sha256(&candidate.sha256).await.lift()? {
                        Some(existing) => (existing, *role, false),
                        None => (candidate, *role, true),
                    }
                },
            };
            if !resolved.iter().any(|entry| entry.contributor.sha256 == contributor.sha256) {
                resolved.push(ResolvedRef { contributor, role, created });
            }
        }
        Ok(resolved)
    }

    /// Inserts every still-unpersisted resolved contributor, replacing the
    /// candidate with the store-assigned entity.
    pub(crate) async fn persist_new_contributors(&self, resolved: &mut [ResolvedRef]) -> Result<()> {
        for entry in resolved.iter_mut() {
            if entry.created {
                entry.contributor = self.repo.add_contributor(&entry.contributor).await.lift()?;
            }
        }
        Ok(())
    }

    pub(crate) fn credits_from(resolved: &[ResolvedRef]) -> Vec<Credit> {
        resolved
            .iter()
            .map(|entry| Credit {
                contributor_id: entry.contributor.id,
                sha256: entry.contributor.sha256.clone(),
                role: entry.role,
            })
            .collect()
    }

    /// Fails with [`ErrorKind::Conflict`] when a book other than `allow`
    /// already holds this content hash. The store's unique index backs this
    /// pre-check up under concurrency.
    pub(crate) async fn ensure_book_content_free(&self, sha256: &str, allow: Option<i64>) -> Result<()> {
        if let Some(existing) = self.repo.find_book_by_sha256(sha256).await.lift()?
            && existing.id != allow
        {
            exn::bail!(ErrorKind::Conflict);
        }
        Ok(())
    }

    pub(crate) async fn ensure_contributor_content_free(&self, sha256: &str, allow: Option<i64>) -> Result<()> {
        if let Some(existing) = self.repo.find_contributor_by_sha256(sha256).await.lift()?
            && existing.id != allow
        {
            exn::bail!(ErrorKind::Conflict);
        }
        Ok(())
    }

    /// Records the after-mutation state of every contributor a book
    /// mutation touched: freshly created ones as `ADDED`, reused ones as
    /// `UPDATED` (their contribution list changed).
    pub(crate) async fn record_credited_contributors(
        &self,
        resolved: &[ResolvedRef],
        summary: &mut ChangeSummary,
    ) -> Result<()> {
        for entry in resolved {
            let Some(id) = entry.contributor.id else { continue };
            if let Some(current) = self.repo.get_contributor(id).await.lift()? {
                let change = match entry.created {
                    true => EntityChange::added(current),
                    false => EntityChange::updated(current),
                };
                summary.record_contributor(id, change);
            }
        }
        Ok(())
    }

    /// Re-checks each orphan candidate against the store and acts on what
    /// it finds: still credited somewhere → `UPDATED`; credit-less →
    /// deleted and reported `DELETED`; vanished or unreadable → a per-item
    /// `ERROR` entry. Best-effort by contract: a failure on one candidate
    /// never aborts the rest of the sweep.
    pub(crate) async fn sweep_orphans(&self, candidates: &[i64], summary: &mut ChangeSummary) {
        for &id in candidates {
            let change = match self.repo.get_contributor(id).await {
                Ok(Some(contributor)) if contributor.is_orphan() => {
                    match self.repo.delete_contributor(id).await {
                        Ok(_) => EntityChange::deleted(contributor),
                        Err(e) => {
                            debug!(contributor = id, error = %e, "orphan cleanup failed");
                            EntityChange::error(format!("could not remove orphaned contributor: {e}"))
                        },
                    }
                },
                Ok(Some(contributor)) => EntityChange::updated(contributor),
                Ok(None) => EntityChange::error("contributor no longer exists"),
                Err(e) => {
                    debug!(contributor = id, error = %e, "orphan check failed");
                    EntityChange::error(format!("could not check contributor: {e}"))
                },
            };
            summary.record_contributor(id, change);
        }
    }

    /// Rotates the change token and stamps the envelope with the pair.
    pub(crate) fn sealed(&self, summary: ChangeSummary) -> ChangeSummary {
        summary.sealed(self.tracker.rotate())
    }
}
