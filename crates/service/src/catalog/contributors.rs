//! Contributor mutations.

use crate::catalog::CatalogService;
use crate::error::{ErrorKind, ModelResultExt, Result, StoreResultExt};
use crate::request::CreateContributorRequest;
use crate::response::{ChangeSummary, EntityChange};
use biblio_model::Contributor;
use exn::OptionExt;
use tracing::debug;

impl CatalogService {
    /// Creates a contributor from a raw name. A contributor is allowed to
    /// hold zero contributions at creation; they only become an orphan-sweep
    /// concern once they have been attached and detached.
    pub async fn create_contributor(&self, req: CreateContributorRequest) -> Result<ChangeSummary> {
        req.validate()?;
        let candidate = Contributor::new(&req.name).lift_validation()?;
        self.ensure_contributor_content_free(&candidate.sha256, None).await?;
        let saved = self.repo.add_contributor(&candidate).await.lift()?;
        debug!(contributor = ?saved.id, "contributor created");

        let mut summary = ChangeSummary::new();
        if let Some(id) = saved.id {
            summary.record_contributor(id, EntityChange::added(saved));
        }
        Ok(self.sealed(summary))
    }

    /// Replaces the contributor at `id` with one built from the requested
    /// name, re-pointing every credit to the replacement. Every credited
    /// book hashes over its contributors; the store reseals each one in the
    /// same transaction and they are reported alongside.
    pub async fn replace_contributor(&self, id: i64, req: CreateContributorRequest) -> Result<ChangeSummary> {
        req.validate()?;
        let old = self.repo.get_contributor(id).await.lift()?.ok_or_raise(|| ErrorKind::NotFound)?;
        let candidate = Contributor::new(&req.name).lift_validation()?;

        let mut summary = ChangeSummary::new();
        if candidate.sha256 == old.sha256 {
            // Same content hash; nothing to re-point.
            summary.record_contributor(id, EntityChange::updated(old));
            return Ok(self.sealed(summary));
        }
        self.ensure_contributor_content_free(&candidate.sha256, Some(id)).await?;

        let saved = self.repo.replace_contributor(id, &candidate).await.lift()?;
        debug!(old = id, new = ?saved.id, "contributor replaced");

        for contribution in &saved.contributions {
            if let Some(book) = self.repo.get_book(contribution.book_id).await.lift()? {
                summary.record_book(contribution.book_id, EntityChange::updated(book));
            }
        }

        summary.record_contributor(id, EntityChange::deleted(old));
        if let Some(new_id) = saved.id {
            summary.record_contributor(new_id, EntityChange::added(saved));
        }
        Ok(self.sealed(summary))
    }
}
