//! Book mutations.

use crate::catalog::CatalogService;
use crate::error::{ErrorKind, ModelResultExt, Result, StoreResultExt};
use crate::graph::RelationshipGraph;
use crate::request::{AttachContributorsRequest, CreateBookRequest};
use crate::response::{ChangeSummary, EntityChange};
use biblio_model::{Book, BookFormat, Credit};
use std::collections::BTreeSet;
use tracing::debug;

impl CatalogService {
    /// Creates a book from a request, resolving contributor references
    /// (creating by-name contributors that do not exist yet) and crediting
    /// them in request order. A book with the same content hash already in
    /// the catalogue is a [`ErrorKind::Conflict`].
    pub async fn create_book(&self, req: CreateBookRequest) -> Result<ChangeSummary> {
        req.validate()?;
        let format: BookFormat = req.format.parse().lift_validation()?;
        let mut resolved = self.resolve_refs(&req.contributors).await?;

        let mut candidate = Book::new(&req.title, format)
            .lift_validation()?
            .with_isbn(req.isbn.clone())
            .with_year(req.year.clone())
            .with_pages(req.pages);
        for entry in &resolved {
            candidate.push_credit(&entry.contributor, entry.role);
        }
        self.ensure_book_content_free(&candidate.sha256, None).await?;

        self.persist_new_contributors(&mut resolved).await?;
        let candidate = candidate.with_credits(Self::credits_from(&resolved));
        let saved = self.repo.add_book(&candidate).await.lift()?;
        debug!(book = ?saved.id, sha256 = %saved.sha256, "book created");

        let mut summary = ChangeSummary::new();
        if let Some(id) = saved.id {
            summary.record_book(id, EntityChange::added(saved));
        }
        self.record_credited_contributors(&resolved, &mut summary).await?;
        Ok(self.sealed(summary))
    }

    /// Full-replaces the book at `id` with the requested one: old
    /// associations are cleared, the caller's contributors are credited on
    /// the replacement, and contributors the replacement no longer credits
    /// go through the orphan sweep.
    pub async fn replace_book(&self, id: i64, req: CreateBookRequest) -> Result<ChangeSummary> {
        req.validate()?;
        let old = self.require_book(id).await?;
        let format: BookFormat = req.format.parse().lift_validation()?;
        let mut resolved = self.resolve_refs(&req.contributors).await?;

        let mut candidate = Book::new(&req.title, format)
            .lift_validation()?
            .with_isbn(req.isbn.clone())
            .with_year(req.year.clone())
            .with_pages(req.pages);
        for entry in &resolved {
            candidate.push_credit(&entry.contributor, entry.role);
        }
        self.ensure_book_content_free(&candidate.sha256, Some(id)).await?;

        self.persist_new_contributors(&mut resolved).await?;
        let candidate = candidate.with_credits(Self::credits_from(&resolved));
        let saved = self.repo.replace_book(id, &candidate).await.lift()?;
        debug!(old = id, new = ?saved.id, "book replaced");

        let kept: BTreeSet<i64> = saved.credits().iter().filter_map(|c| c.contributor_id).collect();
        let mut graph = RelationshipGraph::new();
        graph.load_book(&old);
        let candidates: Vec<i64> =
            graph.clear_book(id).into_iter().filter(|c| !kept.contains(c)).collect();

        let mut summary = ChangeSummary::new();
        if let Some(new_id) = saved.id {
            summary.record_book(new_id, EntityChange::updated(saved));
        }
        self.record_credited_contributors(&resolved, &mut summary).await?;
        self.sweep_orphans(&candidates, &mut summary).await;
        Ok(self.sealed(summary))
    }

    /// Deletes a book, then sweeps its former contributors: those left
    /// without any books are removed and reported `DELETED`, the rest are
    /// reported `UPDATED`.
    pub async fn delete_book(&self, id: i64) -> Result<ChangeSummary> {
        let book = self.require_book(id).await?;
        let mut graph = RelationshipGraph::new();
        graph.load_book(&book);
        let candidates = graph.clear_book(id);

        if !self.repo.delete_book(id).await.lift()? {
            exn::bail!(ErrorKind::NotFound);
        }
        debug!(book = id, "book deleted");

        let mut summary = ChangeSummary::new();
        summary.record_book(id, EntityChange::deleted(book));
        self.sweep_orphans(&candidates, &mut summary).await;
        Ok(self.sealed(summary))
    }

    /// Credits additional contributors on an existing book, after the ones
    /// already there. References to contributors already credited are
    /// silently dropped.
    pub async fn attach_contributors(&self, book_id: i64, req: AttachContributorsRequest) -> Result<ChangeSummary> {
        req.validate()?;
        let book = self.require_book(book_id).await?;
        let mut resolved = self.resolve_refs(&req.contributors).await?;
        resolved.retain(|entry| !book.credits().iter().any(|c| c.sha256 == entry.contributor.sha256));

        let mut candidate = book.clone();
        for entry in &resolved {
            candidate.push_credit(&entry.contributor, entry.role);
        }
        self.ensure_book_content_free(&candidate.sha256, Some(book_id)).await?;

        self.persist_new_contributors(&mut resolved).await?;
        let mut credits = book.credits().to_vec();
        credits.extend(Self::credits_from(&resolved));
        let candidate = book.with_credits(credits);
        let saved = self.repo.add_book(&candidate).await.lift()?;
        debug!(book = book_id, attached = resolved.len(), "contributors attached");

        let mut summary = ChangeSummary::new();
        summary.record_book(book_id, EntityChange::updated(saved));
        self.record_credited_contributors(&resolved, &mut summary).await?;
        Ok(self.sealed(summary))
    }

    /// Replaces a book's entire credit list with the requested one.
    /// Contributors dropped from the list go through the orphan sweep.
    pub async fn replace_book_credits(&self, book_id: i64, req: AttachContributorsRequest) -> Result<ChangeSummary> {
        req.validate()?;
        let book = self.require_book(book_id).await?;
        let mut resolved = self.resolve_refs(&req.contributors).await?;

        let mut graph = RelationshipGraph::new();
        graph.load_book(&book);
        let cleared = graph.clear_book(book_id);

        let candidate = book.clone().with_credits(Self::credits_from(&resolved));
        self.ensure_book_content_free(&candidate.sha256, Some(book_id)).await?;

        self.persist_new_contributors(&mut resolved).await?;
        let candidate = book.with_credits(Self::credits_from(&resolved));
        let saved = self.repo.add_book(&candidate).await.lift()?;
        debug!(book = book_id, credits = saved.credits().len(), "credits replaced");

        let kept: BTreeSet<i64> = saved.credits().iter().filter_map(|c| c.contributor_id).collect();
        let candidates: Vec<i64> = cleared.into_iter().filter(|c| !kept.contains(c)).collect();

        let mut summary = ChangeSummary::new();
        summary.record_book(book_id, EntityChange::updated(saved));
        self.record_credited_contributors(&resolved, &mut summary).await?;
        self.sweep_orphans(&candidates, &mut summary).await;
        Ok(self.sealed(summary))
    }

    /// Removes one credit from a book. Fails [`ErrorKind::NotFound`] when
    /// the contributor is not credited on it and
    /// [`ErrorKind::InvalidOperation`] when it is the book's only credit;
    /// otherwise the contributor is deleted if the detach orphaned them.
    pub async fn detach_contributor(&self, book_id: i64, contributor_id: i64) -> Result<ChangeSummary> {
        let book = self.require_book(book_id).await?;
        let mut graph = RelationshipGraph::new();
        graph.load_book(&book);
        graph.detach(book_id, contributor_id)?;

        let remaining: Vec<Credit> =
            book.credits().iter().filter(|c| c.contributor_id != Some(contributor_id)).cloned().collect();
        let candidate = book.with_credits(remaining);
        self.ensure_book_content_free(&candidate.sha256, Some(book_id)).await?;
        let saved = self.repo.add_book(&candidate).await.lift()?;
        debug!(book = book_id, contributor = contributor_id, "contributor detached");

        let mut summary = ChangeSummary::new();
        summary.record_book(book_id, EntityChange::updated(saved));
        self.sweep_orphans(&[contributor_id], &mut summary).await;
        Ok(self.sealed(summary))
    }
}
