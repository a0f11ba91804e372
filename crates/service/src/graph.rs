//! Id-indexed book/contributor adjacency.
//!
//! The graph holds plain ids on both sides rather than entity references,
//! so there are no ownership cycles to manage: a book maps to its ordered
//! credit list, a contributor maps to the set of books crediting them. It
//! is seeded per operation from the entities the operation loaded and is
//! where the relationship rules live; persistence is the caller's job.

use crate::error::{ErrorKind, Result};
use biblio_model::{Book, Contributor, ContributorRole};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default)]
pub struct RelationshipGraph {
    /// book id → ordered `(contributor id, role)` credits.
    credits: BTreeMap<i64, Vec<(i64, ContributorRole)>>,
    /// contributor id → ids of books crediting them.
    memberships: BTreeMap<i64, BTreeSet<i64>>,
}

impl RelationshipGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the graph with a persisted book's credit rows. Unpersisted
    /// credits (no contributor id yet) are skipped.
    pub fn load_book(&mut self, book: &Book) {
        let Some(book_id) = book.id else { return };
        for credit in book.credits() {
            if let Some(contributor_id) = credit.contributor_id {
                self.attach(book_id, contributor_id, credit.role);
            }
        }
    }

    /// Seeds the graph with a persisted contributor's membership side.
    pub fn load_contributor(&mut self, contributor: &Contributor) {
        let Some(contributor_id) = contributor.id else { return };
        let books = self.memberships.entry(contributor_id).or_default();
        for contribution in &contributor.contributions {
            books.insert(contribution.book_id);
        }
    }

    /// Records a credit on both sides. Idempotent: re-attaching an already
    /// credited contributor changes nothing, not even the stored role.
    pub fn attach(&mut self, book_id: i64, contributor_id: i64, role: ContributorRole) {
        let credits = self.credits.entry(book_id).or_default();
        if !credits.iter().any(|(id, _)| *id == contributor_id) {
            credits.push((contributor_id, role));
        }
        self.memberships.entry(contributor_id).or_default().insert(book_id);
    }

    /// Removes one credit from both sides.
    ///
    /// Raises [`ErrorKind::NotFound`] when the contributor is not credited
    /// on the book, and [`ErrorKind::InvalidOperation`] when removing them
    /// would leave the book with zero credits — only [`clear_book`] may do
    /// that, and only because the caller is deleting or replacing the book.
    ///
    /// [`clear_book`]: Self::clear_book
    pub fn detach(&mut self, book_id: i64, contributor_id: i64) -> Result<()> {
        let Some(credits) = self.credits.get_mut(&book_id) else {
            exn::bail!(ErrorKind::NotFound);
        };
        if !credits.iter().any(|(id, _)| *id == contributor_id) {
            exn::bail!(ErrorKind::NotFound);
        }
        if credits.len() == 1 {
            exn::bail!(ErrorKind::InvalidOperation(
                "detaching the only remaining contributor would leave the book uncredited".to_string()
            ));
        }
        credits.retain(|(id, _)| *id != contributor_id);
        if let Some(books) = self.memberships.get_mut(&contributor_id) {
            books.remove(&book_id);
        }
        Ok(())
    }

    /// Detaches every credit from a book, returning the contributor ids
    /// that now hold no memberships *in this graph* — the orphan sweep's
    /// candidate list. Whether they are truly orphaned is decided against
    /// the store, and deleting them is the caller's decision.
    pub fn clear_book(&mut self, book_id: i64) -> Vec<i64> {
        let mut candidates = Vec::new();
        for (contributor_id, _) in self.credits.remove(&book_id).unwrap_or_default() {
            let remaining = match self.memberships.get_mut(&contributor_id) {
                Some(books) => {
                    books.remove(&book_id);
                    books.len()
                },
                None => 0,
            };
            if remaining == 0 {
                candidates.push(contributor_id);
            }
        }
        candidates
    }

    /// The ordered credits currently recorded for a book.
    pub fn credits_of(&self, book_id: i64) -> &[(i64, ContributorRole)] {
        self.credits.get(&book_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether a contributor holds no memberships in this graph.
    pub fn is_orphan(&self, contributor_id: i64) -> bool {
        self.memberships.get(&contributor_id).is_none_or(BTreeSet::is_empty)
    }
}
