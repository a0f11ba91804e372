//! Combined repository for Book and Contributor entities.
//!
//! Books and contributors are persisted separately but share their credit
//! join table, so one repository owns both. Composite writes (entity plus
//! credit rows, or a replace) run in a transaction: either the whole
//! mutation lands or none of it does.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{BookRow, ContributionRow, ContributorRow, CreditRow};
use biblio_model::{Book, Contributor, Credit};
use exn::{OptionExt, ResultExt};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use tracing::instrument;

/// Repository for catalogue entities in the store database.
///
/// # Relationships
/// - A book row owns an ordered set of credit rows (`position` = attach order)
/// - Deleting a book cascades to its credit rows
/// - Deleting a contributor cascades to its credit rows; whether that is
///   *allowed* (the "books keep at least one contributor" rule) is the
///   service layer's decision, not enforced here
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}

/// Classifies a write failure: `sha256` unique violations become
/// [`ErrorKind::Conflict`], everything else stays a database error. This is
/// what turns a duplicate-content race into a conflict instead of a silent
/// double-insert.
fn raise_write<T>(result: sqlx::Result<T>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) if e.as_database_error().is_some_and(|db| db.is_unique_violation()) => {
            Err(e).or_raise(|| ErrorKind::Conflict)
        },
        Err(e) => Err(e).or_raise(|| ErrorKind::Database),
    }
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Books
    // =========================================================================

    /// Persist a book together with its credit rows.
    ///
    /// A book without an id is inserted; one with an id overwrites the
    /// existing row. Returns the reloaded, store-assigned entity. A content
    /// hash collision raises [`ErrorKind::Conflict`].
    #[instrument(skip_all, fields(sha256 = book.sha256))]
    pub async fn add_book(&self, book: &Book) -> Result<Book> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let id = Self::write_book(&mut tx, book).await?;
        Self::write_credits(&mut tx, id, book.credits()).await?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        self.get_book(id).await?.ok_or_raise(|| ErrorKind::NotFound)
    }

    /// Get a book (with its ordered credits) by id.
    pub async fn get_book(&self, id: i64) -> Result<Option<Book>> {
        let row: Option<BookRow> = sqlx::query_as(include_str!("../queries/get_book.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        match row {
            Some(row) => {
                let credits = self.credits_for_book(id).await?;
                row.into_book(credits).map(Some)
            },
            None => Ok(None),
        }
    }

    /// Get the book holding the given content hash, if any.
    ///
    /// Used as the duplicate pre-check before a create or replace; the
    /// unique index backs it up under concurrency.
    pub async fn find_book_by_sha256(&self, sha256: impl AsRef<str>) -> Result<Option<Book>> {
        let row: Option<BookRow> = sqlx::query_as(include_str!("../queries/find_book_by_sha256.sql"))
            .bind(sha256.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        match row {
            Some(row) => {
                let credits = self.credits_for_book(row.id).await?;
                row.into_book(credits).map(Some)
            },
            None => Ok(None),
        }
    }

    /// List every book, in cataloguing order, with credits attached.
    pub async fn list_books(&self) -> Result<Vec<Book>> {
        let rows: Vec<BookRow> = sqlx::query_as(include_str!("../queries/list_books.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let credits: Vec<CreditRow> = sqlx::query_as(include_str!("../queries/list_credits.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let mut by_book: HashMap<i64, Vec<CreditRow>> = HashMap::new();
        for credit in credits {
            by_book.entry(credit.book_id).or_default().push(credit);
        }
        rows.into_iter()
            .map(|row| {
                let credits = by_book.remove(&row.id).unwrap_or_default();
                row.into_book(credits)
            })
            .collect()
    }

    /// Fetch a batch of books by id, with tri-state completion:
    /// all ids resolved → `Ok`; zero resolved → [`ErrorKind::NotFound`];
    /// some but not all → [`ErrorKind::PartialResult`] naming the missing
    /// ids. An empty id list is trivially complete.
    pub async fn fetch_books_by_ids(&self, ids: &[i64]) -> Result<Vec<Book>> {
        let mut found = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();
        for &id in ids {
            match self.get_book(id).await? {
                Some(book) => found.push(book),
                None => missing.push(id),
            }
        }
        Self::classify_batch(found, missing)
    }

    /// Delete a book by id; credit rows cascade. Returns whether a row was
    /// actually removed.
    pub async fn delete_book(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/delete_book.sql"))
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace the book at `old_id` with `book`, atomically: the old row
    /// (and its credits) go away, and the new entity (and its credits) land,
    /// in one transaction. Raises [`ErrorKind::NotFound`] if `old_id` does
    /// not exist and [`ErrorKind::Conflict`] on a content hash collision.
    #[instrument(skip_all, fields(old_id, sha256 = book.sha256))]
    pub async fn replace_book(&self, old_id: i64, book: &Book) -> Result<Book> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let deleted = sqlx::query(include_str!("../queries/delete_book.sql"))
            .bind(old_id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if deleted.rows_affected() == 0 {
            exn::bail!(ErrorKind::NotFound);
        }
        let id = Self::write_book(&mut tx, book).await?;
        Self::write_credits(&mut tx, id, book.credits()).await?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        self.get_book(id).await?.ok_or_raise(|| ErrorKind::NotFound)
    }

    /// Overwrite a book's credit rows with a new ordered set.
    pub async fn save_credits(&self, book_id: i64, credits: &[Credit]) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        Self::write_credits(&mut tx, book_id, credits).await?;
        tx.commit().await.or_raise(|| ErrorKind::Database)
    }

    // =========================================================================
    // Contributors
    // =========================================================================

    /// Persist a contributor. Insert without an id, overwrite with one.
    /// Returns the reloaded, store-assigned entity. A content hash collision
    /// raises [`ErrorKind::Conflict`].
    #[instrument(skip_all, fields(sha256 = contributor.sha256))]
    pub async fn add_contributor(&self, contributor: &Contributor) -> Result<Contributor> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let id = Self::write_contributor(&mut tx, contributor).await?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        self.get_contributor(id).await?.ok_or_raise(|| ErrorKind::NotFound)
    }

    /// Get a contributor (with their contributions) by id.
    pub async fn get_contributor(&self, id: i64) -> Result<Option<Contributor>> {
        let row: Option<ContributorRow> = sqlx::query_as(include_str!("../queries/get_contributor.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        match row {
            Some(row) => {
                let contributions: Vec<ContributionRow> =
                    sqlx::query_as(include_str!("../queries/contributions_for.sql"))
                        .bind(id)
                        .fetch_all(&self.pool)
                        .await
                        .or_raise(|| ErrorKind::Database)?;
                Ok(Some(row.into_contributor(contributions)))
            },
            None => Ok(None),
        }
    }

    /// Get the contributor holding the given content hash, if any.
    pub async fn find_contributor_by_sha256(&self, sha256: impl AsRef<str>) -> Result<Option<Contributor>> {
        let row: Option<ContributorRow> = sqlx::query_as(include_str!("../queries/find_contributor_by_sha256.sql"))
            .bind(sha256.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        match row {
            Some(row) => self.get_contributor(row.id).await,
            None => Ok(None),
        }
    }

    /// List every contributor, in cataloguing order, with contributions.
    pub async fn list_contributors(&self) -> Result<Vec<Contributor>> {
        let rows: Vec<ContributorRow> = sqlx::query_as(include_str!("../queries/list_contributors.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let joins: Vec<(i64, i64, String)> = sqlx::query_as(include_str!("../queries/list_contributions.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let mut by_contributor: HashMap<i64, Vec<ContributionRow>> = HashMap::new();
        for (contributor_id, book_id, r#type) in joins {
            by_contributor.entry(contributor_id).or_default().push(ContributionRow { book_id, r#type });
        }
        Ok(rows
            .into_iter()
            .map(|row| {
                let contributions = by_contributor.remove(&row.id).unwrap_or_default();
                row.into_contributor(contributions)
            })
            .collect())
    }

    /// Fetch a batch of contributors by id; same tri-state completion as
    /// [`fetch_books_by_ids`](Self::fetch_books_by_ids).
    pub async fn fetch_contributors_by_ids(&self, ids: &[i64]) -> Result<Vec<Contributor>> {
        let mut found = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();
        for &id in ids {
            match self.get_contributor(id).await? {
                Some(contributor) => found.push(contributor),
                None => missing.push(id),
            }
        }
        Self::classify_batch(found, missing)
    }

    /// Delete a contributor by id; credit rows cascade. Returns whether a
    /// row was actually removed.
    pub async fn delete_contributor(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/delete_contributor.sql"))
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace the contributor at `old_id` with `contributor`, re-pointing
    /// every credit row from the old identity to the new one. Books hash
    /// over their credited contributors, so the stored fingerprint of every
    /// affected book is recomputed inside the same transaction: the whole
    /// swap lands or none of it does.
    #[instrument(skip_all, fields(old_id, sha256 = contributor.sha256))]
    pub async fn replace_contributor(&self, old_id: i64, contributor: &Contributor) -> Result<Contributor> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let new_id = Self::write_contributor(&mut tx, contributor).await?;
        sqlx::query(include_str!("../queries/repoint_credits.sql"))
            .bind(new_id)
            .bind(old_id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let deleted = sqlx::query(include_str!("../queries/delete_contributor.sql"))
            .bind(old_id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if deleted.rows_affected() == 0 {
            exn::bail!(ErrorKind::NotFound);
        }
        Self::reseal_books_of(&mut tx, new_id).await?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        self.get_contributor(new_id).await?.ok_or_raise(|| ErrorKind::NotFound)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn credits_for_book(&self, book_id: i64) -> Result<Vec<CreditRow>> {
        sqlx::query_as(include_str!("../queries/credits_for_book.sql"))
            .bind(book_id)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    async fn write_book(tx: &mut Transaction<'_, Sqlite>, book: &Book) -> Result<i64> {
        match book.id {
            Some(id) => {
                raise_write(
                    sqlx::query(include_str!("../queries/upsert_book.sql"))
                        .bind(id)
                        .bind(&book.sha256)
                        .bind(&book.title)
                        .bind(&book.cataloguing)
                        .bind(&book.isbn)
                        .bind(&book.year)
                        .bind(book.pages)
                        .bind(book.format.as_str())
                        .execute(&mut **tx)
                        .await,
                )?;
                Ok(id)
            },
            None => {
                let result = raise_write(
                    sqlx::query(include_str!("../queries/insert_book.sql"))
                        .bind(&book.sha256)
                        .bind(&book.title)
                        .bind(&book.cataloguing)
                        .bind(&book.isbn)
                        .bind(&book.year)
                        .bind(book.pages)
                        .bind(book.format.as_str())
                        .execute(&mut **tx)
                        .await,
                )?;
                Ok(result.last_insert_rowid())
            },
        }
    }

    async fn write_credits(tx: &mut Transaction<'_, Sqlite>, book_id: i64, credits: &[Credit]) -> Result<()> {
        sqlx::query(include_str!("../queries/delete_credits_for_book.sql"))
            .bind(book_id)
            .execute(&mut **tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        for (position, credit) in credits.iter().enumerate() {
            let contributor_id =
                credit.contributor_id.ok_or_raise(|| ErrorKind::InvalidData("credit without contributor id"))?;
            sqlx::query(include_str!("../queries/insert_credit.sql"))
                .bind(book_id)
                .bind(contributor_id)
                .bind(credit.role.as_str())
                .bind(position as i64)
                .execute(&mut **tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        Ok(())
    }

    async fn write_contributor(tx: &mut Transaction<'_, Sqlite>, contributor: &Contributor) -> Result<i64> {
        match contributor.id {
            Some(id) => {
                raise_write(
                    sqlx::query(include_str!("../queries/upsert_contributor.sql"))
                        .bind(id)
                        .bind(&contributor.sha256)
                        .bind(&contributor.name)
                        .bind(&contributor.cataloguing)
                        .execute(&mut **tx)
                        .await,
                )?;
                Ok(id)
            },
            None => {
                let result = raise_write(
                    sqlx::query(include_str!("../queries/insert_contributor.sql"))
                        .bind(&contributor.sha256)
                        .bind(&contributor.name)
                        .bind(&contributor.cataloguing)
                        .execute(&mut **tx)
                        .await,
                )?;
                Ok(result.last_insert_rowid())
            },
        }
    }

    /// Recompute and store the fingerprint of every book credited to
    /// `contributor_id`, using the credit rows as they stand inside `tx`.
    async fn reseal_books_of(tx: &mut Transaction<'_, Sqlite>, contributor_id: i64) -> Result<()> {
        let book_ids: Vec<(i64,)> = sqlx::query_as(include_str!("../queries/books_of_contributor.sql"))
            .bind(contributor_id)
            .fetch_all(&mut **tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        for (book_id,) in book_ids {
            let row: BookRow = sqlx::query_as(include_str!("../queries/get_book.sql"))
                .bind(book_id)
                .fetch_one(&mut **tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            let credits: Vec<CreditRow> = sqlx::query_as(include_str!("../queries/credits_for_book.sql"))
                .bind(book_id)
                .fetch_all(&mut **tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
            let book = row.into_book(credits)?;
            let credits = book.credits().to_vec();
            let resealed = book.with_credits(credits);
            sqlx::query(include_str!("../queries/update_book_sha256.sql"))
                .bind(&resealed.sha256)
                .bind(book_id)
                .execute(&mut **tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        Ok(())
    }

    fn classify_batch<T>(found: Vec<T>, missing: Vec<i64>) -> Result<Vec<T>> {
        if missing.is_empty() {
            Ok(found)
        } else if found.is_empty() {
            exn::bail!(ErrorKind::NotFound)
        } else {
            exn::bail!(ErrorKind::PartialResult(missing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biblio_model::{BookFormat, ContributorRole};
    use std::ops::Deref;

    async fn repo() -> Repository {
        let db = Database::connect_in_memory().await.unwrap();
        Repository::from(&db)
    }

    async fn saved_contributor(repo: &Repository, name: &str) -> Contributor {
        repo.add_contributor(&Contributor::new(name).unwrap()).await.unwrap()
    }

    async fn saved_book(repo: &Repository, title: &str, contributors: &[&Contributor]) -> Book {
        let mut book = Book::new(title, BookFormat::Paperback).unwrap();
        for contributor in contributors {
            book.push_credit(contributor, ContributorRole::Author);
        }
        repo.add_book(&book).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_reloads() {
        let repo = repo().await;
        let king = saved_contributor(&repo, "Stephen King").await;
        assert!(king.id.is_some());
        let book = saved_book(&repo, "The Gunslinger", &[&king]).await;
        let reloaded = repo.get_book(book.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(reloaded, book);
        assert_eq!(reloaded.credits().len(), 1);
        assert_eq!(reloaded.credits()[0].contributor_id, king.id);
    }

    #[tokio::test]
    async fn test_credits_keep_attach_order() {
        let repo = repo().await;
        let straub = saved_contributor(&repo, "Peter Straub").await;
        let king = saved_contributor(&repo, "Stephen King").await;
        let book = saved_book(&repo, "The Talisman", &[&straub, &king]).await;
        let reloaded = repo.get_book(book.id.unwrap()).await.unwrap().unwrap();
        let order: Vec<_> = reloaded.credits().iter().map(|c| c.contributor_id.unwrap()).collect();
        assert_eq!(order, vec![straub.id.unwrap(), king.id.unwrap()]);
    }

    #[tokio::test]
    async fn test_duplicate_content_hash_is_a_conflict() {
        let repo = repo().await;
        saved_contributor(&repo, "Blake Victoria").await;
        let err = repo.add_contributor(&Contributor::new("blake victoria").unwrap()).await.unwrap_err();
        assert!(matches!(err.deref(), ErrorKind::Conflict));
    }

    #[tokio::test]
    async fn test_batch_fetch_tri_state() {
        let repo = repo().await;
        let a = saved_contributor(&repo, "Ann Leckie").await;
        let b = saved_contributor(&repo, "Becky Chambers").await;
        let both = repo.fetch_contributors_by_ids(&[a.id.unwrap(), b.id.unwrap()]).await.unwrap();
        assert_eq!(both.len(), 2);

        let err = repo.fetch_contributors_by_ids(&[999_999]).await.unwrap_err();
        assert!(matches!(err.deref(), ErrorKind::NotFound));

        let err = repo.fetch_contributors_by_ids(&[a.id.unwrap(), 999_999]).await.unwrap_err();
        match err.deref() {
            ErrorKind::PartialResult(missing) => assert_eq!(missing, &vec![999_999]),
            other => panic!("expected PartialResult, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_batch_is_trivially_complete() {
        let repo = repo().await;
        assert!(repo.fetch_books_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleting_book_cascades_credits() {
        let repo = repo().await;
        let king = saved_contributor(&repo, "Stephen King").await;
        let book = saved_book(&repo, "The Outsider", &[&king]).await;
        assert!(repo.delete_book(book.id.unwrap()).await.unwrap());
        let king = repo.get_contributor(king.id.unwrap()).await.unwrap().unwrap();
        assert!(king.is_orphan());
    }

    #[tokio::test]
    async fn test_replace_contributor_repoints_credits() {
        let repo = repo().await;
        let old = saved_contributor(&repo, "Robert Galbraith").await;
        let book = saved_book(&repo, "The Cuckoo's Calling", &[&old]).await;
        let new = repo
            .replace_contributor(old.id.unwrap(), &Contributor::new("J. K. Rowling").unwrap())
            .await
            .unwrap();
        assert!(repo.get_contributor(old.id.unwrap()).await.unwrap().is_none());
        assert_eq!(new.contributions.len(), 1);
        assert_eq!(new.contributions[0].book_id, book.id.unwrap());
        let book = repo.get_book(book.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(book.credits()[0].contributor_id, new.id);
    }

    #[tokio::test]
    async fn test_replace_contributor_reseals_credited_books() {
        let repo = repo().await;
        let old = saved_contributor(&repo, "Robert Galbraith").await;
        let first = saved_book(&repo, "The Cuckoo's Calling", &[&old]).await;
        let second = saved_book(&repo, "The Silkworm", &[&old]).await;
        let new = repo
            .replace_contributor(old.id.unwrap(), &Contributor::new("J. K. Rowling").unwrap())
            .await
            .unwrap();
        for before in [&first, &second] {
            let reloaded = repo.get_book(before.id.unwrap()).await.unwrap().unwrap();
            assert_ne!(reloaded.sha256, before.sha256);
            assert_eq!(reloaded.credits()[0].sha256, new.sha256);
            let resealed = reloaded.clone().with_credits(reloaded.credits().to_vec());
            assert_eq!(reloaded.sha256, resealed.sha256);
        }
    }

    #[tokio::test]
    async fn test_replace_book_swaps_identity() {
        let repo = repo().await;
        let king = saved_contributor(&repo, "Stephen King").await;
        let old = saved_book(&repo, "The Gunslinger", &[&king]).await;
        let mut new = Book::new("The Drawing of the Three", BookFormat::Paperback).unwrap();
        new.push_credit(&king, ContributorRole::Author);
        let new = repo.replace_book(old.id.unwrap(), &new).await.unwrap();
        assert!(repo.get_book(old.id.unwrap()).await.unwrap().is_none());
        assert_ne!(new.sha256, old.sha256);
        let mut orphaned = Book::new("The Waste Lands", BookFormat::Paperback).unwrap();
        orphaned.push_credit(&king, ContributorRole::Author);
        let missing = repo.replace_book(778_899, &orphaned).await.unwrap_err();
        assert!(matches!(missing.deref(), ErrorKind::NotFound));
    }
}
