use crate::entity::CatalogEntity;
use crate::error::{ErrorKind, Result};
use crate::{BookFormat, Contributor, ContributorRole};
use biblio_text::{book_fingerprint, title_case, title_ordering_key};
use serde::Serialize;

/// One credited contributor on a book, in attach order.
///
/// The contributor's content hash is carried alongside the id because the
/// book's own fingerprint is computed over it, and because a credit may be
/// built from a contributor that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credit {
    #[serde(rename = "id")]
    pub contributor_id: Option<i64>,
    #[serde(skip)]
    pub sha256: String,
    #[serde(rename = "type")]
    pub role: ContributorRole,
}

/// A catalogued book.
///
/// The `sha256` covers the normalized title *and* the ordered credit hashes,
/// so a book's identity changes when its contributor set changes. The credit
/// list is an explicitly ordered sequence; persisting that order is what
/// keeps the fingerprint deterministic.
#[derive(Debug, Clone, Serialize)]
pub struct Book {
    pub id: Option<i64>,
    pub sha256: String,
    pub title: String,
    pub cataloguing: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<i64>,
    pub format: BookFormat,
    #[serde(rename = "contributors")]
    credits: Vec<Credit>,
}

impl Book {
    /// Builds a book from a raw title and format, deriving the cased title,
    /// cataloguing key and (credit-less) content hash.
    pub fn new(raw_title: impl AsRef<str>, format: BookFormat) -> Result<Self> {
        let raw_title = raw_title.as_ref();
        if raw_title.trim().is_empty() {
            exn::bail!(ErrorKind::BlankText("title"));
        }
        let title = title_case(raw_title, false);
        Ok(Self {
            id: None,
            sha256: book_fingerprint(&title, std::iter::empty::<&str>()),
            cataloguing: title_ordering_key(raw_title),
            title,
            isbn: None,
            year: None,
            pages: None,
            format,
            credits: Vec::new(),
        })
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_isbn(mut self, isbn: impl Into<Option<String>>) -> Self {
        self.isbn = isbn.into();
        self
    }

    pub fn with_year(mut self, year: impl Into<Option<String>>) -> Self {
        self.year = year.into();
        self
    }

    pub fn with_pages(mut self, pages: impl Into<Option<i64>>) -> Self {
        self.pages = pages.into();
        self
    }

    /// Replaces the credit list wholesale and recomputes the fingerprint.
    ///
    /// For rebuilding a book whose associations changed outside
    /// [`push_credit`](Self::push_credit): a detach, a credit-list
    /// replacement, or a credited contributor changing identity.
    pub fn with_credits(mut self, credits: Vec<Credit>) -> Self {
        self.credits = credits;
        self.reseal();
        self
    }

    /// Appends a credit for `contributor` and recomputes the book's
    /// fingerprint. Idempotent: crediting a contributor already on the book
    /// (by content hash) changes nothing, not even the stored role.
    pub fn push_credit(&mut self, contributor: &Contributor, role: ContributorRole) {
        if self.credits.iter().any(|c| c.sha256 == contributor.sha256) {
            return;
        }
        self.credits.push(Credit {
            contributor_id: contributor.id,
            sha256: contributor.sha256.clone(),
            role,
        });
        self.reseal();
    }

    /// Rehydrates a persisted book verbatim, trusting the stored identity
    /// fields rather than re-deriving them. Store loads only.
    #[allow(clippy::too_many_arguments)]
    pub fn from_stored(
        id: i64,
        sha256: String,
        title: String,
        cataloguing: String,
        isbn: Option<String>,
        year: Option<String>,
        pages: Option<i64>,
        format: BookFormat,
        credits: Vec<Credit>,
    ) -> Self {
        Self { id: Some(id), sha256, title, cataloguing, isbn, year, pages, format, credits }
    }

    /// The ordered credit list.
    pub fn credits(&self) -> &[Credit] {
        &self.credits
    }

    fn reseal(&mut self) {
        self.sha256 = book_fingerprint(&self.title, self.credits.iter().map(|c| c.sha256.as_str()));
    }
}

impl CatalogEntity for Book {
    fn id(&self) -> Option<i64> {
        self.id
    }
    fn sha256(&self) -> &str {
        &self.sha256
    }
    fn cataloguing(&self) -> &str {
        &self.cataloguing
    }
}

impl PartialEq for Book {
    /// Identity is the content hash, nothing else.
    fn eq(&self, other: &Self) -> bool {
        self.sha256 == other.sha256
    }
}
impl Eq for Book {}
