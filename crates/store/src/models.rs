//! Row types mapping between SQLite and the entity model.

use crate::error::{Error, ErrorKind};
use biblio_model::{Book, BookFormat, Contribution, Contributor, ContributorRole, Credit};
use exn::ResultExt;

#[derive(sqlx::FromRow)]
pub(crate) struct BookRow {
    pub(crate) id: i64,
    pub(crate) sha256: String,
    pub(crate) title: String,
    pub(crate) cataloguing: String,
    pub(crate) isbn: Option<String>,
    pub(crate) year: Option<String>,
    pub(crate) pages: Option<i64>,
    pub(crate) format: String,
}

impl BookRow {
    /// Rehydrates the model with its stored credit rows (already in attach
    /// order).
    pub(crate) fn into_book(self, credits: Vec<CreditRow>) -> Result<Book, Error> {
        let format = self.format.parse::<BookFormat>().or_raise(|| ErrorKind::InvalidData("book format"))?;
        let credits = credits.into_iter().map(CreditRow::into_credit).collect();
        Ok(Book::from_stored(
            self.id,
            self.sha256,
            self.title,
            self.cataloguing,
            self.isbn,
            self.year,
            self.pages,
            format,
            credits,
        ))
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ContributorRow {
    pub(crate) id: i64,
    pub(crate) sha256: String,
    pub(crate) name: String,
    pub(crate) cataloguing: String,
}

impl ContributorRow {
    pub(crate) fn into_contributor(self, contributions: Vec<ContributionRow>) -> Contributor {
        Contributor {
            id: Some(self.id),
            sha256: self.sha256,
            name: self.name,
            cataloguing: self.cataloguing,
            contributions: contributions.into_iter().map(ContributionRow::into_contribution).collect(),
        }
    }
}

/// A credit join row as seen from the book side, carrying the contributor's
/// content hash so the book fingerprint can be recomputed without another
/// lookup.
#[derive(sqlx::FromRow)]
pub(crate) struct CreditRow {
    pub(crate) book_id: i64,
    pub(crate) contributor_id: i64,
    pub(crate) sha256: String,
    pub(crate) r#type: String,
}

impl CreditRow {
    pub(crate) fn into_credit(self) -> Credit {
        Credit {
            contributor_id: Some(self.contributor_id),
            sha256: self.sha256,
            // Role parsing is infallible; unknown tags degrade to Undefined.
            role: self.r#type.parse::<ContributorRole>().unwrap_or_default(),
        }
    }
}

/// A credit join row as seen from the contributor side.
#[derive(sqlx::FromRow)]
pub(crate) struct ContributionRow {
    pub(crate) book_id: i64,
    pub(crate) r#type: String,
}

impl ContributionRow {
    pub(crate) fn into_contribution(self) -> Contribution {
        Contribution {
            book_id: self.book_id,
            // Role parsing is infallible; unknown tags degrade to Undefined.
            role: self.r#type.parse::<ContributorRole>().unwrap_or_default(),
        }
    }
}
