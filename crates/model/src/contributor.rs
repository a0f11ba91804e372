use crate::ContributorRole;
use crate::entity::CatalogEntity;
use crate::error::{ErrorKind, Result};
use biblio_text::{fingerprint, person_ordering_key, title_case};
use serde::Serialize;

/// One book a contributor is credited on, tagged with their role in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Contribution {
    #[serde(rename = "id")]
    pub book_id: i64,
    #[serde(rename = "type")]
    pub role: ContributorRole,
}

/// A person who contributed to one or more books.
///
/// The display name is title-cased with acronym-flattening (`force_lower`),
/// since an all-caps author name on a dust jacket is styling, not an
/// acronym. Two contributors may share a `cataloguing` key; only `sha256`
/// identifies them.
///
/// A contributor with an empty contribution list is an orphan and is not
/// retained by the service, except at creation time: a brand-new contributor
/// may hold zero contributions until it is attached to a book.
#[derive(Debug, Clone, Serialize)]
pub struct Contributor {
    pub id: Option<i64>,
    pub sha256: String,
    pub name: String,
    pub cataloguing: String,
    pub contributions: Vec<Contribution>,
}

impl Contributor {
    /// Builds a contributor from a raw display name, deriving the cased
    /// name, cataloguing key and content hash.
    pub fn new(raw_name: impl AsRef<str>) -> Result<Self> {
        let raw_name = raw_name.as_ref();
        if raw_name.trim().is_empty() {
            exn::bail!(ErrorKind::BlankText("name"));
        }
        let name = title_case(raw_name, true);
        Ok(Self {
            id: None,
            sha256: fingerprint(&name),
            cataloguing: person_ordering_key(raw_name),
            name,
            contributions: Vec::new(),
        })
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Whether this contributor has no remaining book associations.
    pub fn is_orphan(&self) -> bool {
        self.contributions.is_empty()
    }
}

impl CatalogEntity for Contributor {
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

impl PartialEq for Contributor {
    /// Identity is the content hash, nothing else.
    fn eq(&self, other: &Self) -> bool {
        self.sha256 == other.sha256
    }
}
impl Eq for Contributor {}
