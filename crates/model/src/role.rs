use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// How a person contributed to a book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContributorRole {
    Author,
    Illustrator,
    Editor,
    Translator,
    #[default]
    Undefined,
}

impl ContributorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContributorRole::Author => "AUTHOR",
            ContributorRole::Illustrator => "ILLUSTRATOR",
            ContributorRole::Editor => "EDITOR",
            ContributorRole::Translator => "TRANSLATOR",
            ContributorRole::Undefined => "UNDEFINED",
        }
    }
}

impl FromStr for ContributorRole {
    type Err = std::convert::Infallible;

    /// An unrecognized role is not an error; it degrades to [`Undefined`]
    /// so a credit is never dropped over a bad tag.
    ///
    /// [`Undefined`]: ContributorRole::Undefined
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "AUTHOR" => Self::Author,
            "ILLUSTRATOR" => Self::Illustrator,
            "EDITOR" => Self::Editor,
            "TRANSLATOR" => Self::Translator,
            _ => Self::Undefined,
        })
    }
}

impl Display for ContributorRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}
