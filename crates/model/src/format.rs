use crate::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Physical format of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookFormat {
    Hardcover,
    Paperback,
    GraphicNovel,
}

impl BookFormat {
    /// The wire representation, identical to the serde form.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookFormat::Hardcover => "HARDCOVER",
            BookFormat::Paperback => "PAPERBACK",
            BookFormat::GraphicNovel => "GRAPHIC_NOVEL",
        }
    }
}

impl FromStr for BookFormat {
    type Err = Error;

    /// Unlike [`ContributorRole`](crate::ContributorRole), there is no
    /// sensible default format, so an unrecognized value is an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "HARDCOVER" => Self::Hardcover,
            "PAPERBACK" => Self::Paperback,
            "GRAPHIC_NOVEL" => Self::GraphicNovel,
            other => exn::bail!(ErrorKind::UnknownFormat(other.to_string())),
        })
    }
}

impl Display for BookFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("HARDCOVER", BookFormat::Hardcover)]
    #[case("PAPERBACK", BookFormat::Paperback)]
    #[case("GRAPHIC_NOVEL", BookFormat::GraphicNovel)]
    fn parses_known_formats(#[case] input: &str, #[case] expected: BookFormat) {
        assert_eq!(input.parse::<BookFormat>().unwrap(), expected);
    }

    #[rstest]
    #[case("hardcover")]
    #[case("AUDIOBOOK")]
    #[case("")]
    fn rejects_unknown_formats(#[case] input: &str) {
        assert!(input.parse::<BookFormat>().is_err());
    }

    #[test]
    fn round_trips_through_serde() {
        let json = serde_json::to_string(&BookFormat::GraphicNovel).unwrap();
        assert_eq!(json, r#""GRAPHIC_NOVEL""#);
    }
}
