//! Text normalization and content fingerprints.
//!
//! Everything the catalogue knows about identity and about alphabetical
//! ordering is derived here, from pure string transforms:
//! - **Normalization** reduces text to a canonical `[a-z0-9 ]` form.
//! - **Cataloguing keys** are normalized strings with articles/honorifics
//!   stripped, used for shelf ordering. They are *not* unique.
//! - **Fingerprints** are SHA-256 digests over the normalized form, used as
//!   the uniqueness key for catalogue entities.
//!
//! The content hash is always taken over the normalized form, never over the
//! raw or display-cased text, so `"Stephen King"`, `"STEPHEN KING"` and
//! `"stephen king"` all share one identity.

mod fingerprint;
mod normalize;
mod roman;

pub use crate::fingerprint::{book_fingerprint, fingerprint};
pub use crate::normalize::{normalize, person_ordering_key, title_case, title_ordering_key};
pub use crate::roman::is_roman_numeral;
