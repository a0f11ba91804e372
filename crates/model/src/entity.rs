/// Common surface of a catalogue record.
///
/// Both entity types expose the same identity triple without sharing a base
/// struct: an id assigned by the store, a unique content hash, and a
/// non-unique cataloguing key.
pub trait CatalogEntity {
    /// Store-assigned id, `None` until persisted.
    fn id(&self) -> Option<i64>;
    /// Uppercase-hex SHA-256 over the entity's normalized text; the
    /// uniqueness key for its type.
    fn sha256(&self) -> &str;
    /// Normalized, article/honorific-stripped key used for alphabetical
    /// ordering. Collisions between distinct entities are expected.
    fn cataloguing(&self) -> &str;
}
