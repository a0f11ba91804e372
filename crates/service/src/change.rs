use std::sync::Mutex;
use uuid::Uuid;

/// The token pair a single rotation produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeUpdate {
    /// The token that was live before this mutation.
    pub before: String,
    /// The token that is live now.
    pub after: String,
}

/// The catalogue's change token: one opaque UUID that is swapped for a
/// fresh one after every successful mutation.
///
/// A client that remembers the token from its last read can compare it
/// against the current one to learn whether the catalogue has moved since.
/// The token carries no ordering and no history; equal means unchanged,
/// different means at least one mutation happened.
///
/// Explicitly constructed and injected into the service that owns it.
/// Racing rotations interleave arbitrarily, but every rotation issues a
/// distinct token and returns a coherent before/after pair.
#[derive(Debug)]
pub struct ChangeTracker {
    current: Mutex<String>,
}

impl Default for ChangeTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self { current: Mutex::new(Self::issue()) }
    }

    /// The live token.
    pub fn current(&self) -> String {
        self.lock().clone()
    }

    /// Atomically swaps in a fresh token, returning the retired one and its
    /// replacement.
    pub fn rotate(&self) -> ChangeUpdate {
        let mut guard = self.lock();
        let before = std::mem::replace(&mut *guard, Self::issue());
        ChangeUpdate { before, after: guard.clone() }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, String> {
        // A poisoned lock still holds a valid token.
        self.current.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn issue() -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_retires_the_live_token() {
        let tracker = ChangeTracker::new();
        let live = tracker.current();
        let update = tracker.rotate();
        assert_eq!(update.before, live);
        assert_ne!(update.after, update.before);
        assert_eq!(tracker.current(), update.after);
    }

    #[test]
    fn consecutive_rotations_chain() {
        let tracker = ChangeTracker::new();
        let first = tracker.rotate();
        let second = tracker.rotate();
        assert_eq!(second.before, first.after);
        assert_ne!(second.after, first.after);
    }

    #[test]
    fn tokens_parse_as_uuids() {
        let tracker = ChangeTracker::new();
        assert!(Uuid::parse_str(&tracker.current()).is_ok());
    }
}
