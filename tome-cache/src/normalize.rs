//! Key normalization policies.
//!
//! Every key that enters a cache record passes through the cache's
//! normalizer first, so lookups for "One Piece" and "  one   piece" land in
//! the same slot.

/// Maps a raw key to its canonical cache-key form.
///
/// Implementations must be total, deterministic, and idempotent:
/// `normalize(normalize(k)) == normalize(k)`.
pub trait KeyNormalizer<K>: Send + Sync {
    /// Returns the canonical form of `key`.
    fn normalize(&self, key: &K) -> K;
}

/// Case- and whitespace-folding normalizer for free-text names.
#[derive(Clone, Copy, Debug, Default)]
pub struct FoldedName;

impl KeyNormalizer<String> for FoldedName {
    fn normalize(&self, key: &String) -> String {
        normalize_name(key)
    }
}

/// Leaves keys untouched. Used for keys that are already canonical, such as
/// numeric ids.
#[derive(Clone, Copy, Debug, Default)]
pub struct Identity;

impl<K: Clone> KeyNormalizer<K> for Identity {
    fn normalize(&self, key: &K) -> K {
        key.clone()
    }
}

/// Lowercases `name`, trims it, and collapses whitespace runs to one space.
pub fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());

    for word in name.split_whitespace() {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.extend(word.chars().flat_map(char::to_lowercase));
    }

    normalized
}
