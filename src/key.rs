//! Hash-plus-checksum cache keys.
//!
//! The cache facade turns an arbitrary lookup request (method, arguments,
//! namespace) into a compact, stable key before it reaches the engine. A bare
//! 64-bit hash is not enough: two different requests may collide, and the
//! engine would then treat them as the same entry. [`HashCodeKey`] therefore
//! carries two independently computed digests; equality requires both to
//! match, which makes an undetected collision require a simultaneous collision
//! in two unrelated hash functions.
//!
//! The `hash` half doubles as the engine's routing hash (it is what
//! `Hash for HashCodeKey` emits), so a facade using [`HashCodeKeyGenerator`]
//! pays for hashing the source material once per request.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;

/// Compact cache key: a routing hash plus an independent checksum.
///
/// Two keys are equal only if both halves are equal. Hashing a `HashCodeKey`
/// emits the `hash` half verbatim, so bucket placement is stable no matter
/// which hasher the consuming table uses on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCodeKey {
    hash: u64,
    checksum: u64,
}

impl HashCodeKey {
    /// Reassembles a key from its two halves.
    ///
    /// Intended for facades that persist or transmit keys, and for tests that
    /// need keys with a chosen routing hash.
    pub fn from_parts(hash: u64, checksum: u64) -> Self {
        Self { hash, checksum }
    }

    /// Returns the routing-hash half.
    pub fn hash_value(&self) -> u64 {
        self.hash
    }

    /// Returns the checksum half.
    pub fn checksum(&self) -> u64 {
        self.checksum
    }
}

impl Hash for HashCodeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Display for HashCodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.hash, self.checksum)
    }
}

/// Produces [`HashCodeKey`]s from any `Hash`able source.
///
/// The routing hash comes from `FxHasher`; the checksum from a seeded
/// `DefaultHasher` (SipHash), so the two halves never share an algorithm.
/// Generators with different seeds produce different checksums for the same
/// source, which lets independent facades partition a shared key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCodeKeyGenerator {
    seed: u64,
}

impl HashCodeKeyGenerator {
    /// Creates a generator with the given checksum seed.
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Generates the key for `source`.
    ///
    /// Deterministic: the same source and seed always yield the same key.
    pub fn generate<T: Hash + ?Sized>(&self, source: &T) -> HashCodeKey {
        let mut hasher = FxHasher::default();
        source.hash(&mut hasher);
        let hash = hasher.finish();

        let mut checksummer = DefaultHasher::new();
        self.seed.hash(&mut checksummer);
        source.hash(&mut checksummer);
        let checksum = checksummer.finish();

        HashCodeKey { hash, checksum }
    }
}

impl Default for HashCodeKeyGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_sources_generate_equal_keys() {
        let generator = HashCodeKeyGenerator::default();
        let a = generator.generate("user:123");
        let b = generator.generate("user:123");
        assert_eq!(a, b);
        assert_eq!(a.hash_value(), b.hash_value());
        assert_eq!(a.checksum(), b.checksum());
    }

    #[test]
    fn different_sources_generate_different_keys() {
        let generator = HashCodeKeyGenerator::default();
        let a = generator.generate("user:123");
        let b = generator.generate("user:124");
        assert_ne!(a, b);
    }

    #[test]
    fn seed_isolates_checksums() {
        let a = HashCodeKeyGenerator::new(1).generate(&42_u64);
        let b = HashCodeKeyGenerator::new(2).generate(&42_u64);
        // same routing hash, different checksum: not equal
        assert_eq!(a.hash_value(), b.hash_value());
        assert_ne!(a.checksum(), b.checksum());
        assert_ne!(a, b);
    }

    #[test]
    fn matching_hash_alone_is_not_equality() {
        let a = HashCodeKey::from_parts(7, 100);
        let b = HashCodeKey::from_parts(7, 200);
        assert_ne!(a, b);

        // both halves equal
        let c = HashCodeKey::from_parts(7, 100);
        assert_eq!(a, c);
    }

    #[test]
    fn key_hashes_as_its_routing_half() {
        let key = HashCodeKey::from_parts(0xDEAD_BEEF, 9);
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let mut direct = DefaultHasher::new();
        direct.write_u64(0xDEAD_BEEF);
        assert_eq!(hasher.finish(), direct.finish());
    }

    #[test]
    fn display_shows_both_halves() {
        let key = HashCodeKey::from_parts(12, 34);
        assert_eq!(key.to_string(), "12|34");
    }
}
