//! Explicit random keys.
//!
//! Every stochastic operation in this library takes a [`PrngKey`] instead of
//! touching a global generator. A key is meant to be used for exactly one draw
//! site: split it with [`PrngKey::split`] or [`PrngKey::split_n`] before handing
//! randomness to more than one consumer. Reusing a key does not fail, it
//! silently correlates the draws.
use rand::{rngs::StdRng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

// Mixed into the seed when deriving sub-keys, so that the sub-keys of `k` are
// not the values `k.rng()` itself would produce.
const SPLIT_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// A single-use random key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct PrngKey(u64);

impl PrngKey {
    /// Creates a key from a seed.
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw value of the key.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Derives two fresh keys.
    pub fn split(self) -> (Self, Self) {
        let mut rng = StdRng::seed_from_u64(self.0 ^ SPLIT_SALT);
        (Self(rng.next_u64()), Self(rng.next_u64()))
    }

    /// Derives `n` fresh keys.
    pub fn split_n(self, n: usize) -> Vec<Self> {
        let mut rng = StdRng::seed_from_u64(self.0 ^ SPLIT_SALT);
        (0..n).map(|_| Self(rng.next_u64())).collect()
    }

    /// Consumes the key and returns a generator for one draw site.
    pub fn rng(self) -> StdRng {
        StdRng::seed_from_u64(self.0)
    }
}

impl From<u64> for PrngKey {
    fn from(seed: u64) -> Self {
        Self::new(seed)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_split_is_deterministic() {
        let key = PrngKey::new(42);
        assert_eq!(key.split(), key.split());
        assert_eq!(key.split_n(3), key.split_n(3));

        let (k1, k2) = key.split();
        assert_ne!(k1, k2);
        assert_ne!(k1, key);
        assert_eq!(key.split_n(2), vec![k1, k2]);
    }

    #[test]
    fn test_rng_streams() {
        let key = PrngKey::new(7);
        let x1: u64 = key.rng().gen();
        let x2: u64 = key.rng().gen();
        assert_eq!(x1, x2);

        let (k1, _) = key.split();
        let y: u64 = k1.rng().gen();
        assert_ne!(x1, y);
    }
}
