//! # Duplicate Suppression Filter
//!
//! A task-local bloom filter over canonical identifiers (§4.5, §9: "never
//! shared across tenants"). Sized for a target false-positive rate at a
//! given expected cycle count, using `siphasher`-seeded hash functions (the
//! teacher's choice for seeded hashing in `oroboros_economy::loot`).

use std::hash::Hasher;

use siphasher::sip::SipHasher13;

/// Lower bound on the bit array size, so a filter sized for zero expected
/// items still behaves sanely.
const MIN_BITS: usize = 64;

/// A probabilistic set of canonical identifiers, used only within one
/// discovery task's lifetime.
pub struct DupFilter {
    bits: Vec<bool>,
    seeds: Vec<(u64, u64)>,
}

impl DupFilter {
    /// Builds a filter sized to hold `expected_items` with at most
    /// `false_positive_rate` probability of a false match (§4.5 requires
    /// `< 1e-6` at the configured capacity).
    #[must_use]
    pub fn with_capacity(expected_items: usize, false_positive_rate: f64) -> Self {
        let n = expected_items.max(1) as f64;
        let p = false_positive_rate.clamp(1e-12, 0.5);
        let ln2 = std::f64::consts::LN_2;

        let optimal_bits = (-(n * p.ln()) / (ln2 * ln2)).ceil() as usize;
        let num_bits = optimal_bits.max(MIN_BITS);
        let optimal_hashes = ((num_bits as f64 / n) * ln2).round() as usize;
        let num_hashes = optimal_hashes.clamp(1, 16);

        let seeds = (0..num_hashes).map(|i| (i as u64, !(i as u64))).collect();

        Self {
            bits: vec![false; num_bits],
            seeds,
        }
    }

    fn bit_index(&self, key: &str, seed: (u64, u64)) -> usize {
        let mut hasher = SipHasher13::new_with_keys(seed.0, seed.1);
        hasher.write(key.as_bytes());
        (hasher.finish() as usize) % self.bits.len()
    }

    /// Returns `true` if `key` was possibly already inserted (a hit may be a
    /// false positive; a miss is always a true negative), then inserts it.
    pub fn check_and_insert(&mut self, key: &str) -> bool {
        let indexes: Vec<usize> = self.seeds.iter().map(|&seed| self.bit_index(key, seed)).collect();
        let already_present = indexes.iter().all(|&i| self.bits[i]);
        for i in indexes {
            self.bits[i] = true;
        }
        already_present
    }

    /// Returns `true` if `key` is possibly present, without mutating the
    /// filter.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.seeds
            .iter()
            .all(|&seed| self.bits[self.bit_index(key, seed)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_insert_is_never_a_hit() {
        let mut filter = DupFilter::with_capacity(1000, 1e-6);
        assert!(!filter.check_and_insert("cid1:aaaa"));
    }

    #[test]
    fn repeated_key_is_detected() {
        let mut filter = DupFilter::with_capacity(1000, 1e-6);
        filter.check_and_insert("cid1:aaaa");
        assert!(filter.check_and_insert("cid1:aaaa"));
    }

    #[test]
    fn distinct_keys_usually_do_not_collide() {
        let mut filter = DupFilter::with_capacity(1000, 1e-6);
        let mut false_positives = 0;
        for i in 0..500 {
            let key = format!("cid1:{i}");
            if filter.check_and_insert(&key) {
                false_positives += 1;
            }
        }
        assert!(false_positives < 5, "unexpectedly high false-positive count: {false_positives}");
    }
}
