//! # Canonicalizer
//!
//! Produces a rotation-invariant identifier for a candidate cycle (§4.6).
//! Two loops with identical participants and identical NFT assignments per
//! step always produce the same identifier, regardless of which wallet the
//! enumerator happened to start from.

use std::hash::Hasher;

use siphasher::sip::SipHasher13;

use barter_shared::{NftId, WalletId};

/// Schema tag prefixed to every canonical identifier, so the serialization
/// format can change without colliding with identifiers from an older build.
const SCHEMA_TAG: &str = "cid1";

/// Delimiter between a step's wallet and NFT, and between steps. Chosen to
/// never collide with caller-supplied identifiers (§4.6).
const STEP_DELIMITER: char = '|';
const SEQUENCE_DELIMITER: char = '\u{2192}'; // '→'

/// One step of a candidate cycle: `wallet` hands `nft` to the next
/// participant in the sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleStep {
    /// The wallet handing over `nft`.
    pub wallet: WalletId,
    /// The NFT handed over at this step.
    pub nft: NftId,
}

/// Computes the canonical identifier for an ordered cycle (§4.6).
///
/// # Panics
///
/// Panics if `steps` is empty; callers must never canonicalize a
/// zero-length cycle (the Cycle Enumerator never produces one).
#[must_use]
pub fn canonical_id(steps: &[CycleStep]) -> String {
    assert!(!steps.is_empty(), "cannot canonicalize an empty cycle");

    let k = steps.len();
    let best_serialization = (0..k)
        .map(|start| serialize_rotation(steps, start))
        .min()
        .expect("k > 0");

    let mut hasher = SipHasher13::new();
    hasher.write(best_serialization.as_bytes());
    let digest = hasher.finish();

    format!("{SCHEMA_TAG}:{digest:016x}")
}

fn serialize_rotation(steps: &[CycleStep], start: usize) -> String {
    let k = steps.len();
    (0..k)
        .map(|i| {
            let step = &steps[(start + i) % k];
            format!("{}{STEP_DELIMITER}{}", step.wallet, step.nft)
        })
        .collect::<Vec<_>>()
        .join(&SEQUENCE_DELIMITER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(wallet: &str, nft: &str) -> CycleStep {
        CycleStep {
            wallet: WalletId::new(wallet),
            nft: NftId::new(nft),
        }
    }

    #[test]
    fn rotation_invariant() {
        let original = vec![step("a", "alpha"), step("b", "beta"), step("c", "gamma")];
        let rotated = vec![step("b", "beta"), step("c", "gamma"), step("a", "alpha")];

        assert_eq!(canonical_id(&original), canonical_id(&rotated));
    }

    #[test]
    fn differing_nft_assignment_changes_identifier() {
        let a = vec![step("a", "alpha"), step("b", "beta"), step("c", "gamma")];
        let b = vec![step("a", "alpha2"), step("b", "beta"), step("c", "gamma")];

        assert_ne!(canonical_id(&a), canonical_id(&b));
    }

    #[test]
    fn identifier_carries_schema_tag() {
        let steps = vec![step("a", "alpha"), step("b", "beta")];
        assert!(canonical_id(&steps).starts_with("cid1:"));
    }

    #[test]
    #[should_panic(expected = "empty cycle")]
    fn panics_on_empty_cycle() {
        let _ = canonical_id(&[]);
    }
}
