//! # Scoring Inputs
//!
//! The Scorer is a pure function: every fact it needs about a candidate
//! loop and the graph around it is gathered by the caller into a
//! [`LoopCandidate`] rather than the scorer reaching back into a
//! `GraphSnapshot` itself. This keeps the crate free of any lock or cache
//! dependency and makes scoring trivially unit-testable.

use std::collections::HashMap;

use barter_shared::{Generation, NftId, Valuation, WalletId};

/// Per-wallet trade preference hints (§4.7, Preference family).
#[derive(Clone, Debug, Default)]
pub struct PreferenceHints {
    /// The minimum value this wallet is willing to receive in a trade.
    pub min_trade_value: Option<Valuation>,
    /// The maximum loop length (participant count) this wallet accepts.
    pub max_participants: Option<usize>,
}

/// One step's inputs to scoring.
#[derive(Clone, Debug)]
pub struct ScoringStep {
    /// The wallet handing over the NFT.
    pub from: WalletId,
    /// The wallet receiving the NFT.
    pub to: WalletId,
    /// The NFT traded at this step.
    pub nft: NftId,
    /// The NFT's valuation, if known.
    pub valuation: Option<Valuation>,
    /// Age, in milliseconds, of the valuation (`None` if unvalued).
    pub valuation_age_ms: Option<u64>,
    /// Whether this step was satisfied by a specific want (`false` means a
    /// collection want resolved it).
    pub is_specific_want: bool,
    /// How many other NFTs the receiving wallet could have accepted at this
    /// step (§4.5, "edge multiplicity").
    pub alternative_count: usize,
    /// Milliseconds since the `from` wallet's last graph mutation.
    pub from_activity_age_ms: u64,
}

/// Everything the Scorer needs to produce one loop's 18-dimensional vector.
#[derive(Clone, Debug)]
pub struct LoopCandidate {
    /// The ordered steps making up the loop.
    pub steps: Vec<ScoringStep>,
    /// Cohesion score (0.0-1.0) handed down by the SCC/community
    /// partitioner; `1.0` when community refinement did not run.
    pub community_cohesion: f64,
    /// The generation the candidate was computed against.
    pub source_generation: Generation,
    /// The tenant's current generation at scoring time.
    pub current_generation: Generation,
    /// Per-wallet preference hints, where known.
    pub preference_hints: HashMap<WalletId, PreferenceHints>,
    /// Per-wallet historical completion reliability, in `[0.0, 1.0]`;
    /// absent wallets default to a neutral `0.5`.
    pub wallet_reliability: HashMap<WalletId, f64>,
}

impl LoopCandidate {
    /// The loop's length (number of steps / participants).
    #[must_use]
    pub fn length(&self) -> usize {
        self.steps.len()
    }

    /// Every distinct wallet participating in the loop (the `from` of each
    /// step; equivalently the `to` of the previous step).
    #[must_use]
    pub fn participants(&self) -> Vec<&WalletId> {
        self.steps.iter().map(|s| &s.from).collect()
    }

    pub(crate) fn reliability_of(&self, wallet: &WalletId) -> f64 {
        self.wallet_reliability.get(wallet).copied().unwrap_or(0.5)
    }

    pub(crate) fn hints_of(&self, wallet: &WalletId) -> PreferenceHints {
        self.preference_hints.get(wallet).cloned().unwrap_or_default()
    }
}
