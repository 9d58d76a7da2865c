//! # Score Dimensions
//!
//! The 18 metrics a candidate loop is scored on (§4.7), grouped into the
//! four families the specification names. Which exact 18 metrics are
//! authoritative was left an open question by the source maintainers; the
//! set below is this implementation's resolution of that question (see
//! `DESIGN.md`), chosen to cover every family the spec describes without
//! duplicating a signal across two dimensions.
//!
//! Discriminant order here **is** the order of `TenantConfig::score_weights`
//! — do not reorder variants without migrating every tenant's weight vector.

use barter_core::SCORE_DIMENSIONS;

/// One of the 18 scoring dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(usize)]
pub enum ScoreDimension {
    // --- Value fairness ---
    /// Average absolute value delta between consecutive steps (smaller is fairer).
    PerStepValueDelta = 0,
    /// Variance of each participant's net value delta (smaller is fairer).
    ValueVarianceAcrossParticipants = 1,
    /// Gap between the most- and least-favored participant's value delta.
    MaxMinValueGap = 2,
    /// Fraction of steps whose traded NFT carries a known valuation.
    ValuationConfidenceRatio = 3,
    /// Penalizes loops whose steps span more than one currency.
    CurrencyNormalizedTotal = 4,

    // --- Structural quality ---
    /// Shorter loops score higher (monotone in length).
    LoopLengthPreference = 5,
    /// Distinct-wallet count divided by length; 1.0 for every elementary cycle.
    ParticipantDiversity = 6,
    /// Average number of alternative NFTs available at each step.
    EdgeRedundancy = 7,
    /// Community cohesion score handed down from the SCC/community partitioner.
    CommunityCohesion = 8,

    // --- Liveness ---
    /// Recency of each participant's last graph mutation.
    ParticipantActivityRecency = 9,
    /// Recency of each traded NFT's valuation.
    ValuationFreshness = 10,
    /// Inverse of how long the loop's ownerships have gone unverified.
    OwnershipStaleness = 11,
    /// How close the loop's source generation is to the graph's current one.
    GenerationFreshness = 12,

    // --- Preference ---
    /// Fraction of steps satisfied by a specific (vs. collection) want.
    SpecificWantRatio = 13,
    /// Whether each step clears the receiving wallet's minimum trade value.
    MinTradeValuePreferenceMatch = 14,
    /// Whether the loop's length respects each wallet's max-participants hint.
    MaxParticipantsPreferenceMatch = 15,
    /// Confidence that each step's valuation matches the receiver's own estimate.
    ValuationConfidenceAlignment = 16,
    /// Historical completion reliability of the loop's participants.
    WalletReliabilityPrior = 17,
}

impl ScoreDimension {
    /// Every dimension, in discriminant (weight-vector) order.
    pub const ALL: [ScoreDimension; SCORE_DIMENSIONS] = [
        Self::PerStepValueDelta,
        Self::ValueVarianceAcrossParticipants,
        Self::MaxMinValueGap,
        Self::ValuationConfidenceRatio,
        Self::CurrencyNormalizedTotal,
        Self::LoopLengthPreference,
        Self::ParticipantDiversity,
        Self::EdgeRedundancy,
        Self::CommunityCohesion,
        Self::ParticipantActivityRecency,
        Self::ValuationFreshness,
        Self::OwnershipStaleness,
        Self::GenerationFreshness,
        Self::SpecificWantRatio,
        Self::MinTradeValuePreferenceMatch,
        Self::MaxParticipantsPreferenceMatch,
        Self::ValuationConfidenceAlignment,
        Self::WalletReliabilityPrior,
    ];

    /// This dimension's index into a weight vector / score vector.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}
