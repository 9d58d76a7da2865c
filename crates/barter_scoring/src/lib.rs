//! # Barter Engine — Scoring
//!
//! The 18-metric Scorer (§4.7): a pure function from a [`model::LoopCandidate`]
//! to an 18-dimensional [`scorer::ScoreVector`] and weighted aggregate, plus
//! threshold filtering and tie-break ranking for the Active Loop Cache.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod dimension;
pub mod filter;
pub mod model;
pub mod scorer;

pub use dimension::ScoreDimension;
pub use filter::{compare_for_ranking, filter_and_rank, passes_threshold, ScoredLoop};
pub use model::{LoopCandidate, PreferenceHints, ScoringStep};
pub use scorer::{score, ScoreVector};
