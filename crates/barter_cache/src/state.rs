//! # Loop State Machine
//!
//! `pending -> in_progress -> {completed, cancelled}` (§4.8). The source
//! spec left the exact execution-transition authority unresolved (§9, Open
//! Questions); this implementation treats every transition as
//! external-collaborator-driven and additionally allows `in_progress ->
//! pending` so a failed execution attempt can be retried without
//! re-discovering the loop (documented in `DESIGN.md`).

/// A trade loop's lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum LoopStatus {
    /// Discovered and scored, not yet being executed.
    Pending,
    /// An external collaborator has begun executing the loop.
    InProgress,
    /// The loop executed successfully.
    Completed,
    /// The loop was abandoned: timeout, explicit cancel, or invalidation.
    Cancelled,
}

impl LoopStatus {
    /// Whether transitioning from `self` to `next` is permitted.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::InProgress)
                | (Self::Pending, Self::Cancelled)
                | (Self::InProgress, Self::Completed)
                | (Self::InProgress, Self::Cancelled)
                | (Self::InProgress, Self::Pending)
        )
    }

    /// Whether a loop in this status is eligible for compaction once past
    /// its retention window (see [`crate::cache::ActiveLoopCache::compact`]).
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}
