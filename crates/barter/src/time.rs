//! Milliseconds-since-epoch helper shared by every facade operation that
//! stamps a mutation (mirrors `barter_concurrency::worker`'s own helper).

use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) fn current_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
