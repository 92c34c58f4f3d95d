use std::collections::HashSet;

/// Number of recommendations kept per request
pub const TOP_N: usize = 20;

/// Drops already-rated ids and keeps the first `top_n` survivors in rank order.
pub fn filter_candidates(history_ids: &[i64], candidates: Vec<i64>, top_n: usize) -> Vec<i64> {
    let rated: HashSet<i64> = history_ids.iter().copied().collect();

    candidates
        .into_iter()
        .filter(|id| !rated.contains(id))
        .take(top_n)
        .collect()
}
