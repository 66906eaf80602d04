//! Branch-pair scheduling: enumerates unordered pairs and, for worker-pool
//! runs, partitions them round-robin across threads while deduping
//! symmetric pairs so the same unordered relation is never assigned twice.

use std::collections::HashSet;

/// Every unordered pair of distinct branches, in a fixed deterministic
/// order (outer loop over branches, inner loop over the remaining ones).
pub fn unordered_pairs(branches: &[String]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for i in 0..branches.len() {
        for j in (i + 1)..branches.len() {
            pairs.push((branches[i].clone(), branches[j].clone()));
        }
    }
    pairs
}

/// Splits `pairs` round-robin into `thread_count` buckets, returning only
/// the non-empty ones. A pair's reverse encoding is tracked in
/// `visited_combinations` style so the same unordered pair is never
/// assigned to two different buckets.
pub fn partition_pairs(pairs: &[(String, String)], thread_count: usize) -> Vec<Vec<(String, String)>> {
    let thread_count = thread_count.max(1);
    let mut buckets: Vec<Vec<(String, String)>> = vec![Vec::new(); thread_count];
    let mut visited_combinations: HashSet<String> = HashSet::new();
    let mut next_bucket = 0;

    for (a, b) in pairs {
        let forward = format!("{a}~{b}");
        let backward = format!("{b}~{a}");
        if visited_combinations.contains(&forward) || visited_combinations.contains(&backward) {
            continue;
        }
        visited_combinations.insert(forward);
        buckets[next_bucket % thread_count].push((a.clone(), b.clone()));
        next_bucket += 1;
    }

    buckets.into_iter().filter(|bucket| !bucket.is_empty()).collect()
}
