//! Frequency ranking over a key extractor.

use std::collections::HashMap;
use std::hash::Hash;

/// Counts keys and returns the `limit` most frequent, highest count first.
///
/// Equal counts keep first-seen order.
pub fn top_n<T, K, F>(items: impl IntoIterator<Item = T>, key: F, limit: usize) -> Vec<(K, usize)>
where
    K: Eq + Hash + Clone,
    F: Fn(T) -> K,
{
    let mut ranked: Vec<(K, usize)> = Vec::new();
    let mut index: HashMap<K, usize> = HashMap::new();

    for item in items {
        let k = key(item);
        if let Some(&i) = index.get(&k) {
            ranked[i].1 += 1;
        } else {
            index.insert(k.clone(), ranked.len());
            ranked.push((k, 1));
        }
    }

    // sort_by is stable, so ties stay in first-seen order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(limit);
    ranked
}
