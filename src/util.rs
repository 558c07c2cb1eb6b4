use compact_str::CompactString;
use hashbrown::HashSet;

/// De-duplicate, keeping the first occurrence of each string and the original
/// order.
#[must_use]
pub fn dedup_strs(items: Vec<CompactString>) -> Vec<CompactString> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}
