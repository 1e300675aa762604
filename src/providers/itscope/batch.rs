//! Splitting identifier lists into bounded search queries

use std::num::NonZeroUsize;

/// Default number of identifiers per search query
pub const DEFAULT_BATCH_LENGTH: NonZeroUsize = match NonZeroUsize::new(50) {
    Some(length) => length,
    None => unreachable!(),
};

/// Split `ids` into groups of at most `length` identifiers
///
/// Groups are taken left to right, so only the last group may be shorter.
/// An empty list yields no groups.
pub fn query_groups(ids: &[String], length: NonZeroUsize) -> Vec<&[String]> {
    ids.chunks(length.get()).collect()
}

/// Render one group as an `id=a;id=b` search query
pub fn id_query(group: &[String]) -> String {
    group
        .iter()
        .map(|id| format!("id={}", id))
        .collect::<Vec<_>>()
        .join(";")
}

/// Search queries covering every identifier in `ids`
pub fn build_id_queries(ids: &[String], length: NonZeroUsize) -> Vec<String> {
    query_groups(ids, length)
        .into_iter()
        .map(id_query)
        .collect()
}

/// Single-SKU search query
pub fn sku_query(sku: &str) -> String {
    format!("distpid={}", sku)
}
