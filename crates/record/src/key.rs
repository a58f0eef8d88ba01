//! Internal key encoding: folds a database id into the key itself so the
//! memtable, WAL and SSTs can all operate over one flat keyspace rather than
//! juggling one instance per database.

/// Prefixes `key` with `db` as 4 big-endian bytes. Big-endian keeps keys
/// within the same database ordered the same way the raw key would sort,
/// while still partitioning distinct databases into disjoint, non-interleaved
/// ranges.
pub fn internal_key(db: u32, key: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + key.len());
    out.extend_from_slice(&db.to_be_bytes());
    out.extend_from_slice(key);
    out
}
