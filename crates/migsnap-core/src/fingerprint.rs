//! Content fingerprints over (unit, version) pair sets.
//!
//! A fingerprint identifies a set of migration pairs independently of how the
//! caller enumerated it. Snapshots and the live ledger are compared through
//! their fingerprints for equality and drift detection.
//!
//! ## Canonical form
//!
//! - pairs sorted by (unit, version), exact duplicates collapsed
//! - unit and version joined by U+001F
//! - pair tokens joined by U+001E
//! - SHA-256 over the UTF-8 bytes, lowercase hex (64 chars)

use crate::model::MigrationPair;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

const INNER_SEPARATOR: char = '\u{1f}';
const OUTER_SEPARATOR: char = '\u{1e}';

/// Fingerprint of the empty set (SHA-256 of zero bytes).
pub const EMPTY_FINGERPRINT: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Compute the fingerprint of an unordered collection of (unit, version) pairs.
///
/// ## Example
///
/// ```
/// use migsnap_core::fingerprint::fingerprint;
///
/// let a = fingerprint([("app1", "0001"), ("app2", "0002")]);
/// let b = fingerprint([("app2", "0002"), ("app1", "0001")]);
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// ```
pub fn fingerprint<I, U, V>(pairs: I) -> String
where
    I: IntoIterator<Item = (U, V)>,
    U: AsRef<str>,
    V: AsRef<str>,
{
    let canonical: BTreeSet<(String, String)> = pairs
        .into_iter()
        .map(|(u, v)| (u.as_ref().to_string(), v.as_ref().to_string()))
        .collect();

    let joined = canonical
        .iter()
        .map(|(unit, version)| format!("{}{}{}", unit, INNER_SEPARATOR, version))
        .collect::<Vec<_>>()
        .join(&OUTER_SEPARATOR.to_string());

    hash_string(&joined)
}

/// Fingerprint of a slice of `MigrationPair`s.
pub fn fingerprint_pairs(pairs: &[MigrationPair]) -> String {
    fingerprint(pairs.iter().map(|p| (p.unit.as_str(), p.version.as_str())))
}

fn hash_string(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
