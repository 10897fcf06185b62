//! Page-state fingerprinting.
//!
//! A fingerprint is a coarse digest of a session's observable page
//! identity: URL, title, and a minute-resolution time bucket. The bucket
//! makes repeated reads within a short window fingerprint identically
//! while guaranteeing the fingerprint rotates over time even with zero
//! navigation. That rotation deliberately biases toward cache misses
//! over staleness; the bucket width is a tunable, not a precision bound.

use chrono::Utc;
use sha2::{Digest, Sha256};

/// Fingerprint time-bucket width in seconds.
const BUCKET_SECS: i64 = 60;

/// Truncated digest length, matching command hashes.
const FINGERPRINT_LEN: usize = 16;

/// Fingerprint of the current page identity at the current wall-clock
/// bucket.
pub fn page_fingerprint(url: &str, title: &str) -> String {
    fingerprint_with_bucket(url, title, current_bucket())
}

pub(crate) fn current_bucket() -> i64 {
    Utc::now().timestamp() / BUCKET_SECS
}

pub(crate) fn fingerprint_with_bucket(url: &str, title: &str, bucket: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update([0u8]);
    hasher.update(title.as_bytes());
    hasher.update([0u8]);
    hasher.update(bucket.to_le_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..FINGERPRINT_LEN].to_string()
}
