//! Stable marker identity for de-duplication across scans.

use sha2::{Digest, Sha256};

/// Compute the fingerprint of a marker.
///
/// Fields are separated by NUL so that e.g. `("a1", 2)` and `("a", 12)`
/// never hash the same input.
pub fn fingerprint(relative_path: &str, line_number: usize, marker_type: &str, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(relative_path.as_bytes());
    hasher.update([0u8]);
    hasher.update(line_number.to_string().as_bytes());
    hasher.update([0u8]);
    hasher.update(marker_type.as_bytes());
    hasher.update([0u8]);
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
