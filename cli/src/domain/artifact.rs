//! Installer artifact descriptor, filename sanitisation and digest helpers.
//!
//! Pure functions only — no I/O, no async.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Characters allowed in a local artifact filename.
static UNSAFE_FILENAME_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    // Safety: this is a compile-time constant pattern — cannot fail.
    #[allow(clippy::expect_used)]
    Regex::new(r"[^A-Za-z0-9._-]").expect("valid regex")
});

/// Fallback filename when sanitisation leaves nothing usable.
pub const FALLBACK_ARTIFACT_NAME: &str = "installer.pkg";

/// Installer resolved from the vendor catalog. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    /// Vendor-supplied installer name.
    pub name: String,
    /// Hex-encoded SHA-256 of the installer; also the download key.
    pub sha256: String,
}

impl ArtifactDescriptor {
    /// Build a descriptor, rejecting empty names or hashes.
    ///
    /// Returns `None` when either field is blank so the caller can treat the
    /// catalog response as incomplete.
    #[must_use]
    pub fn new(name: &str, sha256: &str) -> Option<Self> {
        let name = name.trim();
        let sha256 = sha256.trim();
        if name.is_empty() || sha256.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            sha256: sha256.to_string(),
        })
    }

    /// Filename to use when writing this artifact to disk.
    #[must_use]
    pub fn local_filename(&self) -> String {
        sanitize_filename(&self.name)
    }
}

/// Turn a vendor-supplied name into a safe local filename.
///
/// Strips any path components, replaces characters outside
/// `[A-Za-z0-9._-]` with `_`, and trims trailing underscores and
/// whitespace. Names that collapse to nothing (or to dots only) fall back to
/// [`FALLBACK_ARTIFACT_NAME`].
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let replaced = UNSAFE_FILENAME_CHARS.replace_all(base, "_");
    let trimmed = replaced.trim_end_matches(|c: char| c == '_' || c.is_whitespace());
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        FALLBACK_ARTIFACT_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Lower-case hex encoding of a byte slice.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut acc, b| {
            let _ = write!(acc, "{b:02x}");
            acc
        })
}

/// Compare two hex digests, ignoring case and surrounding whitespace.
#[must_use]
pub fn digests_match(expected: &str, actual: &str) -> bool {
    let expected = expected.trim();
    let actual = actual.trim();
    !expected.is_empty() && expected.eq_ignore_ascii_case(actual)
}
