//! Checksum verification policy for packaged files.
//!
//! The policy is a value type: it decides whether a manifest entry is
//! checked at all, and turns a computed digest into an itemized
//! [`ValidationError`] when it disagrees with the recorded one. Hashing
//! itself happens where the bytes are, either while extracting or while
//! streaming container entries during validation.

use crate::manifest::PackageFileEntry;
use crate::result::ValidationError;
use crate::sha256_digest::Sha256Digest;
use std::fmt;

/// Whether packaged files are re-hashed against their manifest checksums.
///
/// # Examples
///
/// ```
/// use mdpack_packager::verification::VerificationPolicy;
///
/// let policy = VerificationPolicy::default();
/// assert!(policy.verify_checksums());
/// assert_eq!(policy.to_string(), "checksum verification required");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationPolicy {
    verify_checksums: bool,
}

impl VerificationPolicy {
    /// Policy that re-hashes files when `verify_checksums` is true.
    #[must_use]
    pub const fn new(verify_checksums: bool) -> Self {
        Self { verify_checksums }
    }

    /// Policy that never hashes.
    #[must_use]
    pub const fn disabled() -> Self {
        Self::new(false)
    }

    /// Return whether checksums are verified at all.
    #[must_use]
    pub const fn verify_checksums(&self) -> bool {
        self.verify_checksums
    }

    /// Return whether `entry` should be hashed under this policy.
    ///
    /// Entries stored without a checksum are never checked.
    #[must_use]
    pub fn applies_to(&self, entry: &PackageFileEntry) -> bool {
        self.verify_checksums && entry.has_checksum()
    }

    /// Compare `actual` with the checksum recorded for `entry`.
    ///
    /// Returns `None` when the policy does not apply or the digests agree.
    #[must_use]
    pub fn check(&self, entry: &PackageFileEntry, actual: &Sha256Digest) -> Option<ValidationError> {
        if !self.applies_to(entry) || actual.matches(&entry.checksum) {
            return None;
        }
        Some(ValidationError::checksum_mismatch(
            &entry.path,
            &entry.checksum,
            actual.as_str(),
        ))
    }
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self::new(true)
    }
}

impl fmt::Display for VerificationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.verify_checksums {
            write!(f, "checksum verification required")
        } else {
            write!(f, "checksum verification disabled")
        }
    }
}
