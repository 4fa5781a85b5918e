//! SHA-256 digests for package files and whole archives.
//!
//! [`Sha256Digest`] holds a validated 64-character lowercase hex string.
//! Manifest entries store the plain string form, because an empty string
//! there means "checksum not recorded".

use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use thiserror::Error;

/// Expected length of a hex-encoded SHA-256 digest.
const DIGEST_HEX_LEN: usize = 64;

/// Read buffer size used when hashing streams.
const HASH_BUFFER_LEN: usize = 64 * 1024;

/// A string that is not a valid hex-encoded SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid SHA-256 digest: {reason}")]
pub struct InvalidDigest {
    /// Description of the validation failure.
    pub reason: String,
}

/// A validated hex-encoded SHA-256 digest string.
///
/// # Examples
///
/// ```
/// use mdpack_packager::sha256_digest::Sha256Digest;
///
/// let hex = "a".repeat(64);
/// let digest = Sha256Digest::try_from(hex.as_str()).expect("valid digest");
/// assert_eq!(digest.as_str().len(), 64);
/// assert!(digest.matches(&"A".repeat(64)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Return the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Compare against a recorded digest string, ignoring case.
    #[must_use]
    pub fn matches(&self, recorded: &str) -> bool {
        self.0.eq_ignore_ascii_case(recorded.trim())
    }

    fn from_hasher(hasher: Sha256) -> Self {
        Self(format!("{:x}", hasher.finalize()))
    }
}

impl TryFrom<&str> for Sha256Digest {
    type Error = InvalidDigest;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        validate_sha256(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for Sha256Digest {
    type Error = InvalidDigest;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_sha256(&value)?;
        Ok(Self(value))
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate that `value` is a well-formed hex-encoded SHA-256 digest.
fn validate_sha256(value: &str) -> Result<(), InvalidDigest> {
    if value.len() != DIGEST_HEX_LEN {
        return Err(InvalidDigest {
            reason: format!(
                "expected {DIGEST_HEX_LEN} hex characters, got {}",
                value.len()
            ),
        });
    }
    if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(InvalidDigest {
            reason: format!("non-hex character '{bad}'"),
        });
    }
    if value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(InvalidDigest {
            reason: "digest must be lowercase".to_owned(),
        });
    }
    Ok(())
}

/// Hash everything readable from `reader`.
///
/// # Errors
///
/// Returns any I/O error raised while reading.
pub fn hash_reader(reader: &mut dyn Read) -> io::Result<Sha256Digest> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_BUFFER_LEN];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(buffer.get(..bytes_read).unwrap_or_default());
    }
    Ok(Sha256Digest::from_hasher(hasher))
}

/// Compute the SHA-256 digest of a file.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be opened or read.
pub fn compute_sha256(path: &Path) -> io::Result<Sha256Digest> {
    let mut file = fs::File::open(path)?;
    hash_reader(&mut file)
}

/// Write adapter that hashes every byte passed through to `inner`.
pub struct HashingWriter<W: Write> {
    inner: W,
    hasher: Sha256,
    bytes_written: u64,
}

impl<W: Write> HashingWriter<W> {
    /// Wrap `inner`.
    #[must_use]
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
            bytes_written: 0,
        }
    }

    /// Bytes forwarded so far.
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flush and return the inner writer with the digest of all bytes.
    ///
    /// # Errors
    ///
    /// Returns the flush error of the inner writer.
    pub fn finish(mut self) -> io::Result<(W, Sha256Digest)> {
        self.inner.flush()?;
        Ok((self.inner, Sha256Digest::from_hasher(self.hasher)))
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        let accepted = buf.get(..written).unwrap_or_default();
        self.hasher.update(accepted);
        self.bytes_written = self
            .bytes_written
            .saturating_add(u64::try_from(written).unwrap_or(u64::MAX));
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const EMPTY_SHA256: &str = concat!(
        "e3b0c44298fc1c149afbf4c8996fb924",
        "27ae41e4649b934ca495991b7852b855"
    );

    #[test]
    fn hashes_known_content() {
        let digest = hash_reader(&mut &b""[..]).expect("hash");
        assert_eq!(digest.as_str(), EMPTY_SHA256);
    }

    #[test]
    fn compute_sha256_reads_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("empty.bin");
        fs::write(&path, b"").expect("write");
        assert_eq!(compute_sha256(&path).expect("sha").as_str(), EMPTY_SHA256);
    }

    #[test]
    fn hashing_writer_matches_hash_reader() {
        let payload = b"{\"price\":1.0}\n{\"price\":2.0}\n";
        let mut writer = HashingWriter::new(Vec::new());
        writer.write_all(payload).expect("write");
        assert_eq!(writer.bytes_written(), payload.len() as u64);
        let (inner, digest) = writer.finish().expect("finish");
        assert_eq!(inner, payload.to_vec());
        assert_eq!(digest, hash_reader(&mut &payload[..]).expect("hash"));
    }

    #[rstest]
    #[case::too_short("abcdef")]
    #[case::non_hex(&format!("{}g", "a".repeat(63)))]
    #[case::uppercase(&"A".repeat(64))]
    fn rejects_malformed_digests(#[case] value: &str) {
        assert!(Sha256Digest::try_from(value).is_err());
    }

    #[test]
    fn matches_ignores_case_and_whitespace() {
        let digest = Sha256Digest::try_from(EMPTY_SHA256).expect("valid");
        assert!(digest.matches(&format!(" {} ", EMPTY_SHA256.to_uppercase())));
        assert!(!digest.matches(""));
    }
}
