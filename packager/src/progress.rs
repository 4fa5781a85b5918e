//! Stage-based progress reporting and cooperative cancellation.
//!
//! Progress is pushed synchronously into a [`ProgressSink`] on the calling
//! thread, once per discrete unit of work (a file or an archive entry).
//! Sinks must return quickly. Any `FnMut(&PackageProgress)` closure is a
//! sink.

use crate::error::{PackagerError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Phase of a packaging or import operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageStage {
    /// Options are being checked and the output prepared.
    Initializing,
    /// The data root is being walked.
    Scanning,
    /// Checksums and event estimates are being gathered.
    GeneratingManifest,
    /// Entries are being written to the container.
    Writing,
    /// The archive digest is being computed and embedded.
    ComputingChecksums,
    /// A package is being checked against its manifest.
    Validating,
    /// Entries are being extracted to the destination.
    Extracting,
    /// The operation finished.
    Complete,
    /// The operation failed with an unexpected error.
    Failed,
}

/// Counters attached to a progress event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageProgress {
    /// Current phase.
    pub stage: PackageStage,
    /// Files handled so far in this phase.
    pub files_processed: usize,
    /// Files expected in this phase; zero when unknown.
    pub total_files: usize,
    /// Bytes handled so far in this phase.
    pub bytes_processed: u64,
    /// Bytes expected in this phase; zero when unknown.
    pub total_bytes: u64,
    /// Path of the file being handled, if any.
    pub current_file: Option<String>,
}

impl PackageProgress {
    /// A progress event with no counters set.
    #[must_use]
    pub const fn stage(stage: PackageStage) -> Self {
        Self {
            stage,
            files_processed: 0,
            total_files: 0,
            bytes_processed: 0,
            total_bytes: 0,
            current_file: None,
        }
    }

    /// A per-file progress event.
    #[must_use]
    pub fn file(
        stage: PackageStage,
        files_processed: usize,
        total_files: usize,
        current_file: &str,
    ) -> Self {
        Self {
            files_processed,
            total_files,
            current_file: Some(current_file.to_owned()),
            ..Self::stage(stage)
        }
    }

    /// Attach byte counters.
    #[must_use]
    pub const fn with_bytes(mut self, bytes_processed: u64, total_bytes: u64) -> Self {
        self.bytes_processed = bytes_processed;
        self.total_bytes = total_bytes;
        self
    }

    /// Whole-number completion percentage of the current phase.
    ///
    /// # Examples
    ///
    /// ```
    /// use mdpack_packager::progress::{PackageProgress, PackageStage};
    ///
    /// let progress = PackageProgress::file(PackageStage::Writing, 1, 4, "data/a.jsonl");
    /// assert_eq!(progress.percent(), 25);
    /// assert_eq!(PackageProgress::stage(PackageStage::Scanning).percent(), 0);
    /// ```
    #[must_use]
    pub fn percent(&self) -> u8 {
        self.files_processed
            .saturating_mul(100)
            .checked_div(self.total_files)
            .map_or(0, |pct| u8::try_from(pct.min(100)).unwrap_or(100))
    }
}

/// Receiver for progress events.
#[cfg_attr(test, mockall::automock)]
pub trait ProgressSink {
    /// Handle one progress event.
    fn report(&mut self, progress: &PackageProgress);
}

impl<F> ProgressSink for F
where
    F: FnMut(&PackageProgress),
{
    fn report(&mut self, progress: &PackageProgress) {
        self(progress);
    }
}

/// A sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _progress: &PackageProgress) {}
}

/// Shared flag used to request cooperative cancellation.
///
/// Clones observe the same flag, so a caller can keep one handle and pass
/// another into a long-running operation.
///
/// # Examples
///
/// ```
/// use mdpack_packager::progress::CancellationFlag;
///
/// let flag = CancellationFlag::new();
/// let handle = flag.clone();
/// handle.cancel();
/// assert!(flag.is_cancelled());
/// assert!(flag.check().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Create a flag in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Return [`PackagerError::Cancelled`] if cancellation was requested.
    ///
    /// # Errors
    ///
    /// Fails with [`PackagerError::Cancelled`] after [`Self::cancel`].
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(PackagerError::Cancelled);
        }
        Ok(())
    }
}
