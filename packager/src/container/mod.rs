//! Package container backends.
//!
//! The container set is closed: [`PackageFormat::Zip`] is a standard Zip
//! archive and [`PackageFormat::TarGz`] is a package-internal delimiter
//! format inside a gzip stream (not readable by general tar tools).
//! [`PackageFormat::SevenZip`] is declared but has no backend; opening or
//! creating one fails with [`PackagerError::UnsupportedFormat`].
//!
//! Writers emit `manifest.json` first, then data files, then generated
//! artefacts. Readers expose the manifest bytes, an entry listing, and a
//! streaming visit over every entry.

mod tar_gz_container;
mod zip_container;

use crate::error::{PackagerError, Result};
use crate::options::{CompressionLevel, PackageFormat};
use camino::Utf8Path;
use std::io::Read;

pub use tar_gz_container::{TarGzPackageReader, TarGzPackageWriter};
pub use zip_container::{ZipPackageReader, ZipPackageWriter};

/// One entry as stored in a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// `/`-separated path inside the container.
    pub path: String,
    /// Uncompressed size in bytes.
    pub size: u64,
    /// Whether the entry is a directory marker.
    pub is_dir: bool,
}

/// Callback invoked for each entry with a reader over its contents.
pub type EntryVisitor<'a> = dyn FnMut(&ArchiveEntry, &mut dyn Read) -> Result<()> + 'a;

/// Sequential writer for a new package container.
pub trait PackageWriter {
    /// Write the `manifest.json` entry. Called before any other entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be written.
    fn write_manifest(&mut self, json: &[u8]) -> Result<()>;

    /// Copy `size` bytes from `source` into a new entry at `path`.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the source or writing the container
    /// fails.
    fn write_entry(&mut self, path: &str, source: &mut dyn Read, size: u64) -> Result<u64>;

    /// Flush and close the container.
    ///
    /// # Errors
    ///
    /// Returns an error if trailing structures cannot be written.
    fn finish(self: Box<Self>) -> Result<()>;
}

/// Reader over an existing package container.
pub trait PackageReader {
    /// Raw `manifest.json` bytes, or `None` when the entry is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be read.
    fn read_manifest(&mut self) -> Result<Option<Vec<u8>>>;

    /// Every entry in storage order.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be read.
    fn list_entries(&mut self) -> Result<Vec<ArchiveEntry>>;

    /// Stream every entry, in storage order, through `visitor`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the container or by `visitor`.
    fn visit_entries(&mut self, visitor: &mut EntryVisitor<'_>) -> Result<()>;
}

/// Infer the container format from a package file name.
///
/// Unknown extensions fall back to Zip.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use mdpack_packager::container::detect_format;
/// use mdpack_packager::options::PackageFormat;
///
/// assert_eq!(detect_format(Utf8Path::new("a.TGZ")), PackageFormat::TarGz);
/// assert_eq!(detect_format(Utf8Path::new("a.7z")), PackageFormat::SevenZip);
/// assert_eq!(detect_format(Utf8Path::new("a.bin")), PackageFormat::Zip);
/// ```
#[must_use]
pub fn detect_format(path: &Utf8Path) -> PackageFormat {
    let name = path.file_name().unwrap_or_default().to_ascii_lowercase();
    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        PackageFormat::TarGz
    } else if name.ends_with(".7z") {
        PackageFormat::SevenZip
    } else {
        PackageFormat::Zip
    }
}

/// Deflate level (0-9) for a compression setting.
#[must_use]
pub const fn deflate_level(level: CompressionLevel) -> u32 {
    match level {
        CompressionLevel::None => 0,
        CompressionLevel::Fast => 1,
        CompressionLevel::Balanced => 6,
        CompressionLevel::Maximum => 9,
    }
}

/// Create a writer for a new package at `path`, truncating any existing
/// file.
///
/// # Errors
///
/// Returns [`PackagerError::UnsupportedFormat`] for 7z, or an I/O error if
/// the file cannot be created.
pub fn create_writer(
    format: PackageFormat,
    path: &Utf8Path,
    compression: CompressionLevel,
) -> Result<Box<dyn PackageWriter>> {
    match format {
        PackageFormat::Zip => Ok(Box::new(ZipPackageWriter::create(path, compression)?)),
        PackageFormat::TarGz => Ok(Box::new(TarGzPackageWriter::create(path, compression)?)),
        PackageFormat::SevenZip => Err(PackagerError::UnsupportedFormat { format }),
    }
}

/// Open an existing package, detecting its format from the extension.
///
/// # Errors
///
/// Returns [`PackagerError::PackageNotFound`] when `path` does not exist,
/// [`PackagerError::UnsupportedFormat`] for 7z, or a container error when
/// the file cannot be opened.
pub fn open_reader(path: &Utf8Path) -> Result<Box<dyn PackageReader>> {
    if !path.is_file() {
        return Err(PackagerError::PackageNotFound {
            path: path.to_owned(),
        });
    }
    match detect_format(path) {
        PackageFormat::Zip => Ok(Box::new(ZipPackageReader::open(path)?)),
        PackageFormat::TarGz => Ok(Box::new(TarGzPackageReader::open(path))),
        format @ PackageFormat::SevenZip => Err(PackagerError::UnsupportedFormat { format }),
    }
}

/// Rewrite the `manifest.json` entry of a finished package in place.
///
/// Every other entry is copied unchanged. The rewritten container replaces
/// the original atomically.
///
/// # Errors
///
/// Returns an error if the package cannot be read or rewritten.
pub fn replace_manifest(
    format: PackageFormat,
    path: &Utf8Path,
    json: &[u8],
    compression: CompressionLevel,
) -> Result<()> {
    match format {
        PackageFormat::Zip => zip_container::replace_manifest(path, json, compression),
        PackageFormat::TarGz => tar_gz_container::replace_manifest(path, json, compression),
        PackageFormat::SevenZip => Err(PackagerError::UnsupportedFormat { format }),
    }
}
