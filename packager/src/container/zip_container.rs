//! Zip package backend.

use super::{ArchiveEntry, EntryVisitor, PackageReader, PackageWriter, deflate_level};
use crate::error::Result;
use crate::manifest::MANIFEST_ENTRY;
use crate::options::CompressionLevel;
use camino::Utf8Path;
use std::fs::File;
use std::io::{self, BufReader, Read};
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Entries at or above this size need Zip64 headers.
const ZIP64_THRESHOLD: u64 = 0xFFFF_FFFF;

fn entry_options(compression: CompressionLevel, size: u64) -> SimpleFileOptions {
    let options = match compression {
        CompressionLevel::None => {
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
        }
        level => SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(i64::from(deflate_level(level)))),
    };
    options.large_file(size >= ZIP64_THRESHOLD)
}

/// Writes a package as a standard Zip archive.
pub struct ZipPackageWriter {
    inner: ZipWriter<File>,
    compression: CompressionLevel,
}

impl ZipPackageWriter {
    /// Create (or truncate) the archive at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn create(path: &Utf8Path, compression: CompressionLevel) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            inner: ZipWriter::new(file),
            compression,
        })
    }
}

impl PackageWriter for ZipPackageWriter {
    fn write_manifest(&mut self, json: &[u8]) -> Result<()> {
        let size = u64::try_from(json.len()).unwrap_or(u64::MAX);
        let mut source = json;
        self.write_entry(MANIFEST_ENTRY, &mut source, size)?;
        Ok(())
    }

    fn write_entry(&mut self, path: &str, source: &mut dyn Read, size: u64) -> Result<u64> {
        self.inner
            .start_file(path, entry_options(self.compression, size))?;
        Ok(io::copy(source, &mut self.inner)?)
    }

    fn finish(self: Box<Self>) -> Result<()> {
        let Self { inner, .. } = *self;
        inner.finish()?;
        Ok(())
    }
}

/// Reads a Zip package.
pub struct ZipPackageReader {
    archive: ZipArchive<BufReader<File>>,
}

impl ZipPackageReader {
    /// Open the archive at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be opened, or a Zip error if
    /// it is not a readable archive.
    pub fn open(path: &Utf8Path) -> Result<Self> {
        let file = BufReader::new(File::open(path)?);
        Ok(Self {
            archive: ZipArchive::new(file)?,
        })
    }
}

impl PackageReader for ZipPackageReader {
    fn read_manifest(&mut self) -> Result<Option<Vec<u8>>> {
        let mut entry = match self.archive.by_name(MANIFEST_ENTRY) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        Ok(Some(bytes))
    }

    fn list_entries(&mut self) -> Result<Vec<ArchiveEntry>> {
        let mut entries = Vec::with_capacity(self.archive.len());
        for index in 0..self.archive.len() {
            let file = self.archive.by_index_raw(index)?;
            entries.push(ArchiveEntry {
                path: file.name().to_owned(),
                size: file.size(),
                is_dir: file.is_dir(),
            });
        }
        Ok(entries)
    }

    fn visit_entries(&mut self, visitor: &mut EntryVisitor<'_>) -> Result<()> {
        for index in 0..self.archive.len() {
            let mut file = self.archive.by_index(index)?;
            let entry = ArchiveEntry {
                path: file.name().to_owned(),
                size: file.size(),
                is_dir: file.is_dir(),
            };
            visitor(&entry, &mut file)?;
        }
        Ok(())
    }
}

/// Rewrite the archive with a new manifest, raw-copying every other entry.
pub(super) fn replace_manifest(
    path: &Utf8Path,
    json: &[u8],
    compression: CompressionLevel,
) -> Result<()> {
    let mut source = ZipArchive::new(BufReader::new(File::open(path)?))?;
    let dir = path.parent().filter(|p| !p.as_str().is_empty()).unwrap_or(Utf8Path::new("."));
    let temp = tempfile::NamedTempFile::new_in(dir)?;

    let mut writer = ZipWriter::new(temp.as_file().try_clone()?);
    writer.start_file(MANIFEST_ENTRY, entry_options(compression, u64::try_from(json.len()).unwrap_or(u64::MAX)))?;
    io::copy(&mut &*json, &mut writer)?;
    for index in 0..source.len() {
        let file = source.by_index_raw(index)?;
        if file.name() == MANIFEST_ENTRY {
            continue;
        }
        writer.raw_copy_file(file)?;
    }
    writer.finish()?;

    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
