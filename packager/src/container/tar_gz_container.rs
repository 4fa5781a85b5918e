//! Simplified Tar.Gz package backend.
//!
//! The decoded gzip stream is a sequence of text-delimited blocks:
//!
//! ```text
//! __MANIFEST__:{len}\n{json}\n__END_MANIFEST__\n
//! __FILE__:{len}:{path}\n{bytes}\n
//! ```
//!
//! The manifest block comes first. This layout is internal to packages and
//! is not compatible with tar tools.

use super::{ArchiveEntry, EntryVisitor, PackageReader, PackageWriter, deflate_level};
use crate::error::{PackagerError, Result};
use crate::manifest::MANIFEST_ENTRY;
use crate::options::{CompressionLevel, PackageFormat};
use camino::{Utf8Path, Utf8PathBuf};
use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};

const MANIFEST_MARKER: &str = "__MANIFEST__:";
const END_MANIFEST_MARKER: &str = "__END_MANIFEST__";
const FILE_MARKER: &str = "__FILE__:";

fn malformed(reason: impl Into<String>) -> PackagerError {
    PackagerError::MalformedContainer {
        format: PackageFormat::TarGz,
        reason: reason.into(),
    }
}

fn write_manifest_block(out: &mut impl Write, json: &[u8]) -> io::Result<()> {
    writeln!(out, "{MANIFEST_MARKER}{}", json.len())?;
    out.write_all(json)?;
    out.write_all(b"\n")?;
    writeln!(out, "{END_MANIFEST_MARKER}")
}

/// Copy exactly `size` bytes of `source` into a file block.
fn write_file_block(
    out: &mut impl Write,
    path: &str,
    source: &mut dyn Read,
    size: u64,
) -> Result<u64> {
    if path.contains('\n') {
        return Err(malformed(format!("entry path contains a newline: {path:?}")));
    }
    writeln!(out, "{FILE_MARKER}{size}:{path}")?;
    let copied = io::copy(&mut source.take(size), out)?;
    if copied != size {
        return Err(PackagerError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("{path}: expected {size} bytes, read {copied}"),
        )));
    }
    out.write_all(b"\n")?;
    Ok(copied)
}

/// Writes a package in the simplified Tar.Gz layout.
pub struct TarGzPackageWriter {
    encoder: GzEncoder<BufWriter<File>>,
}

impl TarGzPackageWriter {
    /// Create (or truncate) the package at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn create(path: &Utf8Path, compression: CompressionLevel) -> Result<Self> {
        let file = BufWriter::new(File::create(path)?);
        Ok(Self {
            encoder: GzEncoder::new(file, Compression::new(deflate_level(compression))),
        })
    }
}

impl PackageWriter for TarGzPackageWriter {
    fn write_manifest(&mut self, json: &[u8]) -> Result<()> {
        write_manifest_block(&mut self.encoder, json)?;
        Ok(())
    }

    fn write_entry(&mut self, path: &str, source: &mut dyn Read, size: u64) -> Result<u64> {
        write_file_block(&mut self.encoder, path, source, size)
    }

    fn finish(self: Box<Self>) -> Result<()> {
        let Self { encoder } = *self;
        let mut file = encoder.finish()?;
        file.flush()?;
        Ok(())
    }
}

/// One decoded block header.
enum Block {
    Manifest(Vec<u8>),
    File { path: String, size: u64 },
}

/// Sequential block parser over a decoded stream.
struct BlockStream<R: BufRead> {
    reader: R,
}

impl<R: BufRead> BlockStream<R> {
    /// Read the next block header. For manifests the body is consumed too;
    /// for files the caller must consume exactly `size` bytes and then call
    /// [`Self::finish_file`].
    fn next_block(&mut self) -> Result<Option<Block>> {
        let Some(header) = self.read_line()? else {
            return Ok(None);
        };
        if let Some(len_text) = header.strip_prefix(MANIFEST_MARKER) {
            let len = usize::try_from(parse_len(len_text)?)
                .map_err(|_| malformed("manifest too large"))?;
            let mut json = vec![0u8; len];
            self.reader
                .read_exact(&mut json)
                .map_err(|e| malformed(format!("truncated manifest block: {e}")))?;
            self.expect_newline()?;
            match self.read_line()? {
                Some(line) if line == END_MANIFEST_MARKER => Ok(Some(Block::Manifest(json))),
                _ => Err(malformed("missing end-of-manifest marker")),
            }
        } else if let Some(rest) = header.strip_prefix(FILE_MARKER) {
            let (len, path) = rest
                .split_once(':')
                .ok_or_else(|| malformed(format!("bad file header: {header}")))?;
            Ok(Some(Block::File {
                path: path.to_owned(),
                size: parse_len(len)?,
            }))
        } else {
            Err(malformed(format!("unexpected block header: {header}")))
        }
    }

    /// Consume the newline that terminates a file body.
    fn finish_file(&mut self) -> Result<()> {
        self.expect_newline()
    }

    /// Skip an unread file body and its terminator.
    fn skip_file(&mut self, size: u64) -> Result<()> {
        let skipped = io::copy(&mut (&mut self.reader).take(size), &mut io::sink())?;
        if skipped != size {
            return Err(malformed("truncated file block"));
        }
        self.finish_file()
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        line.strip_suffix('\n')
            .map(|trimmed| Some(trimmed.to_owned()))
            .ok_or_else(|| malformed("unterminated block header"))
    }

    fn expect_newline(&mut self) -> Result<()> {
        let mut byte = [0u8; 1];
        self.reader
            .read_exact(&mut byte)
            .map_err(|e| malformed(format!("missing block terminator: {e}")))?;
        if byte != *b"\n" {
            return Err(malformed("missing block terminator"));
        }
        Ok(())
    }
}

fn parse_len(text: &str) -> Result<u64> {
    text.trim()
        .parse()
        .map_err(|_| malformed(format!("bad length: {text:?}")))
}

fn open_stream(path: &Utf8Path) -> Result<BlockStream<BufReader<MultiGzDecoder<BufReader<File>>>>> {
    let file = BufReader::new(File::open(path)?);
    Ok(BlockStream {
        reader: BufReader::new(MultiGzDecoder::new(file)),
    })
}

/// Reads a simplified Tar.Gz package.
///
/// The gzip stream is not seekable, so each operation re-reads the file
/// from the start.
pub struct TarGzPackageReader {
    path: Utf8PathBuf,
}

impl TarGzPackageReader {
    /// Prepare a reader for `path`; the file is opened per operation.
    #[must_use]
    pub fn open(path: &Utf8Path) -> Self {
        Self {
            path: path.to_owned(),
        }
    }
}

impl PackageReader for TarGzPackageReader {
    fn read_manifest(&mut self) -> Result<Option<Vec<u8>>> {
        let mut stream = open_stream(&self.path)?;
        while let Some(block) = stream.next_block()? {
            match block {
                Block::Manifest(json) => return Ok(Some(json)),
                Block::File { size, .. } => stream.skip_file(size)?,
            }
        }
        Ok(None)
    }

    fn list_entries(&mut self) -> Result<Vec<ArchiveEntry>> {
        let mut stream = open_stream(&self.path)?;
        let mut entries = Vec::new();
        while let Some(block) = stream.next_block()? {
            match block {
                Block::Manifest(json) => entries.push(ArchiveEntry {
                    path: MANIFEST_ENTRY.to_owned(),
                    size: u64::try_from(json.len()).unwrap_or(u64::MAX),
                    is_dir: false,
                }),
                Block::File { path, size } => {
                    stream.skip_file(size)?;
                    entries.push(ArchiveEntry {
                        path,
                        size,
                        is_dir: false,
                    });
                }
            }
        }
        Ok(entries)
    }

    fn visit_entries(&mut self, visitor: &mut EntryVisitor<'_>) -> Result<()> {
        let mut stream = open_stream(&self.path)?;
        while let Some(block) = stream.next_block()? {
            match block {
                Block::Manifest(json) => {
                    let entry = ArchiveEntry {
                        path: MANIFEST_ENTRY.to_owned(),
                        size: u64::try_from(json.len()).unwrap_or(u64::MAX),
                        is_dir: false,
                    };
                    visitor(&entry, &mut json.as_slice())?;
                }
                Block::File { path, size } => {
                    let entry = ArchiveEntry {
                        path,
                        size,
                        is_dir: false,
                    };
                    let mut body = (&mut stream.reader).take(size);
                    visitor(&entry, &mut body)?;
                    let remaining = body.limit();
                    stream.skip_file(remaining)?;
                }
            }
        }
        Ok(())
    }
}

/// Re-encode the package with a new manifest block; file blocks are
/// copied unchanged.
pub(super) fn replace_manifest(
    path: &Utf8Path,
    json: &[u8],
    compression: CompressionLevel,
) -> Result<()> {
    let mut stream = open_stream(path)?;
    let dir = path
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let temp = tempfile::NamedTempFile::new_in(dir)?;

    let mut encoder = GzEncoder::new(
        BufWriter::new(temp.as_file().try_clone()?),
        Compression::new(deflate_level(compression)),
    );
    write_manifest_block(&mut encoder, json)?;
    while let Some(block) = stream.next_block()? {
        if let Block::File { path, size } = block {
            write_file_block(&mut encoder, &path, &mut (&mut stream.reader).take(size), size)?;
            stream.finish_file()?;
        }
    }
    encoder.finish()?.flush()?;

    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
