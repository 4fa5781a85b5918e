//! Test support utilities for packager integration and behavioural tests.
//!
//! Provides a temporary data root with generated event files, and a helper
//! that flips one byte of a stored package entry while keeping the
//! container itself well formed.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs::{self, File};
use std::io::{Read, Write};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Temporary directory holding a `data/` source tree and an `out/` folder.
pub struct Sandbox {
    _dir: TempDir,
    pub data: Utf8PathBuf,
    pub out: Utf8PathBuf,
    pub restore: Utf8PathBuf,
}

impl Sandbox {
    /// Create an empty sandbox.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir");
        fs::create_dir_all(root.join("data")).expect("data dir");
        Self {
            data: root.join("data"),
            out: root.join("out"),
            restore: root.join("restore"),
            _dir: dir,
        }
    }

    /// Write `lines` JSON events to `data/<symbol>/<event_type>/<date>.jsonl`.
    pub fn add_events(&self, symbol: &str, event_type: &str, date: &str, lines: usize) -> Utf8PathBuf {
        let relative = format!("{symbol}/{event_type}/{date}.jsonl");
        let path = self.data.join(&relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        let mut file = File::create(&path).expect("create");
        for seq in 0..lines {
            writeln!(
                file,
                "{{\"timestamp\":\"{date}T14:30:{:02}Z\",\"symbol\":\"{symbol}\",\"price\":{}.25,\"size\":100,\"sequenceNumber\":{seq}}}",
                seq % 60,
                100 + seq
            )
            .expect("write event");
        }
        path
    }
}

/// Rewrite the zip at `package` with the first byte of `entry` flipped.
///
/// Every other entry, including `manifest.json`, is copied unchanged, so the
/// recorded checksum for `entry` no longer matches its contents.
pub fn corrupt_zip_entry(package: &Utf8Path, entry: &str) {
    let mut source = ZipArchive::new(File::open(package).expect("open")).expect("zip");
    let rewritten = package.with_extension("rewritten");
    let mut writer = ZipWriter::new(File::create(&rewritten).expect("create"));
    for index in 0..source.len() {
        let mut file = source.by_index(index).expect("entry");
        let name = file.name().to_owned();
        let mut body = Vec::new();
        file.read_to_end(&mut body).expect("read entry");
        if name == entry {
            let first = body.first_mut().expect("non-empty entry");
            *first ^= 0x01;
        }
        writer
            .start_file(name, SimpleFileOptions::default())
            .expect("start file");
        writer.write_all(&body).expect("write entry");
    }
    writer.finish().expect("finish");
    fs::rename(&rewritten, package).expect("replace package");
}
