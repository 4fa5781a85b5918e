//! Python and R loader scripts.
//!
//! Both scripts read `manifest.json` at run time, so they stay valid if
//! files are filtered out after import. Only the header mentions the
//! package by name.

use crate::manifest::PackageManifest;

const PYTHON_BODY: &str = r#"import gzip
import io
import json
from pathlib import Path

import pandas as pd

PACKAGE_ROOT = Path(__file__).resolve().parent.parent


def load_manifest():
    with open(PACKAGE_ROOT / "manifest.json", encoding="utf-8") as handle:
        return json.load(handle)


def _open_text(path, compression):
    if compression == "gzip":
        return gzip.open(path, "rt", encoding="utf-8")
    if compression == "zstd":
        import zstandard

        raw = open(path, "rb")
        return io.TextIOWrapper(zstandard.ZstdDecompressor().stream_reader(raw), encoding="utf-8")
    return open(path, encoding="utf-8")


def read_entry(entry):
    path = PACKAGE_ROOT / entry["path"]
    fmt = entry.get("format", "jsonl")
    if fmt == "parquet":
        return pd.read_parquet(path)
    if fmt == "csv":
        return pd.read_csv(path)
    with _open_text(path, entry.get("compressionType")) as handle:
        return pd.read_json(handle, lines=True)


def load(symbol=None, event_type=None):
    """Load matching files into one DataFrame."""
    frames = []
    for entry in load_manifest()["files"]:
        if symbol and (entry.get("symbol") or "").upper() != symbol.upper():
            continue
        if event_type and (entry.get("eventType") or "").lower() != event_type.lower():
            continue
        frames.append(read_entry(entry))
    if not frames:
        return pd.DataFrame()
    return pd.concat(frames, ignore_index=True)


if __name__ == "__main__":
    manifest = load_manifest()
    print(f"{manifest['name']}: {manifest['totalFiles']} files")
    for event_type in manifest.get("eventTypes", []):
        frame = load(event_type=event_type)
        print(f"{event_type}: {len(frame)} rows")
"#;

const R_BODY: &str = r#"library(jsonlite)

script_dir <- function() {
  args <- commandArgs(trailingOnly = FALSE)
  file_arg <- grep("^--file=", args, value = TRUE)
  if (length(file_arg) == 0) {
    return(getwd())
  }
  dirname(normalizePath(sub("^--file=", "", file_arg)))
}

package_root <- normalizePath(file.path(script_dir(), ".."))

load_manifest <- function() {
  fromJSON(file.path(package_root, "manifest.json"), simplifyVector = FALSE)
}

read_entry <- function(entry) {
  path <- file.path(package_root, entry$path)
  fmt <- if (is.null(entry$format)) "jsonl" else entry$format
  if (fmt == "csv") {
    return(read.csv(path, stringsAsFactors = FALSE))
  }
  if (fmt == "parquet") {
    return(as.data.frame(arrow::read_parquet(path)))
  }
  if (identical(entry$compressionType, "zstd")) {
    stop("zstd-compressed files need to be decompressed first: ", path)
  }
  connection <- if (identical(entry$compressionType, "gzip")) gzfile(path) else file(path)
  stream_in(connection, verbose = FALSE)
}

load_data <- function(symbol = NULL, event_type = NULL) {
  frames <- list()
  for (entry in load_manifest()$files) {
    if (!is.null(symbol) && !identical(toupper(entry$symbol), toupper(symbol))) next
    if (!is.null(event_type) && !identical(tolower(entry$eventType), tolower(event_type))) next
    frames[[length(frames) + 1]] <- read_entry(entry)
  }
  if (length(frames) == 0) {
    return(data.frame())
  }
  do.call(rbind, frames)
}

if (sys.nframe() == 0) {
  manifest <- load_manifest()
  cat(sprintf("%s: %d files\n", manifest$name, manifest$totalFiles))
}
"#;

/// Render `scripts/load_data.py`.
#[must_use]
pub fn render_python_loader(manifest: &PackageManifest) -> String {
    format!(
        "#!/usr/bin/env python3\n\"\"\"Load market data from the {} package ({}).\"\"\"\n\n{PYTHON_BODY}",
        manifest.name.replace('"', "'"),
        manifest.package_id
    )
}

/// Render `scripts/load_data.R`.
#[must_use]
pub fn render_r_loader(manifest: &PackageManifest) -> String {
    format!(
        "# Load market data from the {} package ({}).\n\n{R_BODY}",
        manifest.name.replace('\n', " "),
        manifest.package_id
    )
}
