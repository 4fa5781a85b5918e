//! Portable market-data packaging and import engine.
//!
//! This crate turns a tree of collected event files into a self-describing,
//! checksummed package and reverses the process on import. It is used by
//! the `mdpack` CLI binary and can be embedded directly.
//!
//! # Modules
//!
//! - [`inference`] - Symbol, event type, date, and format inference from paths
//! - [`scanner`] - Data-root traversal and filtering
//! - [`estimate`] - Event-count and uncompressed-size estimates
//! - [`manifest`] - Manifest data model and aggregates
//! - [`manifest_builder`] - Per-file manifest entries and internal layouts
//! - [`manifest_parser`] - Manifest JSON parsing
//! - [`schema`] - Per-event-type field schemas
//! - [`supplementary`] - README, dictionary, scripts, and quality report
//! - [`container`] - Zip and Tar.Gz package backends
//! - [`packaging`] - Package creation pipeline
//! - [`extraction`] - Package import
//! - [`inspection`] - Manifest reading, validation, and listing
//! - [`verification`] - Checksum verification policy
//! - [`progress`] - Progress events and cancellation
//! - [`result`] - Operation outcomes
//! - [`options`] - Caller-facing options
//! - [`error`] - Error types
//! - [`sha256_digest`] - SHA-256 helpers

pub mod container;
pub mod error;
pub mod estimate;
pub mod extraction;
pub mod inference;
pub mod inspection;
pub mod manifest;
pub mod manifest_builder;
pub mod manifest_parser;
pub mod options;
pub mod packaging;
pub mod progress;
pub mod result;
pub mod scanner;
pub mod schema;
pub mod sha256_digest;
pub mod supplementary;
pub mod verification;

pub use error::{PackagerError, Result};
pub use extraction::import_package;
pub use inspection::{list_package_contents, read_manifest, validate_package};
pub use options::{ImportOptions, PackageOptions};
pub use packaging::create_package;
