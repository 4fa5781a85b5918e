//! Command-line front end for the mdpack packaging engine.
//!
//! The binary parses flags with [`cli`], layers them over `mdpack.toml`
//! loaded by [`config`], dispatches in [`app`], and renders results with
//! [`output`].

pub mod app;
pub mod cli;
pub mod config;
pub mod output;

pub use app::{AppError, Outcome, exit_code, run};
pub use cli::Cli;
pub use config::MdpackConfig;
