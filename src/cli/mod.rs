//! CLI argument parsing and batch input.

mod args;
mod batch;

pub use args::Args;
pub use batch::{BatchParseError, parse_batch, parse_line, read_batch};
