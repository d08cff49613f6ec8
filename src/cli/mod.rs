//! CLI command handlers.
//!
//! Each handler implements one subcommand and returns the process exit code;
//! `main.rs` only parses arguments, builds the configuration and exits.

mod canonicalize;
mod diff;
mod generate;
mod inspect;
mod validate;

pub use canonicalize::run_canonicalize;
pub use diff::run_diff;
pub use generate::run_generate;
pub use inspect::{run_inspect, InspectFormat};
pub use validate::{run_validate, ValidateFormat};
