//! Shared utilities.

mod hash;
mod path;
mod version;

pub use hash::{content_hash, deterministic_uuid, sha256_hex};
pub use path::absolute_path;
pub use version::{compare_versions, version_specificity, VersionDirection};
