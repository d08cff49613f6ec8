//! Comparison of two documents.
//!
//! Both sides are first read into a [`ParsedBom`](crate::parsers::ParsedBom).
//! Components are paired by [`matching`], then each
//! [`ChangeComputer`](traits::ChangeComputer) in [`changes`] contributes one
//! part of the [`DiffResult`].
//!
//! ```no_run
//! use binsbom::diff::DiffEngine;
//! use binsbom::parsers::parse_bom;
//! use std::path::Path;
//!
//! let old = parse_bom(Path::new("v1.cdx.json")).unwrap();
//! let new = parse_bom(Path::new("v2.cdx.json")).unwrap();
//! let result = DiffEngine::new().diff(&old, &new).unwrap();
//! print!("{}", result.to_text());
//! ```

pub mod changes;
mod engine;
pub mod matching;
mod result;
pub mod traits;

pub use engine::DiffEngine;
pub use matching::match_components;
pub use result::{
    ChangeSet, ChangeType, ComponentChange, DependencyChange, DiffResult, DiffSummary,
    FieldChange,
};
pub use traits::{ChangeComputer, ComponentMatches};
