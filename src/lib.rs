//! **Binary metadata extraction and SBOM generation.**
//!
//! `binsbom` reads compiled artifacts (ELF, Mach-O thin and universal, PE and
//! `ar` archives), extracts what they say about themselves, and writes a
//! Software Bill of Materials in SPDX 2.3 tag-value, SPDX 3 JSON-LD or
//! CycloneDX 1.4 to 1.6 JSON. Generated documents can be read back and
//! compared.
//!
//! ## Modules
//!
//! - **[`extract`]**: per-format extractors behind the [`BinaryExtractor`]
//!   trait, chosen by magic bytes through [`ExtractorDispatcher`].
//! - **[`model`]**: the format-neutral [`Component`] and the [`Registry`] that
//!   owns components and the dependency edges between them.
//! - **[`generate`]**: the [`SbomGenerator`] lifecycle and one writer per
//!   output format, plus [`generate::canonicalize`] for signing.
//! - **[`parsers`]** and **[`diff`]**: read documents back and compare them.
//! - **[`validate`]**: structural checks for SPDX and CycloneDX documents.
//! - **[`pipeline`]**: discovery, parallel extraction and the sequential
//!   stages after it.
//! - **[`config`]**: YAML configuration with presets and validation.
//!
//! ## Generating a document
//!
//! ```no_run
//! use binsbom::extract::ExtractorDispatcher;
//! use binsbom::generate::{GeneratorConfig, OutputFormat, SbomGenerator};
//! use binsbom::model::Registry;
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = ExtractorDispatcher::standard();
//!     let artifact = dispatcher.extract_path(Path::new("/usr/bin/ls"))?;
//!
//!     let mut registry = Registry::new();
//!     registry.register_artifact(&artifact)?;
//!
//!     let document = SbomGenerator::generate(
//!         registry,
//!         GeneratorConfig::default(),
//!         OutputFormat::default(),
//!     )?;
//!     println!("{document}");
//!     Ok(())
//! }
//! ```
//!
//! ## Comparing two documents
//!
//! ```no_run
//! use binsbom::{parse_bom, DiffEngine};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let old = parse_bom(Path::new("v1.cdx.json"))?;
//!     let new = parse_bom(Path::new("v2.cdx.json"))?;
//!     let diff = DiffEngine::new().diff(&old, &new)?;
//!     for removed in &diff.components.removed {
//!         println!("- {}", removed.display_name());
//!     }
//!     Ok(())
//! }
//! ```

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![allow(
    // Header fields are read into u64 and narrowed after bounds checks
    clippy::cast_possible_truncation,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::struct_excessive_bools,
    // Variable names like `old`/`new` are clear in context
    clippy::similar_names
)]

pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod extract;
pub mod generate;
pub mod model;
pub mod parsers;
pub mod pipeline;
pub mod utils;
pub mod validate;

// Re-export main types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError, ConfigPreset, Validatable};
pub use diff::{DiffEngine, DiffResult};
pub use error::{BinsbomError, ErrorContext, OptionContext, Result};
pub use extract::{BinaryExtractor, ExtractedArtifact, ExtractorDispatcher};
pub use generate::{canonicalize, GeneratorConfig, OutputFormat, SbomGenerator};
pub use model::{BomRef, Component, Registry};
pub use parsers::{parse_bom, parse_bom_str, ParsedBom};
