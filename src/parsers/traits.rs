//! Parser trait definitions.
//!
//! This module defines the `BomParser` trait for format-specific readers
//! and the confidence scoring used to pick one without trial parsing.

use std::path::Path;

use super::bom::ParsedBom;
use crate::error::{BinsbomError, Result};

/// Confidence level for format detection
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct FormatConfidence(f32);

impl FormatConfidence {
    /// Definitely not this format
    pub const NONE: Self = Self(0.0);
    /// Might be this format
    pub const LOW: Self = Self(0.25);
    /// Likely this format
    pub const MEDIUM: Self = Self(0.5);
    /// Almost certainly this format
    pub const HIGH: Self = Self(0.75);
    /// Definitely this format
    pub const CERTAIN: Self = Self(1.0);

    #[must_use]
    pub const fn new(value: f32) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    #[must_use]
    pub const fn value(&self) -> f32 {
        self.0
    }

    /// Check if this confidence indicates the format can be parsed
    #[must_use]
    pub fn can_parse(&self) -> bool {
        self.0 >= Self::LOW.0
    }
}

impl Default for FormatConfidence {
    fn default() -> Self {
        Self::NONE
    }
}

/// Detection result from a parser
#[derive(Debug, Clone, Default)]
pub struct FormatDetection {
    pub confidence: FormatConfidence,
    /// Detected version if applicable
    pub version: Option<String>,
}

impl FormatDetection {
    #[must_use]
    pub const fn no_match() -> Self {
        Self {
            confidence: FormatConfidence::NONE,
            version: None,
        }
    }

    #[must_use]
    pub const fn with_confidence(confidence: FormatConfidence) -> Self {
        Self {
            confidence,
            version: None,
        }
    }

    /// Set the detected version
    #[must_use]
    pub fn version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }
}

/// Trait for SBOM format readers
///
/// Implementors provide format detection via `detect()` and parsing via
/// `parse_str()`.
pub trait BomParser {
    /// Parse a document from a file path
    fn parse(&self, path: &Path) -> Result<ParsedBom> {
        let content = std::fs::read_to_string(path).map_err(|e| BinsbomError::io(path, e))?;
        self.parse_str(&content)
    }

    fn parse_str(&self, content: &str) -> Result<ParsedBom>;

    fn format_name(&self) -> &'static str;

    /// Lightweight structural check without full parsing.
    fn detect(&self, content: &str) -> FormatDetection;

    fn can_parse(&self, content: &str) -> bool {
        self.detect(content).confidence.can_parse()
    }
}

/// Pull a quoted JSON string value for `key` out of the first few KiB of a
/// document, without parsing it.
pub(crate) fn peek_json_string(content: &str, key: &str) -> Option<String> {
    let head = content.get(..content.len().min(4096)).unwrap_or(content);
    let needle = format!("\"{key}\"");
    let after = &head[head.find(&needle)? + needle.len()..];
    let after = after.trim_start().strip_prefix(':')?.trim_start();
    let value = after.strip_prefix('"')?;
    value.find('"').map(|end| value[..end].to_string())
}
