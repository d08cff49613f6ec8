//! Unified error types for binsbom.
//!
//! Errors carry a context chain (`outer: inner`) plus a typed kind so callers
//! can tell a per-file format failure from a programming error in generation.

use std::path::PathBuf;
use thiserror::Error;

use crate::extract::{ExtractError, ExtractErrorKind};

/// Main error type for binsbom operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BinsbomError {
    /// A binary could not be read or decoded
    #[error("Extraction failed: {context}")]
    Extract {
        context: String,
        #[source]
        source: ExtractErrorKind,
    },

    /// Extractor table construction or selection failed
    #[error("Dispatch failed: {context}")]
    Dispatch {
        context: String,
        #[source]
        source: DispatchErrorKind,
    },

    /// Registry invariant violated
    #[error("Registry operation failed: {context}")]
    Registry {
        context: String,
        #[source]
        source: RegistryErrorKind,
    },

    /// SBOM generation failed
    #[error("SBOM generation failed: {context}")]
    Generation {
        context: String,
        #[source]
        source: GenerationErrorKind,
    },

    /// A generated document could not be read back
    #[error("Failed to parse SBOM: {context}")]
    Parse {
        context: String,
        #[source]
        source: ParseErrorKind,
    },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Specific dispatch error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DispatchErrorKind {
    #[error("Extractors '{first}' and '{second}' share priority {priority}")]
    AmbiguousPriority {
        first: String,
        second: String,
        priority: u32,
    },

    #[error("No extractors registered")]
    Empty,
}

/// Specific registry error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RegistryErrorKind {
    #[error("Dependency source '{0}' is not a registered component")]
    UnknownSource(String),

    #[error("Component name must not be empty")]
    EmptyName,
}

/// Specific generation error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GenerationErrorKind {
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("JSON serialization failed: {0}")]
    Serialization(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Document is not canonicalizable: {0}")]
    Canonicalization(String),
}

/// Specific parse error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ParseErrorKind {
    #[error("Unknown SBOM format - expected CycloneDX or SPDX markers")]
    UnknownFormat,

    #[error("Invalid JSON structure: {0}")]
    InvalidJson(String),

    #[error("Missing required field: {field} in {context}")]
    MissingField { field: String, context: String },

    #[error("Malformed tag-value line {line}: {message}")]
    TagValue { line: usize, message: String },
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for binsbom operations
pub type Result<T> = std::result::Result<T, BinsbomError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl BinsbomError {
    /// Create an extraction error with context
    pub fn extract(context: impl Into<String>, source: ExtractErrorKind) -> Self {
        Self::Extract {
            context: context.into(),
            source,
        }
    }

    /// Create a dispatch error with context
    pub fn dispatch(context: impl Into<String>, source: DispatchErrorKind) -> Self {
        Self::Dispatch {
            context: context.into(),
            source,
        }
    }

    /// Create a registry error with context
    pub fn registry(context: impl Into<String>, source: RegistryErrorKind) -> Self {
        Self::Registry {
            context: context.into(),
            source,
        }
    }

    /// Create a generation error with context
    pub fn generation(context: impl Into<String>, source: GenerationErrorKind) -> Self {
        Self::Generation {
            context: context.into(),
            source,
        }
    }

    /// Create a parse error with context
    pub fn parse(context: impl Into<String>, source: ParseErrorKind) -> Self {
        Self::Parse {
            context: context.into(),
            source,
        }
    }

    /// Create a parse error for missing field
    pub fn missing_field(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::parse(
            "missing required field",
            ParseErrorKind::MissingField {
                field: field.into(),
                context: context.into(),
            },
        )
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        let message = format!("{source}");
        Self::Io {
            path: Some(path),
            message,
            source,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True for errors that only affect a single input file.
    #[must_use]
    pub const fn is_per_file(&self) -> bool {
        matches!(self, Self::Extract { .. } | Self::Io { .. })
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for BinsbomError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<serde_json::Error> for BinsbomError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(
            "JSON deserialization",
            ParseErrorKind::InvalidJson(err.to_string()),
        )
    }
}

impl From<ExtractError> for BinsbomError {
    fn from(err: ExtractError) -> Self {
        Self::extract(err.path.display().to_string(), err.kind)
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// ```ignore
/// use binsbom::error::ErrorContext;
///
/// let artifact = dispatcher
///     .extract_path(path)
///     .with_context(|| format!("scanning {}", path.display()))?;
/// ```
pub trait ErrorContext<T> {
    /// Add context to an error, prepended to any existing context.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure, evaluated only on error.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<BinsbomError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

/// Add context to an error, chaining with any existing context.
fn add_context_to_error(err: BinsbomError, new_ctx: &str) -> BinsbomError {
    match err {
        BinsbomError::Extract {
            context: existing,
            source,
        } => BinsbomError::Extract {
            context: chain_context(new_ctx, &existing),
            source,
        },
        BinsbomError::Dispatch {
            context: existing,
            source,
        } => BinsbomError::Dispatch {
            context: chain_context(new_ctx, &existing),
            source,
        },
        BinsbomError::Registry {
            context: existing,
            source,
        } => BinsbomError::Registry {
            context: chain_context(new_ctx, &existing),
            source,
        },
        BinsbomError::Generation {
            context: existing,
            source,
        } => BinsbomError::Generation {
            context: chain_context(new_ctx, &existing),
            source,
        },
        BinsbomError::Parse {
            context: existing,
            source,
        } => BinsbomError::Parse {
            context: chain_context(new_ctx, &existing),
            source,
        },
        BinsbomError::Io {
            path,
            message,
            source,
        } => BinsbomError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        BinsbomError::Config(msg) => BinsbomError::Config(chain_context(new_ctx, &msg)),
        BinsbomError::Validation(msg) => BinsbomError::Validation(chain_context(new_ctx, &msg)),
    }
}

fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}

/// Extension trait for Option types to convert to errors with context.
pub trait OptionContext<T> {
    /// Convert None to an error with the given context.
    fn context_none(self, context: impl Into<String>) -> Result<T>;

    /// Convert None to an error with context from a closure.
    fn with_context_none<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T> OptionContext<T> for Option<T> {
    fn context_none(self, context: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| BinsbomError::Validation(context.into()))
    }

    fn with_context_none<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.ok_or_else(|| BinsbomError::Validation(f().into()))
    }
}
