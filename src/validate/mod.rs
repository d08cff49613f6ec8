//! Structural checks for SBOM documents.
//!
//! A validator reads one format and reports every problem it finds instead
//! of stopping at the first. Errors make a document invalid; warnings flag
//! content that is legal but probably unintended, such as a document
//! without packages.
//!
//! ```no_run
//! use binsbom::validate::validate_document;
//!
//! let content = std::fs::read_to_string("app.cdx.json").unwrap();
//! let result = validate_document(&content);
//! for finding in &result.findings {
//!     println!("{:?}: {}", finding.severity, finding.message);
//! }
//! ```

mod cyclonedx;
mod spdx3;
mod spdx_tag;

pub use cyclonedx::CycloneDxValidator;
pub use spdx3::Spdx3Validator;
pub use spdx_tag::SpdxTagValueValidator;

use serde::Serialize;

use crate::generate::OutputFormat;
use crate::model::NOASSERTION;
use crate::parsers::{FormatDetector, ParserKind};

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The document does not conform
    Error,
    /// Conforming, but likely not what the producer meant
    Warning,
}

/// One problem found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
    /// Element the finding is about, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
}

impl Finding {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            element: None,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            element: None,
        }
    }

    #[must_use]
    pub fn at(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }
}

/// Outcome of validating one document.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    /// Format the document was validated as
    pub format: &'static str,
    /// Specification version declared by the document
    pub version: Option<String>,
    pub is_valid: bool,
    pub error_count: usize,
    pub warning_count: usize,
    pub findings: Vec<Finding>,
}

impl ValidationResult {
    #[must_use]
    pub fn new(format: &'static str, version: Option<String>, findings: Vec<Finding>) -> Self {
        let error_count = findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count();
        Self {
            format,
            version,
            is_valid: error_count == 0,
            error_count,
            warning_count: findings.len() - error_count,
            findings,
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
    }
}

/// A validator for one document format.
pub trait DocumentValidator {
    /// Human-readable format name
    fn format_name(&self) -> &'static str;

    /// Check `content`, collecting every finding.
    fn validate(&self, content: &str) -> ValidationResult;
}

/// Validator for documents written in `format`.
#[must_use]
pub fn validator_for(format: OutputFormat) -> Box<dyn DocumentValidator> {
    match format {
        OutputFormat::SpdxTagValue => Box::new(SpdxTagValueValidator),
        OutputFormat::SpdxJson(_) => Box::new(Spdx3Validator),
        OutputFormat::CycloneDx(_) => Box::new(CycloneDxValidator),
    }
}

/// Detect the format of `content` and validate it.
#[must_use]
pub fn validate_document(content: &str) -> ValidationResult {
    if content.trim().is_empty() {
        return ValidationResult::new("unknown", None, vec![Finding::error("Content is empty")]);
    }
    let detection = FormatDetector::new().detect(content);
    let validator: &dyn DocumentValidator = match detection.parser {
        Some(ParserKind::CycloneDx) if detection.can_parse() => &CycloneDxValidator,
        Some(ParserKind::Spdx3) if detection.can_parse() => &Spdx3Validator,
        Some(ParserKind::SpdxTagValue) if detection.can_parse() => &SpdxTagValueValidator,
        _ => {
            return ValidationResult::new(
                "unknown",
                None,
                vec![Finding::error("Unknown SBOM format")],
            )
        }
    };
    tracing::debug!("validating as {}", validator.format_name());
    validator.validate(content)
}

/// `NOASSERTION`, `NONE`, or a strictly valid SPDX expression.
fn check_license(expression: &str, element: &str, findings: &mut Vec<Finding>) {
    if expression == NOASSERTION || expression == "NONE" {
        return;
    }
    if let Err(e) = spdx::Expression::parse(expression) {
        findings.push(
            Finding::error(format!("Invalid license expression '{expression}': {e}")).at(element),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{GeneratorConfig, SbomGenerator};
    use crate::model::{Component, LicenseExpression, Registry};
    use chrono::TimeZone;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        let app = registry
            .register_component(
                Component::new("app")
                    .with_version("1.0")
                    .with_checksum("aa")
                    .with_license(LicenseExpression::new("MIT OR Apache-2.0")),
            )
            .unwrap();
        registry
            .register_component(Component::new("libA.so.1").with_checksum("bb"))
            .unwrap();
        registry.add_dependency_by_name(&app, "libA.so.1").unwrap();
        registry.add_dependency_by_name(&app, "libc.so.6").unwrap();
        registry
    }

    #[test]
    fn test_generated_documents_are_valid() {
        let config = GeneratorConfig::default()
            .with_timestamp(chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
            .with_document_name("fixture");
        for format in OutputFormat::all() {
            let document = SbomGenerator::generate(registry(), config.clone(), format).unwrap();
            let result = validate_document(&document);
            assert!(result.is_valid, "{format}: {:?}", result.findings);
            assert_eq!(result.warning_count, 0, "{format}: {:?}", result.findings);
            assert_eq!(result.format, validator_for(format).format_name());
        }
    }

    #[test]
    fn test_empty_and_unknown_content() {
        let empty = validate_document("  \n");
        assert!(!empty.is_valid);
        assert_eq!(empty.findings[0].message, "Content is empty");

        let unknown = validate_document("just some text");
        assert!(!unknown.is_valid);
        assert_eq!(unknown.findings[0].message, "Unknown SBOM format");
    }

    #[test]
    fn test_license_check() {
        let mut findings = Vec::new();
        check_license("NOASSERTION", "a", &mut findings);
        check_license("MIT AND (Apache-2.0 OR BSD-3-Clause)", "a", &mut findings);
        assert!(findings.is_empty());
        check_license("Apache 2.0", "b", &mut findings);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].element.as_deref(), Some("b"));
    }
}
