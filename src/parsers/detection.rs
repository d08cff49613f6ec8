//! Centralized format detection for document readers.

use super::bom::ParsedBom;
use super::traits::{BomParser, FormatConfidence};
use super::{CycloneDxParser, Spdx3Parser, SpdxParser};
use crate::error::{BinsbomError, ParseErrorKind, Result};

/// Reader identified during detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserKind {
    CycloneDx,
    SpdxTagValue,
    Spdx3,
}

impl ParserKind {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CycloneDx => "CycloneDX",
            Self::SpdxTagValue => "SPDX 2.3 tag-value",
            Self::Spdx3 => "SPDX 3",
        }
    }
}

/// Result of format detection.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub parser: Option<ParserKind>,
    pub confidence: FormatConfidence,
    pub version: Option<String>,
}

impl DetectionResult {
    #[must_use]
    pub fn can_parse(&self) -> bool {
        self.parser.is_some() && self.confidence.can_parse()
    }
}

/// Picks the reader with the highest confidence for a document.
#[derive(Debug, Default)]
pub struct FormatDetector {
    cyclonedx: CycloneDxParser,
    spdx: SpdxParser,
    spdx3: Spdx3Parser,
}

impl FormatDetector {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cyclonedx: CycloneDxParser::new(),
            spdx: SpdxParser::new(),
            spdx3: Spdx3Parser::new(),
        }
    }

    fn parser(&self, kind: ParserKind) -> &dyn BomParser {
        match kind {
            ParserKind::CycloneDx => &self.cyclonedx,
            ParserKind::SpdxTagValue => &self.spdx,
            ParserKind::Spdx3 => &self.spdx3,
        }
    }

    #[must_use]
    pub fn detect(&self, content: &str) -> DetectionResult {
        let mut best = DetectionResult {
            parser: None,
            confidence: FormatConfidence::NONE,
            version: None,
        };
        for kind in [ParserKind::CycloneDx, ParserKind::Spdx3, ParserKind::SpdxTagValue] {
            let detection = self.parser(kind).detect(content);
            if detection.confidence > best.confidence {
                best = DetectionResult {
                    parser: Some(kind),
                    confidence: detection.confidence,
                    version: detection.version,
                };
            }
        }
        best
    }

    /// Detect and parse in one step.
    pub fn parse_str(&self, content: &str) -> Result<ParsedBom> {
        let detection = self.detect(content);
        match detection.parser.filter(|_| detection.can_parse()) {
            Some(kind) => {
                tracing::debug!(
                    "reading document as {} (confidence {:.2})",
                    kind.name(),
                    detection.confidence.value()
                );
                self.parser(kind).parse_str(content)
            }
            None => Err(BinsbomError::parse(
                "detecting document format",
                ParseErrorKind::UnknownFormat,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_each_format() {
        let detector = FormatDetector::new();
        let cdx = r#"{"bomFormat": "CycloneDX", "specVersion": "1.6", "components": []}"#;
        let spdx3 = r#"{"@context": "https://spdx.org/rdf/3.0.1/spdx-context.jsonld", "@graph": []}"#;
        let tag = "SPDXVersion: SPDX-2.3\nDataLicense: CC0-1.0\nSPDXID: SPDXRef-DOCUMENT\n";

        assert_eq!(detector.detect(cdx).parser, Some(ParserKind::CycloneDx));
        assert_eq!(detector.detect(spdx3).parser, Some(ParserKind::Spdx3));
        assert_eq!(detector.detect(tag).parser, Some(ParserKind::SpdxTagValue));
    }

    #[test]
    fn test_unknown_format() {
        let detector = FormatDetector::new();
        assert!(!detector.detect(r#"{"some": "json"}"#).can_parse());
        let err = detector.parse_str("plain text").unwrap_err();
        assert!(matches!(
            err,
            BinsbomError::Parse {
                source: ParseErrorKind::UnknownFormat,
                ..
            }
        ));
    }
}
