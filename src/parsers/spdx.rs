//! SPDX 2.3 tag-value reader.

use super::bom::{ParsedBom, ParsedComponent};
use super::traits::{BomParser, FormatConfidence, FormatDetection};
use crate::error::{BinsbomError, ParseErrorKind, Result};
use crate::model::{ComponentType, EdgeKind, LicenseExpression};

/// Reader for SPDX 2.x tag-value documents
#[derive(Debug, Clone, Copy, Default)]
pub struct SpdxParser;

impl SpdxParser {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Split a document into `(line number, tag, value)` triples, folding
    /// multi-line `<text>` values into one.
    pub(crate) fn tags(content: &str) -> Result<Vec<(usize, String, String)>> {
        let mut tags = Vec::new();
        let mut lines = content.lines().enumerate();
        while let Some((index, raw)) = lines.next() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((tag, value)) = line.split_once(':') else {
                return Err(BinsbomError::parse(
                    "reading SPDX tag-value",
                    ParseErrorKind::TagValue {
                        line: index + 1,
                        message: "expected 'Tag: value'".to_string(),
                    },
                ));
            };
            let mut value = value.trim().to_string();
            if value.starts_with("<text>") && !value.contains("</text>") {
                loop {
                    let Some((_, next)) = lines.next() else {
                        return Err(BinsbomError::parse(
                            "reading SPDX tag-value",
                            ParseErrorKind::TagValue {
                                line: index + 1,
                                message: "unterminated <text> block".to_string(),
                            },
                        ));
                    };
                    value.push('\n');
                    value.push_str(next);
                    if next.contains("</text>") {
                        break;
                    }
                }
            }
            let value = value
                .strip_prefix("<text>")
                .and_then(|v| v.strip_suffix("</text>"))
                .map_or(value.clone(), str::to_string);
            tags.push((index + 1, tag.trim().to_string(), value));
        }
        Ok(tags)
    }
}

/// `SPDXRef-foo` -> `foo`.
fn local_ref(spdx_id: &str) -> String {
    spdx_id
        .strip_prefix("SPDXRef-")
        .unwrap_or(spdx_id)
        .to_string()
}

struct PendingPackage {
    spdx_id: Option<String>,
    component: ParsedComponent,
}

fn finish(parsed: &mut ParsedBom, pending: Option<PendingPackage>) {
    if let Some(pkg) = pending {
        let reference = pkg
            .spdx_id
            .as_deref()
            .map_or_else(|| pkg.component.name.clone(), local_ref);
        parsed.components.insert(reference, pkg.component);
    }
}

impl BomParser for SpdxParser {
    fn parse_str(&self, content: &str) -> Result<ParsedBom> {
        let mut parsed = ParsedBom::default();
        let mut current: Option<PendingPackage> = None;
        let mut relationships = Vec::new();

        for (line, tag, value) in Self::tags(content)? {
            match tag.as_str() {
                "PackageName" => {
                    finish(&mut parsed, current.take());
                    current = Some(PendingPackage {
                        spdx_id: None,
                        component: ParsedComponent::new(value),
                    });
                }
                "Relationship" => relationships.push((line, value)),
                _ => {
                    let Some(pkg) = current.as_mut() else {
                        continue;
                    };
                    let component = &mut pkg.component;
                    match tag.as_str() {
                        "SPDXID" => pkg.spdx_id = Some(value),
                        "PackageVersion" => component.version = Some(value),
                        "PackageLicenseDeclared" => {
                            component.license =
                                LicenseExpression::new(value).spdx_or_noassertion().to_string();
                        }
                        "PackageChecksum" => {
                            if let Some((alg, hex)) = value.split_once(':') {
                                if alg.trim().eq_ignore_ascii_case("SHA256") {
                                    component.checksum = Some(hex.trim().to_ascii_lowercase());
                                }
                            }
                        }
                        "ExternalRef" => {
                            let parts: Vec<&str> = value.split_whitespace().collect();
                            if let ["PACKAGE-MANAGER", "purl", locator, ..] = parts.as_slice() {
                                component.purl = Some((*locator).to_string());
                            }
                        }
                        "PrimaryPackagePurpose" => {
                            component.component_type = ComponentType::parse(&value);
                        }
                        _ => {}
                    }
                }
            }
        }
        finish(&mut parsed, current);

        for (line, value) in relationships {
            let parts: Vec<&str> = value.split_whitespace().collect();
            let [from, kind, to] = parts.as_slice() else {
                return Err(BinsbomError::parse(
                    "reading SPDX relationship",
                    ParseErrorKind::TagValue {
                        line,
                        message: format!("expected 'A TYPE B', got '{value}'"),
                    },
                ));
            };
            let kind = match *kind {
                "DEPENDS_ON" => EdgeKind::DependsOn,
                "CONTAINS" => EdgeKind::Contains,
                _ => continue,
            };
            if *to == "NOASSERTION" || *to == "NONE" {
                continue;
            }
            let target = match to.split_once(':') {
                Some((document_ref, element)) if document_ref.starts_with("DocumentRef-") => {
                    let reference = (*to).to_string();
                    parsed.externals.insert(reference.clone(), local_ref(element));
                    reference
                }
                _ => local_ref(to),
            };
            parsed.push_edge(local_ref(from), target, kind);
        }

        tracing::debug!(
            "parsed SPDX tag-value with {} packages and {} edges",
            parsed.components.len(),
            parsed.edges.len()
        );
        Ok(parsed)
    }

    fn format_name(&self) -> &'static str {
        "SPDX"
    }

    fn detect(&self, content: &str) -> FormatDetection {
        let trimmed = content.trim_start();
        if !(trimmed.starts_with("SPDXVersion:") || trimmed.contains("\nSPDXVersion:")) {
            return FormatDetection::no_match();
        }
        let version = trimmed
            .lines()
            .find_map(|l| l.trim().strip_prefix("SPDXVersion:"))
            .map(|v| v.trim().trim_start_matches("SPDX-").to_string());
        let confidence = if content.contains("SPDXID:") && content.contains("DataLicense:") {
            FormatConfidence::CERTAIN
        } else {
            FormatConfidence::HIGH
        };
        FormatDetection::with_confidence(confidence).version(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "SPDXVersion: SPDX-2.3
DataLicense: CC0-1.0
SPDXID: SPDXRef-DOCUMENT
DocumentName: app

##### Package: app

PackageName: app
SPDXID: SPDXRef-app-1.0
PackageVersion: 1.0
PackageChecksum: SHA256: ABCDEF
PackageLicenseDeclared: MIT
PackageComment: <text>binsbom:format=elf
binsbom:file-kind=executable</text>
ExternalRef: PACKAGE-MANAGER purl pkg:generic/app@1.0
PrimaryPackagePurpose: APPLICATION

PackageName: libA
SPDXID: SPDXRef-libA
PackageLicenseDeclared: NOASSERTION

Relationship: SPDXRef-DOCUMENT DESCRIBES SPDXRef-app-1.0
Relationship: SPDXRef-app-1.0 DEPENDS_ON SPDXRef-libA
Relationship: SPDXRef-app-1.0 DEPENDS_ON DocumentRef-external:SPDXRef-libc.so.6
";

    #[test]
    fn test_parse_packages() {
        let bom = SpdxParser::new().parse_str(DOC).unwrap();
        assert_eq!(bom.components.len(), 2);
        let app = &bom.components["app-1.0"];
        assert_eq!(app.name, "app");
        assert_eq!(app.version.as_deref(), Some("1.0"));
        assert_eq!(app.checksum.as_deref(), Some("abcdef"));
        assert_eq!(app.license, "MIT");
        assert_eq!(app.purl.as_deref(), Some("pkg:generic/app@1.0"));
        assert_eq!(app.component_type, ComponentType::Application);
        assert_eq!(bom.components["libA"].license, "NOASSERTION");
    }

    #[test]
    fn test_parse_relationships() {
        let bom = SpdxParser::new().parse_str(DOC).unwrap();
        assert_eq!(bom.edges.len(), 2);
        assert_eq!(bom.edges[0].to, "libA");
        assert_eq!(bom.name_of(&bom.edges[1].to), "libc.so.6");
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let err = SpdxParser::new()
            .parse_str("SPDXVersion: SPDX-2.3\nthis is not a tag\n")
            .unwrap_err();
        assert!(matches!(
            err,
            BinsbomError::Parse {
                source: ParseErrorKind::TagValue { line: 2, .. },
                ..
            }
        ));
    }

    #[test]
    fn test_detect() {
        let detection = SpdxParser::new().detect(DOC);
        assert_eq!(detection.confidence, FormatConfidence::CERTAIN);
        assert_eq!(detection.version.as_deref(), Some("2.3"));
        assert!(!SpdxParser::new().can_parse("{}"));
    }
}
