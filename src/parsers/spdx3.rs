//! SPDX 3 JSON-LD reader.
//!
//! Reads the flat `@graph` form: `software_Package` and `software_File`
//! elements become components, `dependsOn`/`contains` relationships become
//! edges, and `hasDeclaredLicense` relationships supply licenses.

use std::collections::HashMap;

use serde::Deserialize;

use super::bom::{ParsedBom, ParsedComponent};
use super::traits::{BomParser, FormatConfidence, FormatDetection};
use crate::error::{BinsbomError, ParseErrorKind, Result};
use crate::generate::EXTERNAL_URN_PREFIX;
use crate::model::{ComponentType, EdgeKind, LicenseExpression, NOASSERTION};

/// Reader for SPDX 3.0 JSON-LD documents
#[derive(Debug, Clone, Copy, Default)]
pub struct Spdx3Parser;

impl Spdx3Parser {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(rename = "@graph", default)]
    graph: Vec<Element>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Element {
    #[serde(rename = "type", default)]
    element_type: String,
    spdx_id: Option<String>,
    name: Option<String>,
    #[serde(rename = "software_packageVersion")]
    package_version: Option<String>,
    #[serde(rename = "software_packageUrl")]
    package_url: Option<String>,
    #[serde(rename = "software_primaryPurpose")]
    primary_purpose: Option<String>,
    #[serde(default)]
    verified_using: Vec<IntegrityMethod>,
    #[serde(rename = "simplelicensing_licenseExpression")]
    license_expression: Option<String>,
    from: Option<String>,
    relationship_type: Option<String>,
    #[serde(default)]
    to: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntegrityMethod {
    #[serde(default)]
    algorithm: String,
    #[serde(default)]
    hash_value: String,
}

/// `https://ns#SPDXRef-foo` -> `foo`.
fn local_ref(iri: &str) -> String {
    let fragment = iri.rsplit_once('#').map_or(iri, |(_, f)| f);
    fragment
        .strip_prefix("SPDXRef-")
        .unwrap_or(fragment)
        .to_string()
}

impl BomParser for Spdx3Parser {
    fn parse_str(&self, content: &str) -> Result<ParsedBom> {
        let document: Document = serde_json::from_str(content).map_err(|e| {
            BinsbomError::parse("reading SPDX 3 JSON-LD", ParseErrorKind::InvalidJson(e.to_string()))
        })?;

        let expressions: HashMap<&str, &str> = document
            .graph
            .iter()
            .filter(|e| e.element_type == "simplelicensing_LicenseExpression")
            .filter_map(|e| Some((e.spdx_id.as_deref()?, e.license_expression.as_deref()?)))
            .collect();

        let mut parsed = ParsedBom::default();
        let mut by_iri: HashMap<&str, String> = HashMap::new();

        for element in &document.graph {
            if !matches!(element.element_type.as_str(), "software_Package" | "software_File") {
                continue;
            }
            let Some(iri) = element.spdx_id.as_deref() else {
                return Err(BinsbomError::missing_field("spdxId", &element.element_type));
            };
            let name = element.name.clone().unwrap_or_else(|| local_ref(iri));
            let mut component = ParsedComponent::new(name);
            component.version = element.package_version.clone();
            component.purl = element.package_url.clone();
            component.component_type = element
                .primary_purpose
                .as_deref()
                .map_or(ComponentType::Library, ComponentType::parse);
            component.checksum = element
                .verified_using
                .iter()
                .find(|h| h.algorithm.eq_ignore_ascii_case("sha256"))
                .map(|h| h.hash_value.to_ascii_lowercase());
            let reference = local_ref(iri);
            by_iri.insert(iri, reference.clone());
            parsed.components.insert(reference, component);
        }

        for element in document.graph.iter().filter(|e| e.element_type == "Relationship") {
            let (Some(from), Some(kind)) = (element.from.as_deref(), element.relationship_type.as_deref())
            else {
                continue;
            };
            let Some(from_ref) = by_iri.get(from).cloned() else {
                continue;
            };
            match kind {
                "hasDeclaredLicense" => {
                    let license = element
                        .to
                        .first()
                        .and_then(|to| expressions.get(to.as_str()))
                        .map_or(NOASSERTION.to_string(), |expr| {
                            LicenseExpression::new(*expr).spdx_or_noassertion().to_string()
                        });
                    if let Some(component) = parsed.components.get_mut(&from_ref) {
                        component.license = license;
                    }
                }
                "dependsOn" | "contains" => {
                    let kind = if kind == "dependsOn" {
                        EdgeKind::DependsOn
                    } else {
                        EdgeKind::Contains
                    };
                    for to in &element.to {
                        let target = if let Some(name) = to.strip_prefix(EXTERNAL_URN_PREFIX) {
                            parsed.externals.insert(to.clone(), name.to_string());
                            to.clone()
                        } else {
                            by_iri.get(to.as_str()).cloned().unwrap_or_else(|| local_ref(to))
                        };
                        parsed.push_edge(from_ref.clone(), target, kind);
                    }
                }
                _ => {}
            }
        }

        tracing::debug!(
            "parsed SPDX 3 document with {} elements",
            parsed.components.len()
        );
        Ok(parsed)
    }

    fn format_name(&self) -> &'static str {
        "SPDX 3"
    }

    fn detect(&self, content: &str) -> FormatDetection {
        if !content.trim_start().starts_with('{') {
            return FormatDetection::no_match();
        }
        let head = content.get(..content.len().min(4096)).unwrap_or(content);
        if !head.contains("\"@context\"") {
            return FormatDetection::no_match();
        }
        ["3.0.1", "3.0.0"]
            .into_iter()
            .find(|v| head.contains(&format!("spdx.org/rdf/{v}")))
            .map_or_else(
                || {
                    if head.contains("spdx.org/rdf/3") {
                        FormatDetection::with_confidence(FormatConfidence::HIGH)
                    } else {
                        FormatDetection::no_match()
                    }
                },
                |v| {
                    FormatDetection::with_confidence(FormatConfidence::CERTAIN)
                        .version(Some(v.to_string()))
                },
            )
    }
}
