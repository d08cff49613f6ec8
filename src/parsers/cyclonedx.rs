//! CycloneDX JSON reader.
//!
//! Supports CycloneDX 1.4, 1.5 and 1.6. Nested `components` become
//! `contains` edges; placeholder components marked `binsbom:external` are
//! kept out of the component map.

use serde::Deserialize;

use super::bom::{ParsedBom, ParsedComponent};
use super::traits::{peek_json_string, BomParser, FormatConfidence, FormatDetection};
use crate::error::{BinsbomError, ParseErrorKind, Result};
use crate::generate::EXTERNAL_PROPERTY;
use crate::model::{ComponentType, EdgeKind, LicenseExpression};

/// Reader for CycloneDX JSON documents
#[derive(Debug, Clone, Copy, Default)]
pub struct CycloneDxParser;

impl CycloneDxParser {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn convert(bom: CycloneDxBom) -> ParsedBom {
        let mut parsed = ParsedBom::default();
        for component in bom.components {
            add_component(&mut parsed, component, None);
        }
        for dependency in bom.dependencies {
            for target in dependency.depends_on {
                parsed.push_edge(dependency.bom_ref.clone(), target, EdgeKind::DependsOn);
            }
        }
        parsed
    }
}

fn add_component(parsed: &mut ParsedBom, component: CdxComponent, parent: Option<&str>) {
    let reference = component
        .bom_ref
        .clone()
        .unwrap_or_else(|| component.name.clone());

    let is_external = component
        .properties
        .iter()
        .any(|p| p.name == EXTERNAL_PROPERTY && p.value == "true");
    if is_external {
        parsed.externals.insert(reference, component.name);
        return;
    }

    if let Some(parent) = parent {
        parsed.push_edge(parent, reference.clone(), EdgeKind::Contains);
    }

    let license = license_of(&component.licenses);
    let checksum = component
        .hashes
        .iter()
        .find(|h| h.alg.eq_ignore_ascii_case("SHA-256"))
        .map(|h| h.content.to_ascii_lowercase());

    parsed.components.insert(
        reference.clone(),
        ParsedComponent {
            name: component.name,
            version: component.version,
            component_type: ComponentType::parse(&component.component_type),
            purl: component.purl,
            license,
            checksum,
        },
    );

    for child in component.components {
        add_component(parsed, child, Some(&reference));
    }
}

/// Join license choices with `AND`; anything unparseable reads back as
/// `NOASSERTION`.
fn license_of(choices: &[CdxLicenseChoice]) -> String {
    let parts: Vec<String> = choices
        .iter()
        .filter_map(|choice| {
            choice.expression.clone().or_else(|| {
                choice
                    .license
                    .as_ref()
                    .and_then(|l| l.id.clone().or_else(|| l.name.clone()))
            })
        })
        .collect();
    let joined = match parts.len() {
        0 => String::new(),
        1 => parts.into_iter().next().unwrap_or_default(),
        _ => parts
            .iter()
            .map(|p| format!("({p})"))
            .collect::<Vec<_>>()
            .join(" AND "),
    };
    LicenseExpression::new(joined).spdx_or_noassertion().to_string()
}

impl BomParser for CycloneDxParser {
    fn parse_str(&self, content: &str) -> Result<ParsedBom> {
        let bom: CycloneDxBom = serde_json::from_str(content).map_err(|e| {
            BinsbomError::parse("reading CycloneDX", ParseErrorKind::InvalidJson(e.to_string()))
        })?;
        if bom.bom_format.as_deref() != Some("CycloneDX") {
            return Err(BinsbomError::missing_field("bomFormat", "CycloneDX document"));
        }
        tracing::debug!(
            "parsed CycloneDX {} with {} top-level components",
            bom.spec_version.as_deref().unwrap_or("?"),
            bom.components.len()
        );
        Ok(Self::convert(bom))
    }

    fn format_name(&self) -> &'static str {
        "CycloneDX"
    }

    fn detect(&self, content: &str) -> FormatDetection {
        if !content.trim_start().starts_with('{') {
            return FormatDetection::no_match();
        }
        match peek_json_string(content, "bomFormat").as_deref() {
            Some("CycloneDX") => FormatDetection::with_confidence(FormatConfidence::CERTAIN)
                .version(peek_json_string(content, "specVersion")),
            Some(_) => FormatDetection::no_match(),
            None if content.contains("\"specVersion\"") && content.contains("\"components\"") => {
                FormatDetection::with_confidence(FormatConfidence::MEDIUM)
            }
            None => FormatDetection::no_match(),
        }
    }
}

// CycloneDX JSON structures for deserialization

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CycloneDxBom {
    bom_format: Option<String>,
    spec_version: Option<String>,
    #[serde(default)]
    components: Vec<CdxComponent>,
    #[serde(default)]
    dependencies: Vec<CdxDependency>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxComponent {
    #[serde(rename = "type", default)]
    component_type: String,
    #[serde(rename = "bom-ref")]
    bom_ref: Option<String>,
    name: String,
    version: Option<String>,
    purl: Option<String>,
    #[serde(default)]
    licenses: Vec<CdxLicenseChoice>,
    #[serde(default)]
    hashes: Vec<CdxHash>,
    #[serde(default)]
    properties: Vec<CdxProperty>,
    #[serde(default)]
    components: Vec<CdxComponent>,
}

#[derive(Debug, Deserialize)]
struct CdxLicenseChoice {
    license: Option<CdxLicense>,
    expression: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CdxLicense {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CdxHash {
    alg: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CdxProperty {
    name: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CdxDependency {
    #[serde(rename = "ref")]
    bom_ref: String,
    #[serde(default)]
    depends_on: Vec<String>,
}
