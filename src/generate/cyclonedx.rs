//! CycloneDX 1.4–1.6 JSON writer.
//!
//! Archive members are nested under their archive's `components`. Every
//! component, placeholders included, gets one `dependencies` entry.

use serde::Serialize;

use super::context::{DocumentContext, TOOL_NAME, TOOL_VERSION};
use super::format::{CycloneDxVersion, OutputFormat};
use super::traits::{component_properties, DocumentWriter};
use crate::error::{BinsbomError, GenerationErrorKind, Result};
use crate::model::{BomRef, Component, EdgeKind, EdgeTarget, Registry};

/// Prefix for placeholder components standing in for external dependencies.
/// `:` never appears in registry refs, so placeholders cannot collide.
pub const EXTERNAL_REF_PREFIX: &str = "external:";
pub const EXTERNAL_PROPERTY: &str = "binsbom:external";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Bom {
    bom_format: &'static str,
    spec_version: &'static str,
    serial_number: String,
    version: u32,
    metadata: Metadata,
    components: Vec<CdxComponent>,
    dependencies: Vec<Dependency>,
}

#[derive(Debug, Serialize)]
struct Metadata {
    timestamp: String,
    tools: Tools,
    /// Pre-1.6 name of the producing organization field
    #[serde(skip_serializing_if = "Option::is_none")]
    manufacture: Option<Organization>,
    #[serde(skip_serializing_if = "Option::is_none")]
    manufacturer: Option<Organization>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Tools {
    /// 1.4: array of tools
    Legacy(Vec<LegacyTool>),
    /// 1.5+: `{"components": [...]}`
    Components { components: Vec<ToolComponent> },
}

#[derive(Debug, Serialize)]
struct LegacyTool {
    vendor: &'static str,
    name: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct ToolComponent {
    #[serde(rename = "type")]
    component_type: &'static str,
    name: &'static str,
    version: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct Organization {
    name: String,
}

#[derive(Debug, Serialize)]
struct Hash {
    alg: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum LicenseChoice {
    License { license: LicenseId },
    Expression { expression: String },
}

#[derive(Debug, Serialize)]
struct LicenseId {
    id: String,
}

#[derive(Debug, Serialize)]
struct Property {
    name: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct CdxComponent {
    #[serde(rename = "type")]
    component_type: &'static str,
    #[serde(rename = "bom-ref")]
    bom_ref: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    supplier: Option<Organization>,
    #[serde(skip_serializing_if = "Option::is_none")]
    manufacturer: Option<Organization>,
    #[serde(skip_serializing_if = "Option::is_none")]
    publisher: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    hashes: Vec<Hash>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    licenses: Vec<LicenseChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    purl: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    properties: Vec<Property>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    components: Vec<CdxComponent>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Dependency {
    #[serde(rename = "ref")]
    bom_ref: String,
    depends_on: Vec<String>,
}

/// CycloneDX JSON writer for one spec version.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycloneDxWriter {
    version: CycloneDxVersion,
}

impl CycloneDxWriter {
    #[must_use]
    pub const fn new(version: CycloneDxVersion) -> Self {
        Self { version }
    }

    fn component(&self, registry: &Registry, component: &Component, ctx: &DocumentContext) -> CdxComponent {
        let license = &component.license;
        let licenses = if license.is_noassertion() {
            Vec::new()
        } else if license.is_single_id() {
            vec![LicenseChoice::License {
                license: LicenseId {
                    id: license.expression.clone(),
                },
            }]
        } else {
            vec![LicenseChoice::Expression {
                expression: license.expression.clone(),
            }]
        };

        let manufacturer = if self.version.has_manufacturer() {
            component.manufacturer.clone().map(|name| Organization { name })
        } else {
            None
        };

        let members = registry
            .components()
            .filter(|c| c.container.as_ref() == Some(component.bom_ref()))
            .map(|c| self.component(registry, c, ctx))
            .collect();

        CdxComponent {
            component_type: component.component_type.as_str(),
            bom_ref: component.bom_ref().to_string(),
            name: component.name.clone(),
            version: component.version.clone(),
            description: component.description.clone(),
            scope: Some(component.scope.as_str()),
            supplier: component.supplier.clone().map(|name| Organization { name }),
            manufacturer,
            publisher: component.publisher.clone(),
            hashes: component
                .checksum
                .iter()
                .map(|c| Hash {
                    alg: "SHA-256",
                    content: c.clone(),
                })
                .collect(),
            licenses,
            purl: component.purl.clone(),
            properties: component_properties(component, ctx)
                .into_iter()
                .map(|(name, value)| Property { name, value })
                .collect(),
            components: members,
        }
    }

    fn placeholder(name: &str) -> CdxComponent {
        CdxComponent {
            component_type: "library",
            bom_ref: external_ref(name),
            name: name.to_string(),
            version: None,
            description: None,
            scope: Some("excluded"),
            supplier: None,
            manufacturer: None,
            publisher: None,
            hashes: Vec::new(),
            licenses: Vec::new(),
            purl: None,
            properties: vec![Property {
                name: EXTERNAL_PROPERTY.to_string(),
                value: "true".to_string(),
            }],
            components: Vec::new(),
        }
    }

    fn tools(&self) -> Tools {
        if self.version.has_tool_components() {
            Tools::Components {
                components: vec![ToolComponent {
                    component_type: "application",
                    name: TOOL_NAME,
                    version: TOOL_VERSION,
                }],
            }
        } else {
            Tools::Legacy(vec![LegacyTool {
                vendor: TOOL_NAME,
                name: TOOL_NAME,
                version: TOOL_VERSION,
            }])
        }
    }
}

/// `bom-ref` of the placeholder for an external dependency.
#[must_use]
pub fn external_ref(name: &str) -> String {
    format!("{EXTERNAL_REF_PREFIX}{name}")
}

fn target_ref(target: &EdgeTarget) -> String {
    match target {
        EdgeTarget::Resolved(r) => r.to_string(),
        EdgeTarget::Pending(name) | EdgeTarget::External(name) => external_ref(name),
    }
}

impl DocumentWriter for CycloneDxWriter {
    fn format(&self) -> OutputFormat {
        OutputFormat::CycloneDx(self.version)
    }

    fn write_document(&self, registry: &Registry, ctx: &DocumentContext) -> Result<String> {
        let mut components: Vec<CdxComponent> = registry
            .roots()
            .map(|c| self.component(registry, c, ctx))
            .collect();
        let externals = registry.external_targets();
        components.extend(externals.iter().map(|name| Self::placeholder(name)));

        let mut dependencies: Vec<Dependency> = registry
            .components()
            .map(|c| Dependency {
                bom_ref: c.bom_ref().to_string(),
                depends_on: depends_on(registry, c.bom_ref()),
            })
            .collect();
        dependencies.extend(externals.iter().map(|name| Dependency {
            bom_ref: external_ref(name),
            depends_on: Vec::new(),
        }));

        let organization = ctx.organization.clone().map(|name| Organization { name });
        let bom = Bom {
            bom_format: "CycloneDX",
            spec_version: self.version.as_str(),
            serial_number: ctx.serial_urn(),
            version: 1,
            metadata: Metadata {
                timestamp: ctx.created.clone(),
                tools: self.tools(),
                manufacture: organization
                    .clone()
                    .filter(|_| !self.version.has_manufacturer()),
                manufacturer: organization.filter(|_| self.version.has_manufacturer()),
            },
            components,
            dependencies,
        };

        ctx.to_json(&bom).map_err(|e| {
            BinsbomError::generation(
                "serializing CycloneDX",
                GenerationErrorKind::Serialization(e.to_string()),
            )
        })
    }
}

fn depends_on(registry: &Registry, from: &BomRef) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for edge in registry.edges() {
        if &edge.from != from || edge.kind != EdgeKind::DependsOn {
            continue;
        }
        let target = target_ref(&edge.to);
        if !out.contains(&target) {
            out.push(target);
        }
    }
    out
}
