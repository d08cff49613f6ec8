//! SPDX 3.0 / 3.0.1 JSON-LD writer.
//!
//! Emits a flat `@graph`: one `CreationInfo` blank node, the tool and
//! creator agents, the `SpdxDocument`, one element per component, license
//! expressions, and `Relationship` elements for dependencies, containment
//! and declared licenses.

use indexmap::IndexMap;
use serde::Serialize;

use super::context::{DocumentContext, TOOL_NAME, TOOL_VERSION};
use super::format::{OutputFormat, Spdx3Version};
use super::traits::{component_properties, DocumentWriter};
use crate::error::{BinsbomError, GenerationErrorKind, Result};
use crate::model::{spdx_idstring, Component, ComponentType, EdgeKind, EdgeTarget, Registry};

/// IRI prefix for dependency targets nothing in the run provides.
pub const EXTERNAL_URN_PREFIX: &str = "urn:binsbom:external:";

const CREATION_INFO_ID: &str = "_:creationinfo";

#[derive(Debug, Serialize)]
struct Document {
    #[serde(rename = "@context")]
    context: &'static str,
    #[serde(rename = "@graph")]
    graph: Vec<Element>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum Element {
    CreationInfo(CreationInfo),
    Tool(Agent),
    Organization(Agent),
    SpdxDocument(SpdxDocument),
    #[serde(rename = "software_Package")]
    Package(Package),
    #[serde(rename = "software_File")]
    File(Package),
    #[serde(rename = "simplelicensing_LicenseExpression")]
    LicenseExpression(LicenseElement),
    Relationship(Relationship),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreationInfo {
    #[serde(rename = "@id")]
    id: &'static str,
    spec_version: &'static str,
    created: String,
    created_by: Vec<String>,
    created_using: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Agent {
    spdx_id: String,
    name: String,
    creation_info: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExternalMap {
    #[serde(rename = "type")]
    map_type: &'static str,
    external_spdx_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpdxDocument {
    spdx_id: String,
    name: String,
    creation_info: &'static str,
    profile_conformance: Vec<&'static str>,
    root_element: Vec<String>,
    element: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    external_map: Vec<ExternalMap>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Hash {
    #[serde(rename = "type")]
    hash_type: &'static str,
    algorithm: &'static str,
    hash_value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Package {
    spdx_id: String,
    name: String,
    creation_info: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    supplied_by: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    originated_by: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    verified_using: Vec<Hash>,
    #[serde(rename = "software_primaryPurpose")]
    primary_purpose: &'static str,
    #[serde(rename = "software_packageVersion", skip_serializing_if = "Option::is_none")]
    package_version: Option<String>,
    #[serde(rename = "software_packageUrl", skip_serializing_if = "Option::is_none")]
    package_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LicenseElement {
    spdx_id: String,
    creation_info: &'static str,
    #[serde(rename = "simplelicensing_licenseExpression")]
    expression: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Relationship {
    spdx_id: String,
    creation_info: &'static str,
    from: String,
    relationship_type: &'static str,
    to: Vec<String>,
}

/// SPDX 3 JSON-LD writer for one revision.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spdx3Writer {
    version: Spdx3Version,
}

impl Spdx3Writer {
    #[must_use]
    pub const fn new(version: Spdx3Version) -> Self {
        Self { version }
    }
}

/// IRI standing in for an external dependency.
#[must_use]
pub fn external_iri(name: &str) -> String {
    format!("{EXTERNAL_URN_PREFIX}{name}")
}

const fn purpose(component_type: ComponentType) -> &'static str {
    match component_type {
        ComponentType::Library => "library",
        ComponentType::Application => "application",
        ComponentType::File => "file",
        ComponentType::Framework => "framework",
        ComponentType::Source => "source",
    }
}

/// Allocates element IRIs under the document namespace.
struct Ids<'a> {
    namespace: &'a str,
    relationships: usize,
}

impl Ids<'_> {
    fn element(&self, local: &str) -> String {
        format!("{}#{local}", self.namespace)
    }

    fn component(&self, component: &Component) -> String {
        self.element(&component.bom_ref().spdx_id())
    }

    fn organization(&self, name: &str) -> String {
        self.element(&format!("Organization-{}", spdx_idstring(name)))
    }

    fn next_relationship(&mut self) -> String {
        self.relationships += 1;
        self.element(&format!("SPDXRef-Relationship-{}", self.relationships))
    }
}

impl Spdx3Writer {
    fn package(component: &Component, ids: &Ids<'_>, ctx: &DocumentContext) -> Package {
        let props = component_properties(component, ctx);
        let comment = (!props.is_empty()).then(|| {
            props
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("\n")
        });
        Package {
            spdx_id: ids.component(component),
            name: component.name.clone(),
            creation_info: CREATION_INFO_ID,
            description: component.description.clone(),
            comment,
            supplied_by: component
                .supplier
                .iter()
                .map(|s| ids.organization(s))
                .collect(),
            originated_by: component
                .manufacturer
                .iter()
                .map(|m| ids.organization(m))
                .collect(),
            verified_using: component
                .checksum
                .iter()
                .map(|c| Hash {
                    hash_type: "Hash",
                    algorithm: "sha256",
                    hash_value: c.clone(),
                })
                .collect(),
            primary_purpose: purpose(component.component_type),
            package_version: component.version.clone(),
            package_url: component.purl.clone(),
        }
    }

    fn build(&self, registry: &Registry, ctx: &DocumentContext) -> Document {
        let mut ids = Ids {
            namespace: &ctx.namespace,
            relationships: 0,
        };
        let tool_id = ids.element(&format!("Tool-{TOOL_NAME}"));

        // Organizations are shared elements keyed by name.
        let mut organizations: IndexMap<String, String> = IndexMap::new();
        if let Some(org) = &ctx.organization {
            organizations.insert(ids.organization(org), org.clone());
        }
        for component in registry.components() {
            for name in component.supplier.iter().chain(component.manufacturer.iter()) {
                organizations
                    .entry(ids.organization(name))
                    .or_insert_with(|| name.clone());
            }
        }

        let created_by = match &ctx.organization {
            Some(org) => ids.organization(org),
            None => tool_id.clone(),
        };

        let mut graph = vec![
            Element::CreationInfo(CreationInfo {
                id: CREATION_INFO_ID,
                spec_version: self.version.spec_version(),
                created: ctx.created.clone(),
                created_by: vec![created_by],
                created_using: vec![tool_id.clone()],
            }),
            Element::Tool(Agent {
                spdx_id: tool_id,
                name: format!("{TOOL_NAME}-{TOOL_VERSION}"),
                creation_info: CREATION_INFO_ID,
            }),
        ];
        for (spdx_id, name) in &organizations {
            graph.push(Element::Organization(Agent {
                spdx_id: spdx_id.clone(),
                name: name.clone(),
                creation_info: CREATION_INFO_ID,
            }));
        }

        let mut body = Vec::new();
        let mut relationships = Vec::new();
        let no_assertion = format!("{}/Licensing/NoAssertion", self.version.terms_base());

        for component in registry.components() {
            let package = Self::package(component, &ids, ctx);
            let package_id = package.spdx_id.clone();
            body.push(if component.component_type == ComponentType::File {
                Element::File(package)
            } else {
                Element::Package(package)
            });

            let license_target = if component.license.is_noassertion() {
                no_assertion.clone()
            } else {
                let license_id = ids.element(&format!(
                    "SPDXRef-License-{}",
                    spdx_idstring(component.bom_ref().as_str())
                ));
                body.push(Element::LicenseExpression(LicenseElement {
                    spdx_id: license_id.clone(),
                    creation_info: CREATION_INFO_ID,
                    expression: component.license.spdx_or_noassertion().to_string(),
                }));
                license_id
            };
            relationships.push(Relationship {
                spdx_id: ids.next_relationship(),
                creation_info: CREATION_INFO_ID,
                from: package_id,
                relationship_type: "hasDeclaredLicense",
                to: vec![license_target],
            });
        }

        for edge in registry.edges() {
            let Some(from) = registry.get(&edge.from) else {
                continue;
            };
            let to = match &edge.to {
                EdgeTarget::Resolved(to) => match registry.get(to) {
                    Some(target) => ids.component(target),
                    None => continue,
                },
                EdgeTarget::External(name) | EdgeTarget::Pending(name) => external_iri(name),
            };
            relationships.push(Relationship {
                spdx_id: ids.next_relationship(),
                creation_info: CREATION_INFO_ID,
                from: ids.component(from),
                relationship_type: match edge.kind {
                    EdgeKind::DependsOn => "dependsOn",
                    EdgeKind::Contains => "contains",
                },
                to: vec![to],
            });
        }

        let roots: Vec<String> = registry.roots().map(|c| ids.component(c)).collect();
        let document_id = ids.element("SPDXRef-DOCUMENT");
        if !roots.is_empty() {
            relationships.push(Relationship {
                spdx_id: ids.next_relationship(),
                creation_info: CREATION_INFO_ID,
                from: document_id.clone(),
                relationship_type: "describes",
                to: roots.clone(),
            });
        }

        let mut elements: Vec<String> = organizations.keys().cloned().collect();
        elements.extend(body.iter().filter_map(element_id));
        elements.extend(relationships.iter().map(|r| r.spdx_id.clone()));

        graph.push(Element::SpdxDocument(SpdxDocument {
            spdx_id: document_id,
            name: ctx.name.clone(),
            creation_info: CREATION_INFO_ID,
            profile_conformance: vec!["core", "software", "simpleLicensing"],
            root_element: roots,
            element: elements,
            external_map: registry
                .external_targets()
                .into_iter()
                .map(|name| ExternalMap {
                    map_type: "ExternalMap",
                    external_spdx_id: external_iri(name),
                })
                .collect(),
        }));
        graph.extend(body);
        graph.extend(relationships.into_iter().map(Element::Relationship));

        Document {
            context: self.version.context_url(),
            graph,
        }
    }
}

fn element_id(element: &Element) -> Option<String> {
    match element {
        Element::Package(p) | Element::File(p) => Some(p.spdx_id.clone()),
        Element::LicenseExpression(l) => Some(l.spdx_id.clone()),
        _ => None,
    }
}

impl DocumentWriter for Spdx3Writer {
    fn format(&self) -> OutputFormat {
        OutputFormat::SpdxJson(self.version)
    }

    fn write_document(&self, registry: &Registry, ctx: &DocumentContext) -> Result<String> {
        let document = self.build(registry, ctx);
        ctx.to_json(&document).map_err(|e| {
            BinsbomError::generation(
                "serializing SPDX 3 JSON-LD",
                GenerationErrorKind::Serialization(e.to_string()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::GeneratorConfig;
    use crate::model::LicenseExpression;
    use chrono::TimeZone;
    use serde_json::Value;

    fn render(version: Spdx3Version) -> Value {
        let mut registry = Registry::new();
        let archive = registry
            .register_component(Component::new("libfoo.a").with_checksum("00"))
            .unwrap();
        let mut member = Component::new("foo.o").with_type(ComponentType::File);
        member.container = Some(archive.clone());
        registry.register_component(member).unwrap();
        registry
            .register_component(
                Component::new("app")
                    .with_type(ComponentType::Application)
                    .with_license(LicenseExpression::new("MIT")),
            )
            .unwrap();
        let app = registry.find_by_name("app").unwrap().bom_ref().clone();
        registry.add_dependency_by_name(&app, "libfoo.a").unwrap();
        registry.add_dependency_by_name(&app, "libm.so.6").unwrap();
        registry.resolve_edges();

        let config = GeneratorConfig::default()
            .with_timestamp(chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let ctx = DocumentContext::new(&registry, &config);
        let out = Spdx3Writer::new(version).write_document(&registry, &ctx).unwrap();
        serde_json::from_str(&out).unwrap()
    }

    fn of_type<'a>(doc: &'a Value, ty: &str) -> Vec<&'a Value> {
        doc["@graph"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|e| e["type"] == ty)
            .collect()
    }

    #[test]
    fn test_graph_shape() {
        let doc = render(Spdx3Version::V3_0_1);
        assert_eq!(
            doc["@context"],
            "https://spdx.org/rdf/3.0.1/spdx-context.jsonld"
        );
        let info = of_type(&doc, "CreationInfo");
        assert_eq!(info[0]["@id"], "_:creationinfo");
        assert_eq!(info[0]["specVersion"], "3.0.1");
        assert_eq!(info[0]["created"], "2024-01-01T00:00:00Z");

        assert_eq!(of_type(&doc, "software_Package").len(), 2);
        assert_eq!(of_type(&doc, "software_File").len(), 1);

        let document = of_type(&doc, "SpdxDocument");
        assert_eq!(document[0]["rootElement"].as_array().unwrap().len(), 2);
        assert_eq!(
            document[0]["externalMap"][0]["externalSpdxId"],
            "urn:binsbom:external:libm.so.6"
        );
    }

    #[test]
    fn test_relationships() {
        let doc = render(Spdx3Version::V3_0);
        assert_eq!(of_type(&doc, "CreationInfo")[0]["specVersion"], "3.0.0");
        let rels = of_type(&doc, "Relationship");
        let kinds: Vec<&str> = rels
            .iter()
            .map(|r| r["relationshipType"].as_str().unwrap())
            .collect();
        assert_eq!(kinds.iter().filter(|k| **k == "hasDeclaredLicense").count(), 3);
        assert_eq!(kinds.iter().filter(|k| **k == "dependsOn").count(), 2);
        assert_eq!(kinds.iter().filter(|k| **k == "describes").count(), 1);

        let licenses = of_type(&doc, "simplelicensing_LicenseExpression");
        assert_eq!(licenses.len(), 1);
        assert_eq!(licenses[0]["simplelicensing_licenseExpression"], "MIT");
        assert!(rels.iter().any(|r| r["to"][0]
            .as_str()
            .unwrap()
            .ends_with("/Licensing/NoAssertion")));
    }
}
