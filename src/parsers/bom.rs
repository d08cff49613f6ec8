//! Format-neutral view of a document read back from disk.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::generate::external_ref;
use crate::model::{ComponentType, EdgeKind, EdgeTarget, Registry, NOASSERTION};

/// The fields of a component the comparator looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedComponent {
    pub name: String,
    pub version: Option<String>,
    pub component_type: ComponentType,
    pub purl: Option<String>,
    /// SPDX expression or `NOASSERTION`
    pub license: String,
    pub checksum: Option<String>,
}

impl ParsedComponent {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            component_type: ComponentType::Library,
            purl: None,
            license: NOASSERTION.to_string(),
            checksum: None,
        }
    }
}

/// A directed relationship between two document references.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

/// Components keyed by document reference, plus edges between references.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedBom {
    pub components: IndexMap<String, ParsedComponent>,
    /// References that stand for dependencies outside the document, with
    /// the library name each one carries
    pub externals: IndexMap<String, String>,
    pub edges: IndexSet<ParsedEdge>,
}

impl ParsedBom {
    /// Human name behind a reference: the component name, the external
    /// library name, or the reference itself.
    #[must_use]
    pub fn name_of<'a>(&'a self, reference: &'a str) -> &'a str {
        self.components
            .get(reference)
            .map(|c| c.name.as_str())
            .or_else(|| self.externals.get(reference).map(String::as_str))
            .unwrap_or(reference)
    }

    pub(crate) fn push_edge(&mut self, from: impl Into<String>, to: impl Into<String>, kind: EdgeKind) {
        self.edges.insert(ParsedEdge {
            from: from.into(),
            to: to.into(),
            kind,
        });
    }

    /// The same view built straight from an in-memory registry.
    #[must_use]
    pub fn from_registry(registry: &Registry) -> Self {
        let mut bom = Self::default();
        for component in registry.components() {
            bom.components.insert(
                component.bom_ref().to_string(),
                ParsedComponent {
                    name: component.name.clone(),
                    version: component.version.clone(),
                    component_type: component.component_type,
                    purl: component.purl.clone(),
                    license: component.license.spdx_or_noassertion().to_string(),
                    checksum: component.checksum.clone(),
                },
            );
        }
        for edge in registry.edges() {
            let to = match &edge.to {
                EdgeTarget::Resolved(to) => to.to_string(),
                EdgeTarget::Pending(name) | EdgeTarget::External(name) => {
                    let reference = external_ref(name);
                    bom.externals.insert(reference.clone(), name.clone());
                    reference
                }
            };
            bom.push_edge(edge.from.to_string(), to, edge.kind);
        }
        bom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Component;

    #[test]
    fn test_from_registry() {
        let mut registry = Registry::new();
        let app = registry.register_component(Component::new("app")).unwrap();
        registry.add_dependency_by_name(&app, "libc.so.6").unwrap();
        registry.resolve_edges();

        let bom = ParsedBom::from_registry(&registry);
        assert_eq!(bom.components.len(), 1);
        assert_eq!(bom.edges.len(), 1);
        assert_eq!(bom.edges[0].to, "external:libc.so.6");
        assert_eq!(bom.name_of("external:libc.so.6"), "libc.so.6");
        assert_eq!(bom.name_of("app"), "app");
        assert_eq!(bom.name_of("unknown"), "unknown");
    }

    #[test]
    fn test_repeated_edges_collapse() {
        let mut bom = ParsedBom::default();
        for _ in 0..3 {
            bom.push_edge("app", "libA", EdgeKind::DependsOn);
        }
        bom.push_edge("app", "libA", EdgeKind::Contains);
        bom.push_edge("app", "libB", EdgeKind::DependsOn);

        assert_eq!(bom.edges.len(), 3);
        assert_eq!(bom.edges[1].kind, EdgeKind::Contains);
        assert_eq!(bom.edges[2].to, "libB");
    }
}
