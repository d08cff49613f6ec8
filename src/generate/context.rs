//! Generator settings and per-document identity.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::model::{PurlType, Registry};
use crate::utils::deterministic_uuid;

pub const TOOL_NAME: &str = "binsbom";
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Settings shared by every output format.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Document name; defaults to the first root component's name
    pub document_name: Option<String>,
    /// Base URI for SPDX document namespaces
    pub namespace_base: String,
    /// Fixed creation time for reproducible output
    pub timestamp: Option<DateTime<Utc>>,
    /// Organization listed as document creator
    pub organization: Option<String>,
    /// PURL type for components without a package-manager hint
    pub purl_type: PurlType,
    pub purl_namespace: Option<String>,
    /// Emit function and source-file lists as properties
    pub include_debug_details: bool,
    pub pretty: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            document_name: None,
            namespace_base: "https://binsbom.dev/spdxdocs".to_string(),
            timestamp: None,
            organization: None,
            purl_type: PurlType::Generic,
            purl_namespace: None,
            include_debug_details: true,
            pretty: true,
        }
    }
}

impl GeneratorConfig {
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    #[must_use]
    pub fn with_document_name(mut self, name: impl Into<String>) -> Self {
        self.document_name = Some(name.into());
        self
    }
}

/// Values every serializer stamps on a document, computed once per run.
#[derive(Debug, Clone)]
pub struct DocumentContext {
    pub name: String,
    /// SPDX document namespace (IRI)
    pub namespace: String,
    pub serial: uuid::Uuid,
    /// ISO-8601 UTC, second precision
    pub created: String,
    pub organization: Option<String>,
    pub include_debug_details: bool,
    pub pretty: bool,
}

impl DocumentContext {
    /// Derive identity from registry content and the creation time, so the
    /// same input yields the same serial number and namespace.
    #[must_use]
    pub fn new(registry: &Registry, config: &GeneratorConfig) -> Self {
        let timestamp = config.timestamp.unwrap_or_else(Utc::now);
        let created = timestamp.to_rfc3339_opts(SecondsFormat::Secs, true);

        let name = config
            .document_name
            .clone()
            .or_else(|| registry.roots().next().map(|c| c.name.clone()))
            .unwrap_or_else(|| "binsbom-document".to_string());

        let serial = deterministic_uuid(&fingerprint(registry, &created));
        let namespace = format!(
            "{}/{}-{}",
            config.namespace_base.trim_end_matches('/'),
            crate::model::spdx_idstring(&name),
            serial
        );

        Self {
            name,
            namespace,
            serial,
            created,
            organization: config.organization.clone(),
            include_debug_details: config.include_debug_details,
            pretty: config.pretty,
        }
    }

    /// `urn:uuid:` form used by CycloneDX.
    #[must_use]
    pub fn serial_urn(&self) -> String {
        format!("urn:uuid:{}", self.serial)
    }

    /// Render JSON honoring the `pretty` setting.
    pub fn to_json<T: serde::Serialize>(&self, value: &T) -> serde_json::Result<String> {
        if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
    }
}

fn fingerprint(registry: &Registry, created: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(created.as_bytes());
    for component in registry.components() {
        buf.push(0);
        buf.extend_from_slice(component.bom_ref().as_str().as_bytes());
        buf.push(0);
        buf.extend_from_slice(component.checksum.as_deref().unwrap_or("").as_bytes());
        buf.push(0);
        buf.extend_from_slice(component.version.as_deref().unwrap_or("").as_bytes());
    }
    for edge in registry.edges() {
        buf.push(1);
        buf.extend_from_slice(edge.from.as_str().as_bytes());
        buf.push(0);
        buf.extend_from_slice(edge.to.label().as_bytes());
        buf.push(0);
        buf.extend_from_slice(edge.kind.as_str().as_bytes());
    }
    buf
}
