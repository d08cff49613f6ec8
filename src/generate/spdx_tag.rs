//! SPDX 2.3 tag-value writer.

use std::fmt::Write as _;

use super::context::{DocumentContext, TOOL_NAME, TOOL_VERSION};
use super::format::OutputFormat;
use super::traits::{component_properties, DocumentWriter};
use crate::error::{BinsbomError, GenerationErrorKind, Result};
use crate::model::{
    spdx_idstring, Component, ComponentType, EdgeKind, EdgeTarget, Registry, NOASSERTION,
};
use crate::utils::sha256_hex;

/// Document reference that external dependency targets live under.
pub const EXTERNAL_DOCUMENT_REF: &str = "DocumentRef-external";

/// SPDX 2.3 tag-value writer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpdxTagValueWriter;

impl SpdxTagValueWriter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// `DocumentRef-external:SPDXRef-<name>` for a dependency nothing in the run provides.
#[must_use]
pub fn external_element(name: &str) -> String {
    format!("{EXTERNAL_DOCUMENT_REF}:SPDXRef-{}", spdx_idstring(name))
}

const fn purpose(component_type: ComponentType) -> &'static str {
    match component_type {
        ComponentType::Library => "LIBRARY",
        ComponentType::Application => "APPLICATION",
        ComponentType::File => "FILE",
        ComponentType::Framework => "FRAMEWORK",
        ComponentType::Source => "SOURCE",
    }
}

/// Values that may span lines are wrapped in `<text>`.
fn text_value(value: &str) -> String {
    if value.contains('\n') || value.contains(':') {
        format!("<text>{value}</text>")
    } else {
        value.to_string()
    }
}

fn write_package(out: &mut String, component: &Component, ctx: &DocumentContext) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(out, "##### Package: {}", component.name)?;
    writeln!(out)?;
    writeln!(out, "PackageName: {}", component.name)?;
    writeln!(out, "SPDXID: {}", component.bom_ref().spdx_id())?;
    if let Some(version) = &component.version {
        writeln!(out, "PackageVersion: {version}")?;
    }
    match &component.supplier {
        Some(supplier) => writeln!(out, "PackageSupplier: Organization: {supplier}")?,
        None => writeln!(out, "PackageSupplier: {NOASSERTION}")?,
    }
    if let Some(manufacturer) = &component.manufacturer {
        writeln!(out, "PackageOriginator: Organization: {manufacturer}")?;
    }
    if let Some(path) = &component.file_path {
        writeln!(out, "PackageFileName: {}", path.display())?;
    }
    writeln!(out, "PackageDownloadLocation: {NOASSERTION}")?;
    writeln!(out, "FilesAnalyzed: false")?;
    if let Some(checksum) = &component.checksum {
        writeln!(out, "PackageChecksum: SHA256: {checksum}")?;
    }
    // No separate concluded-license analysis runs; both carry the known license
    let license = component.license.spdx_or_noassertion();
    writeln!(out, "PackageLicenseConcluded: {license}")?;
    writeln!(out, "PackageLicenseDeclared: {license}")?;
    writeln!(out, "PackageCopyrightText: {NOASSERTION}")?;
    if let Some(description) = &component.description {
        writeln!(out, "PackageDescription: {}", text_value(description))?;
    }
    let props = component_properties(component, ctx);
    if !props.is_empty() {
        let lines: Vec<String> = props.iter().map(|(k, v)| format!("{k}={v}")).collect();
        writeln!(out, "PackageComment: <text>{}</text>", lines.join("\n"))?;
    }
    if let Some(purl) = &component.purl {
        writeln!(out, "ExternalRef: PACKAGE-MANAGER purl {purl}")?;
    }
    writeln!(out, "PrimaryPackagePurpose: {}", purpose(component.component_type))?;
    Ok(())
}

impl SpdxTagValueWriter {
    fn render(
        &self,
        registry: &Registry,
        ctx: &DocumentContext,
    ) -> std::result::Result<String, std::fmt::Error> {
        let mut out = String::new();
        writeln!(out, "SPDXVersion: SPDX-2.3")?;
        writeln!(out, "DataLicense: CC0-1.0")?;
        writeln!(out, "SPDXID: SPDXRef-DOCUMENT")?;
        writeln!(out, "DocumentName: {}", ctx.name)?;
        writeln!(out, "DocumentNamespace: {}", ctx.namespace)?;

        let externals = registry.external_targets();
        if !externals.is_empty() {
            // The referenced document is never materialized; its checksum
            // covers the list of names it stands for.
            let digest = sha256_hex(externals.join("\n").as_bytes());
            writeln!(
                out,
                "ExternalDocumentRef: {EXTERNAL_DOCUMENT_REF} {}/external SHA256: {digest}",
                ctx.namespace
            )?;
        }

        writeln!(out, "Creator: Tool: {TOOL_NAME}-{TOOL_VERSION}")?;
        if let Some(org) = &ctx.organization {
            writeln!(out, "Creator: Organization: {org}")?;
        }
        writeln!(out, "Created: {}", ctx.created)?;

        for component in registry.components() {
            write_package(&mut out, component, ctx)?;
        }

        writeln!(out)?;
        writeln!(out, "##### Relationships")?;
        writeln!(out)?;
        for root in registry.roots() {
            writeln!(
                out,
                "Relationship: SPDXRef-DOCUMENT DESCRIBES {}",
                root.bom_ref().spdx_id()
            )?;
        }
        for edge in registry.edges() {
            let kind = match edge.kind {
                EdgeKind::DependsOn => "DEPENDS_ON",
                EdgeKind::Contains => "CONTAINS",
            };
            let target = match &edge.to {
                EdgeTarget::Resolved(to) => to.spdx_id(),
                EdgeTarget::External(name) => external_element(name),
                EdgeTarget::Pending(_) => NOASSERTION.to_string(),
            };
            writeln!(out, "Relationship: {} {kind} {target}", edge.from.spdx_id())?;
        }
        Ok(out)
    }
}

impl DocumentWriter for SpdxTagValueWriter {
    fn format(&self) -> OutputFormat {
        OutputFormat::SpdxTagValue
    }

    fn write_document(&self, registry: &Registry, ctx: &DocumentContext) -> Result<String> {
        self.render(registry, ctx).map_err(|e| {
            BinsbomError::generation(
                "rendering SPDX tag-value",
                GenerationErrorKind::Serialization(e.to_string()),
            )
        })
    }
}
