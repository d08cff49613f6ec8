//! The uniform extraction contract implemented by every format extractor.

use std::path::Path;

use super::dwarf::DebugInfo;
use super::reader::{self, Artifact};
use super::types::{
    Architecture, BuildInfo, DependencyInfo, ExtractResult, ExtractedArtifact, SectionInfo,
    SymbolInfo, VendorInfo,
};
use crate::utils::sha256_hex;

/// Header-level facts gathered in one pass.
#[derive(Debug, Clone, Default)]
pub struct HeaderInfo {
    pub architectures: Vec<Architecture>,
    pub build_info: BuildInfo,
    pub vendor: VendorInfo,
}

/// Capability set of a binary format extractor.
///
/// Implementations hold no mutable state and can be shared across worker
/// threads. Every method takes an already-opened [`Artifact`] so one file is
/// read once, however many queries run over it.
pub trait BinaryExtractor: Send + Sync {
    /// Human-readable format name (e.g. "ELF").
    fn format_name(&self) -> &'static str;

    /// Dispatch priority. Lower values are tried first.
    fn priority(&self) -> u32;

    /// Pure magic-number check over the leading bytes of a file.
    fn matches_magic(&self, header: &[u8]) -> bool;

    /// Cheap check of a path. Never fails: unreadable input yields `false`.
    fn can_handle(&self, path: &Path) -> bool {
        reader::read_prefix(path).is_ok_and(|header| self.matches_magic(&header))
    }

    fn extract_symbols(&self, artifact: &Artifact) -> ExtractResult<Vec<SymbolInfo>>;

    fn extract_sections(&self, artifact: &Artifact) -> ExtractResult<Vec<SectionInfo>>;

    /// Embedded version, if any. Absence is `Ok(None)`, not an error.
    fn extract_version(&self, artifact: &Artifact) -> ExtractResult<Option<String>>;

    /// Libraries named in dynamic-link metadata, normalized.
    fn extract_dependencies(&self, artifact: &Artifact) -> ExtractResult<Vec<DependencyInfo>>;

    fn extract_functions(&self, _artifact: &Artifact) -> ExtractResult<Vec<String>> {
        Ok(Vec::new())
    }

    fn extract_compile_units(&self, _artifact: &Artifact) -> ExtractResult<Vec<String>> {
        Ok(Vec::new())
    }

    fn extract_source_files(&self, _artifact: &Artifact) -> ExtractResult<Vec<String>> {
        Ok(Vec::new())
    }

    /// Functions, compile units and source files together.
    ///
    /// Formats that carry DWARF override this to read the debug sections once
    /// and answer the three single queries from it.
    fn extract_debug_info(&self, artifact: &Artifact) -> ExtractResult<DebugInfo> {
        Ok(DebugInfo {
            compile_units: self.extract_compile_units(artifact)?,
            source_files: self.extract_source_files(artifact)?,
            functions: self.extract_functions(artifact)?,
        })
    }

    /// Architectures, build id, file kind and vendor strings.
    fn extract_header(&self, artifact: &Artifact) -> ExtractResult<HeaderInfo>;

    /// Nested files (archive members). Empty for single-object formats.
    fn extract_members(&self, _artifact: &Artifact) -> ExtractResult<Vec<ExtractedArtifact>> {
        Ok(Vec::new())
    }

    /// Run every query and assemble a self-contained result.
    ///
    /// Header, symbol, section, version and dependency failures fail the
    /// file. Debug-info failures are recorded as diagnostics.
    fn extract(&self, artifact: &Artifact) -> ExtractResult<ExtractedArtifact> {
        assemble(self, artifact)
    }
}

/// Body of [`BinaryExtractor::extract`], callable from overriding impls.
pub(crate) fn assemble<E: BinaryExtractor + ?Sized>(
    extractor: &E,
    artifact: &Artifact,
) -> ExtractResult<ExtractedArtifact> {
    let header = extractor.extract_header(artifact)?;
    let symbols = extractor.extract_symbols(artifact)?;
    let sections = extractor.extract_sections(artifact)?;
    let version = extractor.extract_version(artifact)?;
    let dependencies = extractor.extract_dependencies(artifact)?;
    let members = extractor.extract_members(artifact)?;

    let mut diagnostics = Vec::new();
    let debug = extractor.extract_debug_info(artifact).unwrap_or_else(|err| {
        tracing::debug!("skipping debug info: {err}");
        diagnostics.push(format!("debug info: {}", err.kind));
        DebugInfo::default()
    });

    Ok(ExtractedArtifact {
        path: artifact.path().to_path_buf(),
        format: extractor.format_name().to_string(),
        file_size: artifact.len() as u64,
        checksum: sha256_hex(artifact.bytes()),
        architectures: header.architectures,
        build_info: header.build_info,
        vendor: header.vendor,
        version,
        symbols,
        sections,
        dependencies,
        functions: debug.functions,
        compile_units: debug.compile_units,
        source_files: debug.source_files,
        members,
        diagnostics,
    })
}
