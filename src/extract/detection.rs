//! Magic-byte probing and extractor selection.
//!
//! The dispatcher owns an explicit, priority-ordered set of extractors and
//! is constructed once per run; there is no global registration.

use std::path::Path;

use super::archive::{ArchiveExtractor, AR_MAGIC, AR_THIN_MAGIC};
use super::dwarf::DebugInfo;
use super::elf::{ElfExtractor, ELF_MAGIC};
use super::macho::MachOExtractor;
use super::pe::PeExtractor;
use super::reader::{self, Artifact};
use super::traits::{BinaryExtractor, HeaderInfo};
use super::types::{
    DependencyInfo, ExtractError, ExtractErrorKind, ExtractResult, ExtractedArtifact,
    SectionInfo, SymbolInfo,
};
use crate::error::{BinsbomError, DispatchErrorKind};

/// Default cap on the size of a single input file (1 GiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1 << 30;

/// Container format recognized from leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryFormat {
    Elf,
    MachO,
    MachOFat,
    Pe,
    Archive,
}

impl BinaryFormat {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Elf => "ELF",
            Self::MachO => "Mach-O",
            Self::MachOFat => "Mach-O (universal)",
            Self::Pe => "PE",
            Self::Archive => "Archive",
        }
    }
}

impl std::fmt::Display for BinaryFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Identify the container format from the first bytes of a file.
#[must_use]
pub fn probe_magic(header: &[u8]) -> Option<BinaryFormat> {
    if header.starts_with(&ELF_MAGIC) {
        return Some(BinaryFormat::Elf);
    }
    if header.starts_with(AR_MAGIC) || header.starts_with(AR_THIN_MAGIC) {
        return Some(BinaryFormat::Archive);
    }
    if MachOExtractor::is_fat(header) {
        return Some(BinaryFormat::MachOFat);
    }
    if MachOExtractor::new().matches_magic(header) {
        return Some(BinaryFormat::MachO);
    }
    if PeExtractor::is_pe(header) {
        return Some(BinaryFormat::Pe);
    }
    None
}

// ============================================================================
// Extractor set
// ============================================================================

/// The closed set of built-in extractors.
#[derive(Debug, Clone, Copy)]
pub enum Extractor {
    Elf(ElfExtractor),
    MachO(MachOExtractor),
    Pe(PeExtractor),
    Archive(ArchiveExtractor),
}

impl Extractor {
    fn inner(&self) -> &dyn BinaryExtractor {
        match self {
            Self::Elf(e) => e,
            Self::MachO(e) => e,
            Self::Pe(e) => e,
            Self::Archive(e) => e,
        }
    }
}

impl BinaryExtractor for Extractor {
    fn format_name(&self) -> &'static str {
        self.inner().format_name()
    }

    fn priority(&self) -> u32 {
        self.inner().priority()
    }

    fn matches_magic(&self, header: &[u8]) -> bool {
        self.inner().matches_magic(header)
    }

    fn extract_symbols(&self, artifact: &Artifact) -> ExtractResult<Vec<SymbolInfo>> {
        self.inner().extract_symbols(artifact)
    }

    fn extract_sections(&self, artifact: &Artifact) -> ExtractResult<Vec<SectionInfo>> {
        self.inner().extract_sections(artifact)
    }

    fn extract_version(&self, artifact: &Artifact) -> ExtractResult<Option<String>> {
        self.inner().extract_version(artifact)
    }

    fn extract_dependencies(&self, artifact: &Artifact) -> ExtractResult<Vec<DependencyInfo>> {
        self.inner().extract_dependencies(artifact)
    }

    fn extract_functions(&self, artifact: &Artifact) -> ExtractResult<Vec<String>> {
        self.inner().extract_functions(artifact)
    }

    fn extract_compile_units(&self, artifact: &Artifact) -> ExtractResult<Vec<String>> {
        self.inner().extract_compile_units(artifact)
    }

    fn extract_source_files(&self, artifact: &Artifact) -> ExtractResult<Vec<String>> {
        self.inner().extract_source_files(artifact)
    }

    fn extract_debug_info(&self, artifact: &Artifact) -> ExtractResult<DebugInfo> {
        self.inner().extract_debug_info(artifact)
    }

    fn extract_header(&self, artifact: &Artifact) -> ExtractResult<HeaderInfo> {
        self.inner().extract_header(artifact)
    }

    fn extract_members(&self, artifact: &Artifact) -> ExtractResult<Vec<ExtractedArtifact>> {
        self.inner().extract_members(artifact)
    }

    fn extract(&self, artifact: &Artifact) -> ExtractResult<ExtractedArtifact> {
        self.inner().extract(artifact)
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Chooses the extractor for a file by magic bytes, lowest priority first.
#[derive(Debug, Clone)]
pub struct ExtractorDispatcher {
    extractors: Vec<Extractor>,
    max_file_size: u64,
}

impl ExtractorDispatcher {
    /// Build a dispatcher, rejecting two extractors with the same priority.
    pub fn new(mut extractors: Vec<Extractor>) -> Result<Self, BinsbomError> {
        if extractors.is_empty() {
            return Err(BinsbomError::dispatch(
                "building dispatcher",
                DispatchErrorKind::Empty,
            ));
        }
        extractors.sort_by_key(BinaryExtractor::priority);
        for pair in extractors.windows(2) {
            if pair[0].priority() == pair[1].priority() {
                return Err(BinsbomError::dispatch(
                    "building dispatcher",
                    DispatchErrorKind::AmbiguousPriority {
                        first: pair[0].format_name().to_string(),
                        second: pair[1].format_name().to_string(),
                        priority: pair[0].priority(),
                    },
                ));
            }
        }
        Ok(Self {
            extractors,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        })
    }

    /// ELF, Mach-O, PE and archive extractors.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            extractors: vec![
                Extractor::Elf(ElfExtractor::new()),
                Extractor::MachO(MachOExtractor::new()),
                Extractor::Pe(PeExtractor::new()),
                Extractor::Archive(ArchiveExtractor::new()),
            ],
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }

    #[must_use]
    pub const fn with_max_file_size(mut self, limit: u64) -> Self {
        self.max_file_size = limit;
        self
    }

    #[must_use]
    pub const fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn extractors(&self) -> impl Iterator<Item = &Extractor> {
        self.extractors.iter()
    }

    /// The lowest-priority extractor whose magic matches `header`.
    #[must_use]
    pub fn select(&self, header: &[u8]) -> Option<&Extractor> {
        let mut claimants = self.extractors.iter().filter(|e| e.matches_magic(header));
        let chosen = claimants.next()?;
        debug_assert!(
            claimants.all(|e| e.priority() != chosen.priority()),
            "two extractors claim the same file at priority {}",
            chosen.priority()
        );
        Some(chosen)
    }

    /// Select by reading the file prefix. Empty files select nothing.
    pub fn select_path(&self, path: &Path) -> ExtractResult<Option<&Extractor>> {
        let header = reader::read_prefix(path).map_err(|e| ExtractError::new(path, e.into()))?;
        if header.is_empty() {
            return Ok(None);
        }
        Ok(self.select(&header))
    }

    /// Open and extract one file with the selected extractor.
    pub fn extract_path(&self, path: &Path) -> ExtractResult<ExtractedArtifact> {
        let artifact = Artifact::open(path, self.max_file_size)?;
        let Some(extractor) = self.select(artifact.header()) else {
            return Err(ExtractError::new(path, ExtractErrorKind::BadMagic));
        };
        tracing::debug!(
            "extracting {} as {}",
            path.display(),
            extractor.format_name()
        );
        extractor.extract(&artifact)
    }
}

impl Default for ExtractorDispatcher {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_probe_magic() {
        assert_eq!(probe_magic(b"\x7fELF\x02"), Some(BinaryFormat::Elf));
        assert_eq!(probe_magic(b"!<arch>\n"), Some(BinaryFormat::Archive));
        assert_eq!(probe_magic(&0xfeed_facf_u32.to_le_bytes()), Some(BinaryFormat::MachO));
        assert_eq!(probe_magic(&0xfeed_facf_u32.to_be_bytes()), Some(BinaryFormat::MachO));
        assert_eq!(probe_magic(b"\xca\xfe\xba\xbe\x00\x00\x00\x02"), Some(BinaryFormat::MachOFat));
        assert_eq!(probe_magic(b""), None);
        assert_eq!(probe_magic(b"#!/bin/sh\n"), None);
    }

    #[test]
    fn test_java_class_is_not_fat_macho() {
        // Java class files share CAFEBABE; the minor/major version lands in nfat_arch
        let class = b"\xca\xfe\xba\xbe\x00\x00\x00\x34";
        assert_eq!(probe_magic(class), None);
    }

    #[test]
    fn test_duplicate_priority_rejected() {
        let err = ExtractorDispatcher::new(vec![
            Extractor::Elf(ElfExtractor::new()),
            Extractor::Elf(ElfExtractor::new()),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            BinsbomError::Dispatch {
                source: DispatchErrorKind::AmbiguousPriority { priority: 10, .. },
                ..
            }
        ));
    }

    #[test]
    fn test_empty_dispatcher_rejected() {
        assert!(ExtractorDispatcher::new(Vec::new()).is_err());
    }

    #[test]
    fn test_standard_priorities_are_ordered() {
        let dispatcher = ExtractorDispatcher::standard();
        let priorities: Vec<u32> = dispatcher.extractors().map(BinaryExtractor::priority).collect();
        assert_eq!(priorities, vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_select() {
        let dispatcher = ExtractorDispatcher::standard();
        assert_eq!(
            dispatcher.select(b"\x7fELF\x02\x01").map(BinaryExtractor::format_name),
            Some("ELF")
        );
        assert!(dispatcher.select(b"plain text").is_none());
    }

    #[test]
    fn test_empty_file_selects_nothing() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let dispatcher = ExtractorDispatcher::standard();
        assert!(dispatcher.select_path(file.path()).unwrap().is_none());
    }

    #[test]
    fn test_extract_unknown_is_bad_magic() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();
        let err = ExtractorDispatcher::standard()
            .extract_path(file.path())
            .unwrap_err();
        assert!(matches!(err.kind, ExtractErrorKind::BadMagic));
    }
}
