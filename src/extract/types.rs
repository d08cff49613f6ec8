//! Raw metadata records produced by the format extractors.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Extraction errors
// ============================================================================

/// Why a single file could not be extracted.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ExtractErrorKind {
    #[error("file is truncated or a header claims data beyond end of file")]
    Truncated,

    #[error("unsupported format variant: {0}")]
    UnsupportedVariant(String),

    #[error("no extractor recognizes this file")]
    BadMagic,

    #[error("malformed binary: {0}")]
    Malformed(String),

    #[error("file size {size} exceeds limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extraction failure for one path.
#[derive(Error, Debug)]
#[error("{}: {kind}", path.display())]
pub struct ExtractError {
    pub path: PathBuf,
    #[source]
    pub kind: ExtractErrorKind,
}

impl ExtractError {
    pub fn new(path: impl Into<PathBuf>, kind: ExtractErrorKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Map an `object` read error onto an error kind.
    ///
    /// `object` reports out-of-bounds reads with messages mentioning size,
    /// offset or "too short"; those are classified as truncation.
    pub fn from_object(path: &Path, err: &object::read::Error) -> Self {
        let message = err.to_string();
        let lower = message.to_ascii_lowercase();
        let kind = if lower.contains("too short")
            || lower.contains("size")
            || lower.contains("offset")
            || lower.contains("truncated")
        {
            ExtractErrorKind::Truncated
        } else if lower.contains("unknown") || lower.contains("unsupported") {
            ExtractErrorKind::UnsupportedVariant(message)
        } else {
            ExtractErrorKind::Malformed(message)
        };
        Self::new(path, kind)
    }

    pub fn truncated(path: &Path) -> Self {
        Self::new(path, ExtractErrorKind::Truncated)
    }

    pub fn malformed(path: &Path, message: impl Into<String>) -> Self {
        Self::new(path, ExtractErrorKind::Malformed(message.into()))
    }
}

/// Result type for extractor operations.
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

// ============================================================================
// Symbols and sections
// ============================================================================

/// Symbol binding as recorded in the symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolBinding {
    Local,
    Global,
    Weak,
}

/// A single symbol table entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub name: String,
    pub address: u64,
    pub size: u64,
    pub binding: SymbolBinding,
    pub is_defined: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_index: Option<usize>,
}

/// Permission and allocation flags of a section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionFlags {
    pub executable: bool,
    pub writable: bool,
    pub alloc: bool,
}

/// A section header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionInfo {
    pub name: String,
    pub address: u64,
    /// `None` for sections without file contents (e.g. `.bss`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_offset: Option<u64>,
    pub size: u64,
    pub flags: SectionFlags,
}

// ============================================================================
// Dependencies
// ============================================================================

/// How a dependency is bound at load time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyKind {
    #[default]
    Required,
    /// Weak or lazily bound; absence at runtime is tolerated
    Weak,
    Reexport,
    DelayLoad,
}

impl DependencyKind {
    #[must_use]
    pub const fn is_optional(self) -> bool {
        matches!(self, Self::Weak | Self::DelayLoad)
    }
}

/// A library referenced from dynamic-link metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyInfo {
    /// Normalized, comparable name (`libz.so.1`, `Foundation`, `kernel32.dll`)
    pub name: String,
    /// Name exactly as written in the binary
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub kind: DependencyKind,
    pub is_system: bool,
}

// ============================================================================
// Architecture and build information
// ============================================================================

/// Byte order of an architecture slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    Little,
    Big,
}

/// One architecture present in a binary. Fat Mach-O files carry several.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Architecture {
    pub name: String,
    pub bits: u8,
    pub endian: Endian,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_type: Option<u32>,
    /// Slice offset within a fat file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl Architecture {
    /// Build from an `object` architecture value.
    #[must_use]
    pub fn from_object(arch: object::Architecture, is_64: bool, little_endian: bool) -> Self {
        Self {
            name: architecture_name(arch).to_string(),
            bits: if is_64 { 64 } else { 32 },
            endian: if little_endian {
                Endian::Little
            } else {
                Endian::Big
            },
            cpu_type: None,
            offset: None,
            size: None,
        }
    }
}

/// Canonical lowercase name for an architecture.
#[must_use]
pub fn architecture_name(arch: object::Architecture) -> &'static str {
    use object::Architecture as A;
    match arch {
        A::X86_64 | A::X86_64_X32 => "x86_64",
        A::I386 => "i386",
        A::Aarch64 | A::Aarch64_Ilp32 => "aarch64",
        A::Arm => "arm",
        A::Mips => "mips",
        A::Mips64 => "mips64",
        A::PowerPc => "powerpc",
        A::PowerPc64 => "powerpc64",
        A::Riscv32 => "riscv32",
        A::Riscv64 => "riscv64",
        A::S390x => "s390x",
        A::Sparc64 => "sparc64",
        A::LoongArch64 => "loongarch64",
        A::Wasm32 => "wasm32",
        _ => "unknown",
    }
}

/// Kind of file as declared by its header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileKind {
    Executable,
    SharedLibrary,
    Object,
    StaticLibrary,
    #[default]
    Unknown,
}

impl FileKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Executable => "executable",
            Self::SharedLibrary => "shared-library",
            Self::Object => "object",
            Self::StaticLibrary => "static-library",
            Self::Unknown => "unknown",
        }
    }
}

/// Header-level facts about a binary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    /// GNU build-id, Mach-O UUID or PE CodeView GUID+age, lowercase hex
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_id: Option<String>,
    pub file_kind: FileKind,
    pub is_stripped: bool,
    pub contains_debug_info: bool,
    pub is_signed: bool,
    /// ELF `DT_SONAME` or Mach-O install name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soname: Option<String>,
}

/// Version-resource strings (PE `StringFileInfo`) and similar vendor metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_version: Option<String>,
    /// Packaging system that produced the file (`rpm`, `deb`, ...), when embedded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_manager: Option<String>,
}

// ============================================================================
// Aggregated result
// ============================================================================

/// Everything extracted from one file. Self-contained: no references into
/// the mapped file survive extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractedArtifact {
    pub path: PathBuf,
    pub format: String,
    pub file_size: u64,
    /// Lowercase hex SHA-256 of the file contents
    pub checksum: String,
    pub architectures: Vec<Architecture>,
    pub build_info: BuildInfo,
    pub vendor: VendorInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub symbols: Vec<SymbolInfo>,
    pub sections: Vec<SectionInfo>,
    pub dependencies: Vec<DependencyInfo>,
    pub functions: Vec<String>,
    pub compile_units: Vec<String>,
    pub source_files: Vec<String>,
    /// Archive members, each extracted as its own artifact
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<ExtractedArtifact>,
    /// Best-effort steps that failed without failing the file
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

impl ExtractedArtifact {
    /// File name component of the path, or the whole path when it has none.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        )
    }

    #[must_use]
    pub fn defined_symbol_count(&self) -> usize {
        self.symbols.iter().filter(|s| s.is_defined).count()
    }
}

/// Distinct items in first-seen order.
pub(crate) fn unique<T: Hash + Eq>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    items.into_iter().collect::<IndexSet<_>>().into_iter().collect()
}

/// Dependencies keyed by normalized name. The first occurrence of a name wins.
#[derive(Debug, Default, Clone)]
pub(crate) struct DependencySet(IndexMap<String, DependencyInfo>);

impl DependencySet {
    pub(crate) fn insert(&mut self, dep: DependencyInfo) {
        self.0.entry(dep.name.clone()).or_insert(dep);
    }

    pub(crate) fn into_vec(self) -> Vec<DependencyInfo> {
        self.0.into_values().collect()
    }
}

impl Extend<DependencyInfo> for DependencySet {
    fn extend<I: IntoIterator<Item = DependencyInfo>>(&mut self, iter: I) {
        for dep in iter {
            self.insert(dep);
        }
    }
}

impl FromIterator<DependencyInfo> for DependencySet {
    fn from_iter<I: IntoIterator<Item = DependencyInfo>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_error_classification() {
        let kind = ExtractErrorKind::Truncated;
        assert!(kind.to_string().contains("truncated"));

        let err = ExtractError::malformed(Path::new("x.o"), "bad symtab");
        assert!(err.to_string().starts_with("x.o:"));
    }

    #[test]
    fn test_architecture_name() {
        assert_eq!(architecture_name(object::Architecture::X86_64), "x86_64");
        assert_eq!(architecture_name(object::Architecture::Aarch64), "aarch64");
    }

    #[test]
    fn test_dependency_kind_optional() {
        assert!(DependencyKind::Weak.is_optional());
        assert!(DependencyKind::DelayLoad.is_optional());
        assert!(!DependencyKind::Required.is_optional());
    }

    #[test]
    fn test_unique_keeps_first_seen_order() {
        let v = unique(["b", "a", "b", "c", "a"].map(String::from));
        assert_eq!(v, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_dependency_set_first_name_wins() {
        let dep = |name: &str, raw: &str| DependencyInfo {
            name: name.to_string(),
            raw: raw.to_string(),
            version: None,
            kind: DependencyKind::Required,
            is_system: false,
        };
        let set: DependencySet = [
            dep("libz.so.1", "libz.so.1"),
            dep("libc.so.6", "libc.so.6"),
            dep("libz.so.1", "/usr/lib/libz.so.1"),
        ]
        .into_iter()
        .collect();
        let deps = set.into_vec();
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].raw, "libz.so.1");
        assert_eq!(deps[1].name, "libc.so.6");
    }
}
