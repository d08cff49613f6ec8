//! Static library (`ar`) extractor.
//!
//! Each member is extracted as its own artifact named `archive.a(member.o)`
//! and carries its own symbols. The archive itself only reports the union of
//! member architectures. Thin archives reference members by path; those are
//! not followed and each one is recorded as a diagnostic.

use object::read::archive::ArchiveFile;
use object::Object;
use std::path::PathBuf;

use super::common;
use super::elf::ElfExtractor;
use super::macho::MachOExtractor;
use super::pe::PeExtractor;
use super::reader::Artifact;
use super::traits::{assemble, BinaryExtractor, HeaderInfo};
use super::types::{
    unique, BuildInfo, DependencyInfo, ExtractError, ExtractResult, ExtractedArtifact,
    FileKind, SectionInfo, SymbolInfo, VendorInfo,
};
use crate::utils::sha256_hex;

pub const AR_MAGIC: &[u8; 8] = b"!<arch>\n";
pub const AR_THIN_MAGIC: &[u8; 8] = b"!<thin>\n";

/// Symbol-index and long-name members that carry no object code.
const INDEX_MEMBERS: &[&str] = &["/", "//", "/SYM64/", "__.SYMDEF", "__.SYMDEF SORTED", "ARFILENAMES/"];

/// Extractor for System V, GNU and BSD `ar` archives.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArchiveExtractor;

impl ArchiveExtractor {
    pub const PRIORITY: u32 = 40;

    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Object members in archive order. Members of a thin archive have no
    /// contents here and are listed by name only.
    fn members<'a>(artifact: &'a Artifact) -> ExtractResult<Members<'a>> {
        let data = artifact.bytes();
        let map_err = |e: object::read::Error| ExtractError::from_object(artifact.path(), &e);
        let archive = ArchiveFile::parse(data).map_err(map_err)?;

        let mut out = Members::default();
        for member in archive.members() {
            let member = member.map_err(map_err)?;
            let name = String::from_utf8_lossy(member.name())
                .trim_end_matches('/')
                .to_string();
            if name.is_empty() || INDEX_MEMBERS.contains(&name.as_str()) {
                continue;
            }
            if member.is_thin() {
                out.external.push(name);
                continue;
            }
            let bytes = member.data(data).map_err(map_err)?;
            out.objects.push((name, bytes));
        }
        Ok(out)
    }

    fn member_path(artifact: &Artifact, name: &str) -> PathBuf {
        PathBuf::from(format!("{}({name})", artifact.path().display()))
    }
}

#[derive(Debug, Default)]
struct Members<'a> {
    objects: Vec<(String, &'a [u8])>,
    /// Thin-archive members stored outside the archive file
    external: Vec<String>,
}

/// Extract one member with whichever extractor claims its magic. COFF
/// objects have no magic of their own and fall through to the generic reader.
fn extract_member(path: PathBuf, bytes: &[u8]) -> ExtractResult<ExtractedArtifact> {
    let member = Artifact::from_bytes(path, bytes.to_vec());
    let header = member.header();

    let elf = ElfExtractor::new();
    let macho = MachOExtractor::new();
    let pe = PeExtractor::new();
    if elf.matches_magic(header) {
        return elf.extract(&member);
    }
    if macho.matches_magic(header) {
        return macho.extract(&member);
    }
    if pe.matches_magic(header) {
        return pe.extract(&member);
    }

    let file = common::parse_object(&member, member.bytes())?;
    Ok(ExtractedArtifact {
        path: member.path().to_path_buf(),
        format: "COFF".to_string(),
        file_size: member.len() as u64,
        checksum: sha256_hex(member.bytes()),
        architectures: vec![common::object_architecture(&file)],
        build_info: BuildInfo {
            file_kind: common::object_file_kind(&file),
            is_stripped: file.symbols().next().is_none(),
            ..BuildInfo::default()
        },
        symbols: common::object_symbols(&file),
        sections: common::object_sections(&file),
        ..ExtractedArtifact::default()
    })
}

impl BinaryExtractor for ArchiveExtractor {
    fn format_name(&self) -> &'static str {
        "Archive"
    }

    fn priority(&self) -> u32 {
        Self::PRIORITY
    }

    fn matches_magic(&self, header: &[u8]) -> bool {
        header.starts_with(AR_MAGIC) || header.starts_with(AR_THIN_MAGIC)
    }

    fn extract_symbols(&self, _artifact: &Artifact) -> ExtractResult<Vec<SymbolInfo>> {
        // Symbols belong to the member components
        Ok(Vec::new())
    }

    fn extract_sections(&self, _artifact: &Artifact) -> ExtractResult<Vec<SectionInfo>> {
        Ok(Vec::new())
    }

    fn extract_version(&self, _artifact: &Artifact) -> ExtractResult<Option<String>> {
        Ok(None)
    }

    fn extract_dependencies(&self, _artifact: &Artifact) -> ExtractResult<Vec<DependencyInfo>> {
        Ok(Vec::new())
    }

    fn extract_header(&self, artifact: &Artifact) -> ExtractResult<HeaderInfo> {
        let mut architectures = Vec::new();
        let mut any_symbols = false;
        for (_, bytes) in Self::members(artifact)?.objects {
            let Ok(file) = object::File::parse(bytes) else {
                continue;
            };
            architectures.push(common::object_architecture(&file));
            any_symbols |= file.symbols().next().is_some();
        }

        Ok(HeaderInfo {
            architectures: unique(architectures),
            build_info: BuildInfo {
                file_kind: FileKind::StaticLibrary,
                is_stripped: !any_symbols,
                ..BuildInfo::default()
            },
            vendor: VendorInfo::default(),
        })
    }

    fn extract_members(&self, artifact: &Artifact) -> ExtractResult<Vec<ExtractedArtifact>> {
        let mut out = Vec::new();
        for (name, bytes) in Self::members(artifact)?.objects {
            let path = Self::member_path(artifact, &name);
            match extract_member(path.clone(), bytes) {
                Ok(member) => out.push(member),
                Err(err) => {
                    // Non-object members (ctf, text) are common; keep the rest
                    tracing::debug!("skipping archive member {}: {}", path.display(), err.kind);
                }
            }
        }
        Ok(out)
    }

    fn extract(&self, artifact: &Artifact) -> ExtractResult<ExtractedArtifact> {
        let mut extracted = assemble(self, artifact)?;
        for name in Self::members(artifact)?.external {
            tracing::warn!(
                "{}: thin archive member {name} is stored outside the archive and was not extracted",
                artifact.path().display()
            );
            extracted
                .diagnostics
                .push(format!("thin archive member not extracted: {name}"));
        }
        Ok(extracted)
    }
}
