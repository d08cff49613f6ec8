//! ELF extractor.
//!
//! Dependencies come from `DT_NEEDED` entries of the dynamic section, the
//! version from the soname suffix or an FDO package note, and the build id
//! from `NT_GNU_BUILD_ID`.

use object::elf::{FileHeader32, FileHeader64};
use object::read::elf::{Dyn, ElfFile, FileHeader, SectionHeader};
use object::{Endianness, Object};

use super::common::{self, hex};
use super::dwarf::DebugInfo;
use super::normalize::{self, soname_version};
use super::reader::Artifact;
use super::traits::{BinaryExtractor, HeaderInfo};
use super::types::{
    BuildInfo, DependencyInfo, DependencySet, ExtractError, ExtractResult, FileKind, SectionInfo,
    SymbolInfo, VendorInfo,
};

pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Owner and type of the systemd/FDO package metadata note.
const FDO_NOTE_OWNER: &[u8] = b"FDO";
const FDO_PACKAGING_METADATA: u32 = 0xcafe_1a7e;
const GNU_NOTE_OWNER: &[u8] = b"GNU";

/// Contents of the dynamic section and note sections relevant to an SBOM.
#[derive(Debug, Default, Clone)]
struct ElfDynamic {
    needed: Vec<String>,
    soname: Option<String>,
    runpaths: Vec<String>,
    build_id: Option<String>,
    package_note: Option<serde_json::Value>,
}

/// Extractor for 32- and 64-bit ELF files of either byte order.
#[derive(Debug, Default, Clone, Copy)]
pub struct ElfExtractor;

impl ElfExtractor {
    pub const PRIORITY: u32 = 10;

    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn dynamic(artifact: &Artifact) -> ExtractResult<ElfDynamic> {
        let data = artifact.bytes();
        match data.get(4) {
            Some(&object::elf::ELFCLASS64) => {
                read_dynamic::<FileHeader64<Endianness>>(artifact, data)
            }
            Some(&object::elf::ELFCLASS32) => {
                read_dynamic::<FileHeader32<Endianness>>(artifact, data)
            }
            Some(other) => Err(ExtractError::new(
                artifact.path(),
                super::types::ExtractErrorKind::UnsupportedVariant(format!("ELF class {other}")),
            )),
            None => Err(ExtractError::truncated(artifact.path())),
        }
    }
}

fn read_dynamic<Elf: FileHeader<Endian = Endianness>>(
    artifact: &Artifact,
    data: &[u8],
) -> ExtractResult<ElfDynamic> {
    let map_err = |e: object::read::Error| ExtractError::from_object(artifact.path(), &e);
    let elf = ElfFile::<Elf>::parse(data).map_err(map_err)?;
    let endian = elf.endian();
    let sections = elf.elf_section_table();
    let mut out = ElfDynamic::default();

    for section in sections.iter() {
        if let Some((entries, link)) = section.dynamic(endian, data).map_err(map_err)? {
            let strings = sections.strings(endian, data, link).map_err(map_err)?;
            for entry in entries {
                let Some(tag) = entry.tag32(endian) else {
                    continue;
                };
                if tag == object::elf::DT_NULL {
                    break;
                }
                let wanted = matches!(
                    tag,
                    object::elf::DT_NEEDED
                        | object::elf::DT_SONAME
                        | object::elf::DT_RPATH
                        | object::elf::DT_RUNPATH
                );
                if !wanted {
                    continue;
                }
                let value = entry.string(endian, strings).map_err(map_err)?;
                let value = String::from_utf8_lossy(value).into_owned();
                match tag {
                    object::elf::DT_NEEDED => out.needed.push(value),
                    object::elf::DT_SONAME => out.soname = Some(value),
                    _ => out
                        .runpaths
                        .extend(value.split(':').filter(|p| !p.is_empty()).map(str::to_string)),
                }
            }
        }

        if let Some(mut notes) = section.notes(endian, data).map_err(map_err)? {
            while let Some(note) = notes.next().map_err(map_err)? {
                let n_type = note.n_type(endian);
                if note.name() == GNU_NOTE_OWNER && n_type == object::elf::NT_GNU_BUILD_ID {
                    out.build_id = Some(hex(note.desc()));
                } else if note.name() == FDO_NOTE_OWNER && n_type == FDO_PACKAGING_METADATA {
                    let desc = note.desc();
                    let end = desc.iter().position(|b| *b == 0).unwrap_or(desc.len());
                    match serde_json::from_slice(&desc[..end]) {
                        Ok(value) => out.package_note = Some(value),
                        Err(e) => tracing::debug!(
                            "ignoring malformed package note in {}: {e}",
                            artifact.path().display()
                        ),
                    }
                }
            }
        }
    }

    Ok(out)
}

fn note_str(note: Option<&serde_json::Value>, key: &str) -> Option<String> {
    note?
        .get(key)
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl BinaryExtractor for ElfExtractor {
    fn format_name(&self) -> &'static str {
        "ELF"
    }

    fn priority(&self) -> u32 {
        Self::PRIORITY
    }

    fn matches_magic(&self, header: &[u8]) -> bool {
        header.starts_with(&ELF_MAGIC)
    }

    fn extract_symbols(&self, artifact: &Artifact) -> ExtractResult<Vec<SymbolInfo>> {
        let file = common::parse_object(artifact, artifact.bytes())?;
        Ok(common::object_symbols(&file))
    }

    fn extract_sections(&self, artifact: &Artifact) -> ExtractResult<Vec<SectionInfo>> {
        let file = common::parse_object(artifact, artifact.bytes())?;
        Ok(common::object_sections(&file))
    }

    fn extract_version(&self, artifact: &Artifact) -> ExtractResult<Option<String>> {
        let dynamic = Self::dynamic(artifact)?;
        let from_soname = dynamic.soname.as_deref().and_then(soname_version);
        let from_note = note_str(dynamic.package_note.as_ref(), "version");
        let from_file_name = artifact
            .path()
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(soname_version);
        Ok(from_soname.or(from_note).or(from_file_name))
    }

    fn extract_dependencies(&self, artifact: &Artifact) -> ExtractResult<Vec<DependencyInfo>> {
        let dynamic = Self::dynamic(artifact)?;
        let deps: DependencySet = dynamic
            .needed
            .iter()
            .map(|raw| normalize::elf_dependency(raw))
            .collect();
        Ok(deps.into_vec())
    }

    fn extract_functions(&self, artifact: &Artifact) -> ExtractResult<Vec<String>> {
        Ok(self.extract_debug_info(artifact)?.functions)
    }

    fn extract_compile_units(&self, artifact: &Artifact) -> ExtractResult<Vec<String>> {
        Ok(self.extract_debug_info(artifact)?.compile_units)
    }

    fn extract_source_files(&self, artifact: &Artifact) -> ExtractResult<Vec<String>> {
        Ok(self.extract_debug_info(artifact)?.source_files)
    }

    fn extract_debug_info(&self, artifact: &Artifact) -> ExtractResult<DebugInfo> {
        let file = common::parse_object(artifact, artifact.bytes())?;
        common::debug_info(artifact, &file)
    }

    fn extract_header(&self, artifact: &Artifact) -> ExtractResult<HeaderInfo> {
        let file = common::parse_object(artifact, artifact.bytes())?;
        let dynamic = Self::dynamic(artifact)?;

        let mut file_kind = common::object_file_kind(&file);
        // PIE executables are ET_DYN; an interpreter without a soname marks them
        if file_kind == FileKind::SharedLibrary
            && dynamic.soname.is_none()
            && object::Object::section_by_name(&file, ".interp").is_some()
        {
            file_kind = FileKind::Executable;
        }

        let vendor = VendorInfo {
            supplier: note_str(dynamic.package_note.as_ref(), "vendor"),
            description: None,
            product_version: note_str(dynamic.package_note.as_ref(), "version"),
            package_manager: note_str(dynamic.package_note.as_ref(), "type"),
        };

        Ok(HeaderInfo {
            architectures: vec![common::object_architecture(&file)],
            build_info: BuildInfo {
                build_id: dynamic.build_id,
                file_kind,
                is_stripped: file.symbols().next().is_none(),
                contains_debug_info: super::dwarf::has_debug_info(&file),
                is_signed: false,
                soname: dynamic.soname,
            },
            vendor,
        })
    }
}
