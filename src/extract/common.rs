//! Format-independent readers over `object::File`.

use object::{Object, ObjectKind, ObjectSection, ObjectSymbol, SectionKind, SymbolKind};

use super::dwarf::{self, DebugInfo};
use super::reader::Artifact;
use super::types::{
    Architecture, ExtractError, ExtractResult, FileKind, SectionFlags, SectionInfo, SymbolBinding,
    SymbolInfo,
};

/// Parse `data` as an object file, attributing errors to `artifact`'s path.
pub fn parse_object<'a>(artifact: &Artifact, data: &'a [u8]) -> ExtractResult<object::File<'a>> {
    object::File::parse(data).map_err(|e| ExtractError::from_object(artifact.path(), &e))
}

/// Symbols from the static table, falling back to the dynamic table for
/// stripped files.
pub fn object_symbols<'data>(file: &object::File<'data>) -> Vec<SymbolInfo> {
    let mut symbols: Vec<SymbolInfo> = file.symbols().filter_map(|s| convert_symbol(&s)).collect();
    if symbols.is_empty() {
        symbols = file
            .dynamic_symbols()
            .filter_map(|s| convert_symbol(&s))
            .collect();
    }
    symbols
}

fn convert_symbol<'data, S>(symbol: &S) -> Option<SymbolInfo>
where
    S: ObjectSymbol<'data>,
{
    if matches!(symbol.kind(), SymbolKind::Section | SymbolKind::File) {
        return None;
    }
    let name = symbol.name().ok()?;
    if name.is_empty() {
        return None;
    }
    let binding = if symbol.is_weak() {
        SymbolBinding::Weak
    } else if symbol.is_global() {
        SymbolBinding::Global
    } else {
        SymbolBinding::Local
    };
    Some(SymbolInfo {
        name: name.to_string(),
        address: symbol.address(),
        size: symbol.size(),
        binding,
        is_defined: !symbol.is_undefined(),
        section_index: symbol.section_index().map(|i| i.0),
    })
}

/// Section headers with normalized flags.
pub fn object_sections<'data>(file: &object::File<'data>) -> Vec<SectionInfo> {
    file.sections()
        .map(|section| SectionInfo {
            name: section.name().unwrap_or_default().to_string(),
            address: section.address(),
            file_offset: section.file_range().map(|(offset, _)| offset),
            size: section.size(),
            flags: section_flags(section.flags(), section.kind()),
        })
        .collect()
}

fn section_flags(flags: object::SectionFlags, kind: SectionKind) -> SectionFlags {
    match flags {
        object::SectionFlags::Elf { sh_flags } => SectionFlags {
            executable: sh_flags & u64::from(object::elf::SHF_EXECINSTR) != 0,
            writable: sh_flags & u64::from(object::elf::SHF_WRITE) != 0,
            alloc: sh_flags & u64::from(object::elf::SHF_ALLOC) != 0,
        },
        object::SectionFlags::Coff { characteristics } => SectionFlags {
            executable: characteristics & object::pe::IMAGE_SCN_MEM_EXECUTE != 0,
            writable: characteristics & object::pe::IMAGE_SCN_MEM_WRITE != 0,
            alloc: characteristics & object::pe::IMAGE_SCN_MEM_DISCARDABLE == 0,
        },
        object::SectionFlags::MachO { flags } => SectionFlags {
            executable: flags
                & (object::macho::S_ATTR_PURE_INSTRUCTIONS | object::macho::S_ATTR_SOME_INSTRUCTIONS)
                != 0,
            writable: matches!(
                kind,
                SectionKind::Data | SectionKind::UninitializedData | SectionKind::Tls
            ),
            alloc: !matches!(kind, SectionKind::Debug | SectionKind::Metadata),
        },
        _ => SectionFlags {
            executable: kind == SectionKind::Text,
            writable: matches!(kind, SectionKind::Data | SectionKind::UninitializedData),
            alloc: !matches!(kind, SectionKind::Debug | SectionKind::Metadata | SectionKind::Other),
        },
    }
}

/// Architecture of a single (non-fat) object.
pub fn object_architecture<'data>(file: &object::File<'data>) -> Architecture {
    Architecture::from_object(file.architecture(), file.is_64(), file.is_little_endian())
}

/// File kind from the object header.
pub fn object_file_kind<'data>(file: &object::File<'data>) -> FileKind {
    match file.kind() {
        ObjectKind::Relocatable => FileKind::Object,
        ObjectKind::Executable => FileKind::Executable,
        ObjectKind::Dynamic => FileKind::SharedLibrary,
        _ => FileKind::Unknown,
    }
}

/// Lowercase hex rendering of raw identifier bytes.
pub fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

/// DWARF contents, mapped onto the extraction error type.
pub fn debug_info<'data>(
    artifact: &Artifact,
    file: &object::File<'data>,
) -> ExtractResult<DebugInfo> {
    dwarf::read_debug_info(file)
        .map_err(|e| ExtractError::malformed(artifact.path(), format!("DWARF: {e}")))
}
