//! Best-effort DWARF reading: compile units, source files and function names.
//!
//! Shared by the ELF and Mach-O extractors. Missing debug sections are not an
//! error; the result is simply empty.

use gimli::{EndianSlice, RunTimeEndian, SectionId};
use indexmap::IndexSet;
use object::{Object, ObjectSection};
use std::collections::HashMap;

/// Debug information pulled from a single object file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugInfo {
    pub compile_units: Vec<String>,
    pub source_files: Vec<String>,
    pub functions: Vec<String>,
}

impl DebugInfo {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.compile_units.is_empty() && self.source_files.is_empty() && self.functions.is_empty()
    }

    /// Union of several results (one per fat slice), first-seen order kept.
    pub fn union(parts: impl IntoIterator<Item = Self>) -> Self {
        let mut collector = Collector::default();
        for part in parts {
            collector.compile_units.extend(part.compile_units);
            collector.source_files.extend(part.source_files);
            collector.functions.extend(part.functions);
        }
        collector.finish()
    }
}

/// Deduplicating accumulator; large binaries carry the same names many times.
#[derive(Default)]
struct Collector {
    compile_units: IndexSet<String>,
    source_files: IndexSet<String>,
    functions: IndexSet<String>,
}

impl Collector {
    fn finish(self) -> DebugInfo {
        DebugInfo {
            compile_units: self.compile_units.into_iter().collect(),
            source_files: self.source_files.into_iter().collect(),
            functions: self.functions.into_iter().collect(),
        }
    }
}

/// Whether the object carries a `.debug_info` (or `__debug_info`) section.
pub fn has_debug_info<'data>(file: &object::File<'data>) -> bool {
    section_bytes(file, SectionId::DebugInfo).is_some_and(|b| !b.is_empty())
}

fn section_bytes<'data>(file: &object::File<'data>, id: SectionId) -> Option<Vec<u8>> {
    let elf_name = id.name();
    let macho_name = elf_name.strip_prefix('.').map(|n| format!("__{n}"));
    let section = file
        .section_by_name(elf_name)
        .or_else(|| macho_name.as_deref().and_then(|n| file.section_by_name(n)))?;
    section.uncompressed_data().ok().map(std::borrow::Cow::into_owned)
}

/// Read compile units, line-program file names and subprogram names.
pub fn read_debug_info<'data>(file: &object::File<'data>) -> Result<DebugInfo, gimli::Error> {
    if !has_debug_info(file) {
        return Ok(DebugInfo::default());
    }

    let endian = if file.is_little_endian() {
        RunTimeEndian::Little
    } else {
        RunTimeEndian::Big
    };

    let mut sections: HashMap<SectionId, Vec<u8>> = HashMap::new();
    for id in [
        SectionId::DebugAbbrev,
        SectionId::DebugAddr,
        SectionId::DebugInfo,
        SectionId::DebugLine,
        SectionId::DebugLineStr,
        SectionId::DebugRanges,
        SectionId::DebugRngLists,
        SectionId::DebugStr,
        SectionId::DebugStrOffsets,
    ] {
        if let Some(bytes) = section_bytes(file, id) {
            sections.insert(id, bytes);
        }
    }

    let dwarf = gimli::Dwarf::load(|id| {
        let data = sections.get(&id).map_or(&[][..], Vec::as_slice);
        Ok::<_, gimli::Error>(EndianSlice::new(data, endian))
    })?;

    let mut collector = Collector::default();
    let mut units = dwarf.units();
    while let Some(header) = units.next()? {
        let unit = dwarf.unit(header)?;
        collect_unit(&dwarf, &unit, &mut collector)?;
    }

    Ok(collector.finish())
}

type Reader<'a> = EndianSlice<'a, RunTimeEndian>;

fn collect_unit<'a>(
    dwarf: &gimli::Dwarf<Reader<'a>>,
    unit: &gimli::Unit<Reader<'a>>,
    info: &mut Collector,
) -> Result<(), gimli::Error> {
    let mut entries = unit.entries();
    while let Some((_, entry)) = entries.next_dfs()? {
        let tag = entry.tag();
        if tag != gimli::DW_TAG_compile_unit && tag != gimli::DW_TAG_subprogram {
            continue;
        }
        let Some(value) = entry.attr_value(gimli::DW_AT_name)? else {
            continue;
        };
        let Ok(name) = dwarf.attr_string(unit, value) else {
            continue;
        };
        let name = String::from_utf8_lossy(name.slice()).into_owned();
        if name.is_empty() {
            continue;
        }
        if tag == gimli::DW_TAG_compile_unit {
            info.compile_units.insert(name);
        } else {
            info.functions.insert(name);
        }
    }

    if let Some(program) = unit.line_program.as_ref() {
        let header = program.header();
        for file in header.file_names() {
            let Ok(file_name) = dwarf.attr_string(unit, file.path_name()) else {
                continue;
            };
            let file_name = String::from_utf8_lossy(file_name.slice()).into_owned();
            let dir = file
                .directory(header)
                .and_then(|d| dwarf.attr_string(unit, d).ok())
                .map(|d| String::from_utf8_lossy(d.slice()).into_owned());
            let full = match dir {
                Some(dir) if !dir.is_empty() && !file_name.starts_with('/') => {
                    format!("{}/{}", dir.trim_end_matches('/'), file_name)
                }
                _ => file_name,
            };
            info.source_files.insert(full);
        }
    }

    Ok(())
}
