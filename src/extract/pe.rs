//! PE/COFF image extractor.
//!
//! Dependencies come from the import and delay-load import tables, the
//! version from the `VS_FIXEDFILEINFO` block of the `RT_VERSION` resource.

use object::pe::{ImageNtHeaders32, ImageNtHeaders64};
use object::read::pe::{ImageNtHeaders, PeFile, ResourceDirectoryEntryData, ResourceNameOrId};
use object::{LittleEndian as LE, Object};

use super::common::{self, hex};
use super::normalize;
use super::reader::{read_u16, read_u32, Artifact};
use super::traits::{BinaryExtractor, HeaderInfo};
use super::types::{
    BuildInfo, DependencyInfo, DependencyKind, DependencySet, ExtractError, ExtractErrorKind, ExtractResult,
    SectionInfo, SymbolInfo, VendorInfo,
};

const VS_FIXEDFILEINFO_SIGNATURE: u32 = 0xfeef_04bd;
const PE_SIGNATURE: &[u8; 4] = b"PE\0\0";

/// Facts read from the PE-specific tables.
#[derive(Debug, Default, Clone)]
struct PeTables {
    dependencies: DependencySet,
    version_resource: Option<Vec<u8>>,
    is_signed: bool,
}

/// Extractor for PE32 and PE32+ images.
#[derive(Debug, Default, Clone, Copy)]
pub struct PeExtractor;

impl PeExtractor {
    pub const PRIORITY: u32 = 30;

    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// `MZ` header whose `e_lfanew` points at a `PE\0\0` signature inside `header`.
    #[must_use]
    pub fn is_pe(header: &[u8]) -> bool {
        if !header.starts_with(b"MZ") {
            return false;
        }
        let Some(lfanew) = read_u32(header, 0x3c, true) else {
            return false;
        };
        let start = lfanew as usize;
        header
            .get(start..start.saturating_add(4))
            .is_some_and(|sig| sig == PE_SIGNATURE)
    }

    fn tables(artifact: &Artifact) -> ExtractResult<PeTables> {
        let data = artifact.bytes();
        match object::FileKind::parse(data) {
            Ok(object::FileKind::Pe64) => read_tables::<ImageNtHeaders64>(artifact, data),
            Ok(object::FileKind::Pe32) => read_tables::<ImageNtHeaders32>(artifact, data),
            Ok(other) => Err(ExtractError::new(
                artifact.path(),
                ExtractErrorKind::UnsupportedVariant(format!("{other:?}")),
            )),
            Err(e) => Err(ExtractError::from_object(artifact.path(), &e)),
        }
    }
}

fn read_tables<Pe: ImageNtHeaders>(artifact: &Artifact, data: &[u8]) -> ExtractResult<PeTables> {
    let map_err = |e: object::read::Error| ExtractError::from_object(artifact.path(), &e);
    let pe = PeFile::<Pe>::parse(data).map_err(map_err)?;
    let mut out = PeTables::default();

    if let Some(imports) = pe.import_table().map_err(map_err)? {
        let mut descriptors = imports.descriptors().map_err(map_err)?;
        while let Some(descriptor) = descriptors.next().map_err(map_err)? {
            let name = imports.name(descriptor.name.get(LE)).map_err(map_err)?;
            out.dependencies.insert(normalize::pe_dependency(
                &String::from_utf8_lossy(name),
                DependencyKind::Required,
            ));
        }
    }

    if let Some(delayed) = pe
        .data_directories()
        .delay_load_import_table(data, &pe.section_table())
        .map_err(map_err)? {
        let mut descriptors = delayed.descriptors().map_err(map_err)?;
        while let Some(descriptor) = descriptors.next().map_err(map_err)? {
            let name = delayed
                .name(descriptor.dll_name_rva.get(LE))
                .map_err(map_err)?;
            out.dependencies.insert(normalize::pe_dependency(
                &String::from_utf8_lossy(name),
                DependencyKind::DelayLoad,
            ));
        }
    }

    out.is_signed = pe
        .data_directory(object::pe::IMAGE_DIRECTORY_ENTRY_SECURITY)
        .is_some_and(|dir| dir.size.get(LE) > 0);

    // A damaged resource tree only costs us the version string
    match version_resource(&pe, data) {
        Ok(resource) => out.version_resource = resource,
        Err(e) => tracing::debug!(
            "unreadable resource directory in {}: {e}",
            artifact.path().display()
        ),
    }

    Ok(out)
}

/// Bytes of the first `RT_VERSION` resource leaf, if present.
fn version_resource<Pe: ImageNtHeaders>(
    pe: &PeFile<'_, Pe>,
    data: &[u8],
) -> object::read::Result<Option<Vec<u8>>> {
    let sections = pe.section_table();
    let Some(directory) = pe.data_directories().resource_directory(data, &sections)? else {
        return Ok(None);
    };

    let root = directory.root()?;
    for type_entry in root.entries {
        let is_version = matches!(
            type_entry.name_or_id(),
            ResourceNameOrId::Id(id) if id == object::pe::RT_VERSION
        );
        if !is_version {
            continue;
        }
        let ResourceDirectoryEntryData::Table(names) = type_entry.data(directory)? else {
            continue;
        };
        for name_entry in names.entries {
            let ResourceDirectoryEntryData::Table(languages) = name_entry.data(directory)? else {
                continue;
            };
            for language in languages.entries {
                if let ResourceDirectoryEntryData::Data(leaf) = language.data(directory)? {
                    let rva = leaf.offset_to_data.get(LE);
                    let size = leaf.size.get(LE) as usize;
                    if let Some(bytes) = sections.pe_data_at(data, rva) {
                        if bytes.len() >= size {
                            return Ok(Some(bytes[..size].to_vec()));
                        }
                    }
                }
            }
        }
    }
    Ok(None)
}

/// `FileVersion` from a `VS_VERSIONINFO` blob, as `a.b.c.d`.
fn fixed_file_version(blob: &[u8]) -> Option<String> {
    let signature = VS_FIXEDFILEINFO_SIGNATURE.to_le_bytes();
    let start = blob.windows(4).position(|w| w == signature)?;
    let ms = read_u32(blob, start + 8, true)?;
    let ls = read_u32(blob, start + 12, true)?;
    if ms == 0 && ls == 0 {
        return None;
    }
    Some(format!(
        "{}.{}.{}.{}",
        ms >> 16,
        ms & 0xffff,
        ls >> 16,
        ls & 0xffff
    ))
}

/// Value of a `StringFileInfo` entry such as `CompanyName`.
fn string_file_info(blob: &[u8], key: &str) -> Option<String> {
    let mut needle: Vec<u8> = key.encode_utf16().flat_map(u16::to_le_bytes).collect();
    needle.extend_from_slice(&[0, 0]);

    let key_start = blob.windows(needle.len()).position(|w| w == needle.as_slice())?;
    // wLength, wValueLength, wType precede the key
    let value_chars = usize::from(read_u16(blob, key_start.checked_sub(4)?, true)?);
    let mut value_start = key_start + needle.len();
    value_start = (value_start + 3) & !3;

    let mut units = Vec::with_capacity(value_chars);
    for i in 0..value_chars {
        match read_u16(blob, value_start + i * 2, true) {
            Some(0) | None => break,
            Some(unit) => units.push(unit),
        }
    }
    let value = String::from_utf16_lossy(&units).trim().to_string();
    (!value.is_empty()).then_some(value)
}

impl BinaryExtractor for PeExtractor {
    fn format_name(&self) -> &'static str {
        "PE"
    }

    fn priority(&self) -> u32 {
        Self::PRIORITY
    }

    fn matches_magic(&self, header: &[u8]) -> bool {
        Self::is_pe(header)
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
        let tables = Self::tables(artifact)?;
        Ok(tables.version_resource.as_deref().and_then(|blob| {
            fixed_file_version(blob).or_else(|| string_file_info(blob, "ProductVersion"))
        }))
    }

    fn extract_dependencies(&self, artifact: &Artifact) -> ExtractResult<Vec<DependencyInfo>> {
        Ok(Self::tables(artifact)?.dependencies.into_vec())
    }

    fn extract_header(&self, artifact: &Artifact) -> ExtractResult<HeaderInfo> {
        let file = common::parse_object(artifact, artifact.bytes())?;
        let tables = Self::tables(artifact)?;

        let build_id = match file.pdb_info() {
            Ok(Some(codeview)) => Some(format!("{}{:x}", hex(&codeview.guid()), codeview.age())),
            _ => None,
        };

        let vendor = tables
            .version_resource
            .as_deref()
            .map(|blob| VendorInfo {
                supplier: string_file_info(blob, "CompanyName"),
                description: string_file_info(blob, "FileDescription"),
                product_version: string_file_info(blob, "ProductVersion"),
                package_manager: None,
            })
            .unwrap_or_default();

        Ok(HeaderInfo {
            architectures: vec![common::object_architecture(&file)],
            build_info: BuildInfo {
                build_id,
                file_kind: common::object_file_kind(&file),
                is_stripped: file.symbols().next().is_none(),
                contains_debug_info: build_id_present(&file),
                is_signed: tables.is_signed,
                soname: None,
            },
            vendor,
        })
    }
}

/// PE debug info lives in a separate PDB; a CodeView record is the marker.
fn build_id_present<'data>(file: &object::File<'data>) -> bool {
    matches!(file.pdb_info(), Ok(Some(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(u16::to_le_bytes).collect()
    }

    #[test]
    fn test_is_pe() {
        let mut header = vec![0u8; 0x80];
        header[0] = b'M';
        header[1] = b'Z';
        header[0x3c] = 0x40;
        header[0x40..0x44].copy_from_slice(b"PE\0\0");
        assert!(PeExtractor::is_pe(&header));

        // e_lfanew beyond the prefix buffer
        header[0x3c] = 0xff;
        header[0x3d] = 0xff;
        assert!(!PeExtractor::is_pe(&header));

        assert!(!PeExtractor::is_pe(b"MZ"));
    }

    #[test]
    fn test_fixed_file_version() {
        let mut blob = vec![0u8; 8];
        blob.extend_from_slice(&VS_FIXEDFILEINFO_SIGNATURE.to_le_bytes());
        blob.extend_from_slice(&0x0001_0000u32.to_le_bytes());
        blob.extend_from_slice(&0x0002_0003u32.to_le_bytes()); // MS: 2.3
        blob.extend_from_slice(&0x0004_0005u32.to_le_bytes()); // LS: 4.5
        assert_eq!(fixed_file_version(&blob).as_deref(), Some("2.3.4.5"));
        assert_eq!(fixed_file_version(&[0u8; 16]), None);
    }

    #[test]
    fn test_string_file_info() {
        // wLength, wValueLength (chars incl NUL), wType, key, padding, value
        let mut blob = Vec::new();
        let value = "Acme Corp";
        blob.extend_from_slice(&0u16.to_le_bytes());
        blob.extend_from_slice(&((value.len() + 1) as u16).to_le_bytes());
        blob.extend_from_slice(&1u16.to_le_bytes());
        blob.extend_from_slice(&utf16("CompanyName"));
        blob.extend_from_slice(&[0, 0]);
        while blob.len() % 4 != 0 {
            blob.push(0);
        }
        blob.extend_from_slice(&utf16(value));
        blob.extend_from_slice(&[0, 0]);

        assert_eq!(string_file_info(&blob, "CompanyName").as_deref(), Some("Acme Corp"));
        assert_eq!(string_file_info(&blob, "ProductVersion"), None);
    }
}
