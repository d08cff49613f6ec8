//! Mach-O extractor, including fat/universal files.
//!
//! A fat file yields one artifact with one [`Architecture`] per slice; the
//! per-slice symbol, section and dependency lists are unioned rather than
//! taken from the first slice only.

use object::macho::{
    DylibCommand, MachHeader32, MachHeader64, SourceVersionCommand, UuidCommand,
};
use object::read::macho::{FatArch, MachHeader, MachOFatFile32, MachOFatFile64};
use indexmap::IndexMap;
use object::Endianness;

use super::common::{self, hex};
use super::dwarf::DebugInfo;
use super::normalize::{self, format_packed_version, format_source_version};
use super::reader::{read_u32, Artifact};
use super::traits::{BinaryExtractor, HeaderInfo};
use super::types::{
    unique, Architecture, BuildInfo, DependencyInfo, DependencyKind, DependencySet,
    ExtractError, ExtractErrorKind, ExtractResult, FileKind, SectionInfo, SymbolInfo, VendorInfo,
};

pub const MH_MAGIC: u32 = 0xfeed_face;
pub const MH_MAGIC_64: u32 = 0xfeed_facf;
pub const FAT_MAGIC: u32 = 0xcafe_babe;
pub const FAT_MAGIC_64: u32 = 0xcafe_babf;

/// Java class files share the fat magic; real fat files have few slices.
const MAX_FAT_ARCHES: u32 = 20;

/// One architecture slice of a (possibly fat) Mach-O file.
struct Slice<'a> {
    data: &'a [u8],
    arch: Architecture,
}

/// Load-command facts relevant to an SBOM.
#[derive(Debug, Default, Clone)]
struct MachOCommands {
    file_type: u32,
    install_name: Option<String>,
    current_version: u32,
    source_version: u64,
    uuid: Option<[u8; 16]>,
    is_signed: bool,
    dependencies: DependencySet,
}

/// Extractor for thin and fat Mach-O files.
#[derive(Debug, Default, Clone, Copy)]
pub struct MachOExtractor;

impl MachOExtractor {
    pub const PRIORITY: u32 = 20;

    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Whether `header` starts with a fat-file magic and a plausible arch count.
    #[must_use]
    pub fn is_fat(header: &[u8]) -> bool {
        match (read_u32(header, 0, false), read_u32(header, 4, false)) {
            (Some(FAT_MAGIC | FAT_MAGIC_64), Some(count)) => count > 0 && count < MAX_FAT_ARCHES,
            _ => false,
        }
    }

    fn is_thin(header: &[u8]) -> bool {
        matches!(
            read_u32(header, 0, false),
            Some(MH_MAGIC | MH_MAGIC_64) | Some(0xcefa_edfe | 0xcffa_edfe)
        )
    }

    fn slices<'a>(artifact: &Artifact, data: &'a [u8]) -> ExtractResult<Vec<Slice<'a>>> {
        let map_err = |e: object::read::Error| ExtractError::from_object(artifact.path(), &e);

        if !Self::is_fat(data) {
            let file = common::parse_object(artifact, data)?;
            return Ok(vec![Slice {
                data,
                arch: common::object_architecture(&file),
            }]);
        }

        let mut slices = Vec::new();
        if read_u32(data, 0, false) == Some(FAT_MAGIC_64) {
            let fat = MachOFatFile64::parse(data).map_err(map_err)?;
            for arch in fat.arches() {
                slices.push(fat_slice(artifact, data, arch)?);
            }
        } else {
            let fat = MachOFatFile32::parse(data).map_err(map_err)?;
            for arch in fat.arches() {
                slices.push(fat_slice(artifact, data, arch)?);
            }
        }
        Ok(slices)
    }

    fn commands(artifact: &Artifact, slice: &[u8]) -> ExtractResult<MachOCommands> {
        match read_u32(slice, 0, false) {
            Some(MH_MAGIC_64 | 0xcffa_edfe) => {
                walk_load_commands::<MachHeader64<Endianness>>(artifact, slice)
            }
            Some(MH_MAGIC | 0xcefa_edfe) => {
                walk_load_commands::<MachHeader32<Endianness>>(artifact, slice)
            }
            _ => Err(ExtractError::new(artifact.path(), ExtractErrorKind::BadMagic)),
        }
    }
}

fn fat_slice<'a, Fat: FatArch>(
    artifact: &Artifact,
    data: &'a [u8],
    arch: &Fat,
) -> ExtractResult<Slice<'a>> {
    // Slice ranges outside the file are rejected by `data`
    let bytes = arch
        .data(data)
        .map_err(|_| ExtractError::truncated(artifact.path()))?;
    let file = common::parse_object(artifact, bytes)?;
    let mut record = common::object_architecture(&file);
    record.cpu_type = Some(arch.cputype());
    record.offset = Some(arch.offset().into());
    record.size = Some(arch.size().into());
    Ok(Slice {
        data: bytes,
        arch: record,
    })
}

fn walk_load_commands<Mach: MachHeader<Endian = Endianness>>(
    artifact: &Artifact,
    data: &[u8],
) -> ExtractResult<MachOCommands> {
    let map_err = |e: object::read::Error| ExtractError::from_object(artifact.path(), &e);
    let header = Mach::parse(data, 0).map_err(map_err)?;
    let endian = header.endian().map_err(map_err)?;
    let mut commands = header.load_commands(endian, data, 0).map_err(map_err)?;

    let mut out = MachOCommands {
        file_type: header.filetype(endian),
        ..MachOCommands::default()
    };

    while let Some(command) = commands.next().map_err(map_err)? {
        let kind = match command.cmd() {
            object::macho::LC_LOAD_DYLIB | object::macho::LC_LOAD_UPWARD_DYLIB => {
                Some(DependencyKind::Required)
            }
            object::macho::LC_LOAD_WEAK_DYLIB | object::macho::LC_LAZY_LOAD_DYLIB => {
                Some(DependencyKind::Weak)
            }
            object::macho::LC_REEXPORT_DYLIB => Some(DependencyKind::Reexport),
            _ => None,
        };

        match command.cmd() {
            object::macho::LC_ID_DYLIB => {
                let dylib = command.data::<DylibCommand<Endianness>>().map_err(map_err)?;
                let name = command.string(endian, dylib.dylib.name).map_err(map_err)?;
                out.install_name = Some(String::from_utf8_lossy(name).into_owned());
                out.current_version = dylib.dylib.current_version.get(endian);
            }
            object::macho::LC_SOURCE_VERSION => {
                let version = command
                    .data::<SourceVersionCommand<Endianness>>()
                    .map_err(map_err)?;
                out.source_version = version.version.get(endian);
            }
            object::macho::LC_UUID => {
                let uuid = command.data::<UuidCommand<Endianness>>().map_err(map_err)?;
                out.uuid = Some(uuid.uuid);
            }
            object::macho::LC_CODE_SIGNATURE => out.is_signed = true,
            _ => {}
        }

        if let Some(kind) = kind {
            let dylib = command.data::<DylibCommand<Endianness>>().map_err(map_err)?;
            let raw = command.string(endian, dylib.dylib.name).map_err(map_err)?;
            let raw = String::from_utf8_lossy(raw);
            out.dependencies.insert(normalize::macho_dependency(
                &raw,
                kind,
                dylib.dylib.current_version.get(endian),
            ));
        }
    }

    Ok(out)
}

fn file_kind(file_type: u32) -> FileKind {
    match file_type {
        object::macho::MH_EXECUTE => FileKind::Executable,
        object::macho::MH_DYLIB | object::macho::MH_BUNDLE => FileKind::SharedLibrary,
        object::macho::MH_OBJECT => FileKind::Object,
        _ => FileKind::Unknown,
    }
}

impl BinaryExtractor for MachOExtractor {
    fn format_name(&self) -> &'static str {
        "Mach-O"
    }

    fn priority(&self) -> u32 {
        Self::PRIORITY
    }

    fn matches_magic(&self, header: &[u8]) -> bool {
        Self::is_thin(header) || Self::is_fat(header)
    }

    fn extract_symbols(&self, artifact: &Artifact) -> ExtractResult<Vec<SymbolInfo>> {
        // Slices usually define the same symbols; keep one per (name, defined)
        let mut symbols: IndexMap<(String, bool), SymbolInfo> = IndexMap::new();
        for slice in Self::slices(artifact, artifact.bytes())? {
            let file = common::parse_object(artifact, slice.data)?;
            for symbol in common::object_symbols(&file) {
                symbols
                    .entry((symbol.name.clone(), symbol.is_defined))
                    .or_insert(symbol);
            }
        }
        Ok(symbols.into_values().collect())
    }

    fn extract_sections(&self, artifact: &Artifact) -> ExtractResult<Vec<SectionInfo>> {
        let mut sections = Vec::new();
        for slice in Self::slices(artifact, artifact.bytes())? {
            let file = common::parse_object(artifact, slice.data)?;
            sections.extend(common::object_sections(&file));
        }
        Ok(unique(sections))
    }

    fn extract_version(&self, artifact: &Artifact) -> ExtractResult<Option<String>> {
        for slice in Self::slices(artifact, artifact.bytes())? {
            let commands = Self::commands(artifact, slice.data)?;
            let version = format_packed_version(commands.current_version)
                .or_else(|| format_source_version(commands.source_version));
            if version.is_some() {
                return Ok(version);
            }
        }
        Ok(None)
    }

    fn extract_dependencies(&self, artifact: &Artifact) -> ExtractResult<Vec<DependencyInfo>> {
        let mut deps = DependencySet::default();
        for slice in Self::slices(artifact, artifact.bytes())? {
            deps.extend(Self::commands(artifact, slice.data)?.dependencies.into_vec());
        }
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
        let mut parts = Vec::new();
        for slice in Self::slices(artifact, artifact.bytes())? {
            let file = common::parse_object(artifact, slice.data)?;
            parts.push(common::debug_info(artifact, &file)?);
        }
        Ok(DebugInfo::union(parts))
    }

    fn extract_header(&self, artifact: &Artifact) -> ExtractResult<HeaderInfo> {
        let slices = Self::slices(artifact, artifact.bytes())?;
        let mut info = HeaderInfo::default();
        let mut architectures = Vec::with_capacity(slices.len());
        let mut is_stripped = true;
        let mut contains_debug_info = false;

        for slice in &slices {
            let commands = Self::commands(artifact, slice.data)?;
            let file = common::parse_object(artifact, slice.data)?;
            is_stripped &= object::Object::symbols(&file).next().is_none();
            contains_debug_info |= super::dwarf::has_debug_info(&file);

            let build = &mut info.build_info;
            if build.file_kind == FileKind::Unknown {
                build.file_kind = file_kind(commands.file_type);
            }
            if build.build_id.is_none() {
                build.build_id = commands.uuid.map(|u| hex(&u));
            }
            if build.soname.is_none() {
                build.soname = commands.install_name;
            }
            build.is_signed |= commands.is_signed;
            architectures.push(slice.arch.clone());
        }

        info.architectures = unique(architectures);
        info.build_info.is_stripped = is_stripped;
        info.build_info.contains_debug_info = contains_debug_info;
        info.vendor = VendorInfo::default();
        Ok(info)
    }
}
