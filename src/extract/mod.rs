//! Binary metadata extraction.
//!
//! One extractor per container format, each implementing [`BinaryExtractor`]:
//!
//! - [`ElfExtractor`]: ELF32/ELF64 objects, executables and shared libraries
//! - [`MachOExtractor`]: thin and universal Mach-O
//! - [`PeExtractor`]: PE32/PE32+ images
//! - [`ArchiveExtractor`]: `ar` static libraries, with members extracted individually
//!
//! [`ExtractorDispatcher`] picks one by magic bytes and produces a
//! self-contained [`ExtractedArtifact`].

mod archive;
mod common;
mod detection;
mod dwarf;
mod elf;
mod macho;
pub mod normalize;
mod pe;
mod reader;
mod traits;
mod types;

pub use archive::ArchiveExtractor;
pub use detection::{
    probe_magic, BinaryFormat, Extractor, ExtractorDispatcher, DEFAULT_MAX_FILE_SIZE,
};
pub use dwarf::DebugInfo;
pub use elf::ElfExtractor;
pub use macho::MachOExtractor;
pub use pe::PeExtractor;
pub use reader::{Artifact, PROBE_LEN};
pub use traits::{BinaryExtractor, HeaderInfo};
pub use types::{
    Architecture, BuildInfo, DependencyInfo, DependencyKind, Endian, ExtractError,
    ExtractErrorKind, ExtractResult, ExtractedArtifact, FileKind, SectionFlags, SectionInfo,
    SymbolBinding, SymbolInfo, VendorInfo,
};
