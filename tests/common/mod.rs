//! Byte-level builders for minimal binaries.
//!
//! Each builder produces the smallest file the `object` reader accepts for
//! its format, so tests do not depend on a toolchain or checked-in blobs.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub const ET_EXEC: u16 = 2;
pub const ET_DYN: u16 = 3;

const DT_NULL: u64 = 0;
const DT_NEEDED: u64 = 1;
const DT_SONAME: u64 = 14;

fn align(buf: &mut Vec<u8>, to: usize) {
    while buf.len() % to != 0 {
        buf.push(0);
    }
}

fn push_u16(buf: &mut Vec<u8>, v: u16) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn push_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// String table starting with the mandatory NUL; returns the table and the
/// offset of each string.
fn strtab(strings: &[&str]) -> (Vec<u8>, Vec<u32>) {
    let mut table = vec![0u8];
    let mut offsets = Vec::with_capacity(strings.len());
    for s in strings {
        offsets.push(table.len() as u32);
        table.extend_from_slice(s.as_bytes());
        table.push(0);
    }
    (table, offsets)
}

#[allow(clippy::too_many_arguments)]
fn section_header(
    buf: &mut Vec<u8>,
    name: u32,
    sh_type: u32,
    flags: u64,
    offset: u64,
    size: u64,
    link: u32,
    addralign: u64,
    entsize: u64,
) {
    push_u32(buf, name);
    push_u32(buf, sh_type);
    push_u64(buf, flags);
    push_u64(buf, 0); // sh_addr
    push_u64(buf, offset);
    push_u64(buf, size);
    push_u32(buf, link);
    push_u32(buf, 0); // sh_info
    push_u64(buf, addralign);
    push_u64(buf, entsize);
}

/// Little-endian x86-64 ELF with a `.dynamic` section listing `needed` and
/// an optional `DT_SONAME`. No program headers, no symbols.
pub fn elf64(e_type: u16, needed: &[&str], soname: Option<&str>) -> Vec<u8> {
    let mut names: Vec<&str> = needed.to_vec();
    if let Some(soname) = soname {
        names.push(soname);
    }
    let (dynstr, offsets) = strtab(&names);

    let mut dynamic = Vec::new();
    for offset in &offsets[..needed.len()] {
        push_u64(&mut dynamic, DT_NEEDED);
        push_u64(&mut dynamic, u64::from(*offset));
    }
    if soname.is_some() {
        push_u64(&mut dynamic, DT_SONAME);
        push_u64(&mut dynamic, u64::from(offsets[needed.len()]));
    }
    push_u64(&mut dynamic, DT_NULL);
    push_u64(&mut dynamic, 0);

    let (shstrtab, sh_names) = strtab(&[".dynstr", ".dynamic", ".shstrtab"]);

    let mut body = vec![0u8; 64];
    let dynstr_off = body.len();
    body.extend_from_slice(&dynstr);
    align(&mut body, 8);
    let dynamic_off = body.len();
    body.extend_from_slice(&dynamic);
    let shstrtab_off = body.len();
    body.extend_from_slice(&shstrtab);
    align(&mut body, 8);
    let shoff = body.len();

    // Section headers: null, .dynstr, .dynamic, .shstrtab
    body.extend_from_slice(&[0u8; 64]);
    section_header(
        &mut body,
        sh_names[0],
        3, // SHT_STRTAB
        2, // SHF_ALLOC
        dynstr_off as u64,
        dynstr.len() as u64,
        0,
        1,
        0,
    );
    section_header(
        &mut body,
        sh_names[1],
        6, // SHT_DYNAMIC
        3, // SHF_WRITE | SHF_ALLOC
        dynamic_off as u64,
        dynamic.len() as u64,
        1,
        8,
        16,
    );
    section_header(
        &mut body,
        sh_names[2],
        3,
        0,
        shstrtab_off as u64,
        shstrtab.len() as u64,
        0,
        1,
        0,
    );

    body[..64].copy_from_slice(&elf_header(e_type, shoff, 4, 3));
    body
}

fn elf_header(e_type: u16, shoff: usize, shnum: u16, shstrndx: u16) -> Vec<u8> {
    let mut header = Vec::with_capacity(64);
    header.extend_from_slice(&[0x7f, b'E', b'L', b'F', 2, 1, 1, 0]);
    header.extend_from_slice(&[0u8; 8]);
    push_u16(&mut header, e_type);
    push_u16(&mut header, 62); // EM_X86_64
    push_u32(&mut header, 1);
    push_u64(&mut header, 0); // e_entry
    push_u64(&mut header, 0); // e_phoff
    push_u64(&mut header, shoff as u64);
    push_u32(&mut header, 0); // e_flags
    push_u16(&mut header, 64); // e_ehsize
    push_u16(&mut header, 56); // e_phentsize
    push_u16(&mut header, 0); // e_phnum
    push_u16(&mut header, 64); // e_shentsize
    push_u16(&mut header, shnum);
    push_u16(&mut header, shstrndx);
    header
}

pub const ET_REL: u16 = 1;

/// Relocatable x86-64 object whose `.symtab` defines one global function per
/// name, all in `.text`.
pub fn elf64_object(defined: &[&str]) -> Vec<u8> {
    let (symstr, offsets) = strtab(defined);

    let mut symtab = vec![0u8; 24];
    for offset in &offsets {
        push_u32(&mut symtab, *offset);
        symtab.push(0x12); // STB_GLOBAL | STT_FUNC
        symtab.push(0);
        push_u16(&mut symtab, 1); // .text
        push_u64(&mut symtab, 0);
        push_u64(&mut symtab, 4);
    }

    let (shstrtab, sh_names) = strtab(&[".text", ".strtab", ".symtab", ".shstrtab"]);

    let mut body = vec![0u8; 64];
    let text_off = body.len();
    body.extend_from_slice(&[0xc3; 16]);
    let strtab_off = body.len();
    body.extend_from_slice(&symstr);
    align(&mut body, 8);
    let symtab_off = body.len();
    body.extend_from_slice(&symtab);
    let shstrtab_off = body.len();
    body.extend_from_slice(&shstrtab);
    align(&mut body, 8);
    let shoff = body.len();

    // Section headers: null, .text, .strtab, .symtab, .shstrtab
    body.extend_from_slice(&[0u8; 64]);
    section_header(&mut body, sh_names[0], 1, 6, text_off as u64, 16, 0, 16, 0);
    section_header(
        &mut body,
        sh_names[1],
        3,
        0,
        strtab_off as u64,
        symstr.len() as u64,
        0,
        1,
        0,
    );
    let symtab_header = body.len();
    section_header(
        &mut body,
        sh_names[2],
        2, // SHT_SYMTAB
        0,
        symtab_off as u64,
        symtab.len() as u64,
        2,
        8,
        24,
    );
    // sh_info: index of the first non-local symbol
    body[symtab_header + 44..symtab_header + 48].copy_from_slice(&1u32.to_le_bytes());
    section_header(
        &mut body,
        sh_names[3],
        3,
        0,
        shstrtab_off as u64,
        shstrtab.len() as u64,
        0,
        1,
        0,
    );

    body[..64].copy_from_slice(&elf_header(ET_REL, shoff, 5, 4));
    body
}

pub const CPU_TYPE_X86_64: u32 = 0x0100_0007;
pub const CPU_TYPE_ARM64: u32 = 0x0100_000c;
const MH_DYLIB: u32 = 6;

/// Thin little-endian 64-bit Mach-O dylib with no load commands.
pub fn macho64(cputype: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(32);
    push_u32(&mut out, 0xfeed_facf);
    push_u32(&mut out, cputype);
    push_u32(&mut out, 0); // cpusubtype
    push_u32(&mut out, MH_DYLIB);
    push_u32(&mut out, 0); // ncmds
    push_u32(&mut out, 0); // sizeofcmds
    push_u32(&mut out, 0); // flags
    push_u32(&mut out, 0); // reserved
    out
}

/// Universal file holding one thin slice per CPU type, each page aligned.
pub fn fat_macho(cputypes: &[u32]) -> Vec<u8> {
    const PAGE: usize = 0x1000;
    let slices: Vec<Vec<u8>> = cputypes.iter().map(|&cpu| macho64(cpu)).collect();

    let mut out = Vec::new();
    out.extend_from_slice(&0xcafe_babeu32.to_be_bytes());
    out.extend_from_slice(&(slices.len() as u32).to_be_bytes());
    for (i, (cpu, slice)) in cputypes.iter().zip(&slices).enumerate() {
        let offset = PAGE * (i + 1);
        out.extend_from_slice(&cpu.to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(slice.len() as u32).to_be_bytes());
        out.extend_from_slice(&12u32.to_be_bytes());
    }
    for (i, slice) in slices.iter().enumerate() {
        out.resize(PAGE * (i + 1), 0);
        out.extend_from_slice(slice);
    }
    out
}

/// PE32+ x86-64 executable with no sections and empty data directories.
pub fn pe64() -> Vec<u8> {
    let mut out = vec![0u8; 0x40];
    out[0] = b'M';
    out[1] = b'Z';
    out[0x3c..0x40].copy_from_slice(&0x40u32.to_le_bytes());

    out.extend_from_slice(b"PE\0\0");
    // COFF file header
    push_u16(&mut out, 0x8664);
    push_u16(&mut out, 0); // NumberOfSections
    push_u32(&mut out, 0); // TimeDateStamp
    push_u32(&mut out, 0); // PointerToSymbolTable
    push_u32(&mut out, 0); // NumberOfSymbols
    push_u16(&mut out, 240); // SizeOfOptionalHeader
    push_u16(&mut out, 0x0022); // EXECUTABLE_IMAGE | LARGE_ADDRESS_AWARE

    // Optional header, PE32+
    push_u16(&mut out, 0x20b);
    out.extend_from_slice(&[14, 0]); // linker version
    push_u32(&mut out, 0); // SizeOfCode
    push_u32(&mut out, 0); // SizeOfInitializedData
    push_u32(&mut out, 0); // SizeOfUninitializedData
    push_u32(&mut out, 0); // AddressOfEntryPoint
    push_u32(&mut out, 0); // BaseOfCode
    push_u64(&mut out, 0x1_4000_0000); // ImageBase
    push_u32(&mut out, 0x1000); // SectionAlignment
    push_u32(&mut out, 0x200); // FileAlignment
    push_u16(&mut out, 6); // OS version
    push_u16(&mut out, 0);
    push_u16(&mut out, 0); // image version
    push_u16(&mut out, 0);
    push_u16(&mut out, 6); // subsystem version
    push_u16(&mut out, 0);
    push_u32(&mut out, 0); // Win32VersionValue
    push_u32(&mut out, 0x1000); // SizeOfImage
    push_u32(&mut out, 0x200); // SizeOfHeaders
    push_u32(&mut out, 0); // CheckSum
    push_u16(&mut out, 3); // IMAGE_SUBSYSTEM_WINDOWS_CUI
    push_u16(&mut out, 0x8160); // DllCharacteristics
    push_u64(&mut out, 0x10_0000); // SizeOfStackReserve
    push_u64(&mut out, 0x1000); // SizeOfStackCommit
    push_u64(&mut out, 0x10_0000); // SizeOfHeapReserve
    push_u64(&mut out, 0x1000); // SizeOfHeapCommit
    push_u32(&mut out, 0); // LoaderFlags
    push_u32(&mut out, 16); // NumberOfRvaAndSizes
    out.extend_from_slice(&[0u8; 16 * 8]);

    out.resize(0x200, 0);
    out
}

fn ar_member(name: &str, data: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "{:<16}{:<12}{:<6}{:<6}{:<8}{:<10}`\n",
        format!("{name}/"),
        0,
        0,
        0,
        644,
        data.len()
    )
    .into_bytes();
    out.extend_from_slice(data);
    if data.len() % 2 == 1 {
        out.push(b'\n');
    }
    out
}

/// GNU `ar` archive of the given members.
pub fn archive(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut out = b"!<arch>\n".to_vec();
    for (name, data) in members {
        out.extend(ar_member(name, data));
    }
    out
}

/// Write `bytes` to `dir/name` and return the path.
pub fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("write fixture");
    path
}
