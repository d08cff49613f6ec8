//! Normalization of dynamic-library references into comparable names.

use super::types::{DependencyInfo, DependencyKind};

/// Loader-relative prefixes used by dyld install names.
const MACHO_PREFIXES: &[&str] = &["@rpath/", "@loader_path/", "@executable_path/"];

const SYSTEM_DIRS: &[&str] = &[
    "/usr/lib/",
    "/lib/",
    "/lib64/",
    "/usr/lib64/",
    "/System/Library/",
];

/// DLLs shipped with Windows or the MSVC runtime.
const SYSTEM_DLLS: &[&str] = &[
    "kernel32.dll",
    "user32.dll",
    "gdi32.dll",
    "advapi32.dll",
    "shell32.dll",
    "ole32.dll",
    "oleaut32.dll",
    "ws2_32.dll",
    "ntdll.dll",
    "msvcrt.dll",
    "ucrtbase.dll",
    "bcrypt.dll",
    "crypt32.dll",
    "comctl32.dll",
    "comdlg32.dll",
    "version.dll",
    "shlwapi.dll",
    "secur32.dll",
    "rpcrt4.dll",
    "userenv.dll",
    "vcruntime140.dll",
    "msvcp140.dll",
];

/// Sonames of the C runtime, which every ELF binary on a system links.
const SYSTEM_SONAMES: &[&str] = &[
    "libc.so",
    "libm.so",
    "libdl.so",
    "libpthread.so",
    "librt.so",
    "ld-linux",
    "libgcc_s.so",
    "libstdc++.so",
];

/// Build a dependency record from an ELF `DT_NEEDED` entry.
#[must_use]
pub fn elf_dependency(raw: &str) -> DependencyInfo {
    let name = raw.rsplit('/').next().unwrap_or(raw).to_string();
    let is_system = is_system_path(raw) || SYSTEM_SONAMES.iter().any(|s| name.starts_with(s));
    DependencyInfo {
        version: soname_version(&name),
        name,
        raw: raw.to_string(),
        kind: DependencyKind::Required,
        is_system,
    }
}

/// Build a dependency record from a Mach-O dylib load command.
#[must_use]
pub fn macho_dependency(raw: &str, kind: DependencyKind, current_version: u32) -> DependencyInfo {
    DependencyInfo {
        name: normalize_install_name(raw),
        raw: raw.to_string(),
        version: format_packed_version(current_version),
        kind,
        is_system: is_system_path(raw),
    }
}

/// Build a dependency record from a PE import descriptor.
#[must_use]
pub fn pe_dependency(raw: &str, kind: DependencyKind) -> DependencyInfo {
    let name = raw.to_ascii_lowercase();
    let is_system = SYSTEM_DLLS.contains(&name.as_str())
        || name.starts_with("api-ms-win-")
        || name.starts_with("ext-ms-");
    DependencyInfo {
        name,
        raw: raw.to_string(),
        version: None,
        kind,
        is_system,
    }
}

/// Reduce a dyld install name to the library's own name.
///
/// `@rpath/libfoo.1.dylib` becomes `libfoo.1.dylib` and
/// `/System/Library/Frameworks/Foundation.framework/Versions/C/Foundation`
/// becomes `Foundation`.
#[must_use]
pub fn normalize_install_name(raw: &str) -> String {
    let mut path = raw;
    for prefix in MACHO_PREFIXES {
        if let Some(rest) = path.strip_prefix(prefix) {
            path = rest;
            break;
        }
    }

    if let Some(framework) = framework_name(path) {
        return framework.to_string();
    }

    path.rsplit('/').next().unwrap_or(path).to_string()
}

/// Name of the framework bundle that `path` points into, if any.
fn framework_name(path: &str) -> Option<&str> {
    let idx = path.find(".framework/")?;
    let bundle = &path[..idx];
    Some(bundle.rsplit('/').next().unwrap_or(bundle))
}

/// Whether a library path lives in an OS-owned directory.
#[must_use]
pub fn is_system_path(raw: &str) -> bool {
    SYSTEM_DIRS.iter().any(|dir| raw.starts_with(dir))
}

/// Version suffix of an ELF soname: `libssl.so.1.1` gives `1.1`.
#[must_use]
pub fn soname_version(soname: &str) -> Option<String> {
    let idx = soname.find(".so.")?;
    let suffix = &soname[idx + 4..];
    is_dotted_number(suffix).then(|| suffix.to_string())
}

/// `1`, `1.2`, `1.2.3`: non-empty digit runs joined by dots.
fn is_dotted_number(s: &str) -> bool {
    !s.is_empty()
        && s.split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

/// Library name without the `.so.N` / `.N.dylib` / `.dll` decoration.
///
/// Used to match a dependency reference such as `libA.so.1` against a
/// component registered as `libA`.
#[must_use]
pub fn library_stem(name: &str) -> &str {
    // Only a `.so` that ends the name or precedes a numeric version counts;
    // `.so` inside the stem (`libfoo.sound.so.1`) does not
    for (idx, _) in name.match_indices(".so") {
        let rest = &name[idx + 3..];
        if rest.is_empty() || rest.strip_prefix('.').is_some_and(is_dotted_number) {
            return &name[..idx];
        }
    }
    if let Some(base) = name.strip_suffix(".dylib") {
        return base.split('.').next().unwrap_or(base);
    }
    let lower_dll = name.len() > 4 && name[name.len() - 4..].eq_ignore_ascii_case(".dll");
    if lower_dll {
        return &name[..name.len() - 4];
    }
    name
}

/// Render a Mach-O packed `xxxx.yy.zz` version. Zero means "unset".
#[must_use]
pub fn format_packed_version(packed: u32) -> Option<String> {
    if packed == 0 {
        return None;
    }
    let major = packed >> 16;
    let minor = (packed >> 8) & 0xff;
    let patch = packed & 0xff;
    Some(format!("{major}.{minor}.{patch}"))
}

/// Render an `LC_SOURCE_VERSION` value (`a.b.c.d.e`, 24/10/10/10/10 bits),
/// trimming trailing zero components.
#[must_use]
pub fn format_source_version(packed: u64) -> Option<String> {
    if packed == 0 {
        return None;
    }
    let parts = [
        packed >> 40,
        (packed >> 30) & 0x3ff,
        (packed >> 20) & 0x3ff,
        (packed >> 10) & 0x3ff,
        packed & 0x3ff,
    ];
    let keep = parts.iter().rposition(|p| *p != 0).map_or(1, |i| i + 1).max(2);
    Some(
        parts[..keep]
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("."),
    )
}
