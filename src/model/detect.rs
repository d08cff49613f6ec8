//! Metadata a binary does not carry itself.
//!
//! Two sources are consulted for each registered file:
//!
//! - license files shipped next to it (or one directory up, for `bin/`
//!   layouts), matched against the marker phrases of well-known licenses
//! - the directory it is installed under, which often names the packaging
//!   system (`/nix/store`, a Homebrew cellar, a multiarch `lib` directory)
//!   or sits below a project manifest (`Cargo.toml`, `go.mod`, ...)
//!
//! Detection only fills fields that are still empty; overrides applied
//! afterwards replace whatever it found.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use super::license::LicenseExpression;
use super::registry::Registry;
use crate::utils::absolute_path;

/// File names searched for license text, in priority order.
pub const LICENSE_FILE_NAMES: &[&str] = &[
    "LICENSE",
    "LICENSE.txt",
    "LICENSE.md",
    "LICENSE.rst",
    "LICENSE-MIT",
    "LICENSE-APACHE",
    "COPYING",
    "COPYING.txt",
    "COPYING.md",
    "license",
    "license.txt",
    "license.md",
    "copying",
    "copying.txt",
];

/// Longer files are truncated; every marker sits near the top.
const MAX_LICENSE_BYTES: u64 = 256 * 1024;

/// Ancestors of the binary's directory searched for a project manifest.
const MANIFEST_DEPTH: usize = 4;

/// Phrases that all have to appear in the normalized text. More specific
/// licenses come first so the GPL family resolves to the right variant.
const LICENSE_MARKERS: &[(&str, &[&str])] = &[
    ("AGPL-3.0-only", &["gnu affero general public license", "version 3"]),
    ("LGPL-3.0-only", &["gnu lesser general public license", "version 3"]),
    ("LGPL-2.1-only", &["gnu lesser general public license", "version 2.1"]),
    ("GPL-3.0-only", &["gnu general public license", "version 3"]),
    ("GPL-2.0-only", &["gnu general public license", "version 2"]),
    ("Apache-2.0", &["apache license", "version 2.0"]),
    ("MPL-2.0", &["mozilla public license", "version 2.0"]),
    (
        "MIT",
        &[
            "permission is hereby granted, free of charge",
            "the above copyright notice and this permission notice shall be included",
        ],
    ),
    (
        "BSD-3-Clause",
        &["redistribution and use in source and binary forms", "neither the name"],
    ),
    ("BSD-2-Clause", &["redistribution and use in source and binary forms"]),
    (
        "ISC",
        &["permission to use, copy, modify, and/or distribute this software for any purpose"],
    ),
    (
        "Zlib",
        &[
            "altered source versions must be plainly marked as such",
            "this notice may not be removed or altered from any source distribution",
        ],
    ),
    (
        "Unlicense",
        &["this is free and unencumbered software released into the public domain"],
    ),
    ("CC-BY-4.0", &["creative commons attribution 4.0"]),
];

/// Project manifests and the package manager they imply.
const MANIFESTS: &[(&str, &str)] = &[
    ("Cargo.toml", "cargo"),
    ("go.mod", "golang"),
    ("conanfile.txt", "conan"),
    ("conanfile.py", "conan"),
    ("vcpkg.json", "vcpkg"),
    ("package.json", "npm"),
    ("pyproject.toml", "pypi"),
    ("setup.py", "pypi"),
    ("pom.xml", "maven"),
    ("build.gradle", "gradle"),
    ("build.gradle.kts", "gradle"),
    ("composer.json", "composer"),
];

/// Match license text against the known marker phrases.
///
/// Case and whitespace are ignored. Returns the SPDX identifier of the
/// first license whose markers all appear.
#[must_use]
pub fn license_from_text(text: &str) -> Option<&'static str> {
    let normalized = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    LICENSE_MARKERS
        .iter()
        .find(|(_, markers)| markers.iter().all(|m| normalized.contains(m)))
        .map(|(id, _)| *id)
}

/// Path fragments that identify a packaging system wherever they appear.
const LAYOUTS: &[(&str, &str)] = &[
    ("/nix/store/", "nix"),
    ("/Cellar/", "brew"),
    ("/opt/homebrew/", "brew"),
    ("/.linuxbrew/", "brew"),
    ("/vcpkg_installed/", "vcpkg"),
    ("/vcpkg/installed/", "vcpkg"),
    ("/.conan/data/", "conan"),
    ("/.conan2/p/", "conan"),
    ("/snap/", "snap"),
    ("/site-packages/", "pypi"),
    ("/node_modules/", "npm"),
    ("/.cargo/bin/", "cargo"),
];

/// Package manager implied by an install location alone.
#[must_use]
pub fn package_manager_for_path(path: &Path) -> Option<&'static str> {
    let text = path.to_string_lossy();
    if let Some((_, manager)) = LAYOUTS.iter().find(|(marker, _)| text.contains(marker)) {
        return Some(*manager);
    }
    let mut parts = path.components().map(|c| c.as_os_str().to_string_lossy());
    parts.next();
    let (first, second, third) = (parts.next()?, parts.next(), parts.next());
    match (&*first, second.as_deref(), third.as_deref()) {
        // Multiarch directories are a Debian convention
        ("usr", Some("lib"), Some(triple)) | ("lib", Some(triple), _)
            if triple.ends_with("-linux-gnu") || triple.ends_with("-linux-gnueabihf") =>
        {
            Some("deb")
        }
        ("usr", Some("lib64"), _) | ("lib64", _, _) => Some("rpm"),
        _ => None,
    }
}

/// Looks for license files and package-manager hints, caching per directory.
#[derive(Debug)]
pub struct MetadataDetector {
    root: PathBuf,
    licenses: HashMap<PathBuf, Option<(String, PathBuf)>>,
}

/// What [`MetadataDetector::apply`] filled in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectionReport {
    pub licenses: usize,
    pub package_managers: usize,
}

impl Default for MetadataDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataDetector {
    /// Detector for the running system.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root("/")
    }

    /// Detector whose package databases live below `root` instead of `/`.
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            licenses: HashMap::new(),
        }
    }

    /// Fill empty license and package-manager fields of file-backed components.
    pub fn apply(&mut self, registry: &mut Registry) -> DetectionReport {
        let mut report = DetectionReport::default();
        for component in registry.components_mut() {
            // Members share the archive's file
            if component.container.is_some() {
                continue;
            }
            let Some(path) = component.file_path.as_deref().map(absolute_path) else {
                continue;
            };
            if component.license.is_noassertion() {
                if let Some((expression, source)) = self.license_for(&path) {
                    component.license = LicenseExpression::new(expression);
                    component.properties.insert(
                        "binsbom:license-file".to_string(),
                        source.display().to_string(),
                    );
                    report.licenses += 1;
                }
            }
            if component.package_manager.is_none() {
                if let Some(manager) = self.package_manager_for(&path) {
                    component.package_manager = Some(manager.to_string());
                    report.package_managers += 1;
                }
            }
        }
        tracing::debug!(
            "detected {} licenses and {} package managers",
            report.licenses,
            report.package_managers
        );
        report
    }

    /// License of the files shipped next to `file`, or one directory up.
    pub fn license_for(&mut self, file: &Path) -> Option<(String, PathBuf)> {
        let dir = file.parent()?;
        std::iter::successors(Some(dir), |d| d.parent())
            .take(2)
            .find_map(|d| self.license_in(d))
    }

    /// Package manager from the install layout, an enclosing project
    /// manifest, or the host package database for system directories.
    #[must_use]
    pub fn package_manager_for(&self, file: &Path) -> Option<&'static str> {
        package_manager_for_path(file)
            .or_else(|| manifest_manager(file))
            .or_else(|| self.system_manager(file))
    }

    fn license_in(&mut self, dir: &Path) -> Option<(String, PathBuf)> {
        if let Some(cached) = self.licenses.get(dir) {
            return cached.clone();
        }
        let found = scan_license_files(dir);
        self.licenses.insert(dir.to_path_buf(), found.clone());
        found
    }

    fn system_manager(&self, file: &Path) -> Option<&'static str> {
        let system_dirs = ["/usr/bin", "/usr/sbin", "/usr/lib", "/bin", "/sbin", "/lib"];
        if !system_dirs.iter().any(|d| file.starts_with(d)) {
            return None;
        }
        if self.root.join("var/lib/dpkg/status").is_file() {
            Some("deb")
        } else if self.root.join("var/lib/rpm").is_dir() {
            Some("rpm")
        } else if self.root.join("lib/apk/db/installed").is_file() {
            Some("apk")
        } else {
            None
        }
    }
}

/// Every recognized license file in `dir`. Distinct licenses all apply, so
/// they are joined with `AND`; the reported source is the first file.
fn scan_license_files(dir: &Path) -> Option<(String, PathBuf)> {
    let mut ids: Vec<&'static str> = Vec::new();
    let mut source = None;
    for name in LICENSE_FILE_NAMES {
        let path = dir.join(name);
        if !path.is_file() {
            continue;
        }
        let text = match read_prefix(&path) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!("cannot read {}: {e}", path.display());
                continue;
            }
        };
        match license_from_text(&text) {
            Some(id) => {
                if !ids.contains(&id) {
                    ids.push(id);
                }
                source.get_or_insert(path);
            }
            None => tracing::debug!("no known license in {}", path.display()),
        }
    }
    source.map(|source| (ids.join(" AND "), source))
}

fn read_prefix(path: &Path) -> std::io::Result<String> {
    let mut bytes = Vec::new();
    File::open(path)?
        .take(MAX_LICENSE_BYTES)
        .read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn manifest_manager(file: &Path) -> Option<&'static str> {
    let dir = file.parent()?;
    std::iter::successors(Some(dir), |d| d.parent())
        .take(MANIFEST_DEPTH)
        .find_map(|d| {
            MANIFESTS
                .iter()
                .find(|(name, _)| d.join(name).is_file())
                .map(|(_, manager)| *manager)
        })
}
