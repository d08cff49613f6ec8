//! Package URL construction for binary components.

use packageurl::PackageUrl;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported PURL types. Binaries without packaging metadata are `generic`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurlType {
    #[default]
    Generic,
    Deb,
    Rpm,
    Conan,
    Vcpkg,
}

impl PurlType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Deb => "deb",
            Self::Rpm => "rpm",
            Self::Conan => "conan",
            Self::Vcpkg => "vcpkg",
        }
    }

    /// Map a package-manager hint (`dpkg`, `rpm`, `conan`, ...) onto a type.
    #[must_use]
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.trim().to_ascii_lowercase().as_str() {
            "generic" => Some(Self::Generic),
            "deb" | "dpkg" | "apt" | "debian" => Some(Self::Deb),
            "rpm" | "dnf" | "yum" => Some(Self::Rpm),
            "conan" => Some(Self::Conan),
            "vcpkg" => Some(Self::Vcpkg),
            _ => None,
        }
    }
}

impl fmt::Display for PurlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render `pkg:<type>/<namespace>/<name>@<version>?arch=<arch>`.
///
/// Returns `None` when the name is empty or rejected by the PURL grammar.
#[must_use]
pub fn build_purl(
    purl_type: PurlType,
    namespace: Option<&str>,
    name: &str,
    version: Option<&str>,
    arch: Option<&str>,
) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    let mut purl = match PackageUrl::new(purl_type.as_str(), name) {
        Ok(purl) => purl,
        Err(e) => {
            tracing::debug!("cannot build purl for '{name}': {e}");
            return None;
        }
    };
    if let Some(ns) = namespace.filter(|ns| !ns.is_empty()) {
        purl.with_namespace(ns);
    }
    if let Some(v) = version.filter(|v| !v.is_empty()) {
        purl.with_version(v);
    }
    if let Some(arch) = arch.filter(|a| !a.is_empty() && *a != "unknown") {
        if let Err(e) = purl.add_qualifier("arch", arch) {
            tracing::debug!("dropping arch qualifier '{arch}': {e}");
        }
    }
    Some(purl.to_string())
}

/// The `name` segment of a PURL string, for matching read-back documents.
#[must_use]
pub fn purl_name(purl: &str) -> Option<&str> {
    let rest = purl.strip_prefix("pkg:")?;
    let path = rest.split(['?', '#']).next()?;
    let path = path.split('@').next()?;
    path.rsplit('/').next().filter(|n| !n.is_empty())
}
