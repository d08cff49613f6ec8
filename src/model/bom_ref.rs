//! Stable component references.
//!
//! A [`BomRef`] is assigned once when a component is registered and is
//! used verbatim as the CycloneDX `bom-ref`. SPDX identifiers are derived
//! from it with a narrower character set.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Document-unique reference to a registered component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BomRef(String);

impl BomRef {
    /// Wrap an already sanitized reference, e.g. one read back from a document.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// `name@version` (or bare `name`) with disallowed characters replaced.
    #[must_use]
    pub fn from_name_version(name: &str, version: Option<&str>) -> Self {
        let raw = match version {
            Some(v) if !v.is_empty() => format!("{name}@{v}"),
            _ => name.to_string(),
        };
        Self(sanitize_ref(&raw))
    }

    /// Collision variant: `base-2`, `base-3`, ...
    #[must_use]
    pub fn with_suffix(&self, n: usize) -> Self {
        Self(format!("{}-{n}", self.0))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `SPDXRef-` identifier for this reference.
    #[must_use]
    pub fn spdx_id(&self) -> String {
        format!("SPDXRef-{}", spdx_idstring(&self.0))
    }
}

impl fmt::Display for BomRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BomRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Replace characters outside `[A-Za-z0-9.+_@-]` with `-`.
#[must_use]
pub fn sanitize_ref(raw: &str) -> String {
    let out: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '_' | '@' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if out.is_empty() {
        "component".to_string()
    } else {
        out
    }
}

/// Replace characters outside `[A-Za-z0-9.-]` with `-`.
#[must_use]
pub fn spdx_idstring(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_version() {
        assert_eq!(
            BomRef::from_name_version("libz.so.1", Some("1.2.13")).as_str(),
            "libz.so.1@1.2.13"
        );
        assert_eq!(BomRef::from_name_version("app", None).as_str(), "app");
        assert_eq!(BomRef::from_name_version("app", Some("")).as_str(), "app");
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_ref("lib foo/bar:1"), "lib-foo-bar-1");
        assert_eq!(sanitize_ref("a+b_c@1.0"), "a+b_c@1.0");
        assert_eq!(sanitize_ref(""), "component");
    }

    #[test]
    fn test_spdx_id() {
        let r = BomRef::from_name_version("libc++_shared.so", Some("17"));
        assert_eq!(r.spdx_id(), "SPDXRef-libc---shared.so-17");
    }

    #[test]
    fn test_suffix() {
        assert_eq!(BomRef::new("a@1").with_suffix(2).as_str(), "a@1-2");
    }
}
