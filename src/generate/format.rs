//! Output format selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{BinsbomError, GenerationErrorKind};

/// SPDX 3 JSON-LD revision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Spdx3Version {
    #[serde(rename = "3.0")]
    V3_0,
    #[default]
    #[serde(rename = "3.0.1")]
    V3_0_1,
}

impl Spdx3Version {
    /// `specVersion` value.
    #[must_use]
    pub const fn spec_version(self) -> &'static str {
        match self {
            Self::V3_0 => "3.0.0",
            Self::V3_0_1 => "3.0.1",
        }
    }

    #[must_use]
    pub const fn context_url(self) -> &'static str {
        match self {
            Self::V3_0 => "https://spdx.org/rdf/3.0.0/spdx-context.jsonld",
            Self::V3_0_1 => "https://spdx.org/rdf/3.0.1/spdx-context.jsonld",
        }
    }

    /// Base IRI for vocabulary individuals such as `NoAssertionLicense`.
    #[must_use]
    pub const fn terms_base(self) -> &'static str {
        match self {
            Self::V3_0 => "https://spdx.org/rdf/3.0.0/terms",
            Self::V3_0_1 => "https://spdx.org/rdf/3.0.1/terms",
        }
    }
}

/// CycloneDX specification version.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CycloneDxVersion {
    #[serde(rename = "1.4")]
    V1_4,
    #[serde(rename = "1.5")]
    V1_5,
    #[default]
    #[serde(rename = "1.6")]
    V1_6,
}

impl CycloneDxVersion {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V1_4 => "1.4",
            Self::V1_5 => "1.5",
            Self::V1_6 => "1.6",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "1.4" => Some(Self::V1_4),
            "1.5" => Some(Self::V1_5),
            "1.6" => Some(Self::V1_6),
            _ => None,
        }
    }

    /// `metadata.tools` became an object of components in 1.5.
    #[must_use]
    pub fn has_tool_components(self) -> bool {
        self >= Self::V1_5
    }

    /// `component.manufacturer` exists from 1.6.
    #[must_use]
    pub fn has_manufacturer(self) -> bool {
        self >= Self::V1_6
    }
}

/// Serialization strategy for a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "format", content = "version", rename_all = "kebab-case")]
pub enum OutputFormat {
    /// SPDX 2.3 tag-value
    SpdxTagValue,
    /// SPDX 3 JSON-LD
    SpdxJson(Spdx3Version),
    /// CycloneDX JSON
    CycloneDx(CycloneDxVersion),
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::CycloneDx(CycloneDxVersion::default())
    }
}

impl OutputFormat {
    /// Every supported format, for help text and tests.
    #[must_use]
    pub const fn all() -> [Self; 6] {
        [
            Self::SpdxTagValue,
            Self::SpdxJson(Spdx3Version::V3_0),
            Self::SpdxJson(Spdx3Version::V3_0_1),
            Self::CycloneDx(CycloneDxVersion::V1_4),
            Self::CycloneDx(CycloneDxVersion::V1_5),
            Self::CycloneDx(CycloneDxVersion::V1_6),
        ]
    }

    /// Conventional file extension.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::SpdxTagValue => "spdx",
            Self::SpdxJson(_) => "spdx.json",
            Self::CycloneDx(_) => "cdx.json",
        }
    }

    #[must_use]
    pub const fn is_json(self) -> bool {
        !matches!(self, Self::SpdxTagValue)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpdxTagValue => write!(f, "spdx-2.3"),
            Self::SpdxJson(Spdx3Version::V3_0) => write!(f, "spdx-3.0"),
            Self::SpdxJson(Spdx3Version::V3_0_1) => write!(f, "spdx-3.0.1"),
            Self::CycloneDx(v) => write!(f, "cyclonedx-{}", v.as_str()),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = BinsbomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let format = match lower.as_str() {
            "spdx" | "spdx-2.3" | "spdx2.3" | "spdx-tag-value" | "tag-value" => Self::SpdxTagValue,
            "spdx-3" | "spdx-3.0.1" | "spdx3" | "spdx-json" => {
                Self::SpdxJson(Spdx3Version::V3_0_1)
            }
            "spdx-3.0" | "spdx-3.0.0" => Self::SpdxJson(Spdx3Version::V3_0),
            "cyclonedx" | "cdx" => Self::CycloneDx(CycloneDxVersion::default()),
            other => {
                let version = other
                    .strip_prefix("cyclonedx-")
                    .or_else(|| other.strip_prefix("cdx-"))
                    .and_then(CycloneDxVersion::parse);
                match version {
                    Some(v) => Self::CycloneDx(v),
                    None => {
                        return Err(BinsbomError::generation(
                            "parsing output format",
                            GenerationErrorKind::UnsupportedFormat(s.to_string()),
                        ))
                    }
                }
            }
        };
        Ok(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        assert_eq!("spdx".parse::<OutputFormat>().unwrap(), OutputFormat::SpdxTagValue);
        assert_eq!(
            "spdx-3.0".parse::<OutputFormat>().unwrap(),
            OutputFormat::SpdxJson(Spdx3Version::V3_0)
        );
        assert_eq!(
            "SPDX-3.0.1".parse::<OutputFormat>().unwrap(),
            OutputFormat::SpdxJson(Spdx3Version::V3_0_1)
        );
        assert_eq!(
            "cyclonedx-1.4".parse::<OutputFormat>().unwrap(),
            OutputFormat::CycloneDx(CycloneDxVersion::V1_4)
        );
        assert_eq!(
            "cdx-1.6".parse::<OutputFormat>().unwrap(),
            OutputFormat::CycloneDx(CycloneDxVersion::V1_6)
        );
        assert!("cyclonedx-2.0".parse::<OutputFormat>().is_err());
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_display_parses_back() {
        for format in OutputFormat::all() {
            assert_eq!(format.to_string().parse::<OutputFormat>().unwrap(), format);
        }
    }

    #[test]
    fn test_version_features() {
        assert!(!CycloneDxVersion::V1_4.has_tool_components());
        assert!(CycloneDxVersion::V1_5.has_tool_components());
        assert!(!CycloneDxVersion::V1_5.has_manufacturer());
        assert!(CycloneDxVersion::V1_6.has_manufacturer());
    }
}
