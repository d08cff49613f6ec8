//! Named configuration presets.

use super::types::{AppConfig, ExtractionConfig, GenerationConfig, OutputConfig};

/// Creation time used by the reproducible preset when none is configured.
pub const REPRODUCIBLE_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

// ============================================================================
// Configuration Presets
// ============================================================================

/// Named configuration presets for common use cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPreset {
    /// Default settings suitable for most cases
    Default,
    /// Fixed timestamp and single-threaded extraction, for byte-identical output
    Reproducible,
    /// Compact documents without debug details or detected metadata
    Minimal,
    /// Recursive discovery with every detail emitted
    Full,
}

impl ConfigPreset {
    /// Get the preset name as a string.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Reproducible => "reproducible",
            Self::Minimal => "minimal",
            Self::Full => "full",
        }
    }

    /// Parse a preset from a string name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "default" => Some(Self::Default),
            "reproducible" | "repro" => Some(Self::Reproducible),
            "minimal" | "min" => Some(Self::Minimal),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Default => "CycloneDX 1.6, current time, one worker per core",
            Self::Reproducible => "Fixed creation time and one worker for repeatable output",
            Self::Minimal => "Compact JSON without debug details or license-file detection",
            Self::Full => "Recursive directory walk with all debug details",
        }
    }

    /// Get all available presets.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Default, Self::Reproducible, Self::Minimal, Self::Full]
    }
}

impl std::fmt::Display for ConfigPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ============================================================================
// Preset Implementations
// ============================================================================

impl AppConfig {
    /// Create an `AppConfig` from a named preset.
    #[must_use]
    pub fn from_preset(preset: ConfigPreset) -> Self {
        match preset {
            ConfigPreset::Default => Self::default(),
            ConfigPreset::Reproducible => Self::reproducible_preset(),
            ConfigPreset::Minimal => Self::minimal_preset(),
            ConfigPreset::Full => Self::full_preset(),
        }
    }

    #[must_use]
    pub fn reproducible_preset() -> Self {
        Self {
            extraction: ExtractionConfig {
                threads: 1,
                ..ExtractionConfig::default()
            },
            generation: GenerationConfig {
                timestamp: Some(REPRODUCIBLE_TIMESTAMP.to_string()),
                ..GenerationConfig::default()
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn minimal_preset() -> Self {
        Self {
            extraction: ExtractionConfig {
                skip_detection: true,
                ..ExtractionConfig::default()
            },
            generation: GenerationConfig {
                include_debug_details: false,
                ..GenerationConfig::default()
            },
            output: OutputConfig {
                pretty: false,
                ..OutputConfig::default()
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn full_preset() -> Self {
        Self {
            extraction: ExtractionConfig {
                recursive: true,
                ..ExtractionConfig::default()
            },
            generation: GenerationConfig {
                include_debug_details: true,
                ..GenerationConfig::default()
            },
            ..Self::default()
        }
    }
}
