//! Generation lifecycle.
//!
//! `Initialized -> ComponentsLoaded -> RelationshipsResolved -> Serialized`.
//! Every step must run in order and exactly once; anything else is an
//! `InvalidTransition` error.

use std::fmt;

use super::context::{DocumentContext, GeneratorConfig};
use super::format::OutputFormat;
use crate::error::{BinsbomError, GenerationErrorKind, Result};
use crate::model::{build_purl, EdgeResolution, PurlType, Registry};

/// Where a generator is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratorState {
    Initialized,
    ComponentsLoaded,
    RelationshipsResolved,
    Serialized,
}

impl fmt::Display for GeneratorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initialized => "Initialized",
            Self::ComponentsLoaded => "ComponentsLoaded",
            Self::RelationshipsResolved => "RelationshipsResolved",
            Self::Serialized => "Serialized",
        };
        f.write_str(name)
    }
}

/// Drives one registry through loading, resolution and serialization.
#[derive(Debug)]
pub struct SbomGenerator {
    registry: Registry,
    config: GeneratorConfig,
    state: GeneratorState,
    resolution: Option<EdgeResolution>,
}

impl SbomGenerator {
    #[must_use]
    pub fn new(registry: Registry, config: GeneratorConfig) -> Self {
        Self {
            registry,
            config,
            state: GeneratorState::Initialized,
            resolution: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> GeneratorState {
        self.state
    }

    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn into_registry(self) -> Registry {
        self.registry
    }

    /// Edge counts from [`Self::resolve_relationships`], once it has run.
    #[must_use]
    pub const fn resolution(&self) -> Option<EdgeResolution> {
        self.resolution
    }

    fn transition(&mut self, expected: GeneratorState, next: GeneratorState) -> Result<()> {
        if self.state != expected {
            return Err(BinsbomError::generation(
                "advancing generator",
                GenerationErrorKind::InvalidTransition {
                    from: self.state.to_string(),
                    to: next.to_string(),
                },
            ));
        }
        tracing::debug!("generator {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Finalize per-component fields derived from configuration, such as
    /// PURLs for components that do not carry one.
    pub fn load_components(&mut self) -> Result<()> {
        self.transition(GeneratorState::Initialized, GeneratorState::ComponentsLoaded)?;
        let default_type = self.config.purl_type;
        let namespace = self.config.purl_namespace.clone();
        let mut assigned = 0usize;
        for component in self.registry.components_mut() {
            if component.purl.is_some() {
                continue;
            }
            let purl_type = component
                .package_manager
                .as_deref()
                .and_then(PurlType::from_hint)
                .unwrap_or(default_type);
            component.purl = build_purl(
                purl_type,
                namespace.as_deref(),
                &component.name,
                component.version.as_deref(),
                component.primary_arch(),
            );
            if component.purl.is_some() {
                assigned += 1;
            }
        }
        tracing::debug!(
            "loaded {} components, assigned {} purls",
            self.registry.len(),
            assigned
        );
        Ok(())
    }

    /// Resolve every pending dependency edge.
    pub fn resolve_relationships(&mut self) -> Result<EdgeResolution> {
        self.transition(
            GeneratorState::ComponentsLoaded,
            GeneratorState::RelationshipsResolved,
        )?;
        let resolution = self.registry.resolve_edges();
        for violation in self.registry.validate() {
            tracing::warn!("registry inconsistency: {violation}");
        }
        tracing::info!(
            "resolved {} dependencies, {} external",
            resolution.resolved,
            resolution.external
        );
        self.resolution = Some(resolution);
        Ok(resolution)
    }

    /// Render the registry. Allowed once.
    pub fn serialize(&mut self, format: OutputFormat) -> Result<String> {
        self.transition(
            GeneratorState::RelationshipsResolved,
            GeneratorState::Serialized,
        )?;
        let ctx = DocumentContext::new(&self.registry, &self.config);
        let writer = format.writer();
        writer.write_document(&self.registry, &ctx)
    }

    /// Run every step and render `format`.
    pub fn generate(registry: Registry, config: GeneratorConfig, format: OutputFormat) -> Result<String> {
        let mut generator = Self::new(registry, config);
        generator.load_components()?;
        generator.resolve_relationships()?;
        generator.serialize(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::CycloneDxVersion;
    use crate::model::Component;
    use chrono::TimeZone;

    fn config() -> GeneratorConfig {
        GeneratorConfig::default()
            .with_timestamp(chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        let app = registry
            .register_component(Component::new("app").with_version("1.0"))
            .unwrap();
        registry.add_dependency_by_name(&app, "libc.so.6").unwrap();
        registry
    }

    #[test]
    fn test_full_lifecycle() {
        let mut generator = SbomGenerator::new(registry(), config());
        assert_eq!(generator.state(), GeneratorState::Initialized);
        generator.load_components().unwrap();
        let resolution = generator.resolve_relationships().unwrap();
        assert_eq!(resolution.external, 1);
        let doc = generator
            .serialize(OutputFormat::CycloneDx(CycloneDxVersion::V1_6))
            .unwrap();
        assert_eq!(generator.state(), GeneratorState::Serialized);
        assert!(doc.contains("pkg:generic/app@1.0"));
    }

    #[test]
    fn test_out_of_order_is_rejected() {
        let mut generator = SbomGenerator::new(registry(), config());
        let err = generator.resolve_relationships().unwrap_err();
        assert!(matches!(
            err,
            BinsbomError::Generation {
                source: GenerationErrorKind::InvalidTransition { .. },
                ..
            }
        ));
        assert_eq!(generator.state(), GeneratorState::Initialized);
        assert!(generator.serialize(OutputFormat::SpdxTagValue).is_err());
    }

    #[test]
    fn test_serialize_twice_is_rejected() {
        let mut generator = SbomGenerator::new(registry(), config());
        generator.load_components().unwrap();
        generator.resolve_relationships().unwrap();
        generator.serialize(OutputFormat::SpdxTagValue).unwrap();
        let err = generator.serialize(OutputFormat::SpdxTagValue).unwrap_err();
        assert!(err.to_string().contains("generator"));
    }

    #[test]
    fn test_output_is_idempotent() {
        for format in OutputFormat::all() {
            let a = SbomGenerator::generate(registry(), config(), format).unwrap();
            let b = SbomGenerator::generate(registry(), config(), format).unwrap();
            assert_eq!(a, b, "{format} output differs between runs");
        }
    }

    #[test]
    fn test_empty_registry_is_allowed() {
        let doc = SbomGenerator::generate(
            Registry::new(),
            config(),
            OutputFormat::CycloneDx(CycloneDxVersion::V1_5),
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&doc).unwrap();
        assert_eq!(value["components"].as_array().unwrap().len(), 0);
    }
}
