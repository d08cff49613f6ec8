//! Format-neutral component model.
//!
//! Extracted artifacts become [`Component`]s owned by a [`Registry`], which
//! assigns [`BomRef`]s and tracks dependency edges. Nothing here knows about
//! SPDX or CycloneDX; serializers in [`crate::generate`] read the registry.
//!
//! ```ignore
//! let mut registry = Registry::new();
//! let app = registry.register_artifact(&artifact)?;
//! let outcome = registry.resolve_edges();
//! assert!(registry.validate().is_empty());
//! ```

mod bom_ref;
mod component;
mod detect;
mod hints;
mod license;
mod purl;
mod registry;

pub use bom_ref::{sanitize_ref, spdx_idstring, BomRef};
pub use component::{Component, ComponentType, MergeConflict, Scope};
pub use detect::{
    license_from_text, package_manager_for_path, DetectionReport, MetadataDetector,
    LICENSE_FILE_NAMES,
};
pub use hints::{ComponentOverride, DebugInfoHints, MetadataOverrides, UnitHints};
pub use license::{LicenseExpression, NOASSERTION};
pub use purl::{build_purl, purl_name, PurlType};
pub use registry::{
    DependencyEdge, EdgeKind, EdgeResolution, EdgeTarget, Registry, RegistryViolation,
};
