//! SBOM generation.
//!
//! [`SbomGenerator`] walks a [`Registry`](crate::model::Registry) through its
//! lifecycle and hands the result to a [`DocumentWriter`] chosen by
//! [`OutputFormat`]. Writers are pure functions of the registry and a
//! [`DocumentContext`], so a fixed timestamp yields byte-identical output.

mod canonical;
mod context;
mod cyclonedx;
mod format;
mod spdx3;
mod spdx_tag;
mod state;
mod traits;

pub use canonical::canonicalize;
pub use context::{DocumentContext, GeneratorConfig, TOOL_NAME, TOOL_VERSION};
pub use cyclonedx::{external_ref, CycloneDxWriter, EXTERNAL_PROPERTY, EXTERNAL_REF_PREFIX};
pub use format::{CycloneDxVersion, OutputFormat, Spdx3Version};
pub use spdx3::{external_iri, Spdx3Writer, EXTERNAL_URN_PREFIX};
pub use spdx_tag::{external_element, SpdxTagValueWriter, EXTERNAL_DOCUMENT_REF};
pub use state::{GeneratorState, SbomGenerator};
pub use traits::DocumentWriter;

impl OutputFormat {
    /// The writer for this format.
    #[must_use]
    pub fn writer(self) -> Box<dyn DocumentWriter> {
        match self {
            Self::SpdxTagValue => Box::new(SpdxTagValueWriter::new()),
            Self::SpdxJson(version) => Box::new(Spdx3Writer::new(version)),
            Self::CycloneDx(version) => Box::new(CycloneDxWriter::new(version)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_matches_format() {
        for format in OutputFormat::all() {
            assert_eq!(format.writer().format(), format);
        }
    }
}
