//! Readers for generated SBOM documents.
//!
//! Each reader turns one format into a [`ParsedBom`]: components keyed by
//! their document reference and the edges between them. The comparator in
//! [`crate::diff`] works only on this view.
//!
//! ```no_run
//! use binsbom::parsers::parse_bom;
//! use std::path::Path;
//!
//! let bom = parse_bom(Path::new("app.cdx.json")).unwrap();
//! println!("{} components", bom.components.len());
//! ```

mod bom;
mod cyclonedx;
mod detection;
mod spdx;
mod spdx3;
mod traits;

pub use bom::{ParsedBom, ParsedComponent, ParsedEdge};
pub use cyclonedx::CycloneDxParser;
pub use detection::{DetectionResult, FormatDetector, ParserKind};
pub use spdx::SpdxParser;
pub use spdx3::Spdx3Parser;
pub use traits::{BomParser, FormatConfidence, FormatDetection};

use std::path::Path;

use crate::error::{BinsbomError, Result};

/// Documents larger than this are refused.
const MAX_DOCUMENT_SIZE: u64 = 512 * 1024 * 1024;

/// Detect the format of `content` and read it.
pub fn parse_bom_str(content: &str) -> Result<ParsedBom> {
    FormatDetector::new().parse_str(content)
}

/// Read a document from disk.
pub fn parse_bom(path: &Path) -> Result<ParsedBom> {
    let metadata = std::fs::metadata(path).map_err(|e| BinsbomError::io(path, e))?;
    if metadata.len() > MAX_DOCUMENT_SIZE {
        return Err(BinsbomError::validation(format!(
            "{} is {} MB, exceeding the {} MB limit",
            path.display(),
            metadata.len() / (1024 * 1024),
            MAX_DOCUMENT_SIZE / (1024 * 1024),
        )));
    }
    let content = std::fs::read_to_string(path).map_err(|e| BinsbomError::io(path, e))?;
    parse_bom_str(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_bom_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"bomFormat":"CycloneDX","specVersion":"1.6","components":[{{"type":"library","bom-ref":"a","name":"a"}}]}}"#
        )
        .unwrap();
        let bom = parse_bom(file.path()).unwrap();
        assert_eq!(bom.components.len(), 1);
    }

    #[test]
    fn test_missing_file() {
        assert!(parse_bom(Path::new("/nonexistent/binsbom.json")).is_err());
    }
}
