#![no_main]
use binsbom::extract::{Artifact, BinaryExtractor, ExtractorDispatcher};
use libfuzzer_sys::fuzz_target;

/// Fuzz magic detection and full extraction.
///
/// Whichever extractor claims the input runs every query over it, so header
/// parsing, load commands, import tables and archive members all see
/// arbitrary bytes.
fuzz_target!(|data: &[u8]| {
    let dispatcher = ExtractorDispatcher::standard();
    if let Some(extractor) = dispatcher.select(data) {
        let artifact = Artifact::from_bytes("fuzz.bin", data.to_vec());
        let _ = extractor.extract(&artifact);
    }
});
