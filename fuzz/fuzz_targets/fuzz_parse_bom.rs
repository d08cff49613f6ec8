#![no_main]
use libfuzzer_sys::fuzz_target;

/// Fuzz document detection and the CycloneDX, SPDX 3 and tag-value readers.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = binsbom::parsers::parse_bom_str(s);
    }
});
