#![no_main]
use libfuzzer_sys::fuzz_target;

// Canonicalizing twice must be a fixed point.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(first) = binsbom::canonicalize(s) {
            if let Ok(text) = std::str::from_utf8(&first) {
                if let Ok(second) = binsbom::canonicalize(text) {
                    assert_eq!(first, second);
                }
            }
        }
    }
});
