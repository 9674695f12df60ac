#![no_main]

use libfuzzer_sys::fuzz_target;
use tracewindow::TimeRange;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Must reject bad input without panicking
        if let Ok(range) = input.parse::<TimeRange>() {
            assert!(range.is_valid());
            assert_eq!(range.to_string().parse::<TimeRange>().ok(), Some(range));
        }
    }
});
