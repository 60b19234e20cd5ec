#![no_main]
use argodiff_core::filter::{scan_section, DiffFilter};
use argodiff_core::filter_diff;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Must not panic and must be stable on its own output
        let once = filter_diff(s);
        assert_eq!(filter_diff(&once), once);
        assert!(!once.contains("\n\n\n"));

        let _ = scan_section(s);

        // Arbitrary tracking keys are escaped, never rejected
        if let Some((key, body)) = s.split_once('\n') {
            if let Ok(filter) = DiffFilter::new(key) {
                let _ = filter.filter(body);
            }
        }
    }
});
