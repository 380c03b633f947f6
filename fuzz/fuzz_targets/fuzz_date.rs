#![no_main]

use kf_parser::normalize_date;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };

    let normalized = normalize_date(raw);
    assert_eq!(normalized.is_none(), raw.trim().is_empty());
});
