#![no_main]

use kf_parser::{parse, tokenize};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    for token in tokenize(input) {
        assert!(!token.tag.is_empty());
        assert!(token.line >= 1);
    }

    let result = parse(input);
    assert!(result.records.individuals.len() <= result.token_count);
});
