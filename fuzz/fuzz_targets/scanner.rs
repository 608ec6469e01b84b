#![no_main]

use libfuzzer_sys::fuzz_target;
use tagsoup::{ParserConfig, Scanner, StrSource};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let config = ParserConfig::default();
    let total = input.chars().count() as i64;
    let mut last_end = 0;
    for token in Scanner::new(StrSource::new(input), &config) {
        let token = token.expect("string input never fails");
        assert!(token.span.begin.offset >= last_end, "token overlaps its predecessor");
        assert!(token.span.end.offset <= total, "token runs past the input");
        last_end = token.span.end.offset;
    }
});
