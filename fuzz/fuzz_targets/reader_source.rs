#![no_main]

use libfuzzer_sys::fuzz_target;
use tagsoup::{Event, HtmlParser, ReaderSource};

fuzz_target!(|data: &[u8]| {
    let Some((&chunk, bytes)) = data.split_first() else {
        return;
    };
    let lossy = String::from_utf8_lossy(bytes);
    let mut parser = HtmlParser::default();

    let mut from_str: Vec<Event> = Vec::new();
    parser.parse_str(&lossy, &mut from_str).expect("string input never fails");

    let mut from_reader: Vec<Event> = Vec::new();
    let source = ReaderSource::with_chunk_size(bytes, usize::from(chunk) + 1);
    parser.parse(source, &mut from_reader).expect("in-memory reader never fails");

    assert_eq!(from_reader, from_str);
});
