#![no_main]

use libfuzzer_sys::fuzz_target;
use tagsoup::{HtmlParser, NestingCheck, ParserConfig};

fuzz_target!(|data: &[u8]| {
    let Some((&flags, rest)) = data.split_first() else {
        return;
    };
    let input = String::from_utf8_lossy(rest);
    let config = ParserConfig {
        document_fragment: flags & 1 != 0,
        synthesize_ancestors: flags & 2 == 0,
        ignore_root_end_tags: flags & 4 == 0,
        cdata_sections: flags & 8 != 0,
        report_errors: flags & 16 != 0,
        ..ParserConfig::default()
    };
    let mut check = NestingCheck::strict();
    HtmlParser::new(config)
        .parse_str(&input, &mut check)
        .expect("balancer output must always nest");
    assert!(check.is_well_formed());
});
