use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use tagsoup::perf_fixtures::{make_blocks, make_deep_nesting, make_soup};
use tagsoup::{
    CanonicalWriter, HtmlParser, NestingCheck, NullHandler, ParserConfig, Pipeline,
    ReaderSource, Scanner, StrSource,
};

const SMALL_BLOCKS: usize = 64;
const LARGE_BLOCKS: usize = 20_000;
const DEEP_NESTING: usize = 10_000;

fn make_rawtext_adversarial(bytes: usize) -> String {
    let mut body = String::with_capacity(bytes + 32);
    body.push_str("<script>");
    while body.len() < bytes {
        body.push_str("</scri");
        body.push('<');
        body.push_str("pt");
    }
    body.push_str("</script>");
    body
}

fn count_tokens(input: &str, config: &ParserConfig) -> usize {
    Scanner::new(StrSource::new(input), config)
        .map(|token| token.expect("string input never fails"))
        .count()
}

fn bench_scan_small(c: &mut Criterion) {
    let input = make_blocks(SMALL_BLOCKS);
    let config = ParserConfig::default();
    c.bench_function("bench_scan_small", |b| {
        b.iter(|| black_box(count_tokens(black_box(&input), &config)));
    });
}

fn bench_scan_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    let config = ParserConfig::default();
    c.bench_function("bench_scan_large", |b| {
        b.iter(|| black_box(count_tokens(black_box(&input), &config)));
    });
}

fn bench_parse_large_end_to_end(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    let mut parser = HtmlParser::default();
    c.bench_function("bench_parse_large_end_to_end", |b| {
        b.iter(|| {
            let stats = parser
                .parse_str(black_box(&input), NullHandler)
                .expect("string input never fails");
            black_box(stats);
        });
    });
}

fn bench_parse_soup(c: &mut Criterion) {
    let input = make_soup(LARGE_BLOCKS / 4);
    let mut parser = HtmlParser::default();
    c.bench_function("bench_parse_soup", |b| {
        b.iter(|| {
            let stats = parser
                .parse_str(black_box(&input), NullHandler)
                .expect("string input never fails");
            black_box(stats);
        });
    });
}

fn bench_parse_deep_nesting(c: &mut Criterion) {
    let input = make_deep_nesting(DEEP_NESTING);
    let mut parser = HtmlParser::new(ParserConfig {
        document_fragment: true,
        ..ParserConfig::default()
    });
    c.bench_function("bench_parse_deep_nesting", |b| {
        b.iter(|| {
            let stats = parser
                .parse_str(black_box(&input), NullHandler)
                .expect("string input never fails");
            black_box(stats.max_depth);
        });
    });
}

fn bench_parse_deep_stray_end_tags(c: &mut Criterion) {
    let mut input = make_deep_nesting(DEEP_NESTING);
    input.push_str(&"</x>".repeat(DEEP_NESTING));
    let mut parser = HtmlParser::new(ParserConfig {
        document_fragment: true,
        ..ParserConfig::default()
    });
    c.bench_function("bench_parse_deep_stray_end_tags", |b| {
        b.iter(|| {
            let stats = parser
                .parse_str(black_box(&input), NullHandler)
                .expect("string input never fails");
            black_box(stats.notices);
        });
    });
}

fn bench_reader_chunked(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    let bytes = input.as_bytes();
    let chunk_sizes = [1usize, 7, 64, 1024, 8192];
    let mut parser = HtmlParser::default();
    c.bench_function("bench_reader_chunked", |b| {
        b.iter(|| {
            for &size in &chunk_sizes {
                let source = ReaderSource::with_chunk_size(black_box(bytes), size);
                let stats = parser
                    .parse(source, NullHandler)
                    .expect("in-memory reader never fails");
                black_box(stats);
            }
        });
    });
}

fn bench_filtered_pipeline(c: &mut Criterion) {
    let input = make_soup(LARGE_BLOCKS / 4);
    let mut parser = HtmlParser::default();
    c.bench_function("bench_filtered_pipeline", |b| {
        b.iter_batched(
            || {
                Pipeline::new(CanonicalWriter::new(Vec::with_capacity(input.len() * 2)))
                    .with_filter(NestingCheck::strict())
            },
            |mut pipeline| {
                parser
                    .parse_str(black_box(&input), &mut pipeline)
                    .expect("balanced output passes the nesting check");
                black_box(pipeline.into_sink().into_inner().len());
            },
            BatchSize::LargeInput,
        );
    });
}

fn bench_scan_rawtext_adversarial(c: &mut Criterion) {
    let input = make_rawtext_adversarial(512 * 1024);
    let config = ParserConfig::default();
    c.bench_function("bench_scan_rawtext_adversarial", |b| {
        b.iter(|| black_box(count_tokens(black_box(&input), &config)));
    });
}

criterion_group!(
    benches,
    bench_scan_small,
    bench_scan_large,
    bench_parse_large_end_to_end,
    bench_parse_soup,
    bench_parse_deep_nesting,
    bench_parse_deep_stray_end_tags,
    bench_reader_chunked,
    bench_filtered_pipeline,
    bench_scan_rawtext_adversarial
);
criterion_main!(benches);
