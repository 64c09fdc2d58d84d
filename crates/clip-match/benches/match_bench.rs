//! Benchmarks for clippings parsing and note matching.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use clip_core::options::NoteTextSource;
use clip_input_kindle::parse_clippings;
use clip_match::match_entries;

/// A synthetic export with `pages` pages, three highlights and one note per page.
fn make_clippings(pages: u32) -> String {
    let mut out = String::new();
    for page in 1..=pages {
        for i in 0..4 {
            let (kind, text) = if i == 3 {
                ("Note", format!("A thought about page {}", page))
            } else {
                ("Highlight", format!("Passage {} on page {} of the book", i, page))
            };
            let minute = (page * 4 + i) % 60;
            out.push_str(&format!(
                "Benchmark Book (Anon)\n- Your {} on page {} | location {}-{} | Added on Monday, January 1, 2024 10:{:02}:00 AM\n\n{}\n==========\n",
                kind,
                page,
                page * 10,
                page * 10 + 1,
                minute,
                text
            ));
        }
    }
    out
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("Parse");

    let small = make_clippings(50);
    group.bench_function("parse_200_entries", |b| {
        b.iter(|| black_box(parse_clippings(black_box(&small), NoteTextSource::AllLines)))
    });

    let large = make_clippings(500);
    group.bench_function("parse_2000_entries", |b| {
        b.iter(|| black_box(parse_clippings(black_box(&large), NoteTextSource::AllLines)))
    });

    group.finish();
}

fn bench_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("Match");

    let entries = parse_clippings(&make_clippings(500), NoteTextSource::AllLines);
    group.bench_function("match_2000_entries", |b| {
        b.iter(|| black_box(match_entries(black_box(entries.clone()))))
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_match);
criterion_main!(benches);
