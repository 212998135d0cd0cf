use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tickmark_engine::lint::Linter;
use tickmark_engine::{Document, OutlineTree, TodoConfig, discover, to_glyphs, to_markdown};
mod common;

fn bench_discovery(c: &mut Criterion) {
    let mut group = c.benchmark_group("discovery");
    group.sample_size(20);

    let config = TodoConfig::default();
    for items in [100, 500] {
        let content = common::generate_todo_list(items);
        let lines: Vec<&str> = content.lines().collect();

        group.bench_function(format!("parse_{items}"), |b| {
            b.iter(|| black_box(OutlineTree::parse(black_box(&lines))));
        });

        let tree = OutlineTree::parse(&lines);
        group.bench_function(format!("discover_{items}"), |b| {
            b.iter(|| black_box(discover(&tree, black_box(&lines), &config)));
        });

        let doc = Document::from_text(&content);
        group.bench_function(format!("document_discover_{items}"), |b| {
            b.iter(|| black_box(doc.discover(&config)));
        });
    }

    group.finish();
}

fn bench_lint_and_format(c: &mut Criterion) {
    let mut group = c.benchmark_group("lint_and_format");
    group.sample_size(20);

    let content = common::generate_todo_list(500);
    let lines: Vec<&str> = content.lines().collect();
    let tree = OutlineTree::parse(&lines);
    let linter = Linter::new(TodoConfig::default().linter);

    group.bench_function("lint_500", |b| {
        b.iter(|| black_box(linter.lint(&tree, black_box(&lines))));
    });

    let glyphs = TodoConfig::default().markers;
    let markdown = to_markdown(&content, &glyphs);
    group.bench_function("to_glyphs_500", |b| {
        b.iter(|| black_box(to_glyphs(black_box(&markdown), &glyphs)));
    });

    group.finish();
}

criterion_group!(benches, bench_discovery, bench_lint_and_format);
criterion_main!(benches);
