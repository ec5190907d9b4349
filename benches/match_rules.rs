//! Benchmarks for rule matching over growing scenes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::rc::Rc;
use tinyworld::{parse_rel, parse_rule, RelationSchema, Story, TypeMap};

fn animals() -> Story {
    let types = TypeMap::from_groups([
        ("animal", vec!["cat", "monkey", "elephant"]),
        ("inanimate", vec!["rock", "tree", "flower"]),
        ("squishable", vec!["cat", "monkey", "flower"]),
    ])
    .unwrap();
    let relations = RelationSchema::new(
        [
            ("is", vec![""]),
            ("jumps", vec!["animal"]),
            ("squishes", vec!["animal", "squishable"]),
        ],
        &types,
    )
    .unwrap();
    Story::init(Rc::new(types), Rc::new(relations))
}

/// A scene of `n` monkeys, every other one jumping
fn setup_scene(n: usize) -> Story {
    let mut facts = Vec::with_capacity(n + n / 2);
    for i in 0..n {
        facts.push(parse_rel(&format!("is _m{}:monkey", i)).unwrap());
        if i % 2 == 0 {
            facts.push(parse_rel(&format!("jumps _m{}", i)).unwrap());
        }
    }
    animals().extend_scene(&facts).unwrap()
}

fn bench_single_condition(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_single_condition");
    let rule = parse_rule("S(jumps ?x | is ?x:animal) += 2").unwrap();

    for size in [10, 50, 100].iter() {
        let story = setup_scene(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &story, |bench, story| {
            bench.iter(|| black_box(story.match_rule(&rule).unwrap().len()))
        });
    }

    group.finish();
}

fn bench_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_join");
    // Quadratic in the number of `is` facts
    let rule = parse_rule("S(squishes ?x ?y | jumps ?x:monkey, is ?y) += 2").unwrap();

    for size in [10, 25, 50].iter() {
        let story = setup_scene(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &story, |bench, story| {
            bench.iter(|| black_box(story.match_rule(&rule).unwrap().len()))
        });
    }

    group.finish();
}

fn bench_negation(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_negation");
    let rule = parse_rule("S(jumps ?x | is ?x:monkey, -jumps ?x) += 1").unwrap();

    for size in [10, 50, 100].iter() {
        let story = setup_scene(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &story, |bench, story| {
            bench.iter(|| black_box(story.match_rule(&rule).unwrap().len()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_condition, bench_join, bench_negation);
criterion_main!(benches);
