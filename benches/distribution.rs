//! Benchmarks for scoring and sampling in the default world.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tinyworld::{apply_rules, next_rel_distr_stats, TinyWorldConfig, TinyWorldTask};

fn bench_next_distribution(c: &mut Criterion) {
    let mut task = TinyWorldTask::new(TinyWorldConfig::default()).unwrap();
    let story = task.gen_story(8).unwrap();
    let rules = task.rules().to_vec();

    c.bench_function("apply_rules_default_world", |bench| {
        bench.iter(|| black_box(apply_rules(&rules, &story).unwrap().len()))
    });

    c.bench_function("next_distribution_default_world", |bench| {
        bench.iter(|| black_box(task.next_distribution(&story).unwrap().len()))
    });

    let candidates = apply_rules(&rules, &story).unwrap();
    c.bench_function("score_candidates", |bench| {
        bench.iter(|| black_box(next_rel_distr_stats(&candidates).len()))
    });
}

fn bench_gen_example(c: &mut Criterion) {
    let mut task = TinyWorldTask::new(TinyWorldConfig::default()).unwrap();
    c.bench_function("gen_rand_example", |bench| {
        bench.iter(|| black_box(task.gen_rand_example().unwrap().output.len()))
    });
}

criterion_group!(benches, bench_next_distribution, bench_gen_example);
criterion_main!(benches);
