//! Benchmarks for graph construction and resolution.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pipeflow::core::Param;
use pipeflow::dag;
use pipeflow::resolve::resolve;
use pipeflow::spec::{PipelineSpec, PipelineTask};

/// A layered pipeline: `width` tasks per layer, each reading a result of
/// every task in the previous layer.
fn layered_spec(layers: usize, width: usize) -> PipelineSpec {
    let mut spec = PipelineSpec::new();
    for layer in 0..layers {
        for i in 0..width {
            let mut task = PipelineTask::with_ref(format!("t-{layer}-{i}"), "noop");
            if layer > 0 {
                for j in 0..width {
                    task = task.with_param(Param::new(
                        format!("in-{j}"),
                        format!("$(tasks.t-{}-{j}.results.out)", layer - 1),
                    ));
                }
            }
            spec = spec.with_task(task);
        }
    }
    spec
}

fn build_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("dag_build");
    for (layers, width) in [(5, 4), (20, 10), (50, 20)] {
        let spec = layered_spec(layers, width);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{layers}x{width}")),
            &spec,
            |b, spec| b.iter(|| dag::build(black_box(&spec.tasks))),
        );
    }
    group.finish();
}

fn resolve_benchmark(c: &mut Criterion) {
    let spec = layered_spec(20, 10);
    c.bench_function("resolve_20x10", |b| b.iter(|| resolve(black_box(&spec))));
}

criterion_group!(benches, build_benchmark, resolve_benchmark);
criterion_main!(benches);
