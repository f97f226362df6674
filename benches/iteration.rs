use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fixpoint::{
    build_function, run_fixed_point_iteration, sweep_initial_guesses, Configuration,
    StoppingCriterion,
};

fn benchmark_build_function(c: &mut Criterion) {
    let text = "sqrt(x + 1) + 0.1 * sin(3 * x) - exp(-x**2) / (1 + abs(x))";

    c.bench_function("build_function", |b| {
        b.iter(|| black_box(build_function(black_box(text))))
    });
}

fn benchmark_cosine_run(c: &mut Criterion) {
    let g = build_function("cos(x)").unwrap();
    let config = Configuration::builder()
        .initial_guess(0.5)
        .tolerance(1e-12)
        .max_iterations(1_000)
        .stopping_criterion(StoppingCriterion::Residual)
        .use_aitken(true)
        .build()
        .unwrap();

    let mut group = c.benchmark_group("run_fixed_point_iteration");
    group.bench_function("expression", |b| {
        b.iter(|| black_box(run_fixed_point_iteration(&g, black_box(&config))))
    });
    group.bench_function("closure", |b| {
        let native = |x: f64| x.cos();
        b.iter(|| black_box(run_fixed_point_iteration(&native, black_box(&config))))
    });
    group.finish();
}

fn benchmark_sweep(c: &mut Criterion) {
    let g = build_function("cos(x)").unwrap();
    let config = Configuration::builder()
        .tolerance(1e-12)
        .max_iterations(1_000)
        .build()
        .unwrap();
    let guesses: Vec<f64> = (0..256).map(|i| -4.0 + i as f64 / 32.0).collect();

    c.bench_function("sweep_initial_guesses_256", |b| {
        b.iter(|| black_box(sweep_initial_guesses(&g, &config, black_box(&guesses))))
    });
}

criterion_group!(
    benches,
    benchmark_build_function,
    benchmark_cosine_run,
    benchmark_sweep
);
criterion_main!(benches);
