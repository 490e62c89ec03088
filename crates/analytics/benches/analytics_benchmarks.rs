use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use salesinsight_analytics::{
    AnalysisJob, Dimension, GapJob, Measure, ParetoJob, Reducer, RunMetadata, TrendJob, group_by,
};
use salesinsight_datagen::{DataGenConfig, generate_sample_data};

fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation");
    group.sample_size(10);

    for rows in [10_000usize, 90_000] {
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &rows| {
            b.iter(|| {
                let cfg = DataGenConfig::default().with_rows(rows);
                black_box(generate_sample_data(cfg).unwrap())
            })
        });
    }
    group.finish();
}

fn bench_analyses(c: &mut Criterion) {
    let ds = generate_sample_data(DataGenConfig::default()).unwrap();
    let meta = RunMetadata::now();

    let mut group = c.benchmark_group("analyses");
    group.throughput(Throughput::Elements(ds.ledger().len() as u64));

    group.bench_function("group_by_product_month", |b| {
        b.iter(|| {
            black_box(
                group_by(
                    ds.ledger(),
                    &[Dimension::Product, Dimension::Month],
                    Measure::Revenue,
                    Reducer::Sum,
                )
                .unwrap(),
            )
        })
    });

    let jobs: [&dyn AnalysisJob; 3] = [&ParetoJob::new(), &TrendJob::new(), &GapJob::new()];
    for job in jobs {
        group.bench_function(job.name(), |b| b.iter(|| black_box(job.run(&ds, &meta).unwrap())));
    }
    group.finish();
}

criterion_group!(benches, bench_generation, bench_analyses);
criterion_main!(benches);
