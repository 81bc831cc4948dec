use adc_pca::centering::CenteredMatrix;
use adc_pca::loader::RawMatrix;
use adc_pca::{PcaEngine, Pipeline, PipelineConfig};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ndarray::{Array, Array2};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

// Raw ADC-like counts
fn generate_events(n_events: usize, event_width: usize) -> Array2<f64> {
    Array::random((n_events, event_width), Uniform::new(450., 500.)).mapv(f64::round)
}

fn bench_pca_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("PcaEngine_fit");

    for &(n_events, event_width) in [(500, 50), (2000, 100), (2000, 400)].iter() {
        let raw = RawMatrix::from_array(generate_events(n_events, event_width));
        let centered = CenteredMatrix::from_raw(&raw);
        group.throughput(Throughput::Elements((n_events * event_width) as u64));
        group.bench_with_input(
            BenchmarkId::new("fit", format!("{}x{}", n_events, event_width)),
            &centered,
            |b, centered| {
                let engine = PcaEngine::default();
                b.iter(|| engine.fit(centered.view()).unwrap());
            },
        );
    }
    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("Pipeline_run");
    group.sample_size(10);

    for &(n_events, event_width) in [(2000, 100), (4000, 400)].iter() {
        let data = generate_events(n_events, event_width);
        let pipeline = Pipeline::new(PipelineConfig::with_geometry(event_width, 0.5)).unwrap();
        group.throughput(Throughput::Elements((n_events * event_width) as u64));
        group.bench_with_input(
            BenchmarkId::new("run_matrix", format!("{}x{}", n_events, event_width)),
            &data,
            |b, data| {
                b.iter_with_setup(
                    || RawMatrix::from_array(data.clone()),
                    |raw| pipeline.run_matrix(raw).unwrap(),
                );
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_pca_fit, bench_pipeline);
criterion_main!(benches);
