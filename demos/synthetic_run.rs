use adc_pca::synthetic::{white_noise_samples, BaselineShiftedStream};
use adc_pca::{Pipeline, PipelineConfig};

fn main() {
    // Events sharing a per-event baseline offset
    let stream = BaselineShiftedStream {
        events: 3000,
        event_width: 64,
        ..Default::default()
    };
    let samples = stream.generate().expect("invalid stream parameters");

    let config = PipelineConfig {
        compute_correlations: true,
        ..PipelineConfig::with_geometry(stream.event_width, 0.5)
    };
    let pipeline = Pipeline::new(config).expect("invalid pipeline configuration");

    let output = pipeline.run_samples(&samples).expect("decorrelation failed");
    println!("Baseline-shifted stream:");
    println!("{}", serde_json::to_string_pretty(&output.report()).unwrap());

    // White noise has nothing to decorrelate
    let noise = white_noise_samples(3000 * 64, 7);
    let output = pipeline.run_samples(&noise).expect("decorrelation failed");
    println!("White noise:");
    for d in &output.distributions {
        println!("  {:<16} RMS={:.3}", d.name, d.rms);
    }
}
