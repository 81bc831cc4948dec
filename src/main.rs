// main.rs

use adc_pca::pipeline::{PipelineOutput, RAW_EVENT_MEANS, RAW_SAMPLES, TEST_EVENT_MEANS, TRAIN_EVENT_MEANS};
use adc_pca::{Pipeline, PipelineConfig};
use anyhow::{Context, Error, Result};
use clap::Parser;
use log::{info, warn};
use std::time::Instant;

fn main() -> Result<(), Error> {
    let total_time_start = Instant::now();
    let cli_args = cli::CliArgs::parse();

    let log_level = cli_args
        .log_level
        .parse::<log::LevelFilter>()
        .unwrap_or_else(|_| {
            eprintln!(
                "Warning: Invalid log level '{}' provided. Defaulting to Info.",
                cli_args.log_level
            );
            log::LevelFilter::Info
        });
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_micros()
        .init();

    info!("Starting adc-pca with args: {:?}", cli_args);

    if let Some(num_threads) = cli_args.threads {
        info!("Using {} threads for parallel operations.", num_threads);
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()?;
    }

    let config = PipelineConfig {
        compute_correlations: cli_args.correlations,
        ..PipelineConfig::with_geometry(cli_args.event_width, cli_args.train_fraction)
    };
    let pipeline = Pipeline::new(config).context("invalid pipeline configuration")?;
    let output = pipeline
        .run_path(&cli_args.input)
        .with_context(|| format!("decorrelating {}", cli_args.input.display()))?;

    log_summary(&output);

    if cli_args.json {
        let report = output.report();
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    info!("Total execution time: {:?}", total_time_start.elapsed());
    Ok(())
}

fn log_summary(output: &PipelineOutput) {
    info!(
        "{} events of {} dimension multiplet, global mean {:.3}",
        output.raw.rows(),
        output.raw.event_width(),
        output.centered.global_mean()
    );
    if output.split.gap() > 0 {
        warn!(
            "{} event(s) between the training and testing blocks are unused",
            output.split.gap()
        );
    }
    for (i, ratio) in output.explained_variance_ratio.iter().take(5).enumerate() {
        info!(
            "PC{}: variance {:.4}, explained variance ratio {:.4}",
            i + 1,
            output.components.variances()[i],
            ratio
        );
    }
    for name in [RAW_SAMPLES, RAW_EVENT_MEANS, TRAIN_EVENT_MEANS, TEST_EVENT_MEANS] {
        if let Some(d) = output.distribution(name) {
            info!("{:<16} RMS={:.3} (mean {:.3}, {} entries)", d.name, d.rms, d.mean, d.entries);
        }
    }
    if let Some(correlations) = &output.correlations {
        info!(
            "Mean |correlation| off the diagonal: before {:.4}, after {:.4}",
            correlations.mean_abs_off_diagonal_before(),
            correlations.mean_abs_off_diagonal_after()
        );
    }
}

mod cli {
    use adc_pca::config::{DEFAULT_EVENT_WIDTH, DEFAULT_TRAIN_FRACTION};
    use clap::Parser;
    use std::path::PathBuf;

    #[derive(Parser, Debug)]
    #[command(author, version, about = "Decorrelates ADC event samples with PCA.", long_about = None, propagate_version = true)]
    pub(crate) struct CliArgs {
        /// Text file with one integer ADC count per line.
        #[arg(short, long, default_value = "data.txt")]
        pub(crate) input: PathBuf,

        /// Samples per event (the PCA dimension).
        #[arg(short = 'n', long, default_value_t = DEFAULT_EVENT_WIDTH)]
        pub(crate) event_width: usize,

        #[arg(short = 'f', long, default_value_t = DEFAULT_TRAIN_FRACTION)]
        pub(crate) train_fraction: f64,

        /// Also compute correlation matrices before and after decorrelation.
        #[arg(long)]
        pub(crate) correlations: bool,

        /// Print the run report as JSON on stdout.
        #[arg(long)]
        pub(crate) json: bool,

        #[arg(short = 't', long)]
        pub(crate) threads: Option<usize>,

        #[arg(long, default_value = "Info")]
        pub(crate) log_level: String,
    }
}
