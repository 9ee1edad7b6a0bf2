//! bitpack-bench: measure fixed-width bit packing of a text file.
//!
//! Reads the input (or generates a sample), packs it, and either prints the
//! metrics or stores them in SQLite. A failed store still prints the report.
//!
//! The report goes to stdout. Banner and status lines go to stdout too,
//! except with `--json`, where they move to stderr so stdout stays one JSON
//! document.

mod config;
mod input_gen;
mod logging;

use std::io::{self, Write};
use std::process::ExitCode;

use bitpack_bench_core::{
    execute, select_sink, Error, FileSource, MemorySource, ProcessSampler, ReportFormat,
    RunOutcome, TextSource,
};
use chrono::Local;

use crate::config::Config;

fn main() -> ExitCode {
    logging::init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match Config::from_args(&args).map_err(Error::Config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Run with --help for usage");
            return ExitCode::from(2);
        }
    };

    if config.print_config {
        config.print();
    }

    let mut notes: Box<dyn Write> = match config.format {
        ReportFormat::Text => Box::new(io::stdout()),
        ReportFormat::Json => Box::new(io::stderr()),
    };

    match run(&config, Box::new(io::stdout()), notes.as_mut()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(category = e.category(), error = %e, "run failed");
            eprintln!("Test failed: {e}");
            ExitCode::FAILURE
        }
    }
}

/// One run with the banner and status lines around it.
///
/// The report goes to `out`. Banner, status lines and the fallback report
/// go to `notes`.
fn run(config: &Config, out: Box<dyn Write>, notes: &mut dyn Write) -> bitpack_bench_core::Result<RunOutcome> {
    writeln!(notes, "=== {} | mode: {} ===", config.labels.algorithm.to_uppercase(), config.mode.as_str())?;
    writeln!(notes, "Started: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(notes)?;

    let result = measure(config, out, notes);

    if let Ok(outcome) = &result {
        if let Some(id) = outcome.stored_id {
            writeln!(notes, "Results stored (test id: {id})")?;
        } else if outcome.fell_back {
            writeln!(notes, "Results could not be stored; report shown above")?;
        }
    }

    writeln!(notes)?;
    writeln!(notes, "Finished: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    result
}

fn measure(config: &Config, out: Box<dyn Write>, fallback: &mut dyn Write) -> bitpack_bench_core::Result<RunOutcome> {
    let (identifier, source): (String, Box<dyn TextSource>) = match config.sample {
        Some(sample) => {
            let identifier = format!("sample_{}.txt", sample.seed);
            tracing::info!(bytes = sample.bytes, seed = sample.seed, "generating sample text");
            let text = input_gen::generate_sample_text(sample.seed, sample.bytes);
            (identifier.clone(), Box::new(MemorySource::new(identifier, text)))
        }
        None => (config.input.clone(), Box::new(FileSource::new())),
    };

    let mut sink = select_sink(config.mode, &config.database, out, config.format);

    execute(
        &config.run_config(),
        &identifier,
        source.as_ref(),
        &ProcessSampler::new(),
        sink.as_mut(),
        fallback,
    )
}
