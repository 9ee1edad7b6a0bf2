//! Configuration for the bitpack-bench application.
//!
//! Resolution order (highest priority first):
//! 1. Command-line flags
//! 2. TOML file given with `--config`
//! 3. Compiled defaults
//!
//! The tool works with zero arguments: it measures `test_text_1.txt` in the
//! current directory and prints the report.

use std::path::{Path, PathBuf};

use bitpack_bench_core::{CpuDeltaMode, ReportFormat, RunConfig, RunLabels, RunMode};
use serde::Deserialize;

pub const DEFAULT_INPUT: &str = "test_text_1.txt";
pub const DEFAULT_DATABASE: &str = "bitpack_bench.db";

/// Generate the input instead of reading a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSpec {
    /// Approximate size of the generated text in UTF-8 bytes
    pub bytes: usize,
    /// Random seed for determinism
    pub seed: u64,
}

/// Complete configuration for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    // === Input ===
    /// Input file path
    pub input: String,

    /// Generated input (takes precedence over `input`)
    pub sample: Option<SampleSpec>,

    // === Run ===
    pub mode: RunMode,

    /// SQLite database used in persist mode
    pub database: PathBuf,

    pub cpu_delta: CpuDeltaMode,

    pub labels: RunLabels,

    // === Output ===
    pub format: ReportFormat,

    /// Whether to print the resolved config
    pub print_config: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: DEFAULT_INPUT.to_string(),
            sample: None,
            mode: RunMode::Test,
            database: PathBuf::from(DEFAULT_DATABASE),
            cpu_delta: CpuDeltaMode::Literal,
            labels: RunLabels::default(),
            format: ReportFormat::Text,
            print_config: false,
        }
    }
}

/// Shape of the `--config` TOML file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    input: Option<String>,
    mode: Option<RunMode>,
    database: Option<PathBuf>,
    cpu_delta: Option<CpuDeltaMode>,
    format: Option<ReportFormat>,
    labels: FileLabels,
    sample: Option<FileSample>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileLabels {
    algorithm: Option<String>,
    script_version: Option<String>,
    origin: Option<String>,
    comment: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileSample {
    bytes: usize,
    seed: Option<u64>,
}

impl Config {
    /// Parse configuration from command-line arguments (program name excluded).
    pub fn from_args(args: &[String]) -> Result<Self, String> {
        let mut config = Config::default();
        let mut file_seed: Option<u64> = None;

        // The config file is the lower layer, so load it before any flag.
        if let Some(path) = find_config_path(args)? {
            file_seed = config.merge_file(Path::new(path))?;
        }

        let mut sample_bytes: Option<usize> = config.sample.map(|s| s.bytes);
        let mut seed: Option<u64> = file_seed;

        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--config" => {
                    // already applied
                    i += 1;
                }
                "--in" => {
                    config.input = take_value(args, &mut i, "--in requires a path")?.to_string();
                }
                "--mode" => {
                    config.mode = take_value(args, &mut i, "--mode requires 'test' or 'db'")?.parse()?;
                }
                "--db" => {
                    config.database = PathBuf::from(take_value(args, &mut i, "--db requires a path")?);
                }
                "--cpu-delta" => {
                    config.cpu_delta = take_value(args, &mut i, "--cpu-delta requires a mode")?.parse()?;
                }
                "--algorithm" => {
                    config.labels.algorithm = take_value(args, &mut i, "--algorithm requires a name")?.to_string();
                }
                "--script-version" => {
                    config.labels.script_version =
                        take_value(args, &mut i, "--script-version requires a value")?.to_string();
                }
                "--origin" => {
                    config.labels.origin = take_value(args, &mut i, "--origin requires a value")?.to_string();
                }
                "--comment" => {
                    config.labels.comment = take_value(args, &mut i, "--comment requires text")?.to_string();
                }
                "--sample" => {
                    let value = take_value(args, &mut i, "--sample requires a byte count")?;
                    sample_bytes = Some(value.parse().map_err(|_| "invalid sample size")?);
                }
                "--seed" => {
                    let value = take_value(args, &mut i, "--seed requires a number")?;
                    seed = Some(value.parse().map_err(|_| "invalid seed")?);
                }
                "--json" => {
                    config.format = ReportFormat::Json;
                }
                "--print-config" => {
                    config.print_config = true;
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                _ => {
                    return Err(format!("unknown argument: {}", args[i]));
                }
            }
            i += 1;
        }

        config.sample = match sample_bytes {
            Some(0) => return Err("sample size must be greater than 0".to_string()),
            Some(bytes) => Some(SampleSpec {
                bytes,
                seed: seed.unwrap_or_else(time_seed),
            }),
            None => None,
        };

        if config.input.is_empty() {
            return Err("input path must not be empty".to_string());
        }

        Ok(config)
    }

    /// Load a TOML file over the current values. Returns the sample seed if
    /// the file sets one.
    fn merge_file(&mut self, path: &Path) -> Result<Option<u64>, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read config {}: {e}", path.display()))?;
        self.merge_toml(&content)
            .map_err(|e| format!("invalid config {}: {e}", path.display()))
    }

    fn merge_toml(&mut self, content: &str) -> Result<Option<u64>, String> {
        let file: FileConfig = toml::from_str(content).map_err(|e| e.to_string())?;

        if let Some(input) = file.input {
            self.input = input;
        }
        if let Some(mode) = file.mode {
            self.mode = mode;
        }
        if let Some(database) = file.database {
            self.database = database;
        }
        if let Some(cpu_delta) = file.cpu_delta {
            self.cpu_delta = cpu_delta;
        }
        if let Some(format) = file.format {
            self.format = format;
        }
        if let Some(algorithm) = file.labels.algorithm {
            self.labels.algorithm = algorithm;
        }
        if let Some(script_version) = file.labels.script_version {
            self.labels.script_version = script_version;
        }
        if let Some(origin) = file.labels.origin {
            self.labels.origin = origin;
        }
        if let Some(comment) = file.labels.comment {
            self.labels.comment = comment;
        }

        Ok(file.sample.and_then(|sample| {
            self.sample = Some(SampleSpec {
                bytes: sample.bytes,
                seed: 0,
            });
            sample.seed
        }))
    }

    /// The run configuration handed to the pipeline.
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            mode: self.mode,
            cpu_delta: self.cpu_delta,
            labels: self.labels.clone(),
        }
    }

    /// Print the configuration in human-readable form.
    pub fn print(&self) {
        println!("=== Configuration ===");
        match &self.sample {
            Some(sample) => println!("Input: generated sample ({} bytes, seed {})", sample.bytes, sample.seed),
            None => println!("Input: {}", self.input),
        }
        println!("Mode: {}", self.mode.as_str());
        println!("Database: {}", self.database.display());
        println!("CPU delta: {:?}", self.cpu_delta);
        println!("Format: {:?}", self.format);
        println!();
        println!("=== Labels ===");
        println!("Algorithm: {}", self.labels.algorithm);
        println!("Script version: {}", self.labels.script_version);
        println!("Origin: {}", self.labels.origin);
        println!("Comment: {}", self.labels.comment);
        println!();
    }
}

/// Advance past a flag and return its value.
fn take_value<'a>(args: &'a [String], i: &mut usize, missing: &str) -> Result<&'a str, String> {
    *i += 1;
    args.get(*i).map(String::as_str).ok_or_else(|| missing.to_string())
}

/// Flags followed by a value, besides `--config`.
const VALUE_FLAGS: &[&str] = &[
    "--in",
    "--mode",
    "--db",
    "--cpu-delta",
    "--algorithm",
    "--script-version",
    "--origin",
    "--comment",
    "--sample",
    "--seed",
];

/// Path given to `--config`, skipping the values of other flags. The last
/// occurrence wins.
fn find_config_path(args: &[String]) -> Result<Option<&str>, String> {
    let mut path = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => path = Some(take_value(args, &mut i, "--config requires a path")?),
            flag if VALUE_FLAGS.contains(&flag) => i += 1,
            _ => {}
        }
        i += 1;
    }
    Ok(path)
}

fn time_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

fn print_help() {
    println!("bitpack-bench: measure fixed-width bit packing of a text file");
    println!();
    println!("USAGE:");
    println!("    bitpack-bench [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --in <PATH>               Input text file (default: {DEFAULT_INPUT})");
    println!("    --sample <BYTES>          Measure a generated sample text instead of a file");
    println!("    --seed <N>                Seed for --sample (default: time-based)");
    println!();
    println!("    --mode <test|db>          Display only, or store in the database (default: test)");
    println!("    --db <PATH>               SQLite database for db mode (default: {DEFAULT_DATABASE})");
    println!("    --cpu-delta <MODE>        literal | normalized (default: literal)");
    println!();
    println!("    --algorithm <NAME>        Label stored with the run (default: bit_packing)");
    println!("    --script-version <V>      Label stored with the run (default: v1)");
    println!("    --origin <NAME>           Label stored with the run (default: local)");
    println!("    --comment <TEXT>          Free-text note stored with the run");
    println!();
    println!("    --config <PATH>           TOML file with any of the settings above");
    println!("    --json                    Print the report as JSON");
    println!("    --print-config            Print resolved configuration");
    println!("    --help, -h                Print this help");
    println!();
    println!("ENVIRONMENT:");
    println!("    BITPACK_LOG               Log filter, e.g. BITPACK_LOG=bitpack_bench_core=debug");
    println!();
    println!("EXAMPLES:");
    println!("    bitpack-bench --in corpus.txt");
    println!("    bitpack-bench --in corpus.txt --mode db --db results.db");
    println!("    bitpack-bench --sample 65536 --seed 42 --json");
    println!();
}
