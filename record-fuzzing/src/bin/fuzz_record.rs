// record-fuzzing/src/bin/fuzz_record.rs
//! Medical record document fuzzer

use clap::Parser;
use log::{info, warn};
use record_fuzzing::{
    config::FuzzConfig,
    context::FuzzerContext,
    document::DocumentMutator,
    error::FuzzError,
    random::RandomDecisionSource,
    reporters,
    runner::{FuzzRunner, RunOptions},
};
use record_types::RecordParser;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

/// Command-line arguments for the record fuzzer
#[derive(Parser, Debug)]
#[clap(author, version, about = "Probability-driven fuzzer for medical record documents")]
struct Cli {
    /// Seed document (JSON); a baseline is composed when omitted
    #[clap(short, long)]
    seed: Option<PathBuf>,

    /// Fuzz configuration, inline JSON or a path to a JSON file
    #[clap(short, long)]
    config: Option<String>,

    /// Artifact directory
    #[clap(short, long)]
    out: Option<PathBuf>,

    /// Escalate each iteration until the document is rejected
    #[clap(short, long)]
    until_invalid: bool,

    /// Seed of the random decision source, for reproducible runs
    #[clap(short, long)]
    rng_seed: Option<u64>,
}

/// Parse the configuration argument, falling back to a random configuration
fn load_config(arg: Option<&str>, random: &mut RandomDecisionSource) -> FuzzConfig {
    let Some(arg) = arg else {
        info!("No fuzz configuration given, using a random one");
        return FuzzConfig::random(random.rng_mut());
    };

    let text = if Path::new(arg).is_file() {
        match fs::read_to_string(arg) {
            Ok(text) => text,
            Err(err) => {
                warn!("Could not read config file {}: {}, using a random configuration", arg, err);
                return FuzzConfig::random(random.rng_mut());
            }
        }
    } else {
        arg.to_string()
    };

    match FuzzConfig::from_json(&text) {
        Ok(config) => config,
        Err(err) => {
            warn!("{}, using a random configuration", err);
            FuzzConfig::random(random.rng_mut())
        }
    }
}

fn run(cli: Cli) -> Result<(), FuzzError> {
    let mut random = match cli.rng_seed {
        Some(seed) => RandomDecisionSource::seeded(seed),
        None => RandomDecisionSource::new(),
    };
    let config = load_config(cli.config.as_deref(), &mut random);
    info!("Using {}", config);

    let mutator = match &cli.seed {
        Some(path) => DocumentMutator::from_seed_file(path),
        None => DocumentMutator::new(),
    };
    let options = RunOptions {
        output_dir: cli.out,
        until_invalid: cli.until_invalid,
    };

    let context = FuzzerContext::with_random(config, random);
    let mut runner = FuzzRunner::new(context, mutator, RecordParser::new(), options);
    let summary = runner.run(None)?;

    reporters::report_run(&summary);
    Ok(())
}

fn main() {
    println!("=================================================================");
    println!("Medical Record Document Fuzzer");
    println!("=================================================================");

    record_fuzzing::init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Fuzzing run failed: {}", err);
        process::exit(1);
    }
}
