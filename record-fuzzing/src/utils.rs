// record-fuzzing/src/utils.rs
//! Utility functions for the fuzzing engine

use crate::constants::{self, env_vars};
use log::LevelFilter;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Get the fuzzing mode from environment or default to standard
pub fn get_fuzzing_mode() -> String {
    env::var(env_vars::MODE).unwrap_or_else(|_| constants::modes::STANDARD.to_string())
}

/// Get the log level from environment or default based on mode
pub fn get_log_level() -> u8 {
    let mode = get_fuzzing_mode();
    let default_level = match mode.as_str() {
        constants::modes::DEBUG => constants::log_levels::DEBUG,
        constants::modes::CI => constants::log_levels::ERROR,
        _ => constants::log_levels::INFO,
    };

    env::var(env_vars::LOG_LEVEL)
        .ok()
        .and_then(|s| s.parse::<u8>().ok())
        .unwrap_or(default_level)
}

/// Map a numeric log level onto the `log` crate's filter
pub fn level_filter(level: u8) -> LevelFilter {
    match level {
        constants::log_levels::NONE => LevelFilter::Off,
        constants::log_levels::ERROR => LevelFilter::Error,
        constants::log_levels::WARN => LevelFilter::Warn,
        constants::log_levels::INFO => LevelFilter::Info,
        constants::log_levels::DEBUG => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Resolve the artifact directory: explicit choice, then environment, then default.
///
/// The directory is created if it does not exist.
pub fn get_output_dir(explicit: Option<&Path>) -> io::Result<PathBuf> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(
            env::var(env_vars::OUTPUT_DIR)
                .unwrap_or_else(|_| constants::DEFAULT_ARTIFACT_DIR.to_string()),
        ),
    };

    if !path.exists() {
        fs::create_dir_all(&path)?;
    }

    Ok(path)
}

/// File name of a per-iteration artifact, e.g. `Run_3_fuzzedDocument_false.json`
pub fn run_artifact_name(iteration: u32, label: &str, verdict: Option<bool>, extension: &str) -> String {
    match verdict {
        Some(valid) => format!("Run_{}_{}_{}.{}", iteration, label, valid, extension),
        None => format!("Run_{}_{}.{}", iteration, label, extension),
    }
}

/// Write one artifact into `dir`
pub fn write_artifact(dir: &Path, name: &str, contents: &str) -> io::Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, contents)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_artifact_name() {
        assert_eq!(
            run_artifact_name(3, "fuzzedDocument", Some(false), "json"),
            "Run_3_fuzzedDocument_false.json"
        );
        assert_eq!(run_artifact_name(0, "fuzzLog", None, "txt"), "Run_0_fuzzLog.txt");
    }

    #[test]
    fn test_level_filter() {
        assert_eq!(level_filter(constants::log_levels::NONE), LevelFilter::Off);
        assert_eq!(level_filter(constants::log_levels::INFO), LevelFilter::Info);
        assert_eq!(level_filter(42), LevelFilter::Trace);
    }

    #[test]
    fn test_write_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let out = get_output_dir(Some(&dir.path().join("nested"))).unwrap();
        let path = write_artifact(&out, "a.txt", "hello").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "hello");
    }
}
