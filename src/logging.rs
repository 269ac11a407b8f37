//! Logger setup for the scurry binary.

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

/// Map the -v count to a level: warnings only by default, then info,
/// debug, trace.
fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Where log lines go: the requested file if it can be created, stderr
/// otherwise.
fn target_for(log_output: Option<PathBuf>) -> Target {
    match log_output {
        Some(path) => match File::create(&path) {
            Ok(file) => Target::Pipe(Box::new(file) as Box<dyn Write + Send>),
            Err(e) => {
                eprintln!("cannot log to '{}' ({}), using stderr", path.display(), e);
                Target::Stderr
            }
        },
        None => Target::Stderr,
    }
}

pub fn setup_logger(verbosity: u8, log_output: Option<PathBuf>) {
    let mut builder = Builder::from_default_env();
    builder.format_timestamp(None);
    builder.filter_level(level_for(verbosity));
    builder.target(target_for(log_output));
    builder.init();
}
