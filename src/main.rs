use clap::Parser;
use itertools::Itertools;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use squirrel::factory::FactoryCache;
use squirrel::memo::MemoFn;
use squirrel::shared::SharedFactoryCache;

mod logging;

/*
scurry replays a query log of regex patterns against a corpus.

Query logs repeat the same handful of patterns over and over, so the
binary leans on the library twice: a process-wide cache compiles each
distinct pattern once, and a per-run cache hands out one counting unit
per pattern, which memoizes its last scan. A repeated query therefore
costs neither a compile nor a scan.
*/

type PatternCache = SharedFactoryCache<String, Regex, fn(&String) -> Result<Regex, regex::Error>>;

//compiled patterns are shared by every part of the process
static PATTERNS: Lazy<PatternCache> = Lazy::new(|| SharedFactoryCache::new(compile));

fn compile(pattern: &String) -> Result<Regex, regex::Error> {
    Regex::new(pattern)
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(
        value_name = "QUERY_LOG",
        help = "Path to the query log, one regex pattern per line, repeats expected"
    )]
    query_log: String,

    #[arg(
        short = 'c',
        long = "corpus",
        value_name = "CORPUS_FILE",
        help = "Path to the corpus to scan, one line per entry"
    )]
    corpus: String,

    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase verbosity level"
    )]
    verbosity: u8,

    #[arg(
        long,
        short = 'l',
        value_name = "LOG_FILE",
        help = "Optional path to the log file. Defaults to stderr if not specified."
    )]
    log_output: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();
    logging::setup_logger(args.verbosity, args.log_output);

    let queries = read_lines(&args.query_log);
    let corpus = read_lines(&args.corpus);
    info!(
        "replaying {} queries against {} corpus lines",
        queries.len(),
        corpus.len()
    );

    //the corpus never changes during a run, so every unit sees the same state value
    let fingerprint = corpus_fingerprint(&corpus);
    let corpus_ref = &corpus;

    //one counting unit per distinct pattern, each memoizing its last scan
    let counters = FactoryCache::new(|pattern: &String| {
        PATTERNS.get_or_try_create(pattern).map(|re| {
            MemoFn::new(move |_state: &u64| {
                debug!("scanning corpus for '{}'", re.as_str());
                corpus_ref
                    .par_iter()
                    .filter(|line| re.is_match(line))
                    .count()
            })
        })
    });

    let mut rejected = 0usize;
    let mut hits: HashMap<String, usize> = HashMap::new();
    for pattern in &queries {
        match counters.get_or_try_create(pattern) {
            Ok(unit) => {
                hits.insert(pattern.clone(), unit.call(&fingerprint));
            }
            Err(e) => {
                warn!("rejected pattern '{}': {}", pattern, e);
                rejected += 1;
            }
        }
    }

    info!(
        "compiled {} distinct patterns, rejected {} queries",
        PATTERNS.len(),
        rejected
    );

    println!(
        "{} queries, {} distinct patterns, {} rejected",
        queries.len(),
        PATTERNS.len(),
        rejected
    );
    for (pattern, count) in hits.iter().sorted() {
        println!("{}\t{} matching lines", pattern, count);
    }
}

fn read_lines(path: &str) -> Vec<String> {
    match read_file(path) {
        Ok(content) => content
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect(),
        Err(e) => {
            eprintln!("Error reading file '{}': '{}'", path, e);
            process::exit(1);
        }
    }
}

fn read_file(path: &str) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(content)
}

fn corpus_fingerprint(lines: &[String]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for line in lines {
        line.hash(&mut hasher);
    }
    hasher.finish()
}
