// SPDX-FileCopyrightText: 2025 xfnw
//
// SPDX-License-Identifier: MPL-2.0

use argh::{FromArgs, from_env};
use ipcount::{
    Policy, SaturatingPresenceCounter, Slot,
    progress::{Estimate, Tracker},
    scan,
};
use log::info;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    process::ExitCode,
    time::Instant,
};

const DEFAULT_INPUT: &str = "ip_addresses";
const READ_BUFFER: usize = 1 << 20;

/// count the ipv4 addresses that appear exactly once in a file
#[derive(Debug, FromArgs)]
#[argh(help_triggers("-h", "--help"))]
struct Opt {
    /// skip lines that are not addresses instead of giving up
    #[argh(switch, short = 's')]
    skip_invalid: bool,
    /// do not show progress
    #[argh(switch, short = 'q')]
    quiet: bool,
    /// which state to count: unseen, once, or many (default once)
    #[argh(option, short = 'c', default = "Slot::SeenOnce")]
    count: Slot,
    /// file with one address per line, - for stdin (default ip_addresses)
    #[argh(positional, default = "PathBuf::from(DEFAULT_INPUT)")]
    file: PathBuf,
}

#[derive(Debug, foxerror::FoxError)]
enum Error {
    /// could not open input
    Open(String, std::io::Error),
    /// could not count input
    #[err(from)]
    Scan(scan::Error),
}

fn open(path: &Path) -> Result<(Box<dyn BufRead>, Option<Estimate>), Error> {
    if path == Path::new("-") {
        let stdin: Box<dyn BufRead> = Box::new(std::io::stdin().lock());
        return Ok((stdin, None));
    }

    let open_err = |e: std::io::Error| Error::Open(path.display().to_string(), e);
    let file = File::open(path).map_err(open_err)?;
    let len = file.metadata().map_err(open_err)?.len();
    info!("{} is {len} bytes", path.display());
    let reader: Box<dyn BufRead> = Box::new(BufReader::with_capacity(READ_BUFFER, file));
    Ok((reader, Some(Estimate::from_len(len))))
}

fn run(opt: &Opt) -> Result<u64, Error> {
    let (reader, estimate) = open(&opt.file)?;
    let policy = if opt.skip_invalid {
        Policy::Skip
    } else {
        Policy::FailFast
    };
    let show = !opt.quiet;

    let mut counter = SaturatingPresenceCounter::new();
    info!("allocated {} bytes of counters", counter.footprint());

    let started = Instant::now();
    let summary = if let Some(estimate) = estimate {
        if show {
            eprintln!("reading approx. {} addresses", estimate.total());
        }
        let mut tracker = Tracker::new(estimate, |percent| {
            if show {
                eprintln!("{percent}% done");
            }
        });
        scan::ingest(reader, &mut counter, policy, |done| tracker.advance(done))?
    } else {
        if show {
            eprintln!("reading addresses");
        }
        scan::ingest(reader, &mut counter, policy, |_| ())?
    };
    info!(
        "read {} lines in {:.2?}, skipped {}",
        summary.lines,
        started.elapsed(),
        summary.skipped
    );

    if show {
        eprintln!("counting...");
    }
    let started = Instant::now();
    let census = counter.census();
    info!(
        "counted in {:.2?}: {} once, {} many, {} distinct",
        started.elapsed(),
        census.get(Slot::SeenOnce),
        census.get(Slot::SeenMany),
        census.distinct()
    );

    Ok(census.get(opt.count))
}

fn main() -> ExitCode {
    let opt: Opt = from_env();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(&opt) {
        Ok(count) => {
            println!("{count}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
