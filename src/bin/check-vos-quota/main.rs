#![deny(clippy::all)]
#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]

mod cli;

use std::process;

use regex::Regex;
use tracing::debug;

use vosquota::report;
use vosquota::threshold::Verdict;
use vosquota::vos;
use vosquota::Dialect;

use cli::{Arguments, Mode};

fn main() {
    let args = match cli::args() {
        Ok(args) => args,
        Err(err) => {
            println!("UNKNOWN: {err:#}");
            process::exit(Verdict::Unknown.exit_code());
        }
    };

    if args.debug {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .compact()
            .init();
    }

    let dialect = args.dialect.unwrap_or_else(Dialect::detect);
    debug!("dialect: {dialect:?}");

    let (verdict, message) = check(&args, dialect);

    println!("{verdict}: {message}");
    process::exit(verdict.exit_code());
}

fn check(args: &Arguments, dialect: Dialect) -> (Verdict, String) {
    match &args.mode {
        Mode::Volume(volume) => check_volume(args, dialect, volume),
        Mode::Server {
            hostname,
            partition,
            filter,
        } => check_server(
            args,
            dialect,
            hostname,
            partition.as_deref(),
            filter.as_ref(),
        ),
    }
}

fn check_volume(args: &Arguments, dialect: Dialect, volume: &str) -> (Verdict, String) {
    let output = match vos::examine(dialect, volume, args.timeout) {
        Ok(output) => output,
        Err(err) => return (Verdict::Critical, err.to_string()),
    };

    match dialect.volume_info(&output) {
        Some(record) => {
            let usage = record.usage();
            let verdict = args.thresholds.verdict(usage.percent_used());

            (verdict, report::volume_summary(&record.name, usage))
        }
        None => (
            Verdict::Critical,
            format!("volume {volume} not found on any server"),
        ),
    }
}

fn check_server(
    args: &Arguments,
    dialect: Dialect,
    hostname: &str,
    partition: Option<&str>,
    filter: Option<&Regex>,
) -> (Verdict, String) {
    let output = match vos::listvol(dialect, hostname, partition, args.timeout) {
        Ok(output) => output,
        Err(err) => return (Verdict::Critical, err.to_string()),
    };

    let mut volumes = dialect.server_info(&output);

    if let Some(filter) = filter {
        volumes.retain(|name, _| filter.is_match(name));
    }

    debug!("{} read-write volumes to evaluate", volumes.len());

    report::aggregate(&volumes, &args.thresholds)
}
