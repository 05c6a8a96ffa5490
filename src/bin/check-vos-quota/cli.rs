use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::error::ErrorKind;
use clap::{crate_version, Arg, ArgAction, ArgGroup, ArgMatches, Command};
use regex::Regex;

use vosquota::threshold::Thresholds;
use vosquota::Dialect;

/// What the probe has been asked to check.
#[derive(Debug)]
pub enum Mode {
    /// One named volume.
    Volume(String),

    /// Every volume hosted on a server, optionally narrowed to one
    /// partition and a name pattern.
    Server {
        hostname: String,
        partition: Option<String>,
        filter: Option<Regex>,
    },
}

#[derive(Debug)]
pub struct Arguments {
    pub mode: Mode,
    pub thresholds: Thresholds,
    pub dialect: Option<Dialect>,
    pub timeout: Duration,
    pub debug: bool,
}

impl TryFrom<ArgMatches> for Arguments {
    type Error = anyhow::Error;

    fn try_from(args: ArgMatches) -> Result<Self, Self::Error> {
        let warning = args
            .get_one::<String>("warning")
            .with_context(|| "no warning argument")?
            .parse()
            .with_context(|| "parsing warning threshold")?;

        let critical = args
            .get_one::<String>("critical")
            .with_context(|| "no critical argument")?
            .parse()
            .with_context(|| "parsing critical threshold")?;

        let thresholds = Thresholds::new(warning, critical)?;

        let timeout = args
            .get_one::<String>("timeout")
            .with_context(|| "no timeout argument")?
            .parse()
            .with_context(|| "parsing timeout seconds")?;

        let dialect = args
            .get_one::<String>("dialect")
            .map(|token| token.parse())
            .transpose()?;

        let mode = if let Some(volume) = args.get_one::<String>("volume") {
            Mode::Volume(volume.clone())
        } else if let Some(hostname) = args.get_one::<String>("hostname") {
            let filter = args
                .get_one::<String>("pattern")
                .map(|pattern| {
                    Regex::new(pattern)
                        .with_context(|| format!("invalid pattern: {pattern}"))
                })
                .transpose()?;

            Mode::Server {
                hostname: hostname.clone(),
                partition: args.get_one::<String>("partition").cloned(),
                filter,
            }
        } else {
            return Err(anyhow!("either a volume or a hostname is required"));
        };

        Ok(Self {
            mode,
            thresholds,
            dialect,
            timeout: Duration::from_secs(timeout),
            debug: args.get_flag("debug"),
        })
    }
}

pub fn args() -> Result<Arguments> {
    let matches = match build().try_get_matches() {
        Ok(matches) => matches,
        Err(err)
            if matches!(
                err.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) =>
        {
            err.exit()
        }
        Err(err) => {
            // usage details go to stderr; stdout stays reserved for the
            // one-line report
            let _ = err.print();
            return Err(anyhow!("invalid arguments"));
        }
    };

    Arguments::try_from(matches)
}

pub fn build() -> Command {
    let warning = Arg::new("warning")
        .short('w')
        .long("warning")
        .value_name("PERCENT")
        .default_value("85")
        .help("warning threshold for percent used");

    let critical = Arg::new("critical")
        .short('c')
        .long("critical")
        .value_name("PERCENT")
        .default_value("90")
        .help("critical threshold for percent used");

    let volume = Arg::new("volume")
        .short('v')
        .long("volume")
        .value_name("VOLUME")
        .help("check this volume only");

    let hostname = Arg::new("hostname")
        .short('H')
        .long("hostname")
        .value_name("HOST")
        .help("check all volumes hosted on this server");

    let partition = Arg::new("partition")
        .short('p')
        .long("partition")
        .value_name("PARTITION")
        .requires("hostname")
        .help("restrict the server listing to one partition");

    let pattern = Arg::new("pattern")
        .long("pattern")
        .value_name("REGEX")
        .requires("hostname")
        .help("only report volumes whose name matches this pattern");

    let dialect = Arg::new("dialect")
        .long("dialect")
        .value_name("DIALECT")
        .help("vos output dialect, primary or alternate (default: probe)");

    let timeout = Arg::new("timeout")
        .short('t')
        .long("timeout")
        .value_name("SECONDS")
        .default_value("300")
        .help("abort the vos query after this many seconds");

    let debug = Arg::new("debug")
        .short('d')
        .long("debug")
        .action(ArgAction::SetTrue)
        .help("trace queries and parsing on stderr");

    Command::new("check-vos-quota")
        .about("check AFS volume quota usage")
        .version(crate_version!())
        .arg(warning)
        .arg(critical)
        .arg(volume)
        .arg(hostname)
        .arg(partition)
        .arg(pattern)
        .arg(dialect)
        .arg(timeout)
        .arg(debug)
        .group(
            ArgGroup::new("mode")
                .args(["volume", "hostname"])
                .required(true),
        )
}
