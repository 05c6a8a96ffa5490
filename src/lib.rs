#![deny(clippy::all)]
#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]

use std::path::Path;
use std::str::FromStr;

use anyhow::anyhow;

pub mod parse;
pub mod report;
pub mod threshold;
pub mod vos;

/// Client configuration shipped by alternate-flavor servers.
const ALTERNATE_MARKER: &str = "/etc/yfs/yfs-client.conf";

/// Output-format convention spoken by the `vos` tool, which differs
/// between the two server implementations. Resolved once at startup and
/// immutable for the run.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Dialect {
    /// Fixed-column human-readable tables.
    Primary,
    /// Tab-delimited key/value lines.
    Alternate,
}

impl Dialect {
    /// Detects the local server flavor by probing for the alternate
    /// implementation's client configuration.
    #[must_use]
    pub fn detect() -> Self {
        if Path::new(ALTERNATE_MARKER).exists() {
            Self::Alternate
        } else {
            Self::Primary
        }
    }
}

impl FromStr for Dialect {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(Self::Primary),
            "alternate" => Ok(Self::Alternate),
            _ => Err(anyhow!("unknown dialect: {s}")),
        }
    }
}
