//! Quota usage math and verdict selection.

use std::fmt;

use anyhow::{ensure, Result};

/// Observed usage of a single volume, in kilobytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Usage {
    /// Space in use.
    pub used_kb: u64,

    /// Configured quota.
    pub quota_kb: u64,
}

impl Usage {
    /// Returns the remaining space under quota.
    ///
    /// Usage may transiently exceed quota (overdraft), so this floors at
    /// zero instead of going negative.
    #[must_use]
    pub const fn free_kb(&self) -> u64 {
        self.quota_kb.saturating_sub(self.used_kb)
    }

    /// Returns used space as a truncated percentage of quota.
    ///
    /// The percentage truncates (89.9% reports as 89), never rounds up,
    /// so a volume only crosses a threshold once it has genuinely passed
    /// it. A volume with no quota reports zero regardless of usage.
    #[must_use]
    pub const fn percent_used(&self) -> u64 {
        if self.quota_kb == 0 {
            return 0;
        }

        let used = if self.used_kb > self.quota_kb {
            self.quota_kb
        } else {
            self.used_kb
        };

        used * 100 / self.quota_kb
    }
}

/// Warning and critical thresholds, in percent used.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Thresholds {
    warning: u64,
    critical: u64,
}

impl Thresholds {
    /// Creates validated thresholds.
    ///
    /// # Errors
    ///
    /// Returns an error if `warning` exceeds `critical`.
    pub fn new(warning: u64, critical: u64) -> Result<Self> {
        ensure!(
            warning <= critical,
            "warning threshold {warning}% exceeds critical threshold {critical}%"
        );

        Ok(Self { warning, critical })
    }

    /// Classifies a percent-used figure.
    ///
    /// Strict greater-than: a value exactly on a threshold stays at the
    /// lower verdict.
    #[must_use]
    pub const fn verdict(&self, percent: u64) -> Verdict {
        if percent > self.critical {
            Verdict::Critical
        } else if percent > self.warning {
            Verdict::Warning
        } else {
            Verdict::Ok
        }
    }
}

/// Outcome classification consumed by the monitoring supervisor.
///
/// Ordered `Ok < Warning < Critical` for aggregation. `Unknown` is
/// reserved for usage and configuration errors and takes no part in
/// threshold aggregation.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum Verdict {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Verdict {
    /// Returns the process exit code for the invoking supervisor.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::Warning => 1,
            Self::Critical => 2,
            Self::Unknown => 3,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Ok => "OK",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
            Self::Unknown => "UNKNOWN",
        };

        f.write_str(tag)
    }
}
