//! Scraping of `vos` output.
//!
//! The admin tool emits semi-structured text, so this is a best-effort
//! scrape: malformed or unexpected lines are skipped, never fatal. A
//! volume for which no usage or no quota was observed is dropped rather
//! than reported with zeroes.

use std::collections::BTreeMap;

use tracing::debug;

use crate::threshold::Usage;
use crate::Dialect;

/// A single volume as reported by `vos`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VolumeRecord {
    /// Volume name.
    pub name: String,

    /// Space in use, in kilobytes.
    pub used_kb: u64,

    /// Configured quota, in kilobytes.
    pub quota_kb: u64,

    /// Server hosting the read-write instance.
    pub rw_server: Option<String>,

    /// Partition holding the read-write instance.
    pub rw_partition: Option<String>,
}

impl VolumeRecord {
    /// Returns the record's usage figures.
    #[must_use]
    pub const fn usage(&self) -> Usage {
        Usage {
            used_kb: self.used_kb,
            quota_kb: self.quota_kb,
        }
    }
}

impl Dialect {
    /// Extracts the examined volume from `vos examine` output.
    ///
    /// Returns `None` if the output contains no on-line read-write
    /// volume with both usage and quota figures, which callers report as
    /// volume-not-found.
    #[must_use]
    pub fn volume_info(self, input: &str) -> Option<VolumeRecord> {
        match self {
            Self::Primary => primary::volume_info(input),
            Self::Alternate => alternate::volume_info(input),
        }
    }

    /// Extracts all read-write volumes from `vos listvol` output.
    ///
    /// Read-only and backup instances never contribute an entry.
    #[must_use]
    pub fn server_info(self, input: &str) -> BTreeMap<String, Usage> {
        match self {
            Self::Primary => primary::server_info(input),
            Self::Alternate => alternate::server_info(input),
        }
    }
}

/// Fixed-column human-readable tables.
mod primary {
    use super::{debug, BTreeMap, Usage, VolumeRecord};

    /// A column-0 volume line: `name id type size K On-line`.
    enum Header {
        /// An on-line read-write instance.
        ReadWrite { name: String, used_kb: u64 },
        /// Any other instance (read-only, backup, off-line).
        Other,
    }

    fn header(line: &str) -> Option<Header> {
        let tokens = line.split_whitespace().collect::<Vec<_>>();

        if tokens.len() < 6
            || tokens[1].parse::<u64>().is_err()
            || !matches!(tokens[2], "RW" | "RO" | "BK")
            || tokens[4] != "K"
        {
            return None;
        }

        if tokens[2] != "RW" || tokens[5] != "On-line" {
            return Some(Header::Other);
        }

        match tokens[3].parse() {
            Ok(used_kb) => Some(Header::ReadWrite {
                name: tokens[0].into(),
                used_kb,
            }),
            Err(_) => Some(Header::Other),
        }
    }

    /// An indented `MaxQuota <n> K` line.
    fn max_quota(line: &str) -> Option<u64> {
        let tokens = line.split_whitespace().collect::<Vec<_>>();

        if tokens.len() >= 3 && tokens[0] == "MaxQuota" && tokens[2] == "K" {
            tokens[1].parse().ok()
        } else {
            None
        }
    }

    /// An indented `server /vicepX` placement line.
    fn site(line: &str) -> Option<(String, String)> {
        let tokens = line.split_whitespace().collect::<Vec<_>>();

        if tokens.len() == 2 && tokens[1].starts_with("/vicep") {
            Some((tokens[0].into(), tokens[1].into()))
        } else {
            None
        }
    }

    pub fn volume_info(input: &str) -> Option<VolumeRecord> {
        let mut head: Option<(String, u64)> = None;
        let mut quota = None;
        let mut rw_site: Option<(String, String)> = None;

        for line in input.lines() {
            if !line.starts_with(char::is_whitespace) {
                if head.is_none() {
                    if let Some(Header::ReadWrite { name, used_kb }) = header(line) {
                        head = Some((name, used_kb));
                    }
                }
            } else if let Some(kb) = max_quota(line) {
                if quota.is_none() {
                    quota = Some(kb);
                }
            } else if let Some(found) = site(line) {
                if rw_site.is_none() {
                    rw_site = Some(found);
                }
            }
        }

        let (name, used_kb) = head?;
        let quota_kb = quota?;
        let (rw_server, rw_partition) = match rw_site {
            Some((server, partition)) => (Some(server), Some(partition)),
            None => (None, None),
        };

        Some(VolumeRecord {
            name,
            used_kb,
            quota_kb,
            rw_server,
            rw_partition,
        })
    }

    pub fn server_info(input: &str) -> BTreeMap<String, Usage> {
        let mut volumes = BTreeMap::new();
        let mut pending: Option<(String, u64)> = None;
        let mut quota: Option<u64> = None;

        for line in input.lines() {
            if line.trim().is_empty() {
                // blank line terminates the current volume block
                commit(&mut volumes, pending.take(), quota.take());
            } else if line.starts_with(char::is_whitespace) {
                if let Some(kb) = max_quota(line) {
                    quota = Some(kb);
                }
            } else {
                match header(line) {
                    Some(Header::ReadWrite { name, used_kb }) => {
                        commit(&mut volumes, pending.take(), quota.take());
                        pending = Some((name, used_kb));
                    }
                    Some(Header::Other) => {
                        commit(&mut volumes, pending.take(), quota.take());
                    }
                    None => debug!("skipping line: {line}"),
                }
            }
        }

        commit(&mut volumes, pending, quota);

        volumes
    }

    fn commit(
        volumes: &mut BTreeMap<String, Usage>,
        pending: Option<(String, u64)>,
        quota: Option<u64>,
    ) {
        match (pending, quota) {
            (Some((name, used_kb)), Some(quota_kb)) => {
                volumes.insert(name, Usage { used_kb, quota_kb });
            }
            (Some((name, _)), None) => {
                debug!("dropping volume {name}: no quota observed");
            }
            (None, _) => {}
        }
    }
}

/// Tab-delimited key/value lines.
mod alternate {
    use super::{debug, BTreeMap, Usage, VolumeRecord};

    const BEGIN: &str = "BEGIN_ENTRY";
    const END: &str = "END_OF_ENTRY";

    #[derive(Default)]
    struct Entry {
        name: Option<String>,
        used_kb: Option<u64>,
        quota_kb: Option<u64>,
        kind: Option<String>,
        server: Option<String>,
        partition: Option<String>,
    }

    impl Entry {
        fn accept(&mut self, line: &str) {
            let (key, value) = match line.split_once('\t') {
                Some(pair) => pair,
                None => {
                    debug!("skipping line: {line}");
                    return;
                }
            };

            match key {
                "name" => self.name = Some(value.trim().into()),
                "diskused" => self.used_kb = value.trim().parse().ok(),
                "maxquota" => self.quota_kb = value.trim().parse().ok(),
                "type" => self.kind = Some(value.trim().into()),
                // value may carry an address and a resolved hostname;
                // the last field is the name
                "serv" => {
                    self.server = value
                        .split('\t')
                        .map(str::trim)
                        .filter(|field| !field.is_empty())
                        .next_back()
                        .map(Into::into);
                }
                "part" => self.partition = Some(value.trim().into()),
                _ => {}
            }
        }

        fn is_read_write(&self) -> bool {
            match &self.kind {
                Some(kind) => kind == "RW",
                None => true,
            }
        }

        fn into_record(self) -> Option<VolumeRecord> {
            let name = self.name?;
            let used_kb = self.used_kb?;
            let quota_kb = self.quota_kb?;

            Some(VolumeRecord {
                name,
                used_kb,
                quota_kb,
                rw_server: self.server,
                rw_partition: self.partition,
            })
        }
    }

    pub fn volume_info(input: &str) -> Option<VolumeRecord> {
        let mut entry = Entry::default();

        for line in input.lines() {
            entry.accept(line);
        }

        entry.into_record()
    }

    pub fn server_info(input: &str) -> BTreeMap<String, Usage> {
        let mut volumes = BTreeMap::new();
        let mut entry = Entry::default();

        for line in input.lines() {
            match line.trim_end() {
                BEGIN => entry = Entry::default(),
                END => {
                    let done = std::mem::take(&mut entry);

                    if done.is_read_write() {
                        if let Some(record) = done.into_record() {
                            let usage = record.usage();
                            volumes.insert(record.name, usage);
                        }
                    }
                }
                _ => entry.accept(line),
            }
        }

        // an entry still pending at end of input never saw its
        // END_OF_ENTRY marker and is dropped
        volumes
    }
}
