//! Rendering of the status line.

use std::collections::BTreeMap;

use crate::threshold::{Thresholds, Usage, Verdict};

#[cfg(feature = "humansize")]
fn fmt_kb(kb: u64) -> String {
    humansize::format_size(kb * 1024, humansize::BINARY)
}

#[cfg(not(feature = "humansize"))]
fn fmt_kb(kb: u64) -> String {
    format!("{kb} KB")
}

/// Renders the full per-volume summary used in single-volume reports.
#[must_use]
pub fn volume_summary(name: &str, usage: Usage) -> String {
    format!(
        "{name} {}% used ({} quota, {} used, {} free)",
        usage.percent_used(),
        fmt_kb(usage.quota_kb),
        fmt_kb(usage.used_kb),
        fmt_kb(usage.free_kb()),
    )
}

/// Renders the short per-volume form used in server-wide reports.
#[must_use]
pub fn volume_short(name: &str, usage: Usage) -> String {
    format!("{name} {}%", usage.percent_used())
}

/// Reduces a server's volumes to one verdict and message.
///
/// Critical volumes suppress warnings entirely; a server with neither
/// reports its volume count.
#[must_use]
pub fn aggregate(
    volumes: &BTreeMap<String, Usage>,
    thresholds: &Thresholds,
) -> (Verdict, String) {
    let mut criticals = Vec::new();
    let mut warnings = Vec::new();
    let mut ok = 0_usize;

    for (name, usage) in volumes {
        match thresholds.verdict(usage.percent_used()) {
            Verdict::Critical => criticals.push(volume_short(name, *usage)),
            Verdict::Warning => warnings.push(volume_short(name, *usage)),
            Verdict::Ok | Verdict::Unknown => ok += 1,
        }
    }

    if !criticals.is_empty() {
        (Verdict::Critical, criticals.join(", "))
    } else if !warnings.is_empty() {
        (Verdict::Warning, warnings.join(", "))
    } else {
        (Verdict::Ok, format!("{ok} volumes ok"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const fn usage(used_kb: u64, quota_kb: u64) -> Usage {
        Usage { used_kb, quota_kb }
    }

    fn thresholds() -> Thresholds {
        Thresholds::new(85, 90).unwrap()
    }

    #[cfg(not(feature = "humansize"))]
    #[test]
    fn summary_renders_raw_kilobytes() {
        assert_eq!(
            volume_summary("proj.users", usage(1_048_576, 2_000_000)),
            "proj.users 52% used (2000000 KB quota, 1048576 KB used, 951424 KB free)"
        );
    }

    #[cfg(feature = "humansize")]
    #[test]
    fn summary_renders_scaled_bytes() {
        let summary = volume_summary("proj.users", usage(1_048_576, 2_000_000));

        assert!(summary.starts_with("proj.users 52% used ("));
        assert!(summary.contains("GiB"));
    }

    #[test]
    fn short_form_has_no_detail() {
        assert_eq!(
            volume_short("proj.web", usage(900_000, 1_000_000)),
            "proj.web 90%"
        );
    }

    #[test]
    fn aggregate_all_ok_reports_count() {
        let volumes = BTreeMap::from([
            ("a.vol".to_string(), usage(100, 1000)),
            ("b.vol".to_string(), usage(200, 1000)),
            ("c.vol".to_string(), usage(300, 1000)),
        ]);

        let (verdict, message) = aggregate(&volumes, &thresholds());

        assert_eq!(verdict, Verdict::Ok);
        assert_eq!(message, "3 volumes ok");
    }

    #[test]
    fn aggregate_lists_only_warnings() {
        let volumes = BTreeMap::from([
            ("a.vol".to_string(), usage(100, 1000)),
            ("b.vol".to_string(), usage(200, 1000)),
            ("c.vol".to_string(), usage(880, 1000)),
        ]);

        let (verdict, message) = aggregate(&volumes, &thresholds());

        assert_eq!(verdict, Verdict::Warning);
        assert_eq!(message, "c.vol 88%");
    }

    #[test]
    fn aggregate_criticals_suppress_warnings() {
        let volumes = BTreeMap::from([
            ("warn.vol".to_string(), usage(880, 1000)),
            ("crit.vol".to_string(), usage(990, 1000)),
        ]);

        let (verdict, message) = aggregate(&volumes, &thresholds());

        assert_eq!(verdict, Verdict::Critical);
        assert_eq!(message, "crit.vol 99%");
    }

    #[test]
    fn aggregate_joins_multiple_criticals_in_name_order() {
        let volumes = BTreeMap::from([
            ("b.vol".to_string(), usage(1000, 1000)),
            ("a.vol".to_string(), usage(950, 1000)),
            ("ok.vol".to_string(), usage(100, 1000)),
        ]);

        let (verdict, message) = aggregate(&volumes, &thresholds());

        assert_eq!(verdict, Verdict::Critical);
        assert_eq!(message, "a.vol 95%, b.vol 100%");
    }

    #[test]
    fn aggregate_empty_is_ok() {
        let volumes = BTreeMap::new();

        let (verdict, message) = aggregate(&volumes, &thresholds());

        assert_eq!(verdict, Verdict::Ok);
        assert_eq!(message, "0 volumes ok");
    }
}
