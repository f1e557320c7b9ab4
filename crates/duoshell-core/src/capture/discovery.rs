//! Privileged display-id discovery.
//!
//! Raw capture needs the low-level display identifiers the standard
//! enumeration does not expose. They are parsed out of a privileged
//! diagnostic dump and corroborated by a secondary identifier source,
//! then deduplicated into a sorted deterministic list.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Fallback identifier for the top panel when discovery comes up short.
pub const FALLBACK_TOP_DISPLAY_ID: u64 = 0;

/// Fixed identifier of the secondary panel on the supported device family;
/// substituted when discovery cannot corroborate a second display.
pub const FALLBACK_BOTTOM_DISPLAY_ID: u64 = 4_619_827_551_948_147_201;

fn diagnostic_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"Display (\d+)").expect("valid display-id pattern"))
}

fn secondary_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"displayId=(\d+)").expect("valid displayId pattern"))
}

/// Extract display identifiers from both discovery sources.
///
/// Identifiers appearing in both sources collapse to one entry; the result
/// is sorted ascending so repeated discovery runs are comparable.
#[must_use]
pub fn extract_ids(diagnostic_output: &str, secondary_output: &str) -> Vec<u64> {
    let mut ids = BTreeSet::new();

    for capture in diagnostic_pattern().captures_iter(diagnostic_output) {
        if let Ok(id) = capture[1].parse::<u64>() {
            ids.insert(id);
        }
    }

    for capture in secondary_pattern().captures_iter(secondary_output) {
        if let Ok(id) = capture[1].parse::<u64>() {
            ids.insert(id);
        }
    }

    ids.into_iter().collect()
}

/// Apply the degraded-mode substitution: fewer than two discovered ids
/// means the hardcoded pair is used instead. Returns the ids to capture
/// and whether the fallback was taken.
#[must_use]
pub fn with_fallback(ids: Vec<u64>) -> (Vec<u64>, bool) {
    if ids.len() >= 2 {
        (ids, false)
    } else {
        (
            vec![FALLBACK_TOP_DISPLAY_ID, FALLBACK_BOTTOM_DISPLAY_ID],
            true,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_diagnostic_dump() {
        let dump = "Display 4619827259835644672 (HWC display 0): port=0\n\
                    Display 4619827551948147201 (HWC display 1): port=1\n";
        let ids = extract_ids(dump, "");
        assert_eq!(ids, vec![4_619_827_259_835_644_672, 4_619_827_551_948_147_201]);
    }

    #[test]
    fn test_extract_from_secondary_source() {
        let listing = "DisplayDeviceInfo{displayId=0, state ON}\n\
                       DisplayDeviceInfo{displayId=2, state ON}\n";
        let ids = extract_ids("", listing);
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn test_sources_are_merged_and_sorted() {
        let dump = "Display 9 (HWC display 1)";
        let listing = "displayId=3";
        assert_eq!(extract_ids(dump, listing), vec![3, 9]);
    }

    #[test]
    fn test_duplicate_across_sources_collapses_to_one() {
        let dump = "Display 7 (HWC display 0)";
        let listing = "displayId=7";
        assert_eq!(extract_ids(dump, listing), vec![7]);
    }

    #[test]
    fn test_garbage_output_yields_nothing() {
        let ids = extract_ids("no panels here", "error: service not found");
        assert!(ids.is_empty());
    }

    #[test]
    fn test_fallback_on_empty_discovery() {
        let (ids, degraded) = with_fallback(Vec::new());
        assert_eq!(ids, vec![FALLBACK_TOP_DISPLAY_ID, FALLBACK_BOTTOM_DISPLAY_ID]);
        assert!(degraded);
    }

    #[test]
    fn test_fallback_on_single_id() {
        let (ids, degraded) = with_fallback(vec![42]);
        assert_eq!(ids, vec![FALLBACK_TOP_DISPLAY_ID, FALLBACK_BOTTOM_DISPLAY_ID]);
        assert!(degraded);
    }

    #[test]
    fn test_two_ids_pass_through() {
        let (ids, degraded) = with_fallback(vec![0, 7]);
        assert_eq!(ids, vec![0, 7]);
        assert!(!degraded);
    }

    #[test]
    fn test_more_than_two_ids_pass_through() {
        // A docked external display can show up; the caller takes the
        // first two in sorted order.
        let (ids, degraded) = with_fallback(vec![0, 7, 11]);
        assert_eq!(ids, vec![0, 7, 11]);
        assert!(!degraded);
    }
}
