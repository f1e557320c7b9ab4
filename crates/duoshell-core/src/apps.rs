//! Application resolution.
//!
//! Maps configured package identifiers to concrete launch directives,
//! applying the show-all/filtered visibility rules. Most installed apps
//! are irrelevant noise for a home-app picker, so the filtered view keeps
//! home-category entries plus anything matching the curated substring
//! allowlist. The allowlist is a heuristic approximation of "launcher
//! like", not an exhaustive policy.

use duoshell_types::{AppCategory, AppEntry, ResolvedApp};

/// Capability seam over the installed-application registry.
pub trait AppRegistry: Send + Sync {
    /// Current launcher-category and home-category entries. Recomputed per
    /// query; resolution results are never cached across queries.
    fn installed(&self) -> Vec<AppEntry>;
}

/// Build the candidate set: deduplicated by identifier (home-category
/// entries win on conflict), filtered unless `show_all`, sorted by label
/// case-insensitively.
#[must_use]
pub fn candidates(registry: &dyn AppRegistry, show_all: bool, hints: &[String]) -> Vec<AppEntry> {
    let mut entries: Vec<AppEntry> = Vec::new();

    for entry in registry.installed() {
        if let Some(pos) = entries
            .iter()
            .position(|e| e.identifier == entry.identifier)
        {
            if entries[pos].category == AppCategory::Launcher
                && entry.category == AppCategory::Home
            {
                entries[pos] = entry;
            }
        } else {
            entries.push(entry);
        }
    }

    if !show_all {
        entries.retain(|entry| entry.category == AppCategory::Home || matches_hint(entry, hints));
    }

    entries.sort_by(|a, b| {
        a.label
            .to_lowercase()
            .cmp(&b.label.to_lowercase())
            .then_with(|| a.identifier.cmp(&b.identifier))
    });

    entries
}

fn matches_hint(entry: &AppEntry, hints: &[String]) -> bool {
    let label = entry.label.to_lowercase();
    let identifier = entry.identifier.to_lowercase();
    hints
        .iter()
        .any(|hint| label.contains(hint.as_str()) || identifier.contains(hint.as_str()))
}

/// Resolve one identifier to a launchable application, or `None` if it is
/// not launchable under the current visibility rules.
#[must_use]
pub fn resolve(
    registry: &dyn AppRegistry,
    identifier: &str,
    show_all: bool,
    hints: &[String],
) -> Option<ResolvedApp> {
    candidates(registry, show_all, hints)
        .into_iter()
        .find(|entry| entry.identifier == identifier)
        .map(|entry| ResolvedApp {
            label: entry.label,
            identifier: entry.identifier,
            directive: entry.directive,
        })
}
