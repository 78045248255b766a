//! Visit-count report
//!
//! The plain-text view of the visit ledger: how many times each page was
//! linked to from within the site.

use std::collections::HashMap;

/// Orders ledger entries by visit count (descending), then key (ascending)
pub fn sort_visits(visits: &HashMap<String, u32>) -> Vec<(&str, u32)> {
    let mut entries: Vec<(&str, u32)> = visits
        .iter()
        .map(|(key, count)| (key.as_str(), *count))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries
}

/// Formats the visit-count report
pub fn format_visit_report(base_url: &str, visits: &HashMap<String, u32>) -> String {
    let mut out = String::new();

    out.push_str("=============================\n");
    out.push_str(&format!("  REPORT for {}\n", base_url));
    out.push_str("=============================\n");

    for (key, count) in sort_visits(visits) {
        out.push_str(&format!("Found {} internal links to {}\n", count, key));
    }

    out
}
