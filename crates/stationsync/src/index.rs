//! Remote directory listing resolution.
//!
//! The listing endpoint returns an HTML (or plain-text) page containing
//! anchor-like occurrences of filenames. It is treated as opaque text and
//! matched with regexes, never parsed structurally, so arbitrary surrounding
//! markup is tolerated.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use stationsync_fetch::{HttpClient, Result};

static PLAIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r">\s*(\d{4}\.tar\.gz)<").expect("static regex"));
static DECORATED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r">\s*(isd_\d{4}_[\w\-]*csv\.tar\.gz)<").expect("static regex"));

/// Canonical archive name for a year.
pub fn plain_name(year: u16) -> String {
    format!("{year}.tar.gz")
}

/// Whether `name` is a decorated-pattern archive name for `year`.
pub fn is_decorated_name(name: &str, year: u16) -> bool {
    name.starts_with(&format!("isd_{year}_")) && name.ends_with("csv.tar.gz")
}

/// Fetch the raw listing text. Done once per run; every job resolves
/// against the same immutable text.
pub async fn fetch_listing<C: HttpClient>(client: &C, base_url: &str) -> Result<String> {
    client.get_text(base_url).await
}

/// Pick the archive filename for a year out of the listing text.
///
/// The plain `YYYY.tar.gz` form wins over the decorated `isd_YYYY_*csv.tar.gz`
/// form. Listings may repeat an entry; candidates are deduplicated and the
/// lexicographically last one is chosen so repeated calls on the same text
/// always agree. `None` means the year is simply not published.
pub fn resolve_filename(listing: &str, year: u16) -> Option<String> {
    let plain = plain_name(year);
    let candidates: BTreeSet<&str> = PLAIN
        .captures_iter(listing)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|name| **name == plain)
        .collect();
    if let Some(name) = candidates.last() {
        return Some((*name).to_string());
    }

    let candidates: BTreeSet<&str> = DECORATED
        .captures_iter(listing)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|name| is_decorated_name(name, year))
        .collect();
    candidates.last().map(|name| (*name).to_string())
}
