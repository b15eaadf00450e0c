//! Area filtering and batch transformation.
//!
//! Sits between the fetch and load stages: drops devices outside the
//! configured postal districts and flattens the survivors into `CleanRow`s,
//! preserving the order the API returned them in.

use chrono::{DateTime, Utc};

use crate::{CleanRow, RawDevice};

// ---

/// Does a normalized (uppercased, trimmed) postcode fall in one of the
/// allowed postal districts?
///
/// A prefix match alone is not enough: "EC10 9ZZ" starts with "EC1" but
/// belongs to the EC10 district. The character after the prefix must be
/// absent, a space, or a non-digit for the match to count ("EC1 2AB" and
/// "EC1V 2NX" match "EC1"; "EC10 9ZZ" does not).
pub fn area_matches(postcode: &str, prefixes: &[String]) -> bool {
    // ---
    prefixes.iter().any(|prefix| {
        match postcode.strip_prefix(prefix.as_str()) {
            Some(suffix) => match suffix.chars().next() {
                None => true,
                Some(c) => c == ' ' || !c.is_ascii_digit(),
            },
            None => false,
        }
    })
}

/// Filter fetched devices by area and flatten each survivor.
///
/// Input order is preserved. Every returned row carries the same
/// `ingested_at` timestamp.
pub fn transform(
    devices: &[RawDevice],
    prefixes: &[String],
    ingested_at: DateTime<Utc>,
) -> Vec<CleanRow> {
    // ---
    devices
        .iter()
        .filter(|device| area_matches(&device.normalized_postcode(), prefixes))
        .map(|device| device.to_clean_row(ingested_at))
        .collect()
}
