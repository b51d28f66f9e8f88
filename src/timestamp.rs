use anyhow::Result;
use chrono::{DateTime, Utc};

/// Parse a Spotify `played_at` timestamp into a `DateTime<Utc>`.
/// The API emits ISO-8601 UTC with a `Z` suffix, but offset forms are
/// accepted as well.
pub fn parse_played_at(timestamp: &str) -> Result<DateTime<Utc>> {
    let normalized = if timestamp.ends_with('Z') {
        timestamp.replace('Z', "+00:00")
    } else {
        timestamp.to_string()
    };

    let parsed = DateTime::parse_from_rfc3339(&normalized)
        .map_err(|err| anyhow::anyhow!("failed to parse timestamp {timestamp:?}: {err}"))?;

    Ok(parsed.with_timezone(&Utc))
}
