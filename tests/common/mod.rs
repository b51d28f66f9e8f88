use chrono::DateTime;
use spotify_stats::PlayEvent;

/// Build a play event for a track id and RFC3339 timestamp.
pub fn play_event(track_id: &str, played_at: &str) -> PlayEvent {
    let played_at = DateTime::parse_from_rfc3339(played_at).unwrap();
    PlayEvent {
        track_id: track_id.to_string(),
        track_name: format!("track {track_id}"),
        artist_id: format!("artist-{track_id}"),
        artist_name: format!("Artist {track_id}"),
        all_artists: format!("Artist {track_id}"),
        genres: String::new(),
        popularity: 50,
        played_at,
        date: played_at.date_naive(),
        hour: chrono::Timelike::hour(&played_at),
        duration_ms: 200_000,
    }
}
