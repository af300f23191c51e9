//! URI shape validation for the handful of forms the engine accepts:
//! `spotify:{kind}:id`, canonicalized `http(s)://`, `file://`, and absolute
//! filesystem paths.

use crate::error::{PlaybackError, Result};

const SPOTIFY_KINDS: &[&str] = &[
    "track", "album", "playlist", "episode", "show", "artist", "station", "radio", "autoplay",
];

/// Validates that `uri` has one of the shapes the engine understands.
/// Does not check that the referent exists — only that the transport layer
/// downstream has something plausible to open.
pub fn validate_uri(uri: &str) -> Result<()> {
    if uri.is_empty() {
        return Err(PlaybackError::InvalidUri("empty uri".to_string()));
    }

    if let Some(rest) = uri.strip_prefix("spotify:") {
        let mut parts = rest.splitn(2, ':');
        let kind = parts.next().unwrap_or("");
        let id = parts.next().unwrap_or("");
        if SPOTIFY_KINDS.contains(&kind) && !id.is_empty() {
            return Ok(());
        }
        return Err(PlaybackError::InvalidUri(uri.to_string()));
    }

    if uri.starts_with("http://") || uri.starts_with("https://") {
        return Ok(());
    }

    if uri.starts_with("file://") {
        return Ok(());
    }

    if std::path::Path::new(uri).is_absolute() {
        return Ok(());
    }

    Err(PlaybackError::InvalidUri(uri.to_string()))
}

/// `true` for forms the engine treats as local files (`file://` or an
/// absolute path), used by the event-reporting policy.
pub fn is_local_file(uri: &str) -> bool {
    uri.starts_with("file://") || std::path::Path::new(uri).is_absolute()
}

/// `true` for bare `http(s)://` stream URIs (not a canonicalized Spotify
/// CDN URL wrapped by a `TrackSource`).
pub fn is_http_stream(uri: &str) -> bool {
    uri.starts_with("http://") || uri.starts_with("https://")
}

/// `true` for `spotify:episode:...` / `spotify:show:...` podcast URIs.
pub fn is_podcast(uri: &str) -> bool {
    uri.starts_with("spotify:episode:") || uri.starts_with("spotify:show:")
}

/// `true` for any other `spotify:track:...`-shaped URI.
pub fn is_spotify_track(uri: &str) -> bool {
    uri.starts_with("spotify:track:")
}

pub fn canonical_context_url(context_uri: &str) -> String {
    format!("context://{context_uri}")
}

/// Maps an `https://open.spotify.com/{kind}/{id}` (or `http://`) URL to its
/// canonical `spotify:{kind}:{id}` form. Any other shape — bare `spotify:`
/// URIs, `file://`, absolute paths, non-Spotify `http(s)://` stream URLs —
/// passes through unchanged; unknown schemes are rejected later by
/// [`validate_uri`], not here.
pub fn canonicalize_uri(uri: &str) -> String {
    let Some(rest) = uri
        .strip_prefix("https://open.spotify.com/")
        .or_else(|| uri.strip_prefix("http://open.spotify.com/"))
    else {
        return uri.to_string();
    };

    let mut parts = rest.splitn(2, '/');
    let kind = parts.next().unwrap_or("");
    let id = parts
        .next()
        .unwrap_or("")
        .split(['?', '#'])
        .next()
        .unwrap_or("")
        .trim_end_matches('/');

    if !id.is_empty() && SPOTIFY_KINDS.contains(&kind) {
        format!("spotify:{kind}:{id}")
    } else {
        uri.to_string()
    }
}

/// Inverse of [`canonicalize_uri`]: maps a canonical `spotify:{kind}:{id}`
/// URI to its `https://open.spotify.com/{kind}/{id}` form. `None` for any
/// other URI shape.
pub fn uri_to_http_url(uri: &str) -> Option<String> {
    let rest = uri.strip_prefix("spotify:")?;
    let mut parts = rest.splitn(2, ':');
    let kind = parts.next()?;
    let id = parts.next()?;
    if !id.is_empty() && SPOTIFY_KINDS.contains(&kind) {
        Some(format!("https://open.spotify.com/{kind}/{id}"))
    } else {
        None
    }
}
