//! YouTube link parsing

use once_cell::sync::Lazy;
use regex::Regex;

/// Direct forms: `watch?v=`, `youtu.be/`, `embed/`
static DIRECT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([^&\n?#]+)")
        .expect("static regex")
});

/// `watch` URLs where `v=` is not the first query parameter
static QUERY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"youtube\.com/watch\?.*v=([^&\n?#]+)").expect("static regex"));

/// Extract the video id from a YouTube URL
///
/// Returns `None` when the URL is not a recognizable YouTube link.
///
/// # Examples
/// ```
/// use taskhub_common::youtube::extract_youtube_id;
///
/// assert_eq!(extract_youtube_id("https://youtu.be/dQw4w9WgXcQ").as_deref(), Some("dQw4w9WgXcQ"));
/// assert_eq!(extract_youtube_id("https://vimeo.com/1234"), None);
/// ```
pub fn extract_youtube_id(url: &str) -> Option<String> {
    [&*DIRECT_PATTERN, &*QUERY_PATTERN]
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
