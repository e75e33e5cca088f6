use regex::Regex;
use std::sync::OnceLock;

static VIDEO_ID_RE: OnceLock<Regex> = OnceLock::new();

/// Extract the 11-character YouTube video id from a URL.
///
/// Recognizes canonical watch URLs (`?v=`), shortened `youtu.be/` URLs and
/// embed/path style URLs (`/embed/`, `/v/`, `/e/`). Returns `None` when no id
/// can be found; the caller treats that as a fatal precondition for the run.
pub fn extract_video_id(url: &str) -> Option<String> {
    let re = VIDEO_ID_RE.get_or_init(|| {
        Regex::new(
            r#"(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#,
        )
        .unwrap()
    });

    re.captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_watch_url_with_extra_params() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?list=PL123&v=dQw4w9WgXcQ&t=42s"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_short_url() {
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ?t=10"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_embed_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/v/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_repeated_calls_share_compiled_pattern() {
        // First call initializes the static, later calls reuse it
        for _ in 0..3 {
            assert_eq!(
                extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
                Some("dQw4w9WgXcQ".to_string())
            );
            assert_eq!(extract_video_id("https://www.youtube.com/"), None);
        }
    }

    #[test]
    fn test_no_id() {
        assert_eq!(extract_video_id("https://www.youtube.com/"), None);
        assert_eq!(extract_video_id("https://example.com/watch?v=short"), None);
        assert_eq!(extract_video_id("not a url"), None);
    }
}
