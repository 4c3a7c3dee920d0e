//! Shared utilities

/// Truncate a string to `max` characters, appending "..." if truncated.
/// Operates on Unicode char boundaries, not bytes.
pub fn truncate_chars(s: &str, max: usize) -> String {
    let mut chars = s.chars();
    let truncated: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", truncated)
    } else {
        truncated
    }
}

/// Last non-empty path segment of a URL, percent-decoded
pub fn url_file_name(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).next_back()?;
    let name = urlencoding::decode(segment).ok()?;
    Some(name.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello world", 5), "hello...");
        assert_eq!(truncate_chars("héllo", 2), "hé...");
    }

    #[test]
    fn test_url_file_name() {
        assert_eq!(
            url_file_name("https://example.com/data/sales.csv?x=1").as_deref(),
            Some("sales.csv")
        );
        assert_eq!(url_file_name("https://example.com/a.mp3#t=3").as_deref(), Some("a.mp3"));
        assert_eq!(url_file_name("https://example.com/"), None);
        assert_eq!(url_file_name("https://example.com"), None);
        assert_eq!(url_file_name("https://example.com/data/").as_deref(), Some("data"));
    }

    #[test]
    fn test_url_file_name_decodes() {
        assert_eq!(
            url_file_name("https://x.example/a%20b.mp3").as_deref(),
            Some("a b.mp3")
        );
        assert_eq!(url_file_name("not a url"), None);
    }
}
