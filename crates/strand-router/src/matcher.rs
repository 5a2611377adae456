//! Path prefix matching.
//!
//! # Design Decisions
//! - Prefixes match whole segments only: `/admin` never matches `/administrator`
//! - `/` (or an empty prefix) matches every path
//! - Trailing slashes on the registered prefix are ignored
//! - ASCII case folding unless the router is case sensitive

/// Matches a request path against a registered mount prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
    case_sensitive: bool,
}

impl PathPrefixMatcher {
    pub fn new(prefix: impl Into<String>, case_sensitive: bool) -> Self {
        let prefix = prefix.into();
        let trimmed = prefix.trim_end_matches('/');
        let prefix = if trimmed.is_empty() {
            String::new()
        } else if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        };

        Self {
            prefix,
            case_sensitive,
        }
    }

    /// The normalized prefix as registered, `/` for the catch-all.
    pub fn prefix(&self) -> &str {
        if self.prefix.is_empty() {
            "/"
        } else {
            &self.prefix
        }
    }

    /// Returns the number of leading bytes of `path` consumed by this
    /// prefix, or `None` if the path is outside it.
    pub fn match_len(&self, path: &str) -> Option<usize> {
        let len = self.prefix.len();
        if len == 0 {
            return Some(0);
        }

        let head = path.get(..len)?;
        let same = if self.case_sensitive {
            head == self.prefix
        } else {
            head.eq_ignore_ascii_case(&self.prefix)
        };
        if !same {
            return None;
        }

        match path.as_bytes().get(len) {
            None | Some(b'/') => Some(len),
            Some(_) => None,
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        self.match_len(path).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_matches_everything() {
        let matcher = PathPrefixMatcher::new("/", false);
        assert_eq!(matcher.prefix(), "/");
        assert_eq!(matcher.match_len("/"), Some(0));
        assert_eq!(matcher.match_len("/blog/posts"), Some(0));
    }

    #[test]
    fn test_segment_boundaries() {
        let matcher = PathPrefixMatcher::new("/admin/", false);
        assert_eq!(matcher.prefix(), "/admin");

        assert_eq!(matcher.match_len("/admin"), Some(6));
        assert_eq!(matcher.match_len("/admin/"), Some(6));
        assert_eq!(matcher.match_len("/admin/users"), Some(6));
        assert!(!matcher.matches("/administrator"));
        assert!(!matcher.matches("/adm"));
        assert!(!matcher.matches("/"));
    }

    #[test]
    fn test_case_sensitivity() {
        let loose = PathPrefixMatcher::new("/Blog", false);
        assert!(loose.matches("/blog/1"));
        assert!(loose.matches("/BLOG"));

        let strict = PathPrefixMatcher::new("/Blog", true);
        assert!(strict.matches("/Blog/1"));
        assert!(!strict.matches("/blog/1"));
    }

    #[test]
    fn test_missing_leading_slash() {
        let matcher = PathPrefixMatcher::new("posts", false);
        assert_eq!(matcher.prefix(), "/posts");
        assert!(matcher.matches("/posts/5"));
    }

    #[test]
    fn test_non_ascii_boundary() {
        let matcher = PathPrefixMatcher::new("/ab", false);
        // byte 3 falls inside the multi-byte character
        assert!(!matcher.matches("/aé"));
    }
}
