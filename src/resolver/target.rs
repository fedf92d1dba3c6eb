// Target address normalization

use reqwest::Url;
use std::fmt;

use crate::errors::ResolveError;

const DEFAULT_SCHEME: &str = "http";

/// A user-supplied target with its normalized form.
///
/// `normalized` always carries a scheme and is the cache key; `host` is the
/// identity used to match an instance's existing proxies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    original: String,
    normalized: String,
    host: String,
}

impl Target {
    pub fn parse(input: &str) -> Result<Self, ResolveError> {
        let original = input.trim();
        if original.is_empty() {
            return Err(ResolveError::InvalidTarget("empty target".to_string()));
        }

        let normalized = if has_scheme(original) {
            original.to_string()
        } else {
            format!("{}://{}", DEFAULT_SCHEME, original)
        };

        let host = host_of(&normalized)
            .ok_or_else(|| ResolveError::InvalidTarget(original.to_string()))?;

        Ok(Self {
            original: original.to_string(),
            normalized,
            host,
        })
    }

    /// The address exactly as the caller gave it.
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether `url` points at the same host as this target.
    pub fn matches_host(&self, url: &str) -> bool {
        host_of(url).as_deref() == Some(self.host.as_str())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}

/// Whether `input` starts with `scheme://`. A `://` later in the path or
/// query does not count.
fn has_scheme(input: &str) -> bool {
    let Some((scheme, _)) = input.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Hostname component of a URL, lowercased by the URL parser.
fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_host_gets_http_scheme() {
        let t = Target::parse("intranet.corp:8080/wiki").unwrap();
        assert_eq!(t.original(), "intranet.corp:8080/wiki");
        assert_eq!(t.normalized(), "http://intranet.corp:8080/wiki");
        assert_eq!(t.host(), "intranet.corp");
    }

    #[test]
    fn test_existing_scheme_is_kept() {
        let t = Target::parse("https://Git.Internal/repo").unwrap();
        assert_eq!(t.normalized(), "https://Git.Internal/repo");
        assert_eq!(t.host(), "git.internal");
    }

    #[test]
    fn test_url_in_query_does_not_count_as_scheme() {
        let t = Target::parse("sso.corp/login?service=http://app.corp").unwrap();
        assert_eq!(t.normalized(), "http://sso.corp/login?service=http://app.corp");
        assert_eq!(t.host(), "sso.corp");

        let t = Target::parse("wiki.corp#ref=https://x").unwrap();
        assert_eq!(t.normalized(), "http://wiki.corp#ref=https://x");
    }

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("http://a"));
        assert!(has_scheme("svn+ssh://a"));
        assert!(!has_scheme("a/b?u=http://c"));
        assert!(!has_scheme("://a"));
        assert!(!has_scheme("1http://a"));
        assert!(!has_scheme("plain.host"));
    }

    #[test]
    fn test_ip_target() {
        let t = Target::parse("192.168.3.10").unwrap();
        assert_eq!(t.normalized(), "http://192.168.3.10");
        assert_eq!(t.host(), "192.168.3.10");
    }

    #[test]
    fn test_matches_host_ignores_port_and_path() {
        let t = Target::parse("intranet.corp").unwrap();
        assert!(t.matches_host("http://intranet.corp:9000/x"));
        assert!(t.matches_host("https://INTRANET.corp"));
        assert!(!t.matches_host("http://other.corp"));
        assert!(!t.matches_host("not a url"));
    }

    #[test]
    fn test_invalid_targets() {
        assert!(matches!(
            Target::parse("   "),
            Err(ResolveError::InvalidTarget(_))
        ));
        assert!(matches!(
            Target::parse("http://"),
            Err(ResolveError::InvalidTarget(_))
        ));
    }
}
