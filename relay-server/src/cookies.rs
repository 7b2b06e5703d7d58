// relay-server/src/cookies.rs
use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header::{self, HeaderMap};
use common::{CookiePolicy, SameSitePolicy};

/// An upstream `Set-Cookie` reduced to the parts that survive the rewrite.
/// Domain, Secure, HttpOnly, SameSite and Expires are dropped on parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamCookie {
    pub name: String,
    pub value: String,
    pub max_age_ms: Option<i64>,
    pub path: Option<String>,
}

/// Cookie as it will be sent to the browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenCookie {
    pub name: String,
    pub value: String,
    pub path: String,
    pub max_age_ms: i64,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSitePolicy,
}

impl UpstreamCookie {
    /// Parse a raw `Set-Cookie` header value. Returns `None` when there is no cookie name.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut tokens = raw.split(';');
        let pair = tokens.next()?;

        // Only the first '=' separates name from value
        let (name, value) = match pair.split_once('=') {
            Some((name, value)) => (name.trim(), value),
            None => (pair.trim(), ""),
        };
        if name.is_empty() {
            return None;
        }

        let mut cookie = Self {
            name: name.to_string(),
            value: value.to_string(),
            max_age_ms: None,
            path: None,
        };

        for token in tokens {
            let token = token.trim();
            let (key, val) = match token.split_once('=') {
                Some((key, val)) => (key.trim(), val.trim()),
                None => (token, ""),
            };

            if key.eq_ignore_ascii_case("max-age") {
                match parse_leading_int(val) {
                    Some(seconds) => cookie.max_age_ms = Some(seconds.saturating_mul(1000)),
                    None => tracing::debug!("Ignoring unparsable Max-Age on cookie {}", cookie.name),
                }
            } else if key.eq_ignore_ascii_case("path") {
                cookie.path = Some(val.to_string());
            }
        }

        Some(cookie)
    }

    /// Apply the local cookie policy
    pub fn rewrite(&self, policy: &CookiePolicy) -> RewrittenCookie {
        let path = self
            .path
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(&policy.default_path)
            .to_string();

        RewrittenCookie {
            name: self.name.clone(),
            value: self.value.clone(),
            path,
            max_age_ms: self.max_age_ms.unwrap_or(policy.default_max_age_ms),
            http_only: policy.http_only,
            secure: policy.secure,
            same_site: policy.same_site,
        }
    }
}

impl RewrittenCookie {
    /// Build the actix cookie. `Max-Age` carries the millisecond figure unchanged.
    pub fn to_cookie(&self) -> Cookie<'static> {
        Cookie::build(self.name.clone(), self.value.clone())
            .path(self.path.clone())
            .http_only(self.http_only)
            .secure(self.secure)
            .same_site(same_site(self.same_site))
            .max_age(CookieDuration::seconds(self.max_age_ms))
            .finish()
    }
}

fn same_site(policy: SameSitePolicy) -> SameSite {
    match policy {
        SameSitePolicy::Lax => SameSite::Lax,
        SameSitePolicy::Strict => SameSite::Strict,
        SameSitePolicy::None => SameSite::None,
    }
}

/// Rewrite every raw upstream cookie, skipping the ones without a name
pub fn rewrite_all(raw_cookies: &[String], policy: &CookiePolicy) -> Vec<Cookie<'static>> {
    raw_cookies
        .iter()
        .filter_map(|raw| match UpstreamCookie::parse(raw) {
            Some(parsed) => Some(parsed.rewrite(policy).to_cookie()),
            None => {
                tracing::warn!("Skipping upstream cookie without a name");
                None
            }
        })
        .collect()
}

/// Integer prefix of `s`, the way a lenient parser reads "60" or "60abc"
fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Find the value of the cookie named exactly `name` across all `Cookie` headers.
/// An empty value counts as absent.
///
/// Read from the raw header rather than `HttpRequest::cookie`: actix percent-decodes
/// values and drops the whole jar when any pair is malformed, and the token has to
/// be replayed byte for byte.
pub fn extract_session_token(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::HeaderValue;

    fn policy() -> CookiePolicy {
        CookiePolicy::default()
    }

    #[test]
    fn test_defaults_without_max_age_or_path() {
        let rewritten = UpstreamCookie::parse("n8n-auth=tok").unwrap().rewrite(&policy());
        assert_eq!(rewritten.path, "/");
        assert_eq!(rewritten.max_age_ms, 604_800_000);
        assert!(!rewritten.http_only);
        assert!(!rewritten.secure);
        assert_eq!(rewritten.same_site, SameSitePolicy::Lax);
    }

    #[test]
    fn test_max_age_seconds_become_milliseconds() {
        let parsed = UpstreamCookie::parse("n8n-auth=tok; Max-Age=60").unwrap();
        assert_eq!(parsed.max_age_ms, Some(60_000));
        assert_eq!(parsed.rewrite(&policy()).max_age_ms, 60_000);
    }

    #[test]
    fn test_attribute_keys_are_case_insensitive() {
        let parsed = UpstreamCookie::parse("sid=1; MAX-AGE=5; PATH=/rest").unwrap();
        assert_eq!(parsed.max_age_ms, Some(5_000));
        assert_eq!(parsed.path.as_deref(), Some("/rest"));
    }

    #[test]
    fn test_empty_path_falls_back_to_root() {
        let rewritten = UpstreamCookie::parse("sid=1; Path=").unwrap().rewrite(&policy());
        assert_eq!(rewritten.path, "/");
    }

    #[test]
    fn test_unparsable_max_age_keeps_default() {
        let parsed = UpstreamCookie::parse("sid=1; Max-Age=soon").unwrap();
        assert_eq!(parsed.max_age_ms, None);
        assert_eq!(parsed.rewrite(&policy()).max_age_ms, 604_800_000);

        let parsed = UpstreamCookie::parse("sid=1; Max-Age=60abc").unwrap();
        assert_eq!(parsed.max_age_ms, Some(60_000));
    }

    #[test]
    fn test_value_split_on_first_equals_only() {
        let parsed = UpstreamCookie::parse("token=abc==; Path=/").unwrap();
        assert_eq!(parsed.name, "token");
        assert_eq!(parsed.value, "abc==");
    }

    #[test]
    fn test_upstream_security_attributes_are_discarded() {
        let raw = "n8n-auth=tok; Domain=n8n.internal; Secure; HttpOnly; SameSite=Strict; Expires=Wed, 21 Oct 2099 07:28:00 GMT";
        let cookie = UpstreamCookie::parse(raw).unwrap().rewrite(&policy()).to_cookie();
        let rendered = cookie.to_string();
        assert!(!rendered.contains("HttpOnly"));
        assert!(!rendered.contains("Secure"));
        assert!(!rendered.contains("Domain"));
        assert!(!rendered.contains("Expires"));
        assert!(rendered.contains("SameSite=Lax"));
    }

    #[test]
    fn test_rendered_cookie_carries_millisecond_max_age() {
        let cookie = UpstreamCookie::parse("n8n-auth=tok; Path=/; HttpOnly; Max-Age=3600")
            .unwrap()
            .rewrite(&policy())
            .to_cookie();
        let rendered = cookie.to_string();
        assert!(rendered.starts_with("n8n-auth=tok"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=3600000"));
    }

    #[test]
    fn test_strict_policy_is_applied() {
        let strict = CookiePolicy {
            http_only: true,
            secure: true,
            same_site: SameSitePolicy::Strict,
            ..CookiePolicy::default()
        };
        let rendered = UpstreamCookie::parse("sid=1").unwrap().rewrite(&strict).to_cookie().to_string();
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("SameSite=Strict"));
    }

    #[test]
    fn test_rewrite_all_skips_nameless_cookies() {
        let raw = vec!["=orphan".to_string(), "a=1".to_string(), "b=2; Max-Age=1".to_string()];
        let cookies = rewrite_all(&raw, &policy());
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0].name(), "a");
        assert_eq!(cookies[1].name(), "b");
    }

    #[test]
    fn test_extract_session_token_exact_name() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("n8n-auth-legacy=old; theme=dark; n8n-auth=abc123"),
        );
        assert_eq!(extract_session_token(&headers, "n8n-auth").as_deref(), Some("abc123"));
        assert_eq!(extract_session_token(&headers, "missing"), None);
    }

    #[test]
    fn test_extract_session_token_empty_value_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("n8n-auth="));
        assert_eq!(extract_session_token(&headers, "n8n-auth"), None);
        assert_eq!(extract_session_token(&HeaderMap::new(), "n8n-auth"), None);
    }

    #[test]
    fn test_extract_session_token_is_verbatim_beside_malformed_pairs() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("garbage; =nameless; n8n-auth=s%3Aabc%2Fdef=="),
        );
        assert_eq!(
            extract_session_token(&headers, "n8n-auth").as_deref(),
            Some("s%3Aabc%2Fdef==")
        );
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("60"), Some(60));
        assert_eq!(parse_leading_int("-1"), Some(-1));
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("x1"), None);
    }
}
