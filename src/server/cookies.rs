//! Cookie records and the per-message cookie jar.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::fmt;

use super::headers::strip_line_breaks;

/// Days a cookie lives when no explicit expiry is given.
pub const DEFAULT_COOKIE_EXPIRY_DAYS: u32 = 3;

/// `Expires` attribute format, e.g. `Tue, 31 Dec 2024 23:59:59 GMT`.
pub const EXPIRES_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// A single cookie record.
///
/// `is_new` separates cookies created during the current exchange (they must be
/// emitted as `Set-Cookie`) from cookies that arrived on the incoming request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
    expires: DateTime<Utc>,
    is_new: bool,
    path: Option<String>,
    http_only: bool,
}

impl Cookie {
    /// Create a freshly-set cookie expiring after the default lifetime.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::with_expiry_days(name, value, DEFAULT_COOKIE_EXPIRY_DAYS)
    }

    /// Create a freshly-set cookie expiring `days` from now.
    pub fn with_expiry_days(name: impl Into<String>, value: impl Into<String>, days: u32) -> Self {
        Self {
            name: strip_line_breaks(&name.into()).into_owned(),
            value: strip_line_breaks(&value.into()).into_owned(),
            expires: expiry_from_now(days),
            is_new: true,
            path: None,
            http_only: false,
        }
    }

    /// Cookie received on an incoming request.
    pub(crate) fn incoming(name: &str, value: &str) -> Self {
        Self {
            is_new: false,
            ..Self::new(name, value)
        }
    }

    /// Replace the expiry timestamp (truncated to whole seconds).
    pub fn expires_at(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = truncate_to_seconds(expires);
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(strip_line_breaks(&path.into()).into_owned());
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub fn expires(&self) -> DateTime<Utc> {
        self.expires
    }

    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Value of a `Set-Cookie` header for this cookie.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        let mut out = format!(
            "{}={}; Expires={}",
            self.name,
            self.value,
            self.expires.format(EXPIRES_FORMAT)
        );
        if let Some(path) = &self.path {
            out.push_str("; Path=");
            out.push_str(path);
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        out
    }

    /// Parse a `Set-Cookie` header value produced by [`Cookie::to_header_value`].
    ///
    /// Unknown attributes are ignored. Returns `None` when the leading
    /// `name=value` pair is missing.
    #[must_use]
    pub fn parse_set_cookie(header_value: &str) -> Option<Self> {
        let mut parts = header_value.split("; ");
        let (name, value) = parts.next()?.split_once('=')?;
        if name.is_empty() {
            return None;
        }
        let mut cookie = Cookie::new(name, value);
        for attr in parts {
            let (key, val) = attr.split_once('=').unwrap_or((attr, ""));
            match key.to_ascii_lowercase().as_str() {
                "expires" => {
                    if let Ok(ts) = DateTime::parse_from_rfc2822(val) {
                        cookie.expires = ts.with_timezone(&Utc);
                    }
                }
                "path" => cookie.path = Some(val.to_string()),
                "httponly" => cookie.http_only = true,
                _ => {}
            }
        }
        Some(cookie)
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_header_value())
    }
}

fn truncate_to_seconds(ts: DateTime<Utc>) -> DateTime<Utc> {
    Utc.timestamp_opt(ts.timestamp(), 0).single().unwrap_or(ts)
}

fn expiry_from_now(days: u32) -> DateTime<Utc> {
    truncate_to_seconds(Utc::now() + Duration::days(i64::from(days)))
}

/// Cookies keyed by name; the first cookie added under a name wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `Cookie` request header value (`a=1; b=2`).
    ///
    /// Entries that do not split into exactly two parts on `=` are skipped, and
    /// later duplicates of an already-seen name are ignored.
    #[must_use]
    pub fn from_cookie_header(header_value: &str) -> Self {
        let mut jar = CookieJar::new();
        for entry in header_value.split("; ") {
            let parts: Vec<&str> = entry.split('=').collect();
            if let [name, value] = parts.as_slice() {
                jar.add(Cookie::incoming(name, value));
            }
        }
        jar
    }

    /// Add a cookie unless one with the same name is already present.
    ///
    /// Returns `true` if the cookie was stored.
    pub fn add(&mut self, cookie: Cookie) -> bool {
        if self.contains(cookie.name()) {
            return false;
        }
        self.cookies.push(cookie);
        true
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.cookies.iter().any(|c| c.name == name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.iter()
    }

    /// Cookies created during the current exchange.
    pub fn fresh(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.iter().filter(|c| c.is_new)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

impl<'a> IntoIterator for &'a CookieJar {
    type Item = &'a Cookie;
    type IntoIter = std::slice::Iter<'a, Cookie>;

    fn into_iter(self) -> Self::IntoIter {
        self.cookies.iter()
    }
}
