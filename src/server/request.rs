use crate::error::MalformedRequest;
use http::Method;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info};

use super::cookies::CookieJar;
use super::headers::HeaderTable;
use super::session::Session;

/// The only protocol version accepted on the request line.
pub const HTTP_VERSION: &str = "HTTP/1.1";

/// Methods recognized on the request line (matched case-insensitively).
pub const SUPPORTED_METHODS: [Method; 8] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::OPTIONS,
    Method::HEAD,
    Method::TRACE,
];

/// Maximum number of query/form parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Ordered key → value mapping of decoded query or form parameters.
///
/// Keys are unique. Inserting an existing key replaces its value in place, so
/// the last write wins while iteration order stays that of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamMap {
    entries: ParamVec,
}

impl ParamMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k.as_ref() == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((Arc::from(key), value)),
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_ref() == key)
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A validated, structured HTTP request.
///
/// Immutable after parsing, except that a session collaborator may attach a
/// [`Session`] handle before dispatch.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: String,
    path: String,
    query: ParamMap,
    form: ParamMap,
    headers: HeaderTable,
    cookies: CookieJar,
    body: String,
    session: Option<Arc<Session>>,
}

impl Request {
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The raw URL from the request line.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The URL with any `?query` or `#fragment` suffix removed.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn query(&self) -> &ParamMap {
        &self.query
    }

    #[must_use]
    pub fn form(&self) -> &ParamMap {
        &self.form
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderTable {
        &self.headers
    }

    #[must_use]
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    /// Raw message body (the text after the first blank line).
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Look a parameter up in the query data first, then in the form data.
    #[inline]
    #[must_use]
    pub fn data(&self, name: &str) -> Option<&str> {
        self.query.get(name).or_else(|| self.form.get(name))
    }

    #[must_use]
    pub fn session(&self) -> Option<&Arc<Session>> {
        self.session.as_ref()
    }

    pub fn attach_session(&mut self, session: Arc<Session>) {
        self.session = Some(session);
    }
}

/// URL-decode a single query/form value (`+` is a space).
///
/// Invalid UTF-8 escapes are replaced rather than rejected.
#[must_use]
pub fn decode_component(value: &str) -> String {
    let spaced: Cow<'_, str> = if value.contains('+') {
        Cow::Owned(value.replace('+', " "))
    } else {
        Cow::Borrowed(value)
    };
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes()))
            .into_owned(),
    }
}

/// Split `a=1&b=2` into a [`ParamMap`].
///
/// Empty segments are skipped. Returns `None` when a non-empty segment has no
/// `=` or when no pair was found at all.
pub fn parse_url_encoded(input: &str) -> Option<ParamMap> {
    let mut params = ParamMap::new();
    for segment in input.split('&').filter(|s| !s.is_empty()) {
        let (key, value) = segment.split_once('=')?;
        params.insert(key, decode_component(value));
    }
    if params.is_empty() {
        None
    } else {
        Some(params)
    }
}

/// Parse the method token case-insensitively against [`SUPPORTED_METHODS`].
pub fn parse_method(token: &str) -> Result<Method, MalformedRequest> {
    let upper = token.to_ascii_uppercase();
    SUPPORTED_METHODS
        .iter()
        .find(|m| m.as_str() == upper)
        .cloned()
        .ok_or_else(|| MalformedRequest::UnknownMethod {
            method: token.to_string(),
        })
}

/// Path portion of a URL: everything before the first `?` or `#`.
#[must_use]
pub fn derive_path(url: &str) -> &str {
    url.find(['?', '#']).map_or(url, |idx| &url[..idx])
}

/// Query portion of a URL: between the first `?` and the following `#`.
fn query_string(url: &str) -> Option<&str> {
    let before_fragment = url.split('#').next().unwrap_or(url);
    before_fragment.split_once('?').map(|(_, q)| q)
}

/// Split the message at the first blank line into head and body.
fn split_head_body(raw: &str) -> (&str, &str) {
    let mut offset = 0;
    for line in raw.split_inclusive('\n') {
        let content = line.trim_end_matches(['\r', '\n']);
        if content.is_empty() && offset > 0 {
            return (&raw[..offset], &raw[offset + line.len()..]);
        }
        offset += line.len();
    }
    (raw, "")
}

fn is_form_content(headers: &HeaderTable) -> bool {
    headers.get("content-type").map_or(true, |ct| {
        ct.to_ascii_lowercase()
            .starts_with("application/x-www-form-urlencoded")
    })
}

/// Parse raw request bytes; the message must be valid UTF-8.
pub fn parse_request_bytes(raw: &[u8]) -> Result<Request, MalformedRequest> {
    let text = std::str::from_utf8(raw).map_err(|_| MalformedRequest::InvalidEncoding)?;
    parse_request(text)
}

/// Parse a raw textual HTTP/1.1 message into a [`Request`].
///
/// # Errors
///
/// Returns [`MalformedRequest`] when the request line is not exactly
/// `METHOD URL HTTP/1.1`, the method is unknown, a header line lacks `": "`,
/// the `Host` header is missing, or a present query string/form body cannot be
/// split into `key=value` pairs.
pub fn parse_request(raw: &str) -> Result<Request, MalformedRequest> {
    let (head, body) = split_head_body(raw);
    let mut lines = head.lines();

    let request_line = lines
        .next()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .ok_or(MalformedRequest::Empty)?;
    let tokens: Vec<&str> = request_line.split(' ').filter(|t| !t.is_empty()).collect();
    let [method_token, url, protocol] = tokens.as_slice() else {
        return Err(MalformedRequest::InvalidRequestLine {
            line: request_line.to_string(),
        });
    };
    if *protocol != HTTP_VERSION {
        return Err(MalformedRequest::UnsupportedProtocol {
            protocol: (*protocol).to_string(),
        });
    }
    let method = parse_method(method_token)?;
    let url = (*url).to_string();
    let path = derive_path(&url).to_string();

    let mut headers = HeaderTable::new();
    for line in lines {
        let (name, value) = line
            .split_once(": ")
            .filter(|(name, _)| !name.is_empty())
            .ok_or_else(|| MalformedRequest::InvalidHeader {
                line: line.to_string(),
            })?;
        headers.append(name, value);
    }
    debug!(
        header_count = headers.len(),
        header_names = ?headers.iter().map(|(k, _)| k).take(20).collect::<Vec<_>>(),
        "Headers extracted"
    );
    if !headers.contains("Host") {
        return Err(MalformedRequest::MissingHost);
    }

    let cookies = headers
        .get("cookie")
        .map(CookieJar::from_cookie_header)
        .unwrap_or_default();
    debug!(cookie_count = cookies.len(), "Cookies extracted");

    let query = match query_string(&url).filter(|q| !q.is_empty()) {
        Some(q) => parse_url_encoded(q).ok_or_else(|| MalformedRequest::InvalidQuery {
            query: q.to_string(),
        })?,
        None => ParamMap::new(),
    };
    debug!(param_count = query.len(), "Query params parsed");

    let form_source = body.trim_end_matches(['\r', '\n']);
    let form = if !form_source.is_empty() && is_form_content(&headers) {
        parse_url_encoded(form_source).ok_or_else(|| MalformedRequest::InvalidForm {
            body: form_source.to_string(),
        })?
    } else {
        ParamMap::new()
    };
    debug!(
        param_count = form.len(),
        body_size_bytes = body.len(),
        "Form data parsed"
    );

    info!(
        method = %method,
        path = %path,
        headers_count = headers.len(),
        "HTTP request parsed"
    );

    Ok(Request {
        method,
        url,
        path,
        query,
        form,
        headers,
        cookies,
        body: body.to_string(),
        session: None,
    })
}
