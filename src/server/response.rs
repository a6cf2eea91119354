use http::StatusCode;

use super::cookies::{Cookie, CookieJar};
use super::headers::HeaderTable;
use super::request::HTTP_VERSION;

/// Reason phrase for the status line.
fn status_reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}

/// Outgoing HTTP response.
///
/// Created empty by the renderer, populated once, serialized once by
/// [`write_response`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    headers: HeaderTable,
    cookies: CookieJar,
    body: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}

impl Response {
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderTable::new(),
            cookies: CookieJar::new(),
            body: Vec::new(),
        }
    }

    /// HTML body with the given status.
    #[must_use]
    pub fn html(status: StatusCode, html: impl Into<String>) -> Self {
        let mut res = Self::new(status);
        res.headers.set("Content-Type", "text/html; charset=utf-8");
        res.set_body(html.into().into_bytes());
        res
    }

    /// `303 See Other` pointing at `location`, with an empty body.
    #[must_use]
    pub fn redirect(location: &str) -> Self {
        let mut res = Self::new(StatusCode::SEE_OTHER);
        res.headers.set("Location", location);
        res.set_body(Vec::new());
        res
    }

    /// A small HTML error page for the given status.
    #[must_use]
    pub fn error(status: StatusCode, message: &str) -> Self {
        let reason = status_reason(status);
        Self::html(
            status,
            format!(
                "<!DOCTYPE html><html><head><title>{} {reason}</title></head>\
                 <body><h1>{reason}</h1><p>{}</p></body></html>",
                status.as_u16(),
                escape_html(message)
            ),
        )
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderTable {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderTable {
        &mut self.headers
    }

    #[must_use]
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    pub fn add_cookie(&mut self, cookie: Cookie) -> bool {
        self.cookies.add(cookie)
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Replace the body and keep `Content-Length` in step with it.
    pub fn set_body(&mut self, body: Vec<u8>) {
        self.headers.set("Content-Length", body.len().to_string());
        self.body = body;
    }
}

/// Escape text interpolated into generated HTML.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize a response into wire bytes.
///
/// Emits the status line, the headers, one `Set-Cookie` line per cookie in the
/// jar, a blank line, then the body bytes untouched.
#[must_use]
pub fn write_response(res: &Response) -> Vec<u8> {
    let mut head = format!(
        "{HTTP_VERSION} {} {}\r\n{}",
        res.status.as_u16(),
        status_reason(res.status),
        res.headers
    );
    for cookie in &res.cookies {
        head.push_str("Set-Cookie: ");
        head.push_str(&cookie.to_header_value());
        head.push_str("\r\n");
    }
    head.push_str("\r\n");

    let mut bytes = Vec::with_capacity(head.len() + res.body.len());
    bytes.extend_from_slice(head.as_bytes());
    bytes.extend_from_slice(&res.body);
    bytes
}

/// Status, headers and cookies recovered from a serialized response head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: StatusCode,
    /// Headers other than `Set-Cookie`
    pub headers: HeaderTable,
    /// Cookies from `Set-Cookie` lines
    pub cookies: CookieJar,
}

/// Read back the head of a serialized response, ignoring the body.
///
/// Returns `None` when the status line or a header line is not well formed.
#[must_use]
pub fn parse_response_head(bytes: &[u8]) -> Option<ResponseHead> {
    let end = bytes
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .unwrap_or(bytes.len());
    let head = std::str::from_utf8(&bytes[..end]).ok()?;
    let mut lines = head.split("\r\n");

    let status_line = lines.next()?;
    let mut parts = status_line.splitn(3, ' ');
    if parts.next()? != HTTP_VERSION {
        return None;
    }
    let status = parts
        .next()?
        .parse::<u16>()
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())?;

    let mut headers = HeaderTable::new();
    let mut cookies = CookieJar::new();
    for line in lines.filter(|l| !l.is_empty()) {
        let (name, value) = line.split_once(": ")?;
        if name.eq_ignore_ascii_case("set-cookie") {
            cookies.add(Cookie::parse_set_cookie(value)?);
        } else {
            headers.append(name, value);
        }
    }
    Some(ResponseHead {
        status,
        headers,
        cookies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(StatusCode::OK), "OK");
        assert_eq!(status_reason(StatusCode::NOT_FOUND), "Not Found");
        assert_eq!(status_reason(StatusCode::SEE_OTHER), "See Other");
    }

    #[test]
    fn test_write_response_layout() {
        let mut res = Response::new(StatusCode::OK);
        res.headers_mut().append("X-Test", "1");
        res.set_body(b"hi".to_vec());
        let wire = String::from_utf8(write_response(&res)).unwrap();
        assert_eq!(wire, "HTTP/1.1 200 OK\r\nX-Test: 1\r\nContent-Length: 2\r\n\r\nhi");
    }

    #[test]
    fn test_body_bytes_are_not_reencoded() {
        let mut res = Response::new(StatusCode::OK);
        res.set_body(vec![0xff, 0x00, 0xfe]);
        let wire = write_response(&res);
        assert_eq!(&wire[wire.len() - 3..], &[0xff, 0x00, 0xfe]);
    }

    #[test]
    fn test_set_cookie_lines_follow_headers() {
        let mut res = Response::redirect("/home");
        res.add_cookie(Cookie::new("a", "1"));
        res.add_cookie(Cookie::new("b", "2"));
        let wire = String::from_utf8(write_response(&res)).unwrap();
        let location = wire.find("Location: /home").unwrap();
        let first_cookie = wire.find("Set-Cookie: a=1; Expires=").unwrap();
        let second_cookie = wire.find("Set-Cookie: b=2; Expires=").unwrap();
        assert!(location < first_cookie && first_cookie < second_cookie);
        assert!(wire.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_redirect_has_zero_content_length() {
        let res = Response::redirect("/home");
        assert_eq!(res.headers().get("Content-Length"), Some("0"));
        let wire = String::from_utf8(write_response(&res)).unwrap();
        assert_eq!(
            wire,
            "HTTP/1.1 303 See Other\r\nLocation: /home\r\nContent-Length: 0\r\n\r\n"
        );
    }

    #[test]
    fn test_redirect_location_cannot_split_the_head() {
        let res = Response::redirect("/home\r\nSet-Cookie: admin=1");
        let head = parse_response_head(&write_response(&res)).unwrap();
        assert!(head.cookies.is_empty());
        assert_eq!(&head.headers, res.headers());
        assert_eq!(head.headers.get("Location"), Some("/homeSet-Cookie: admin=1"));
    }

    #[test]
    fn test_round_trip_head() {
        let mut res = Response::html(StatusCode::UNAUTHORIZED, "<p>no</p>");
        res.add_cookie(Cookie::new("sid", "xyz"));
        let head = parse_response_head(&write_response(&res)).unwrap();
        assert_eq!(head.status, StatusCode::UNAUTHORIZED);
        assert_eq!(&head.headers, res.headers());
        assert_eq!(head.cookies.get("sid").map(Cookie::value), Some("xyz"));
    }

    #[test]
    fn test_error_page_escapes_message() {
        let res = Response::error(StatusCode::NOT_FOUND, "<script>");
        let body = String::from_utf8(res.body().to_vec()).unwrap();
        assert!(body.contains("&lt;script&gt;"));
        assert!(body.contains("404 Not Found"));
    }
}
