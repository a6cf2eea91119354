#![allow(dead_code)]

pub mod http {
    use ctrlrouter::server::{parse_response_head, ResponseHead};
    use ctrlrouter::Dispatcher;

    pub fn get(url: &str) -> String {
        format!("GET {url} HTTP/1.1\r\nHost: localhost\r\n\r\n")
    }

    pub fn get_with_cookie(url: &str, cookie: &str) -> String {
        format!("GET {url} HTTP/1.1\r\nHost: localhost\r\nCookie: {cookie}\r\n\r\n")
    }

    pub fn post_form(url: &str, body: &str) -> String {
        format!(
            "POST {url} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        )
    }

    /// Send raw text through the dispatcher and split the wire response.
    pub fn exchange(dispatcher: &Dispatcher, raw: &str) -> (ResponseHead, String) {
        let wire = dispatcher.handle_raw(raw.as_bytes());
        let head = parse_response_head(&wire).expect("well-formed response head");
        let text = String::from_utf8(wire).expect("utf-8 response");
        let body = text
            .split_once("\r\n\r\n")
            .map(|(_, b)| b.to_string())
            .unwrap_or_default();
        (head, body)
    }
}
