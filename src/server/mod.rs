//! Wire-level types: the request parser, the response writer and the
//! header/cookie containers they share, plus the session collaborator.

pub mod cookies;
pub mod headers;
pub mod request;
pub mod response;
pub mod session;

pub use cookies::{Cookie, CookieJar, DEFAULT_COOKIE_EXPIRY_DAYS};
pub use headers::HeaderTable;
pub use request::{parse_request, parse_request_bytes, ParamMap, Request};
pub use response::{parse_response_head, write_response, Response, ResponseHead};
pub use session::{Identity, InMemorySessionStore, Session, SessionStore};
