use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::server::request::Request;

/// Header a client may use to supply its own exchange id.
pub const EXCHANGE_ID_HEADER: &str = "X-Request-Id";

/// Identifier correlating the log lines of one exchange, backed by a ULID.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct ExchangeId(ulid::Ulid);

impl ExchangeId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Reuse a valid ULID from the `X-Request-Id` header, or generate one.
    pub fn for_request(request: &Request) -> Self {
        request
            .headers()
            .get(EXCHANGE_ID_HEADER)
            .and_then(|s| s.parse::<ExchangeId>().ok())
            .unwrap_or_default()
    }

    /// Milliseconds since the epoch at which the id was minted.
    #[must_use]
    pub fn timestamp_ms(&self) -> u64 {
        self.0.timestamp_ms()
    }
}

impl Default for ExchangeId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ExchangeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl FromStr for ExchangeId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ulid::Ulid::from_string(s).map(ExchangeId)
    }
}

impl Serialize for ExchangeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
