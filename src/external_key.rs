//! Alternate channels for carrying the session identifier

use salvo_core::http::header::{HeaderName, HeaderValue};
use salvo_core::{Request, Response};

/// Reads and writes the store identifier outside the session cookie.
///
/// When configured, commits never touch the session cookie: the identifier
/// is handed to [`ExternalKey::set`] instead.
pub trait ExternalKey: Send + Sync + 'static {
    /// Identifier sent by the client, if any
    fn get(&self, req: &Request) -> Option<String>;

    /// Hand a (possibly new) identifier back to the client
    fn set(&self, res: &mut Response, key: &str);
}

/// Carries the identifier in a request header and echoes it in a response header
#[derive(Clone, Debug)]
pub struct HeaderExternalKey {
    header: HeaderName,
}

impl HeaderExternalKey {
    /// Use the given header name, e.g. `x-session-id`
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }
}

impl ExternalKey for HeaderExternalKey {
    fn get(&self, req: &Request) -> Option<String> {
        req.headers()
            .get(&self.header)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn set(&self, res: &mut Response, key: &str) {
        match HeaderValue::from_str(key) {
            Ok(value) => {
                res.headers_mut().insert(self.header.clone(), value);
            }
            Err(e) => tracing::error!("Session identifier is not a valid header value: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_round_trip() {
        let key = HeaderExternalKey::new(HeaderName::from_static("x-session-id"));

        let mut res = Response::new();
        key.set(&mut res, "abc-123");
        assert_eq!(
            res.headers().get("x-session-id").and_then(|v| v.to_str().ok()),
            Some("abc-123")
        );

        let mut req = Request::new();
        assert_eq!(key.get(&req), None);
        req.headers_mut()
            .insert("x-session-id", HeaderValue::from_static("abc-123"));
        assert_eq!(key.get(&req), Some("abc-123".to_string()));
    }
}
