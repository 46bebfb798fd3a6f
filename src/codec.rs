//! Payload codecs used for cookie-embedded sessions

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::SessionError;
use crate::session::SessionData;

/// Turns a session payload into a cookie-safe string and back.
///
/// `decode` may fail freely: the session context treats every decode error
/// as "no session found" and never lets it reach the application.
pub trait SessionCodec: Send + Sync + 'static {
    /// Encode a payload into a string
    fn encode(&self, data: &SessionData) -> Result<String, SessionError>;

    /// Decode a string produced by [`SessionCodec::encode`]
    fn decode(&self, raw: &str) -> Result<SessionData, SessionError>;
}

/// Default codec: standard base64 of the JSON text
#[derive(Clone, Copy, Debug, Default)]
pub struct Base64JsonCodec;

impl SessionCodec for Base64JsonCodec {
    fn encode(&self, data: &SessionData) -> Result<String, SessionError> {
        let json = serde_json::to_string(data)?;
        Ok(STANDARD.encode(json.as_bytes()))
    }

    fn decode(&self, raw: &str) -> Result<SessionData, SessionError> {
        let bytes = STANDARD
            .decode(raw)
            .map_err(|e| SessionError::Serialization(e.to_string()))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
