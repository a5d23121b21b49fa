//! Operation result payloads and their wire encoding.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

/// What an operation handler produces. Binary payloads are base64-encoded
/// when folded into a [`crate::ResponseEnvelope`].
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    /// Wire form of the payload: text verbatim, binary as base64.
    pub fn into_wire(self) -> String {
        match self {
            Payload::Text(s) => s,
            Payload::Binary(b) => BASE64.encode(b),
        }
    }

    /// Recover a binary payload from its wire form.
    pub fn decode_binary(wire: &str) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(wire)
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.into())
    }
}

impl From<Vec<u8>> for Payload {
    fn from(b: Vec<u8>) -> Self {
        Payload::Binary(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_round_trip_is_exact() {
        let bytes: Vec<u8> = (0..=255u8).collect();
        let wire = Payload::Binary(bytes.clone()).into_wire();
        assert_eq!(Payload::decode_binary(&wire).unwrap(), bytes);
    }

    #[test]
    fn text_passes_through_unchanged() {
        assert_eq!(Payload::from("hello").into_wire(), "hello");
    }
}
