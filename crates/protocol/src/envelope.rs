//! RPC request and response envelopes.

use serde::{Deserialize, Serialize};

use crate::UNSUPPORTED_PAYLOAD;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Request
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One RPC request: operation name plus an argument shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    pub method: String,
    #[serde(default)]
    pub args: RequestArgs,
}

/// The three wire shapes arguments arrive in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestArgs {
    /// `"args": null` or the field missing entirely.
    #[default]
    None,
    /// A single scalar, passed as the one positional argument.
    Scalar(String),
    /// An ordered list, spread positionally.
    List(Vec<String>),
}

impl RequestEnvelope {
    pub fn new(method: impl Into<String>, args: RequestArgs) -> Self {
        Self { method: method.into(), args }
    }

    pub fn decode(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    pub fn encode(&self) -> Vec<u8> {
        // Serialization of these envelopes cannot fail.
        serde_json::to_vec(self).expect("request envelope serializes")
    }
}

impl RequestArgs {
    /// Normalize to a positional argument list: absent → 0 args, scalar →
    /// 1 arg, list → spread. An empty scalar or list counts as zero-arg,
    /// so `method()` and `method("")` invoke the same form.
    pub fn normalize(self) -> Vec<String> {
        match self {
            RequestArgs::None => Vec::new(),
            RequestArgs::Scalar(s) if s.is_empty() => Vec::new(),
            RequestArgs::Scalar(s) => vec![s],
            RequestArgs::List(v) => v,
        }
    }
}

impl From<Vec<String>> for RequestArgs {
    fn from(v: Vec<String>) -> Self {
        RequestArgs::List(v)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Response
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One RPC response. Field declaration order is the wire order and is kept
/// alphabetical so serialization is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Echoed operation name from the request.
    pub request: String,
    pub result: ResultStatus,
    /// Textual payload; binary results are base64-encoded before embedding.
    pub result_data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Pass,
    Fail,
    Exception,
}

impl ResponseEnvelope {
    pub fn pass(request: impl Into<String>, result_data: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            result: ResultStatus::Pass,
            result_data: result_data.into(),
        }
    }

    /// The fixed reply for an operation outside the exposed set.
    pub fn unsupported(request: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            result: ResultStatus::Fail,
            result_data: UNSUPPORTED_PAYLOAD.into(),
        }
    }

    /// An EXCEPTION reply carrying a structured [`WireError`] payload.
    pub fn exception(request: impl Into<String>, error: WireError) -> Self {
        Self {
            request: request.into(),
            result: ResultStatus::Exception,
            result_data: serde_json::to_string(&error).expect("wire error serializes"),
        }
    }

    /// Parse the structured error out of an EXCEPTION payload, if present.
    pub fn wire_error(&self) -> Option<WireError> {
        if self.result != ResultStatus::Exception {
            return None;
        }
        serde_json::from_str(&self.result_data).ok()
    }

    pub fn decode(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("response envelope serializes")
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Structured errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Closed error classification carried inside EXCEPTION payloads, so
/// callers branch on `kind` instead of parsing message text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireError {
    pub kind: WireErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireErrorKind {
    /// Malformed request envelope.
    Decode,
    /// Operation not exposed and not a recognized alias.
    UnknownOperation,
    /// An exposed operation raised a fault.
    Handler,
    /// Alias resolution failed: unknown alias, absent target, or argument
    /// count mismatch.
    Alias,
    /// Broker unreachable or a publish failed.
    Connectivity,
    /// A deadline expired while waiting for a reply.
    Timeout,
}

impl WireError {
    pub fn new(kind: WireErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }
}

impl From<&sy_domain::Error> for WireError {
    fn from(err: &sy_domain::Error) -> Self {
        use sy_domain::Error as E;
        let kind = match err {
            E::Decode(_) | E::Json(_) => WireErrorKind::Decode,
            E::UnknownOperation(_) => WireErrorKind::UnknownOperation,
            E::Handler(_) => WireErrorKind::Handler,
            E::Alias(_) => WireErrorKind::Alias,
            E::Broker(_) | E::Io(_) => WireErrorKind::Connectivity,
            E::Timeout(_) => WireErrorKind::Timeout,
            E::Config(_) | E::Other(_) => WireErrorKind::Handler,
        };
        Self::new(kind, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_field_order_is_deterministic() {
        let resp = ResponseEnvelope::pass("echo", "hi");
        let json = String::from_utf8(resp.encode()).unwrap();
        assert_eq!(
            json,
            r#"{"request":"echo","result":"pass","result_data":"hi"}"#
        );
    }

    #[test]
    fn args_decode_all_three_shapes() {
        let none: RequestEnvelope = serde_json::from_str(r#"{"method":"m"}"#).unwrap();
        assert_eq!(none.args, RequestArgs::None);

        let null: RequestEnvelope =
            serde_json::from_str(r#"{"method":"m","args":null}"#).unwrap();
        assert_eq!(null.args, RequestArgs::None);

        let scalar: RequestEnvelope =
            serde_json::from_str(r#"{"method":"m","args":"x"}"#).unwrap();
        assert_eq!(scalar.args, RequestArgs::Scalar("x".into()));

        let list: RequestEnvelope =
            serde_json::from_str(r#"{"method":"m","args":["a","b"]}"#).unwrap();
        assert_eq!(list.args, RequestArgs::List(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn normalize_shapes() {
        assert!(RequestArgs::None.normalize().is_empty());
        assert!(RequestArgs::Scalar(String::new()).normalize().is_empty());
        assert_eq!(RequestArgs::Scalar("x".into()).normalize(), vec!["x"]);
        assert_eq!(
            RequestArgs::List(vec!["a".into(), "b".into(), "c".into()]).normalize(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn wire_error_round_trips_through_exception() {
        let resp = ResponseEnvelope::exception(
            "op",
            WireError::new(WireErrorKind::Alias, "service gone"),
        );
        let err = resp.wire_error().unwrap();
        assert_eq!(err.kind, WireErrorKind::Alias);
        assert_eq!(err.message, "service gone");

        // PASS responses never yield a structured error.
        assert!(ResponseEnvelope::pass("op", "data").wire_error().is_none());
    }
}
