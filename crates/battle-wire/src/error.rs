use thiserror::Error;

/// Failure to decode a datagram into a [`crate::Message`].
///
/// The codec never truncates or repairs a datagram; any schema violation is
/// reported here and the caller drops the datagram without acknowledging it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("datagram is not valid UTF-8")]
    NotUtf8,
    #[error("datagram has no message_type line")]
    MissingMessageType,
    #[error("unknown message_type '{0}'")]
    UnknownMessageType(String),
    #[error("message_type '{kind}' is missing required field '{field}'")]
    MissingField { kind: &'static str, field: &'static str },
    #[error("field '{field}' of message_type '{kind}' could not be parsed: '{value}'")]
    BadField {
        kind: &'static str,
        field: &'static str,
        value: String,
    },
}
