use thiserror::Error;

/// Raised when a token, DID, capability or payload field fails shape
/// validation. The message names the offending field path (e.g. `att[0].can`)
/// and the offending value in JSON form.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{0}")]
pub struct ParseError(String);

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError(message.into())
    }
}

/// Raised when a multicodec tag falls outside the supported table: an unknown
/// signature algorithm code, an unknown `did:key` key algorithm, or an
/// uncompressed P-256 key.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("{0}")]
pub struct UnsupportedCodecError(String);

impl UnsupportedCodecError {
    pub fn new(message: impl Into<String>) -> Self {
        UnsupportedCodecError(message.into())
    }
}
