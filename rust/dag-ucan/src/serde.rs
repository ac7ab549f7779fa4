use anyhow::Result;
use base64::Engine;
use serde::Serialize;

/// Helper trait to encode structs as base64url-encoded JSON as part of
/// creating a JWT. The JSON bytes come straight from `serde_json`, so serde
/// struct field order is what fixes the canonical key order of the emitted
/// segments.
pub trait Base64Encode: Serialize {
    fn jwt_base64_encode(&self) -> Result<String> {
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(serde_json::to_vec(self)?))
    }
}

impl<T> Base64Encode for T where T: Serialize {}
