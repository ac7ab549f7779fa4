use crate::{
    crypto::Verifier,
    error::{ParseError, UnsupportedCodecError},
};
use anyhow::{anyhow, Result};
use base64::Engine;
use serde::{de, Deserialize, Serialize};
use serde_json::{json, Value};
use std::{fmt, str::FromStr};
use strum_macros::{Display, EnumString};

// See <https://github.com/ucan-wg/ucan-ipld#25-signature>
// See <https://github.com/multiformats/unsigned-varint>
pub const NONSTANDARD_VARSIG_PREFIX: u64 = 0xd000;
pub const ES256K_VARSIG_PREFIX: u64 = 0xd0e7;
pub const BLS12381G1_VARSIG_PREFIX: u64 = 0xd0ea;
pub const BLS12381G2_VARSIG_PREFIX: u64 = 0xd0eb;
pub const EDDSA_VARSIG_PREFIX: u64 = 0xd0ed;
pub const EIP191_VARSIG_PREFIX: u64 = 0xd191;
pub const ES256_VARSIG_PREFIX: u64 = 0xd01200;
pub const ES384_VARSIG_PREFIX: u64 = 0xd01201;
pub const ES512_VARSIG_PREFIX: u64 = 0xd01202;
pub const RS256_VARSIG_PREFIX: u64 = 0xd01205;

/// The table of recognized signature algorithms. The string form of each
/// standard variant is the JWT `alg` header name; `NonStandard` covers every
/// algorithm outside the table and carries its name in the envelope instead.
#[derive(Clone, Copy, Debug, Display, EnumString, Eq, PartialEq)]
pub enum VarsigPrefix {
    NonStandard,
    ES256K,
    BLS12381G1,
    BLS12381G2,
    EdDSA,
    EIP191,
    ES256,
    ES384,
    ES512,
    RS256,
}

impl VarsigPrefix {
    /// Look up a standard algorithm by its JWT name; `None` for anything
    /// outside the table (including the literal string "NonStandard")
    pub fn named(name: &str) -> Option<VarsigPrefix> {
        match VarsigPrefix::from_str(name) {
            Ok(VarsigPrefix::NonStandard) | Err(_) => None,
            Ok(prefix) => Some(prefix),
        }
    }
}

impl From<VarsigPrefix> for u64 {
    fn from(value: VarsigPrefix) -> Self {
        match value {
            VarsigPrefix::NonStandard => NONSTANDARD_VARSIG_PREFIX,
            VarsigPrefix::ES256K => ES256K_VARSIG_PREFIX,
            VarsigPrefix::BLS12381G1 => BLS12381G1_VARSIG_PREFIX,
            VarsigPrefix::BLS12381G2 => BLS12381G2_VARSIG_PREFIX,
            VarsigPrefix::EdDSA => EDDSA_VARSIG_PREFIX,
            VarsigPrefix::EIP191 => EIP191_VARSIG_PREFIX,
            VarsigPrefix::ES256 => ES256_VARSIG_PREFIX,
            VarsigPrefix::ES384 => ES384_VARSIG_PREFIX,
            VarsigPrefix::ES512 => ES512_VARSIG_PREFIX,
            VarsigPrefix::RS256 => RS256_VARSIG_PREFIX,
        }
    }
}

impl TryFrom<u64> for VarsigPrefix {
    type Error = UnsupportedCodecError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Ok(match value {
            NONSTANDARD_VARSIG_PREFIX => VarsigPrefix::NonStandard,
            ES256K_VARSIG_PREFIX => VarsigPrefix::ES256K,
            BLS12381G1_VARSIG_PREFIX => VarsigPrefix::BLS12381G1,
            BLS12381G2_VARSIG_PREFIX => VarsigPrefix::BLS12381G2,
            EDDSA_VARSIG_PREFIX => VarsigPrefix::EdDSA,
            EIP191_VARSIG_PREFIX => VarsigPrefix::EIP191,
            ES256_VARSIG_PREFIX => VarsigPrefix::ES256,
            ES384_VARSIG_PREFIX => VarsigPrefix::ES384,
            ES512_VARSIG_PREFIX => VarsigPrefix::ES512,
            RS256_VARSIG_PREFIX => VarsigPrefix::RS256,
            _ => {
                return Err(UnsupportedCodecError::new(format!(
                    "Unknown signature algorithm code {value:#x}"
                )))
            }
        })
    }
}

/// A self-describing signature envelope: a varint algorithm code, a varint
/// length, the raw signature bytes and, for `NonStandard` algorithms only, a
/// trailing UTF-8 algorithm name.
///
/// The algorithm code is not checked when reinterpreting bytes via
/// [`Signature::decode`]; [`Signature::algorithm`] validates it lazily.
#[derive(Clone, Eq, PartialEq)]
pub struct Signature {
    bytes: Vec<u8>,
    code: u64,
    raw_offset: usize,
    raw_size: usize,
}

impl Signature {
    /// Wrap raw signature bytes in an envelope for one of the standard
    /// algorithm codes. `NonStandard` is rejected here; it only makes sense
    /// together with a name, via [`Signature::create_named`].
    pub fn create(code: u64, raw: &[u8]) -> Result<Self> {
        match VarsigPrefix::try_from(code) {
            Ok(VarsigPrefix::NonStandard) => Err(anyhow!(UnsupportedCodecError::new(format!(
                "Algorithm code {code:#x} carries no name; create the signature from its algorithm name instead"
            )))),
            Ok(_) => Ok(Signature::envelope(code, raw, None)),
            Err(error) => Err(anyhow!(error)),
        }
    }

    /// Wrap raw signature bytes in an envelope for a named algorithm. Names
    /// outside the standard table produce a `NonStandard` envelope with the
    /// name appended after the signature bytes.
    pub fn create_named(name: &str, raw: &[u8]) -> Self {
        match VarsigPrefix::named(name) {
            Some(prefix) => Signature::envelope(prefix.into(), raw, None),
            None => Signature::envelope(NONSTANDARD_VARSIG_PREFIX, raw, Some(name)),
        }
    }

    fn envelope(code: u64, raw: &[u8], name: Option<&str>) -> Self {
        let mut code_buffer = unsigned_varint::encode::u64_buffer();
        let code_bytes = unsigned_varint::encode::u64(code, &mut code_buffer);
        let mut size_buffer = unsigned_varint::encode::usize_buffer();
        let size_bytes = unsigned_varint::encode::usize(raw.len(), &mut size_buffer);

        let raw_offset = code_bytes.len() + size_bytes.len();
        let bytes = match name {
            Some(name) => [code_bytes, size_bytes, raw, name.as_bytes()].concat(),
            None => [code_bytes, size_bytes, raw].concat(),
        };

        Signature {
            bytes,
            code,
            raw_offset,
            raw_size: raw.len(),
        }
    }

    /// Reinterpret bytes as a signature envelope. Only the envelope structure
    /// is checked here; the algorithm code is validated lazily by
    /// [`Signature::algorithm`].
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let (code, remainder) = unsigned_varint::decode::u64(bytes)
            .map_err(|error| anyhow!(ParseError::new(format!("Malformed signature envelope: {error}"))))?;
        let (raw_size, remainder) = unsigned_varint::decode::usize(remainder)
            .map_err(|error| anyhow!(ParseError::new(format!("Malformed signature envelope: {error}"))))?;

        if remainder.len() < raw_size {
            return Err(anyhow!(ParseError::new(format!(
                "Malformed signature envelope: {raw_size} signature bytes declared, {} available",
                remainder.len()
            ))));
        }

        Ok(Signature {
            bytes: bytes.to_vec(),
            code,
            raw_offset: bytes.len() - remainder.len(),
            raw_size,
        })
    }

    /// The signature algorithm multicodec carried by the envelope
    pub fn code(&self) -> u64 {
        self.code
    }

    /// The length of the raw signature, in bytes
    pub fn size(&self) -> usize {
        self.raw_size
    }

    /// The raw signature bytes, without the envelope
    pub fn raw(&self) -> &[u8] {
        &self.bytes[self.raw_offset..self.raw_offset + self.raw_size]
    }

    /// The full envelope bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The JWT name of the signature algorithm. For `NonStandard` envelopes
    /// the name is read from the envelope tail; unknown codes are an error.
    pub fn algorithm(&self) -> Result<String> {
        match VarsigPrefix::try_from(self.code)? {
            VarsigPrefix::NonStandard => {
                let name = &self.bytes[self.raw_offset + self.raw_size..];
                if name.is_empty() {
                    Err(anyhow!(ParseError::new(
                        "Signature envelope is missing its algorithm name"
                    )))
                } else {
                    Ok(std::str::from_utf8(name)
                        .map_err(|_| {
                            ParseError::new("Signature envelope algorithm name is not UTF-8")
                        })?
                        .to_string())
                }
            }
            prefix => Ok(prefix.to_string()),
        }
    }

    /// Ask a verifier to check this signature over the given payload
    pub async fn verify<V: Verifier>(&self, verifier: &V, payload: &[u8]) -> Result<()> {
        verifier.verify(payload, self.raw()).await
    }

    /// The envelope as a base64url string
    pub fn format(&self) -> String {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&self.bytes)
    }

    /// Parse an envelope from its base64url form
    pub fn parse(input: &str) -> Result<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input)
            .map_err(|error| {
                anyhow!(ParseError::new(format!(
                    "Could not decode signature base64: {error}"
                )))
            })?;
        Signature::decode(&bytes)
    }

    /// The DAG-JSON form of the envelope: `{"/": {"bytes": "<base64>"}}`
    pub fn to_json(&self) -> Value {
        json!({
            "/": {
                "bytes": base64::engine::general_purpose::STANDARD_NO_PAD.encode(&self.bytes)
            }
        })
    }

    /// Read an envelope back from its DAG-JSON form
    pub fn from_json(value: &Value) -> Result<Self> {
        let encoded = value
            .get("/")
            .and_then(|slash| slash.get("bytes"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                anyhow!(ParseError::new(format!(
                    "Invalid signature JSON, expected {{\"/\": {{\"bytes\": ...}}}}, instead got {value}"
                )))
            })?;
        let bytes = base64::engine::general_purpose::STANDARD_NO_PAD
            .decode(encoded)
            .map_err(|error| {
                anyhow!(ParseError::new(format!(
                    "Could not decode signature base64: {error}"
                )))
            })?;
        Signature::decode(&bytes)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("code", &format_args!("{:#x}", self.code))
            .field("size", &self.raw_size)
            .finish()
    }
}

impl Serialize for Signature {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.bytes)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct SignatureVisitor;

        impl<'de> de::Visitor<'de> for SignatureVisitor {
            type Value = Signature;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a varsig byte string")
            }

            fn visit_bytes<E>(self, value: &[u8]) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Signature::decode(value).map_err(de::Error::custom)
            }

            fn visit_byte_buf<E>(self, value: Vec<u8>) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                self.visit_bytes(&value)
            }
        }

        deserializer.deserialize_bytes(SignatureVisitor)
    }
}
