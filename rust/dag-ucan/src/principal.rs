use crate::error::{ParseError, UnsupportedCodecError};
use anyhow::{anyhow, Result};
use serde::{de, Deserialize, Serialize};
use std::{fmt, fmt::Display, str::FromStr};

pub const DID_PREFIX: &str = "did:";
pub const DID_KEY_PREFIX: &str = "did:key:z";

/// Multicodec for DIDs that are not `did:key`; the bytes after the tag are
/// the UTF-8 method-plus-identifier suffix
pub const DID_CORE_CODE: u64 = 0x0d1d;

// Key algorithm multicodecs recognized in a `did:key` body
// See <https://github.com/multiformats/multicodec/blob/master/table.csv>
pub const SECP256K1_KEY_CODE: u64 = 0xe7;
pub const BLS12381G1_KEY_CODE: u64 = 0xea;
pub const BLS12381G2_KEY_CODE: u64 = 0xeb;
pub const ED25519_KEY_CODE: u64 = 0xed;
pub const P256_KEY_CODE: u64 = 0x1200;
pub const P384_KEY_CODE: u64 = 0x1201;
pub const P521_KEY_CODE: u64 = 0x1202;
pub const RSA_KEY_CODE: u64 = 0x1205;

/// A two-byte varint tag plus a 33-byte compressed point
const P256_COMPRESSED_SIZE: usize = 35;

/// A principal identified by a DID, held as its canonical byte form: a
/// varint multicodec key tag followed by the public key for `did:key`, or
/// the `did:` multicodec followed by the UTF-8 suffix for every other
/// method. The string form is computed once at construction.
#[derive(Clone, Eq, PartialEq)]
pub struct Principal {
    bytes: Vec<u8>,
    did: String,
}

impl Principal {
    /// The DID string for this principal
    pub fn did(&self) -> &str {
        &self.did
    }
}

impl TryFrom<Vec<u8>> for Principal {
    type Error = anyhow::Error;

    fn try_from(bytes: Vec<u8>) -> Result<Self> {
        let (code, remainder) = unsigned_varint::decode::u64(&bytes)
            .map_err(|error| anyhow!(ParseError::new(format!("Malformed DID bytes: {error}"))))?;

        let did = match code {
            DID_CORE_CODE => {
                let suffix = std::str::from_utf8(remainder)
                    .map_err(|_| ParseError::new("DID bytes are not UTF-8"))?;
                [DID_PREFIX, suffix].concat()
            }
            P256_KEY_CODE if bytes.len() > P256_COMPRESSED_SIZE => {
                return Err(anyhow!(UnsupportedCodecError::new(
                    "Only p256-pub compressed keys are supported"
                )))
            }
            SECP256K1_KEY_CODE | BLS12381G1_KEY_CODE | BLS12381G2_KEY_CODE | ED25519_KEY_CODE
            | P256_KEY_CODE | P384_KEY_CODE | P521_KEY_CODE | RSA_KEY_CODE => {
                [DID_KEY_PREFIX, &bs58::encode(&bytes).into_string()].concat()
            }
            _ => {
                return Err(anyhow!(UnsupportedCodecError::new(format!(
                    "Unsupported key algorithm with multicode {code:#x}"
                ))))
            }
        };

        Ok(Principal { bytes, did })
    }
}

impl FromStr for Principal {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self> {
        if let Some(encoded) = input.strip_prefix(DID_KEY_PREFIX) {
            let bytes = bs58::decode(encoded).into_vec().map_err(|error| {
                anyhow!(ParseError::new(format!(
                    "Invalid base58btc in DID \"{input}\": {error}"
                )))
            })?;
            Principal::try_from(bytes)
        } else if let Some(suffix) = input.strip_prefix(DID_PREFIX) {
            let mut code_buffer = unsigned_varint::encode::u64_buffer();
            let code_bytes = unsigned_varint::encode::u64(DID_CORE_CODE, &mut code_buffer);
            Principal::try_from([code_bytes, suffix.as_bytes()].concat())
        } else {
            Err(anyhow!(ParseError::new(format!(
                "Invalid DID \"{input}\", must start with 'did:'"
            ))))
        }
    }
}

impl Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.did)
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal({})", self.did)
    }
}

impl AsRef<[u8]> for Principal {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<&Principal> for Principal {
    fn from(value: &Principal) -> Self {
        value.to_owned()
    }
}

impl Serialize for Principal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.bytes)
    }
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct PrincipalVisitor;

        impl<'de> de::Visitor<'de> for PrincipalVisitor {
            type Value = Principal;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a multicodec-tagged DID byte string")
            }

            fn visit_bytes<E>(self, value: &[u8]) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Principal::try_from(value.to_vec()).map_err(de::Error::custom)
            }

            fn visit_byte_buf<E>(self, value: Vec<u8>) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Principal::try_from(value).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_bytes(PrincipalVisitor)
    }
}
