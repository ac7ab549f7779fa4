use crate::{
    codec::RAW_CODEC,
    error::ParseError,
};
use anyhow::{anyhow, Result};
use cid::{serde::CID_SERDE_PRIVATE_IDENTIFIER, Cid};
use serde::{de, Deserialize, Serialize};
use std::{fmt, fmt::Display, str::FromStr};

pub const IDENTITY_MULTIHASH_CODE: u64 = 0x00;

/// A witnessing proof referenced by a UCAN. Most proofs are content-addressed
/// links to tokens stored elsewhere; a proof can also embed a token whole, in
/// which case it is addressed as a CIDv1 with the raw codec and an identity
/// multihash whose digest is the token bytes. Embedded tokens routinely
/// exceed the digest capacity of the fixed-size [`cid::Cid`], so they are a
/// first-class variant rather than a link.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Proof {
    Link(Cid),
    Inline(Vec<u8>),
}

impl Proof {
    /// The CIDv1 byte form of this proof: version, codec, multihash
    pub fn to_cid_bytes(&self) -> Vec<u8> {
        match self {
            Proof::Link(cid) => cid.to_bytes(),
            Proof::Inline(token) => {
                let mut size_buffer = unsigned_varint::encode::usize_buffer();
                let size_bytes = unsigned_varint::encode::usize(token.len(), &mut size_buffer);

                let mut bytes = vec![0x01, RAW_CODEC as u8, IDENTITY_MULTIHASH_CODE as u8];
                bytes.extend_from_slice(size_bytes);
                bytes.extend_from_slice(token);
                bytes
            }
        }
    }

    /// Reinterpret CIDv1 bytes as a proof. Identity-addressed raw blocks
    /// always classify as embedded tokens, whatever their size; everything
    /// else is a link.
    pub fn from_cid_bytes(bytes: &[u8]) -> Result<Self> {
        if let Some(proof) = parse_inline_cid(bytes) {
            return Ok(proof);
        }

        match Cid::read_bytes(bytes) {
            Ok(cid) => Ok(Proof::Link(cid)),
            Err(_) => Err(anyhow!(ParseError::new(
                "Invalid proof link, expected CID bytes or an identity-addressed token"
            ))),
        }
    }

    /// The embedded token bytes, when this proof inlines one
    pub fn inline_bytes(&self) -> Option<&[u8]> {
        match self {
            Proof::Link(_) => None,
            Proof::Inline(token) => Some(token),
        }
    }
}

fn parse_inline_cid(bytes: &[u8]) -> Option<Proof> {
    let (version, remainder) = unsigned_varint::decode::u64(bytes).ok()?;
    let (codec, remainder) = unsigned_varint::decode::u64(remainder).ok()?;
    let (multihash_code, remainder) = unsigned_varint::decode::u64(remainder).ok()?;
    let (digest_size, remainder) = unsigned_varint::decode::usize(remainder).ok()?;

    if version == 1
        && codec == RAW_CODEC
        && multihash_code == IDENTITY_MULTIHASH_CODE
        && remainder.len() == digest_size
    {
        Some(Proof::Inline(remainder.to_vec()))
    } else {
        None
    }
}

impl Display for Proof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Proof::Link(cid) => write!(f, "{cid}"),
            Proof::Inline(_) => write!(
                f,
                "{}",
                multibase::encode(multibase::Base::Base32Lower, self.to_cid_bytes())
            ),
        }
    }
}

/// Proof strings in a JWT payload are CIDs; a string that is not a CID is an
/// embedded token addressed by identity.
impl FromStr for Proof {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self> {
        if let Ok((_, bytes)) = multibase::decode(input) {
            if let Some(proof) = parse_inline_cid(&bytes) {
                return Ok(proof);
            }
        }

        if let Ok(cid) = Cid::try_from(input) {
            return Ok(Proof::Link(cid));
        }

        Ok(Proof::Inline(input.as_bytes().to_vec()))
    }
}

impl From<Cid> for Proof {
    fn from(cid: Cid) -> Self {
        Proof::Link(cid)
    }
}

impl Serialize for Proof {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        struct CidBytes(Vec<u8>);

        impl Serialize for CidBytes {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_bytes(&self.0)
            }
        }

        serializer.serialize_newtype_struct(CID_SERDE_PRIVATE_IDENTIFIER, &CidBytes(self.to_cid_bytes()))
    }
}

impl<'de> Deserialize<'de> for Proof {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ProofVisitor;

        impl<'de> de::Visitor<'de> for ProofVisitor {
            type Value = Proof;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a CID link")
            }

            fn visit_bytes<E>(self, value: &[u8]) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Proof::from_cid_bytes(value).map_err(de::Error::custom)
            }

            fn visit_byte_buf<E>(self, value: Vec<u8>) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                self.visit_bytes(&value)
            }

            fn visit_newtype_struct<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                deserializer.deserialize_bytes(self)
            }
        }

        deserializer.deserialize_newtype_struct(CID_SERDE_PRIVATE_IDENTIFIER, ProofVisitor)
    }
}
