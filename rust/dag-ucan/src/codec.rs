use crate::{
    capability::Capability,
    error::ParseError,
    principal::Principal,
    proof::Proof,
    schema,
    ucan::{Payload, Ucan},
    varsig::Signature,
};
use anyhow::{anyhow, Result};
use serde::{de, Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Block codec for the canonical DAG-CBOR representation
pub const DAG_CBOR_CODEC: u64 = 0x71;
/// Block codec for tokens retained as their original JWT bytes
pub const RAW_CODEC: u64 = 0x55;

/// The DAG-CBOR shape of a signed UCAN. `exp` is always present, `null` for
/// tokens that never expire; `fct`, `nnc` and `nbf` are omitted entirely when
/// empty, to keep the encoding canonical.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct UcanIpld {
    pub v: String,
    pub iss: Principal,
    pub aud: Principal,
    pub att: Vec<Capability>,
    #[serde(deserialize_with = "deserialize_expiry", default)]
    pub exp: Option<u64>,
    #[serde(default)]
    pub prf: Vec<Proof>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub fct: Vec<Value>,
    #[serde(skip_serializing_if = "omit_nonce", default)]
    pub nnc: Option<String>,
    #[serde(skip_serializing_if = "omit_not_before", default)]
    pub nbf: Option<u64>,
    pub s: Signature,
}

fn omit_nonce(nonce: &Option<String>) -> bool {
    !matches!(nonce, Some(nonce) if !nonce.is_empty())
}

fn omit_not_before(not_before: &Option<u64>) -> bool {
    !matches!(not_before, Some(not_before) if *not_before > 0)
}

/// `exp` decodes from an integer, `null`, an absent field, or a non-finite
/// float; everything but an integer means the token never expires
fn deserialize_expiry<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct ExpiryVisitor;

    impl<'de> de::Visitor<'de> for ExpiryVisitor {
        type Value = Option<u64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer timestamp or null")
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(value))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            u64::try_from(value).map(Some).map_err(|_| {
                de::Error::custom(format!("Invalid 'exp' field, expected an unsigned integer timestamp, instead got {value}"))
            })
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if value.is_infinite() {
                Ok(None)
            } else {
                Err(de::Error::custom(format!(
                    "Invalid 'exp' field, expected an integer timestamp or null, instead got {value}"
                )))
            }
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
        where
            D: serde::Deserializer<'de>,
        {
            deserializer.deserialize_any(self)
        }
    }

    deserializer.deserialize_any(ExpiryVisitor)
}

impl From<&Ucan> for UcanIpld {
    fn from(ucan: &Ucan) -> Self {
        let payload = ucan.payload();

        UcanIpld {
            v: payload.v.clone(),
            iss: payload.iss.clone(),
            aud: payload.aud.clone(),
            att: payload.att.clone(),
            exp: payload.exp,
            prf: payload.prf.clone(),
            fct: payload.fct.clone(),
            nnc: payload.nnc.clone(),
            nbf: payload.nbf,
            s: ucan.signature().clone(),
        }
    }
}

impl TryFrom<UcanIpld> for Ucan {
    type Error = anyhow::Error;

    fn try_from(ipld: UcanIpld) -> Result<Self> {
        let mut payload = Payload {
            v: ipld.v,
            iss: ipld.iss,
            aud: ipld.aud,
            att: ipld.att,
            exp: ipld.exp,
            nbf: ipld.nbf,
            nnc: ipld.nnc,
            fct: ipld.fct,
            prf: ipld.prf,
        };

        schema::check_payload(&mut payload)?;

        Ok(Ucan::new(payload, ipld.s, None))
    }
}

/// DAG-CBOR encode the canonical representation of a UCAN
pub(crate) fn encode(ucan: &Ucan) -> Result<Vec<u8>> {
    Ok(serde_ipld_dagcbor::to_vec(&UcanIpld::from(ucan))?)
}

/// Decode DAG-CBOR bytes into a UCAN, validating the payload shape
pub(crate) fn decode(bytes: &[u8]) -> Result<Ucan> {
    let ipld: UcanIpld = serde_ipld_dagcbor::from_slice(bytes).map_err(|error| {
        anyhow!(ParseError::new(format!(
            "Invalid UCAN bytes, could not decode DAG-CBOR: {error}"
        )))
    })?;

    Ucan::try_from(ipld)
}
