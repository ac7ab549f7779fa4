use crate::{
    capability::Capability,
    codec::{self, DAG_CBOR_CODEC, RAW_CODEC},
    crypto::{did::DidParser, Verifier},
    error::ParseError,
    jwt,
    principal::Principal,
    proof::Proof,
    time::now,
    varsig::Signature,
};
use anyhow::{anyhow, Result};
use cid::Cid;
use multihash_codetable::{Code, MultihashDigest};
use serde_json::{Map, Value};
use std::str::FromStr;

pub const UCAN_VERSION: &str = "0.9.1";

/// The signed fields of a UCAN
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Payload {
    pub v: String,
    pub iss: Principal,
    pub aud: Principal,
    pub att: Vec<Capability>,
    pub exp: Option<u64>,
    pub nbf: Option<u64>,
    pub nnc: Option<String>,
    pub fct: Vec<Value>,
    pub prf: Vec<Proof>,
}

/// A parsed, immutable UCAN.
///
/// Every UCAN has two interchangeable wire forms: the canonical DAG-CBOR
/// representation and the JWT compatibility representation. The JSON payload
/// of a JWT is signed as exact bytes by the issuer, so a token whose
/// canonical re-emission does not reproduce the original string retains the
/// original JWT verbatim; re-encoding it would change the signed payload.
/// That retention decides what [`Ucan::encode`], [`Ucan::format`] and
/// [`Ucan::to_cid`] produce.
#[derive(Clone, Debug, PartialEq)]
pub struct Ucan {
    payload: Payload,
    signature: Signature,
    jwt: Option<String>,
}

/// A UCAN serialized into its block form, addressed by CID
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UcanBlock {
    pub cid: Cid,
    pub bytes: Vec<u8>,
}

impl Ucan {
    pub(crate) fn new(payload: Payload, signature: Signature, jwt: Option<String>) -> Self {
        Ucan {
            payload,
            signature,
            jwt,
        }
    }

    pub(crate) fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Decode a UCAN from either of its wire forms: DAG-CBOR bytes, or a
    /// UTF-8 JWT string
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        match codec::decode(bytes) {
            Ok(ucan) => Ok(ucan),
            Err(_) => {
                let token = std::str::from_utf8(bytes).map_err(|_| {
                    anyhow!(ParseError::new(
                        "Invalid UCAN bytes, expected DAG-CBOR or a UTF-8 encoded JWT"
                    ))
                })?;
                Ucan::from_str(token)
            }
        }
    }

    /// The bytes of this UCAN in its wire form: the retained JWT string for
    /// non-canonical tokens, DAG-CBOR otherwise
    pub fn encode(&self) -> Result<Vec<u8>> {
        match &self.jwt {
            Some(jwt) => Ok(jwt.as_bytes().to_vec()),
            None => codec::encode(self),
        }
    }

    /// The JWT string for this UCAN; bit-exact with the original input for
    /// tokens that were retained rather than promoted to the canonical form
    pub fn format(&self) -> Result<String> {
        match &self.jwt {
            Some(jwt) => Ok(jwt.clone()),
            None => jwt::format(&self.payload, &self.signature),
        }
    }

    /// True when this UCAN is carried in its canonical DAG-CBOR
    /// representation; false when it retains original JWT bytes
    pub fn is_canonical(&self) -> bool {
        self.jwt.is_none()
    }

    /// The exact bytes the issuer signed: the base64url header and payload
    /// segments joined by `.`
    pub fn signed_data(&self) -> Result<Vec<u8>> {
        match &self.jwt {
            Some(jwt) => match jwt.rsplit_once('.') {
                Some((data, _)) => Ok(data.as_bytes().to_vec()),
                None => Err(anyhow!(ParseError::new(
                    "Retained JWT is missing its signature segment"
                ))),
            },
            None => Ok(jwt::format_sign_payload(&self.payload, &self.signature.algorithm()?)?
                .into_bytes()),
        }
    }

    /// Link to this UCAN as a CIDv1. The block codec follows the
    /// representation: DAG-CBOR for canonical tokens, raw for retained JWTs.
    /// Hashes with SHA-256 unless another hasher is given.
    pub fn to_cid(&self, hasher: Option<Code>) -> Result<Cid> {
        let hasher = hasher.unwrap_or(Code::Sha2_256);
        let codec = match &self.jwt {
            Some(_) => RAW_CODEC,
            None => DAG_CBOR_CODEC,
        };

        Ok(Cid::new_v1(codec, hasher.digest(&self.encode()?)))
    }

    /// Serialize this UCAN into an addressed block
    pub fn write(&self, hasher: Option<Code>) -> Result<UcanBlock> {
        Ok(UcanBlock {
            cid: self.to_cid(hasher)?,
            bytes: self.encode()?,
        })
    }

    /// True iff a verifier's DID matches this UCAN's issuer and the raw
    /// signature checks out over the signed data. Never errors; any failure
    /// to verify is a `false`.
    pub async fn verify_signature<V: Verifier>(&self, verifier: &V) -> bool {
        let did = match verifier.get_did().await {
            Ok(did) => did,
            Err(_) => return false,
        };

        if did != self.payload.iss.did() {
            return false;
        }

        let signed_data = match self.signed_data() {
            Ok(signed_data) => signed_data,
            Err(_) => return false,
        };

        verifier
            .verify(&signed_data, self.signature.raw())
            .await
            .is_ok()
    }

    /// Validate that the signed data was signed by the stated issuer
    pub async fn check_signature(&self, did_parser: &mut DidParser) -> Result<()> {
        let key = did_parser.parse(self.payload.iss.did())?;
        key.verify(&self.signed_data()?, self.signature.raw()).await
    }

    /// Validate the UCAN's signature and timestamps
    pub async fn validate(&self, now_time: Option<u64>, did_parser: &mut DidParser) -> Result<()> {
        if self.is_expired(now_time) {
            return Err(anyhow!("Expired"));
        }

        if self.is_too_early(now_time) {
            return Err(anyhow!("Not active yet (too early)"));
        }

        self.check_signature(did_parser).await
    }

    /// Returns true if the UCAN has past its expiration date; a UCAN without
    /// one never expires
    pub fn is_expired(&self, now_time: Option<u64>) -> bool {
        match self.payload.exp {
            Some(exp) => exp <= now_time.unwrap_or_else(now),
            None => false,
        }
    }

    /// Returns true if the not-before ("nbf") time is still in the future
    pub fn is_too_early(&self, now_time: Option<u64>) -> bool {
        match self.payload.nbf {
            Some(nbf) => now_time.unwrap_or_else(now) <= nbf,
            None => false,
        }
    }

    /// Returns true if this UCAN's lifetime begins no later than the other
    /// Note that if a UCAN specifies an NBF but the other does not, the
    /// other has an unbounded start time and this function will return
    /// false.
    pub fn lifetime_begins_before(&self, other: &Ucan) -> bool {
        match (self.payload.nbf, other.payload.nbf) {
            (Some(nbf), Some(other_nbf)) => nbf <= other_nbf,
            (Some(_), None) => false,
            _ => true,
        }
    }

    /// Returns true if this UCAN expires no earlier than the other
    pub fn lifetime_ends_after(&self, other: &Ucan) -> bool {
        match (self.payload.exp, other.payload.exp) {
            (Some(exp), Some(other_exp)) => exp >= other_exp,
            (Some(_), None) => false,
            (None, _) => true,
        }
    }

    /// Returns true if this UCAN's lifetime fully encompasses the other
    pub fn lifetime_encompasses(&self, other: &Ucan) -> bool {
        self.lifetime_begins_before(other) && self.lifetime_ends_after(other)
    }

    pub fn version(&self) -> &str {
        &self.payload.v
    }

    pub fn issuer(&self) -> &Principal {
        &self.payload.iss
    }

    pub fn audience(&self) -> &Principal {
        &self.payload.aud
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.payload.att
    }

    pub fn expires_at(&self) -> Option<u64> {
        self.payload.exp
    }

    pub fn not_before(&self) -> Option<u64> {
        self.payload.nbf
    }

    pub fn nonce(&self) -> Option<&str> {
        self.payload.nnc.as_deref()
    }

    pub fn facts(&self) -> &[Value] {
        &self.payload.fct
    }

    pub fn proofs(&self) -> &[Proof] {
        &self.payload.prf
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// A JSON projection of this UCAN: DIDs as strings, proofs as DAG-JSON
    /// links, the signature as DAG-JSON bytes. Empty `fct` and unset `nnc`
    /// and `nbf` are omitted.
    pub fn to_json(&self) -> Result<Value> {
        let mut object = Map::new();

        object.insert("v".into(), Value::from(self.payload.v.as_str()));
        object.insert("iss".into(), Value::from(self.payload.iss.did()));
        object.insert("aud".into(), Value::from(self.payload.aud.did()));
        object.insert("att".into(), serde_json::to_value(&self.payload.att)?);
        object.insert("exp".into(), serde_json::to_value(self.payload.exp)?);
        object.insert(
            "prf".into(),
            Value::from(
                self.payload
                    .prf
                    .iter()
                    .map(|proof| serde_json::json!({ "/": proof.to_string() }))
                    .collect::<Vec<Value>>(),
            ),
        );

        if !self.payload.fct.is_empty() {
            object.insert("fct".into(), Value::from(self.payload.fct.clone()));
        }

        if let Some(nonce) = &self.payload.nnc {
            object.insert("nnc".into(), Value::from(nonce.as_str()));
        }

        if let Some(not_before) = self.payload.nbf {
            object.insert("nbf".into(), serde_json::to_value(not_before)?);
        }

        object.insert("s".into(), self.signature.to_json());

        Ok(Value::Object(object))
    }
}

/// Parse an encoded UCAN token string. The parsed model is re-emitted
/// through the canonical formatter and compared with the input: a match
/// promotes the token to the canonical representation, a mismatch retains
/// the original string so that the signed bytes survive re-encoding.
impl FromStr for Ucan {
    type Err = anyhow::Error;

    fn from_str(token: &str) -> Result<Self> {
        let (payload, signature) = jwt::parse(token)?;
        let canonical = jwt::format(&payload, &signature)?;

        let jwt = match canonical == token {
            true => None,
            false => Some(token.to_owned()),
        };

        Ok(Ucan::new(payload, signature, jwt))
    }
}

/// Deserialize an encoded UCAN token string reference into a UCAN
impl<'a> TryFrom<&'a str> for Ucan {
    type Error = anyhow::Error;

    fn try_from(token: &str) -> Result<Self, Self::Error> {
        Ucan::from_str(token)
    }
}

/// Deserialize an encoded UCAN token string into a UCAN
impl TryFrom<String> for Ucan {
    type Error = anyhow::Error;

    fn try_from(token: String) -> Result<Self, Self::Error> {
        Ucan::from_str(token.as_str())
    }
}
