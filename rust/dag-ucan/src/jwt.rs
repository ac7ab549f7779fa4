use crate::{
    capability::Capability,
    error::ParseError,
    schema,
    serde::Base64Encode,
    ucan::Payload,
    varsig::{Signature, VarsigPrefix},
};
use anyhow::{anyhow, Result};
use base64::Engine;
use serde::Serialize;
use serde_json::Value;

/// JWT header in canonical key order
#[derive(Serialize)]
struct Header<'a> {
    alg: &'a str,
    ucv: &'a str,
    typ: &'a str,
}

/// JWT payload in canonical key order: `iss`, `aud`, `att`, `exp`, `prf`
/// always (with `exp` as `null` for tokens that never expire), then `fct`,
/// `nnc`, `nbf` only when populated
#[derive(Serialize)]
struct PayloadJson<'a> {
    iss: &'a str,
    aud: &'a str,
    att: &'a Vec<Capability>,
    exp: Option<u64>,
    prf: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fct: Option<&'a Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nnc: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nbf: Option<u64>,
}

impl<'a> From<&'a Payload> for PayloadJson<'a> {
    fn from(payload: &'a Payload) -> Self {
        PayloadJson {
            iss: payload.iss.did(),
            aud: payload.aud.did(),
            att: &payload.att,
            exp: payload.exp,
            prf: payload.prf.iter().map(|proof| proof.to_string()).collect(),
            fct: match payload.fct.is_empty() {
                true => None,
                false => Some(&payload.fct),
            },
            nnc: match &payload.nnc {
                Some(nonce) if !nonce.is_empty() => Some(nonce),
                _ => None,
            },
            nbf: match payload.nbf {
                Some(not_before) if not_before > 0 => Some(not_before),
                _ => None,
            },
        }
    }
}

/// The base64url header and payload segments joined by `.`; these are the
/// exact bytes an issuer signs
pub(crate) fn format_sign_payload(payload: &Payload, algorithm: &str) -> Result<String> {
    let header = Header {
        alg: algorithm,
        ucv: &payload.v,
        typ: "JWT",
    };

    Ok(format!(
        "{}.{}",
        header.jwt_base64_encode()?,
        PayloadJson::from(payload).jwt_base64_encode()?
    ))
}

/// Re-emit a model as its canonical JWT string
pub(crate) fn format(payload: &Payload, signature: &Signature) -> Result<String> {
    Ok(format!(
        "{}.{}",
        format_sign_payload(payload, &signature.algorithm()?)?,
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(signature.raw())
    ))
}

/// Parse a JWT string into the internal model, validating the header and
/// running the payload through the schema
pub(crate) fn parse(token: &str) -> Result<(Payload, Signature)> {
    let mut segments = token.split('.');

    let (header, payload, signature) = match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some(header), Some(payload), Some(signature), None) => (header, payload, signature),
        _ => {
            return Err(anyhow!(ParseError::new(
                "Expected JWT format: 3 dot-separated base64url-encoded values"
            )))
        }
    };

    let header = decode_json_segment(header, "header")?;
    let algorithm = read_algorithm(&header)?;
    let version = read_version(&header)?;
    read_type(&header)?;

    let payload = decode_json_segment(payload, "payload")?;
    let payload = schema::read_payload(&payload, version)?;

    let signature_bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|error| {
            anyhow!(ParseError::new(format!(
                "Could not decode UCAN signature base64: {error}"
            )))
        })?;

    Ok((payload, Signature::create_named(&algorithm, &signature_bytes)))
}

fn decode_json_segment(segment: &str, name: &str) -> Result<Value> {
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|error| {
            anyhow!(ParseError::new(format!(
                "Could not decode UCAN {name} base64: {error}"
            )))
        })?;

    serde_json::from_slice(&bytes).map_err(|error| {
        anyhow!(ParseError::new(format!(
            "Could not parse UCAN {name} JSON: {error}"
        )))
    })
}

fn read_algorithm(header: &Value) -> Result<String> {
    match header.get("alg") {
        Some(Value::String(algorithm)) if VarsigPrefix::named(algorithm).is_some() => {
            Ok(algorithm.clone())
        }
        other => Err(anyhow!(ParseError::new(format!(
            "Header has invalid algorithm 'alg: {}'",
            json_or_null(other)
        )))),
    }
}

fn read_version(header: &Value) -> Result<String> {
    match header.get("ucv") {
        Some(Value::String(version)) if schema::is_semantic_version(version) => {
            Ok(version.clone())
        }
        other => Err(anyhow!(ParseError::new(format!(
            "Header has invalid version 'ucv: {}'",
            json_or_null(other)
        )))),
    }
}

fn read_type(header: &Value) -> Result<()> {
    match header.get("typ") {
        Some(Value::String(typ)) if typ == "JWT" => Ok(()),
        other => Err(anyhow!(ParseError::new(format!(
            "Header has invalid type 'typ: {}'",
            json_or_null(other)
        )))),
    }
}

fn json_or_null(value: Option<&Value>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "null".to_string(),
    }
}
