use crate::{
    capability::Capability,
    error::ParseError,
    principal::Principal,
    proof::Proof,
    ucan::Payload,
};
use anyhow::{anyhow, Result};
use serde_json::{Map, Value};
use std::str::FromStr;

/// True for version strings of the form `<major>.<minor>.<patch>`
pub(crate) fn is_semantic_version(input: &str) -> bool {
    let mut segments = input.split('.');
    matches!(
        (segments.next(), segments.next(), segments.next(), segments.next()),
        (Some(major), Some(minor), Some(patch), None)
            if [major, minor, patch]
                .iter()
                .all(|segment| !segment.is_empty() && segment.bytes().all(|byte| byte.is_ascii_digit()))
    )
}

/// Resources of these forms delegate everything the issuer owns or is
/// delegated, and may only carry the all-abilities `*`
fn delegates_all(resource: &str) -> bool {
    resource == "my:*" || (resource.starts_with("as:did:") && resource.ends_with(":*"))
}

pub(crate) fn check_resource(resource: &str, index: usize) -> Result<()> {
    let scheme_is_valid = match resource.split_once(':') {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme.starts_with(|first: char| first.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    };

    if scheme_is_valid {
        Ok(())
    } else {
        Err(anyhow!(ParseError::new(format!(
            "Capability has invalid 'att[{index}].with: {}', value must be a valid URI string",
            Value::from(resource)
        ))))
    }
}

/// Normalize and check an ability against its resource. Abilities are
/// lowercased on every read path; resources are left untouched.
pub(crate) fn check_ability(resource: &str, ability: &str, index: usize) -> Result<String> {
    let ability = ability.to_lowercase();

    if delegates_all(resource) && ability != "*" {
        return Err(anyhow!(ParseError::new(format!(
            "Capability has invalid 'att[{index}].can: {}', for all 'my:*' or 'as:<did>:*' it must be '*'",
            Value::from(ability)
        ))));
    }

    if ability != "*" {
        let mut segments = ability.split('/');
        let shaped = segments.next().map_or(false, |segment| !segment.is_empty())
            && segments.next().map_or(false, |segment| !segment.is_empty());
        let empty_segment = ability.split('/').any(|segment| segment.is_empty());

        if !shaped || empty_segment {
            return Err(anyhow!(ParseError::new(format!(
                "Capability has invalid 'att[{index}].can: {}', value must be a namespaced action of form \"namespace/action\" or \"*\"",
                Value::from(ability)
            ))));
        }
    }

    Ok(ability)
}

/// Semantic checks over an assembled payload, shared by the JWT decode path,
/// the DAG-CBOR decode path and issuance. Normalizes abilities in place.
pub(crate) fn check_payload(payload: &mut Payload) -> Result<()> {
    if !is_semantic_version(&payload.v) {
        return Err(anyhow!(ParseError::new(format!(
            "Invalid 'v' field, expected a semantic version, instead got {}",
            Value::from(payload.v.as_str())
        ))));
    }

    if payload.att.is_empty() {
        return Err(anyhow!(ParseError::new(
            "Invalid 'att' field, expected at least one capability"
        )));
    }

    for (index, capability) in payload.att.iter_mut().enumerate() {
        check_resource(&capability.resource, index)?;
        capability.ability = check_ability(&capability.resource, &capability.ability, index)?;
    }

    for (index, fact) in payload.fct.iter().enumerate() {
        if !fact.is_object() {
            return Err(anyhow!(ParseError::new(format!(
                "Invalid 'fct[{index}]' element, expected an object, instead got {fact}"
            ))));
        }
    }

    Ok(())
}

/// Read and validate a decoded JWT payload into the internal model. The
/// version comes from the JWT header.
pub(crate) fn read_payload(source: &Value, version: String) -> Result<Payload> {
    let map = source.as_object().ok_or_else(|| {
        ParseError::new(format!(
            "Invalid UCAN payload, expected an object, instead got {source}"
        ))
    })?;

    let mut payload = Payload {
        v: version,
        iss: read_principal(map, "iss")?,
        aud: read_principal(map, "aud")?,
        att: read_capabilities(map.get("att"))?,
        exp: read_expiry(map.get("exp"))?,
        nbf: read_optional_integer(map, "nbf")?,
        nnc: read_optional_string(map, "nnc")?,
        fct: read_facts(map.get("fct"))?,
        prf: read_proofs(map.get("prf"))?,
    };

    check_payload(&mut payload)?;

    Ok(payload)
}

fn read_principal(map: &Map<String, Value>, key: &str) -> Result<Principal> {
    match map.get(key) {
        Some(Value::String(did)) => Principal::from_str(did)
            .map_err(|error| error.context(format!("Invalid '{key}' field"))),
        other => Err(anyhow!(ParseError::new(format!(
            "Invalid '{key}' field, expected a DID string, instead got {}",
            json_or_null(other)
        )))),
    }
}

fn read_capabilities(source: Option<&Value>) -> Result<Vec<Capability>> {
    let entries = match source {
        Some(Value::Array(entries)) => entries,
        other => {
            return Err(anyhow!(ParseError::new(format!(
                "Invalid 'att' field, expected an array of capabilities, instead got {}",
                json_or_null(other)
            ))))
        }
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| read_capability(entry, index))
        .collect()
}

fn read_capability(source: &Value, index: usize) -> Result<Capability> {
    let map = source.as_object().ok_or_else(|| {
        ParseError::new(format!(
            "Invalid 'att[{index}]' element, expected a capability object, instead got {source}"
        ))
    })?;

    let resource = match map.get("with") {
        Some(Value::String(resource)) => resource.clone(),
        other => {
            return Err(anyhow!(ParseError::new(format!(
                "Capability has invalid 'att[{index}].with: {}', value must be a string",
                json_or_null(other)
            ))))
        }
    };

    let ability = match map.get("can") {
        Some(Value::String(ability)) => ability.clone(),
        other => {
            return Err(anyhow!(ParseError::new(format!(
                "Capability has invalid 'att[{index}].can: {}', value must be a string",
                json_or_null(other)
            ))))
        }
    };

    let extra = map
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "with" | "can" | "nb"))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok(Capability {
        resource,
        ability,
        caveats: map.get("nb").cloned(),
        extra,
    })
}

/// `exp` may be an integer, `null`, or absent; the last two mean the token
/// never expires
fn read_expiry(source: Option<&Value>) -> Result<Option<u64>> {
    match source {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_u64().map(Some).ok_or_else(|| {
            anyhow!(ParseError::new(format!(
                "Invalid 'exp' field, expected an integer timestamp or null, instead got {value}"
            )))
        }),
    }
}

fn read_optional_integer(map: &Map<String, Value>, key: &str) -> Result<Option<u64>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_u64().map(Some).ok_or_else(|| {
            anyhow!(ParseError::new(format!(
                "Invalid '{key}' field, expected an integer, instead got {value}"
            )))
        }),
    }
}

fn read_optional_string(map: &Map<String, Value>, key: &str) -> Result<Option<String>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(value) => Err(anyhow!(ParseError::new(format!(
            "Invalid '{key}' field, expected a string, instead got {value}"
        )))),
    }
}

fn read_facts(source: Option<&Value>) -> Result<Vec<Value>> {
    match source {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(entries)) => Ok(entries.clone()),
        Some(value) => Err(anyhow!(ParseError::new(format!(
            "Invalid 'fct' field, expected an array of facts, instead got {value}"
        )))),
    }
}

fn read_proofs(source: Option<&Value>) -> Result<Vec<Proof>> {
    let entries = match source {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries,
        Some(value) => {
            return Err(anyhow!(ParseError::new(format!(
                "Invalid 'prf' field, expected an array of CID strings, instead got {value}"
            ))))
        }
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| match entry {
            Value::String(proof) => Proof::from_str(proof),
            other => Err(anyhow!(ParseError::new(format!(
                "Invalid 'prf[{index}]' element, expected a CID string, instead got {other}"
            )))),
        })
        .collect()
}

fn json_or_null(value: Option<&Value>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "null".to_string(),
    }
}
