use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use serde_ipld_dagcbor::{from_slice, to_vec};

pub fn dag_cbor_roundtrip<T>(data: &T) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    Ok(from_slice(&to_vec(data)?)?)
}
