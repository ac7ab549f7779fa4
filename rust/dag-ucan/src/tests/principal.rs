use crate::{
    error::{ParseError, UnsupportedCodecError},
    principal::{Principal, P256_KEY_CODE},
    tests::helpers::dag_cbor_roundtrip,
};
use std::str::FromStr;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

#[cfg(target_arch = "wasm32")]
wasm_bindgen_test_configure!(run_in_browser);

fn key_bytes(code: u64, key: &[u8]) -> Vec<u8> {
    let mut code_buffer = unsigned_varint::encode::u64_buffer();
    let code_bytes = unsigned_varint::encode::u64(code, &mut code_buffer);
    [code_bytes, key].concat()
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[cfg_attr(not(target_arch = "wasm32"), test)]
fn it_round_trips_a_key_did() {
    let did_string = "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK";
    let principal = dag_cbor_roundtrip(&Principal::from_str(did_string).unwrap()).unwrap();
    assert_eq!(did_string, principal.to_string());
    assert_eq!(did_string, principal.did());
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[cfg_attr(not(target_arch = "wasm32"), test)]
fn it_round_trips_a_non_key_did() {
    let did_string = "did:web:example.com";
    let principal = dag_cbor_roundtrip(&Principal::from_str(did_string).unwrap()).unwrap();
    assert_eq!(did_string, principal.to_string());
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[cfg_attr(not(target_arch = "wasm32"), test)]
fn it_rejects_strings_that_are_not_dids() {
    let error = Principal::from_str("key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK")
        .unwrap_err();

    assert!(error.downcast_ref::<ParseError>().is_some());
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[cfg_attr(not(target_arch = "wasm32"), test)]
fn it_rejects_unknown_key_algorithms() {
    // 0x12 is sha2-256, not a key algorithm
    let error = Principal::try_from(key_bytes(0x12, &[0xff; 32])).unwrap_err();

    assert!(error.downcast_ref::<UnsupportedCodecError>().is_some());
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
#[cfg_attr(not(target_arch = "wasm32"), test)]
fn it_only_accepts_compressed_p256_keys() {
    let compressed = Principal::try_from(key_bytes(P256_KEY_CODE, &[0x02; 33])).unwrap();
    assert!(compressed.did().starts_with("did:key:z"));

    let error = Principal::try_from(key_bytes(P256_KEY_CODE, &[0x04; 65])).unwrap_err();
    assert!(error.downcast_ref::<UnsupportedCodecError>().is_some());
}
