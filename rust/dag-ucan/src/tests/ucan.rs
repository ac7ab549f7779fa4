mod parse {
    use crate::{
        builder::UcanBuilder,
        codec::RAW_CODEC,
        crypto::Signer,
        tests::fixtures::Identities,
        Ucan,
    };
    use anyhow::Result;
    use base64::Engine;
    use serde_json::{json, Value};

    #[cfg(target_arch = "wasm32")]
    use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

    #[cfg(target_arch = "wasm32")]
    wasm_bindgen_test_configure!(run_in_browser);

    fn base64_segment(value: &Value) -> String {
        base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode(serde_json::to_vec(value).unwrap())
    }

    async fn canonical_token(identities: &Identities) -> String {
        UcanBuilder::default()
            .issued_by(&identities.alice_key)
            .for_audience(identities.bob_did.as_str())
            .claiming_capability(("mailto:alice@email.com", "msg/send"))
            .with_lifetime(60)
            .build()
            .unwrap()
            .sign()
            .await
            .unwrap()
            .format()
            .unwrap()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_round_trips_its_own_tokens_bit_exactly() {
        let identities = Identities::new().await;
        let token = canonical_token(&identities).await;

        let ucan = Ucan::try_from(token.as_str()).unwrap();

        assert!(ucan.is_canonical());
        assert_eq!(ucan.format().unwrap(), token);

        let reparsed = Ucan::try_from(ucan.format().unwrap()).unwrap();
        assert_eq!(reparsed, ucan);
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_retains_foreign_tokens_with_unfamiliar_json_layout() -> Result<()> {
        let identities = Identities::new().await;
        let token = canonical_token(&identities).await;
        let segments: Vec<&str> = token.split('.').collect();

        // Re-serializing the payload sorts its keys, which is not the
        // canonical emission order. Sign the reordered segments so the token
        // is exactly what a library with that layout would have produced.
        let payload: Value = serde_json::from_slice(
            &base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(segments[1])?,
        )?;
        let signed_data = format!("{}.{}", segments[0], base64_segment(&payload));
        let signature = identities.alice_key.sign(signed_data.as_bytes()).await?;
        let foreign = format!(
            "{}.{}",
            signed_data,
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(signature)
        );
        assert_ne!(foreign, token);

        let ucan = Ucan::try_from(foreign.as_str())?;

        assert!(!ucan.is_canonical());
        assert_eq!(ucan.format()?, foreign);
        assert_eq!(ucan.encode()?, foreign.as_bytes());
        assert_eq!(ucan.to_cid(None)?.codec(), RAW_CODEC);

        // The signature is over the retained bytes, so it still verifies
        assert!(ucan.verify_signature(&identities.alice_key).await);
        assert!(!ucan.verify_signature(&identities.bob_key).await);

        Ok(())
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_retains_tokens_without_an_expiration_field() -> Result<()> {
        let identities = Identities::new().await;
        let token = canonical_token(&identities).await;
        let segments: Vec<&str> = token.split('.').collect();

        let mut payload: Value = serde_json::from_slice(
            &base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(segments[1])?,
        )?;
        payload.as_object_mut().unwrap().remove("exp");
        let foreign = format!(
            "{}.{}.{}",
            segments[0],
            base64_segment(&payload),
            segments[2]
        );

        let ucan = Ucan::try_from(foreign.as_str())?;

        assert_eq!(ucan.expires_at(), None);
        assert!(!ucan.is_canonical());
        assert_eq!(ucan.format()?, foreign);

        Ok(())
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_retains_tokens_with_uppercase_abilities() -> Result<()> {
        let identities = Identities::new().await;
        let token = canonical_token(&identities).await;
        let segments: Vec<&str> = token.split('.').collect();

        let payload: Value = serde_json::from_slice(
            &base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(segments[1])?,
        )?;
        let foreign_payload = json!({
            "iss": payload["iss"],
            "aud": payload["aud"],
            "att": [{ "with": "mailto:alice@email.com", "can": "MSG/SEND" }],
            "exp": payload["exp"],
            "prf": []
        });
        let foreign = format!(
            "{}.{}.{}",
            segments[0],
            base64_segment(&foreign_payload),
            segments[2]
        );

        let ucan = Ucan::try_from(foreign.as_str())?;

        assert_eq!(ucan.capabilities()[0].ability, "msg/send");
        assert!(!ucan.is_canonical());
        assert_eq!(ucan.format()?, foreign);

        Ok(())
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_rejects_headers_with_unknown_algorithms() {
        let identities = Identities::new().await;
        let token = canonical_token(&identities).await;
        let segments: Vec<&str> = token.split('.').collect();

        let tampered = format!(
            "{}.{}.{}",
            base64_segment(&json!({ "alg": "ed25519", "ucv": "0.9.1", "typ": "JWT" })),
            segments[1],
            segments[2]
        );

        let error = Ucan::try_from(tampered.as_str()).unwrap_err();

        assert!(error.to_string().contains("Header has invalid algorithm"));
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_rejects_tokens_that_are_not_three_segments() {
        let identities = Identities::new().await;
        let token = canonical_token(&identities).await;

        for bad_token in [
            "".to_string(),
            "one.two".to_string(),
            format!("{token}.extra"),
        ] {
            let error = Ucan::try_from(bad_token.as_str()).unwrap_err();
            assert!(error
                .to_string()
                .contains("3 dot-separated base64url-encoded values"));
        }
    }
}

mod validate {
    use crate::{
        builder::UcanBuilder,
        crypto::did::DidParser,
        tests::fixtures::{Identities, SUPPORTED_KEYS},
        time::now,
        Ucan,
    };

    #[cfg(target_arch = "wasm32")]
    use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

    #[cfg(target_arch = "wasm32")]
    wasm_bindgen_test_configure!(run_in_browser);

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_round_trips_with_encode() {
        let identities = Identities::new().await;
        let mut did_parser = DidParser::new(SUPPORTED_KEYS);

        let ucan = UcanBuilder::default()
            .issued_by(&identities.alice_key)
            .for_audience(identities.bob_did.as_str())
            .claiming_capability(("mailto:alice@email.com", "msg/send"))
            .with_lifetime(30)
            .build()
            .unwrap()
            .sign()
            .await
            .unwrap();

        let encoded_ucan = ucan.format().unwrap();
        let decoded_ucan = Ucan::try_from(encoded_ucan.as_str()).unwrap();

        decoded_ucan.validate(None, &mut did_parser).await.unwrap();
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_identifies_a_ucan_that_is_not_active_yet() {
        let identities = Identities::new().await;

        let ucan = UcanBuilder::default()
            .issued_by(&identities.alice_key)
            .for_audience(identities.bob_did.as_str())
            .claiming_capability(("mailto:alice@email.com", "msg/send"))
            .not_before(now() + 30)
            .with_lifetime(30)
            .build()
            .unwrap()
            .sign()
            .await
            .unwrap();

        assert!(ucan.is_too_early(None));
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_identifies_a_ucan_that_has_become_active() {
        let identities = Identities::new().await;
        let ucan = UcanBuilder::default()
            .issued_by(&identities.alice_key)
            .for_audience(identities.bob_did.as_str())
            .claiming_capability(("mailto:alice@email.com", "msg/send"))
            .not_before(now() - 120)
            .with_lifetime(30)
            .build()
            .unwrap()
            .sign()
            .await
            .unwrap();

        assert!(!ucan.is_too_early(None));
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_expires_exactly_at_its_expiration_time() {
        let identities = Identities::new().await;
        let ucan = UcanBuilder::default()
            .issued_by(&identities.alice_key)
            .for_audience(identities.bob_did.as_str())
            .claiming_capability(("mailto:alice@email.com", "msg/send"))
            .with_expiration(1000)
            .build()
            .unwrap()
            .sign()
            .await
            .unwrap();

        assert!(!ucan.is_expired(Some(999)));
        assert!(ucan.is_expired(Some(1000)));
        assert!(ucan.is_expired(Some(1001)));
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_is_too_early_up_to_and_including_its_activation_time() {
        let identities = Identities::new().await;
        let ucan = UcanBuilder::default()
            .issued_by(&identities.alice_key)
            .for_audience(identities.bob_did.as_str())
            .claiming_capability(("mailto:alice@email.com", "msg/send"))
            .not_before(1000)
            .with_expiration(2000)
            .build()
            .unwrap()
            .sign()
            .await
            .unwrap();

        assert!(ucan.is_too_early(Some(999)));
        assert!(ucan.is_too_early(Some(1000)));
        assert!(!ucan.is_too_early(Some(1001)));
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_never_expires_without_an_expiration() {
        let identities = Identities::new().await;
        let ucan = UcanBuilder::default()
            .issued_by(&identities.alice_key)
            .for_audience(identities.bob_did.as_str())
            .claiming_capability(("mailto:alice@email.com", "msg/send"))
            .never_expires()
            .build()
            .unwrap()
            .sign()
            .await
            .unwrap();

        assert_eq!(ucan.expires_at(), None);
        assert!(!ucan.is_expired(Some(u64::MAX)));
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn test_lifetime_ends_after() -> anyhow::Result<()> {
        let identities = Identities::new().await;
        let forever_ucan = UcanBuilder::default()
            .issued_by(&identities.alice_key)
            .for_audience(identities.bob_did.as_str())
            .claiming_capability(("mailto:alice@email.com", "msg/send"))
            .never_expires()
            .build()?
            .sign()
            .await?;
        let early_ucan = UcanBuilder::default()
            .issued_by(&identities.alice_key)
            .for_audience(identities.bob_did.as_str())
            .claiming_capability(("mailto:alice@email.com", "msg/send"))
            .with_lifetime(2000)
            .build()?
            .sign()
            .await?;
        let later_ucan = UcanBuilder::default()
            .issued_by(&identities.alice_key)
            .for_audience(identities.bob_did.as_str())
            .claiming_capability(("mailto:alice@email.com", "msg/send"))
            .with_lifetime(4000)
            .build()?
            .sign()
            .await?;

        assert_eq!(forever_ucan.expires_at(), None);
        assert!(forever_ucan.lifetime_ends_after(&early_ucan));
        assert!(!early_ucan.lifetime_ends_after(&forever_ucan));
        assert!(later_ucan.lifetime_ends_after(&early_ucan));
        assert!(forever_ucan.lifetime_encompasses(&early_ucan));

        Ok(())
    }
}

mod json {
    use crate::{builder::UcanBuilder, tests::fixtures::Identities};
    use serde_json::json;

    #[cfg(target_arch = "wasm32")]
    use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};

    #[cfg(target_arch = "wasm32")]
    wasm_bindgen_test_configure!(run_in_browser);

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_can_be_serialized_as_json() -> anyhow::Result<()> {
        let identities = Identities::new().await;

        let ucan = UcanBuilder::default()
            .issued_by(&identities.alice_key)
            .for_audience(identities.bob_did.as_str())
            .claiming_capability(("mailto:alice@email.com", "msg/send"))
            .with_expiration(10000000)
            .not_before(9999999)
            .with_nonce("1701")
            .with_fact(json!({ "challenge": "abc" }))
            .build()?
            .sign()
            .await?;

        let ucan_json = ucan.to_json()?;

        assert_eq!(
            ucan_json,
            json!({
                "v": "0.9.1",
                "iss": identities.alice_did,
                "aud": identities.bob_did,
                "att": [{
                    "with": "mailto:alice@email.com",
                    "can": "msg/send"
                }],
                "exp": 10000000,
                "prf": [],
                "fct": [{ "challenge": "abc" }],
                "nnc": "1701",
                "nbf": 9999999,
                "s": ucan.signature().to_json()
            })
        );

        Ok(())
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
    #[cfg_attr(not(target_arch = "wasm32"), tokio::test)]
    async fn it_can_be_serialized_as_json_without_optionals() -> anyhow::Result<()> {
        let identities = Identities::new().await;
        let ucan = UcanBuilder::default()
            .issued_by(&identities.alice_key)
            .for_audience(identities.bob_did.as_str())
            .claiming_capability(("mailto:alice@email.com", "msg/send"))
            .never_expires()
            .build()?
            .sign()
            .await?;

        let ucan_json = ucan.to_json()?;

        assert_eq!(
            ucan_json,
            json!({
                "v": "0.9.1",
                "iss": identities.alice_did,
                "aud": identities.bob_did,
                "att": [{
                    "with": "mailto:alice@email.com",
                    "can": "msg/send"
                }],
                "exp": null,
                "prf": [],
                "s": ucan.signature().to_json()
            })
        );

        Ok(())
    }
}
