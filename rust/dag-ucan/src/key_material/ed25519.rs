use crate::{
    crypto::{did::ED25519_MAGIC_BYTES, Signer, Verifier},
    varsig::VarsigPrefix,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ed25519_dalek::{
    Signature as Ed25519Signature, Signer as Ed25519Signer, SigningKey as Ed25519PrivateKey,
    VerifyingKey as Ed25519PublicKey,
};

pub fn bytes_to_ed25519_key(bytes: Vec<u8>) -> Result<Box<dyn Verifier>> {
    let public_key = Ed25519PublicKey::try_from(bytes.as_slice())?;
    Ok(Box::new(Ed25519KeyMaterial(public_key, None)))
}

#[derive(Clone)]
pub struct Ed25519KeyMaterial(pub Ed25519PublicKey, pub Option<Ed25519PrivateKey>);

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Verifier for Ed25519KeyMaterial {
    async fn get_did(&self) -> Result<String> {
        let bytes = [ED25519_MAGIC_BYTES, self.0.as_bytes().as_slice()].concat();
        Ok(format!("did:key:z{}", bs58::encode(bytes).into_string()))
    }

    async fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<()> {
        let signature = Ed25519Signature::try_from(signature)?;
        self.0
            .verify_strict(payload, &signature)
            .map_err(|error| anyhow!("Could not verify signature: {:?}", error))
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Signer for Ed25519KeyMaterial {
    fn get_jwt_algorithm_name(&self) -> String {
        VarsigPrefix::EdDSA.to_string()
    }

    async fn sign(&self, payload: &[u8]) -> Result<Vec<u8>> {
        match &self.1 {
            Some(private_key) => Ok(private_key.sign(payload).to_bytes().to_vec()),
            None => Err(anyhow!("No private key; cannot sign data")),
        }
    }
}
