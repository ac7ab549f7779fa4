use anyhow::{anyhow, Result};
use async_trait::async_trait;

use p256::ecdsa::{
    self,
    signature::{Signer as EcdsaSigner, Verifier as EcdsaVerifier},
    Signature, SigningKey as P256PrivateKey, VerifyingKey as P256PublicKey,
};

use dag_ucan::crypto::{Signer, Verifier};

pub use dag_ucan::{crypto::did::P256_MAGIC_BYTES, varsig::VarsigPrefix};

pub fn bytes_to_p256_key(bytes: Vec<u8>) -> Result<Box<dyn Verifier>> {
    let public_key = P256PublicKey::try_from(bytes.as_slice())?;
    Ok(Box::new(P256KeyMaterial(public_key, None)))
}

/// Support for NIST P-256 keys, aka secp256r1, aka ES256
#[derive(Clone)]
pub struct P256KeyMaterial(pub P256PublicKey, pub Option<P256PrivateKey>);

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Verifier for P256KeyMaterial {
    async fn get_did(&self) -> Result<String> {
        let bytes = [P256_MAGIC_BYTES, &self.0.to_encoded_point(true).to_bytes()].concat();
        Ok(format!("did:key:z{}", bs58::encode(bytes).into_string()))
    }

    async fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<()> {
        let signature = Signature::try_from(signature)?;
        self.0
            .verify(payload, &signature)
            .map_err(|error| anyhow!("Could not verify signature: {:?}", error))
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl Signer for P256KeyMaterial {
    fn get_jwt_algorithm_name(&self) -> String {
        VarsigPrefix::ES256.to_string()
    }

    async fn sign(&self, payload: &[u8]) -> Result<Vec<u8>> {
        match self.1 {
            Some(ref private_key) => {
                let signature: ecdsa::Signature = private_key.sign(payload);
                Ok(signature.to_vec())
            }
            None => Err(anyhow!("No private key; cannot sign data")),
        }
    }
}
