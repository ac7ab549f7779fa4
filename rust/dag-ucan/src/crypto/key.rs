use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[cfg(not(target_arch = "wasm32"))]
pub trait KeyConditionalSendSync: Send + Sync {}

#[cfg(not(target_arch = "wasm32"))]
impl<K> KeyConditionalSendSync for K where K: Send + Sync {}

#[cfg(target_arch = "wasm32")]
pub trait KeyConditionalSendSync {}

#[cfg(target_arch = "wasm32")]
impl<K> KeyConditionalSendSync for K {}

/// The verifying half of a cryptographic capability: something that has a
/// DID and can check a raw signature over a byte payload. Implementations
/// may be backed by asynchronous key stores, so both operations are
/// possibly-asynchronous.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait Verifier: KeyConditionalSendSync {
    /// Provides a valid DID that can be used to solve the key
    async fn get_did(&self) -> Result<String>;

    /// Verify the alleged signature of some data against this key
    async fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<()>;
}

/// The signing half of a cryptographic capability. Every signer can also
/// verify its own signatures.
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait Signer: Verifier {
    /// The algorithm that will be used to produce the signature returned by
    /// the sign method in this implementation
    fn get_jwt_algorithm_name(&self) -> String;

    /// Sign some data with this key
    async fn sign(&self, payload: &[u8]) -> Result<Vec<u8>>;
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl Verifier for Box<dyn Verifier> {
    async fn get_did(&self) -> Result<String> {
        self.as_ref().get_did().await
    }

    async fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<()> {
        self.as_ref().verify(payload, signature).await
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl<K> Verifier for Arc<K>
where
    K: Verifier,
{
    async fn get_did(&self) -> Result<String> {
        (**self).get_did().await
    }

    async fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<()> {
        (**self).verify(payload, signature).await
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl<K> Signer for Arc<K>
where
    K: Signer,
{
    fn get_jwt_algorithm_name(&self) -> String {
        (**self).get_jwt_algorithm_name()
    }

    async fn sign(&self, payload: &[u8]) -> Result<Vec<u8>> {
        (**self).sign(payload).await
    }
}
