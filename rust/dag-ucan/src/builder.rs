use crate::{
    capability::Capability,
    crypto::Signer,
    jwt, schema,
    principal::Principal,
    proof::Proof,
    time::now,
    ucan::{Payload, Ucan, UCAN_VERSION},
    varsig::Signature,
};
use anyhow::{anyhow, Result};
use base64::Engine;
use multihash_codetable::Code;
use log::warn;
use rand::Rng;
use serde::Serialize;
use std::str::FromStr;

/// Tokens issued without an explicit expiration live this long, in seconds
pub const DEFAULT_LIFETIME: u64 = 30;

/// A signable is a UCAN that has all the state it needs in order to be
/// signed, but has not yet been signed.
pub struct Signable<'a, K>
where
    K: Signer,
{
    pub issuer: &'a K,
    pub audience: String,

    pub capabilities: Vec<Capability>,

    pub expiration: Option<u64>,
    pub not_before: Option<u64>,

    pub facts: Vec<serde_json::Value>,
    pub proofs: Vec<Proof>,
    pub nonce: Option<String>,
}

impl<'a, K> Signable<'a, K>
where
    K: Signer,
{
    /// Validate the payload, compose the signing bytes, and ask the issuer
    /// to sign them. The result is always in the canonical representation:
    /// its JWT form is exactly what was signed.
    pub async fn sign(&self) -> Result<Ucan> {
        let mut payload = Payload {
            v: UCAN_VERSION.into(),
            iss: Principal::from_str(&self.issuer.get_did().await?)?,
            aud: Principal::from_str(&self.audience)?,
            att: self.capabilities.clone(),
            exp: self.expiration,
            nbf: self.not_before,
            nnc: self.nonce.clone(),
            fct: self.facts.clone(),
            prf: self.proofs.clone(),
        };

        schema::check_payload(&mut payload)?;

        let algorithm = self.issuer.get_jwt_algorithm_name();
        let data_to_sign = jwt::format_sign_payload(&payload, &algorithm)?.into_bytes();
        let signature = self.issuer.sign(&data_to_sign).await?;

        Ok(Ucan::new(
            payload,
            Signature::create_named(&algorithm, &signature),
            None,
        ))
    }
}

/// A builder API for UCAN tokens
#[derive(Clone)]
pub struct UcanBuilder<'a, K>
where
    K: Signer,
{
    issuer: Option<&'a K>,
    audience: Option<String>,

    capabilities: Vec<Capability>,

    lifetime: Option<u64>,
    expiration: Option<u64>,
    never_expires: bool,
    not_before: Option<u64>,

    facts: Vec<serde_json::Value>,
    proofs: Vec<Proof>,
    nonce: Option<String>,
    add_nonce: bool,
}

impl<'a, K> Default for UcanBuilder<'a, K>
where
    K: Signer,
{
    /// Create an empty builder.
    /// Before finalising the builder, you need to at least call:
    ///
    /// - `issued_by`
    /// - `for_audience` and
    /// - `claiming_capability`
    ///
    /// To finalise the builder, call its `build` method.
    fn default() -> Self {
        UcanBuilder {
            issuer: None,
            audience: None,

            capabilities: Vec::new(),

            lifetime: None,
            expiration: None,
            never_expires: false,
            not_before: None,

            facts: Vec::new(),
            proofs: Vec::new(),
            nonce: None,
            add_nonce: false,
        }
    }
}

impl<'a, K> UcanBuilder<'a, K>
where
    K: Signer,
{
    /// The UCAN must be signed with the private key of the issuer to be valid.
    pub fn issued_by(mut self, issuer: &'a K) -> Self {
        self.issuer = Some(issuer);
        self
    }

    /// This is the identity this UCAN transfers rights to.
    ///
    /// It could e.g. be the DID of a service you're posting this UCAN as a JWT to,
    /// or it could be the DID of something that'll use this UCAN as a proof to
    /// continue the UCAN chain as an issuer.
    pub fn for_audience(mut self, audience: &str) -> Self {
        self.audience = Some(String::from(audience));
        self
    }

    /// The number of seconds into the future (relative to when build() is
    /// invoked) to set the expiration. This is ignored if an explicit
    /// expiration is set. When neither is set, tokens live for
    /// [`DEFAULT_LIFETIME`] seconds.
    pub fn with_lifetime(mut self, seconds: u64) -> Self {
        self.lifetime = Some(seconds);
        self
    }

    /// Set the POSIX timestamp (in seconds) for when the UCAN should expire.
    /// Setting this value overrides a configured lifetime value.
    pub fn with_expiration(mut self, timestamp: u64) -> Self {
        self.expiration = Some(timestamp);
        self
    }

    /// Issue a token that never expires. This overrides any expiration or
    /// lifetime configured via [`UcanBuilder::with_expiration`] or
    /// [`UcanBuilder::with_lifetime`].
    pub fn never_expires(mut self) -> Self {
        self.never_expires = true;
        self
    }

    /// Set the POSIX timestamp (in seconds) of when the UCAN becomes active.
    pub fn not_before(mut self, timestamp: u64) -> Self {
        self.not_before = Some(timestamp);
        self
    }

    /// Add a fact or proof of knowledge to this UCAN. Facts are opaque JSON
    /// objects.
    pub fn with_fact<T: Serialize>(mut self, fact: T) -> Self {
        match serde_json::to_value(fact) {
            Ok(value) => self.facts.push(value),
            Err(error) => warn!("Could not add fact to UCAN: {}", error),
        }
        self
    }

    /// Use the given string as the UCAN's number used once.
    pub fn with_nonce(mut self, nonce: &str) -> Self {
        self.nonce = Some(nonce.to_owned());
        self
    }

    /// Will ensure that the built UCAN includes a randomly generated number
    /// used once.
    pub fn with_generated_nonce(mut self) -> Self {
        self.add_nonce = true;
        self
    }

    /// Includes a UCAN in the list of proofs for the UCAN to be built.
    /// Note that the proof's audience must match this UCAN's issuer
    /// or else the proof chain will be invalidated!
    /// The proof is linked by CID, hashed via the
    /// [UcanBuilder::default_hasher()] algorithm unless one is provided.
    pub fn witnessed_by(mut self, authority: &Ucan, hasher: Option<Code>) -> Self {
        match authority.to_cid(Some(hasher.unwrap_or_else(|| UcanBuilder::<K>::default_hasher()))) {
            Ok(proof) => self.proofs.push(Proof::Link(proof)),
            Err(error) => warn!("Failed to add authority to proofs: {}", error),
        }

        self
    }

    /// Embeds a UCAN whole in the list of proofs, addressed by an identity
    /// multihash of its encoded bytes rather than stored out of band.
    pub fn witnessed_inline(mut self, authority: &Ucan) -> Self {
        match authority.encode() {
            Ok(token) => self.proofs.push(Proof::Inline(token)),
            Err(error) => warn!("Failed to add authority to proofs: {}", error),
        }

        self
    }

    /// Claim a capability by inheritance (from an authorizing proof) or
    /// implicitly by ownership of the resource by this UCAN's issuer
    pub fn claiming_capability<C>(mut self, capability: C) -> Self
    where
        C: Into<Capability>,
    {
        self.capabilities.push(capability.into());
        self
    }

    /// Claim capabilities by inheritance (from an authorizing proof) or
    /// implicitly by ownership of the resource by this UCAN's issuer
    pub fn claiming_capabilities<C>(mut self, capabilities: &[C]) -> Self
    where
        C: Into<Capability> + Clone,
    {
        let capabilities: Vec<Capability> = capabilities
            .iter()
            .map(|capability| <C as Into<Capability>>::into(capability.to_owned()))
            .collect();
        self.capabilities.extend(capabilities);
        self
    }

    /// Returns the default hasher ([Code::Sha2_256]) used for [cid::Cid]
    /// encodings.
    pub fn default_hasher() -> Code {
        Code::Sha2_256
    }

    fn implied_expiration(&self) -> Option<u64> {
        if self.never_expires {
            None
        } else if self.expiration.is_some() {
            self.expiration
        } else {
            Some(now() + self.lifetime.unwrap_or(DEFAULT_LIFETIME))
        }
    }

    fn implied_nonce(&self) -> Option<String> {
        match (&self.nonce, self.add_nonce) {
            (Some(nonce), _) => Some(nonce.clone()),
            (None, true) => Some(
                base64::engine::general_purpose::URL_SAFE_NO_PAD
                    .encode(rand::thread_rng().gen::<[u8; 32]>()),
            ),
            (None, false) => None,
        }
    }

    pub fn build(self) -> Result<Signable<'a, K>> {
        match &self.issuer {
            Some(issuer) => match &self.audience {
                Some(audience) => Ok(Signable {
                    issuer,
                    audience: audience.clone(),
                    not_before: self.not_before,
                    expiration: self.implied_expiration(),
                    nonce: self.implied_nonce(),
                    facts: self.facts.clone(),
                    capabilities: self.capabilities.clone(),
                    proofs: self.proofs.clone(),
                }),
                None => Err(anyhow!("Missing audience")),
            },
            None => Err(anyhow!("Missing issuer")),
        }
    }
}
