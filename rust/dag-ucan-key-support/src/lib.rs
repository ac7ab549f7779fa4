//! Concrete [`dag_ucan::crypto::Signer`] and [`dag_ucan::crypto::Verifier`]
//! implementations for the key algorithms most commonly found in `did:key`
//! issuers: Ed25519 and NIST P-256.

pub mod ed25519;
pub mod p256;
