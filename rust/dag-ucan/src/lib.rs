//! Implement UCAN-based authorization with conciseness and ease!
//!
//! [UCANs][UCAN docs] are an emerging pattern based on
//! [JSON Web Tokens][JWT docs] (aka JWTs) that facilitate distributed and/or
//! decentralized authorization flows in web applications. Visit
//! [https://ucan.xyz][UCAN docs] for an introduction to UCANs and ideas for
//! how you can use them in your application.
//!
//! This crate implements UCAN 0.9.x with two interchangeable wire
//! representations: the canonical [DAG-CBOR][UCAN-IPLD spec] form addressed
//! by a CID, and the compatibility JWT form carrying the exact token text
//! other UCAN implementations produce. A token parsed from a JWT either
//! round-trips losslessly through the canonical formatter (and is promoted
//! to the DAG-CBOR representation), or retains its original bytes so that
//! the signed payload survives re-encoding.
//!
//! # Examples
//!
//! This crate offers the [`builder::UcanBuilder`] abstraction to generate
//! signed UCAN tokens.
//!
//! To generate a signed token, you need to provide a [`crypto::Signer`]
//! implementation. For more information on providing a signing key, see the
//! [`crypto`] module documentation.
//!
//! ```rust
//! use dag_ucan::{
//!   builder::UcanBuilder,
//!   crypto::Signer,
//! };
//!
//! async fn generate_token<'a, K: Signer>(issuer_key: &'a K, audience_did: &'a str) -> Result<String, anyhow::Error> {
//!     UcanBuilder::default()
//!       .issued_by(issuer_key)
//!       .for_audience(audience_did)
//!       .claiming_capability(("mailto:alice@email.com", "msg/send"))
//!       .with_lifetime(60)
//!       .build()?
//!       .sign().await?
//!       .format()
//! }
//! ```
//!
//! Tokens received from elsewhere are decoded with [`Ucan::decode`] (either
//! wire form) or parsed from a JWT string:
//!
//! ```rust
//! use dag_ucan::Ucan;
//!
//! fn parse_token(token: &str) -> Result<Ucan, anyhow::Error> {
//!     Ucan::try_from(token)
//! }
//! ```
//!
//! Note that parsing performs structural validation only; checking the
//! signature requires a [`crypto::Verifier`] (or a
//! [`crypto::did::DidParser`] over `did:key` magic bytes), and capability
//! semantics are left to the caller.
//!
//! [JWT docs]: https://jwt.io/
//! [UCAN docs]: https://ucan.xyz/
//! [UCAN-IPLD spec]: https://github.com/ucan-wg/ucan-ipld/
//! [DID spec]: https://www.w3.org/TR/did-core/
//! [DID Key spec]: https://w3c-ccg.github.io/did-method-key/

pub mod builder;
pub mod capability;
pub mod codec;
pub mod crypto;
pub mod error;
pub mod key_material;
pub mod principal;
pub mod proof;
pub mod serde;
pub mod time;
pub mod ucan;
pub mod varsig;

mod jwt;
mod schema;

pub use self::ucan::{Ucan, UcanBlock, UCAN_VERSION};

/// The multicodec name of this codec
pub const NAME: &str = "dag-ucan";

/// The multicodec of the canonical representation; tokens retained as JWT
/// bytes link with [`codec::RAW_CODEC`] instead
pub const CODE: u64 = codec::DAG_CBOR_CODEC;

#[cfg(test)]
mod tests;
