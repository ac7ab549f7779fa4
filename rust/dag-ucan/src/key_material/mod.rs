#[cfg(any(test, feature = "ed25519"))]
pub mod ed25519;
