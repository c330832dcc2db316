use std::sync::Arc;

use rand::{CryptoRng, RngCore};
use signature::rand_core::OsRng;
use zeroize::Zeroizing;

use super::jwk;
use super::jws::JwsSigner;

/// An ACME account key pair.
///
/// The session signs every request with one of these; applications persist
/// it between runs via [`private_jwk`](AccountKey::private_jwk) and restore
/// it with [`account_key_from_jwk`](crate::crypto::account_key_from_jwk).
pub trait AccountKey: JwsSigner + Send + Sync + std::fmt::Debug {
    /// The private key as a JWK, for persistence. Zeroized on drop.
    fn private_jwk(&self) -> anyhow::Result<Zeroizing<String>>;

    /// The public key as a JWK, as embedded in `newAccount` requests.
    fn public_jwk(&self) -> anyhow::Result<String>;

    /// RFC 7638 thumbprint of the public key, base64url-encoded. This is
    /// the second half of every key authorization.
    fn thumbprint(&self) -> anyhow::Result<String> {
        jwk::thumbprint(&self.public_jwk()?)
    }
}

pub trait GenerateAccountKey: AccountKey + Sized {
    fn generate_rng(rng: impl CryptoRng + RngCore) -> Self;

    fn generate() -> Self {
        Self::generate_rng(OsRng)
    }
}

impl JwsSigner for Box<dyn AccountKey> {
    fn jws_alg(&self) -> &str {
        self.as_ref().jws_alg()
    }

    fn jws_sign(&self, input: &[u8]) -> Vec<u8> {
        self.as_ref().jws_sign(input)
    }
}

impl AccountKey for Box<dyn AccountKey> {
    fn private_jwk(&self) -> anyhow::Result<Zeroizing<String>> {
        self.as_ref().private_jwk()
    }

    fn public_jwk(&self) -> anyhow::Result<String> {
        self.as_ref().public_jwk()
    }
}

impl JwsSigner for Arc<dyn AccountKey> {
    fn jws_alg(&self) -> &str {
        self.as_ref().jws_alg()
    }

    fn jws_sign(&self, input: &[u8]) -> Vec<u8> {
        self.as_ref().jws_sign(input)
    }
}

impl AccountKey for Arc<dyn AccountKey> {
    fn private_jwk(&self) -> anyhow::Result<Zeroizing<String>> {
        self.as_ref().private_jwk()
    }

    fn public_jwk(&self) -> anyhow::Result<String> {
        self.as_ref().public_jwk()
    }
}
