pub mod account_key;
pub mod ed25519;
pub mod es256;
pub mod jws;

pub(crate) mod jwk;

pub use account_key::{AccountKey, GenerateAccountKey};

use ed25519::Ed25519AccountKey;
use es256::Es256AccountKey;

use crate::error::{AcmeError, AcmeResult};

/// Generate a fresh account key of the default type (P-256 ECDSA, the one
/// key type every public CA accepts).
pub fn generate_account_key() -> impl AccountKey {
    Es256AccountKey::generate()
}

/// Restore a previously exported account key from its private JWK.
pub fn account_key_from_jwk(jwk: impl AsRef<str>) -> AcmeResult<Box<dyn AccountKey>> {
    let jwk = jwk.as_ref();
    if let Ok(key) = Es256AccountKey::from_jwk(jwk) {
        Ok(Box::new(key))
    } else if let Ok(key) = Ed25519AccountKey::from_jwk(jwk) {
        Ok(Box::new(key))
    } else {
        Err(AcmeError::Crypto(anyhow::anyhow!(
            "couldn't decode account key from JWK"
        )))
    }
}
