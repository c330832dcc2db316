use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

use crate::base64url;
use crate::crypto::jws::{jws_flattened, JwsHeader, JwsSigner};
use crate::error::{AcmeError, AcmeResult};

/// Credentials a CA hands out for binding a new ACME account to an existing
/// customer account: a key identifier plus a base64url-encoded MAC key.
#[derive(Clone, Debug)]
pub struct EabCredentials {
    pub key_identifier: String,
    pub hmac_key: String,
}

struct HmacSigner(Vec<u8>);

impl JwsSigner for HmacSigner {
    fn jws_alg(&self) -> &str {
        "HS256"
    }

    fn jws_sign(&self, input: &[u8]) -> Vec<u8> {
        let mut mac =
            Hmac::<Sha256>::new_from_slice(&self.0).expect("HMAC accepts any key length");
        mac.update(input);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Build the `externalAccountBinding` member of a newAccount request: a JWS
/// over the account's public JWK, signed with the CA-provided MAC key and
/// bound to the newAccount URL.
pub(crate) fn external_account_binding(
    credentials: &EabCredentials,
    account_public_jwk: &str,
    new_account_url: &str,
) -> AcmeResult<Value> {
    let signer = HmacSigner(decode_hmac_key(&credentials.hmac_key)?);
    let header = JwsHeader {
        alg: signer.jws_alg(),
        nonce: None,
        url: new_account_url,
        jwk: None::<()>,
        kid: Some(&credentials.key_identifier),
    };
    let jws = jws_flattened(&signer, &header, account_public_jwk.as_bytes())
        .map_err(AcmeError::Crypto)?;
    Ok(serde_json::to_value(jws)?)
}

/// CAs hand the MAC key out base64url-encoded, but some portals display the
/// standard alphabet with padding; accept both.
fn decode_hmac_key(encoded: &str) -> AcmeResult<Vec<u8>> {
    base64url::decode(encoded)
        .or_else(|_| base64::decode(encoded))
        .map_err(|err| AcmeError::Crypto(anyhow::anyhow!("invalid EAB MAC key: {err}")))
}
