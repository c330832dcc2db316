use std::sync::Arc;

use serde_json::json;

use crate::base64url;
use crate::crypto::account_key::AccountKey;
use crate::error::{AcmeError, AcmeResult};
use crate::session::Session;
use crate::wire::directory::Resource;

/// An issued certificate, identified by its URL on the order.
#[derive(Clone, Debug)]
pub struct Certificate {
    session: Session,
    url: String,
}

/// RFC 5280 revocation reason codes. Value 7 is unused by the RFC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevocationReason {
    Unspecified = 0,
    KeyCompromise = 1,
    CaCompromise = 2,
    AffiliationChanged = 3,
    Superseded = 4,
    CessationOfOperation = 5,
    CertificateHold = 6,
    RemoveFromCrl = 8,
    PrivilegeWithdrawn = 9,
    AaCompromise = 10,
}

impl RevocationReason {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl Certificate {
    pub(crate) fn new(session: Session, url: String) -> Self {
        Self { session, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Download the certificate chain as PEM (RFC 8555 section 7.4.2).
    pub async fn download(&self) -> AcmeResult<String> {
        let connection = self.session.connection();
        let response = connection.post_as_get(&self.session, &self.url).await?;
        response.text()
    }

    /// Revoke, authenticating with the certificate's own key pair instead
    /// of the account key (RFC 8555 section 7.6): for when the account key
    /// is gone but the certificate key is not.
    pub async fn revoke_with_key(
        session: &Session,
        key: impl AccountKey + 'static,
        certificate_der: &[u8],
        reason: Option<RevocationReason>,
    ) -> AcmeResult<()> {
        let revoke_url = session.required_resource_url(Resource::RevokeCert).await?;
        let mut payload = json!({ "certificate": base64url::encode(certificate_der) });
        if let Some(reason) = reason {
            payload["reason"] = json!(reason.code());
        }
        let key: Arc<dyn AccountKey> = Arc::new(key);
        let connection = session.connection();
        connection
            .post_with_key(session, &key, &revoke_url, &payload)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use crate::crypto::ed25519::Ed25519AccountKey;
    use crate::crypto::GenerateAccountKey;
    use crate::test_support::{decode_jws, push_directory, session, Canned, MockHttp};

    use super::*;

    static CHAIN: &str = "-----BEGIN CERTIFICATE-----\nMIIB...\n-----END CERTIFICATE-----\n";

    #[tokio::test]
    async fn download_returns_the_pem_chain() {
        let mock = MockHttp::new();
        let session = session(&mock);
        session.set_key_identifier(Some("https://example.com/acme/acct/1".to_string()));
        push_directory(&mock);
        mock.push(Canned::status(200).nonce("nonce-1"));
        mock.push(Canned::text(200, CHAIN));

        let certificate = Certificate::new(
            session.clone(),
            "https://example.com/acme/cert/mAt3xBGaobw".to_string(),
        );
        assert_eq!(certificate.download().await.unwrap(), CHAIN);

        // POST-as-GET, not a plain GET.
        let requests = mock.requests();
        assert_eq!(requests[2].method, "POST");
        let body: Value = serde_json::from_str(&requests[2].body).unwrap();
        assert_eq!(body["payload"], "");
    }

    #[tokio::test]
    async fn revoke_with_certificate_key_signs_with_jwk() {
        let mock = MockHttp::new();
        let session = session(&mock);
        // Even with an account registered, the certificate key goes as jwk.
        session.set_key_identifier(Some("https://example.com/acme/acct/1".to_string()));
        push_directory(&mock);
        mock.push(Canned::status(200).nonce("nonce-1"));
        mock.push(Canned::status(200));

        let cert_key = Ed25519AccountKey::generate();
        Certificate::revoke_with_key(
            &session,
            cert_key,
            b"fake-der",
            Some(RevocationReason::KeyCompromise),
        )
        .await
        .unwrap();

        let (header, payload) = decode_jws(&mock.requests()[2].body);
        assert_eq!(header["url"], "https://example.com/acme/revoke-cert");
        assert_eq!(header["alg"], "EdDSA");
        assert_eq!(header["jwk"]["kty"], "OKP");
        assert!(header.get("kid").is_none());

        let claims: Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(claims["certificate"], crate::base64url::encode(b"fake-der"));
        assert_eq!(claims["reason"], 1);
    }

    #[test]
    fn reason_codes_skip_seven() {
        assert_eq!(RevocationReason::Unspecified.code(), 0);
        assert_eq!(RevocationReason::CertificateHold.code(), 6);
        assert_eq!(RevocationReason::RemoveFromCrl.code(), 8);
        assert_eq!(RevocationReason::AaCompromise.code(), 10);
    }
}
