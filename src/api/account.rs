use serde_json::json;
use serde_json::value::RawValue;

use crate::base64url;
use crate::crypto::account_key::AccountKey;
use crate::crypto::jws::{jws_flattened, JwsHeader};
use crate::eab::{external_account_binding, EabCredentials};
use crate::error::{AcmeError, AcmeResult};
use crate::session::Session;
use crate::wire::account::{AccountResource, NewAccountResource};
use crate::wire::directory::Resource;
use crate::wire::order::NewOrderResource;
use crate::wire::identifier::AcmeIdentifier;
use crate::wire::status::Status;

use super::authorization::Authorization;
use super::certificate::RevocationReason;
use super::order::Order;

/// The account registered for the session's key.
///
/// Registering (or finding) an account stores its URL in the session as the
/// key identifier; every later signed request authenticates with it.
#[derive(Clone, Debug)]
pub struct Account {
    session: Session,
    url: String,
    resource: AccountResource,
}

/// What to register a new account with.
#[derive(Default)]
pub struct RegisterAccount {
    pub contacts: Vec<Contact>,
    pub terms_of_service_agreed: bool,
    /// Credentials for CAs that require binding to an existing customer
    /// account.
    pub external_account: Option<EabCredentials>,
}

pub enum Contact {
    Email(String),
    Uri(String),
}

impl Contact {
    pub(crate) fn uri(self) -> String {
        match self {
            Self::Email(email) if !email.starts_with("mailto:") => format!("mailto:{email}"),
            Self::Email(email) => email,
            Self::Uri(uri) => uri,
        }
    }
}

impl Account {
    /// Register a new account for the session key (RFC 8555 section 7.3).
    pub async fn register(session: &Session, config: RegisterAccount) -> AcmeResult<Self> {
        let new_account_url = session.required_resource_url(Resource::NewAccount).await?;
        let mut request = NewAccountResource {
            contact: config.contacts.into_iter().map(Contact::uri).collect(),
            terms_of_service_agreed: config.terms_of_service_agreed,
            ..Default::default()
        };
        if let Some(credentials) = &config.external_account {
            let public_jwk = session.key().public_jwk().map_err(AcmeError::Crypto)?;
            request.external_account_binding = Some(external_account_binding(
                credentials,
                &public_jwk,
                &new_account_url,
            )?);
        }
        Self::submit_new_account(session, &new_account_url, &request).await
    }

    /// Look up the account already registered for the session key, without
    /// creating one (RFC 8555 section 7.3.1).
    pub async fn find(session: &Session) -> AcmeResult<Self> {
        let new_account_url = session.required_resource_url(Resource::NewAccount).await?;
        let request = NewAccountResource {
            only_return_existing: true,
            ..Default::default()
        };
        Self::submit_new_account(session, &new_account_url, &request).await
    }

    async fn submit_new_account(
        session: &Session,
        new_account_url: &str,
        request: &NewAccountResource,
    ) -> AcmeResult<Self> {
        let connection = session.connection();
        let response = connection.post(session, new_account_url, request).await?;
        let url = response.required_location()?.to_owned();
        session.set_key_identifier(Some(url.clone()));
        Ok(Self {
            session: session.clone(),
            url,
            resource: response.json()?.deserialize()?,
        })
    }

    /// Attach to an account whose URL is already known from persisted state.
    pub async fn bind(session: &Session, url: &str) -> AcmeResult<Self> {
        if url.is_empty() {
            return Err(AcmeError::InvalidArgument("account URL must not be empty"));
        }
        session.set_key_identifier(Some(url.to_owned()));
        let connection = session.connection();
        let response = connection.post_as_get(session, url).await?;
        Ok(Self {
            session: session.clone(),
            url: url.to_owned(),
            resource: response.json()?.deserialize()?,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> Status {
        self.resource.status
    }

    pub fn contacts(&self) -> &[String] {
        &self.resource.contact
    }

    pub fn resource(&self) -> &AccountResource {
        &self.resource
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Refresh the account from the server.
    pub async fn update(&mut self) -> AcmeResult<Status> {
        let connection = self.session.connection();
        let response = connection.post_as_get(&self.session, &self.url).await?;
        self.resource = response.json()?.deserialize()?;
        Ok(self.status())
    }

    /// Replace the account's contact list (RFC 8555 section 7.3.2).
    pub async fn update_contacts(&mut self, contacts: Vec<Contact>) -> AcmeResult<()> {
        let contact: Vec<String> = contacts.into_iter().map(Contact::uri).collect();
        let connection = self.session.connection();
        let response = connection
            .post(&self.session, &self.url, &json!({ "contact": contact }))
            .await?;
        self.resource = response.json()?.deserialize()?;
        Ok(())
    }

    /// Deactivate the account. Irreversible (RFC 8555 section 7.3.6).
    pub async fn deactivate(&mut self) -> AcmeResult<()> {
        let connection = self.session.connection();
        let response = connection
            .post(&self.session, &self.url, &json!({ "status": "deactivated" }))
            .await?;
        self.resource = response.json()?.deserialize()?;
        Ok(())
    }

    /// Roll the account over to a new key (RFC 8555 section 7.3.5): an inner
    /// JWS signed by the new key, carried as the payload of a normal signed
    /// POST under the old key. On success the session signs with the new key.
    pub async fn change_key(&self, new_key: impl AccountKey + 'static) -> AcmeResult<()> {
        let key_change_url = self
            .session
            .required_resource_url(Resource::KeyChange)
            .await?;

        let old_public_jwk: serde_json::Value = serde_json::from_str(
            &self.session.key().public_jwk().map_err(AcmeError::Crypto)?,
        )?;
        let inner_payload = serde_json::to_vec(&json!({
            "account": self.url,
            "oldKey": old_public_jwk
        }))?;
        let new_public_jwk =
            RawValue::from_string(new_key.public_jwk().map_err(AcmeError::Crypto)?)?;
        let inner_header = JwsHeader {
            alg: new_key.jws_alg(),
            nonce: None,
            url: &key_change_url,
            jwk: Some(&new_public_jwk),
            kid: None,
        };
        let inner = jws_flattened(&new_key, &inner_header, &inner_payload)
            .map_err(AcmeError::Crypto)?;

        let connection = self.session.connection();
        connection
            .post(&self.session, &key_change_url, &inner)
            .await?;
        self.session.set_key(new_key);
        Ok(())
    }

    /// Place a new order (RFC 8555 section 7.4).
    pub async fn new_order(&self, new_order: NewOrderResource) -> AcmeResult<Order> {
        Order::create(&self.session, new_order).await
    }

    /// Order a certificate for a single DNS name.
    pub async fn new_dns_order(&self, dns_name: impl Into<String>) -> AcmeResult<Order> {
        self.new_order(NewOrderResource {
            identifiers: vec![AcmeIdentifier::dns(dns_name)],
            ..Default::default()
        })
        .await
    }

    pub async fn get_order(&self, order_url: &str) -> AcmeResult<Order> {
        Order::bind(&self.session, order_url).await
    }

    pub async fn get_authorization(&self, authorization_url: &str) -> AcmeResult<Authorization> {
        Authorization::bind(&self.session, authorization_url).await
    }

    /// Revoke a certificate under this account (RFC 8555 section 7.6).
    pub async fn revoke_certificate(
        &self,
        certificate_der: &[u8],
        reason: Option<RevocationReason>,
    ) -> AcmeResult<()> {
        let revoke_url = self
            .session
            .required_resource_url(Resource::RevokeCert)
            .await?;
        let mut payload = json!({ "certificate": base64url::encode(certificate_der) });
        if let Some(reason) = reason {
            payload["reason"] = json!(reason.code());
        }
        let connection = self.session.connection();
        connection.post(&self.session, &revoke_url, &payload).await?;
        Ok(())
    }
}
