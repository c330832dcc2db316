use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::base64url;
use crate::error::{AcmeError, AcmeResult};
use crate::json::Json;
use crate::session::Session;
use crate::wire::challenge::ChallengeResource;
use crate::wire::problem::Problem;
use crate::wire::status::Status;

pub static HTTP_01: &str = "http-01";
pub static DNS_01: &str = "dns-01";
pub static TLS_ALPN_01: &str = "tls-alpn-01";

/// The challenge variants this client knows how to drive.
///
/// Servers are free to offer types outside this set; those bind as
/// [`ChallengeKind::Generic`] when the registry's fallback is enabled, with
/// all their fields reachable through the raw JSON.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChallengeKind {
    Http01,
    Dns01,
    TlsAlpn01,
    Generic,
}

/// A challenge owned by the server, fetched by URL and advanced by signed
/// POSTs.
///
/// ```text
///         trigger()          server
/// pending ─────────► processing ─────► valid
///                                  └─► invalid
/// ```
#[derive(Clone, Debug)]
pub struct Challenge {
    session: Session,
    kind: ChallengeKind,
    resource: ChallengeResource,
    raw: Json,
}

impl Challenge {
    /// Fetch the challenge at `url` and bind it through the session
    /// provider's registry.
    pub async fn bind(session: &Session, url: &str) -> AcmeResult<Self> {
        if url.is_empty() {
            return Err(AcmeError::InvalidArgument("challenge URL must not be empty"));
        }
        let connection = session.connection();
        let response = connection.post_as_get(session, url).await?;
        let json = response.json()?;
        if json.opt_str("type").is_none() {
            return Err(AcmeError::protocol(format!(
                "document at {url} is not a challenge"
            )));
        }
        session.create_challenge(&json)
    }

    pub fn http01(session: &Session, json: &Json) -> AcmeResult<Self> {
        Self::typed(session, json, ChallengeKind::Http01, HTTP_01)
    }

    pub fn dns01(session: &Session, json: &Json) -> AcmeResult<Self> {
        Self::typed(session, json, ChallengeKind::Dns01, DNS_01)
    }

    pub fn tls_alpn01(session: &Session, json: &Json) -> AcmeResult<Self> {
        Self::typed(session, json, ChallengeKind::TlsAlpn01, TLS_ALPN_01)
    }

    /// Bind a challenge of a type this client has no specific handling for.
    pub fn generic(session: &Session, json: &Json) -> AcmeResult<Self> {
        Ok(Self {
            session: session.clone(),
            kind: ChallengeKind::Generic,
            resource: json.deserialize()?,
            raw: json.clone(),
        })
    }

    fn typed(
        session: &Session,
        json: &Json,
        kind: ChallengeKind,
        expected_type: &'static str,
    ) -> AcmeResult<Self> {
        let resource: ChallengeResource = json.deserialize()?;
        if resource.type_ != expected_type {
            return Err(AcmeError::protocol(format!(
                "expected a {expected_type} challenge, got {:?}",
                resource.type_
            )));
        }
        Ok(Self {
            session: session.clone(),
            kind,
            resource,
            raw: json.clone(),
        })
    }

    pub fn challenge_type(&self) -> &str {
        &self.resource.type_
    }

    pub fn kind(&self) -> ChallengeKind {
        self.kind
    }

    pub fn status(&self) -> Status {
        self.resource.status
    }

    /// The challenge URL, which is both its identity and its POST target.
    pub fn location(&self) -> &str {
        &self.resource.url
    }

    pub fn validated(&self) -> Option<DateTime<FixedOffset>> {
        self.resource.validated
    }

    pub fn error(&self) -> Option<&Problem> {
        self.resource.error.as_ref()
    }

    pub fn token(&self) -> AcmeResult<&str> {
        self.resource
            .token
            .as_deref()
            .ok_or(AcmeError::MissingField("token"))
    }

    /// The raw challenge document, for fields outside the common set.
    pub fn json(&self) -> &Json {
        &self.raw
    }

    /// `token || '.' || base64url(SHA-256(canonical JWK))`, the string that
    /// proves control of the account key to a validator.
    pub fn key_authorization(&self) -> AcmeResult<String> {
        let token = self.token()?;
        let thumbprint = self
            .session
            .key()
            .thumbprint()
            .map_err(AcmeError::Crypto)?;
        Ok(format!("{token}.{thumbprint}"))
    }

    /// dns-01 only: the value of the `_acme-challenge` TXT record.
    pub fn dns_txt_value(&self) -> AcmeResult<String> {
        if self.kind != ChallengeKind::Dns01 {
            return Err(AcmeError::InvalidArgument("not a dns-01 challenge"));
        }
        let digest = Sha256::digest(self.key_authorization()?.as_bytes());
        Ok(base64url::encode(digest))
    }

    /// tls-alpn-01 only: the digest placed in the certificate's
    /// acmeIdentifier extension.
    pub fn acme_validation_digest(&self) -> AcmeResult<[u8; 32]> {
        if self.kind != ChallengeKind::TlsAlpn01 {
            return Err(AcmeError::InvalidArgument("not a tls-alpn-01 challenge"));
        }
        Ok(Sha256::digest(self.key_authorization()?.as_bytes()).into())
    }

    /// http-01 only: the request path the validator will probe.
    pub fn well_known_path(&self) -> AcmeResult<String> {
        if self.kind != ChallengeKind::Http01 {
            return Err(AcmeError::InvalidArgument("not an http-01 challenge"));
        }
        Ok(format!("/.well-known/acme-challenge/{}", self.token()?))
    }

    /// The payload of a trigger POST. RFC 8555 challenge responses carry no
    /// fields; the empty object tells the server "ready for validation".
    fn prepare_response(&self) -> Map<String, Value> {
        Map::new()
    }

    /// Tell the server to start validating. The application must have
    /// provisioned the response (file, TXT record, certificate) first.
    pub async fn trigger(&mut self) -> AcmeResult<Status> {
        let connection = self.session.connection();
        let payload = Value::Object(self.prepare_response());
        let response = connection
            .post(&self.session, &self.resource.url, &payload)
            .await?;
        self.apply(response.json()?)?;
        Ok(self.status())
    }

    /// Refresh status and error from the server. When the response carries
    /// Retry-After, the state is applied first and [`AcmeError::RetryAfter`]
    /// is returned so the caller can decide whether to back off.
    pub async fn update(&mut self) -> AcmeResult<Status> {
        let connection = self.session.connection();
        let response = connection
            .post_as_get(&self.session, &self.resource.url)
            .await?;
        self.apply(response.json()?)?;
        if let Some(instant) = response.retry_after() {
            return Err(AcmeError::RetryAfter(instant));
        }
        Ok(self.status())
    }

    fn apply(&mut self, json: Json) -> AcmeResult<()> {
        let resource: ChallengeResource = json.deserialize()?;
        if resource.type_ != self.resource.type_ {
            return Err(AcmeError::protocol(format!(
                "challenge at {} changed type from {:?} to {:?}",
                self.resource.url, self.resource.type_, resource.type_
            )));
        }
        self.resource = resource;
        self.raw = json;
        Ok(())
    }
}

type ChallengeFactory = fn(&Session, &Json) -> AcmeResult<Challenge>;

/// The type-string to constructor map a provider binds challenges through.
#[derive(Clone, Debug)]
pub struct ChallengeRegistry {
    factories: HashMap<String, ChallengeFactory>,
    generic_fallback: bool,
}

impl ChallengeRegistry {
    /// No bindings and no fallback; the base for fully custom providers.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
            generic_fallback: false,
        }
    }

    /// The RFC 8555 challenge types, with unknown types falling back to
    /// generic challenges.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.generic_fallback = true;
        registry.register(HTTP_01, Challenge::http01);
        registry.register(DNS_01, Challenge::dns01);
        registry.register(TLS_ALPN_01, Challenge::tls_alpn01);
        registry
    }

    pub fn register(&mut self, challenge_type: impl Into<String>, factory: ChallengeFactory) {
        self.factories.insert(challenge_type.into(), factory);
    }

    /// Whether unknown types bind as generic challenges instead of failing.
    pub fn set_generic_fallback(&mut self, enabled: bool) {
        self.generic_fallback = enabled;
    }

    pub fn create(&self, session: &Session, json: &Json) -> AcmeResult<Challenge> {
        let challenge_type = json
            .opt_str("type")
            .ok_or_else(|| AcmeError::protocol("challenge document has no type"))?;
        match self.factories.get(challenge_type) {
            Some(factory) => factory(session, json),
            None if self.generic_fallback => Challenge::generic(session, json),
            None => Err(AcmeError::protocol(format!(
                "unbindable challenge type {challenge_type:?}"
            ))),
        }
    }
}
