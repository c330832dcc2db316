use chrono::{DateTime, Duration, Utc};
use http_client::{Body, HttpClient, Request, Response};
use serde::Serialize;
use serde_json::value::RawValue;
use std::sync::Arc;

use crate::crypto::account_key::AccountKey;
use crate::crypto::jws::{self, jws_flattened, Jws, JwsHeader};
use crate::error::{AcmeError, AcmeResult};
use crate::json::Json;
use crate::session::Session;
use crate::wire::directory::Resource;
use crate::wire::problem::{self, Problem};

/// Header carrying the single-use anti-replay token.
pub static REPLAY_NONCE: &str = "Replay-Nonce";

pub static LOCATION: &str = "Location";
pub static RETRY_AFTER: &str = "Retry-After";
pub static ACCEPT_LANGUAGE: &str = "Accept-Language";

/// One HTTP exchange with the ACME server.
///
/// A connection is stateless apart from the client handle; the session owns
/// the nonce and directory cache and is threaded through every call. Three
/// modes: unsigned GET (the directory only), signed POST, and POST-as-GET
/// (signed POST with an empty payload).
pub struct Connection {
    http: Arc<dyn HttpClient>,
}

/// Whose key signs a request.
enum SignWith<'a> {
    /// The session's account key; `kid` once the account URL is known,
    /// embedded `jwk` before that.
    Account,
    /// A caller-provided key, always as `jwk` (certificate revocation by
    /// certificate key).
    Key(&'a Arc<dyn AccountKey>),
}

impl Connection {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }

    /// Unsigned GET. Only the directory is fetched this way; everything
    /// else is a POST-as-GET.
    pub async fn get(&self, session: &Session, url: &str) -> AcmeResult<AcmeResponse> {
        if url.is_empty() {
            return Err(AcmeError::InvalidArgument("url must not be empty"));
        }
        let mut req = Request::get(url);
        decorate(session, &mut req);
        let resp = self.http.send(req).await?;
        finish(session, resp).await
    }

    /// Signed POST carrying the serialized claims as payload.
    pub async fn post<T: Serialize + ?Sized>(
        &self,
        session: &Session,
        url: &str,
        payload: &T,
    ) -> AcmeResult<AcmeResponse> {
        let payload = serde_json::to_vec(payload)?;
        self.signed(session, url, SignWith::Account, &payload).await
    }

    /// Authenticated read: signed POST with the empty payload.
    pub async fn post_as_get(&self, session: &Session, url: &str) -> AcmeResult<AcmeResponse> {
        self.signed(session, url, SignWith::Account, b"").await
    }

    /// Signed POST using the given key's `jwk` header instead of the
    /// session's account identity.
    pub async fn post_with_key<T: Serialize + ?Sized>(
        &self,
        session: &Session,
        key: &Arc<dyn AccountKey>,
        url: &str,
        payload: &T,
    ) -> AcmeResult<AcmeResponse> {
        let payload = serde_json::to_vec(payload)?;
        self.signed(session, url, SignWith::Key(key), &payload).await
    }

    async fn signed(
        &self,
        session: &Session,
        url: &str,
        sign_with: SignWith<'_>,
        payload: &[u8],
    ) -> AcmeResult<AcmeResponse> {
        if url.is_empty() {
            return Err(AcmeError::InvalidArgument("url must not be empty"));
        }
        let mut outcome = self.send_signed(session, url, &sign_with, payload).await;
        if let Err(ref err) = outcome {
            // The badNonce response already delivered a fresh nonce along
            // with the rejection; retry exactly once.
            if err.is_bad_nonce() {
                outcome = self.send_signed(session, url, &sign_with, payload).await;
            }
        }
        outcome
    }

    async fn send_signed(
        &self,
        session: &Session,
        url: &str,
        sign_with: &SignWith<'_>,
        payload: &[u8],
    ) -> AcmeResult<AcmeResponse> {
        let nonce = match session.take_nonce() {
            Some(nonce) => nonce,
            None => self.fetch_nonce(session).await?,
        };

        let jws = build_jws(session, url, sign_with, payload, &nonce)?;
        let mut req = Request::post(url);
        decorate(session, &mut req);
        let mut body = Body::from_json(&jws)?;
        body.set_mime(jws::CONTENT_TYPE);
        req.set_body(body);

        let resp = self.http.send(req).await?;
        finish(session, resp).await
    }

    /// HEAD on the newNonce endpoint. The returned nonce goes straight into
    /// the request being built, not into the session slot.
    pub(crate) async fn fetch_nonce(&self, session: &Session) -> AcmeResult<String> {
        let new_nonce_url = session.required_resource_url(Resource::NewNonce).await?;
        let mut req = Request::head(new_nonce_url.as_str());
        decorate(session, &mut req);
        let resp = self.http.send(req).await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(http_client::Error::from_str(status, "newNonce request failed").into());
        }
        match resp.header(REPLAY_NONCE) {
            Some(values) => Ok(values.last().as_str().to_owned()),
            None => Err(AcmeError::MissingHeader(REPLAY_NONCE)),
        }
    }
}

fn decorate(session: &Session, req: &mut Request) {
    if let Some(locale) = session.locale() {
        req.insert_header(ACCEPT_LANGUAGE, locale.as_str());
    }
}

fn build_jws(
    session: &Session,
    url: &str,
    sign_with: &SignWith<'_>,
    payload: &[u8],
    nonce: &str,
) -> AcmeResult<Jws> {
    let (key, force_jwk) = match sign_with {
        SignWith::Account => (session.key(), false),
        SignWith::Key(key) => (Arc::clone(key), true),
    };

    let kid = if force_jwk {
        None
    } else {
        session.key_identifier()
    };
    match kid.as_deref() {
        Some(kid) => {
            let header = JwsHeader {
                alg: key.jws_alg(),
                nonce: Some(nonce),
                url,
                jwk: None::<&RawValue>,
                kid: Some(kid),
            };
            jws_flattened(&key, &header, payload).map_err(AcmeError::Crypto)
        }
        None => {
            let jwk = RawValue::from_string(key.public_jwk().map_err(AcmeError::Crypto)?)?;
            let header = JwsHeader {
                alg: key.jws_alg(),
                nonce: Some(nonce),
                url,
                jwk: Some(&jwk),
                kid: None,
            };
            jws_flattened(&key, &header, payload).map_err(AcmeError::Crypto)
        }
    }
}

/// Harvest the headers every response may carry, read the body, and map
/// non-success statuses onto typed errors.
async fn finish(session: &Session, mut resp: Response) -> AcmeResult<AcmeResponse> {
    if let Some(values) = resp.header(REPLAY_NONCE) {
        session.set_nonce(Some(values.last().as_str().to_owned()));
    }

    let status = resp.status();
    let location = resp
        .header(LOCATION)
        .map(|values| values.last().as_str().to_owned());
    let retry_after = resp
        .header(RETRY_AFTER)
        .and_then(|values| parse_retry_after(values.last().as_str(), Utc::now()));
    let is_problem = resp
        .content_type()
        .map(|ct| ct.essence() == problem::CONTENT_TYPE)
        .unwrap_or(false);
    let body = resp.body_bytes().await?;

    if status.is_success() || status.is_informational() {
        return Ok(AcmeResponse {
            status: status as u16,
            location,
            retry_after,
            body,
        });
    }

    if is_problem {
        if let Ok(mut problem) = serde_json::from_slice::<Problem>(&body) {
            if problem.status.is_none() {
                problem.status = Some(status as u16);
            }
            if problem.is_user_action_required() {
                return Err(AcmeError::UserActionRequired {
                    terms_of_service: session
                        .cached_metadata()
                        .and_then(|meta| meta.terms_of_service),
                    problem,
                });
            }
            return Err(AcmeError::Problem(problem));
        }
    }
    Err(http_client::Error::from_str(status, "unexpected response status").into())
}

/// Retry-After is either delta-seconds or an HTTP-date.
fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<i64>() {
        return Some(now + Duration::seconds(seconds));
    }
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|instant| instant.with_timezone(&Utc))
}

/// A parsed server response: status, the headers ACME cares about, and the
/// raw body.
#[derive(Debug)]
pub struct AcmeResponse {
    status: u16,
    location: Option<String>,
    retry_after: Option<DateTime<Utc>>,
    body: Vec<u8>,
}

impl AcmeResponse {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn required_location(&self) -> AcmeResult<&str> {
        self.location().ok_or(AcmeError::MissingHeader(LOCATION))
    }

    /// The instant the server asked the client to come back at.
    pub fn retry_after(&self) -> Option<DateTime<Utc>> {
        self.retry_after
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn json(&self) -> AcmeResult<Json> {
        Json::from_slice(&self.body)
    }

    pub fn text(&self) -> AcmeResult<String> {
        String::from_utf8(self.body.clone())
            .map_err(|_| AcmeError::protocol("response body is not UTF-8"))
    }
}
