//! Scripted `HttpClient` used by the unit tests: canned responses are
//! consumed in order and every request is recorded for assertions.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use http_client::{Body, Error, HttpClient, Request, Response};
use serde_json::Value;

use crate::base64url;
use crate::crypto::es256::{self, Es256AccountKey};
use crate::provider::ProviderSet;
use crate::session::Session;

pub(crate) static DIRECTORY_URL: &str = "https://example.com/acme/directory";

pub(crate) struct Canned {
    status: u16,
    headers: Vec<(&'static str, String)>,
    body: Option<(&'static str, Vec<u8>)>,
}

impl Canned {
    pub(crate) fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: None,
        }
    }

    pub(crate) fn json(status: u16, value: Value) -> Self {
        Self::status(status).body("application/json", value.to_string().into_bytes())
    }

    pub(crate) fn problem(status: u16, value: Value) -> Self {
        Self::status(status).body("application/problem+json", value.to_string().into_bytes())
    }

    pub(crate) fn text(status: u16, text: &str) -> Self {
        Self::status(status).body("text/plain", text.as_bytes().to_vec())
    }

    pub(crate) fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub(crate) fn nonce(self, value: impl Into<String>) -> Self {
        self.header("Replay-Nonce", value)
    }

    fn body(mut self, mime: &'static str, bytes: Vec<u8>) -> Self {
        self.body = Some((mime, bytes));
        self
    }

    fn into_response(self) -> Response {
        let mut response = Response::new(self.status);
        for (name, value) in self.headers {
            response.insert_header(name, value.as_str());
        }
        if let Some((mime, bytes)) = self.body {
            let mut body = Body::from_bytes(bytes);
            body.set_mime(mime);
            response.set_body(body);
        }
        response
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub body: String,
    pub accept_language: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct MockHttp {
    responses: Mutex<VecDeque<Canned>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl std::fmt::Debug for Canned {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Canned({})", self.status)
    }
}

impl MockHttp {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push(&self, response: Canned) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpClient for MockHttp {
    async fn send(&self, mut req: Request) -> Result<Response, Error> {
        let body = req.body_string().await?;
        self.requests.lock().unwrap().push(RecordedRequest {
            method: req.method().to_string(),
            url: req.url().to_string(),
            body,
            accept_language: req
                .header("Accept-Language")
                .map(|values| values.last().as_str().to_owned()),
        });

        match self.responses.lock().unwrap().pop_front() {
            Some(canned) => Ok(canned.into_response()),
            None => Err(Error::from_str(500, "mock exhausted: unexpected request")),
        }
    }
}

pub(crate) fn test_key() -> Es256AccountKey {
    Es256AccountKey::from_jwk(es256::tests::JWK).unwrap()
}

/// A session against `example.com` backed by the given mock.
pub(crate) fn session(mock: &Arc<MockHttp>) -> Session {
    let http: Arc<dyn HttpClient> = mock.clone();
    Session::new(http, &ProviderSet::standard(), DIRECTORY_URL, test_key()).unwrap()
}

/// The directory document served by [`push_directory`].
pub(crate) fn directory_value() -> Value {
    serde_json::json!({
        "newNonce": "https://example.com/acme/new-nonce",
        "newAccount": "https://example.com/acme/new-account",
        "newOrder": "https://example.com/acme/new-order",
        "revokeCert": "https://example.com/acme/revoke-cert",
        "keyChange": "https://example.com/acme/key-change",
        "meta": {
            "termsOfService": "https://example.com/acme/terms/2017-5-30",
            "website": "https://www.example.com/"
        }
    })
}

pub(crate) fn push_directory(mock: &MockHttp) {
    mock.push(Canned::json(200, directory_value()));
}

/// Split a recorded flattened JWS body into its decoded protected header and
/// decoded payload bytes.
pub(crate) fn decode_jws(body: &str) -> (Value, Vec<u8>) {
    let jws: Value = serde_json::from_str(body).unwrap();
    let protected = base64url::decode(jws["protected"].as_str().unwrap()).unwrap();
    let payload = base64url::decode(jws["payload"].as_str().unwrap()).unwrap();
    (serde_json::from_slice(&protected).unwrap(), payload)
}
