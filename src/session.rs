use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use http_client::HttpClient;

use crate::api::challenge::Challenge;
use crate::connection::Connection;
use crate::crypto::account_key::AccountKey;
use crate::error::{AcmeError, AcmeResult};
use crate::json::Json;
use crate::provider::{Provider, ProviderSet};
use crate::wire::directory::{Resource, ServerMetadata};

/// How long a fetched directory is trusted before it is fetched again.
pub const DEFAULT_DIRECTORY_TTL: StdDuration = StdDuration::from_secs(60 * 60);

/// The long-lived handle to one ACME server.
///
/// A session owns the account key, the key identifier (the account URL, once
/// an account exists), the last replay nonce, the locale, and the cached
/// directory. It is a cheap-clone handle; clones share all of that state,
/// and a single session is safe for concurrent use.
#[derive(Clone, Debug)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    http: Arc<dyn HttpClient>,
    provider: Arc<dyn Provider>,
    server_url: String,
    key: Mutex<Arc<dyn AccountKey>>,
    key_identifier: Mutex<Option<String>>,
    nonce: Mutex<Option<String>>,
    locale: Mutex<Option<String>>,
    directory_ttl: Mutex<StdDuration>,
    /// Fetch-serializing slot: at most one directory fetch is in flight,
    /// concurrent callers wait on this lock and then see the fresh snapshot.
    directory: tokio::sync::Mutex<Option<Arc<DirectorySnapshot>>>,
    /// The last published snapshot, for synchronous readers. Swapped whole.
    current_directory: Mutex<Option<Arc<DirectorySnapshot>>>,
}

/// An immutable parse of one directory fetch.
#[derive(Debug)]
struct DirectorySnapshot {
    raw: Json,
    resources: HashMap<Resource, String>,
    metadata: ServerMetadata,
    expires_at: DateTime<Utc>,
}

impl DirectorySnapshot {
    /// Walk the [`Resource`] enum and keep whatever URLs the server
    /// advertises. Gaps are tolerated here and reported at point of use.
    fn from_json(raw: Json, ttl: StdDuration) -> AcmeResult<Self> {
        if !raw.is_object() {
            return Err(AcmeError::protocol("directory response is not a JSON object"));
        }
        let mut resources = HashMap::new();
        for resource in Resource::ALL {
            if let Some(url) = raw.opt_str(resource.directory_key()) {
                if !url.is_empty() {
                    resources.insert(resource, url.to_owned());
                }
            }
        }
        let metadata = ServerMetadata::from_directory(&raw)?;
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::hours(1));
        Ok(Self {
            raw,
            resources,
            metadata,
            expires_at: Utc::now() + ttl,
        })
    }

    fn is_fresh(&self) -> bool {
        Utc::now() < self.expires_at
    }
}

impl Session {
    /// Create a session for `server_url`, resolving the provider from
    /// `providers`. Fails when no provider accepts the URL or when more than
    /// one does.
    pub fn new(
        http: impl Into<Arc<dyn HttpClient>>,
        providers: &ProviderSet,
        server_url: impl Into<String>,
        key: impl AccountKey + 'static,
    ) -> AcmeResult<Self> {
        let server_url = server_url.into();
        if server_url.is_empty() {
            return Err(AcmeError::InvalidArgument("server URL must not be empty"));
        }
        let provider = providers.find(&server_url)?;
        Ok(Self {
            inner: Arc::new(SessionInner {
                http: http.into(),
                provider,
                server_url,
                key: Mutex::new(Arc::new(key)),
                key_identifier: Mutex::new(None),
                nonce: Mutex::new(None),
                locale: Mutex::new(system_locale()),
                directory_ttl: Mutex::new(DEFAULT_DIRECTORY_TTL),
                directory: tokio::sync::Mutex::new(None),
                current_directory: Mutex::new(None),
            }),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.inner.server_url
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.inner.provider
    }

    /// The HTTP client the session was built with.
    pub fn http(&self) -> Arc<dyn HttpClient> {
        self.inner.http.clone()
    }

    /// A connection for one exchange, built by the provider.
    pub fn connection(&self) -> Connection {
        self.inner.provider.create_connection(self)
    }

    pub fn key(&self) -> Arc<dyn AccountKey> {
        self.inner.key.lock().unwrap().clone()
    }

    /// Replace the account key, as key rollover does.
    pub fn set_key(&self, key: impl AccountKey + 'static) {
        *self.inner.key.lock().unwrap() = Arc::new(key);
    }

    /// The account URL, used as the JWS `kid` once an account exists.
    pub fn key_identifier(&self) -> Option<String> {
        self.inner.key_identifier.lock().unwrap().clone()
    }

    pub fn set_key_identifier(&self, key_identifier: Option<String>) {
        *self.inner.key_identifier.lock().unwrap() = key_identifier;
    }

    /// The most recent replay nonce the server handed out, if unconsumed.
    pub fn nonce(&self) -> Option<String> {
        self.inner.nonce.lock().unwrap().clone()
    }

    pub fn set_nonce(&self, nonce: Option<String>) {
        *self.inner.nonce.lock().unwrap() = nonce;
    }

    /// Consume the stored nonce. Nonces are single-use: two concurrent
    /// signed requests can never sign with the same one.
    pub(crate) fn take_nonce(&self) -> Option<String> {
        self.inner.nonce.lock().unwrap().take()
    }

    /// The locale sent as `Accept-Language`, initialized from the process
    /// environment.
    pub fn locale(&self) -> Option<String> {
        self.inner.locale.lock().unwrap().clone()
    }

    pub fn set_locale(&self, locale: Option<String>) {
        *self.inner.locale.lock().unwrap() = locale;
    }

    pub fn directory_ttl(&self) -> StdDuration {
        *self.inner.directory_ttl.lock().unwrap()
    }

    /// Lower this to make non-compliant test servers re-serve the directory.
    pub fn set_directory_ttl(&self, ttl: StdDuration) {
        *self.inner.directory_ttl.lock().unwrap() = ttl;
    }

    /// The advertised URL for `resource`, fetching or refreshing the
    /// directory as needed. `Ok(None)` when the server does not list it.
    pub async fn resource_url(&self, resource: Resource) -> AcmeResult<Option<String>> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot.resources.get(&resource).cloned())
    }

    pub(crate) async fn required_resource_url(&self, resource: Resource) -> AcmeResult<String> {
        self.resource_url(resource).await?.ok_or_else(|| {
            AcmeError::protocol(format!(
                "directory does not advertise {:?}",
                resource.directory_key()
            ))
        })
    }

    /// The directory's metadata; empty when the server sent none.
    pub async fn metadata(&self) -> AcmeResult<ServerMetadata> {
        Ok(self.snapshot().await?.metadata.clone())
    }

    /// The raw cached directory document.
    pub async fn directory_json(&self) -> AcmeResult<Json> {
        Ok(self.snapshot().await?.raw.clone())
    }

    /// Metadata from the already-cached directory, without fetching.
    pub(crate) fn cached_metadata(&self) -> Option<ServerMetadata> {
        self.inner
            .current_directory
            .lock()
            .unwrap()
            .as_ref()
            .map(|snapshot| snapshot.metadata.clone())
    }

    /// Bind a challenge document to its typed variant through the provider's
    /// registry.
    pub fn create_challenge(&self, json: &Json) -> AcmeResult<Challenge> {
        match self.inner.provider.create_challenge(self, json)? {
            Some(challenge) => Ok(challenge),
            None => Err(AcmeError::protocol(format!(
                "provider cannot bind challenge type {:?}",
                json.opt_str("type").unwrap_or("<missing>")
            ))),
        }
    }

    async fn snapshot(&self) -> AcmeResult<Arc<DirectorySnapshot>> {
        let mut slot = self.inner.directory.lock().await;
        if let Some(snapshot) = slot.as_ref() {
            if snapshot.is_fresh() {
                return Ok(snapshot.clone());
            }
        }
        let raw = self.inner.provider.directory(self).await?;
        let snapshot = Arc::new(DirectorySnapshot::from_json(raw, self.directory_ttl())?);
        *slot = Some(snapshot.clone());
        *self.inner.current_directory.lock().unwrap() = Some(snapshot.clone());
        Ok(snapshot)
    }
}

/// Best-effort locale from the usual environment variables, normalized to a
/// language tag ("de_DE.UTF-8" becomes "de-DE").
fn system_locale() -> Option<String> {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .find_map(|name| std::env::var(name).ok())
        .and_then(|raw| normalize_locale(&raw))
}

fn normalize_locale(raw: &str) -> Option<String> {
    let tag = raw.split('.').next().unwrap_or_default();
    if tag.is_empty() || tag == "C" || tag == "POSIX" {
        return None;
    }
    Some(tag.replace('_', "-"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::test_support::{push_directory, session, Canned, MockHttp};

    use super::*;

    #[tokio::test]
    async fn directory_is_fetched_once_within_ttl() {
        let mock = MockHttp::new();
        let session = session(&mock);
        push_directory(&mock);

        let first = session.resource_url(Resource::NewOrder).await.unwrap();
        let second = session.resource_url(Resource::NewAccount).await.unwrap();

        assert_eq!(first.as_deref(), Some("https://example.com/acme/new-order"));
        assert_eq!(
            second.as_deref(),
            Some("https://example.com/acme/new-account")
        );
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn expired_directory_is_refetched() {
        let mock = MockHttp::new();
        let session = session(&mock);
        session.set_directory_ttl(StdDuration::ZERO);
        push_directory(&mock);
        push_directory(&mock);

        session.resource_url(Resource::NewOrder).await.unwrap();
        session.resource_url(Resource::NewOrder).await.unwrap();
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test]
    async fn absent_resource_is_none_not_an_error() {
        let mock = MockHttp::new();
        let session = session(&mock);
        // Minimal directory: a test server advertising almost nothing.
        mock.push(Canned::json(
            200,
            json!({ "newNonce": "https://example.com/acme/new-nonce" }),
        ));

        assert_eq!(session.resource_url(Resource::NewAuthz).await.unwrap(), None);
        let err = session
            .required_resource_url(Resource::NewOrder)
            .await
            .unwrap_err();
        assert!(matches!(err, AcmeError::Protocol(_)));
    }

    #[tokio::test]
    async fn metadata_defaults_to_empty() {
        let mock = MockHttp::new();
        let session = session(&mock);
        mock.push(Canned::json(
            200,
            json!({ "newNonce": "https://example.com/acme/new-nonce" }),
        ));

        assert_eq!(session.metadata().await.unwrap(), ServerMetadata::default());
    }

    #[tokio::test]
    async fn metadata_reflects_the_directory() {
        let mock = MockHttp::new();
        let session = session(&mock);
        push_directory(&mock);

        let meta = session.metadata().await.unwrap();
        assert_eq!(
            meta.terms_of_service.as_deref(),
            Some("https://example.com/acme/terms/2017-5-30")
        );
        // And the synchronous view agrees once cached.
        assert_eq!(session.cached_metadata(), Some(meta));
    }

    #[tokio::test]
    async fn non_object_directory_is_a_protocol_error() {
        let mock = MockHttp::new();
        let session = session(&mock);
        mock.push(Canned::json(200, json!("not a directory")));

        let err = session.resource_url(Resource::NewNonce).await.unwrap_err();
        assert!(matches!(err, AcmeError::Protocol(_)));
    }

    #[test]
    fn nonce_slot_is_single_use() {
        let mock = MockHttp::new();
        let session = session(&mock);
        session.set_nonce(Some("nonce-1".to_string()));

        assert_eq!(session.nonce().as_deref(), Some("nonce-1"));
        assert_eq!(session.take_nonce().as_deref(), Some("nonce-1"));
        assert_eq!(session.take_nonce(), None);
        assert_eq!(session.nonce(), None);
    }

    #[test]
    fn empty_server_url_is_rejected() {
        let mock = MockHttp::new();
        let http: Arc<dyn HttpClient> = mock;
        let err = Session::new(
            http,
            &ProviderSet::standard(),
            "",
            crate::test_support::test_key(),
        )
        .unwrap_err();
        assert!(matches!(err, AcmeError::InvalidArgument(_)));
    }

    #[test]
    fn locale_normalization() {
        assert_eq!(normalize_locale("de_DE.UTF-8").as_deref(), Some("de-DE"));
        assert_eq!(normalize_locale("en_US").as_deref(), Some("en-US"));
        assert_eq!(normalize_locale("C"), None);
        assert_eq!(normalize_locale("POSIX"), None);
        assert_eq!(normalize_locale(""), None);
    }
}
