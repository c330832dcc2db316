use std::sync::Arc;

use async_trait::async_trait;

use crate::api::challenge::{Challenge, ChallengeRegistry};
use crate::connection::Connection;
use crate::error::{AcmeError, AcmeResult};
use crate::json::Json;
use crate::session::Session;

/// CA-specific behavior injected into a session.
///
/// The standard provider talks plain RFC 8555; a provider for a particular
/// CA can swap out the directory exchange, the connection, or the challenge
/// bindings. Resolution happens once, at session construction, and exactly
/// one registered provider must accept a given server URL.
#[async_trait]
pub trait Provider: Send + Sync + std::fmt::Debug {
    /// Short name used in configuration error messages.
    fn name(&self) -> &str;

    /// Whether this provider handles the given server URL.
    fn accepts(&self, server_url: &str) -> bool;

    /// Fetch the directory document. The default is the plain unsigned GET
    /// RFC 8555 prescribes.
    async fn directory(&self, session: &Session) -> AcmeResult<Json> {
        let connection = self.create_connection(session);
        let response = connection.get(session, session.server_url()).await?;
        response.json()
    }

    /// The challenge bindings this provider knows.
    fn challenge_registry(&self) -> &ChallengeRegistry;

    /// Bind a challenge document. `Ok(None)` means "not mine", letting the
    /// session report the type as unbindable.
    fn create_challenge(&self, session: &Session, json: &Json) -> AcmeResult<Option<Challenge>> {
        self.challenge_registry().create(session, json).map(Some)
    }

    /// Build the connection used for one exchange.
    fn create_connection(&self, session: &Session) -> Connection {
        Connection::new(session.http())
    }
}

/// The provider used when nothing CA-specific is registered: any http(s)
/// server URL, the standard challenge set, plain connections.
#[derive(Debug)]
pub struct StandardProvider {
    registry: ChallengeRegistry,
}

impl Default for StandardProvider {
    fn default() -> Self {
        Self {
            registry: ChallengeRegistry::standard(),
        }
    }
}

impl StandardProvider {
    pub fn with_registry(registry: ChallengeRegistry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Provider for StandardProvider {
    fn name(&self) -> &str {
        "standard"
    }

    fn accepts(&self, server_url: &str) -> bool {
        server_url.starts_with("https://") || server_url.starts_with("http://")
    }

    fn challenge_registry(&self) -> &ChallengeRegistry {
        &self.registry
    }
}

/// The providers known to this process. No global state: build one and pass
/// it into every [`Session::new`].
#[derive(Debug, Clone, Default)]
pub struct ProviderSet {
    providers: Vec<Arc<dyn Provider>>,
}

impl ProviderSet {
    /// An empty set; only useful as the base for custom registrations.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard provider alone.
    pub fn standard() -> Self {
        let mut set = Self::empty();
        set.register(StandardProvider::default());
        set
    }

    pub fn register(&mut self, provider: impl Provider + 'static) {
        self.providers.push(Arc::new(provider));
    }

    /// Resolve the single provider accepting `server_url`. Zero matches is
    /// a configuration error, and so is more than one, naming both
    /// candidates so the ambiguity can be fixed rather than guessed around.
    pub fn find(&self, server_url: &str) -> AcmeResult<Arc<dyn Provider>> {
        let mut matches = self
            .providers
            .iter()
            .filter(|provider| provider.accepts(server_url));

        let first = matches.next().ok_or_else(|| {
            AcmeError::Configuration(format!("no provider accepts {server_url:?}"))
        })?;
        if let Some(second) = matches.next() {
            return Err(AcmeError::Configuration(format!(
                "providers {:?} and {:?} both accept {server_url:?}",
                first.name(),
                second.name()
            )));
        }
        Ok(first.clone())
    }
}
