use chrono::{DateTime, FixedOffset};
use serde_json::json;

use crate::error::{AcmeError, AcmeResult};
use crate::json::Json;
use crate::session::Session;
use crate::wire::authorization::AuthorizationResource;
use crate::wire::identifier::AcmeIdentifier;
use crate::wire::status::Status;

use super::challenge::Challenge;

/// An authorization for one identifier, holding the challenges the client
/// may complete. Any single challenge is sufficient; the client picks one,
/// fulfills it, and triggers it.
#[derive(Clone, Debug)]
pub struct Authorization {
    session: Session,
    url: String,
    resource: AuthorizationResource,
    challenges: Vec<Challenge>,
}

impl Authorization {
    /// Fetch the authorization at `url`, binding each listed challenge
    /// through the provider's registry.
    pub async fn bind(session: &Session, url: &str) -> AcmeResult<Self> {
        if url.is_empty() {
            return Err(AcmeError::InvalidArgument(
                "authorization URL must not be empty",
            ));
        }
        let connection = session.connection();
        let response = connection.post_as_get(session, url).await?;
        Self::from_json(session, url, response.json()?)
    }

    fn from_json(session: &Session, url: &str, json: Json) -> AcmeResult<Self> {
        let resource: AuthorizationResource = json.deserialize()?;
        let mut challenges = Vec::with_capacity(resource.challenges.len());
        for challenge in &resource.challenges {
            let raw = Json::from_value(serde_json::to_value(challenge)?);
            challenges.push(session.create_challenge(&raw)?);
        }
        Ok(Self {
            session: session.clone(),
            url: url.to_owned(),
            resource,
            challenges,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> Status {
        self.resource.status
    }

    pub fn identifier(&self) -> &AcmeIdentifier {
        &self.resource.identifier
    }

    pub fn wildcard(&self) -> bool {
        self.resource.wildcard
    }

    pub fn expires(&self) -> Option<DateTime<FixedOffset>> {
        self.resource.expires
    }

    pub fn challenges(&self) -> &[Challenge] {
        &self.challenges
    }

    /// The challenge of the given type, if the server offered one.
    pub fn find_challenge(&self, challenge_type: &str) -> Option<Challenge> {
        self.challenges
            .iter()
            .find(|challenge| challenge.challenge_type() == challenge_type)
            .cloned()
    }

    /// Refresh from the server; Retry-After is surfaced after the body is
    /// applied.
    pub async fn update(&mut self) -> AcmeResult<Status> {
        let connection = self.session.connection();
        let response = connection.post_as_get(&self.session, &self.url).await?;
        let refreshed = Self::from_json(&self.session, &self.url, response.json()?)?;
        self.resource = refreshed.resource;
        self.challenges = refreshed.challenges;
        if let Some(instant) = response.retry_after() {
            return Err(AcmeError::RetryAfter(instant));
        }
        Ok(self.status())
    }

    /// Give up on this authorization (RFC 8555 section 7.5.2).
    pub async fn deactivate(&mut self) -> AcmeResult<Status> {
        let connection = self.session.connection();
        let response = connection
            .post(&self.session, &self.url, &json!({ "status": "deactivated" }))
            .await?;
        let refreshed = Self::from_json(&self.session, &self.url, response.json()?)?;
        self.resource = refreshed.resource;
        self.challenges = refreshed.challenges;
        Ok(self.status())
    }
}
