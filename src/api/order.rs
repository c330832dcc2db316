use chrono::{DateTime, FixedOffset};

use crate::base64url;
use crate::error::{AcmeError, AcmeResult};
use crate::json::Json;
use crate::session::Session;
use crate::wire::directory::Resource;
use crate::wire::identifier::AcmeIdentifier;
use crate::wire::order::{FinalizeOrder, NewOrderResource, OrderResource};
use crate::wire::problem::Problem;
use crate::wire::status::Status;

use super::authorization::Authorization;
use super::certificate::Certificate;

/// An order for one certificate, from creation through finalization to the
/// certificate URL. State moves pending → ready → processing → valid, with
/// invalid as the failure exit at every step.
#[derive(Clone, Debug)]
pub struct Order {
    session: Session,
    url: String,
    resource: OrderResource,
}

impl Order {
    pub(crate) async fn create(session: &Session, new_order: NewOrderResource) -> AcmeResult<Self> {
        let new_order_url = session.required_resource_url(Resource::NewOrder).await?;
        let connection = session.connection();
        let response = connection.post(session, &new_order_url, &new_order).await?;
        let url = response.required_location()?.to_owned();
        Ok(Self {
            session: session.clone(),
            url,
            resource: response.json()?.deserialize()?,
        })
    }

    /// Attach to an existing order by URL.
    pub async fn bind(session: &Session, url: &str) -> AcmeResult<Self> {
        if url.is_empty() {
            return Err(AcmeError::InvalidArgument("order URL must not be empty"));
        }
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

    pub fn identifiers(&self) -> &[AcmeIdentifier] {
        &self.resource.identifiers
    }

    pub fn authorization_urls(&self) -> &[String] {
        &self.resource.authorizations
    }

    pub fn expires(&self) -> Option<DateTime<FixedOffset>> {
        self.resource.expires
    }

    pub fn error(&self) -> Option<&Problem> {
        self.resource.error.as_ref()
    }

    pub fn finalize_url(&self) -> Option<&str> {
        self.resource.finalize.as_deref()
    }

    /// Populated once the order is valid.
    pub fn certificate_url(&self) -> Option<&str> {
        self.resource.certificate.as_deref()
    }

    pub fn resource(&self) -> &OrderResource {
        &self.resource
    }

    /// Refresh from the server. Applies the body first, then surfaces
    /// Retry-After when the server asked for backoff.
    pub async fn update(&mut self) -> AcmeResult<Status> {
        let connection = self.session.connection();
        let response = connection.post_as_get(&self.session, &self.url).await?;
        self.resource = response.json()?.deserialize()?;
        if let Some(instant) = response.retry_after() {
            return Err(AcmeError::RetryAfter(instant));
        }
        Ok(self.status())
    }

    /// Submit the CSR (DER, not PEM) to the finalize URL. The server moves
    /// the order to processing and eventually valid, at which point the
    /// certificate URL appears.
    pub async fn finalize(&mut self, csr_der: impl AsRef<[u8]>) -> AcmeResult<Status> {
        let finalize_url = self
            .resource
            .finalize
            .clone()
            .ok_or(AcmeError::MissingField("finalize"))?;
        let request = FinalizeOrder {
            csr: base64url::encode(csr_der),
        };
        let connection = self.session.connection();
        let response = connection.post(&self.session, &finalize_url, &request).await?;
        self.apply(response.json()?)?;
        Ok(self.status())
    }

    /// Fetch every authorization listed on the order.
    pub async fn authorizations(&self) -> AcmeResult<Vec<Authorization>> {
        let mut authorizations = Vec::with_capacity(self.resource.authorizations.len());
        for url in &self.resource.authorizations {
            authorizations.push(Authorization::bind(&self.session, url).await?);
        }
        Ok(authorizations)
    }

    /// The issued certificate. Only available once the order is valid.
    pub fn certificate(&self) -> AcmeResult<Certificate> {
        let url = self
            .resource
            .certificate
            .clone()
            .ok_or(AcmeError::MissingField("certificate"))?;
        Ok(Certificate::new(self.session.clone(), url))
    }

    fn apply(&mut self, json: Json) -> AcmeResult<()> {
        self.resource = json.deserialize()?;
        Ok(())
    }
}
