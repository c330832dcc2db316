use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::challenge::ChallengeResource;
use super::identifier::AcmeIdentifier;
use super::status::Status;

/// ACME Authorization resource
/// https://datatracker.ietf.org/doc/html/rfc8555#section-7.1.4
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationResource {
    /// The identifier the account is authorized to represent.
    pub identifier: AcmeIdentifier,

    /// The status of this authorization.
    pub status: Status,

    /// The timestamp after which the server will consider this authorization
    /// invalid. REQUIRED when the status is "valid".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<FixedOffset>>,

    /// For pending authorizations, the challenges the client can fulfill;
    /// any single one is sufficient. For settled authorizations, the
    /// challenge that was attempted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub challenges: Vec<ChallengeResource>,

    /// Present and true when the authorization was created for a wildcard
    /// DNS identifier.
    #[serde(default, skip_serializing_if = "super::is_false")]
    pub wildcard: bool,
}
