use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::problem::Problem;
use super::status::Status;

/// ACME Challenge resource
/// https://datatracker.ietf.org/doc/html/rfc8555#section-8
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResource {
    /// The type of challenge encoded in the object.
    #[serde(rename = "type")]
    pub type_: String,

    /// The URL to which a response can be posted.
    pub url: String,

    /// The status of this challenge.
    pub status: Status,

    /// The time at which the server validated this challenge. REQUIRED when
    /// the status is "valid".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validated: Option<DateTime<FixedOffset>>,

    /// Error that occurred while the server was validating the challenge,
    /// structured as a problem document. A challenge with an error has
    /// status "invalid".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Problem>,

    /// A random value that uniquely identifies the challenge. Not a generic
    /// field, but every challenge type defined by RFC 8555 carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Whatever else the challenge type specifies.
    #[serde(flatten)]
    pub additional_fields: Map<String, Value>,
}
