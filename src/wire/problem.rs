use std::fmt;

use serde::{Deserialize, Serialize};

use super::identifier::AcmeIdentifier;

/// Media type of RFC 7807 problem documents.
pub static CONTENT_TYPE: &str = "application/problem+json";

/// Prefix shared by all error types RFC 8555 registers.
pub static ACME_ERROR_PREFIX: &str = "urn:ietf:params:acme:error:";

pub static BAD_NONCE: &str = "urn:ietf:params:acme:error:badNonce";
pub static USER_ACTION_REQUIRED: &str = "urn:ietf:params:acme:error:userActionRequired";
pub static UNAUTHORIZED: &str = "urn:ietf:params:acme:error:unauthorized";
pub static RATE_LIMITED: &str = "urn:ietf:params:acme:error:rateLimited";
pub static BAD_SIGNATURE_ALGORITHM: &str = "urn:ietf:params:acme:error:badSignatureAlgorithm";

/// An RFC 7807 problem document, as attached to error responses and to
/// failed challenges and orders.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    /// The error type URI, usually under `urn:ietf:params:acme:error:`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    /// Human-readable explanation specific to this occurrence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// A URI for this specific occurrence. For `userActionRequired` this is
    /// where a human should be sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// The HTTP status code of the response this document arrived with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Per-identifier breakdown when one request failed for several
    /// identifiers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subproblems: Vec<Subproblem>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subproblem {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// The identifier this subproblem pertains to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<AcmeIdentifier>,
}

impl Problem {
    pub fn is_type(&self, type_uri: &str) -> bool {
        self.type_.as_deref() == Some(type_uri)
    }

    pub fn is_bad_nonce(&self) -> bool {
        self.is_type(BAD_NONCE)
    }

    pub fn is_user_action_required(&self) -> bool {
        self.is_type(USER_ACTION_REQUIRED)
    }

    /// The bare ACME error code (`badNonce`, `rateLimited`, ...) when the
    /// type URI is in the RFC 8555 registry.
    pub fn acme_code(&self) -> Option<&str> {
        self.type_.as_deref()?.strip_prefix(ACME_ERROR_PREFIX)
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let type_ = self.type_.as_deref().unwrap_or("about:blank");
        match self.detail.as_deref() {
            Some(detail) => write!(f, "{type_}: {detail}"),
            None => f.write_str(type_),
        }
    }
}
