use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::status::Status;

/// ACME Account resource
/// https://datatracker.ietf.org/doc/html/rfc8555#section-7.1.2
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AccountResource {
    /// The status of this account: valid, deactivated or revoked.
    pub status: Status,

    /// URLs the server can use to contact the client about this account.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contact: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_of_service_agreed: Option<bool>,

    /// A URL from which the account's orders can be fetched. Required by
    /// RFC 8555 but absent from Let's Encrypt responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orders: Option<String>,
}

/// ACME newAccount request payload
/// https://datatracker.ietf.org/doc/html/rfc8555#section-7.3
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewAccountResource {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contact: Vec<String>,

    /// True indicates the client's agreement with the terms of service.
    #[serde(default, skip_serializing_if = "super::is_false")]
    pub terms_of_service_agreed: bool,

    /// When true the server must not create a new account; this is how a
    /// client looks up the account URL for a key it already holds.
    #[serde(default, skip_serializing_if = "super::is_false")]
    pub only_return_existing: bool,

    /// Approval by the holder of an existing non-ACME account to bind it to
    /// this ACME account; a JWS signed with the CA-provided HMAC key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_account_binding: Option<Value>,
}
