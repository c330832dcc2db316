use serde::{Deserialize, Serialize};

use crate::error::AcmeResult;
use crate::json::Json;

/// The resources a directory document can advertise.
///
/// Each variant maps to one key of the directory object. A compliant server
/// advertises all of them except possibly `newAuthz`; the session tolerates
/// arbitrary gaps and reports them when the missing endpoint is actually
/// needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    NewNonce,
    NewAccount,
    NewOrder,
    NewAuthz,
    RevokeCert,
    KeyChange,
}

impl Resource {
    pub const ALL: [Resource; 6] = [
        Resource::NewNonce,
        Resource::NewAccount,
        Resource::NewOrder,
        Resource::NewAuthz,
        Resource::RevokeCert,
        Resource::KeyChange,
    ];

    /// The member name under which the directory lists this resource.
    pub fn directory_key(self) -> &'static str {
        match self {
            Resource::NewNonce => "newNonce",
            Resource::NewAccount => "newAccount",
            Resource::NewOrder => "newOrder",
            Resource::NewAuthz => "newAuthz",
            Resource::RevokeCert => "revokeCert",
            Resource::KeyChange => "keyChange",
        }
    }
}

/// The directory's optional `meta` object.
///
/// Absent members come back as their empty form, so callers never deal with
/// a missing metadata object.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerMetadata {
    /// A URL identifying the current terms of service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,

    /// Website with more information about the ACME server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// Hostnames the server recognizes as referring to itself for CAA
    /// record validation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub caa_identities: Vec<String>,

    /// Whether newAccount requests must carry an external account binding.
    #[serde(default, skip_serializing_if = "super::is_false")]
    pub external_account_required: bool,
}

impl ServerMetadata {
    /// Extract the metadata from a directory document; an absent `meta`
    /// member yields the empty metadata.
    pub(crate) fn from_directory(directory: &Json) -> AcmeResult<Self> {
        match directory.child("meta") {
            Some(meta) => meta.deserialize(),
            None => Ok(Self::default()),
        }
    }
}
