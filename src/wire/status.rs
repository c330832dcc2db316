use serde::{Deserialize, Serialize};

/// Status of a server-owned ACME resource.
///
/// One enum covers accounts, orders, authorizations, challenges and
/// certificates; each resource type only ever reports the subset RFC 8555
/// defines for it. A status string this client does not know maps to
/// [`Status::Unknown`] instead of failing the unmarshal, so newer servers
/// stay usable.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// The resource was created and is waiting on the client.
    Pending,

    /// All of an order's authorizations are valid; it can be finalized.
    Ready,

    /// The server is working on the resource (validating a challenge,
    /// issuing a certificate).
    Processing,

    Valid,

    /// Terminal failure. Challenges and orders carry a problem document
    /// explaining why.
    Invalid,

    /// Revoked by the server.
    Revoked,

    /// Deactivated by the client.
    Deactivated,

    Expired,

    /// A status string not defined by RFC 8555.
    #[serde(other)]
    Unknown,
}

impl Status {
    #[inline]
    pub fn is_pending(self) -> bool {
        self == Status::Pending
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self == Status::Valid
    }

    /// Whether the server will never change this status again.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Status::Valid
                | Status::Invalid
                | Status::Revoked
                | Status::Deactivated
                | Status::Expired
        )
    }
}
