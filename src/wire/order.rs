use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::identifier::AcmeIdentifier;
use super::problem::Problem;
use super::status::Status;

/// ACME Order resource
/// https://datatracker.ietf.org/doc/html/rfc8555#section-7.1.3
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OrderResource {
    /// The status of this order.
    pub status: Status,

    /// The timestamp after which the server will consider this order
    /// invalid. REQUIRED for "pending" and "valid" orders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<FixedOffset>>,

    /// The identifiers this order pertains to.
    pub identifiers: Vec<AcmeIdentifier>,

    /// The requested notBefore value for the certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<FixedOffset>>,

    /// The requested notAfter value for the certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_after: Option<DateTime<FixedOffset>>,

    /// The error that occurred while processing the order, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Problem>,

    /// URLs of the authorizations the client has to complete. There may not
    /// be a 1:1 relationship between order identifiers and authorizations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorizations: Vec<String>,

    /// The URL a CSR is POSTed to once all authorizations are satisfied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalize: Option<String>,

    /// The URL of the issued certificate, populated when the order is valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
}

/// ACME newOrder request payload
/// https://datatracker.ietf.org/doc/html/rfc8555#section-7.4
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderResource {
    pub identifiers: Vec<AcmeIdentifier>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<FixedOffset>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_after: Option<DateTime<FixedOffset>>,
}

/// Finalize request payload. The CSR travels base64url-encoded DER, not PEM.
#[derive(Serialize, Deserialize, Debug)]
pub struct FinalizeOrder {
    pub csr: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn rfc8555_order_example() {
        let order = OrderResource::deserialize(json!({
            "status": "valid",
            "expires": "2016-01-20T14:09:07.99Z",
            "identifiers": [
                { "type": "dns", "value": "www.example.org" },
                { "type": "dns", "value": "example.org" }
            ],
            "notBefore": "2016-01-01T00:00:00Z",
            "notAfter": "2016-01-08T00:00:00Z",
            "authorizations": [
                "https://example.com/acme/authz/PAniVnsZcis",
                "https://example.com/acme/authz/r4HqLzrSrpI"
            ],
            "finalize": "https://example.com/acme/order/TOlocE8rfgo/finalize",
            "certificate": "https://example.com/acme/cert/mAt3xBGaobw"
        }))
        .unwrap();

        assert_eq!(order.status, Status::Valid);
        assert_eq!(
            order.identifiers,
            [
                AcmeIdentifier::dns("www.example.org"),
                AcmeIdentifier::dns("example.org"),
            ]
        );
        assert_eq!(
            order.authorizations,
            [
                "https://example.com/acme/authz/PAniVnsZcis",
                "https://example.com/acme/authz/r4HqLzrSrpI"
            ]
        );
        assert_eq!(
            order.finalize.as_deref(),
            Some("https://example.com/acme/order/TOlocE8rfgo/finalize")
        );
        assert_eq!(
            order.certificate.as_deref(),
            Some("https://example.com/acme/cert/mAt3xBGaobw")
        );
    }

    #[test]
    fn order_without_finalize_still_parses() {
        // Some test servers hand out partial orders; absence is reported at
        // the point of use, not here.
        let order = OrderResource::deserialize(json!({
            "status": "pending",
            "identifiers": [{ "type": "dns", "value": "example.org" }]
        }))
        .unwrap();
        assert_eq!(order.finalize, None);
        assert!(order.authorizations.is_empty());
    }

    #[test]
    fn new_order_wire_form() {
        let new_order = NewOrderResource {
            identifiers: vec![
                AcmeIdentifier::dns("www.example.org"),
                AcmeIdentifier::dns("example.org"),
            ],
            not_before: Some(DateTime::parse_from_rfc3339("2016-01-01T00:04:00+04:00").unwrap()),
            not_after: Some(DateTime::parse_from_rfc3339("2016-01-08T00:04:00+04:00").unwrap()),
        };
        assert_eq!(
            serde_json::to_value(new_order).unwrap(),
            json!({
                "identifiers": [
                    { "type": "dns", "value": "www.example.org" },
                    { "type": "dns", "value": "example.org" }
                ],
                "notBefore": "2016-01-01T00:04:00+04:00",
                "notAfter": "2016-01-08T00:04:00+04:00"
            })
        );
    }
}
