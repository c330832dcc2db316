use serde::{Deserialize, Serialize};

pub static IDENTIFIER_TYPE_DNS: &str = "dns";
pub static IDENTIFIER_TYPE_IP: &str = "ip";

/// An identifier an order or authorization pertains to, usually a DNS name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AcmeIdentifier {
    /// The type of identifier.
    #[serde(rename = "type")]
    pub type_: String,

    /// The identifier itself.
    pub value: String,
}

impl AcmeIdentifier {
    pub fn dns(name: impl Into<String>) -> Self {
        Self {
            type_: IDENTIFIER_TYPE_DNS.to_string(),
            value: name.into(),
        }
    }

    pub fn ip(addr: impl Into<String>) -> Self {
        Self {
            type_: IDENTIFIER_TYPE_IP.to_string(),
            value: addr.into(),
        }
    }

    pub fn is_dns(&self) -> bool {
        self.type_ == IDENTIFIER_TYPE_DNS
    }

    pub fn dns_name(&self) -> Option<&str> {
        self.is_dns().then_some(self.value.as_str())
    }
}
