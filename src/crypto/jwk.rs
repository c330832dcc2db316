use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::base64url;

/// Borrowed JWK form shared by the key implementations.
#[derive(Serialize, Deserialize)]
pub struct Jwk<'a> {
    pub kty: &'a str,
    pub crv: &'a str,
    pub x: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<&'a str>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<&'a str>,
}

/// RFC 7638 thumbprint of a public JWK: base64url(SHA-256(canonical form)).
pub(crate) fn thumbprint(public_jwk: &str) -> anyhow::Result<String> {
    let canonical = canonical_form(public_jwk)?;
    Ok(base64url::encode(Sha256::digest(canonical.as_bytes())))
}

/// The canonical JWK serialization hashed for thumbprints: only the required
/// members of the key type, lexicographically ordered, no whitespace.
pub(crate) fn canonical_form(public_jwk: &str) -> anyhow::Result<String> {
    let jwk: Value = serde_json::from_str(public_jwk)?;
    let kty = jwk
        .get("kty")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("JWK without kty"))?;

    // Required members per RFC 7638 section 3.2.
    let members: &[&str] = match kty {
        "EC" => &["crv", "kty", "x", "y"],
        "OKP" => &["crv", "kty", "x"],
        "RSA" => &["e", "kty", "n"],
        other => anyhow::bail!("no canonical JWK form for kty {other:?}"),
    };

    let mut canonical = BTreeMap::new();
    for member in members {
        let value = jwk
            .get(*member)
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("JWK missing required member {member:?}"))?;
        canonical.insert(*member, value);
    }
    Ok(serde_json::to_string(&canonical)?)
}
