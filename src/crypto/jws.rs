use serde::Serialize;

use crate::base64url;

/// Media type of every signed ACME request body.
pub static CONTENT_TYPE: &str = "application/jose+json";

/// Something that can sign JWS inputs. Implemented by every account key and
/// by the HMAC signer used for external account bindings.
pub trait JwsSigner {
    /// The JWS `alg` value matching this signer's key type.
    fn jws_alg(&self) -> &str;

    fn jws_sign(&self, input: &[u8]) -> Vec<u8>;
}

/// A flattened JWS (RFC 7515 section 7.2.2), the envelope of every ACME
/// POST. An empty payload slice produces the empty-string payload of a
/// POST-as-GET.
#[derive(Serialize)]
pub struct Jws {
    pub protected: String,
    pub payload: String,
    pub signature: String,
}

/// The protected header of an ACME JWS. Exactly one of `jwk` and `kid` is
/// set; `nonce` is absent only in the inner JWS of a key rollover.
#[derive(Serialize)]
pub struct JwsHeader<'a, JwkT: Serialize> {
    pub alg: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<&'a str>,

    pub url: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwk: Option<JwkT>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub kid: Option<&'a str>,
}

pub fn jws_flattened(
    signer: &impl JwsSigner,
    header: &JwsHeader<impl Serialize>,
    payload: &[u8],
) -> anyhow::Result<Jws> {
    let header_b64 = base64url::encode(serde_json::to_vec(header)?);
    let payload_b64 = base64url::encode(payload);
    let input = format!("{header_b64}.{payload_b64}");
    let signature = signer.jws_sign(input.as_bytes());
    Ok(Jws {
        protected: header_b64,
        payload: payload_b64,
        signature: base64url::encode(signature),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    struct NullSigner;

    impl JwsSigner for NullSigner {
        fn jws_alg(&self) -> &str {
            "none"
        }

        fn jws_sign(&self, _input: &[u8]) -> Vec<u8> {
            vec![0; 4]
        }
    }

    fn decode_json(b64: &str) -> Value {
        serde_json::from_slice(&base64url::decode(b64).unwrap()).unwrap()
    }

    #[test]
    fn header_keeps_only_set_auth_member() {
        let jws = jws_flattened(
            &NullSigner,
            &JwsHeader {
                alg: "none",
                nonce: Some("noncenonce"),
                url: "https://example.com/acme/new-account",
                jwk: None::<()>,
                kid: Some("https://example.com/acme/acct/1"),
            },
            b"{}",
        )
        .unwrap();

        let header = decode_json(&jws.protected);
        assert_eq!(header["alg"], "none");
        assert_eq!(header["nonce"], "noncenonce");
        assert_eq!(header["kid"], "https://example.com/acme/acct/1");
        assert!(header.get("jwk").is_none());
        assert_eq!(decode_json(&jws.payload), Value::Object(Default::default()));
    }

    #[test]
    fn empty_payload_encodes_to_empty_string() {
        let jws = jws_flattened(
            &NullSigner,
            &JwsHeader {
                alg: "none",
                nonce: None,
                url: "https://example.com/acme/chall/1",
                jwk: None::<()>,
                kid: None,
            },
            b"",
        )
        .unwrap();

        assert_eq!(jws.payload, "");
        let header = decode_json(&jws.protected);
        assert!(header.get("nonce").is_none());
    }
}
