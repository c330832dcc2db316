fn config() -> base64::Config {
    base64::Config::new(base64::CharacterSet::UrlSafe, false)
}

/// Encode bytes as unpadded base64url, the only alphabet ACME uses on the wire.
pub(crate) fn encode(input: impl AsRef<[u8]>) -> String {
    base64::encode_config(input, config())
}

pub(crate) fn decode(input: impl AsRef<[u8]>) -> Result<Vec<u8>, base64::DecodeError> {
    base64::decode_config(input, config())
}
