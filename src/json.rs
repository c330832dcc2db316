use chrono::{DateTime, FixedOffset};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AcmeError, AcmeResult};

/// An immutable view over a JSON document with typed accessors.
///
/// Server-owned objects arrive as JSON whose shape the server controls; the
/// accessors here turn a missing or mistyped field into a protocol error at
/// the point of use instead of failing the whole document up front. This is
/// what lets a partial directory from a non-compliant test server parse.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Json(Value);

impl Json {
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn from_slice(bytes: &[u8]) -> AcmeResult<Self> {
        Ok(Self(serde_json::from_slice(bytes)?))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    pub fn is_object(&self) -> bool {
        self.0.is_object()
    }

    /// The named member as a subtree view, if present.
    pub fn child(&self, name: &str) -> Option<Json> {
        self.0.get(name).cloned().map(Json)
    }

    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn str_field(&self, name: &'static str) -> AcmeResult<&str> {
        self.opt_str(name).ok_or(AcmeError::MissingField(name))
    }

    /// A required URL-valued member. ACME never uses relative URLs, so an
    /// empty or non-string value is rejected.
    pub fn url_field(&self, name: &'static str) -> AcmeResult<&str> {
        match self.opt_str(name) {
            Some(url) if !url.is_empty() => Ok(url),
            _ => Err(AcmeError::MissingField(name)),
        }
    }

    pub fn opt_instant(&self, name: &str) -> AcmeResult<Option<DateTime<FixedOffset>>> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(raw)) => DateTime::parse_from_rfc3339(raw)
                .map(Some)
                .map_err(|err| AcmeError::protocol(format!("bad timestamp in `{name}`: {err}"))),
            Some(other) => Err(AcmeError::protocol(format!(
                "expected timestamp string in `{name}`, got {other}"
            ))),
        }
    }

    pub fn instant_field(&self, name: &'static str) -> AcmeResult<DateTime<FixedOffset>> {
        self.opt_instant(name)?.ok_or(AcmeError::MissingField(name))
    }

    pub fn object(&self) -> AcmeResult<&Map<String, Value>> {
        self.0
            .as_object()
            .ok_or_else(|| AcmeError::protocol(format!("expected a JSON object, got {}", self.0)))
    }

    /// A member holding an array of strings; absent means empty.
    pub fn str_array(&self, name: &str) -> Vec<String> {
        self.0
            .get(name)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn deserialize<T: DeserializeOwned>(&self) -> AcmeResult<T> {
        Ok(T::deserialize(&self.0)?)
    }
}

impl From<Value> for Json {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> Json {
        Json::from_value(json!({
            "type": "http-01",
            "url": "https://example.com/acme/some-location",
            "validated": "2015-12-12T17:19:36.336785823Z",
            "caaIdentities": ["example.com", "example.org"],
            "meta": { "website": "https://www.example.com/" },
            "count": 3
        }))
    }

    #[test]
    fn string_accessors() {
        let json = sample();
        assert_eq!(json.str_field("type").unwrap(), "http-01");
        assert_eq!(json.opt_str("missing"), None);
        assert!(matches!(
            json.str_field("missing"),
            Err(AcmeError::MissingField("missing"))
        ));
        // Present but not a string.
        assert!(json.str_field("count").is_err());
    }

    #[test]
    fn url_accessor_rejects_empty() {
        let json = Json::from_value(json!({ "finalize": "" }));
        assert!(matches!(
            json.url_field("finalize"),
            Err(AcmeError::MissingField("finalize"))
        ));
        assert_eq!(
            sample().url_field("url").unwrap(),
            "https://example.com/acme/some-location"
        );
    }

    #[test]
    fn instants_parse_nanosecond_precision() {
        let validated = sample().instant_field("validated").unwrap();
        assert_eq!(
            validated,
            DateTime::parse_from_rfc3339("2015-12-12T17:19:36.336785823Z").unwrap()
        );
        assert_eq!(sample().opt_instant("missing").unwrap(), None);
    }

    #[test]
    fn bad_instant_is_a_protocol_error() {
        let json = Json::from_value(json!({ "validated": "yesterday" }));
        assert!(matches!(
            json.opt_instant("validated"),
            Err(AcmeError::Protocol(_))
        ));
    }

    #[test]
    fn nested_and_arrays() {
        let json = sample();
        let meta = json.child("meta").unwrap();
        assert_eq!(meta.opt_str("website"), Some("https://www.example.com/"));
        assert_eq!(
            json.str_array("caaIdentities"),
            ["example.com", "example.org"]
        );
        assert!(json.str_array("missing").is_empty());
        assert!(json.child("missing").is_none());
    }
}
