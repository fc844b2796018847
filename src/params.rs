//! PDF open parameters and their fragment identifier encoding.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::de::{Deserialize, Deserializer};
use serde_json::{Map, Number, Value};

/// Characters escaped by `encodeURIComponent`.
///
/// Everything except ASCII alphanumerics and `- _ . ! ~ * ' ( )` is encoded.
pub const URI_COMPONENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'$')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b',')
    .add(b'/')
    .add(b':')
    .add(b';')
    .add(b'<')
    .add(b'=')
    .add(b'>')
    .add(b'?')
    .add(b'@')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Percent-encodes `value` as a single URI component.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Ordered key/value pairs understood by PDF viewers (`#page=3&zoom=50`).
///
/// Keys keep their insertion order. Setting a key that already exists
/// replaces its value without moving it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpenParams {
    entries: Vec<(String, String)>,
}

impl OpenParams {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value` and returns the updated parameters.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    /// Sets `key` to `value`, replacing an existing entry in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        let key = key.into();
        let value = value.to_string();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Returns the value stored for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    /// Returns whether no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Serializes the parameters as a URI fragment.
    ///
    /// Keys and values are encoded independently. An empty set yields an
    /// empty string rather than a lone `#`.
    pub fn to_fragment(&self) -> String {
        if self.is_empty() {
            return String::new();
        }

        let pairs = self
            .iter()
            .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
            .collect::<Vec<_>>()
            .join("&");
        format!("#{pairs}")
    }

    /// Builds parameters from a JSON object, stringifying non-string values.
    pub fn from_json_map(map: &Map<String, Value>) -> Self {
        let mut params = Self::new();
        for (key, value) in map {
            params.set(key.as_str(), json_display(value));
        }
        params
    }
}

impl<K, V> FromIterator<(K, V)> for OpenParams
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.set(key, value);
        }
        params
    }
}

impl<'de> Deserialize<'de> for OpenParams {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => Ok(Self::from_json_map(&map)),
            _ => Ok(Self::default()),
        }
    }
}

/// Formats a JSON value the way JavaScript's `String(value)` displays it.
///
/// Arrays join their items with `,` (with `null` items left empty), objects
/// become `[object Object]`, and integral floats lose their fraction.
pub(crate) fn json_display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => "null".to_owned(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number_display(number),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => json_display(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_owned(),
    }
}

fn number_display(number: &Number) -> String {
    match number.as_f64() {
        Some(value) if number.is_f64() && value == 0.0 => "0".to_owned(),
        Some(value) if number.is_f64() && value.fract() == 0.0 && value.abs() < 1e21 => {
            format!("{value:.0}")
        }
        _ => number.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_params_produce_empty_fragment() {
        assert_eq!(OpenParams::new().to_fragment(), "");
    }

    #[test]
    fn single_page_fragment() {
        assert_eq!(OpenParams::new().with("page", 3).to_fragment(), "#page=3");
    }

    #[test]
    fn keys_and_values_are_encoded_independently() {
        let params = OpenParams::new().with("a", "x y").with("b", 1);
        assert_eq!(params.to_fragment(), "#a=x%20y&b=1");

        let params = OpenParams::new().with("k&=", "a=b&c");
        assert_eq!(params.to_fragment(), "#k%26%3D=a%3Db%26c");
    }

    #[test]
    fn uri_component_keeps_unreserved_marks() {
        assert_eq!(encode_component("a-b_c.d!e~f*g'h(i)"), "a-b_c.d!e~f*g'h(i)");
        assert_eq!(
            encode_component("http://host/a b.pdf?x=1"),
            "http%3A%2F%2Fhost%2Fa%20b.pdf%3Fx%3D1"
        );
        assert_eq!(encode_component("é"), "%C3%A9");
    }

    #[test]
    fn setting_existing_key_keeps_position() {
        let mut params = OpenParams::new().with("page", 1).with("zoom", 50);
        params.set("page", 7);
        assert_eq!(params.to_fragment(), "#page=7&zoom=50");
    }

    #[test]
    fn json_values_are_stringified() {
        let value: Value = serde_json::json!({"view": "FitH", "page": 2, "toolbar": false});
        let Value::Object(map) = value else {
            panic!("expected object");
        };
        let params = OpenParams::from_json_map(&map);
        assert_eq!(params.to_fragment(), "#view=FitH&page=2&toolbar=false");
    }

    #[test]
    fn json_values_display_like_script_strings() {
        assert_eq!(json_display(&serde_json::json!([1, "a", null, [2, 3]])), "1,a,,2,3");
        assert_eq!(json_display(&serde_json::json!({"x": 1})), "[object Object]");
        assert_eq!(json_display(&serde_json::json!(2.0)), "2");
        assert_eq!(json_display(&serde_json::json!(-0.0)), "0");
        assert_eq!(json_display(&serde_json::json!(2.5)), "2.5");
        assert_eq!(json_display(&serde_json::json!(-7)), "-7");

        let value: Value = serde_json::json!({"zoom": [100, 0, 0], "nameddest": {}});
        let Value::Object(map) = value else {
            panic!("expected object");
        };
        assert_eq!(
            OpenParams::from_json_map(&map).to_fragment(),
            "#zoom=100%2C0%2C0&nameddest=%5Bobject%20Object%5D"
        );
    }
}
