/* src/payload.rs */

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// The body of a successful upstream response.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// The upstream declared `application/json` and the body parsed.
    Json(Value),
    /// Any other content type, kept byte-for-byte as text.
    Text(String),
}

impl Payload {
    /// Decodes a body according to its declared content type.
    ///
    /// # Errors
    ///
    /// Returns the parse error when the upstream claims JSON but the body is not.
    pub fn decode(content_type: &str, body: String) -> Result<Self, serde_json::Error> {
        if content_type.to_ascii_lowercase().contains("application/json") {
            serde_json::from_str(&body).map(Self::Json)
        } else {
            Ok(Self::Text(body))
        }
    }

    /// Tries to turn the payload into a JSON integer.
    ///
    /// Integer text parses, floats truncate toward zero and booleans become
    /// `0` or `1`. Anything else is handed back untouched; a failed coercion
    /// is a type fallback, not an error.
    #[must_use]
    pub fn coerce_integer(self) -> Self {
        // JSON integers are already in shape and fall through unchanged.
        let parsed = match &self {
            Self::Text(text) | Self::Json(Value::String(text)) => parse_integer(text),
            Self::Json(Value::Bool(flag)) => Some(Value::from(i64::from(*flag))),
            Self::Json(Value::Number(number)) if number.is_f64() => {
                number.as_f64().and_then(truncate_float)
            }
            Self::Json(_) => None,
        };

        parsed.map_or(self, Self::Json)
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Json(value) => value,
            Self::Text(text) => Value::String(text),
        }
    }
}

fn parse_integer(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(signed) = trimmed.parse::<i64>() {
        return Some(Value::from(signed));
    }
    trimmed.parse::<u64>().ok().map(Value::from)
}

/// Floats outside the `i64` range have no integer to land on and fall back.
fn truncate_float(value: f64) -> Option<Value> {
    let truncated = value.trunc();
    let in_range = truncated >= i64::MIN as f64 && truncated < i64::MAX as f64;
    (value.is_finite() && in_range).then(|| Value::from(truncated as i64))
}

impl IntoResponse for Payload {
    fn into_response(self) -> Response {
        Json(self.into_value()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_content_type_is_parsed() {
        let payload =
            Payload::decode("application/json; charset=utf-8", r#"{"height": 800000}"#.to_owned())
                .unwrap();
        assert_eq!(payload, Payload::Json(json!({"height": 800000})));
    }

    #[test]
    fn other_content_types_stay_raw() {
        let hash = "000000000000000000026f7d1a1b7a1f62b7b6e42fa9f0a2c0ee2a3d1e2b9a11";
        let payload = Payload::decode("text/plain", hash.to_owned()).unwrap();
        assert_eq!(payload, Payload::Text(hash.to_owned()));

        let payload = Payload::decode("", "{}".to_owned()).unwrap();
        assert_eq!(payload, Payload::Text("{}".to_owned()));
    }

    #[test]
    fn declared_json_that_does_not_parse_is_an_error() {
        assert!(Payload::decode("application/json", "<html>oops</html>".to_owned()).is_err());
    }

    #[test]
    fn numeric_text_coerces_to_integer() {
        let coerced = Payload::Text("800000".to_owned()).coerce_integer();
        assert_eq!(coerced, Payload::Json(json!(800000)));

        let coerced = Payload::Text(" 812345\n".to_owned()).coerce_integer();
        assert_eq!(coerced, Payload::Json(json!(812345)));

        let coerced = Payload::Json(json!("42")).coerce_integer();
        assert_eq!(coerced, Payload::Json(json!(42)));
    }

    #[test]
    fn floats_truncate_and_booleans_count() {
        assert_eq!(
            Payload::Json(json!(800000.9)).coerce_integer(),
            Payload::Json(json!(800000))
        );
        assert_eq!(
            Payload::Json(json!(-2.7)).coerce_integer(),
            Payload::Json(json!(-2))
        );
        assert_eq!(
            Payload::Json(json!(true)).coerce_integer(),
            Payload::Json(json!(1))
        );
        assert_eq!(
            Payload::Json(json!(false)).coerce_integer(),
            Payload::Json(json!(0))
        );
    }

    #[test]
    fn coercion_falls_back_to_original_value() {
        let page = "<html>Service Unavailable</html>".to_owned();
        assert_eq!(
            Payload::Text(page.clone()).coerce_integer(),
            Payload::Text(page)
        );

        let object = Payload::Json(json!({"height": 1}));
        assert_eq!(object.clone().coerce_integer(), object);

        let decimal_text = Payload::Text("1.5".to_owned());
        assert_eq!(decimal_text.clone().coerce_integer(), decimal_text);

        let huge = Payload::Json(json!(1e300));
        assert_eq!(huge.clone().coerce_integer(), huge);

        let null = Payload::Json(Value::Null);
        assert_eq!(null.clone().coerce_integer(), null);
    }

    #[test]
    fn text_renders_as_json_string() {
        assert_eq!(Payload::Text("abc".to_owned()).into_value(), json!("abc"));
    }
}
