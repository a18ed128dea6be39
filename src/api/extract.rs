//! Request body and query extraction with JSON rejections.

use std::collections::BTreeMap;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{header::CONTENT_TYPE, request::Parts},
    Form, Json,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::AppError;

/// Query string parameters, rejected as a JSON 400 when they do not fit `T`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Params<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for Params<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(Params(value))
    }
}

/// Untyped request body.
///
/// JSON bodies parse into their JSON value, URL-encoded bodies into an object
/// (see [`form_to_value`]). Any other content type yields an empty object.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload(pub Value);

enum BodyKind {
    Json,
    UrlEncoded,
    Other,
}

fn body_kind(request: &Request) -> BodyKind {
    let Some(content_type) = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return BodyKind::Other;
    };

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if essence == "application/json" || essence.ends_with("+json") {
        BodyKind::Json
    } else if essence == "application/x-www-form-urlencoded" {
        BodyKind::UrlEncoded
    } else {
        BodyKind::Other
    }
}

#[async_trait]
impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match body_kind(&request) {
            BodyKind::Json => {
                let Json(value) = Json::<Value>::from_request(request, state)
                    .await
                    .map_err(|rejection| AppError::MalformedBody(rejection.body_text()))?;
                Ok(Payload(value))
            }
            BodyKind::UrlEncoded => {
                let Form(pairs) = Form::<Vec<(String, String)>>::from_request(request, state)
                    .await
                    .map_err(|rejection| AppError::MalformedBody(rejection.body_text()))?;
                Ok(Payload(form_to_value(pairs)))
            }
            BodyKind::Other => Ok(Payload(Value::Object(Map::new()))),
        }
    }
}

/// One collected form field.
enum FormField {
    Single(String),
    /// `(index, value)`; `None` for `name[]` and repeated bare keys.
    List(Vec<(Option<usize>, String)>),
}

/// Split `name[]` / `name[N]` into the base name and optional index.
fn array_key(key: &str) -> Option<(&str, Option<usize>)> {
    let (name, rest) = key.split_once('[')?;
    let inner = rest.strip_suffix(']')?;
    if name.is_empty() {
        return None;
    }
    if inner.is_empty() {
        return Some((name, None));
    }
    inner.parse().ok().map(|index| (name, Some(index)))
}

/// Fold URL-encoded pairs into a JSON object.
///
/// `name[]=a&name[]=b`, `name[1]=b&name[0]=a` and a repeated `name=a&name=b`
/// all become `{"name": ["a", "b"]}`. Indexed items are ordered by index,
/// unindexed ones follow in arrival order. A key seen once stays a string; any
/// other bracket syntax is kept verbatim as the key.
pub fn form_to_value(pairs: Vec<(String, String)>) -> Value {
    let mut fields: BTreeMap<String, FormField> = BTreeMap::new();

    for (key, value) in pairs {
        let (name, index) = match array_key(&key) {
            Some((name, index)) => (name.to_string(), Some(index)),
            None => (key, None),
        };

        match (fields.remove(&name), index) {
            (None, None) => {
                fields.insert(name, FormField::Single(value));
            }
            (None, Some(index)) => {
                fields.insert(name, FormField::List(vec![(index, value)]));
            }
            (Some(FormField::Single(first)), index) => {
                let items = vec![(None, first), (index.flatten(), value)];
                fields.insert(name, FormField::List(items));
            }
            (Some(FormField::List(mut items)), index) => {
                items.push((index.flatten(), value));
                fields.insert(name, FormField::List(items));
            }
        }
    }

    let object: Map<String, Value> = fields
        .into_iter()
        .map(|(name, field)| {
            let value = match field {
                FormField::Single(value) => Value::String(value),
                FormField::List(mut items) => {
                    // Stable: equal keys keep arrival order.
                    items.sort_by_key(|(index, _)| index.unwrap_or(usize::MAX));
                    Value::Array(items.into_iter().map(|(_, v)| Value::String(v)).collect())
                }
            };
            (name, value)
        })
        .collect();

    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    async fn extract(content_type: Option<&str>, body: &'static str) -> Result<Payload, AppError> {
        let mut builder = Request::builder().method("POST").uri("/analyze");
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        let request = builder.body(Body::from(body)).unwrap();
        Payload::from_request(request, &()).await
    }

    #[tokio::test]
    async fn parses_json_body() {
        let Payload(value) = extract(Some("application/json"), r#"{"numbers":[1,2]}"#)
            .await
            .unwrap();
        assert_eq!(value, json!({ "numbers": [1, 2] }));
    }

    #[tokio::test]
    async fn parses_json_with_charset() {
        let Payload(value) = extract(Some("application/json; charset=utf-8"), r#"{"a":1}"#)
            .await
            .unwrap();
        assert_eq!(value, json!({ "a": 1 }));
    }

    #[tokio::test]
    async fn parses_urlencoded_body() {
        let Payload(value) = extract(Some("application/x-www-form-urlencoded"), "numbers=1&x=y")
            .await
            .unwrap();
        assert_eq!(value, json!({ "numbers": "1", "x": "y" }));
    }

    #[tokio::test]
    async fn urlencoded_brackets_build_arrays() {
        let Payload(value) = extract(
            Some("application/x-www-form-urlencoded"),
            "numbers%5B%5D=1&numbers%5B%5D=2&x=y",
        )
        .await
        .unwrap();
        assert_eq!(value, json!({ "numbers": ["1", "2"], "x": "y" }));
    }

    #[test]
    fn indexed_form_keys_are_ordered_by_index() {
        let pairs = vec![
            ("numbers[1]".to_string(), "4".to_string()),
            ("numbers[]".to_string(), "9".to_string()),
            ("numbers[0]".to_string(), "1".to_string()),
        ];
        assert_eq!(form_to_value(pairs), json!({ "numbers": ["1", "4", "9"] }));
    }

    #[test]
    fn repeated_form_keys_become_arrays() {
        let pairs = vec![
            ("numbers".to_string(), "1".to_string()),
            ("numbers".to_string(), "2".to_string()),
            ("a[b]".to_string(), "c".to_string()),
        ];
        assert_eq!(
            form_to_value(pairs),
            json!({ "numbers": ["1", "2"], "a[b]": "c" })
        );
    }

    #[derive(Debug, serde::Deserialize)]
    struct Sample {
        format: Option<String>,
    }

    async fn params(uri: &str) -> Result<Params<Sample>, AppError> {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let (mut parts, _) = request.into_parts();
        Params::<Sample>::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn params_parse_query_string() {
        let Params(sample) = params("/utils/date?format=YYYY").await.unwrap();
        assert_eq!(sample.format.as_deref(), Some("YYYY"));

        let Params(sample) = params("/utils/date").await.unwrap();
        assert!(sample.format.is_none());
    }

    #[tokio::test]
    async fn params_reject_duplicate_fields_as_bad_request() {
        let err = params("/utils/date?format=YYYY&format=MM").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m.contains("format")));
    }

    #[tokio::test]
    async fn other_content_types_yield_empty_object() {
        let Payload(value) = extract(Some("text/plain"), "hello").await.unwrap();
        assert_eq!(value, json!({}));

        let Payload(value) = extract(None, "").await.unwrap();
        assert_eq!(value, json!({}));
    }

    #[tokio::test]
    async fn malformed_json_is_rejected() {
        let err = extract(Some("application/json"), "{not json").await.unwrap_err();
        assert!(matches!(err, AppError::MalformedBody(_)));
    }
}
