//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes, to_bytes},
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::Error;

/// Bodies longer than this many characters are truncated in `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// JSON fields whose values are never written to the logs.
const REDACTED_FIELDS: [&str; 2] = ["password", "token"];

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] characters, it is
/// truncated and the full body is logged at the `debug` level.
/// Passwords, tokens and the `Authorization` header are redacted.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body_bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!("Could not read request body: {error}");
            return Error::InvalidBody("could not read request body".to_owned()).into_response();
        }
    };

    tracing::info!(
        "Received request: {} {}\nheaders: {:#?}\nbody: {}",
        parts.method,
        parts.uri,
        redact_headers(&parts.headers),
        truncate(&redact_body(&body_bytes)),
    );
    tracing::debug!("Full request body: {}", redact_body(&body_bytes));

    let response = next
        .run(Request::from_parts(parts, Body::from(body_bytes)))
        .await;

    let (parts, body) = response.into_parts();
    let body_bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    tracing::info!(
        "Sending response: {}\nheaders: {:#?}\nbody: {}",
        parts.status,
        parts.headers,
        truncate(&redact_body(&body_bytes)),
    );
    tracing::debug!("Full response body: {}", redact_body(&body_bytes));

    Response::from_parts(parts, Body::from(body_bytes))
}

fn redact_headers(headers: &HeaderMap) -> HeaderMap {
    let mut headers = headers.clone();

    if headers.contains_key(AUTHORIZATION) {
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer ********"));
    }

    headers
}

/// Replace the values of sensitive fields in a JSON body.
///
/// Bodies that are not JSON are returned as lossy UTF-8 text.
fn redact_body(body: &Bytes) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(mut json) => {
            redact_json(&mut json);
            json.to_string()
        }
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}

fn redact_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) {
                    *field = Value::String(REDACTED.to_owned());
                } else {
                    redact_json(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_json),
        _ => {}
    }
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(LOG_BODY_LENGTH_LIMIT) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Bytes,
        http::{HeaderMap, HeaderValue, header::AUTHORIZATION},
    };
    use serde_json::{Value, json};

    use super::{LOG_BODY_LENGTH_LIMIT, redact_body, redact_headers, truncate};

    #[test]
    fn redacts_password_and_token_fields() {
        let body = Bytes::from(
            json!({
                "email": "foo@bar.baz",
                "password": "hunter2",
                "nested": { "token": "abc.def.ghi" },
            })
            .to_string(),
        );

        let redacted: Value = serde_json::from_str(&redact_body(&body)).unwrap();

        assert_eq!(
            redacted,
            json!({
                "email": "foo@bar.baz",
                "password": "********",
                "nested": { "token": "********" },
            })
        );
    }

    #[test]
    fn leaves_non_json_body_as_is() {
        let body = Bytes::from_static(b"Data,Tipo\n");

        assert_eq!(redact_body(&body), "Data,Tipo\n");
    }

    #[test]
    fn redacts_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer secret"));

        let redacted = redact_headers(&headers);

        assert_eq!(redacted[AUTHORIZATION], "Bearer ********");
    }

    #[test]
    fn truncates_long_text_on_char_boundary() {
        let text = "ç".repeat(LOG_BODY_LENGTH_LIMIT + 1);

        let truncated = truncate(&text);

        assert_eq!(
            truncated,
            format!("{}...", "ç".repeat(LOG_BODY_LENGTH_LIMIT))
        );
    }

    #[test]
    fn short_text_is_not_truncated() {
        assert_eq!(truncate("short"), "short");
    }
}
