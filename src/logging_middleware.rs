// src/logging_middleware.rs
//! Middleware for logging request and response bodies in debug mode

use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use axum::body::to_bytes;
use tracing::debug;

/// JSON keys whose values never reach the logs
const REDACTED_KEYS: &[&str] = &["password"];

/// Middleware to log request and response bodies in debug mode.
/// Credential fields are redacted before anything is written out.
pub async fn log_request_response(request: Request, next: Next) -> Result<Response, StatusCode> {
    let (parts, body) = request.into_parts();

    // Read request body
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    // Log request body if not empty
    if !bytes.is_empty() {
        if let Ok(body_str) = std::str::from_utf8(&bytes) {
            // Try to parse as JSON for pretty printing
            if let Ok(mut json) = serde_json::from_str::<serde_json::Value>(body_str) {
                redact_sensitive(&mut json);
                debug!(
                    method = %parts.method,
                    uri = %parts.uri,
                    request_body = %serde_json::to_string_pretty(&json).unwrap_or_else(|_| "<unprintable>".to_string()),
                    "📥 Request"
                );
            } else {
                debug!(
                    method = %parts.method,
                    uri = %parts.uri,
                    request_body_bytes = bytes.len(),
                    "📥 Request"
                );
            }
        }
    }

    // Reconstruct request
    let request = Request::from_parts(parts, Body::from(bytes));

    // Call next middleware/handler
    let response = next.run(request).await;

    // Extract response parts
    let (parts, body) = response.into_parts();

    // Read response body
    let bytes = to_bytes(body, usize::MAX)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    // Log response body if not empty
    if !bytes.is_empty() {
        if let Ok(body_str) = std::str::from_utf8(&bytes) {
            // Try to parse as JSON for pretty printing
            if let Ok(mut json) = serde_json::from_str::<serde_json::Value>(body_str) {
                redact_sensitive(&mut json);
                debug!(
                    status = %parts.status,
                    response_body = %serde_json::to_string_pretty(&json).unwrap_or_else(|_| "<unprintable>".to_string()),
                    "📤 Response"
                );
            } else {
                debug!(
                    status = %parts.status,
                    response_body_bytes = bytes.len(),
                    "📤 Response"
                );
            }
        }
    }

    // Reconstruct response
    let response = Response::from_parts(parts, Body::from(bytes));

    Ok(response)
}

/// Replace credential values anywhere in the payload with a placeholder
fn redact_sensitive(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, entry) in map.iter_mut() {
                if REDACTED_KEYS.contains(&key.as_str()) {
                    *entry = serde_json::Value::String("[REDACTED]".to_string());
                } else {
                    redact_sensitive(entry);
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items.iter_mut() {
                redact_sensitive(item);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redacts_password_fields() {
        let mut payload = json!({
            "email": "user@example.com",
            "password": "hunter2"
        });
        redact_sensitive(&mut payload);
        assert_eq!(payload["password"], "[REDACTED]");
        assert_eq!(payload["email"], "user@example.com");
    }

    #[test]
    fn test_redacts_nested_and_array_payloads() {
        let mut payload = json!([
            { "user": { "password": "secret" } },
            { "name": "untouched" }
        ]);
        redact_sensitive(&mut payload);
        assert_eq!(payload[0]["user"]["password"], "[REDACTED]");
        assert_eq!(payload[1]["name"], "untouched");
    }
}
