use std::fmt;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// A single field-level validation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not signed in or session expired")]
    Unauthorized,
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<FieldError>),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("API returned {status}: {message}")]
    Http { status: u16, message: String },
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ApiError {
    /// Map a non-success response to the error taxonomy.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let json: Option<Value> = serde_json::from_str(body).ok();
        let message = json
            .as_ref()
            .and_then(|v| v.get("message").or_else(|| v.get("error")))
            .and_then(|m| m.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                } else {
                    trimmed.to_string()
                }
            });

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized,
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                match json.as_ref().and_then(|v| v.get("errors")).map(field_errors) {
                    Some(errors) if !errors.is_empty() => ApiError::Validation(errors),
                    _ => ApiError::Http {
                        status: status.as_u16(),
                        message,
                    },
                }
            }
            _ => ApiError::Http {
                status: status.as_u16(),
                message,
            },
        }
    }
}

/// Accepts `[{field, message}]`, `[{path, msg}]`, `{field: [msg, ..]}` and
/// `{field: msg}` shapes.
fn field_errors(errors: &Value) -> Vec<FieldError> {
    match errors {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => FieldError::new("", s),
                _ => {
                    let field = ["field", "path", "param"]
                        .iter()
                        .find_map(|k| item.get(*k).and_then(|v| v.as_str()))
                        .unwrap_or("");
                    let message = ["message", "msg"]
                        .iter()
                        .find_map(|k| item.get(*k).and_then(|v| v.as_str()))
                        .unwrap_or("invalid value");
                    FieldError::new(field, message)
                }
            })
            .collect(),
        Value::Object(map) => map
            .iter()
            .flat_map(|(field, v)| match v {
                Value::Array(msgs) => msgs
                    .iter()
                    .filter_map(|m| m.as_str())
                    .map(|m| FieldError::new(field, m))
                    .collect::<Vec<_>>(),
                Value::String(m) => vec![FieldError::new(field, m)],
                _ => vec![],
            })
            .collect(),
        Value::String(s) => vec![FieldError::new("", s)],
        _ => vec![],
    }
}
