//! Token and identity extraction from heterogeneous login responses.
//!
//! The backend services have disagreed over time about where the issued
//! token lives. Rather than a long if/else chain, the candidate locations
//! are an ordered list of tagged strategies tried in sequence; the first
//! hit wins.

use reqwest::header::HeaderMap;
use serde_json::Value;

/// One place a token may appear in a login response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// A response header, matched case-insensitively.
    Header(&'static str),
    /// A top-level body field.
    BodyField(&'static str),
    /// A field nested under the body's `content` object.
    ContentField(&'static str),
}

/// Candidate locations for the token issued at login, in probe order.
pub const LOGIN_TOKEN_SOURCES: &[TokenSource] = &[
    TokenSource::Header("authorization"),
    TokenSource::Header("x-auth-token"),
    TokenSource::BodyField("token"),
    TokenSource::BodyField("accessToken"),
    TokenSource::BodyField("jwt"),
    TokenSource::BodyField("access-token"),
    TokenSource::ContentField("token"),
    TokenSource::ContentField("accessToken"),
];

impl TokenSource {
    /// Probe this location; `None` when the token is not here.
    pub fn extract(&self, headers: &HeaderMap, body: &Value) -> Option<String> {
        match self {
            Self::Header(name) => headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .map(|raw| strip_bearer(raw).to_string()),
            Self::BodyField(name) => body
                .get(*name)
                .and_then(Value::as_str)
                .map(str::to_string),
            Self::ContentField(name) => body
                .get("content")
                .and_then(|content| content.get(*name))
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

/// Try every known location in order, first success wins.
pub fn extract_login_token(headers: &HeaderMap, body: &Value) -> Option<String> {
    LOGIN_TOKEN_SOURCES
        .iter()
        .find_map(|source| source.extract(headers, body))
}

/// Drop a `Bearer ` prefix when present.
pub fn strip_bearer(raw: &str) -> &str {
    raw.strip_prefix("Bearer ").unwrap_or(raw)
}

/// Bearer token from a response's `Authorization` header, as the refresh
/// endpoint returns it.
pub fn bearer_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(reqwest::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|raw| strip_bearer(raw).to_string())
}

const MEMBER_ID_FIELDS: &[&str] = &["memberId", "member_id", "id", "userId", "user_id"];

/// Locate the numeric member id in a login body, including under the
/// `content` and `data` wrappers some services add.
pub fn extract_member_id(body: &Value) -> Option<i64> {
    let as_id = |v: &Value| v.as_i64().or_else(|| v.as_str()?.parse().ok());

    for field in MEMBER_ID_FIELDS {
        if let Some(id) = body.get(*field).and_then(as_id) {
            return Some(id);
        }
    }
    for wrapper in ["content", "data"] {
        if let Some(nested) = body.get(wrapper) {
            for field in ["memberId", "id"] {
                if let Some(id) = nested.get(field).and_then(as_id) {
                    return Some(id);
                }
            }
        }
    }
    None
}
