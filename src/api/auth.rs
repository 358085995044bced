//! Bearer token extraction.
//!
//! The relay does not authenticate callers: it only requires that an
//! `Authorization` header be present and forwards its token upstream as is.

use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::core::{AppError, Result};

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the token to forward upstream.
///
/// A literal `"Bearer "` prefix is stripped when present; any other value is
/// forwarded unchanged. Bytes outside visible ASCII are decoded as UTF-8,
/// with invalid sequences replaced. A missing or empty header is
/// [`AppError::Unauthorized`].
pub fn extract_token(headers: &HeaderMap) -> Result<String> {
    let value = headers
        .get(AUTHORIZATION)
        .map(|v| String::from_utf8_lossy(v.as_bytes()))
        .filter(|v| !v.is_empty())
        .ok_or(AppError::Unauthorized)?;

    Ok(value.strip_prefix(BEARER_PREFIX).unwrap_or(&value).to_string())
}
