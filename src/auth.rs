use axum::extract::OptionalFromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use std::convert::Infallible;

// Set by the session layer in front of us once the cookie has been verified.
// Like the forwarding headers below, only meaningful behind a proxy that
// overwrites it; the /api limiter ignores forwarding headers unless
// --trust-proxy is set.
pub const USER_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
}

impl<S> OptionalFromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(current_user(&parts.headers))
    }
}

pub fn current_user(headers: &HeaderMap) -> Option<CurrentUser> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| CurrentUser { id: id.to_owned() })
}

/// Best guess at who is calling: first hop of `x-forwarded-for`, then
/// `x-real-ip`, then whatever the caller passes in.
pub fn client_identifier(headers: &HeaderMap, fallback: &str) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or(fallback)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_user_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(current_user(&headers), None);

        headers.insert(USER_HEADER, HeaderValue::from_static("  "));
        assert_eq!(current_user(&headers), None);

        headers.insert(USER_HEADER, HeaderValue::from_static("alice"));
        assert_eq!(current_user(&headers), Some(CurrentUser { id: "alice".into() }));
    }

    #[test]
    fn client_identifier_precedence() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_identifier(&headers, "unknown"), "unknown");

        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(client_identifier(&headers, "unknown"), "10.0.0.9");

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 10.0.0.1"),
        );
        assert_eq!(client_identifier(&headers, "unknown"), "1.2.3.4");
    }
}
