//! Shared-secret authorization
//!
//! Reads are public. Writes and deletes need the configured header to carry
//! the configured secret. Every other method is denied outright, which means
//! unsupported methods are answered with 403 before dispatch can reach 405.

use hyper::{HeaderMap, Method};
use subtle::ConstantTimeEq;

use crate::config::AuthConfig;

/// Decide whether a request may proceed to storage
pub fn authorize(method: &Method, headers: &HeaderMap, auth: &AuthConfig) -> bool {
    match *method {
        Method::GET => true,
        Method::PUT | Method::DELETE => has_secret(headers, auth),
        _ => false,
    }
}

fn has_secret(headers: &HeaderMap, auth: &AuthConfig) -> bool {
    // An unset secret must not match an empty header value
    if auth.secret.is_empty() {
        return false;
    }
    headers
        .get(auth.header.as_str())
        .is_some_and(|value| secret_eq(value.as_bytes(), auth.secret.as_bytes()))
}

/// Constant-time comparison; slices of different lengths never match
fn secret_eq(provided: &[u8], expected: &[u8]) -> bool {
    provided.ct_eq(expected).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    fn auth() -> AuthConfig {
        AuthConfig {
            header: "X-Custom-Auth-Key".to_string(),
            secret: "s3cret".to_string(),
        }
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-custom-auth-key", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_get_always_allowed() {
        assert!(authorize(&Method::GET, &HeaderMap::new(), &auth()));
        assert!(authorize(&Method::GET, &headers_with("wrong"), &auth()));
    }

    #[test]
    fn test_writes_need_exact_secret() {
        for method in [Method::PUT, Method::DELETE] {
            assert!(authorize(&method, &headers_with("s3cret"), &auth()));
            assert!(!authorize(&method, &headers_with("s3cret "), &auth()));
            assert!(!authorize(&method, &headers_with("S3CRET"), &auth()));
            assert!(!authorize(&method, &HeaderMap::new(), &auth()));
        }
    }

    #[test]
    fn test_secret_length_mismatch() {
        assert!(!secret_eq(b"s3cre", b"s3cret"));
        assert!(!secret_eq(b"s3cret!", b"s3cret"));
        assert!(!secret_eq(b"", b"s3cret"));
        assert!(secret_eq(b"s3cret", b"s3cret"));
    }

    #[test]
    fn test_other_methods_denied() {
        for method in [
            Method::POST,
            Method::PATCH,
            Method::HEAD,
            Method::OPTIONS,
            Method::from_bytes(b"PURGE").unwrap(),
        ] {
            assert!(!authorize(&method, &headers_with("s3cret"), &auth()));
        }
    }

    // Stricter than a plain equality check: with no secret configured, an
    // empty header value would otherwise match and open writes to anyone.
    #[test]
    fn test_empty_secret_never_authorizes() {
        let open = AuthConfig {
            header: "X-Custom-Auth-Key".to_string(),
            secret: String::new(),
        };
        assert!(!authorize(&Method::PUT, &headers_with(""), &open));
        assert!(!authorize(&Method::DELETE, &HeaderMap::new(), &open));
        assert!(authorize(&Method::GET, &HeaderMap::new(), &open));
    }
}
