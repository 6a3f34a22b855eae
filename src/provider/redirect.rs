use crate::core::types::RedirectUri;

/// The requested redirect URI differs from the registered one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid redirect_uri")]
pub struct RedirectMismatch;

/// Picks the URI to redirect to.
///
/// Only an absent candidate or an exact string match is accepted. Looser
/// matching is left to backends, which may implement their own policy in
/// [`Client::redirect_uri`](crate::auth::Client::redirect_uri).
pub fn resolve(
    candidate: Option<&RedirectUri>,
    configured: &RedirectUri,
) -> Result<RedirectUri, RedirectMismatch> {
    match candidate {
        None => Ok(configured.clone()),
        Some(uri) if uri.0.is_empty() || uri == configured => Ok(configured.clone()),
        Some(_) => Err(RedirectMismatch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(s: &str) -> RedirectUri {
        RedirectUri(s.to_string())
    }

    #[test]
    fn missing_candidate_uses_configured() {
        let configured = uri("http://localhost:7272/pqr?a=b");
        assert_eq!(resolve(None, &configured), Ok(configured.clone()));
        assert_eq!(resolve(Some(&uri("")), &configured), Ok(configured));
    }

    #[test]
    fn exact_match_is_accepted() {
        let configured = uri("http://localhost:7272/pqr?a=b");
        assert_eq!(
            resolve(Some(&uri("http://localhost:7272/pqr?a=b")), &configured),
            Ok(configured)
        );
    }

    #[test]
    fn near_matches_are_rejected() {
        let configured = uri("http://localhost:7272/pqr?a=b");
        for candidate in &[
            "http://localhost:7272/pqr",
            "http://localhost:7272/pqr?a=b&c=d",
            "http://localhost:7272/pqr/?a=b",
            "http://evil.example/pqr?a=b",
            "HTTP://localhost:7272/pqr?a=b",
        ] {
            assert_eq!(
                resolve(Some(&uri(candidate)), &configured),
                Err(RedirectMismatch),
                "{} should not match",
                candidate
            );
        }
    }
}
