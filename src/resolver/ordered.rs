// Ordered first-success iteration
//
// Discovery candidates, registry hosts and both resolution phases share one
// shape: try each item in turn, stop at the first that yields a value, log
// and skip the ones that fail. Unreachable peers are routine and logged at
// debug; a peer that answers with garbage is logged at warn.

use anyhow::Result;
use std::fmt::Display;
use std::future::Future;

/// Try `attempt` on each item in order and return the first `Ok(Some(_))`.
///
/// `Ok(None)` means the item answered but had nothing for us; `Err` is a
/// per-item failure. Both move on to the next item. Items are never tried
/// concurrently.
pub async fn first_success<I, T, F, Fut>(stage: &str, items: I, mut attempt: F) -> Option<T>
where
    I: IntoIterator,
    I::Item: Display,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<Option<T>>>,
{
    for item in items {
        let label = item.to_string();
        match attempt(item).await {
            Ok(Some(value)) => {
                tracing::debug!(stage, item = %label, "Succeeded");
                return Some(value);
            }
            Ok(None) => {
                tracing::debug!(stage, item = %label, "Nothing found, trying next");
            }
            Err(e) if is_transport_failure(&e) => {
                tracing::debug!(stage, item = %label, error = %format!("{:#}", e), "Unreachable, trying next");
            }
            Err(e) => {
                tracing::warn!(stage, item = %label, error = %format!("{:#}", e), "Failed, trying next");
            }
        }
    }
    None
}

/// Timeouts, refused connections and TLS failures, as opposed to a peer
/// that answered with something unusable.
pub fn is_transport_failure(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        if let Some(e) = cause.downcast_ref::<reqwest::Error>() {
            return e.is_timeout() || e.is_connect();
        }
        cause.is::<std::io::Error>()
            || cause.is::<tokio::time::error::Elapsed>()
            || cause.is::<rustls::Error>()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Context};

    #[tokio::test]
    async fn test_returns_first_value_and_stops() {
        let mut seen = Vec::new();
        let result = first_success("test", [1, 2, 3, 4], |n| {
            seen.push(n);
            async move { Ok(if n >= 2 { Some(n * 10) } else { None }) }
        })
        .await;
        assert_eq!(result, Some(20));
        assert_eq!(seen, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_errors_do_not_abort() {
        let result = first_success("test", ["a", "b"], |s| async move {
            if s == "a" {
                Err(anyhow!("boom"))
            } else {
                Ok(Some(s.to_uppercase()))
            }
        })
        .await;
        assert_eq!(result.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn test_exhaustion_is_none() {
        let result: Option<()> =
            first_success("test", Vec::<String>::new(), |_| async { Ok(None) }).await;
        assert!(result.is_none());

        let result: Option<u8> =
            first_success("test", [1, 2], |_| async { Err(anyhow!("nope")) }).await;
        assert!(result.is_none());
    }

    #[test]
    fn test_transport_failures_are_told_apart_from_bad_answers() {
        let refused: anyhow::Error = std::io::Error::from(std::io::ErrorKind::ConnectionRefused).into();
        assert!(is_transport_failure(&refused.context("Failed to connect to 192.168.1.2:45679")));

        let tls = anyhow::Error::from(rustls::Error::InvalidCertificate(
            rustls::CertificateError::UnknownIssuer,
        ));
        assert!(is_transport_failure(&tls));

        let malformed = serde_json::from_str::<Vec<u8>>("{oops")
            .context("Malformed instance list")
            .unwrap_err();
        assert!(!is_transport_failure(&malformed));
        assert!(!is_transport_failure(&anyhow!("unexpected status 500")));
    }

    #[tokio::test]
    async fn test_elapsed_timeout_is_transport_failure() {
        let elapsed = tokio::time::timeout(
            std::time::Duration::from_millis(1),
            std::future::pending::<()>(),
        )
        .await
        .context("Timed out talking to 192.168.1.2")
        .unwrap_err();
        assert!(is_transport_failure(&elapsed));
    }
}
