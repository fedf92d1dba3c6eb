// Direct reachability probe
//
// A HEAD request that ignores any ambient proxy configuration. Any HTTP
// response counts as reachable, including 4xx/5xx and redirects; only
// connection-level failures and timeouts mean "unreachable". No retries.

use reqwest::redirect::Policy;
use reqwest::Client;
use std::time::Duration;

/// Check whether `url` answers when contacted directly.
pub async fn is_reachable(url: &str, timeout: Duration) -> bool {
    let client = match Client::builder()
        .timeout(timeout)
        .no_proxy()
        .redirect(Policy::none())
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to build probe client");
            return false;
        }
    };

    match client.head(url).send().await {
        Ok(resp) => {
            tracing::debug!(url, status = %resp.status(), "Reachable");
            true
        }
        Err(e) => {
            tracing::debug!(url, error = %e, "Not reachable");
            false
        }
    }
}
