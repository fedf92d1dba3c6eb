// Two-phase proxy resolution against proxy-hosting instances
//
// Phase 1 asks every instance for proxies it already hosts. Phase 2 only
// starts after Phase 1 has visited every instance, so no instance is asked
// to create a proxy that another one already provides.

use anyhow::Result;

use super::ordered::first_success;
use super::target::Target;
use crate::network::InstanceClient;

/// Where a proxy address came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Found {
    pub instance: String,
    pub shared_url: String,
}

/// Phase 1: first instance hosting a proxy whose original URL has the
/// target's hostname.
pub async fn find_existing(
    client: &InstanceClient,
    instances: &[String],
    target: &Target,
) -> Option<Found> {
    first_success("existing-proxy lookup", instances, |instance| async move {
        let services = client.services(instance).await?;
        Ok(services
            .into_iter()
            .find(|s| target.matches_host(&s.original_url))
            .map(|s| Found {
                instance: instance.clone(),
                shared_url: s.shared_url,
            }))
    })
    .await
}

/// Phase 2: ask each instance that can reach the target to create a proxy.
///
/// A failed creation on one instance moves on to the next one.
pub async fn create_on_demand(
    client: &InstanceClient,
    instances: &[String],
    target: &Target,
) -> Option<Found> {
    first_success("proxy creation", instances, |instance| async move {
        create_on(client, instance, target).await
    })
    .await
}

async fn create_on(
    client: &InstanceClient,
    instance: &str,
    target: &Target,
) -> Result<Option<Found>> {
    if !client.can_reach(instance, target.normalized()).await? {
        tracing::debug!(instance = %instance, url = %target, "Instance cannot reach target");
        return Ok(None);
    }

    tracing::debug!(instance = %instance, "Instance can reach target, requesting proxy");
    let shared_url = client.create_proxy(instance, target.normalized()).await?;
    tracing::info!(instance = %instance, proxy = %shared_url, "Created proxy");
    Ok(Some(Found {
        instance: instance.to_string(),
        shared_url,
    }))
}
