//! Kubernetes Lease-based leader election for HA scheduler deployments.
//!
//! When several scheduler replicas run at once, only the holder of the
//! Lease reconciles Shoots; the others block in [`LeaderElector::acquire`]
//! until the current holder's lease expires or is released.

use chrono::Utc;
use k8s_openapi::api::coordination::v1::{Lease, LeaseSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{MicroTime, ObjectMeta};
use kube::api::{Api, PostParams};
use kube::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

const LEASE_NAME: &str = "shoot-scheduler-leader";
const LEASE_DURATION_SECS: i32 = 15;
const RENEW_INTERVAL: Duration = Duration::from_secs(10);
const RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Detects the namespace for leader election.
///
/// Priority: explicit argument → service account file → `"default"`.
pub fn detect_namespace(explicit: &str) -> String {
    if !explicit.is_empty() {
        return explicit.to_string();
    }
    std::fs::read_to_string("/var/run/secrets/kubernetes.io/serviceaccount/namespace")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|_| "default".to_string())
}

/// Lease-based leader election using a `coordination.k8s.io/v1` Lease.
/// Conflicting writes lose on `resourceVersion`, so at most one replica
/// holds the lease at any time.
pub struct LeaderElector {
    lease_api: Api<Lease>,
    identity: String,
}

impl LeaderElector {
    pub fn new(client: Client, namespace: &str) -> Self {
        let lease_api = Api::<Lease>::namespaced(client, namespace);
        let identity = std::env::var("POD_NAME")
            .or_else(|_| std::env::var("HOSTNAME"))
            .unwrap_or_else(|_| format!("scheduler-{:08x}", rand::random::<u32>()));
        info!(identity = %identity, namespace = %namespace, "Initialized leader elector");
        Self {
            lease_api,
            identity,
        }
    }

    /// Blocks until the lease is successfully acquired.
    pub async fn acquire(&self) -> anyhow::Result<()> {
        info!(identity = %self.identity, "Waiting to acquire leader lease '{}'", LEASE_NAME);
        loop {
            match self.try_acquire().await {
                Ok(true) => {
                    info!(identity = %self.identity, "Acquired leader lease");
                    return Ok(());
                }
                Ok(false) => {
                    debug!("Lease held by another instance, retrying in {:?}", RETRY_INTERVAL);
                    tokio::time::sleep(RETRY_INTERVAL).await;
                }
                Err(e) => {
                    warn!("Lease acquisition error: {}, retrying in {:?}", e, RETRY_INTERVAL);
                    tokio::time::sleep(RETRY_INTERVAL).await;
                }
            }
        }
    }

    /// Renews the lease. Returns `Ok(true)` if still leader, `Ok(false)` if lost.
    pub async fn renew(&self) -> anyhow::Result<bool> {
        let lease = self.lease_api.get(LEASE_NAME).await?;
        if !self.held_by_us(&lease) {
            return Ok(false);
        }
        self.write_lease(Some(lease), false).await
    }

    /// Releases the lease by clearing the holder identity, so a standby
    /// replica can take over without waiting for expiry.
    pub async fn release(&self) {
        let lease = match self.lease_api.get(LEASE_NAME).await {
            Ok(l) => l,
            Err(e) => {
                warn!("Failed to read lease for release: {}", e);
                return;
            }
        };
        if !self.held_by_us(&lease) {
            debug!("Lease not held by us, skipping release");
            return;
        }

        let mut updated = lease;
        if let Some(spec) = updated.spec.as_mut() {
            spec.holder_identity = None;
        }
        match self
            .lease_api
            .replace(LEASE_NAME, &PostParams::default(), &updated)
            .await
        {
            Ok(_) => info!("Released leader lease"),
            Err(e) => warn!("Failed to release leader lease: {}", e),
        }
    }

    /// Returns the recommended interval between lease renewals.
    pub fn renew_interval(&self) -> Duration {
        RENEW_INTERVAL
    }

    async fn try_acquire(&self) -> anyhow::Result<bool> {
        match self.lease_api.get(LEASE_NAME).await {
            Ok(existing) => {
                if self.held_by_us(&existing) {
                    self.write_lease(Some(existing), false).await
                } else if is_expired(existing.spec.as_ref()) {
                    self.write_lease(Some(existing), true).await
                } else {
                    Ok(false)
                }
            }
            Err(kube::Error::Api(ae)) if ae.code == 404 => self.write_lease(None, true).await,
            Err(e) => Err(e.into()),
        }
    }

    fn held_by_us(&self, lease: &Lease) -> bool {
        lease
            .spec
            .as_ref()
            .and_then(|s| s.holder_identity.as_deref())
            == Some(self.identity.as_str())
    }

    /// Creates or replaces the lease with us as the holder. A 409 means
    /// another replica won the race; that is reported as "not acquired",
    /// not as an error.
    async fn write_lease(&self, existing: Option<Lease>, takeover: bool) -> anyhow::Result<bool> {
        let now = MicroTime(Utc::now());
        let prev = existing.as_ref().and_then(|l| l.spec.as_ref());
        let transitions = prev.and_then(|s| s.lease_transitions).unwrap_or(0);

        let spec = LeaseSpec {
            holder_identity: Some(self.identity.clone()),
            lease_duration_seconds: Some(LEASE_DURATION_SECS),
            acquire_time: if takeover {
                Some(now.clone())
            } else {
                prev.and_then(|s| s.acquire_time.clone())
            },
            renew_time: Some(now),
            lease_transitions: Some(if takeover && existing.is_some() {
                transitions + 1
            } else {
                transitions
            }),
        };

        let result = match existing {
            Some(mut lease) => {
                lease.spec = Some(spec);
                self.lease_api
                    .replace(LEASE_NAME, &PostParams::default(), &lease)
                    .await
            }
            None => {
                let lease = Lease {
                    metadata: ObjectMeta {
                        name: Some(LEASE_NAME.to_string()),
                        ..Default::default()
                    },
                    spec: Some(spec),
                };
                self.lease_api.create(&PostParams::default(), &lease).await
            }
        };

        match result {
            Ok(_) => Ok(true),
            Err(kube::Error::Api(ae)) if ae.code == 409 => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn is_expired(spec: Option<&LeaseSpec>) -> bool {
    let renew_time = spec.and_then(|s| s.renew_time.as_ref());
    let duration_secs = spec
        .and_then(|s| s.lease_duration_seconds)
        .unwrap_or(LEASE_DURATION_SECS) as i64;

    match renew_time {
        Some(MicroTime(t)) => Utc::now().signed_duration_since(*t).num_seconds() > duration_secs,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_namespace_explicit_wins() {
        assert_eq!(detect_namespace("garden"), "garden");
    }

    #[test]
    fn test_is_expired_without_renew_time() {
        assert!(is_expired(None));
        assert!(is_expired(Some(&LeaseSpec::default())));
    }

    #[test]
    fn test_is_expired_respects_duration() {
        let fresh = LeaseSpec {
            renew_time: Some(MicroTime(Utc::now())),
            lease_duration_seconds: Some(15),
            ..Default::default()
        };
        assert!(!is_expired(Some(&fresh)));

        let stale = LeaseSpec {
            renew_time: Some(MicroTime(Utc::now() - chrono::Duration::seconds(60))),
            lease_duration_seconds: Some(15),
            ..Default::default()
        };
        assert!(is_expired(Some(&stale)));
    }
}
