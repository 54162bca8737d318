//! Shoot scheduling controller
//!
//! Watches Shoots and, for every one without a Seed binding, runs the
//! candidate pipeline and writes the chosen Seed's name through the
//! `binding` subresource. All state lives in the API server; each
//! reconcile works on freshly listed snapshots.

use crate::candidates;
use crate::config::SchedulerConfig;
use crate::crd::{CloudProfile, Seed, Shoot};
use crate::error::{Result, SchedulerError};
use futures::StreamExt;
use kube::api::{Api, ListParams, PostParams};
use kube::runtime::controller::{self, Action, Controller};
use kube::runtime::events::{Event, EventType, Recorder, Reporter};
use kube::runtime::watcher;
use kube::{Client, Resource, ResourceExt};
use std::sync::Arc;
use tracing::{error, info};

/// Event reason emitted on the Shoot after a successful binding
pub const EVENT_SCHEDULING_SUCCESSFUL: &str = "ShootSchedulingSuccessful";

/// Event reason emitted on the Shoot when scheduling or binding fails
pub const EVENT_SCHEDULING_FAILED: &str = "ShootSchedulingFailed";

/// Context for the scheduler controller
pub struct SchedulerController {
    client: Client,
    config: SchedulerConfig,
    reporter: Reporter,
}

impl SchedulerController {
    /// Create a new scheduler controller
    pub fn new(client: Client, config: SchedulerConfig) -> Self {
        let reporter = Reporter {
            controller: "shoot-scheduler".to_string(),
            instance: std::env::var("POD_NAME").ok(),
        };
        Self {
            client,
            config,
            reporter,
        }
    }

    /// Run the scheduler controller
    pub async fn run(self: Arc<Self>) -> Result<()> {
        let shoots: Api<Shoot> = Api::all(self.client.clone());

        info!(
            strategy = %self.config.strategy,
            concurrent_syncs = self.config.concurrent_syncs,
            "Starting Shoot scheduler controller"
        );

        Controller::new(shoots, watcher::Config::default())
            .with_config(controller::Config::default().concurrency(self.config.concurrent_syncs))
            .shutdown_on_signal()
            .run(
                |shoot, ctx| async move { ctx.reconcile(shoot).await },
                super::error_policy_backoff,
                Arc::clone(&self),
            )
            .for_each(|result| async move {
                match result {
                    Ok((obj, _action)) => {
                        info!("Reconciled shoot: {}", obj.name);
                    }
                    Err(e) => {
                        error!("Reconciliation failed: {:?}", e);
                    }
                }
            })
            .await;

        Ok(())
    }

    /// Reconcile a single Shoot: bind it to a Seed or report why not.
    async fn reconcile(&self, shoot: Arc<Shoot>) -> std::result::Result<Action, SchedulerError> {
        let name = shoot.name_any();
        let namespace = shoot.namespace().unwrap_or_else(|| "default".to_string());
        let shoots: Api<Shoot> = Api::namespaced(self.client.clone(), &namespace);

        // Decide on a fresh read, not on the watch cache
        let Some(mut shoot) = shoots.get_opt(&name).await? else {
            info!("Shoot {}/{} is gone, stop reconciling", namespace, name);
            return Ok(Action::await_change());
        };

        if let Some(seed_name) = shoot.spec.seed_name.as_ref().filter(|s| !s.is_empty()) {
            info!(
                "Shoot {}/{} already scheduled onto seed {}, nothing left to do",
                namespace, name, seed_name
            );
            return Ok(Action::await_change());
        }

        if shoot.metadata.deletion_timestamp.is_some() {
            info!(
                "Ignoring shoot {}/{} because it has been marked for deletion",
                namespace, name
            );
            return Ok(Action::await_change());
        }

        let seed = match self.determine_seed(&shoot).await {
            Ok(seed) => seed,
            Err(err) => {
                self.report_failed_scheduling(&shoot, &err).await;
                return Err(err);
            }
        };
        let seed_name = seed.name_any();

        // The binding subresource narrows the write surface to seedName
        shoot.spec.seed_name = Some(seed_name.clone());
        if let Err(err) = shoots
            .replace_subresource(
                "binding",
                &name,
                &PostParams::default(),
                serde_json::to_vec(&shoot)?,
            )
            .await
        {
            error!(
                "Failed to bind shoot {}/{} to seed {}: {}",
                namespace, name, seed_name, err
            );
            let err = SchedulerError::from(err);
            self.report_failed_scheduling(&shoot, &err).await;
            return Err(err);
        }

        info!(
            cloudprofile = %shoot.spec.cloud_profile_name,
            region = %shoot.spec.region,
            seed = %seed_name,
            strategy = %self.config.strategy,
            "Shoot successfully scheduled to seed"
        );

        self.report_event(
            &shoot,
            EventType::Normal,
            EVENT_SCHEDULING_SUCCESSFUL,
            format!("Scheduled to seed '{}'", seed_name),
        )
        .await;

        Ok(Action::await_change())
    }

    /// Fetches the scheduling snapshot (all Seeds, all Shoots, the
    /// referenced CloudProfile) and runs the candidate pipeline.
    async fn determine_seed(&self, shoot: &Shoot) -> std::result::Result<Seed, SchedulerError> {
        let seeds: Api<Seed> = Api::all(self.client.clone());
        let seed_list = seeds.list(&ListParams::default()).await?.items;

        let all_shoots: Api<Shoot> = Api::all(self.client.clone());
        let shoot_list = all_shoots.list(&ListParams::default()).await?.items;

        let profile_name = &shoot.spec.cloud_profile_name;
        let profiles: Api<CloudProfile> = Api::all(self.client.clone());
        let cloud_profile = match profiles.get(profile_name).await {
            Ok(profile) => profile,
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                return Err(SchedulerError::NotFound(format!(
                    "cloud profile '{}'",
                    profile_name
                )));
            }
            Err(err) => return Err(err.into()),
        };

        let seed = candidates::determine_seed(
            shoot,
            &seed_list,
            &shoot_list,
            &cloud_profile,
            self.config.strategy,
        )?;
        Ok(seed)
    }

    async fn report_failed_scheduling(&self, shoot: &Shoot, err: &SchedulerError) {
        self.report_event(
            shoot,
            EventType::Warning,
            EVENT_SCHEDULING_FAILED,
            format!("Failed to schedule shoot '{}': {}", shoot.name_any(), err),
        )
        .await;
    }

    /// Publishes an event on the Shoot. Event delivery is best effort and
    /// never fails the reconcile.
    async fn report_event(
        &self,
        shoot: &Shoot,
        event_type: EventType,
        reason: &str,
        note: String,
    ) {
        let recorder = Recorder::new(
            self.client.clone(),
            self.reporter.clone(),
            shoot.object_ref(&()),
        );
        let event = Event {
            type_: event_type,
            reason: reason.to_string(),
            note: Some(note),
            action: "Scheduling".to_string(),
            secondary: None,
        };
        if let Err(err) = recorder.publish(event).await {
            error!(
                "Failed to publish event for shoot {}: {}",
                shoot.name_any(),
                err
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_reasons() {
        assert_eq!(EVENT_SCHEDULING_SUCCESSFUL, "ShootSchedulingSuccessful");
        assert_eq!(EVENT_SCHEDULING_FAILED, "ShootSchedulingFailed");
    }

    #[test]
    fn test_scheduler_controller() {
        // Controller tests require a k8s cluster; the candidate pipeline
        // it delegates to is covered in crate::candidates.
    }
}
