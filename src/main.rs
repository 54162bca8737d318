//! Shoot Scheduler
//!
//! Assigns unscheduled Shoots to Seed clusters.
//!
//! ## Usage
//!
//! ```bash
//! # Run the scheduler (requires kubeconfig)
//! shoot-scheduler
//!
//! # Schedule onto the closest region instead of requiring an exact match
//! shoot-scheduler --strategy MinimalDistance
//!
//! # Run with custom log level
//! RUST_LOG=debug shoot-scheduler
//! ```

use clap::Parser;
use kube::Client;
use shoot_scheduler::leader_election::{self, LeaderElector};
use shoot_scheduler::{SchedulerConfig, SchedulerController, Strategy};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Shoot Scheduler
#[derive(Parser, Debug)]
#[command(name = "shoot-scheduler")]
#[command(version, about = "Schedules Shoot control planes onto Seed clusters")]
struct Args {
    /// Seed determination strategy (SameRegion or MinimalDistance)
    #[arg(long, default_value = "SameRegion")]
    strategy: String,

    /// Number of Shoots reconciled in parallel
    #[arg(long, default_value = "20")]
    concurrent_syncs: u16,

    /// Enable leader election for HA deployments
    #[arg(long, default_value = "false")]
    leader_election: bool,

    /// Namespace for the leader election Lease (auto-detected if empty)
    #[arg(long, default_value = "")]
    leader_election_namespace: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let args = Args::parse();
    let config = SchedulerConfig {
        strategy: args.strategy.parse::<Strategy>()?,
        concurrent_syncs: args.concurrent_syncs,
    };

    info!("Starting Shoot Scheduler");
    info!("Strategy: {}", config.strategy);
    info!("Concurrent syncs: {}", config.concurrent_syncs);
    info!("Leader election: {}", args.leader_election);

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes API server");

    // Leader election — acquire lease before starting the controller
    let elector = if args.leader_election {
        let ns = leader_election::detect_namespace(&args.leader_election_namespace);
        info!("Leader election namespace: {}", ns);
        let elector = LeaderElector::new(client.clone(), &ns);
        elector.acquire().await?;
        Some(Arc::new(elector))
    } else {
        None
    };

    let controller = Arc::new(SchedulerController::new(client, config));
    let scheduler_handle = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            if let Err(e) = controller.run().await {
                error!("Scheduler controller error: {}", e);
            }
        })
    };

    // Periodic lease renewal (no-op future when leader election is disabled)
    let elector_for_renew = elector.clone();
    let renew_handle = tokio::spawn(async move {
        match elector_for_renew {
            Some(e) => loop {
                tokio::time::sleep(e.renew_interval()).await;
                match e.renew().await {
                    Ok(true) => {}
                    Ok(false) => {
                        error!("Lost leader lease");
                        break;
                    }
                    Err(err) => {
                        error!("Failed to renew leader lease: {}", err);
                        break;
                    }
                }
            },
            None => std::future::pending::<()>().await,
        }
    });

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
        result = scheduler_handle => {
            if let Err(e) = result {
                error!("Scheduler controller task failed: {}", e);
            }
        }
        _ = renew_handle => {
            error!("Leader lease lost, initiating shutdown");
        }
    }

    // Release the lease before exiting so a standby replica can take over immediately
    if let Some(e) = &elector {
        e.release().await;
    }

    info!("Shoot Scheduler shutting down");
    Ok(())
}
