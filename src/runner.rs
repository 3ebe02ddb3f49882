// Run loop: register once, then sample -> deliver -> sleep until shutdown.
// Single task; shutdown is observed at cycle boundaries, nothing is
// preempted mid-flight.

use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{error, info};

use crate::backend::BackendClient;
use crate::config::{AppConfig, ServerConfig};
use crate::error::CollectorError;
use crate::identity;
use crate::sampler::Sampler;

/// Agent lifecycle. Stopped is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Registering,
    Running,
    Stopped,
}

pub struct Runner {
    backend: BackendClient,
    sampler: Sampler,
    server: ServerConfig,
    register_endpoint: String,
    metrics_endpoint: String,
    interval: Duration,
    retry_attempts: u32,
    retry_delay: Duration,
    state: RunState,
    shutdown_rx: oneshot::Receiver<()>,
}

impl Runner {
    pub fn new(
        config: &AppConfig,
        backend: BackendClient,
        sampler: Sampler,
        shutdown_rx: oneshot::Receiver<()>,
    ) -> Self {
        Self {
            backend,
            sampler,
            server: config.server.clone(),
            register_endpoint: config.backend.register_endpoint.clone(),
            metrics_endpoint: config.backend.metrics_endpoint.clone(),
            interval: Duration::from_secs(config.collection.interval_seconds),
            retry_attempts: config.collection.retry_attempts,
            retry_delay: Duration::from_secs(config.collection.retry_delay_seconds),
            state: RunState::Idle,
            shutdown_rx,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Runs until shutdown or a fatal condition. Registration failure is
    /// fatal and returned; exhausted delivery retries only affect logs.
    pub async fn run(&mut self) -> Result<(), CollectorError> {
        self.state = RunState::Registering;
        let identity = identity::resolve(&self.server);
        info!(
            name = %identity.name,
            hostname = %identity.hostname,
            ip_address = %identity.ip_address,
            os_type = %identity.os_type,
            "resolved host identity"
        );

        let server_id = match self
            .backend
            .register(&self.register_endpoint, &identity)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                self.state = RunState::Stopped;
                error!(error = %e, "registration failed, not entering the sampling loop");
                return Err(e);
            }
        };
        info!(server_id = %server_id, "registered with backend");

        self.state = RunState::Running;
        info!(
            interval_secs = self.interval.as_secs(),
            "starting metrics collection"
        );

        loop {
            let sample = match self.sampler.sample(server_id).await {
                Ok(s) => s,
                Err(e) => {
                    // Unclassified runtime error: a request to stop, not a crash
                    error!(error = %e, operation = "sample", "sampling failed, stopping");
                    break;
                }
            };

            // Outcome only affects logs; the loop always reaches the next cycle
            self.backend
                .deliver(
                    &self.metrics_endpoint,
                    &sample,
                    self.retry_attempts,
                    self.retry_delay,
                )
                .await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = &mut self.shutdown_rx => {
                    info!("shutdown requested, stopping collection");
                    break;
                }
            }
        }

        self.state = RunState::Stopped;
        Ok(())
    }
}
