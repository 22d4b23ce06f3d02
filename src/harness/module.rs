use super::Heart;
use crate::library::{BoxedError, EmptyResult};
use async_trait::async_trait;
use futures::lock::Mutex;
use jatsl::{JobScheduler, State, StatusServer};
use std::any::type_name;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument};

type StatusHandle = Option<Arc<Mutex<State>>>;

/// Long running unit of the pipeline, usually a bundle of stream consumers
///
/// The lifecycle hooks are called by a [`ModuleRunner`] in the order they are declared.
#[async_trait]
pub trait Module {
    /// Prepares external resources before any job is scheduled, bounded by the startup timeout
    async fn pre_startup(&mut self) -> EmptyResult {
        Ok(())
    }

    /// Schedules the jobs of the module
    ///
    /// Returning a [`Heart`] keeps the module alive until it dies, at which point the jobs are
    /// terminated. Returning `None` shuts the module down right away.
    async fn run(&mut self, scheduler: &JobScheduler) -> Result<Option<Heart>, BoxedError>;
}

/// Reason why a module has terminated
#[derive(Error, Debug)]
pub enum ModuleTerminationReason {
    /// Startup routine threw an error
    #[error("startup routine threw an error")]
    StartupFailed(#[source] BoxedError),
    /// Scheduling the jobs failed
    #[error("error during operation")]
    OperationalError(#[source] BoxedError),
    /// Process has been asked to terminate
    #[error("terminated due to external signal")]
    Terminated,
    /// Module returned without handing out a heart
    #[error("run loop exited cleanly")]
    ExitedNormally,
    /// Timeout during startup
    #[error("timeout during startup")]
    Timeout,
}

impl ModuleTerminationReason {
    /// Whether the module went down without any fault on its side
    pub fn is_clean(&self) -> bool {
        matches!(
            self,
            ModuleTerminationReason::Terminated | ModuleTerminationReason::ExitedNormally
        )
    }
}

/// Drives a [`Module`] through its lifecycle
pub struct ModuleRunner {
    startup_timeout: Duration,
    job_termination_timeout: Duration,
    status_server_port: Option<u16>,
}

impl Default for ModuleRunner {
    fn default() -> Self {
        Self {
            startup_timeout: Duration::from_secs(60),
            job_termination_timeout: Duration::from_secs(10),
            status_server_port: None,
        }
    }
}

impl ModuleRunner {
    /// Exposes the job states on the given port
    pub fn with_status_server(mut self, port: u16) -> Self {
        self.status_server_port = Some(port);
        self
    }

    /// Maximum time the startup hook may take to connect to external resources
    pub fn with_startup_timeout(mut self, duration: Duration) -> Self {
        self.startup_timeout = duration;
        self
    }

    /// Runs the module until it terminates and reports why it did
    #[instrument(skip(self, module), fields(module = type_name::<M>()))]
    pub async fn run<M: Module + Send + Sync>(&self, mut module: M) -> ModuleTerminationReason {
        let scheduler = JobScheduler::default();
        let status = self.spawn_status_server(&scheduler).await;

        let reason = match timeout(self.startup_timeout, module.pre_startup()).await {
            Ok(Ok(())) => self.operate(&mut module, &scheduler, &status).await,
            Ok(Err(error)) => {
                error!(?error, "Module failed to start");
                ModuleTerminationReason::StartupFailed(error)
            }
            Err(_) => {
                error!(timeout = ?self.startup_timeout, "Module did not start in time");
                ModuleTerminationReason::Timeout
            }
        };

        report(&status, State::Shutdown).await;

        debug!("Terminating consumer jobs");
        scheduler.terminate_jobs(self.job_termination_timeout).await;

        if reason.is_clean() {
            info!(%reason, "Module terminated");
        } else {
            error!(%reason, "Module terminated abnormally");
        }

        reason
    }

    async fn spawn_status_server(&self, scheduler: &JobScheduler) -> StatusHandle {
        let port = self.status_server_port?;
        info!(port, "Spawning status server");

        let (state, server) = StatusServer::new(scheduler, port);
        scheduler.spawn_job(server).await;

        Some(state)
    }

    async fn operate<M: Module + Send + Sync>(
        &self,
        module: &mut M,
        scheduler: &JobScheduler,
        status: &StatusHandle,
    ) -> ModuleTerminationReason {
        let heart = match module.run(scheduler).await {
            Ok(heart) => heart,
            Err(error) => {
                error!(?error, "Module failed to schedule its jobs");
                return ModuleTerminationReason::OperationalError(error);
            }
        };

        report(status, State::Running).await;

        match heart {
            Some(mut heart) => {
                debug!("Module is up, waiting for termination signal");
                heart.death().await;
                ModuleTerminationReason::Terminated
            }
            None => ModuleTerminationReason::ExitedNormally,
        }
    }
}

async fn report(status: &StatusHandle, state: State) {
    if let Some(status) = status {
        *status.lock().await = state;
    }
}
