//! Structures to keep the process alive until it is asked to terminate

use futures::{pin_mut, select, FutureExt};
use tokio::signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tracing::{debug, warn};

/// Lifecycle management struct that keeps the application alive
///
/// Consumer modules hand one out after scheduling their jobs, the process then runs until it
/// receives SIGTERM or SIGINT.
#[derive(Debug, Default)]
pub struct Heart {
    _private: (),
}

impl Heart {
    /// Creates a new heart
    pub fn new() -> Self {
        Self::default()
    }

    /// Future that resolves once the process has been asked to terminate
    pub async fn death(&mut self) {
        debug!("Heart starts beating");

        let ctrl_c = ctrl_c().fuse();

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm_stream) => {
                let sigterm = sigterm_stream.recv().fuse();
                pin_mut!(sigterm, ctrl_c);

                select! {
                    _ = sigterm => debug!("Received SIGTERM"),
                    _ = ctrl_c => debug!("Received SIGINT"),
                };
            }
            Err(error) => {
                warn!(?error, "Unable to listen for SIGTERM, relying on ctrl-c");
                let _ = ctrl_c.await;
            }
        }
    }
}
