//! Stops the server when the process is asked to exit.

use std::{fmt, io, time::Duration};

use salvo::server::ServerHandle;
use thiserror::Error;
use tokio::signal;
use tracing::info;

/// The signal that asked the process to exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExitSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for ExitSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
        })
    }
}

#[derive(Debug, Error)]
#[error("failed to install {signal} handler")]
pub(crate) struct SignalHandlerError {
    signal: ExitSignal,
    #[source]
    source: io::Error,
}

async fn interrupt() -> Result<ExitSignal, SignalHandlerError> {
    signal::ctrl_c()
        .await
        .map(|()| ExitSignal::Interrupt)
        .map_err(|source| SignalHandlerError {
            signal: ExitSignal::Interrupt,
            source,
        })
}

#[cfg(unix)]
async fn terminate() -> Result<ExitSignal, SignalHandlerError> {
    let mut terminations = signal::unix::signal(signal::unix::SignalKind::terminate())
        .map_err(|source| SignalHandlerError {
            signal: ExitSignal::Terminate,
            source,
        })?;

    terminations.recv().await;

    Ok(ExitSignal::Terminate)
}

#[cfg(not(unix))]
async fn terminate() -> Result<ExitSignal, SignalHandlerError> {
    std::future::pending().await
}

/// Resolves with whichever exit signal arrives first.
pub(crate) async fn exit_signal() -> Result<ExitSignal, SignalHandlerError> {
    tokio::select! {
        signal = interrupt() => signal,
        signal = terminate() => signal,
    }
}

/// Stop accepting connections on the first exit signal.
///
/// In-flight requests get `grace` to finish, or as long as they need when it is `None`.
pub(crate) async fn stop_on_exit_signal(
    handle: ServerHandle,
    grace: Option<Duration>,
) -> Result<(), SignalHandlerError> {
    let signal = exit_signal().await?;

    info!(
        %signal,
        grace_seconds = grace.map(|grace| grace.as_secs()),
        "stopping identity server"
    );

    handle.stop_graceful(grace);

    Ok(())
}
