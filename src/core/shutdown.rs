//! # Termination signals for [`MessageBus::run_until_signal`](crate::MessageBus::run_until_signal).
//!
//! The bus runs until the first termination signal, then publishes
//! `ShutdownRequested` (reason = signal name) and performs its regular
//! graceful `stop()`. Listener installation failure is surfaced as
//! [`RuntimeError::Signal`](crate::RuntimeError) before anything is stopped.
//!
//! Watched: `SIGINT`, `SIGTERM`, `SIGQUIT` on unix; Ctrl-C elsewhere.

/// Resolves with the name of the first termination signal received.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
        _ = quit.recv() => "SIGQUIT",
    };
    Ok(name)
}

/// Resolves with the name of the first termination signal received.
#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
