//! Cancellation plumbing between the runner and group execution.
//!
//! Two directions:
//! - [`Interrupts`] carries operator interrupts *into* the runner. The OS
//!   signal listener is only one source; tests and embedders feed it through
//!   an [`InterruptHandle`].
//! - [`CancellationToken`] carries the stop request *out* to a running group.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

const INTERRUPT_BUFFER_LEN: usize = 10;

/// Why a run stopped executing groups normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    GlobalTimeout,
    Interrupt,
}

impl AbortReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbortReason::GlobalTimeout => "global time-out",
            AbortReason::Interrupt => "interrupt",
        }
    }
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cooperative stop flag shared with a group's execution.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

/// Sending side of an [`Interrupts`] source.
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    tx: mpsc::Sender<()>,
}

impl InterruptHandle {
    /// Raise an interrupt. Returns false if the receiving side is gone or
    /// the buffer is full.
    pub fn interrupt(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }
}

/// Receiving side of operator interrupts.
#[derive(Debug)]
pub struct Interrupts {
    rx: mpsc::Receiver<()>,
}

impl Interrupts {
    pub fn channel() -> (InterruptHandle, Interrupts) {
        let (tx, rx) = mpsc::channel(INTERRUPT_BUFFER_LEN);
        (InterruptHandle { tx }, Interrupts { rx })
    }

    /// A source that never fires.
    pub fn never() -> Interrupts {
        let (_, interrupts) = Self::channel();
        interrupts
    }

    /// Forward SIGINT and SIGTERM (Ctrl-C elsewhere) into a new source.
    ///
    /// Must be called from within a tokio runtime. The listener task exits
    /// on the first signal delivered after the returned source is dropped.
    pub fn from_os_signals() -> std::io::Result<Interrupts> {
        let (handle, interrupts) = Self::channel();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = signal(SignalKind::terminate())?;
            let mut sigint = signal(SignalKind::interrupt())?;
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = sigterm.recv() => {}
                        _ = sigint.recv() => {}
                    }
                    if handle.tx.send(()).await.is_err() {
                        break;
                    }
                }
            });
        }
        #[cfg(not(unix))]
        {
            tokio::spawn(async move {
                while tokio::signal::ctrl_c().await.is_ok() {
                    if handle.tx.send(()).await.is_err() {
                        break;
                    }
                }
            });
        }

        Ok(interrupts)
    }

    /// Wait for the next interrupt. Pends forever once every sender is gone.
    pub async fn recv(&mut self) {
        if self.rx.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }

    /// Drop interrupts that arrived between runs.
    pub(crate) fn drain(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }
}
