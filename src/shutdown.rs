/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Cancellation signal shared by the long-running network tasks.

use tokio::sync::watch;

/// Owner side of a one-shot shutdown signal.
#[derive(Debug)]
pub(crate) struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Raises the signal. Returns `false` if it was already raised.
    pub(crate) fn signal(&self) -> bool {
        self.tx.send_if_modified(|signalled| {
            if *signalled {
                false
            } else {
                *signalled = true;
                true
            }
        })
    }

    pub(crate) fn is_signalled(&self) -> bool {
        *self.tx.borrow()
    }

    pub(crate) fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }
}

/// Receiver side, cloned into every task that must stop on shutdown.
#[derive(Debug, Clone)]
pub(crate) struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Completes once shutdown is raised or its owner is dropped.
    pub(crate) async fn wait(&mut self) {
        let _ = self.rx.wait_for(|signalled| *signalled).await;
    }
}
