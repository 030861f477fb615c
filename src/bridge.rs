//! Completion notifications from the device's mixing context.
//!
//! The mixing engine reports a finished channel from its own thread. Rather
//! than locking the pool for every read, finished ids are queued and drained
//! once per engine tick, so the pool stays single-threaded.

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::device::ChannelId;

/// Sending half handed to the device. Clone-able and safe to call from any
/// thread; `notify` never blocks.
#[derive(Clone)]
pub struct FinishedSink {
    tx: Sender<ChannelId>,
}

impl FinishedSink {
    pub fn notify(&self, channel: ChannelId) {
        // Unbounded send only fails when the receiver is gone, which means
        // the engine is tearing down; the notification is moot then.
        let _ = self.tx.send(channel);
    }
}

/// Queue pairing the device-side sink with the engine-side receiver.
pub struct CompletionBridge {
    rx: Receiver<ChannelId>,
    tx: Sender<ChannelId>,
}

impl CompletionBridge {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { rx, tx }
    }

    pub fn sink(&self) -> FinishedSink {
        FinishedSink {
            tx: self.tx.clone(),
        }
    }

    /// Drain every queued completion without blocking.
    pub fn drain(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.rx.try_iter()
    }
}

impl Default for CompletionBridge {
    fn default() -> Self {
        Self::new()
    }
}
