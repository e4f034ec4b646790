//! The inbound hand-off queue.
//!
//! Network delivery happens on whatever task or thread the transport runs
//! on. Everything above the transport (state machine, dispatch, playback)
//! runs on one application context, once per tick. This queue is the only
//! place those two worlds touch:
//!
//! ```text
//!  link task ──enqueue()──▶ [ mpsc::unbounded_channel ] ──drain_all()──▶ tick
//! ```
//!
//! - [`InboundSender::enqueue`] never blocks on the consumer and never
//!   fails. The channel is unbounded; messages are small and infrequent.
//! - [`InboundQueue::drain_all`] takes only what was queued when it was
//!   called. Items enqueued mid-drain wait for the next tick.

use tokio::sync::mpsc;

/// Consumer side of the queue. Owned by the application tick.
#[derive(Debug)]
pub struct InboundQueue<T> {
    tx: mpsc::UnboundedSender<T>,
    rx: mpsc::UnboundedReceiver<T>,
}

/// Producer side of the queue. Cheap to clone, safe to move to other
/// threads.
///
/// Once the [`InboundQueue`] is dropped, further items are discarded.
#[derive(Debug)]
pub struct InboundSender<T> {
    tx: mpsc::UnboundedSender<T>,
}

// Manual impl: `#[derive(Clone)]` would require `T: Clone`.
impl<T> Clone for InboundSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> InboundQueue<T> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// Returns a producer handle for this queue.
    pub fn sender(&self) -> InboundSender<T> {
        InboundSender {
            tx: self.tx.clone(),
        }
    }

    /// Hands every item queued at the time of the call to `handler`, in
    /// arrival order. Returns the number of items processed.
    pub fn drain_all(&mut self, mut handler: impl FnMut(T)) -> usize {
        let pending = self.rx.len();
        let mut count = 0;
        while count < pending {
            let Ok(item) = self.rx.try_recv() else {
                break;
            };
            handler(item);
            count += 1;
        }
        count
    }

    /// Number of items currently waiting.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl<T> Default for InboundQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> InboundSender<T> {
    /// Appends an item. Never blocks on the consumer, never fails.
    pub fn enqueue(&self, item: T) {
        if self.tx.send(item).is_err() {
            tracing::trace!("inbound queue dropped, discarding item");
        }
    }
}
