//! Upload progress as a stream of percentage events.
//!
//! The transport side holds a [`ProgressSender`] and reports raw byte counts;
//! any number of clones may report. The consumer side reads a
//! [`ProgressStream`] that yields non-decreasing percentages below 100 and
//! ends with exactly one terminal event.

use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{ready, Context, Poll};

use futures::Stream;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "percent", rename_all = "lowercase")]
pub enum ProgressEvent {
    /// Transfer in flight, always below 100.
    Percent(u8),
    /// Transfer finished. Sent once.
    Completed,
    /// Transfer aborted; the display should go back to zero.
    Failed,
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProgressEvent::Percent(_))
    }
}

/// Convert a byte count into a rounded percentage in `0..=100`.
/// An empty payload counts as fully sent.
pub fn percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let sent = sent.min(total) as u128;
    let total = total as u128;
    // Round half up without going through floats.
    ((sent * 200 + total) / (total * 2)) as u8
}

#[derive(Default)]
struct Shared {
    last: Option<u8>,
    finished: bool,
}

/// Reporting half of a progress channel.
///
/// Clones share one state; checking it and sending happen under the same
/// lock, so events from concurrent reporters still arrive in order.
#[derive(Clone)]
pub struct ProgressSender {
    tx: mpsc::UnboundedSender<ProgressEvent>,
    shared: Arc<Mutex<Shared>>,
}

/// Create a connected sender/stream pair.
pub fn channel() -> (ProgressSender, ProgressStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    let sender = ProgressSender {
        tx,
        shared: Arc::default(),
    };
    let stream = ProgressStream {
        inner: UnboundedReceiverStream::new(rx),
        done: false,
    };
    (sender, stream)
}

impl ProgressSender {
    /// A sender nobody listens to.
    pub fn detached() -> Self {
        channel().0
    }

    /// Report that `sent` of `total` bytes have gone out.
    ///
    /// Emits only when the rounded percentage grows. Values are capped at 99
    /// so that 100 is reserved for [`ProgressSender::complete`].
    pub fn report(&self, sent: u64, total: u64) {
        let value = percent(sent, total).min(99);
        let mut shared = self.lock();
        if shared.finished || shared.last.is_some_and(|last| last >= value) {
            return;
        }
        shared.last = Some(value);
        let _ = self.tx.send(ProgressEvent::Percent(value));
    }

    pub fn complete(&self) {
        self.finish(ProgressEvent::Completed);
    }

    pub fn fail(&self) {
        self.finish(ProgressEvent::Failed);
    }

    fn finish(&self, event: ProgressEvent) {
        let mut shared = self.lock();
        if !shared.finished {
            shared.finished = true;
            // A closed receiver only means nobody is watching.
            let _ = self.tx.send(event);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Consuming half of a progress channel. Ends after the terminal event, or
/// when every sender is gone.
pub struct ProgressStream {
    inner: UnboundedReceiverStream<ProgressEvent>,
    done: bool,
}

impl Stream for ProgressStream {
    type Item = ProgressEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }
        let event = ready!(Pin::new(&mut self.inner).poll_next(cx));
        match event {
            Some(e) if !e.is_terminal() => {}
            _ => self.done = true,
        }
        Poll::Ready(event)
    }
}
