//! Presenters that carry upload feedback back to HTTP clients.

use std::convert::Infallible;
use std::sync::Arc;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

use super::handlers::ShareResponse;
use super::response::FailData;
use crate::share::{Payload, ShareError};
use crate::ui::{present_upload, BarState, Notice, Presenter, ProgressBar, ProgressTarget};
use crate::AppState;

/// Presenter for plain JSON requests: nobody is watching live, so feedback
/// only goes to the log.
pub struct TracingPresenter;

impl Presenter for TracingPresenter {
    fn set_progress(&self, target: ProgressTarget, percent: u8) {
        tracing::trace!(form = target.element_id(), percent, "Upload progress");
    }

    fn notify(&self, notice: Notice) {
        tracing::debug!(notice = %notice.message, "Upload notice");
    }

    fn show_link(&self, _target: ProgressTarget, link: &str) {
        tracing::debug!(link, "Short link ready");
    }
}

#[derive(Serialize)]
struct ProgressData {
    target: ProgressTarget,
    #[serde(flatten)]
    bar: BarState,
}

#[derive(Serialize)]
struct LinkData<'a> {
    target: ProgressTarget,
    link: &'a str,
}

/// Presenter that turns feedback into server-sent events.
///
/// Progress goes through a [`ProgressBar`] so clients see the same debounced
/// hide a page would; the stream stays open until that hide has been sent.
struct SsePresenter {
    tx: mpsc::UnboundedSender<Event>,
    bar: ProgressBar,
}

impl SsePresenter {
    fn new(tx: mpsc::UnboundedSender<Event>, target: ProgressTarget) -> Self {
        let bar_tx = tx.clone();
        let bar = ProgressBar::new(move |bar| {
            let _ = bar_tx.send(json_event("progress", &ProgressData { target, bar }));
        });
        Self { tx, bar }
    }

    fn send(&self, event: Event) {
        // The client may have gone away; the upload carries on regardless.
        let _ = self.tx.send(event);
    }
}

impl Presenter for SsePresenter {
    fn set_progress(&self, _target: ProgressTarget, percent: u8) {
        self.bar.set(percent);
    }

    fn notify(&self, notice: Notice) {
        self.send(json_event("notice", &notice));
    }

    fn show_link(&self, target: ProgressTarget, link: &str) {
        self.send(json_event("link", &LinkData { target, link }));
    }
}

/// Run the upload in the background and stream its feedback.
///
/// Events: `progress`, `link`, `notice`, then one of `complete` (the share
/// response) or `error` (`{message}`), and finally the `progress` event that
/// hides a completed bar.
pub fn stream_upload(
    state: Arc<AppState>,
    target: ProgressTarget,
    payload: Result<Payload, ShareError>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let presenter = SsePresenter::new(tx, target);
        let result = present_upload(&presenter, target, &state.sharer, payload).await;
        let event = match result {
            Ok(link) => json_event("complete", &ShareResponse::new(link, target)),
            Err(e) => json_event(
                "error",
                &FailData {
                    message: target.error_message(&e),
                },
            ),
        };
        presenter.send(event);
    });

    Sse::new(UnboundedReceiverStream::new(rx).map(Ok)).keep_alive(KeepAlive::default())
}

fn json_event<T: Serialize>(name: &str, data: &T) -> Event {
    Event::default()
        .event(name)
        .json_data(data)
        .unwrap_or_else(|e| {
            tracing::warn!(event = name, error = %e, "Failed to encode event");
            Event::default().event(name)
        })
}
