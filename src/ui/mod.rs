//! Presentation adapter between upload results and whatever shows them.
//!
//! Upload logic in [`crate::share`] returns values; this module turns those
//! values and the progress stream into calls on a [`Presenter`].

mod progress_bar;

pub use progress_bar::{BarState, ProgressBar, HIDE_DELAY};

use std::time::Duration;

use futures::StreamExt;
use serde::Serialize;

use crate::progress::{self, ProgressEvent};
use crate::share::{Payload, ShareError, Sharer, ShortLink};

/// How long a notification stays on screen.
pub const NOTICE_DURATION: Duration = Duration::from_secs(3);

/// Which upload form a progress update or link belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressTarget {
    File,
    Text,
}

impl ProgressTarget {
    /// Element id of the target's progress bar on the page.
    pub fn element_id(&self) -> &'static str {
        match self {
            ProgressTarget::File => "fileProgress",
            ProgressTarget::Text => "textProgress",
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            ProgressTarget::File => "Upload complete! Link generated.",
            ProgressTarget::Text => "Text link generated!",
        }
    }

    /// User-facing text for a failed upload from this form.
    pub fn error_message(&self, err: &ShareError) -> String {
        match (self, err) {
            (ProgressTarget::Text, ShareError::SaveLink(_)) => {
                "Failed to save text link to database.".to_string()
            }
            _ => err.to_string(),
        }
    }
}

/// A transient user-visible message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub message: String,
    pub dismiss_after_ms: u64,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            dismiss_after_ms: NOTICE_DURATION.as_millis() as u64,
        }
    }
}

/// Side channels an upload reports to.
pub trait Presenter: Send + Sync {
    /// Percent in `0..100` shows progress; 100 marks completion.
    fn set_progress(&self, target: ProgressTarget, percent: u8);
    fn notify(&self, notice: Notice);
    fn show_link(&self, target: ProgressTarget, link: &str);
}

/// Run one upload and reflect it on `presenter`.
///
/// A payload that failed validation is reported without any progress
/// updates. Otherwise the bar starts at 0, follows the transfer, drops back
/// to 0 on a transfer failure, and fills on completion; the outcome is then
/// shown as a link plus notice, or as an error notice.
pub async fn present_upload<P>(
    presenter: &P,
    target: ProgressTarget,
    sharer: &Sharer,
    payload: Result<Payload, ShareError>,
) -> Result<ShortLink, ShareError>
where
    P: Presenter + ?Sized,
{
    let payload = match payload {
        Ok(payload) => payload,
        Err(e) => {
            presenter.notify(Notice::new(target.error_message(&e)));
            return Err(e);
        }
    };

    let (tx, mut events) = progress::channel();
    presenter.set_progress(target, 0);

    let follow = async {
        while let Some(event) = events.next().await {
            match event {
                ProgressEvent::Percent(p) => presenter.set_progress(target, p),
                ProgressEvent::Completed => presenter.set_progress(target, 100),
                ProgressEvent::Failed => presenter.set_progress(target, 0),
            }
        }
    };
    let (result, ()) = tokio::join!(sharer.upload(payload, tx), follow);

    match &result {
        Ok(link) => {
            presenter.show_link(target, &link.link);
            presenter.notify(Notice::new(target.success_message()));
        }
        Err(e) => presenter.notify(Notice::new(target.error_message(e))),
    }
    result
}
