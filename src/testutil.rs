//! In-memory collaborators and recorders for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

use crate::links::{LinkMapping, LinkTable, LinkTableError};
use crate::object_store::{chunks, ObjectStore, ObjectStoreError};
use crate::progress::ProgressSender;
use crate::redirect::Navigator;
use crate::ui::{Notice, Presenter, ProgressTarget};

/// Object store keeping objects in a map. Public URLs live under
/// `https://storage.test/files/`.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, Bytes>>,
    failure: Option<(u16, String)>,
    puts: AtomicUsize,
}

impl MemoryStore {
    /// Every put is rejected with the given status.
    pub fn failing(status: u16, reason: &str) -> Self {
        Self {
            failure: Some((status, reason.to_string())),
            ..Default::default()
        }
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(
        &self,
        key: &str,
        data: Bytes,
        _content_type: &str,
        progress: &ProgressSender,
    ) -> Result<(), ObjectStoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if let Some((status, reason)) = &self.failure {
            return Err(ObjectStoreError::Rejected {
                status: *status,
                reason: reason.clone(),
            });
        }

        let total = data.len() as u64;
        let mut sent = 0u64;
        progress.report(0, total);
        for chunk in chunks(&data) {
            sent += chunk.len() as u64;
            progress.report(sent, total);
        }
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    fn public_url(&self, key: &str) -> Result<Url, ObjectStoreError> {
        let base = Url::parse("https://storage.test/files/").unwrap();
        crate::object_store::join_segments(&base, &[key])
    }
}

enum LinkMode {
    Accept,
    Reject,
    Unreachable,
    /// Report a conflict for this many inserts, then accept.
    Conflict(AtomicUsize),
}

pub struct MemoryLinks {
    rows: Mutex<HashMap<String, String>>,
    mode: LinkMode,
    attempts: AtomicUsize,
    lookups: AtomicUsize,
}

impl Default for MemoryLinks {
    fn default() -> Self {
        Self::with_mode(LinkMode::Accept)
    }
}

impl MemoryLinks {
    fn with_mode(mode: LinkMode) -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
            mode,
            attempts: AtomicUsize::new(0),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn rejecting() -> Self {
        Self::with_mode(LinkMode::Reject)
    }

    pub fn unreachable() -> Self {
        Self::with_mode(LinkMode::Unreachable)
    }

    pub fn conflicting(times: usize) -> Self {
        Self::with_mode(LinkMode::Conflict(AtomicUsize::new(times)))
    }

    pub fn get(&self, id: &str) -> Option<LinkMapping> {
        self.rows.lock().unwrap().get(id).map(|path| LinkMapping {
            id: id.to_string(),
            path: path.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LinkTable for MemoryLinks {
    async fn insert(&self, link: &LinkMapping) -> Result<(), LinkTableError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            LinkMode::Accept => {}
            LinkMode::Reject => {
                return Err(LinkTableError::Rejected {
                    status: 401,
                    message: "permission denied for table links".to_string(),
                })
            }
            LinkMode::Unreachable => {
                return Err(LinkTableError::Transport("connection refused".to_string()))
            }
            LinkMode::Conflict(remaining) => {
                let left = remaining.load(Ordering::SeqCst);
                if left > 0 {
                    remaining.store(left - 1, Ordering::SeqCst);
                    return Err(LinkTableError::Conflict(link.id.clone()));
                }
            }
        }

        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&link.id) {
            return Err(LinkTableError::Conflict(link.id.clone()));
        }
        rows.insert(link.id.clone(), link.path.clone());
        Ok(())
    }

    async fn select_one(&self, id: &str) -> Result<Option<LinkMapping>, LinkTableError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let LinkMode::Unreachable = self.mode {
            return Err(LinkTableError::Transport("connection refused".to_string()));
        }
        Ok(self.get(id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterEvent {
    Progress(ProgressTarget, u8),
    Notice(String),
    Link(ProgressTarget, String),
}

#[derive(Default)]
pub struct RecordingPresenter {
    events: Mutex<Vec<PresenterEvent>>,
}

impl RecordingPresenter {
    pub fn events(&self) -> Vec<PresenterEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl Presenter for RecordingPresenter {
    fn set_progress(&self, target: ProgressTarget, percent: u8) {
        self.events
            .lock()
            .unwrap()
            .push(PresenterEvent::Progress(target, percent));
    }

    fn notify(&self, notice: Notice) {
        self.events
            .lock()
            .unwrap()
            .push(PresenterEvent::Notice(notice.message));
    }

    fn show_link(&self, target: ProgressTarget, link: &str) {
        self.events
            .lock()
            .unwrap()
            .push(PresenterEvent::Link(target, link.to_string()));
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub events: Vec<String>,
}

impl RecordingNavigator {
    pub fn navigated(&self) -> Option<&str> {
        self.events
            .iter()
            .find_map(|e| e.strip_prefix("navigate "))
    }
}

impl Navigator for RecordingNavigator {
    fn show_redirecting(&mut self) {
        self.events.push("redirecting".to_string());
    }

    fn navigate(&mut self, url: &str) {
        self.events.push(format!("navigate {url}"));
    }

    fn show_message(&mut self, message: &str) {
        self.events.push(format!("message {message}"));
    }
}
