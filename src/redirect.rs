//! Resolving short links back to the stored object.

use std::sync::Arc;

use crate::links::{LinkTable, LinkTableError};
use crate::token::is_valid_token;

pub const REDIRECTING_MESSAGE: &str = "Redirecting…";
pub const NOT_FOUND_MESSAGE: &str = "Link not found or expired.";
pub const ERROR_MESSAGE: &str = "Something went wrong.";

/// Outcome of resolving a fragment. Every state except `Idle` is terminal for
/// the page that asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No fragment; the page behaves normally.
    Idle,
    /// Navigate to the stored object URL.
    Redirect(String),
    /// No such link, or the table refused the lookup.
    NotFound,
    /// The table could not be reached.
    Failed,
}

/// Page side effects of a resolution.
pub trait Navigator {
    /// Replace the page with a transient placeholder while the lookup runs.
    fn show_redirecting(&mut self);
    /// Leave the page for `url`.
    fn navigate(&mut self, url: &str);
    /// Replace the page with a static message.
    fn show_message(&mut self, message: &str);
}

/// Extract the token from `#abc`, `abc`, or a full short link
/// (`https://host/#abc`). Returns `None` for an empty fragment.
pub fn token_from_fragment(input: &str) -> Option<&str> {
    let fragment = match input.split_once('#') {
        Some((_, fragment)) => fragment,
        None if input.contains("://") => "",
        None => input,
    };
    let token = fragment.trim();
    (!token.is_empty()).then_some(token)
}

pub struct RedirectResolver {
    links: Arc<dyn LinkTable>,
}

impl RedirectResolver {
    pub fn new(links: Arc<dyn LinkTable>) -> Self {
        Self { links }
    }

    /// Look up the target for `fragment`. An empty fragment never touches
    /// the table.
    pub async fn resolve(&self, fragment: &str) -> Resolution {
        let Some(token) = token_from_fragment(fragment) else {
            return Resolution::Idle;
        };
        self.lookup(token).await
    }

    /// Resolve `fragment` and drive `navigator` through the matching page
    /// states: the placeholder first, then exactly one of navigate or a
    /// message. Nothing is retried.
    pub async fn run<N: Navigator + Send>(&self, fragment: &str, navigator: &mut N) -> Resolution {
        let Some(token) = token_from_fragment(fragment) else {
            return Resolution::Idle;
        };

        navigator.show_redirecting();
        let resolution = self.lookup(token).await;
        match &resolution {
            Resolution::Redirect(path) => navigator.navigate(path),
            Resolution::NotFound => navigator.show_message(NOT_FOUND_MESSAGE),
            Resolution::Failed => navigator.show_message(ERROR_MESSAGE),
            Resolution::Idle => {}
        }
        resolution
    }

    async fn lookup(&self, token: &str) -> Resolution {
        if !is_valid_token(token) {
            tracing::debug!(token, "Rejecting malformed token");
            return Resolution::NotFound;
        }

        match self.links.select_one(token).await {
            Ok(Some(link)) => {
                tracing::debug!(token, path = %link.path, "Resolved short link");
                Resolution::Redirect(link.path)
            }
            Ok(None) => Resolution::NotFound,
            Err(LinkTableError::Transport(e)) => {
                tracing::warn!(token, error = %e, "Link lookup failed");
                Resolution::Failed
            }
            Err(e) => {
                tracing::warn!(token, error = %e, "Link lookup rejected");
                Resolution::NotFound
            }
        }
    }
}
