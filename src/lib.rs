//! file-sharer - Share files and text through short links
//!
//! This crate uploads a payload to an object storage bucket, records a short
//! token pointing at the object's public URL, and resolves tokens back to that
//! URL:
//! - Swappable collaborators for objects (Supabase Storage, local filesystem)
//!   and link rows (Supabase PostgREST, embedded redb)
//! - Upload progress as a stream of percentage events
//! - REST API with multipart upload and optional server-sent progress

pub mod api;
pub mod config;
pub mod links;
pub mod object_store;
pub mod progress;
pub mod redirect;
pub mod share;
pub mod storage;
#[cfg(test)]
pub mod testutil;
pub mod token;
pub mod ui;

use std::sync::Arc;

use config::Config;
use links::LinkTable;
use object_store::{LocalStore, ObjectStore};
use redirect::RedirectResolver;
use share::Sharer;
use token::TokenGenerator;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub sharer: Sharer,
    pub resolver: RedirectResolver,
    /// Set when objects live on this server's disk and are served from it.
    pub local_store: Option<Arc<LocalStore>>,
}

impl AppState {
    pub fn new(
        config: Config,
        object_store: Arc<dyn ObjectStore>,
        link_table: Arc<dyn LinkTable>,
        local_store: Option<Arc<LocalStore>>,
    ) -> Self {
        let sharer = Sharer::new(
            object_store,
            Arc::clone(&link_table),
            TokenGenerator::new(config.links.token_length),
            &config.node.public_origin,
        );
        Self {
            sharer,
            resolver: RedirectResolver::new(link_table),
            local_store,
            config,
        }
    }
}
