use async_trait::async_trait;
use redb::ReadableTable;

use super::db::{Database, DatabaseError};
use super::tables::LINKS;
use crate::links::{LinkMapping, LinkTable, LinkTableError};

impl Database {
    // ========================================================================
    // Link operations
    // ========================================================================

    /// Store a mapping unless its id is already taken.
    /// Returns `false` (and writes nothing) on a taken id.
    pub fn insert_link(&self, link: &LinkMapping) -> Result<bool, DatabaseError> {
        debug_assert!(!link.id.is_empty(), "link id must not be empty");

        let write_txn = self.begin_write()?;
        let inserted = {
            let mut table = write_txn.open_table(LINKS)?;
            if table.get(link.id.as_str())?.is_some() {
                false
            } else {
                table.insert(link.id.as_str(), link.path.as_str())?;
                true
            }
        };
        write_txn.commit()?;
        Ok(inserted)
    }

    /// Get the mapping for a token
    pub fn get_link(&self, id: &str) -> Result<Option<LinkMapping>, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(LINKS)?;

        Ok(table.get(id)?.map(|path| LinkMapping {
            id: id.to_string(),
            path: path.value().to_string(),
        }))
    }
}

#[async_trait]
impl LinkTable for Database {
    async fn insert(&self, link: &LinkMapping) -> Result<(), LinkTableError> {
        if self.insert_link(link)? {
            Ok(())
        } else {
            Err(LinkTableError::Conflict(link.id.clone()))
        }
    }

    async fn select_one(&self, id: &str) -> Result<Option<LinkMapping>, LinkTableError> {
        Ok(self.get_link(id)?)
    }
}
