pub mod db;
mod links;
mod tables;

pub use db::{Database, DatabaseError};
pub use tables::*;
