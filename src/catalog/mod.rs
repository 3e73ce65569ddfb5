//! Relational persistence for books, chapters, tasks, quotas, users, and
//! reader-sync data. Repository functions here own the invariants from the
//! data model; the sea-orm entities themselves stay plain records.

pub mod book;
pub mod chapter;
pub mod reader_data;
pub mod task;

use sea_orm::DatabaseConnection;

/// Shared handle passed to every higher-level service that touches the catalog.
#[derive(Clone)]
pub struct Catalog {
    pub db: DatabaseConnection,
}

impl Catalog {
    pub fn new(db: DatabaseConnection) -> Self {
        Catalog { db }
    }
}
