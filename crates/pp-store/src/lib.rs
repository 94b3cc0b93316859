//! # pp-store
//!
//! Generic record store used by the pointplan engine.
//!
//! The engine never talks to a database product directly. It depends on the
//! [`RecordStore`] capability set: insert rows into a named table (getting
//! back the rows with their assigned ids), select rows with a filter, order
//! and limit, and patch rows matching a filter. Nothing here offers
//! multi-statement transactions; callers that write several rows as one
//! logical unit have to cope with partial writes themselves.
//!
//! ## Key components
//!
//! - [`RecordStore`]: the capability trait.
//! - [`Record`], [`Filter`], [`Order`], [`Query`]: row and query shapes.
//! - [`MemoryStore`]: mutex-guarded in-process tables, for tests and embedding.
//! - [`SqliteStore`]: one SQLite file holding every table as JSON bodies.
//! - [`tables`]: the logical table names the engine uses.

pub mod error;
pub mod memory;
pub mod record;
pub mod sqlite;
pub mod tables;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use record::{from_record, record_from, Clause, Filter, Order, Query, Record, RecordId, ID};
pub use sqlite::SqliteStore;

/// Capability set the engine needs from a backing store.
///
/// Every method is one independent write or read. Implementations must be
/// usable from several threads at once and must not block indefinitely.
pub trait RecordStore: Send + Sync {
    /// Insert rows into `table`. Returns the stored rows, each with its
    /// assigned `id`, in the same order as `rows`. Any `id` key present in
    /// the input is ignored.
    fn insert(&self, table: &str, rows: Vec<Record>) -> Result<Vec<Record>, StoreError>;

    /// Select rows from `table` matching `query`.
    fn select(&self, table: &str, query: &Query) -> Result<Vec<Record>, StoreError>;

    /// Merge `patch` into every row of `table` matching `filter`.
    /// Returns the number of rows changed.
    fn update(&self, table: &str, filter: &Filter, patch: Record) -> Result<usize, StoreError>;

    /// Insert a single row and return it with its id.
    fn insert_one(&self, table: &str, row: Record) -> Result<Record, StoreError> {
        self.insert(table, vec![row])?
            .pop()
            .ok_or_else(|| StoreError::Backend(format!("insert into {table} returned no row")))
    }
}
