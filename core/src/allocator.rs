//! Record identifier allocation.
//!
//! There is no persisted counter: the next id is always derived from the
//! rows currently loaded, as max(record_id) + 1. This is only sound with a
//! single writer; two processes appending to the same file can hand out the
//! same id.

use crate::{store::VisitorTable, types::RecordId};

/// Next free identifier for `table`.
///
/// Returns 1 when the table is empty or no row carries a usable id.
/// Row order does not matter.
pub fn next_id(table: &VisitorTable) -> RecordId {
    table
        .rows
        .iter()
        .filter_map(|row| row.record_id())
        .max()
        .map_or(1, |max| max + 1)
}

/// Hands out consecutive ids starting from a table's `next_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAllocator {
    next: RecordId,
}

impl IdAllocator {
    pub fn starting_at(next: RecordId) -> Self {
        Self { next }
    }

    pub fn for_table(table: &VisitorTable) -> Self {
        let next = next_id(table);
        log::debug!("Next record id: {next}");
        Self::starting_at(next)
    }

    /// The id `take()` would return, without consuming it.
    pub fn peek(&self) -> RecordId {
        self.next
    }

    pub fn take(&mut self) -> RecordId {
        let id = self.next;
        self.next += 1;
        id
    }
}
