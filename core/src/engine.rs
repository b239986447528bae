//! The visitor desk — one operator session over the data file.
//!
//! SUBMISSION ORDER (fixed):
//!   1. Validate and split the submission (ids from the loaded table)
//!   2. Append the new rows to the in-memory table
//!   3. Persist the whole table
//!
//! RULES:
//!   - A rejected submission never reaches step 2.
//!   - If step 3 fails, the appended rows are rolled back in memory,
//!     so the session keeps matching what is on disk.
//!   - Summaries are always computed from the in-memory table, which is
//!     the persisted table once a submission has returned Ok.

use crate::{
    allocator::{next_id, IdAllocator},
    clock::{Clock, SystemClock},
    config::LedgerConfig,
    error::{LedgerResult, SchemaMismatch},
    record::VisitorRecord,
    store::{RecordStore, VisitorTable},
    submission::{validate_and_split, Submission},
    summary::{summarize, summarize_between, DateRange, VisitorSummary},
    types::RecordId,
};

pub struct VisitorDesk<C: Clock = SystemClock> {
    store:           RecordStore,
    table:           VisitorTable,
    schema_mismatch: Option<SchemaMismatch>,
    clock:           C,
}

impl VisitorDesk<SystemClock> {
    /// Open a session on the configured data file, stamping with local time.
    pub fn open(config: &LedgerConfig) -> LedgerResult<Self> {
        Self::with_clock(RecordStore::open(&config.data_file), SystemClock)
    }
}

impl<C: Clock> VisitorDesk<C> {
    pub fn with_clock(store: RecordStore, clock: C) -> LedgerResult<Self> {
        let report = store.load()?;
        log::info!(
            "Desk opened on {} ({} rows)",
            store.path().display(),
            report.table.len()
        );
        Ok(Self {
            store,
            table: report.table,
            schema_mismatch: report.schema_mismatch,
            clock,
        })
    }

    pub fn table(&self) -> &VisitorTable {
        &self.table
    }

    /// The warning raised when the data file was loaded, if any.
    pub fn schema_mismatch(&self) -> Option<&SchemaMismatch> {
        self.schema_mismatch.as_ref()
    }

    pub fn next_id(&self) -> RecordId {
        next_id(&self.table)
    }

    /// Validate, split, append and persist one group visit.
    ///
    /// Returns the records that were saved, in id order.
    pub fn submit(&mut self, submission: &Submission) -> LedgerResult<Vec<VisitorRecord>> {
        let mut ids = IdAllocator::for_table(&self.table);
        let records = match validate_and_split(submission, self.clock.now(), &mut ids) {
            Ok(records) => records,
            Err(e) => {
                log::warn!("Submission from {:?} rejected: {e}", submission.origin_city.trim());
                return Err(e.into());
            }
        };

        let before = self.table.len();
        self.table.append_records(&records);
        if let Err(e) = self.store.persist(&self.table) {
            self.table.rows.truncate(before);
            return Err(e);
        }

        log::info!(
            "Saved {} visitors from {} as {} record(s)",
            submission.total_visitors,
            submission.origin_city.trim(),
            records.len()
        );
        Ok(records)
    }

    /// Re-read the data file, dropping the in-memory table.
    pub fn reload(&mut self) -> LedgerResult<()> {
        let report = self.store.load()?;
        self.table = report.table;
        self.schema_mismatch = report.schema_mismatch;
        Ok(())
    }

    pub fn summary(&self) -> VisitorSummary {
        summarize(&self.table)
    }

    pub fn summary_between(&self, range: &DateRange) -> VisitorSummary {
        summarize_between(&self.table, range)
    }
}
