//! Shared primitive types used across the whole ledger.

/// A stable, unique identifier for one stored visitor row.
/// Assigned as max(existing) + 1, never reused.
pub type RecordId = u64;

/// A head count: visitors in a slice, in an age band, or in a whole group.
pub type Headcount = u32;

/// Date format of the `visit_date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Timestamp format of the `recorded_at` column (seconds precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
