use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Submission rejected: {0}")]
    Validation(#[from] ValidationError),

    #[error("Malformed cell '{column}' in record {record}: {value:?}")]
    MalformedCell {
        record: String,
        column: &'static str,
        value:  String,
    },
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Reasons a group submission is turned away before anything is stored.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter the visitors' city")]
    EmptyCity,

    #[error("The group must contain at least one visitor")]
    EmptyGroup,

    #[error("Ticket counts add up to {ticket_sum}, but the group has {declared_total} visitors")]
    TicketCountMismatch {
        ticket_sum:     u64,
        declared_total: u64,
    },

    #[error("Age bands add up to {age_sum}, but the group has {declared_total} visitors")]
    AgeCountMismatch {
        age_sum:        u64,
        declared_total: u64,
    },
}

impl ValidationError {
    /// Stable machine-readable name, used by the IPC protocol.
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::EmptyCity                 => "empty_city",
            ValidationError::EmptyGroup                => "empty_group",
            ValidationError::TicketCountMismatch { .. } => "ticket_count_mismatch",
            ValidationError::AgeCountMismatch { .. }    => "age_count_mismatch",
        }
    }
}

/// A loaded medium whose header lacks required columns.
/// Not fatal: the store substitutes an empty table and reports this.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Data file {path} is missing columns: {}; starting a new empty table", .missing.join(", "))]
pub struct SchemaMismatch {
    pub path:    String,
    pub missing: Vec<String>,
}
