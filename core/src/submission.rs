//! Submission validation and splitting.
//!
//! One operator-entered group visit becomes one record per ticket category
//! with a positive count, in the fixed `TicketCategory::ALL` order.
//!
//! Checks run in this order and stop at the first failure:
//!   1. city is non-empty after trimming
//!   2. the group has at least one visitor
//!   3. ticket counts add up to the declared total
//!   4. age bands add up to the declared total
//!
//! No ids are drawn until every check has passed.

use crate::{
    allocator::IdAllocator,
    error::ValidationError,
    record::{AgeBands, GroupFields, TicketCategory, VisitOccurrence, VisitReason, VisitorRecord},
    types::Headcount,
};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Tickets sold to the group, per category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketCounts {
    pub standard:      Headcount,
    pub student_pupil: Headcount,
    pub senior:        Headcount,
    pub free:          Headcount,
    pub other:         Headcount,
}

impl TicketCounts {
    pub fn get(&self, category: TicketCategory) -> Headcount {
        match category {
            TicketCategory::Standard     => self.standard,
            TicketCategory::StudentPupil => self.student_pupil,
            TicketCategory::Senior       => self.senior,
            TicketCategory::Free         => self.free,
            TicketCategory::Other        => self.other,
        }
    }

    pub fn sum(&self) -> u64 {
        TicketCategory::ALL.iter().map(|c| u64::from(self.get(*c))).sum()
    }

    /// Categories with a positive count, in split order.
    pub fn positive(&self) -> impl Iterator<Item = (TicketCategory, Headcount)> + '_ {
        TicketCategory::ALL
            .iter()
            .map(move |c| (*c, self.get(*c)))
            .filter(|(_, n)| *n > 0)
    }
}

/// One group visit as entered on the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub visit_date:       NaiveDate,
    pub origin_city:      String,
    pub visit_reason:     VisitReason,
    pub visit_occurrence: VisitOccurrence,
    /// Minutes spent on site; 0 means "not known".
    #[serde(default)]
    pub duration_minutes: u32,
    pub total_visitors:   Headcount,
    #[serde(default)]
    pub tickets:          TicketCounts,
    #[serde(default)]
    pub ages:             AgeBands,
    #[serde(default)]
    pub comment:          String,
}

impl Submission {
    /// Run the consistency checks without touching any ids.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.origin_city.trim().is_empty() {
            return Err(ValidationError::EmptyCity);
        }

        let declared_total = u64::from(self.total_visitors);
        if declared_total == 0 {
            return Err(ValidationError::EmptyGroup);
        }

        let ticket_sum = self.tickets.sum();
        if ticket_sum != declared_total {
            return Err(ValidationError::TicketCountMismatch { ticket_sum, declared_total });
        }

        let age_sum = self.ages.sum();
        if age_sum != declared_total {
            return Err(ValidationError::AgeCountMismatch { age_sum, declared_total });
        }

        Ok(())
    }

    /// The fields every slice of this submission shares.
    pub fn group_fields(&self, recorded_at: NaiveDateTime) -> GroupFields {
        GroupFields {
            visit_date:       self.visit_date,
            recorded_at:      recorded_at.with_nanosecond(0).unwrap_or(recorded_at),
            origin_city:      self.origin_city.trim().to_string(),
            visit_reason:     self.visit_reason,
            visit_occurrence: self.visit_occurrence,
            duration_minutes: (self.duration_minutes > 0).then_some(self.duration_minutes),
            ages:             self.ages,
            comment:          self.comment.trim().to_string(),
        }
    }
}

/// Validate `submission` and split it into per-category records.
///
/// Ids come from `ids`, one per produced record, consecutive and in split
/// order. On any validation failure `ids` is left untouched.
pub fn validate_and_split(
    submission: &Submission,
    recorded_at: NaiveDateTime,
    ids: &mut IdAllocator,
) -> Result<Vec<VisitorRecord>, ValidationError> {
    submission.validate()?;

    let group = submission.group_fields(recorded_at);
    let records = submission
        .tickets
        .positive()
        .map(|(category, count)| VisitorRecord::slice(ids.take(), &group, category, count))
        .collect();
    Ok(records)
}
