//! The visitor record model — one ticket-category slice of a group visit.
//!
//! RULE: A VisitorRecord is only ever built by `VisitorRecord::slice`,
//! from the shared group fields plus one (category, count) pair.
//! Nothing patches a record after it has been built.

use crate::types::{Headcount, RecordId};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind} label: {value:?}")]
pub struct LabelError {
    pub kind:  &'static str,
    pub value: String,
}

/// Stored labels and `Display`/`FromStr` for a fixed label enumeration.
macro_rules! labelled_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = LabelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.label() == s)
                    .ok_or_else(|| LabelError { kind: $kind, value: s.to_string() })
            }
        }
    };
}

// ── Enumerations ─────────────────────────────────────────────────────────────

/// Ticket categories, in the fixed order submissions are split in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TicketCategory {
    #[serde(rename = "Standard")]
    Standard,
    #[serde(rename = "Student/Pupil")]
    StudentPupil,
    #[serde(rename = "Senior")]
    Senior,
    #[serde(rename = "Free")]
    Free,
    #[serde(rename = "Other")]
    Other,
}

labelled_enum!(TicketCategory, "ticket category", {
    Standard     => "Standard",
    StudentPupil => "Student/Pupil",
    Senior       => "Senior",
    Free         => "Free",
    Other        => "Other",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisitReason {
    #[serde(rename = "Event")]
    Event,
    #[serde(rename = "Exhibition-LC")]
    ExhibitionLc,
    #[serde(rename = "Exhibition-RRL")]
    ExhibitionRrl,
    #[serde(rename = "Park visit")]
    ParkVisit,
    #[serde(rename = "Photo session")]
    PhotoSession,
    #[serde(rename = "Other")]
    Other,
}

labelled_enum!(VisitReason, "visit reason", {
    Event         => "Event",
    ExhibitionLc  => "Exhibition-LC",
    ExhibitionRrl => "Exhibition-RRL",
    ParkVisit     => "Park visit",
    PhotoSession  => "Photo session",
    Other         => "Other",
});

/// How many times the group has been here. Describes the whole group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisitOccurrence {
    #[serde(rename = "First visit")]
    First,
    #[serde(rename = "Second visit")]
    Second,
    #[serde(rename = "Third-or-more visit")]
    ThirdOrMore,
}

labelled_enum!(VisitOccurrence, "visit occurrence", {
    First       => "First visit",
    Second      => "Second visit",
    ThirdOrMore => "Third-or-more visit",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgeBand {
    Under7,
    From7To19,
    From20To35,
    From36To60,
    From61,
}

impl AgeBand {
    pub const ALL: [AgeBand; 5] = [
        AgeBand::Under7,
        AgeBand::From7To19,
        AgeBand::From20To35,
        AgeBand::From36To60,
        AgeBand::From61,
    ];

    /// Column name in the stored table.
    pub fn column(&self) -> &'static str {
        match self {
            AgeBand::Under7     => "age_under_7",
            AgeBand::From7To19  => "age_7_19",
            AgeBand::From20To35 => "age_20_35",
            AgeBand::From36To60 => "age_36_60",
            AgeBand::From61     => "age_61_plus",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgeBand::Under7     => "under 7",
            AgeBand::From7To19  => "7-19",
            AgeBand::From20To35 => "20-35",
            AgeBand::From36To60 => "36-60",
            AgeBand::From61     => "61+",
        }
    }
}

// ── Age breakdown ────────────────────────────────────────────────────────────

/// Age breakdown of a whole group. Copied unchanged onto every slice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBands {
    #[serde(default)]
    pub age_under_7: Headcount,
    #[serde(default)]
    pub age_7_19:    Headcount,
    #[serde(default)]
    pub age_20_35:   Headcount,
    #[serde(default)]
    pub age_36_60:   Headcount,
    #[serde(default)]
    pub age_61_plus: Headcount,
}

impl AgeBands {
    pub fn get(&self, band: AgeBand) -> Headcount {
        match band {
            AgeBand::Under7     => self.age_under_7,
            AgeBand::From7To19  => self.age_7_19,
            AgeBand::From20To35 => self.age_20_35,
            AgeBand::From36To60 => self.age_36_60,
            AgeBand::From61     => self.age_61_plus,
        }
    }

    pub fn sum(&self) -> u64 {
        AgeBand::ALL.iter().map(|b| u64::from(self.get(*b))).sum()
    }
}

// ── Record ───────────────────────────────────────────────────────────────────

/// Everything a submission says about the group as a whole.
/// Shared verbatim by every slice the submission produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupFields {
    pub visit_date:       NaiveDate,
    pub recorded_at:      NaiveDateTime,
    pub origin_city:      String,
    pub visit_reason:     VisitReason,
    pub visit_occurrence: VisitOccurrence,
    pub duration_minutes: Option<u32>,
    pub ages:             AgeBands,
    pub comment:          String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorRecord {
    pub record_id:        RecordId,
    pub visit_date:       NaiveDate,
    pub recorded_at:      NaiveDateTime,
    pub origin_city:      String,
    pub ticket_category:  TicketCategory,
    pub visit_reason:     VisitReason,
    pub visit_occurrence: VisitOccurrence,
    pub duration_minutes: Option<u32>,
    pub visitor_count:    Headcount,
    pub ages:             AgeBands,
    pub comment:          String,
}

impl VisitorRecord {
    /// Build one category slice of a group visit.
    pub fn slice(
        record_id: RecordId,
        group: &GroupFields,
        ticket_category: TicketCategory,
        visitor_count: Headcount,
    ) -> Self {
        Self {
            record_id,
            visit_date:       group.visit_date,
            recorded_at:      group.recorded_at,
            origin_city:      group.origin_city.clone(),
            ticket_category,
            visit_reason:     group.visit_reason,
            visit_occurrence: group.visit_occurrence,
            duration_minutes: group.duration_minutes,
            visitor_count,
            ages:             group.ages,
            comment:          group.comment.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_back_to_variants() {
        for c in TicketCategory::ALL {
            assert_eq!(c.label().parse::<TicketCategory>().unwrap(), *c);
        }
        for r in VisitReason::ALL {
            assert_eq!(r.to_string().parse::<VisitReason>().unwrap(), *r);
        }
        assert_eq!(
            " Third-or-more visit ".parse::<VisitOccurrence>().unwrap(),
            VisitOccurrence::ThirdOrMore
        );
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = "Standartinis".parse::<TicketCategory>().unwrap_err();
        assert_eq!(err.kind, "ticket category");
        assert_eq!(err.value, "Standartinis");
    }

    #[test]
    fn serde_uses_stored_labels() {
        let json = serde_json::to_string(&VisitReason::ParkVisit).unwrap();
        assert_eq!(json, "\"Park visit\"");
        let back: TicketCategory = serde_json::from_str("\"Student/Pupil\"").unwrap();
        assert_eq!(back, TicketCategory::StudentPupil);
    }
}
