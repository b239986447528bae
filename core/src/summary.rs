//! Aggregate statistics over the stored visitor history.
//!
//! Sums are taken over raw cells: a cell that does not coerce to a whole
//! number is skipped for that sum only, it never fails the whole summary.
//! Totals saturate at `i64::MAX` instead of overflowing.
//! Empty label cells are left out of the grouped totals and the mode.

use crate::{
    record::{AgeBand, TicketCategory, VisitReason},
    store::{VisitorRow, VisitorTable},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// One labelled value, ready for a bar chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatEntry {
    pub label: String,
    pub value: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBandTotals {
    pub age_under_7: i64,
    pub age_7_19:    i64,
    pub age_20_35:   i64,
    pub age_36_60:   i64,
    pub age_61_plus: i64,
}

impl AgeBandTotals {
    pub fn get(&self, band: AgeBand) -> i64 {
        match band {
            AgeBand::Under7     => self.age_under_7,
            AgeBand::From7To19  => self.age_7_19,
            AgeBand::From20To35 => self.age_20_35,
            AgeBand::From36To60 => self.age_36_60,
            AgeBand::From61     => self.age_61_plus,
        }
    }

    fn add(&mut self, band: AgeBand, n: i64) {
        let slot = match band {
            AgeBand::Under7     => &mut self.age_under_7,
            AgeBand::From7To19  => &mut self.age_7_19,
            AgeBand::From20To35 => &mut self.age_20_35,
            AgeBand::From36To60 => &mut self.age_36_60,
            AgeBand::From61     => &mut self.age_61_plus,
        };
        *slot = slot.saturating_add(n);
    }

    pub fn entries(&self) -> Vec<StatEntry> {
        AgeBand::ALL
            .iter()
            .map(|b| StatEntry { label: b.label().to_string(), value: self.get(*b) })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorSummary {
    pub record_count:        usize,
    pub total_visitors:      i64,
    pub unique_cities:       usize,
    /// Most frequent ticket category label. Ties go to the
    /// lexicographically smallest label. `None` when no row has one.
    pub top_ticket_category: Option<String>,
    pub age_bands:           AgeBandTotals,
    pub by_ticket_category:  Vec<StatEntry>,
    pub by_visit_reason:     Vec<StatEntry>,
}

impl VisitorSummary {
    pub fn ticket_category_total(&self, category: TicketCategory) -> i64 {
        lookup(&self.by_ticket_category, category.label())
    }

    pub fn visit_reason_total(&self, reason: VisitReason) -> i64 {
        lookup(&self.by_visit_reason, reason.label())
    }
}

fn lookup(entries: &[StatEntry], label: &str) -> i64 {
    entries
        .iter()
        .find(|e| e.label == label)
        .map_or(0, |e| e.value)
}

/// Inclusive visit-date bounds. Either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to:   Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|f| date >= f) && self.to.is_none_or(|t| date <= t)
    }
}

/// Summarize every row of `table`.
pub fn summarize(table: &VisitorTable) -> VisitorSummary {
    summarize_rows(table.rows.iter())
}

/// Summarize rows whose visit date falls in `range`.
///
/// With any bound set, rows whose `visit_date` does not parse are left out.
pub fn summarize_between(table: &VisitorTable, range: &DateRange) -> VisitorSummary {
    if range.is_unbounded() {
        return summarize(table);
    }
    summarize_rows(
        table
            .rows
            .iter()
            .filter(|row| row.visit_date().is_some_and(|d| range.contains(d))),
    )
}

fn summarize_rows<'a, I>(rows: I) -> VisitorSummary
where
    I: Iterator<Item = &'a VisitorRow>,
{
    let mut record_count = 0;
    let mut total_visitors = 0i64;
    let mut cities: HashSet<&str> = HashSet::new();
    let mut category_freq: BTreeMap<&str, usize> = BTreeMap::new();
    let mut by_category: BTreeMap<String, i64> = BTreeMap::new();
    let mut by_reason: BTreeMap<String, i64> = BTreeMap::new();
    let mut age_bands = AgeBandTotals::default();

    for row in rows {
        record_count += 1;
        let count = row.visitor_count();
        if let Some(n) = count {
            total_visitors = total_visitors.saturating_add(n);
        }

        if !row.origin_city.trim().is_empty() {
            cities.insert(row.origin_city.as_str());
        }

        if !row.ticket_category.trim().is_empty() {
            *category_freq.entry(row.ticket_category.as_str()).or_insert(0) += 1;
        }
        add_to_group(&mut by_category, &row.ticket_category, count);
        add_to_group(&mut by_reason, &row.visit_reason, count);

        for band in AgeBand::ALL {
            if let Some(n) = row.age(band) {
                age_bands.add(band, n);
            }
        }
    }

    // BTreeMap iterates in label order, so the first maximum wins ties.
    let mut top: Option<(&str, usize)> = None;
    for (label, freq) in category_freq {
        if top.is_none_or(|(_, best)| freq > best) {
            top = Some((label, freq));
        }
    }

    VisitorSummary {
        record_count,
        total_visitors,
        unique_cities: cities.len(),
        top_ticket_category: top.map(|(label, _)| label.to_string()),
        age_bands,
        by_ticket_category: grouped_entries(
            TicketCategory::ALL.iter().map(|c| c.label()),
            by_category,
        ),
        by_visit_reason: grouped_entries(VisitReason::ALL.iter().map(|r| r.label()), by_reason),
    }
}

fn add_to_group(groups: &mut BTreeMap<String, i64>, label: &str, count: Option<i64>) {
    if label.trim().is_empty() {
        return;
    }
    let slot = groups.entry(label.to_string()).or_insert(0);
    if let Some(n) = count {
        *slot = slot.saturating_add(n);
    }
}

/// Known labels first, in declaration order and zero-filled, then any other
/// labels found in the data, sorted.
fn grouped_entries<'a>(
    known: impl Iterator<Item = &'a str>,
    mut observed: BTreeMap<String, i64>,
) -> Vec<StatEntry> {
    let mut entries: Vec<StatEntry> = known
        .map(|label| StatEntry {
            label: label.to_string(),
            value: observed.remove(label).unwrap_or(0),
        })
        .collect();
    entries.extend(
        observed
            .into_iter()
            .map(|(label, value)| StatEntry { label, value }),
    );
    entries
}
