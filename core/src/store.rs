//! Flat-file persistence layer.
//!
//! RULE: Only store.rs touches the data file.
//! Everything else works on the in-memory `VisitorTable`.
//!
//! The medium is a comma-delimited file with a header row whose columns are
//! exactly `COLUMNS`, in that order. Cells are kept as raw text in memory so a
//! hand-edited file with odd values survives a load/persist cycle untouched;
//! typed access goes through the accessor methods on `VisitorRow`.

use crate::{
    error::{LedgerError, LedgerResult, SchemaMismatch},
    record::{AgeBand, AgeBands, TicketCategory, VisitOccurrence, VisitReason, VisitorRecord},
    types::{Headcount, RecordId, DATE_FORMAT, TIMESTAMP_FORMAT},
};
use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Required header, in stored order.
pub const COLUMNS: [&str; 15] = [
    "record_id",
    "visit_date",
    "recorded_at",
    "origin_city",
    "ticket_category",
    "visit_reason",
    "visit_occurrence",
    "duration_minutes",
    "visitor_count",
    "age_under_7",
    "age_7_19",
    "age_20_35",
    "age_36_60",
    "age_61_plus",
    "comment",
];

/// Coerce a stored cell to a whole number.
///
/// Accepts integers and finite floats without a fractional part ("3.0").
/// Anything else is treated as missing.
pub fn numeric_cell(cell: &str) -> Option<i64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    if let Ok(n) = cell.parse::<i64>() {
        return Some(n);
    }
    match cell.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(f as i64),
        _ => None,
    }
}

// ── Row ──────────────────────────────────────────────────────────────────────

/// One stored row, cell for cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitorRow {
    pub record_id:        String,
    pub visit_date:       String,
    pub recorded_at:      String,
    pub origin_city:      String,
    pub ticket_category:  String,
    pub visit_reason:     String,
    pub visit_occurrence: String,
    pub duration_minutes: String,
    pub visitor_count:    String,
    pub age_under_7:      String,
    pub age_7_19:         String,
    pub age_20_35:        String,
    pub age_36_60:        String,
    pub age_61_plus:      String,
    pub comment:          String,
}

impl VisitorRow {
    /// `None` when the cell is empty or not a non-negative whole number.
    pub fn record_id(&self) -> Option<RecordId> {
        numeric_cell(&self.record_id).and_then(|n| RecordId::try_from(n).ok())
    }

    pub fn visitor_count(&self) -> Option<i64> {
        numeric_cell(&self.visitor_count)
    }

    pub fn age(&self, band: AgeBand) -> Option<i64> {
        numeric_cell(self.age_cell(band))
    }

    pub fn visit_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.visit_date.trim(), DATE_FORMAT).ok()
    }

    fn age_cell(&self, band: AgeBand) -> &str {
        match band {
            AgeBand::Under7     => &self.age_under_7,
            AgeBand::From7To19  => &self.age_7_19,
            AgeBand::From20To35 => &self.age_20_35,
            AgeBand::From36To60 => &self.age_36_60,
            AgeBand::From61     => &self.age_61_plus,
        }
    }

    fn malformed(&self, column: &'static str, value: &str) -> LedgerError {
        LedgerError::MalformedCell {
            record: self.record_id.clone(),
            column,
            value: value.to_string(),
        }
    }

    fn headcount(&self, column: &'static str, cell: &str) -> LedgerResult<Headcount> {
        numeric_cell(cell)
            .and_then(|n| Headcount::try_from(n).ok())
            .ok_or_else(|| self.malformed(column, cell))
    }
}

impl From<&VisitorRecord> for VisitorRow {
    fn from(r: &VisitorRecord) -> Self {
        Self {
            record_id:        r.record_id.to_string(),
            visit_date:       r.visit_date.format(DATE_FORMAT).to_string(),
            recorded_at:      r.recorded_at.format(TIMESTAMP_FORMAT).to_string(),
            origin_city:      r.origin_city.clone(),
            ticket_category:  r.ticket_category.label().to_string(),
            visit_reason:     r.visit_reason.label().to_string(),
            visit_occurrence: r.visit_occurrence.label().to_string(),
            duration_minutes: r.duration_minutes.map(|m| m.to_string()).unwrap_or_default(),
            visitor_count:    r.visitor_count.to_string(),
            age_under_7:      r.ages.age_under_7.to_string(),
            age_7_19:         r.ages.age_7_19.to_string(),
            age_20_35:        r.ages.age_20_35.to_string(),
            age_36_60:        r.ages.age_36_60.to_string(),
            age_61_plus:      r.ages.age_61_plus.to_string(),
            comment:          r.comment.clone(),
        }
    }
}

impl TryFrom<&VisitorRow> for VisitorRecord {
    type Error = LedgerError;

    /// Strict typed view of a stored row. Fails on the first malformed cell.
    fn try_from(row: &VisitorRow) -> LedgerResult<Self> {
        let record_id = row
            .record_id()
            .ok_or_else(|| row.malformed("record_id", &row.record_id))?;
        let visit_date = row
            .visit_date()
            .ok_or_else(|| row.malformed("visit_date", &row.visit_date))?;
        let recorded_at = NaiveDateTime::parse_from_str(row.recorded_at.trim(), TIMESTAMP_FORMAT)
            .map_err(|_| row.malformed("recorded_at", &row.recorded_at))?;
        let ticket_category: TicketCategory = row
            .ticket_category
            .parse()
            .map_err(|_| row.malformed("ticket_category", &row.ticket_category))?;
        let visit_reason: VisitReason = row
            .visit_reason
            .parse()
            .map_err(|_| row.malformed("visit_reason", &row.visit_reason))?;
        let visit_occurrence: VisitOccurrence = row
            .visit_occurrence
            .parse()
            .map_err(|_| row.malformed("visit_occurrence", &row.visit_occurrence))?;
        let duration_minutes = if row.duration_minutes.trim().is_empty() {
            None
        } else {
            Some(row.headcount("duration_minutes", &row.duration_minutes)?)
        };

        Ok(VisitorRecord {
            record_id,
            visit_date,
            recorded_at,
            origin_city: row.origin_city.clone(),
            ticket_category,
            visit_reason,
            visit_occurrence,
            duration_minutes,
            visitor_count: row.headcount("visitor_count", &row.visitor_count)?,
            ages: AgeBands {
                age_under_7: row.headcount("age_under_7", &row.age_under_7)?,
                age_7_19:    row.headcount("age_7_19", &row.age_7_19)?,
                age_20_35:   row.headcount("age_20_35", &row.age_20_35)?,
                age_36_60:   row.headcount("age_36_60", &row.age_36_60)?,
                age_61_plus: row.headcount("age_61_plus", &row.age_61_plus)?,
            },
            comment: row.comment.clone(),
        })
    }
}

// ── Table ────────────────────────────────────────────────────────────────────

/// The whole stored history, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitorTable {
    pub rows: Vec<VisitorRow>,
}

impl VisitorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append rows at the end, in the order given. No reordering, no dedup.
    pub fn append<I>(&mut self, rows: I)
    where
        I: IntoIterator<Item = VisitorRow>,
    {
        self.rows.extend(rows);
    }

    pub fn append_records(&mut self, records: &[VisitorRecord]) {
        self.append(records.iter().map(VisitorRow::from));
    }
}

/// Result of `RecordStore::load`.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub table:           VisitorTable,
    /// Set when the file existed but its header was unusable.
    pub schema_mismatch: Option<SchemaMismatch>,
}

// ── Store ────────────────────────────────────────────────────────────────────

pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the data file into memory.
    ///
    /// A missing file yields an empty table. A file whose header lacks any
    /// required column also yields an empty table, plus a `SchemaMismatch`.
    pub fn load(&self) -> LedgerResult<LoadReport> {
        if !self.path.exists() {
            log::debug!("No data file at {}; starting empty", self.path.display());
            return Ok(LoadReport { table: VisitorTable::new(), schema_mismatch: None });
        }

        let file = File::open(&self.path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(BufReader::new(file));

        let headers = reader.headers()?.clone();
        let missing: Vec<String> = COLUMNS
            .iter()
            .filter(|col| !headers.iter().any(|h| h == **col))
            .map(|col| col.to_string())
            .collect();

        if !missing.is_empty() {
            let mismatch = SchemaMismatch {
                path: self.path.display().to_string(),
                missing,
            };
            log::warn!("{mismatch}");
            return Ok(LoadReport {
                table:           VisitorTable::new(),
                schema_mismatch: Some(mismatch),
            });
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let mut record = record?;
            // Short rows get empty cells; surplus cells have no header.
            record.truncate(headers.len());
            while record.len() < headers.len() {
                record.push_field("");
            }
            rows.push(record.deserialize::<VisitorRow>(Some(&headers))?);
        }
        log::debug!("Loaded {} rows from {}", rows.len(), self.path.display());

        Ok(LoadReport { table: VisitorTable { rows }, schema_mismatch: None })
    }

    /// Rewrite the whole data file from `table`.
    ///
    /// Writes a temporary file next to the data file and renames it over the
    /// data file, so the file on disk is either the old table or the new one.
    /// The temporary file is removed if any step fails.
    pub fn persist(&self, table: &VisitorTable) -> LedgerResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            // Header written by hand so an empty table still gets one.
            let mut writer = WriterBuilder::new()
                .has_headers(false)
                .from_writer(tmp.as_file_mut());
            writer.write_record(COLUMNS)?;
            for row in &table.rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        log::info!("Saved {} rows to {}", table.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_cell_coercion() {
        assert_eq!(numeric_cell("12"), Some(12));
        assert_eq!(numeric_cell(" 7 "), Some(7));
        assert_eq!(numeric_cell("3.0"), Some(3));
        assert_eq!(numeric_cell("3.5"), None);
        assert_eq!(numeric_cell(""), None);
        assert_eq!(numeric_cell("many"), None);
        assert_eq!(numeric_cell("NaN"), None);
    }

    #[test]
    fn negative_record_id_is_absent() {
        let row = VisitorRow { record_id: "-4".into(), ..Default::default() };
        assert_eq!(row.record_id(), None);
    }
}
