use std::collections::HashMap;

use chrono::FixedOffset;
use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::ExportError;
use crate::models::{AttendanceRow, SessionRecord, Student};
use crate::roster::Roster;
use crate::store::AttendanceStore;

pub const SHEET_NAME: &str = "Attendance";
pub const ROLL_NUMBER_HEADER: &str = "Roll Number";
pub const NAME_HEADER: &str = "Name";
pub const TOTAL_HEADER: &str = "Total Attendance";
pub const PERCENTAGE_HEADER: &str = "Attendance Percentage";

const ROLL_NUMBER_WIDTH: f64 = 15.0;
const NAME_WIDTH: f64 = 30.0;
const DATE_WIDTH: f64 = 18.0;
const TOTAL_WIDTH: f64 = 15.0;
const PERCENTAGE_WIDTH: f64 = 20.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Blank,
    Number(i64),
    Text(String),
}

/// A single named-column sheet, ready for a sink.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub widths: Vec<f64>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// Number of per-session date columns.
    pub fn session_columns(&self) -> usize {
        self.headers.len().saturating_sub(4)
    }
}

#[derive(Debug)]
pub enum ExportOutcome {
    /// No session has ever been recorded.
    NoRecords,
    Sheet(Sheet),
}

pub struct ExportService<'a> {
    store: &'a dyn AttendanceStore,
    roster: &'a Roster,
    page_size: i64,
    offset: FixedOffset,
}

impl<'a> ExportService<'a> {
    pub fn new(
        store: &'a dyn AttendanceStore,
        roster: &'a Roster,
        page_size: i64,
        offset: FixedOffset,
    ) -> Self {
        Self {
            store,
            roster,
            page_size: page_size.max(1),
            offset,
        }
    }

    pub async fn build_export_matrix(&self) -> Result<ExportOutcome, ExportError> {
        let sessions = self.store.list_sessions().await?;
        if sessions.is_empty() {
            info!("no attendance sessions recorded, nothing to export");
            return Ok(ExportOutcome::NoRecords);
        }
        let entries = self.fetch_all_entries().await?;
        info!(
            sessions = sessions.len(),
            entries = entries.len(),
            "building attendance export"
        );
        Ok(ExportOutcome::Sheet(build_sheet(
            self.roster,
            &sessions,
            &entries,
            self.offset,
        )))
    }

    /// Reads fixed-size windows until one comes back short.
    pub async fn fetch_all_entries(&self) -> Result<Vec<AttendanceRow>, ExportError> {
        let mut entries = Vec::new();
        let mut offset = 0i64;
        loop {
            let batch = self.store.fetch_entries(offset, self.page_size).await?;
            let fetched = batch.len() as i64;
            debug!(offset, fetched, "fetched attendance window");
            entries.extend(batch);
            if fetched < self.page_size {
                break;
            }
            offset += self.page_size;
        }
        Ok(entries)
    }
}

pub fn column_label(session: &SessionRecord, offset: FixedOffset) -> String {
    session
        .created_at
        .with_timezone(&offset)
        .format("%d-%m-%Y %H:%M")
        .to_string()
}

/// Pivots per-session rows into one row per student and one column per session.
pub fn build_sheet(
    roster: &Roster,
    sessions: &[SessionRecord],
    entries: &[AttendanceRow],
    offset: FixedOffset,
) -> Sheet {
    let lookup: HashMap<(Uuid, &str), Option<i16>> = entries
        .iter()
        .map(|row| ((row.session_id, row.student_id.as_str()), row.attendance))
        .collect();

    let mut headers = vec![ROLL_NUMBER_HEADER.to_string(), NAME_HEADER.to_string()];
    headers.extend(sessions.iter().map(|s| column_label(s, offset)));
    headers.push(TOTAL_HEADER.to_string());
    headers.push(PERCENTAGE_HEADER.to_string());

    let mut widths = vec![ROLL_NUMBER_WIDTH, NAME_WIDTH];
    widths.extend(std::iter::repeat(DATE_WIDTH).take(sessions.len()));
    widths.push(TOTAL_WIDTH);
    widths.push(PERCENTAGE_WIDTH);

    let (first, second) = roster.partition();
    let mut rows: Vec<Vec<Cell>> = first
        .iter()
        .map(|student| student_row(student, sessions, &lookup))
        .collect();
    if !first.is_empty() && !second.is_empty() {
        rows.push(Vec::new());
    }
    rows.extend(
        second
            .iter()
            .map(|student| student_row(student, sessions, &lookup)),
    );

    Sheet {
        name: SHEET_NAME.to_string(),
        headers,
        widths,
        rows,
    }
}

fn student_row(
    student: &Student,
    sessions: &[SessionRecord],
    lookup: &HashMap<(Uuid, &str), Option<i16>>,
) -> Vec<Cell> {
    let mut row = vec![
        Cell::Text(student.id.clone()),
        Cell::Text(student.name.clone()),
    ];
    let mut present = 0u32;
    let mut valid = 0u32;

    for session in sessions {
        // A missing row and a stored null both leave the cell blank.
        match lookup.get(&(session.id, student.id.as_str())).copied().flatten() {
            Some(value) => {
                valid += 1;
                if value == 1 {
                    present += 1;
                }
                row.push(Cell::Number(i64::from(value)));
            }
            None => row.push(Cell::Blank),
        }
    }

    row.push(Cell::Text(format!("{present}/{valid}")));
    row.push(Cell::Text(percentage(present, valid)));
    row
}

pub fn percentage(present: u32, valid: u32) -> String {
    if valid == 0 {
        return "0.00%".to_string();
    }
    format!("{:.2}%", f64::from(present) / f64::from(valid) * 100.0)
}
