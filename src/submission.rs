use tracing::{error, info};

use crate::errors::SubmissionError;
use crate::marks::MarkSet;
use crate::models::{NewAttendanceEntry, SessionRecord};
use crate::roster::Roster;
use crate::store::AttendanceStore;

pub struct SubmissionService<'a> {
    store: &'a dyn AttendanceStore,
    roster: &'a Roster,
}

impl<'a> SubmissionService<'a> {
    pub fn new(store: &'a dyn AttendanceStore, roster: &'a Roster) -> Self {
        Self { store, roster }
    }

    /// One row per roster member. Students without a mark get a null value,
    /// never an implicit absent. The name is copied onto the row so exports
    /// need no roster join.
    pub fn build_entries(&self, marks: &MarkSet) -> Vec<NewAttendanceEntry> {
        self.roster
            .iter()
            .map(|student| NewAttendanceEntry {
                student_id: student.id.clone(),
                student_name: student.name.clone(),
                attendance: marks.get(&student.id).map(|mark| mark.value()),
            })
            .collect()
    }

    pub async fn submit(
        &self,
        marks: &MarkSet,
        remark: &str,
    ) -> Result<SessionRecord, SubmissionError> {
        let entries = self.build_entries(marks);
        match self.store.commit_session(remark, &entries).await {
            Ok(session) => {
                info!(
                    session = %session.id,
                    rows = entries.len(),
                    marked = marks.len(),
                    "attendance session committed"
                );
                Ok(session)
            }
            Err(err) => {
                error!(error = %err, "attendance submission failed");
                Err(err)
            }
        }
    }
}
