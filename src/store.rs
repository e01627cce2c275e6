use async_trait::async_trait;

use crate::errors::{StoreError, SubmissionError};
use crate::models::{AttendanceRow, NewAttendanceEntry, Operator, SessionRecord, SessionSummary};

/// The remote record store. Passed explicitly to every service that talks to it.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Creates a session and writes its attendance rows as one unit. A
    /// rejected session insert is `SessionCreate`; a rejected row insert is
    /// `AttendanceWrite` and leaves no session behind.
    async fn commit_session(
        &self,
        remark: &str,
        entries: &[NewAttendanceEntry],
    ) -> Result<SessionRecord, SubmissionError>;

    /// All sessions, oldest first.
    async fn list_sessions(&self) -> Result<Vec<SessionRecord>, StoreError>;

    /// One window of attendance rows in a stable order.
    async fn fetch_entries(&self, offset: i64, limit: i64)
        -> Result<Vec<AttendanceRow>, StoreError>;

    async fn find_operator(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<Operator>, StoreError>;

    async fn session_summaries(&self) -> Result<Vec<SessionSummary>, StoreError>;
}
