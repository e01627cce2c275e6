use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Student {
    #[serde(rename = "roll_number")]
    pub id: String,
    pub name: String,
    pub group: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceMark {
    Present,
    Absent,
}

impl AttendanceMark {
    /// Stored encoding: present is 1, absent is 0.
    pub fn value(self) -> i16 {
        match self {
            AttendanceMark::Present => 1,
            AttendanceMark::Absent => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AttendanceMark::Present => "present",
            AttendanceMark::Absent => "absent",
        }
    }
}

impl std::str::FromStr for AttendanceMark {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "p" | "present" => Ok(AttendanceMark::Present),
            "a" | "absent" => Ok(AttendanceMark::Absent),
            other => Err(format!("unknown attendance mark '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub remark: String,
}

/// One attendance row as it is handed to the store, before a session id exists.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAttendanceEntry {
    pub student_id: String,
    pub student_name: String,
    pub attendance: Option<i16>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceRow {
    pub session_id: Uuid,
    pub student_id: String,
    pub student_name: String,
    pub attendance: Option<i16>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    #[serde(flatten)]
    pub session: SessionRecord,
    pub present: i64,
    pub absent: i64,
    pub unmarked: i64,
}

#[derive(Debug, Clone)]
pub struct Operator {
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn marks_parse_from_operator_input() {
        assert_eq!("P".parse::<AttendanceMark>(), Ok(AttendanceMark::Present));
        assert_eq!("absent".parse::<AttendanceMark>(), Ok(AttendanceMark::Absent));
        assert!("late".parse::<AttendanceMark>().is_err());
        assert_eq!(AttendanceMark::Present.value(), 1);
        assert_eq!(AttendanceMark::Absent.value(), 0);
    }

    #[test]
    fn session_summary_serializes_flat() {
        let summary = SessionSummary {
            session: SessionRecord {
                id: Uuid::nil(),
                created_at: Utc.with_ymd_and_hms(2026, 1, 5, 3, 30, 0).unwrap(),
                remark: "lab".into(),
            },
            present: 20,
            absent: 3,
            unmarked: 1,
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["remark"], "lab");
        assert_eq!(value["present"], 20);
        assert_eq!(value["created_at"], "2026-01-05T03:30:00Z");
    }
}
