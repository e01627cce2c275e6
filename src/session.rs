use tracing::{debug, warn};

use crate::errors::{StartError, SubmissionError};
use crate::marks::{MarkSet, Tally};
use crate::models::{AttendanceMark, SessionRecord, Student};
use crate::roster::Roster;
use crate::submission::SubmissionService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Selecting,
    Marking,
    Reviewing,
}

/// Presentation hint for which way the roster last scrolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Events the marking screen accepts, whatever device produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Mark(AttendanceMark),
    MoveUp,
    MoveDown,
    FinishEarly,
}

#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    pub session: SessionRecord,
    pub tally: Tally,
}

pub struct AttendanceSession<'r> {
    roster: &'r Roster,
    screen: Screen,
    cursor: usize,
    marks: MarkSet,
    direction: Direction,
}

impl<'r> AttendanceSession<'r> {
    pub fn new(roster: &'r Roster) -> Self {
        Self {
            roster,
            screen: Screen::Selecting,
            cursor: 0,
            marks: MarkSet::new(),
            direction: Direction::Down,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// 1-based position shown to the operator.
    pub fn position(&self) -> usize {
        self.cursor() + 1
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn marks(&self) -> &MarkSet {
        &self.marks
    }

    pub fn roster(&self) -> &'r Roster {
        self.roster
    }

    pub fn current(&self) -> Option<&'r Student> {
        self.roster.get(self.cursor)
    }

    pub fn previous(&self) -> Option<&'r Student> {
        self.cursor.checked_sub(1).and_then(|i| self.roster.get(i))
    }

    pub fn next(&self) -> Option<&'r Student> {
        self.roster.get(self.cursor + 1)
    }

    /// Marked students in roster order, as listed on the review screen.
    pub fn reviewed_students(&self) -> Vec<(&'r Student, AttendanceMark)> {
        self.roster
            .iter()
            .filter_map(|s| self.marks.get(&s.id).map(|mark| (s, mark)))
            .collect()
    }

    /// Begins marking at a 1-based roster position with an empty mark set.
    /// Positions outside the roster are rejected and nothing changes.
    pub fn start(&mut self, position: usize) -> Result<(), StartError> {
        if self.screen != Screen::Selecting {
            return Err(StartError::Busy);
        }
        if position == 0 || position > self.roster.len() {
            warn!(position, len = self.roster.len(), "rejected start position");
            return Err(StartError::OutOfRange {
                position,
                len: self.roster.len(),
            });
        }
        self.cursor = position - 1;
        self.marks.clear();
        self.direction = Direction::Down;
        self.screen = Screen::Marking;
        debug!(cursor = self.cursor, "marking started");
        Ok(())
    }

    /// Applies a marking-screen event. Returns false when the event was a no-op.
    pub fn apply(&mut self, event: Event) -> bool {
        match event {
            Event::Mark(mark) => self.mark(mark),
            Event::MoveUp => self.move_up(),
            Event::MoveDown => self.move_down(),
            Event::FinishEarly => self.finish_early(),
        }
    }

    pub fn mark(&mut self, mark: AttendanceMark) -> bool {
        if self.screen != Screen::Marking {
            return false;
        }
        let Some(student) = self.current() else {
            return false;
        };
        self.marks.set(&student.id, mark);
        if self.cursor + 1 < self.roster.len() {
            self.direction = Direction::Down;
            self.cursor += 1;
        } else {
            self.screen = Screen::Reviewing;
            debug!(marked = self.marks.len(), "last student marked, reviewing");
        }
        true
    }

    pub fn move_up(&mut self) -> bool {
        if self.screen != Screen::Marking || self.cursor == 0 {
            return false;
        }
        self.direction = Direction::Up;
        self.cursor -= 1;
        true
    }

    pub fn move_down(&mut self) -> bool {
        if self.screen != Screen::Marking || self.cursor + 1 >= self.roster.len() {
            return false;
        }
        self.direction = Direction::Down;
        self.cursor += 1;
        true
    }

    pub fn finish_early(&mut self) -> bool {
        if self.screen != Screen::Marking || self.marks.is_empty() {
            return false;
        }
        self.screen = Screen::Reviewing;
        true
    }

    /// Review-screen correction; the student need not have been marked before.
    pub fn update_status(&mut self, id: &str, mark: AttendanceMark) -> bool {
        if self.screen != Screen::Reviewing {
            return false;
        }
        self.marks.set(id, mark);
        true
    }

    pub fn delete_record(&mut self, id: &str) -> bool {
        if self.screen != Screen::Reviewing {
            return false;
        }
        self.marks.delete(id)
    }

    pub fn back(&mut self) -> bool {
        if self.screen != Screen::Reviewing {
            return false;
        }
        self.screen = Screen::Marking;
        true
    }

    /// Commits the mark set. On failure the marks and screen stay as they were.
    pub async fn submit(
        &mut self,
        remark: &str,
        service: &SubmissionService<'_>,
    ) -> Result<SubmitReceipt, SubmissionError> {
        if self.screen != Screen::Reviewing {
            return Err(SubmissionError::NotReviewing);
        }
        let tally = self.marks.tally();
        let session = service.submit(&self.marks, remark).await?;
        self.marks.clear();
        self.screen = Screen::Selecting;
        Ok(SubmitReceipt { session, tally })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::tests::{sample_roster, student};
    use crate::store::memory::MemoryStore;
    use crate::models::AttendanceMark::{Absent, Present};

    #[test]
    fn start_places_cursor_on_requested_student() {
        let roster = sample_roster();
        for i in 0..roster.len() {
            let mut session = AttendanceSession::new(&roster);
            session.start(i + 1).unwrap();
            assert_eq!(session.current(), roster.get(i));
            assert_eq!(session.screen(), Screen::Marking);
        }
    }

    #[test]
    fn start_rejects_out_of_range_positions() {
        let roster = sample_roster();
        let mut session = AttendanceSession::new(&roster);
        assert_eq!(
            session.start(0),
            Err(StartError::OutOfRange { position: 0, len: 3 })
        );
        assert_eq!(
            session.start(4),
            Err(StartError::OutOfRange { position: 4, len: 3 })
        );
        assert_eq!(session.screen(), Screen::Selecting);
    }

    #[test]
    fn start_refused_while_session_in_progress() {
        let roster = sample_roster();
        let mut session = AttendanceSession::new(&roster);
        session.start(1).unwrap();
        session.mark(Present);
        assert_eq!(session.start(1), Err(StartError::Busy));
        assert_eq!(session.marks().len(), 1);
    }

    #[test]
    fn moves_are_clamped_at_both_ends() {
        let roster = sample_roster();
        let mut session = AttendanceSession::new(&roster);
        session.start(1).unwrap();
        assert!(!session.move_up());
        assert!(!session.move_up());
        assert_eq!(session.cursor(), 0);

        assert!(session.move_down());
        assert!(session.move_down());
        assert!(!session.move_down());
        assert!(!session.move_down());
        assert_eq!(session.cursor(), 2);
        assert_eq!(session.direction(), Direction::Down);

        assert!(session.move_up());
        assert_eq!(session.direction(), Direction::Up);
        assert!(session.marks().is_empty());
    }

    #[test]
    fn marking_advances_then_reviews_after_last() {
        let roster = sample_roster();
        let mut session = AttendanceSession::new(&roster);
        session.start(1).unwrap();

        assert!(session.apply(Event::Mark(Present)));
        assert_eq!(session.cursor(), 1);
        assert_eq!(session.screen(), Screen::Marking);
        assert!(session.apply(Event::Mark(Absent)));
        assert_eq!(session.cursor(), 2);
        assert!(session.apply(Event::Mark(Present)));
        assert_eq!(session.screen(), Screen::Reviewing);

        assert_eq!(session.marks().get("S1"), Some(Present));
        assert_eq!(session.marks().get("S2"), Some(Absent));
        assert_eq!(session.marks().get("S3"), Some(Present));
        assert_eq!(
            session.marks().tally(),
            Tally {
                present: 2,
                absent: 1
            }
        );
    }

    #[test]
    fn marking_ignored_outside_marking_screen() {
        let roster = sample_roster();
        let mut session = AttendanceSession::new(&roster);
        assert!(!session.mark(Present));
        assert!(session.marks().is_empty());
    }

    #[test]
    fn finish_early_requires_a_mark() {
        let roster = sample_roster();
        let mut session = AttendanceSession::new(&roster);
        session.start(2).unwrap();
        assert!(!session.apply(Event::FinishEarly));
        assert_eq!(session.screen(), Screen::Marking);

        session.mark(Absent);
        assert!(session.apply(Event::FinishEarly));
        assert_eq!(session.screen(), Screen::Reviewing);
        assert_eq!(session.marks().len(), 1);
        assert_eq!(session.marks().get("S2"), Some(Absent));
    }

    #[test]
    fn review_edits_and_back() {
        let roster = sample_roster();
        let mut session = AttendanceSession::new(&roster);
        session.start(3).unwrap();
        session.mark(Present);
        assert_eq!(session.screen(), Screen::Reviewing);

        assert!(session.update_status("S1", Absent));
        assert!(session.update_status("S3", Absent));
        assert!(!session.delete_record("S2"));
        assert!(session.delete_record("S1"));
        let reviewed: Vec<_> = session
            .reviewed_students()
            .into_iter()
            .map(|(s, m)| (s.id.as_str(), m))
            .collect();
        assert_eq!(reviewed, vec![("S3", Absent)]);

        assert!(session.back());
        assert_eq!(session.screen(), Screen::Marking);
        assert_eq!(session.cursor(), 2);
        assert!(!session.update_status("S1", Present));
    }

    #[test]
    fn neighbours_follow_cursor() {
        let roster = sample_roster();
        let mut session = AttendanceSession::new(&roster);
        session.start(1).unwrap();
        assert!(session.previous().is_none());
        assert_eq!(session.next().unwrap().id, "S2");
        session.move_down();
        assert_eq!(session.previous().unwrap().id, "S1");
        assert_eq!(session.position(), 2);
    }

    #[tokio::test]
    async fn successful_submit_resets_to_selecting() {
        let store = MemoryStore::new();
        let roster = sample_roster();
        let service = SubmissionService::new(&store, &roster);
        let mut session = AttendanceSession::new(&roster);
        session.start(1).unwrap();
        session.mark(Present);
        session.mark(Absent);
        session.finish_early();

        let receipt = session.submit("lab", &service).await.unwrap();
        assert_eq!(
            receipt.tally,
            Tally {
                present: 1,
                absent: 1
            }
        );
        assert_eq!(session.screen(), Screen::Selecting);
        assert!(session.marks().is_empty());
        assert_eq!(store.entries().len(), roster.len());
    }

    #[tokio::test]
    async fn failed_submit_keeps_marks_and_screen() {
        let store = MemoryStore::failing_entry_insert();
        let roster = sample_roster();
        let service = SubmissionService::new(&store, &roster);
        let mut session = AttendanceSession::new(&roster);
        session.start(1).unwrap();
        session.mark(Present);
        session.finish_early();

        let err = session.submit("", &service).await.unwrap_err();
        assert!(matches!(err, SubmissionError::AttendanceWrite(_)));
        assert_eq!(session.screen(), Screen::Reviewing);
        assert_eq!(session.marks().get("S1"), Some(Present));
    }

    #[tokio::test]
    async fn submit_refused_outside_review() {
        let store = MemoryStore::new();
        let roster = sample_roster();
        let service = SubmissionService::new(&store, &roster);
        let mut session = AttendanceSession::new(&roster);
        assert_eq!(
            session.submit("", &service).await.unwrap_err(),
            SubmissionError::NotReviewing
        );
        assert!(store.sessions().is_empty());
    }

    #[tokio::test]
    async fn emptied_review_still_records_an_all_null_session() {
        let store = MemoryStore::new();
        let roster = sample_roster();
        let service = SubmissionService::new(&store, &roster);
        let mut session = AttendanceSession::new(&roster);
        session.start(1).unwrap();
        session.mark(Present);
        session.finish_early();
        session.delete_record("S1");

        let receipt = session.submit("", &service).await.unwrap();
        assert_eq!(receipt.tally, Tally::default());
        assert_eq!(session.screen(), Screen::Selecting);

        let rows: Vec<_> = store
            .entries()
            .into_iter()
            .filter(|row| row.session_id == receipt.session.id)
            .collect();
        assert_eq!(rows.len(), roster.len());
        assert!(rows.iter().all(|row| row.attendance.is_none()));
    }

    #[test]
    fn single_student_roster_reviews_immediately() {
        let roster = Roster::new(vec![student("X1", "Solo", "CSE")]).unwrap();
        let mut session = AttendanceSession::new(&roster);
        session.start(1).unwrap();
        assert!(!session.move_down());
        session.mark(Absent);
        assert_eq!(session.screen(), Screen::Reviewing);
    }
}
