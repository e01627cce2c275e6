use std::collections::BTreeMap;

use crate::models::AttendanceMark;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub present: usize,
    pub absent: usize,
}

/// In-progress marks for the session being taken, keyed by roll number.
#[derive(Debug, Clone, Default)]
pub struct MarkSet {
    marks: BTreeMap<String, AttendanceMark>,
}

impl MarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: &str, mark: AttendanceMark) {
        self.marks.insert(id.to_string(), mark);
    }

    pub fn get(&self, id: &str) -> Option<AttendanceMark> {
        self.marks.get(id).copied()
    }

    pub fn delete(&mut self, id: &str) -> bool {
        self.marks.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, AttendanceMark)> {
        self.marks.iter().map(|(id, mark)| (id.as_str(), *mark))
    }

    pub fn clear(&mut self) {
        self.marks.clear();
    }

    /// Recounted on every call.
    pub fn tally(&self) -> Tally {
        self.entries().fold(Tally::default(), |mut tally, (_, mark)| {
            match mark {
                AttendanceMark::Present => tally.present += 1,
                AttendanceMark::Absent => tally.absent += 1,
            }
            tally
        })
    }
}
