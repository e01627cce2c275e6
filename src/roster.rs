use std::collections::HashSet;
use std::path::Path;

use crate::errors::RosterError;
use crate::models::Student;

/// Fixed, ordered list of students. Built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct Roster {
    students: Vec<Student>,
    first_group: String,
    second_group: Option<String>,
}

impl Roster {
    pub fn new(students: Vec<Student>) -> Result<Self, RosterError> {
        let first_group = students.first().ok_or(RosterError::Empty)?.group.clone();
        let mut second_group: Option<String> = None;
        let mut seen = HashSet::new();

        for student in &students {
            if !seen.insert(student.id.as_str()) {
                return Err(RosterError::DuplicateId(student.id.clone()));
            }
            if student.group == first_group {
                continue;
            }
            match &second_group {
                Some(label) if *label == student.group => {}
                Some(_) => return Err(RosterError::TooManyGroups(student.group.clone())),
                None => second_group = Some(student.group.clone()),
            }
        }

        Ok(Self {
            students,
            first_group,
            second_group,
        })
    }

    /// Reads `roll_number,name,group` rows; file order is roster order.
    pub fn from_csv(path: &Path) -> Result<Self, RosterError> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut students = Vec::new();
        for result in reader.deserialize::<Student>() {
            students.push(result?);
        }
        Self::new(students)
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn get(&self, index: usize) -> Option<&Student> {
        self.students.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Student> {
        self.students.iter()
    }

    pub fn find(&self, id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == id)
    }

    pub fn groups(&self) -> (&str, Option<&str>) {
        (&self.first_group, self.second_group.as_deref())
    }

    /// Number of students in the first group; the second group's positions
    /// start after it.
    pub fn group_offset(&self) -> usize {
        self.students
            .iter()
            .filter(|s| s.group == self.first_group)
            .count()
    }

    /// Maps "the `from`-th student of `group`" onto a 1-based roster position.
    pub fn start_position(&self, group: &str, from: usize) -> Result<usize, RosterError> {
        if from == 0 {
            return Err(RosterError::InvalidStart(group.to_string()));
        }
        let (first, second) = self.groups();
        if group.eq_ignore_ascii_case(first) {
            Ok(from)
        } else if second.is_some_and(|label| group.eq_ignore_ascii_case(label)) {
            Ok(self.group_offset() + from)
        } else {
            Err(RosterError::UnknownGroup(group.to_string()))
        }
    }

    /// Students of each group, keeping their relative roster order.
    pub fn partition(&self) -> (Vec<&Student>, Vec<&Student>) {
        self.students
            .iter()
            .partition(|s| s.group == self.first_group)
    }
}
