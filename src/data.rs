use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

// Type aliases for clarity
pub type SlotId = usize;
pub type LecturerId = i64;
pub type ClassroomNumber = String;

/// Lecturer bound to a slot when the subject has no eligible lecturer.
pub const UNASSIGNED_LECTURER: LecturerId = -1;

/// The three kinds of session a subject has a quota for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    Lecture,
    Seminar,
    Lab,
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionType::Lecture => "lecture",
            SessionType::Seminar => "seminar",
            SessionType::Lab => "lab",
        };
        f.write_str(name)
    }
}

/// A subject with its outstanding session quotas.
///
/// Field names on the wire follow the `Subjects` table the data is exported from.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Subject {
    #[serde(rename = "subject_name")]
    pub name: String,
    #[serde(rename = "lecture_count", default)]
    pub lectures_remaining: u32,
    #[serde(rename = "sem_count", default)]
    pub seminars_remaining: u32,
    #[serde(rename = "lab_count", default)]
    pub labs_remaining: u32,
    #[serde(default)]
    pub lab_equipment: String,
}

impl Subject {
    pub fn new(name: impl Into<String>, lectures: u32, seminars: u32, labs: u32) -> Self {
        Self {
            name: name.into(),
            lectures_remaining: lectures,
            seminars_remaining: seminars,
            labs_remaining: labs,
            lab_equipment: String::new(),
        }
    }

    pub fn remaining(&self, session: SessionType) -> u32 {
        match session {
            SessionType::Lecture => self.lectures_remaining,
            SessionType::Seminar => self.seminars_remaining,
            SessionType::Lab => self.labs_remaining,
        }
    }

    /// Takes one session of the given type off the quota and returns what is left.
    pub fn take_one(&mut self, session: SessionType) -> u32 {
        let counter = match session {
            SessionType::Lecture => &mut self.lectures_remaining,
            SessionType::Seminar => &mut self.seminars_remaining,
            SessionType::Lab => &mut self.labs_remaining,
        };
        *counter = counter.saturating_sub(1);
        *counter
    }

    pub fn total_remaining(&self) -> u32 {
        self.lectures_remaining + self.seminars_remaining + self.labs_remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.total_remaining() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Classroom {
    pub classroom_number: ClassroomNumber,
    #[serde(default)]
    pub capacity: u32,
    #[serde(default)]
    pub equipment: String,
}

/// A row of the `Lecturers` table.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Lecturer {
    #[serde(rename = "lecturer_id", alias = "id")]
    pub id: LecturerId,
    #[serde(default)]
    pub institute: String,
    #[serde(default)]
    pub post: String,
    pub surname: String,
    pub name: String,
    #[serde(default)]
    pub patronymic: String,
}

impl Lecturer {
    pub fn full_name(&self) -> String {
        format!("{} {} {}", self.surname, self.name, self.patronymic)
    }
}

/// Row linking a subject to a classroom it may be taught in.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubjectClassroom {
    pub subject_name: String,
    pub classroom_number: ClassroomNumber,
}

/// Row linking a subject to a lecturer who may teach it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubjectLecturer {
    pub subject_name: String,
    pub lecturer_id: LecturerId,
}

/// Everything read from the data store before a run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Dataset {
    pub subjects: Vec<Subject>,
    pub classrooms: Vec<Classroom>,
    pub lecturers: Vec<Lecturer>,
    pub subject_classrooms: Vec<SubjectClassroom>,
    pub subject_lecturers: Vec<SubjectLecturer>,
}

/// What a filled slot holds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub subject_name: String,
    pub session_type: SessionType,
    pub lecturer_id: LecturerId,
    pub classroom_number: ClassroomNumber,
}

/// One schedulable (date, time-of-day) cell of the calendar grid.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: SlotId,
    pub date: NaiveDate,
    pub time_of_day: usize,
    pub date_time: NaiveDateTime,
    /// Sampling mass. Zero once filled or when never available.
    pub weight: f64,
    pub assignment: Option<Assignment>,
    /// Reserved for tie-breaking; not read by the scheduler.
    pub entropy: i32,
}

impl TimeSlot {
    pub fn is_filled(&self) -> bool {
        self.assignment.is_some()
    }
}

/// A filled slot in the shape the timetable front end consumes.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableEntry {
    pub id: SlotId,
    pub groups: Vec<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub session_label: String,
    pub subgroup: String,
    pub location: ClassroomNumber,
    pub date_time: NaiveDateTime,
    pub url: String,
    pub md_file: String,
}
