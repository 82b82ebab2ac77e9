//! The data directory: the SQLite database with subjects, rooms and staff,
//! plus the JSON files the service reads before a run and writes after it.

use crate::calendar::{CalendarGrid, HolidaySet, format_date, parse_date};
use crate::data::{Classroom, Dataset, Lecturer, Subject, SubjectClassroom, SubjectLecturer};
use crate::error::Result;
use chrono::NaiveDate;
use log::{debug, info};
use rusqlite::{Connection, OpenFlags, Row};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DATABASE_FILE: &str = "database.db";
pub const WORKDAYS_FILE: &str = "workdays.json";
pub const HOLIDAYS_FILE: &str = "holidays.json";
pub const TIMETABLE_FILE: &str = "timetable.json";

/// Directory holding the database, calendars and the last timetable.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }

    /// Reads every table a run needs from `database.db`.
    pub fn load_dataset(&self) -> Result<Dataset> {
        let conn = self.open_database()?;
        let dataset = Dataset {
            subjects: query_rows(
                &conn,
                "SELECT subject_name, lecture_count, sem_count, lab_count, lab_equipment FROM Subjects",
                subject_row,
            )?,
            classrooms: query_rows(
                &conn,
                "SELECT classroom_number, capacity, equipment FROM Classrooms",
                classroom_row,
            )?,
            lecturers: query_rows(&conn, LECTURERS_QUERY, lecturer_row)?,
            subject_classrooms: query_rows(
                &conn,
                "SELECT subject_name, classroom_number FROM SubjectClassrooms",
                |row| {
                    Ok(SubjectClassroom {
                        subject_name: row.get("subject_name")?,
                        classroom_number: row.get("classroom_number")?,
                    })
                },
            )?,
            subject_lecturers: query_rows(
                &conn,
                "SELECT subject_name, lecturer_id FROM SubjectLecturers",
                |row| {
                    Ok(SubjectLecturer {
                        subject_name: row.get("subject_name")?,
                        lecturer_id: row.get("lecturer_id")?,
                    })
                },
            )?,
        };
        debug!(
            "Loaded dataset: {} subject(s), {} lecturer(s), {} classroom(s)",
            dataset.subjects.len(),
            dataset.lecturers.len(),
            dataset.classrooms.len()
        );
        Ok(dataset)
    }

    pub fn load_lecturers(&self) -> Result<Vec<Lecturer>> {
        let conn = self.open_database()?;
        query_rows(&conn, LECTURERS_QUERY, lecturer_row)
    }

    fn open_database(&self) -> Result<Connection> {
        let path = self.path(DATABASE_FILE);
        debug!("Opening {}", path.display());
        Ok(Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?)
    }

    pub fn load_workdays(&self) -> Result<Vec<NaiveDate>> {
        let raw: Vec<String> = read_json(&self.path(WORKDAYS_FILE))?;
        raw.iter().map(|s| parse_date(s)).collect()
    }

    pub fn save_workdays(&self, workdays: &[NaiveDate]) -> Result<PathBuf> {
        let raw: Vec<String> = workdays.iter().copied().map(format_date).collect();
        let path = self.path(WORKDAYS_FILE);
        write_json(&path, &raw)?;
        info!("Saved {} working day(s) to {}", raw.len(), path.display());
        Ok(path)
    }

    /// A missing holiday file means no holidays.
    pub fn load_holidays(&self) -> Result<HolidaySet> {
        let path = self.path(HOLIDAYS_FILE);
        if !path.exists() {
            debug!("No holiday file at {}", path.display());
            return Ok(HolidaySet::new());
        }
        let raw: Vec<String> = read_json(&path)?;
        HolidaySet::parse(&raw)
    }

    pub fn save_timetable(&self, grid: &CalendarGrid) -> Result<PathBuf> {
        let path = self.path(TIMETABLE_FILE);
        write_json(&path, grid)?;
        info!("Saved timetable with {} slot(s) to {}", grid.len(), path.display());
        Ok(path)
    }
}

const LECTURERS_QUERY: &str =
    "SELECT lecturer_id, institute, post, surname, name, patronymic FROM Lecturers ORDER BY lecturer_id";

fn query_rows<T>(
    conn: &Connection,
    sql: &str,
    map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], map)?.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

// Counts and free-text columns may be NULL in hand-edited databases.
fn subject_row(row: &Row<'_>) -> rusqlite::Result<Subject> {
    Ok(Subject {
        name: row.get("subject_name")?,
        lectures_remaining: row.get::<_, Option<u32>>("lecture_count")?.unwrap_or_default(),
        seminars_remaining: row.get::<_, Option<u32>>("sem_count")?.unwrap_or_default(),
        labs_remaining: row.get::<_, Option<u32>>("lab_count")?.unwrap_or_default(),
        lab_equipment: row.get::<_, Option<String>>("lab_equipment")?.unwrap_or_default(),
    })
}

fn classroom_row(row: &Row<'_>) -> rusqlite::Result<Classroom> {
    Ok(Classroom {
        classroom_number: row.get("classroom_number")?,
        capacity: row.get::<_, Option<u32>>("capacity")?.unwrap_or_default(),
        equipment: row.get::<_, Option<String>>("equipment")?.unwrap_or_default(),
    })
}

fn lecturer_row(row: &Row<'_>) -> rusqlite::Result<Lecturer> {
    Ok(Lecturer {
        id: row.get("lecturer_id")?,
        institute: row.get::<_, Option<String>>("institute")?.unwrap_or_default(),
        post: row.get::<_, Option<String>>("post")?.unwrap_or_default(),
        surname: row.get("surname")?,
        name: row.get("name")?,
        patronymic: row.get::<_, Option<String>>("patronymic")?.unwrap_or_default(),
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}
