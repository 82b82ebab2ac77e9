use crate::data::{SessionType, Subject};

/// Decides which session type of a subject the driver schedules next.
pub trait SessionPriority: Send {
    fn next_session(&self, subject: &Subject) -> SessionType;
}

/// Lectures while any remain, then seminars, then labs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LecturesFirst;

impl SessionPriority for LecturesFirst {
    fn next_session(&self, subject: &Subject) -> SessionType {
        if subject.lectures_remaining > 0 {
            SessionType::Lecture
        } else if subject.seminars_remaining > 0 {
            SessionType::Seminar
        } else {
            SessionType::Lab
        }
    }
}

/// Labs while any remain, then seminars, then lectures.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabsFirst;

impl SessionPriority for LabsFirst {
    fn next_session(&self, subject: &Subject) -> SessionType {
        if subject.labs_remaining > 0 {
            SessionType::Lab
        } else if subject.seminars_remaining > 0 {
            SessionType::Seminar
        } else {
            SessionType::Lecture
        }
    }
}
