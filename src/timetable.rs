//! Display projection of a filled grid.

use crate::calendar::CalendarGrid;
use crate::config::SessionLabels;
use crate::data::{Lecturer, LecturerId, TimetableEntry};
use std::collections::HashMap;

/// One entry per filled slot, in grid order.
///
/// The lecturer's full name goes in `groups`; unknown lecturers show as an
/// empty name.
pub fn to_entries(grid: &CalendarGrid, lecturers: &[Lecturer], labels: &SessionLabels) -> Vec<TimetableEntry> {
    let directory: HashMap<LecturerId, &Lecturer> = lecturers.iter().map(|l| (l.id, l)).collect();

    grid.filled()
        .filter_map(|slot| {
            let assignment = slot.assignment.as_ref()?;
            let full_name = directory
                .get(&assignment.lecturer_id)
                .map(|l| l.full_name())
                .unwrap_or_default();
            Some(TimetableEntry {
                id: slot.id,
                groups: vec![full_name],
                name: assignment.subject_name.clone(),
                session_label: labels.label(assignment.session_type).to_string(),
                subgroup: String::new(),
                location: assignment.classroom_number.clone(),
                date_time: slot.date_time,
                url: String::new(),
                md_file: String::new(),
            })
        })
        .collect()
}
