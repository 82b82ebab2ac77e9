use crate::data::{ClassroomNumber, Dataset, LecturerId, UNASSIGNED_LECTURER};
use itertools::Itertools;
use rand::Rng;
use rand::seq::IndexedRandom;
use std::collections::HashMap;

/// Which lecturers and classrooms each subject may use.
#[derive(Debug, Clone, Default)]
pub struct ResourcePool {
    classrooms: HashMap<String, Vec<ClassroomNumber>>,
    lecturers: HashMap<String, Vec<LecturerId>>,
}

impl ResourcePool {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let classrooms = dataset
            .subject_classrooms
            .iter()
            .map(|row| (row.subject_name.clone(), row.classroom_number.clone()))
            .into_group_map();
        let lecturers = dataset
            .subject_lecturers
            .iter()
            .map(|row| (row.subject_name.clone(), row.lecturer_id))
            .into_group_map();
        Self { classrooms, lecturers }
    }

    pub fn with_classrooms(mut self, subject: &str, classrooms: &[&str]) -> Self {
        self.classrooms
            .insert(subject.to_string(), classrooms.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn with_lecturers(mut self, subject: &str, lecturers: &[LecturerId]) -> Self {
        self.lecturers.insert(subject.to_string(), lecturers.to_vec());
        self
    }

    pub fn eligible_classrooms(&self, subject: &str) -> &[ClassroomNumber] {
        self.classrooms.get(subject).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn eligible_lecturers(&self, subject: &str) -> &[LecturerId] {
        self.lecturers.get(subject).map(Vec::as_slice).unwrap_or_default()
    }

    /// Uniform pick among the subject's lecturers, or [`UNASSIGNED_LECTURER`].
    pub fn choose_lecturer<R: Rng + ?Sized>(&self, subject: &str, rng: &mut R) -> LecturerId {
        self.eligible_lecturers(subject)
            .choose(rng)
            .copied()
            .unwrap_or(UNASSIGNED_LECTURER)
    }

    /// Uniform pick among the subject's classrooms, or an empty number.
    pub fn choose_classroom<R: Rng + ?Sized>(&self, subject: &str, rng: &mut R) -> ClassroomNumber {
        self.eligible_classrooms(subject)
            .choose(rng)
            .cloned()
            .unwrap_or_default()
    }
}
