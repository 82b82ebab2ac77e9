use crate::calendar::CalendarGrid;
use crate::config::{RecurrenceBasis, SchedulerConfig};
use crate::data::{Assignment, SessionType, SlotId, Subject};
use crate::error::{Error, Result};
use crate::priority::{LecturesFirst, SessionPriority};
use crate::resources::ResourcePool;
use crate::sampler::sample_slot;
use crate::suppression::reduce_weights;
use log::{debug, info, trace, warn};
use rand::Rng;
use std::time::{Duration, Instant};

/// The filled grid and how the run got there.
#[derive(Debug, Clone)]
pub struct Solution {
    pub grid: CalendarGrid,
    pub iterations: u64,
    pub elapsed: Duration,
}

/// State of one scheduling run: the grid, the subjects still in play and
/// the random source. Nothing is shared between runs.
pub struct Scheduler<'a, R: Rng> {
    config: &'a SchedulerConfig,
    resources: &'a ResourcePool,
    priority: Box<dyn SessionPriority + 'a>,
    grid: CalendarGrid,
    subjects: Vec<Subject>,
    rng: R,
}

impl<'a, R: Rng> Scheduler<'a, R> {
    /// Subjects without any outstanding session never enter the pool.
    pub fn new(
        config: &'a SchedulerConfig,
        resources: &'a ResourcePool,
        grid: CalendarGrid,
        subjects: Vec<Subject>,
        rng: R,
    ) -> Self {
        let (subjects, idle): (Vec<_>, Vec<_>) = subjects.into_iter().partition(|s| !s.is_exhausted());
        for subject in &idle {
            debug!("Subject '{}' has no sessions to schedule", subject.name);
        }
        Self {
            config,
            resources,
            priority: Box::new(LecturesFirst),
            grid,
            subjects,
            rng,
        }
    }

    pub fn with_priority(mut self, priority: impl SessionPriority + 'a) -> Self {
        self.priority = Box::new(priority);
        self
    }

    pub fn grid(&self) -> &CalendarGrid {
        &self.grid
    }

    /// Subjects that still have sessions outstanding.
    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    /// Commits a session of `subject_index` into `slot_id` and returns how many
    /// slots were filled, counting weekly repeats.
    ///
    /// Targets outside the grid, slots with zero weight and sessions the
    /// subject has no quota left for are ignored.
    pub fn place(&mut self, subject_index: usize, session: SessionType, slot_id: SlotId, classroom: &str) -> usize {
        let Some(subject) = self.subjects.get(subject_index) else {
            warn!("Placement skipped: no subject at index {}", subject_index);
            return 0;
        };
        if subject.remaining(session) == 0 {
            debug!("Placement skipped: '{}' has no {} left", subject.name, session);
            return 0;
        }
        match self.grid.get(slot_id) {
            None => {
                trace!("Slot {} is outside the grid", slot_id);
                return 0;
            }
            Some(slot) if slot.weight == 0.0 => {
                trace!("Slot {} is already taken or unavailable", slot_id);
                return 0;
            }
            Some(_) => {}
        }

        let subject_name = subject.name.clone();
        let lecturer_id = self.resources.choose_lecturer(&subject_name, &mut self.rng);
        if let Some(slot) = self.grid.get_mut(slot_id) {
            slot.weight = 0.0;
            slot.assignment = Some(Assignment {
                subject_name,
                session_type: session,
                lecturer_id,
                classroom_number: classroom.to_string(),
            });
            trace!("Placed {} into slot {} ({})", session, slot_id, slot.date_time);
        }

        reduce_weights(&mut self.grid, slot_id, &self.config.decay);

        let remaining = self.subjects[subject_index].take_one(session);
        1 + self.repeat_weekly(subject_index, session, slot_id, classroom, remaining)
    }

    fn repeat_weekly(
        &mut self,
        subject_index: usize,
        session: SessionType,
        slot_id: SlotId,
        classroom: &str,
        remaining: u32,
    ) -> usize {
        let config = self.config;
        let policy = &config.recurrence;
        if !policy.enabled {
            return 0;
        }

        let count = match policy.basis {
            RecurrenceBasis::Remaining => remaining,
            RecurrenceBasis::Prior => remaining + 1,
        };
        let week = policy.week_offset(self.grid.slots_per_day());

        let mut placed = 0;
        if count > 2 {
            if let Some(earlier) = slot_id.checked_sub(week) {
                placed += self.place(subject_index, session, earlier, classroom);
            }
            placed += self.place(subject_index, session, slot_id + week, classroom);
        } else if count == 2 {
            placed += self.place(subject_index, session, slot_id + week, classroom);
        }
        placed
    }

    /// One driver iteration: pick a subject and session type, sample a slot,
    /// place, retire the subject once it has nothing left.
    pub fn step(&mut self) -> usize {
        if self.subjects.is_empty() {
            return 0;
        }

        let subject_index = self.rng.random_range(0..self.subjects.len());
        let session = self.priority.next_session(&self.subjects[subject_index]);
        let slot_id = sample_slot(&self.grid, &mut self.rng);
        let classroom = self
            .resources
            .choose_classroom(&self.subjects[subject_index].name, &mut self.rng);

        let placed = self.place(subject_index, session, slot_id, &classroom);

        if self.subjects[subject_index].is_exhausted() {
            let done = self.subjects.remove(subject_index);
            debug!("Subject '{}' fully scheduled, {} left", done.name, self.subjects.len());
        }
        placed
    }

    /// Runs until every subject is exhausted or the iteration budget is spent.
    pub fn run(mut self) -> Result<Solution> {
        self.config.validate()?;

        let start_time = Instant::now();
        let outstanding: u32 = self.subjects.iter().map(Subject::total_remaining).sum();
        info!(
            "Scheduling {} subject(s), {} session(s) onto {} slot(s)...",
            self.subjects.len(),
            outstanding,
            self.grid.len()
        );

        let mut iterations = 0u64;
        while !self.subjects.is_empty() {
            if let Some(limit) = self.config.max_iterations {
                if iterations >= limit {
                    return Err(Error::IterationBudgetExhausted {
                        iterations,
                        outstanding: self.subjects.len(),
                    });
                }
            }
            self.step();
            iterations += 1;
        }

        let elapsed = start_time.elapsed();
        info!(
            "Finished scheduling in {:.2?} after {} iteration(s), {} slot(s) filled",
            elapsed,
            iterations,
            self.grid.filled().count()
        );
        Ok(Solution {
            grid: self.grid,
            iterations,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{HolidaySet, SLOTS_PER_DAY, workdays_between};
    use crate::data::UNASSIGNED_LECTURER;
    use crate::priority::LabsFirst;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    const WEEK: usize = 7 * SLOTS_PER_DAY;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// `days` consecutive calendar days from Monday 2024-02-12.
    fn calendar_days(days: usize) -> Vec<NaiveDate> {
        date(2024, 2, 12).iter_days().take(days).collect()
    }

    fn no_recurrence() -> SchedulerConfig {
        let mut config = SchedulerConfig::default();
        config.recurrence.enabled = false;
        config
    }

    fn remaining_basis() -> SchedulerConfig {
        let mut config = SchedulerConfig::default();
        config.recurrence.basis = RecurrenceBasis::Remaining;
        config
    }

    fn assert_weight_invariant(grid: &CalendarGrid) {
        for slot in grid.slots() {
            if slot.is_filled() {
                assert_eq!(slot.weight, 0.0, "filled slot {} has weight", slot.id);
            }
            if slot.weight > 0.0 {
                assert!(!slot.is_filled(), "weighted slot {} is filled", slot.id);
            }
        }
    }

    #[test]
    fn test_single_day_single_lecture() {
        let config = no_recurrence();
        let resources = ResourcePool::default();
        let grid = CalendarGrid::build(&calendar_days(1), &config, &HolidaySet::new()).unwrap();
        let rng = ChaCha8Rng::seed_from_u64(1);

        let solution = Scheduler::new(&config, &resources, grid, vec![Subject::new("Algebra", 1, 0, 0)], rng)
            .run()
            .unwrap();

        let filled: Vec<_> = solution.grid.filled().collect();
        assert_eq!(filled.len(), 1);
        assert_eq!(solution.grid.len() - filled.len(), 7);
        let assignment = filled[0].assignment.as_ref().unwrap();
        assert_eq!(assignment.session_type, SessionType::Lecture);
        assert_eq!(assignment.subject_name, "Algebra");
        assert_weight_invariant(&solution.grid);
    }

    #[test]
    fn test_default_basis_repeats_across_three_weeks() {
        let config = SchedulerConfig::default();
        let resources = ResourcePool::default();
        let grid = CalendarGrid::build(&calendar_days(21), &config, &HolidaySet::new()).unwrap();
        let mut scheduler = Scheduler::new(
            &config,
            &resources,
            grid,
            vec![Subject::new("Algebra", 3, 0, 0)],
            ChaCha8Rng::seed_from_u64(2),
        );

        // Wednesday 14:10 in the first week
        let placed = scheduler.place(0, SessionType::Lecture, 2 * SLOTS_PER_DAY + 3, "101");
        assert_eq!(placed, 3);
        let ids: Vec<SlotId> = scheduler.grid().filled().map(|s| s.id).collect();
        assert_eq!(ids, vec![19, 19 + WEEK, 19 + 2 * WEEK]);
        assert!(scheduler.subjects()[0].is_exhausted());
    }

    #[test]
    fn test_remaining_basis_repeats_once_forward() {
        let config = remaining_basis();
        let resources = ResourcePool::default();
        let grid = CalendarGrid::build(&calendar_days(21), &config, &HolidaySet::new()).unwrap();
        let mut scheduler = Scheduler::new(
            &config,
            &resources,
            grid,
            vec![Subject::new("Algebra", 3, 0, 0)],
            ChaCha8Rng::seed_from_u64(3),
        );

        let placed = scheduler.place(0, SessionType::Lecture, 19, "101");
        assert_eq!(placed, 2);
        let ids: Vec<SlotId> = scheduler.grid().filled().map(|s| s.id).collect();
        assert_eq!(ids, vec![19, 19 + WEEK]);
        assert_eq!(scheduler.subjects()[0].lectures_remaining, 1);
    }

    #[test]
    fn test_remaining_basis_repeats_both_ways_when_many_left() {
        let config = remaining_basis();
        let resources = ResourcePool::default();
        let grid = CalendarGrid::build(&calendar_days(21), &config, &HolidaySet::new()).unwrap();
        let mut scheduler = Scheduler::new(
            &config,
            &resources,
            grid,
            vec![Subject::new("Algebra", 0, 4, 0)],
            ChaCha8Rng::seed_from_u64(4),
        );

        // Middle week: 3 left -> both neighbours; backward target then has 2 left
        // and jumps forward onto the starting slot, which is taken.
        let start = WEEK + 10;
        let placed = scheduler.place(0, SessionType::Seminar, start, "201");
        assert_eq!(placed, 3);
        let ids: Vec<SlotId> = scheduler.grid().filled().map(|s| s.id).collect();
        assert_eq!(ids, vec![start - WEEK, start, start + WEEK]);
        assert_eq!(scheduler.subjects()[0].seminars_remaining, 1);
    }

    fn weekly_runs(config: &SchedulerConfig, seeds: u64) -> usize {
        let resources = ResourcePool::default();
        let mut all_weekly = 0;
        for seed in 0..seeds {
            let grid = CalendarGrid::build(&calendar_days(21), config, &HolidaySet::new()).unwrap();
            let solution = Scheduler::new(
                config,
                &resources,
                grid,
                vec![Subject::new("Algebra", 3, 0, 0)],
                ChaCha8Rng::seed_from_u64(seed),
            )
            .run()
            .unwrap();

            let ids: Vec<SlotId> = solution.grid.filled().map(|s| s.id).collect();
            assert_eq!(ids.len(), 3);
            if ids.windows(2).all(|w| (w[1] - w[0]) % WEEK == 0) {
                all_weekly += 1;
            }
        }
        all_weekly
    }

    #[test]
    fn test_driver_keeps_weekly_cadence() {
        // A first draw in week one or two repeats into all three weeks; a
        // draw in the last week can only reach back once.
        let default_runs = weekly_runs(&SchedulerConfig::default(), 200);
        assert!(default_runs >= 100, "{}/200 runs fully weekly", default_runs);

        let remaining_runs = weekly_runs(&remaining_basis(), 200);
        assert!(default_runs > remaining_runs);
    }

    #[test]
    fn test_out_of_range_and_taken_slots_are_ignored() {
        let config = no_recurrence();
        let resources = ResourcePool::default();
        let grid = CalendarGrid::build(&calendar_days(1), &config, &HolidaySet::new()).unwrap();
        let mut scheduler = Scheduler::new(
            &config,
            &resources,
            grid,
            vec![Subject::new("Algebra", 2, 0, 0)],
            ChaCha8Rng::seed_from_u64(5),
        );

        assert_eq!(scheduler.place(0, SessionType::Lecture, 500, ""), 0);
        assert_eq!(scheduler.place(0, SessionType::Lecture, 4, ""), 1);
        assert_eq!(scheduler.place(0, SessionType::Lecture, 4, ""), 0);
        assert_eq!(scheduler.place(7, SessionType::Lecture, 5, ""), 0);
        assert_eq!(scheduler.place(0, SessionType::Lab, 5, ""), 0);
        assert_eq!(scheduler.subjects()[0].lectures_remaining, 1);
        assert_eq!(scheduler.grid().filled().count(), 1);
    }

    #[test]
    fn test_holiday_never_assigned() {
        let config = SchedulerConfig::default();
        let resources = ResourcePool::default();
        let holidays = HolidaySet::parse(&["2024-02-23"]).unwrap();
        let days = workdays_between(date(2024, 2, 19), date(2024, 2, 24)).unwrap();
        let grid = CalendarGrid::build(&days, &config, &holidays).unwrap();
        assert!(
            grid.slots()
                .iter()
                .filter(|s| s.date == date(2024, 2, 23))
                .all(|s| s.weight == 0.0)
        );

        for seed in 0..10 {
            let solution = Scheduler::new(
                &config,
                &resources,
                grid.clone(),
                vec![Subject::new("Algebra", 3, 2, 2), Subject::new("Physics", 2, 2, 3)],
                ChaCha8Rng::seed_from_u64(seed),
            )
            .run()
            .unwrap();
            assert!(solution.grid.filled().all(|s| s.date != date(2024, 2, 23)));
            assert_eq!(solution.grid.filled().count(), 14);
        }
    }

    #[test]
    fn test_empty_resources_bind_sentinels() {
        let config = no_recurrence();
        let resources = ResourcePool::default().with_classrooms("Algebra", &[]);
        let grid = CalendarGrid::build(&calendar_days(1), &config, &HolidaySet::new()).unwrap();
        let solution = Scheduler::new(
            &config,
            &resources,
            grid,
            vec![Subject::new("Algebra", 1, 1, 0)],
            ChaCha8Rng::seed_from_u64(6),
        )
        .run()
        .unwrap();

        assert_eq!(solution.grid.filled().count(), 2);
        for slot in solution.grid.filled() {
            let assignment = slot.assignment.as_ref().unwrap();
            assert_eq!(assignment.classroom_number, "");
            assert_eq!(assignment.lecturer_id, UNASSIGNED_LECTURER);
        }
    }

    #[test]
    fn test_bound_resources_come_from_subject() {
        let config = SchedulerConfig::default();
        let resources = ResourcePool::default()
            .with_classrooms("Algebra", &["101", "102"])
            .with_lecturers("Algebra", &[7])
            .with_classrooms("Physics", &["Lab-1"])
            .with_lecturers("Physics", &[8, 9]);
        let days = workdays_between(date(2024, 2, 12), date(2024, 4, 6)).unwrap();
        let grid = CalendarGrid::build(&days, &config, &HolidaySet::new()).unwrap();
        let solution = Scheduler::new(
            &config,
            &resources,
            grid,
            vec![Subject::new("Algebra", 8, 4, 0), Subject::new("Physics", 4, 0, 8)],
            ChaCha8Rng::seed_from_u64(7),
        )
        .run()
        .unwrap();

        for slot in solution.grid.filled() {
            let a = slot.assignment.as_ref().unwrap();
            match a.subject_name.as_str() {
                "Algebra" => {
                    assert!(["101", "102"].contains(&a.classroom_number.as_str()));
                    assert_eq!(a.lecturer_id, 7);
                }
                "Physics" => {
                    assert_eq!(a.classroom_number, "Lab-1");
                    assert!([8, 9].contains(&a.lecturer_id));
                }
                other => panic!("unexpected subject {}", other),
            }
        }
    }

    #[test]
    fn test_semester_conservation_and_invariants() {
        let holidays = HolidaySet::parse(&["2024-02-23", "2024-03-08", "2024-05-01", "2024-05-09", "2024-06-12"]).unwrap();
        let days = workdays_between(date(2024, 2, 12), date(2024, 6, 16)).unwrap();
        let subjects = vec![
            Subject::new("Algebra", 16, 16, 0),
            Subject::new("Physics", 16, 8, 8),
            Subject::new("History", 8, 8, 0),
            Subject::new("Programming", 8, 0, 16),
            Subject::new("Empty", 0, 0, 0),
        ];
        let expected: u32 = subjects.iter().map(Subject::total_remaining).sum();
        let resources = ResourcePool::default();

        for config in [SchedulerConfig::default(), remaining_basis(), no_recurrence()] {
            for seed in 0..5 {
                let grid = CalendarGrid::build(&days, &config, &holidays).unwrap();
                let solution = Scheduler::new(&config, &resources, grid, subjects.clone(), ChaCha8Rng::seed_from_u64(seed))
                    .run()
                    .unwrap();

                assert_weight_invariant(&solution.grid);
                assert_eq!(solution.grid.filled().count(), expected as usize);
                let ids: HashSet<SlotId> = solution.grid.filled().map(|s| s.id).collect();
                assert_eq!(ids.len(), expected as usize);
                assert!(solution.grid.filled().all(|s| !holidays.contains(s.date)));
            }
        }
    }

    #[test]
    fn test_same_seed_same_timetable() {
        let config = SchedulerConfig::default();
        let resources = ResourcePool::default().with_lecturers("Algebra", &[1, 2, 3]);
        let days = workdays_between(date(2024, 2, 12), date(2024, 3, 30)).unwrap();
        let run = |seed| {
            let grid = CalendarGrid::build(&days, &config, &HolidaySet::new()).unwrap();
            Scheduler::new(&config, &resources, grid, vec![Subject::new("Algebra", 6, 6, 6)], ChaCha8Rng::seed_from_u64(seed))
                .run()
                .unwrap()
                .grid
                .filled()
                .map(|s| (s.id, s.assignment.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_labs_first_priority_is_pluggable() {
        let config = no_recurrence();
        let resources = ResourcePool::default();
        let grid = CalendarGrid::build(&calendar_days(1), &config, &HolidaySet::new()).unwrap();
        let mut scheduler = Scheduler::new(
            &config,
            &resources,
            grid,
            vec![Subject::new("Chemistry", 1, 0, 1)],
            ChaCha8Rng::seed_from_u64(8),
        )
        .with_priority(LabsFirst);

        assert_eq!(scheduler.step(), 1);
        let first = scheduler.grid().filled().next().unwrap();
        assert_eq!(first.assignment.as_ref().unwrap().session_type, SessionType::Lab);
    }

    #[test]
    fn test_stalled_run_hits_iteration_budget() {
        let mut config = SchedulerConfig::default();
        config.max_iterations = Some(50);
        let resources = ResourcePool::default();
        let holidays = HolidaySet::parse(&["2024-02-12"]).unwrap();
        let grid = CalendarGrid::build(&calendar_days(1), &config, &holidays).unwrap();

        let result = Scheduler::new(
            &config,
            &resources,
            grid,
            vec![Subject::new("Algebra", 1, 0, 0)],
            ChaCha8Rng::seed_from_u64(9),
        )
        .run();
        assert!(matches!(
            result,
            Err(Error::IterationBudgetExhausted { iterations: 50, outstanding: 1 })
        ));
    }

    #[test]
    fn test_run_rejects_invalid_config() {
        let resources = ResourcePool::default();
        let grid = CalendarGrid::build(&calendar_days(1), &SchedulerConfig::default(), &HolidaySet::new()).unwrap();
        let mut config = SchedulerConfig::default();
        config.recurrence.days_per_week = 0;

        let result = Scheduler::new(
            &config,
            &resources,
            grid,
            vec![Subject::new("Algebra", 1, 0, 0)],
            ChaCha8Rng::seed_from_u64(11),
        )
        .run();
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_exhausted_subjects_never_enter_pool() {
        let config = SchedulerConfig::default();
        let resources = ResourcePool::default();
        let grid = CalendarGrid::build(&calendar_days(1), &config, &HolidaySet::new()).unwrap();
        let scheduler = Scheduler::new(
            &config,
            &resources,
            grid,
            vec![Subject::new("Nothing", 0, 0, 0)],
            ChaCha8Rng::seed_from_u64(10),
        );
        assert!(scheduler.subjects().is_empty());
        let solution = scheduler.run().unwrap();
        assert_eq!(solution.iterations, 0);
        assert_eq!(solution.grid.filled().count(), 0);
    }
}
