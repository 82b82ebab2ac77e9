//! Same-day weight decay around a filled slot.

use crate::calendar::CalendarGrid;
use crate::config::DecayConfig;
use crate::data::SlotId;
use chrono::NaiveDate;
use log::trace;

/// Lowers the weights of the slots sharing a day with `filled`.
///
/// The direct neighbours get `decay.base`, each further slot a factor smaller
/// by `decay.falloff`, never below `decay.floor`. Weights already at or under
/// the floor (including zero) are left alone. The walk stops at the first
/// slot belonging to another day.
pub fn reduce_weights(grid: &mut CalendarGrid, filled: SlotId, decay: &DecayConfig) {
    let Some(day) = grid.get(filled).map(|s| s.date) else {
        return;
    };

    let len = grid.len();
    let touched = walk(grid, (0..filled).rev(), day, decay) + walk(grid, filled + 1..len, day, decay);

    trace!("Suppressed {} same-day neighbour(s) of slot {}", touched, filled);
}

fn walk(grid: &mut CalendarGrid, ids: impl Iterator<Item = SlotId>, day: NaiveDate, decay: &DecayConfig) -> usize {
    let mut touched = 0;
    for (step, id) in ids.enumerate() {
        let Some(slot) = grid.get_mut(id) else {
            break;
        };
        if slot.date != day {
            break;
        }
        if slot.weight > decay.floor {
            slot.weight = (slot.weight * decay.factor(step + 1)).max(decay.floor);
            touched += 1;
        }
    }
    touched
}
