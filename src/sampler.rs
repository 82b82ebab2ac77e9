//! Roulette-wheel selection of a slot by weight.

use crate::calendar::CalendarGrid;
use crate::data::SlotId;
use log::warn;
use rand::Rng;

/// Returned when no slot carries any weight.
pub const FALLBACK_SLOT: SlotId = 0;

/// Sum of all usable weights. NaN weights are ignored.
pub fn total_weight(grid: &CalendarGrid) -> f64 {
    grid.slots()
        .iter()
        .map(|s| s.weight)
        .filter(|w| !w.is_nan())
        .sum()
}

/// Draws a slot id with probability proportional to its weight.
///
/// Falls back to [`FALLBACK_SLOT`] when the total weight is zero or the
/// walk runs off the end; callers treat that slot like any other target and
/// the placement engine ignores it if it is already taken.
pub fn sample_slot<R: Rng + ?Sized>(grid: &CalendarGrid, rng: &mut R) -> SlotId {
    let total = total_weight(grid);
    if !(total > 0.0 && total.is_finite()) {
        warn!("No slot weight left to sample from (total = {}), falling back to slot {}", total, FALLBACK_SLOT);
        return FALLBACK_SLOT;
    }

    let target = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    for slot in grid.slots() {
        if slot.weight.is_nan() {
            warn!("Skipping slot {} with NaN weight ({})", slot.id, slot.date_time);
            continue;
        }
        cumulative += slot.weight;
        if target < cumulative {
            return slot.id;
        }
    }

    warn!("Sampling walk fell through at cumulative weight {}, falling back to slot {}", cumulative, FALLBACK_SLOT);
    FALLBACK_SLOT
}
