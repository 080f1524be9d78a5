//! Spike detection over a node's rolling window
//!
//! A reading is a spike when it is strictly greater than the rolling
//! average times the configured multiplier. Equality never fires.
//!
//! The average a new reading is judged against is its *baseline*: the mean
//! of the other readings in the (already trimmed) window. A baseline exists
//! only once the window holds at least two valid entries, so the first
//! reading a node ever sees can't fire against itself.

use rust_decimal::Decimal;

use crate::space::window::WindowEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpikeEvaluation {
    /// Not enough history for an average
    NoBaseline,
    Normal { average: Decimal },
    Spike { average: Decimal },
}

#[derive(Debug, Clone, Copy)]
pub struct SpikeDetector {
    multiplier: Decimal,
}

impl SpikeDetector {
    pub fn new(multiplier: Decimal) -> Self {
        Self { multiplier }
    }

    pub fn multiplier(&self) -> Decimal {
        self.multiplier
    }

    /// Unweighted mean of the window, or `None` for fewer than two entries
    pub fn rolling_average(window: &[WindowEntry]) -> Option<Decimal> {
        if window.len() < 2 {
            return None;
        }
        mean(window.iter())
    }

    /// Mean of the window without `current`, provided the window (with
    /// `current`) holds at least two entries
    pub fn baseline(window: &[WindowEntry], current: &WindowEntry) -> Option<Decimal> {
        if window.len() < 2 {
            return None;
        }
        let skip = window.iter().position(|entry| entry == current);
        mean(
            window
                .iter()
                .enumerate()
                .filter(|(i, _)| Some(*i) != skip)
                .map(|(_, entry)| entry),
        )
    }

    /// A threshold too large to represent can't be exceeded
    pub fn exceeds(&self, price: Decimal, average: Decimal) -> bool {
        average
            .checked_mul(self.multiplier)
            .is_some_and(|threshold| price > threshold)
    }

    pub fn evaluate(&self, window: &[WindowEntry], current: &WindowEntry) -> SpikeEvaluation {
        match Self::baseline(window, current) {
            None => SpikeEvaluation::NoBaseline,
            Some(average) if self.exceeds(current.price_mwh, average) => {
                SpikeEvaluation::Spike { average }
            }
            Some(average) => SpikeEvaluation::Normal { average },
        }
    }
}

/// Entries that would overflow the running sum are left out of both the
/// sum and the count
fn mean<'a>(entries: impl Iterator<Item = &'a WindowEntry>) -> Option<Decimal> {
    let (sum, count) = entries.fold((Decimal::ZERO, 0u32), |(sum, count), entry| {
        match sum.checked_add(entry.price_mwh) {
            Some(sum) => (sum, count + 1),
            None => (sum, count),
        }
    });
    if count == 0 {
        return None;
    }
    Some(sum / Decimal::from(count))
}
