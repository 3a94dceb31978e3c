#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure diffusion system that plans each day's currency transfers.
//!
//! Transfers are planned against the settled balances visible at the start
//! of the day and queued into recipients' pending accumulators by the
//! world, so the order in which cities are visited never changes the
//! outcome.

use euro_diffusion_core::{Command, Event};
use euro_diffusion_world::query::CaseView;

/// Selects which cities send currency to their neighbours each day.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DiffusionScope {
    /// Every city disperses, whether or not its country already completed.
    #[default]
    AllCities,
    /// Only cities of countries still awaiting completion disperse.
    /// Completed countries keep receiving transfers from their neighbours.
    PendingCountries,
}

/// Pure system that turns a day-start view into transfer commands.
#[derive(Clone, Copy, Debug, Default)]
pub struct Diffusion {
    scope: DiffusionScope,
}

impl Diffusion {
    /// Creates a diffusion system dispersing cities selected by `scope`.
    #[must_use]
    pub const fn new(scope: DiffusionScope) -> Self {
        Self { scope }
    }

    /// Scope the system was configured with.
    #[must_use]
    pub const fn scope(&self) -> DiffusionScope {
        self.scope
    }

    /// Consumes world events and the case view to emit one day's transfers.
    ///
    /// Nothing is emitted unless a [`Event::DayStarted`] is observed. The
    /// batch holds one [`Command::Disperse`] per city with something to
    /// send, in country-then-city order, followed by a single
    /// [`Command::SettleDay`].
    pub fn handle(&self, events: &[Event], view: CaseView<'_>, out: &mut Vec<Command>) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::DayStarted { .. }))
        {
            return;
        }

        for country in view.countries() {
            if self.scope == DiffusionScope::PendingCountries && !country.is_pending() {
                continue;
            }

            for cell in country.cities {
                let Some(city) = view.city(*cell) else {
                    continue;
                };
                let recipients = view.neighbors(*cell);
                let share = city.balance.transfer_shares();
                if recipients.is_empty() || share.is_zero() {
                    continue;
                }
                out.push(Command::Disperse {
                    city: *cell,
                    share,
                    recipients,
                });
            }
        }

        out.push(Command::SettleDay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_all_cities() {
        assert_eq!(Diffusion::default().scope(), DiffusionScope::AllCities);
    }
}
