#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Completion tracker that detects when cities and countries hold every
//! currency of their case.

use euro_diffusion_core::{Command, Event};
use euro_diffusion_world::query::CaseView;

/// Pure system that inspects settled balances and emits completion commands.
#[derive(Clone, Copy, Debug, Default)]
pub struct Completion;

impl Completion {
    /// Creates a new completion tracker.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Consumes world events and the case view to emit completion commands.
    ///
    /// Runs only after a [`Event::DaySettled`]. For every pending country the
    /// cities are walked in layout order: already complete cities are
    /// skipped, a city holding every currency is marked complete, and the
    /// first city still missing a currency ends the walk for that country.
    /// A country whose walk reaches the end (including one without cities)
    /// is completed on the current day.
    pub fn handle(&self, events: &[Event], view: CaseView<'_>, out: &mut Vec<Command>) {
        if !events
            .iter()
            .any(|event| matches!(event, Event::DaySettled { .. }))
        {
            return;
        }

        for country in view.countries().filter(|country| country.is_pending()) {
            let mut every_city_complete = true;

            for cell in country.cities {
                let Some(city) = view.city(*cell) else {
                    continue;
                };
                if city.complete {
                    continue;
                }
                if city.balance.has_every_currency() {
                    out.push(Command::MarkCityComplete { city: *cell });
                } else {
                    every_city_complete = false;
                    break;
                }
            }

            if every_city_complete {
                out.push(Command::CompleteCountry {
                    country: country.id,
                });
            }
        }
    }
}
