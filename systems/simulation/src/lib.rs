#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Day loop that drives one case from layout to completion.
//!
//! Each day the world clock advances, the diffusion system plans and the
//! world applies the day's transfers followed by settlement, and finally the
//! completion tracker records newly complete cities and countries. Every
//! case runs on its own freshly laid out [`World`].

use euro_diffusion_core::{CaseDefinition, CaseOutcome, Command, Event};
use euro_diffusion_system_completion::Completion;
use euro_diffusion_system_diffusion::Diffusion;
pub use euro_diffusion_system_diffusion::DiffusionScope;
use euro_diffusion_world::{self as world, query, World};
use log::{debug, info, trace, warn};
use thiserror::Error;

/// Configuration parameters required to construct the simulation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Config {
    scope: DiffusionScope,
    max_days: Option<u32>,
}

impl Config {
    /// Creates a configuration with an explicit scope and optional day cap.
    #[must_use]
    pub const fn new(scope: DiffusionScope, max_days: Option<u32>) -> Self {
        Self { scope, max_days }
    }

    /// Returns a copy using the provided diffusion scope.
    #[must_use]
    pub const fn with_scope(self, scope: DiffusionScope) -> Self {
        Self { scope, ..self }
    }

    /// Returns a copy that gives up after `max_days` days.
    #[must_use]
    pub const fn with_max_days(self, max_days: u32) -> Self {
        Self {
            max_days: Some(max_days),
            ..self
        }
    }

    /// Cities that disperse currency each day.
    #[must_use]
    pub const fn scope(&self) -> DiffusionScope {
        self.scope
    }

    /// Day cap, if any. `None` runs until every country completes.
    #[must_use]
    pub const fn max_days(&self) -> Option<u32> {
        self.max_days
    }
}

/// Failures that abort the simulation of a case.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// The configured day cap elapsed before every country completed.
    #[error("case did not complete within {limit} days; still pending: {}", .pending.join(", "))]
    DayLimitExceeded {
        /// Configured day cap.
        limit: u32,
        /// Countries without a completion day, in declaration order.
        pending: Vec<String>,
    },
}

/// Runs cases to completion using the diffusion and completion systems.
#[derive(Clone, Copy, Debug, Default)]
pub struct Simulation {
    config: Config,
    diffusion: Diffusion,
    completion: Completion,
}

impl Simulation {
    /// Creates a simulation using the supplied configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            config,
            diffusion: Diffusion::new(config.scope()),
            completion: Completion::new(),
        }
    }

    /// Simulates `case` day by day until every country records its
    /// completion day.
    pub fn run(&self, case: &CaseDefinition) -> Result<CaseOutcome, SimulationError> {
        let mut world = World::new(case);
        info!("simulating case with {} countries", case.country_count());

        loop {
            let _ = self.step_day(&mut world);

            if let Some(outcome) = query::outcome(&world) {
                info!(
                    "case completed after {} days",
                    outcome.days_simulated().get()
                );
                return Ok(outcome);
            }

            if let Some(limit) = self.config.max_days {
                let elapsed = query::current_day(&world).map_or(0, |day| day.get());
                if elapsed >= limit {
                    let pending = query::case_view(&world)
                        .countries()
                        .filter(|country| country.is_pending())
                        .map(|country| country.name.to_owned())
                        .collect();
                    return Err(SimulationError::DayLimitExceeded { limit, pending });
                }
            }
        }
    }

    /// Executes one full day on `world` and returns every event it produced.
    pub fn step_day(&self, world: &mut World) -> Vec<Event> {
        let mut journal = Vec::new();

        let mut events = Vec::new();
        world::apply(world, Command::BeginDay, &mut events);

        let mut commands = Vec::new();
        self.diffusion
            .handle(&events, query::case_view(world), &mut commands);
        journal.append(&mut events);
        dispatch(world, commands, &mut events);

        let mut commands = Vec::new();
        self.completion
            .handle(&events, query::case_view(world), &mut commands);
        journal.append(&mut events);
        dispatch(world, commands, &mut events);
        journal.append(&mut events);

        report(&journal);
        journal
    }
}

fn dispatch(world: &mut World, commands: Vec<Command>, out_events: &mut Vec<Event>) {
    for command in commands {
        world::apply(world, command, out_events);
    }
}

fn report(events: &[Event]) {
    for event in events {
        match event {
            Event::DaySettled { day } => trace!("day {day} settled"),
            Event::CountryCompleted { country, day } => {
                debug!("country #{} completed on day {day}", country.get());
            }
            Event::DisperseRejected { city, reason } => {
                warn!("transfer from {city} rejected: {reason:?}");
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builders_override_defaults() {
        let config = Config::default()
            .with_scope(DiffusionScope::PendingCountries)
            .with_max_days(7);
        assert_eq!(config.scope(), DiffusionScope::PendingCountries);
        assert_eq!(config.max_days(), Some(7));
        assert_eq!(Config::default().max_days(), None);
    }

    #[test]
    fn simulation_passes_scope_to_diffusion() {
        let simulation =
            Simulation::new(Config::default().with_scope(DiffusionScope::PendingCountries));
        assert_eq!(
            simulation.diffusion.scope(),
            DiffusionScope::PendingCountries
        );
    }
}
