#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative per-case world state for Euro Diffusion.

mod grid;

use euro_diffusion_core::{
    BalanceSheet, CaseDefinition, CellCoord, Command, CountryId, Day, DisperseError, Event,
    INITIAL_BALANCE,
};

use crate::grid::{City, Grid};

/// Represents the authoritative state of one case: its countries and the
/// cities laid out on a freshly allocated grid.
#[derive(Clone, Debug)]
pub struct World {
    countries: Vec<Country>,
    grid: Grid,
    day: Option<Day>,
}

#[derive(Clone, Debug)]
struct Country {
    name: String,
    completion_day: Option<Day>,
    cities: Vec<CellCoord>,
}

impl World {
    /// Lays out every country of the case onto an empty grid.
    ///
    /// Each city starts with [`INITIAL_BALANCE`] of its owner's currency and
    /// nothing else.
    #[must_use]
    pub fn new(case: &CaseDefinition) -> Self {
        let country_count = case.country_count();
        let mut grid = Grid::empty();
        let mut countries = Vec::with_capacity(country_count);

        for (id, definition) in case.iter() {
            let mut cities = Vec::new();
            for cell in definition.territory().cells() {
                let balance = BalanceSheet::seeded(country_count, id, INITIAL_BALANCE);
                grid.place(cell, City::founded(id, balance));
                cities.push(cell);
            }
            countries.push(Country {
                name: definition.name().to_owned(),
                completion_day: None,
                cities,
            });
        }

        Self {
            countries,
            grid,
            day: None,
        }
    }

    fn country(&self, id: CountryId) -> Option<&Country> {
        self.countries.get(id.index())
    }

    fn country_mut(&mut self, id: CountryId) -> Option<&mut Country> {
        self.countries.get_mut(id.index())
    }

    fn is_complete(&self) -> bool {
        self.countries
            .iter()
            .all(|country| country.completion_day.is_some())
    }

    fn disperse(
        &mut self,
        city: CellCoord,
        share: &BalanceSheet,
        recipients: &[CellCoord],
    ) -> Result<(), DisperseError> {
        if !self.grid.is_occupied(city) {
            return Err(DisperseError::MissingCity);
        }
        if share.len() != self.countries.len() {
            return Err(DisperseError::ShapeMismatch);
        }
        let neighbors = self.grid.neighbors(city);
        if recipients
            .iter()
            .any(|recipient| !neighbors.contains(recipient))
        {
            return Err(DisperseError::InvalidRecipient);
        }

        for recipient in recipients {
            if let Some(neighbor) = self.grid.city_mut(*recipient) {
                neighbor.pending.credit(share);
            }
        }
        if let Some(sender) = self.grid.city_mut(city) {
            let times = i64::try_from(recipients.len()).unwrap_or(i64::MAX);
            sender.balance.debit(share, times);
        }
        Ok(())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::BeginDay => {
            let day = world.day.map_or(Day::new(1), Day::next);
            world.day = Some(day);
            out_events.push(Event::DayStarted { day });
        }
        Command::Disperse {
            city,
            share,
            recipients,
        } => match world.disperse(city, &share, &recipients) {
            Ok(()) => out_events.push(Event::CityDispersed {
                city,
                recipients: recipients.len(),
            }),
            Err(reason) => out_events.push(Event::DisperseRejected { city, reason }),
        },
        Command::SettleDay => {
            for city in world.grid.cities_mut() {
                city.settle();
            }
            if let Some(day) = world.day {
                out_events.push(Event::DaySettled { day });
            }
        }
        Command::MarkCityComplete { city } => {
            let Some(day) = world.day else {
                return;
            };
            if let Some(target) = world.grid.city_mut(city) {
                if !target.complete {
                    target.complete = true;
                    out_events.push(Event::CityCompleted { city, day });
                }
            }
        }
        Command::CompleteCountry { country } => {
            let Some(day) = world.day else {
                return;
            };
            let Some(record) = world.country(country) else {
                return;
            };
            if record.completion_day.is_some() {
                return;
            }
            let all_cities_complete = record
                .cities
                .iter()
                .all(|cell| world.grid.city(*cell).map_or(false, |city| city.complete));
            if !all_cities_complete {
                return;
            }

            if let Some(record) = world.country_mut(country) {
                record.completion_day = Some(day);
            }
            out_events.push(Event::CountryCompleted { country, day });

            if world.is_complete() {
                out_events.push(Event::CaseCompleted { day });
            }
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use euro_diffusion_core::{
        BalanceSheet, CaseOutcome, CellCoord, CountryId, CountryOutcome, Day,
    };

    use super::World;

    /// Day currently being simulated, or `None` before the first day begins.
    #[must_use]
    pub fn current_day(world: &World) -> Option<Day> {
        world.day
    }

    /// Reports whether every country of the case recorded a completion day.
    #[must_use]
    pub fn is_case_complete(world: &World) -> bool {
        world.is_complete()
    }

    /// Captures a read-only view of the case for systems to inspect.
    #[must_use]
    pub fn case_view(world: &World) -> CaseView<'_> {
        CaseView { world }
    }

    /// Reads the state of the city at `cell`, if one exists.
    #[must_use]
    pub fn city(world: &World, cell: CellCoord) -> Option<CityView<'_>> {
        case_view(world).city(cell)
    }

    /// Occupied orthogonal neighbours of `cell` in the fixed adjacency order.
    #[must_use]
    pub fn neighbors(world: &World, cell: CellCoord) -> Vec<CellCoord> {
        world.grid.neighbors(cell)
    }

    /// Total amount of `country`'s currency held across the grid, including
    /// transfers still pending settlement.
    #[must_use]
    pub fn total_holdings(world: &World, country: CountryId) -> i64 {
        world
            .grid
            .cities()
            .map(|city| city.balance.get(country) + city.pending.get(country))
            .sum()
    }

    /// Builds the final report once every country has completed.
    #[must_use]
    pub fn outcome(world: &World) -> Option<CaseOutcome> {
        let days_simulated = world.day?;
        let countries = world
            .countries
            .iter()
            .map(|country| {
                country.completion_day.map(|completion_day| CountryOutcome {
                    name: country.name.clone(),
                    completion_day,
                })
            })
            .collect::<Option<Vec<_>>>()?;
        Some(CaseOutcome::new(countries, days_simulated))
    }

    /// Read-only window over the countries and cities of a case.
    #[derive(Clone, Copy, Debug)]
    pub struct CaseView<'a> {
        world: &'a World,
    }

    impl<'a> CaseView<'a> {
        /// Number of countries, equal to the length of every balance sheet.
        #[must_use]
        pub fn country_count(&self) -> usize {
            self.world.countries.len()
        }

        /// Countries in declaration order.
        pub fn countries(&self) -> impl Iterator<Item = CountryView<'a>> + 'a {
            let world: &'a World = self.world;
            world
                .countries
                .iter()
                .enumerate()
                .map(|(index, country)| CountryView {
                    id: CountryId::new(index as u32),
                    name: &country.name,
                    completion_day: country.completion_day,
                    cities: &country.cities,
                })
        }

        /// Reads the state of the city at `cell`, if one exists.
        #[must_use]
        pub fn city(&self, cell: CellCoord) -> Option<CityView<'a>> {
            let world: &'a World = self.world;
            world.grid.city(cell).map(|city| CityView {
                cell,
                owner: city.owner,
                complete: city.complete,
                balance: &city.balance,
                pending: &city.pending,
            })
        }

        /// Occupied orthogonal neighbours of `cell` in the fixed adjacency order.
        #[must_use]
        pub fn neighbors(&self, cell: CellCoord) -> Vec<CellCoord> {
            self.world.grid.neighbors(cell)
        }
    }

    /// Immutable representation of a single country used for queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct CountryView<'a> {
        /// Identifier keying the country's balance-sheet entry.
        pub id: CountryId,
        /// Name of the country.
        pub name: &'a str,
        /// Completion day, once recorded.
        pub completion_day: Option<Day>,
        /// Cities owned by the country, in layout order.
        pub cities: &'a [CellCoord],
    }

    impl CountryView<'_> {
        /// Reports whether the country still awaits its completion day.
        #[must_use]
        pub fn is_pending(&self) -> bool {
            self.completion_day.is_none()
        }
    }

    /// Immutable representation of a single city used for queries.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct CityView<'a> {
        /// Grid cell occupied by the city.
        pub cell: CellCoord,
        /// Country that owns the city.
        pub owner: CountryId,
        /// Indicates whether the city already holds every currency.
        pub complete: bool,
        /// Settled per-country balance.
        pub balance: &'a BalanceSheet,
        /// Transfers received today and not yet settled.
        pub pending: &'a BalanceSheet,
    }
}
