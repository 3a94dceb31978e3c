#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Euro Diffusion engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters hand validated
//! [`CaseDefinition`] values to the simulation, the world executes
//! [`Command`] values via its `apply` entry point and broadcasts [`Event`]
//! values describing the resulting state changes. Systems read immutable
//! views and respond exclusively with new command batches.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of rows and columns in the fixed city grid.
pub const GRID_SIZE: u32 = 10;

/// Amount of its own currency every city holds when a case begins.
pub const INITIAL_BALANCE: i64 = 1_000_000;

/// Divisor applied to a balance to obtain the share sent to each neighbour.
pub const TRANSFER_DIVISOR: i64 = 1_000;

/// Longest country name accepted, measured in characters.
pub const MAX_NAME_LENGTH: usize = 25;

/// Location of a single grid cell expressed as row and column indices.
///
/// The row index is the first grid index and is derived from a territory's
/// Y bounds; the column index is derived from its X bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    row: u32,
    column: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Reports whether the coordinate lies inside the fixed grid.
    #[must_use]
    pub const fn in_bounds(&self) -> bool {
        self.row < GRID_SIZE && self.column < GRID_SIZE
    }

    /// Row-major slot index of the cell, if it lies inside the grid.
    #[must_use]
    pub fn grid_index(&self) -> Option<usize> {
        if !self.in_bounds() {
            return None;
        }
        let row = usize::try_from(self.row).ok()?;
        let column = usize::try_from(self.column).ok()?;
        let width = usize::try_from(GRID_SIZE).ok()?;
        Some(row * width + column)
    }

    /// In-bounds orthogonal neighbours, in the fixed order
    /// `(row + 1)`, `(row - 1)`, `(column - 1)`, `(column + 1)`.
    ///
    /// Occupancy is not considered here; the world filters the candidates
    /// down to cells that hold a city.
    pub fn adjacent(self) -> impl Iterator<Item = CellCoord> {
        let candidates = [
            self.row.checked_add(1).map(|row| Self::new(row, self.column)),
            self.row.checked_sub(1).map(|row| Self::new(row, self.column)),
            self.column
                .checked_sub(1)
                .map(|column| Self::new(self.row, column)),
            self.column
                .checked_add(1)
                .map(|column| Self::new(self.row, column)),
        ];
        candidates
            .into_iter()
            .flatten()
            .filter(|cell| cell.in_bounds())
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}][{}]", self.row, self.column)
    }
}

/// Identifier of a country within its case, equal to its declaration index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CountryId(u32);

impl CountryId {
    /// Creates a new country identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Position of the country inside balance sheets and country lists.
    #[must_use]
    pub fn index(&self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

/// One-based count of diffusion rounds executed within a case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Day(u32);

impl Day {
    /// Creates a day marker from its one-based index.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the one-based day index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the day that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rectangular territory expressed with one-based inclusive input bounds.
///
/// A territory covers columns `lower_x - 1 .. upper_x` and rows
/// `lower_y - 1 .. upper_y` on the zero-based grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Territory {
    lower_x: u32,
    lower_y: u32,
    upper_x: u32,
    upper_y: u32,
}

impl Territory {
    /// Creates a territory from raw input bounds.
    #[must_use]
    pub const fn new(lower_x: u32, lower_y: u32, upper_x: u32, upper_y: u32) -> Self {
        Self {
            lower_x,
            lower_y,
            upper_x,
            upper_y,
        }
    }

    /// Lower X bound as written in the input.
    #[must_use]
    pub const fn lower_x(&self) -> u32 {
        self.lower_x
    }

    /// Lower Y bound as written in the input.
    #[must_use]
    pub const fn lower_y(&self) -> u32 {
        self.lower_y
    }

    /// Upper X bound as written in the input.
    #[must_use]
    pub const fn upper_x(&self) -> u32 {
        self.upper_x
    }

    /// Upper Y bound as written in the input.
    #[must_use]
    pub const fn upper_y(&self) -> u32 {
        self.upper_y
    }

    /// Reports whether the territory covers no cell at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let (columns, rows) = self.ranges();
        columns.is_empty() || rows.is_empty()
    }

    /// Reports whether every covered cell lies inside the fixed grid.
    ///
    /// Empty territories always fit.
    #[must_use]
    pub fn fits_grid(&self) -> bool {
        if self.is_empty() {
            return true;
        }
        let (columns, rows) = self.ranges();
        let limit = i64::from(GRID_SIZE);
        columns.start >= 0 && rows.start >= 0 && columns.end <= limit && rows.end <= limit
    }

    /// Covered cells in layout order: columns in the outer loop, rows inner.
    ///
    /// Cells outside the grid are skipped, so only territories that
    /// [`fit the grid`](Self::fits_grid) yield their full footprint.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let (columns, rows) = self.ranges();
        columns
            .flat_map(move |column| rows.clone().map(move |row| (row, column)))
            .filter_map(|(row, column)| {
                let row = u32::try_from(row).ok()?;
                let column = u32::try_from(column).ok()?;
                let cell = CellCoord::new(row, column);
                cell.in_bounds().then_some(cell)
            })
    }

    fn ranges(&self) -> (std::ops::Range<i64>, std::ops::Range<i64>) {
        let columns = i64::from(self.lower_x) - 1..i64::from(self.upper_x);
        let rows = i64::from(self.lower_y) - 1..i64::from(self.upper_y);
        (columns, rows)
    }
}

/// Reasons a country or case definition may be rejected.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DefinitionError {
    /// The name was empty or longer than [`MAX_NAME_LENGTH`] characters.
    #[error("erroneous country name `{name}`")]
    InvalidName {
        /// Offending name.
        name: String,
    },
    /// The territory covers cells outside the fixed grid.
    #[error("territory of `{name}` extends beyond the {GRID_SIZE}x{GRID_SIZE} grid")]
    TerritoryOutsideGrid {
        /// Country whose territory was rejected.
        name: String,
    },
    /// Two countries of the same case share a name.
    #[error("country name `{name}` is declared more than once")]
    DuplicateName {
        /// Repeated name.
        name: String,
    },
    /// Two territories of the same case cover a common cell.
    #[error("territories of `{first}` and `{second}` overlap at {cell}")]
    OverlappingTerritories {
        /// Country declared first.
        first: String,
        /// Country declared later.
        second: String,
        /// First shared cell in layout order.
        cell: CellCoord,
    },
}

/// Validated description of a single country taking part in a case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountryDefinition {
    name: String,
    territory: Territory,
}

impl CountryDefinition {
    /// Validates the name and territory of a country.
    pub fn new(name: impl Into<String>, territory: Territory) -> Result<Self, DefinitionError> {
        let name = name.into();
        if !is_valid_name(&name) {
            return Err(DefinitionError::InvalidName { name });
        }
        if !territory.fits_grid() {
            return Err(DefinitionError::TerritoryOutsideGrid { name });
        }
        Ok(Self { name, territory })
    }

    /// Name that identifies the country within its case.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Territory covered by the country's cities.
    #[must_use]
    pub const fn territory(&self) -> Territory {
        self.territory
    }
}

/// Reports whether a country name is non-empty and short enough.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().count() <= MAX_NAME_LENGTH
}

/// Validated, ordered list of countries forming one independent case.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CaseDefinition {
    countries: Vec<CountryDefinition>,
}

impl CaseDefinition {
    /// Builds a case, rejecting repeated names and overlapping territories.
    pub fn new(countries: Vec<CountryDefinition>) -> Result<Self, DefinitionError> {
        let mut owners: Vec<Option<usize>> = vec![None; (GRID_SIZE * GRID_SIZE) as usize];
        for (index, country) in countries.iter().enumerate() {
            if countries[..index]
                .iter()
                .any(|earlier| earlier.name == country.name)
            {
                return Err(DefinitionError::DuplicateName {
                    name: country.name.clone(),
                });
            }

            for cell in country.territory.cells() {
                let Some(slot) = cell.grid_index().and_then(|slot| owners.get_mut(slot)) else {
                    continue;
                };
                if let Some(first) = *slot {
                    return Err(DefinitionError::OverlappingTerritories {
                        first: countries[first].name.clone(),
                        second: country.name.clone(),
                        cell,
                    });
                }
                *slot = Some(index);
            }
        }
        Ok(Self { countries })
    }

    /// Countries in declaration order.
    #[must_use]
    pub fn countries(&self) -> &[CountryDefinition] {
        &self.countries
    }

    /// Number of countries taking part in the case.
    #[must_use]
    pub fn country_count(&self) -> usize {
        self.countries.len()
    }

    /// Pairs every country with the identifier used to key balance sheets.
    pub fn iter(&self) -> impl Iterator<Item = (CountryId, &CountryDefinition)> {
        self.countries
            .iter()
            .enumerate()
            .map(|(index, country)| (CountryId::new(index as u32), country))
    }
}

/// Computes the share of `balance` sent to each neighbour in one day.
///
/// Uses floor division, so negative balances round toward negative infinity.
#[must_use]
pub const fn transfer_share(balance: i64) -> i64 {
    balance.div_euclid(TRANSFER_DIVISOR)
}

/// Dense per-country amounts, indexed by [`CountryId`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BalanceSheet {
    amounts: Vec<i64>,
}

impl BalanceSheet {
    /// Creates a sheet holding zero for each of `countries` entries.
    #[must_use]
    pub fn zeroed(countries: usize) -> Self {
        Self {
            amounts: vec![0; countries],
        }
    }

    /// Creates a zeroed sheet and credits `amount` to `owner`.
    #[must_use]
    pub fn seeded(countries: usize, owner: CountryId, amount: i64) -> Self {
        let mut sheet = Self::zeroed(countries);
        if let Some(slot) = sheet.amounts.get_mut(owner.index()) {
            *slot = amount;
        }
        sheet
    }

    /// Wraps explicit amounts listed in country order.
    #[must_use]
    pub fn from_amounts(amounts: Vec<i64>) -> Self {
        Self { amounts }
    }

    /// Amount held for `country`, or zero for unknown identifiers.
    #[must_use]
    pub fn get(&self, country: CountryId) -> i64 {
        self.amounts.get(country.index()).copied().unwrap_or(0)
    }

    /// Amounts in country order.
    #[must_use]
    pub fn amounts(&self) -> &[i64] {
        &self.amounts
    }

    /// Number of entries, equal to the number of countries in the case.
    #[must_use]
    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    /// Reports whether the sheet tracks no country at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    /// Reports whether every entry differs from zero.
    ///
    /// Negative amounts count as held currency.
    #[must_use]
    pub fn has_every_currency(&self) -> bool {
        self.amounts.iter().all(|amount| *amount != 0)
    }

    /// Reports whether every entry equals zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amounts.iter().all(|amount| *amount == 0)
    }

    /// Per-country share that leaves this sheet for each neighbour in a day.
    #[must_use]
    pub fn transfer_shares(&self) -> Self {
        Self {
            amounts: self.amounts.iter().map(|amount| transfer_share(*amount)).collect(),
        }
    }

    /// Adds `other` entry-wise.
    pub fn credit(&mut self, other: &Self) {
        for (amount, delta) in self.amounts.iter_mut().zip(&other.amounts) {
            *amount += delta;
        }
    }

    /// Subtracts `other` multiplied by `times` entry-wise.
    pub fn debit(&mut self, other: &Self, times: i64) {
        for (amount, delta) in self.amounts.iter_mut().zip(&other.amounts) {
            *amount -= delta * times;
        }
    }

    /// Moves every pending amount of `pending` into this sheet and zeroes it.
    pub fn settle_from(&mut self, pending: &mut Self) {
        for (amount, delta) in self.amounts.iter_mut().zip(pending.amounts.iter_mut()) {
            *amount += *delta;
            *delta = 0;
        }
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Advances the world clock to the next day.
    BeginDay,
    /// Phase 1 transfer: removes `share` once per recipient from the city's
    /// balance and queues `share` in each recipient's day-balance.
    Disperse {
        /// City sending currency to its neighbours.
        city: CellCoord,
        /// Amount sent to each recipient, per country.
        share: BalanceSheet,
        /// Occupied neighbours receiving the share.
        recipients: Vec<CellCoord>,
    },
    /// Phase 2: folds every pending day-balance into the live balance.
    SettleDay,
    /// Flags a city as holding every currency of the case.
    MarkCityComplete {
        /// City that reached completion.
        city: CellCoord,
    },
    /// Records the current day as the completion day of a country.
    CompleteCountry {
        /// Country whose cities are all complete.
        country: CountryId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that a new diffusion day began.
    DayStarted {
        /// Day that became current.
        day: Day,
    },
    /// Confirms that a city queued transfers for its neighbours.
    CityDispersed {
        /// City that sent currency.
        city: CellCoord,
        /// Number of neighbours that received a share.
        recipients: usize,
    },
    /// Reports that a transfer request could not be honoured.
    DisperseRejected {
        /// Cell named by the rejected command.
        city: CellCoord,
        /// Specific reason the transfer failed.
        reason: DisperseError,
    },
    /// Confirms that all pending day-balances were settled.
    DaySettled {
        /// Day whose transfers were applied.
        day: Day,
    },
    /// Confirms that a city became complete.
    CityCompleted {
        /// City that reached completion.
        city: CellCoord,
        /// Day on which completion was observed.
        day: Day,
    },
    /// Confirms that a country became complete.
    CountryCompleted {
        /// Country that reached completion.
        country: CountryId,
        /// Day recorded as its completion day.
        day: Day,
    },
    /// Announces that every country of the case is complete.
    CaseCompleted {
        /// Day on which the last country completed.
        day: Day,
    },
}

/// Reasons a disperse request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DisperseError {
    /// No city occupies the sending cell.
    MissingCity,
    /// The share does not carry one entry per country of the case.
    ShapeMismatch,
    /// A recipient is not an occupied orthogonal neighbour of the sender.
    InvalidRecipient,
}

/// Final completion day of one country.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryOutcome {
    /// Name of the country.
    pub name: String,
    /// Day on which every city of the country became complete.
    pub completion_day: Day,
}

/// Result of simulating one case to completion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseOutcome {
    countries: Vec<CountryOutcome>,
    days_simulated: Day,
}

impl CaseOutcome {
    /// Creates an outcome from per-country results in declaration order.
    #[must_use]
    pub fn new(countries: Vec<CountryOutcome>, days_simulated: Day) -> Self {
        Self {
            countries,
            days_simulated,
        }
    }

    /// Per-country results in declaration order.
    #[must_use]
    pub fn countries(&self) -> &[CountryOutcome] {
        &self.countries
    }

    /// Number of diffusion rounds executed before the case completed.
    #[must_use]
    pub const fn days_simulated(&self) -> Day {
        self.days_simulated
    }

    /// Results ordered by ascending completion day, ties broken by name.
    #[must_use]
    pub fn by_completion_day(&self) -> Vec<&CountryOutcome> {
        let mut ordered: Vec<&CountryOutcome> = self.countries.iter().collect();
        ordered.sort_by(|left, right| {
            left.completion_day
                .cmp(&right.completion_day)
                .then_with(|| left.name.cmp(&right.name))
        });
        ordered
    }

    /// Results ordered alphabetically by country name.
    #[must_use]
    pub fn by_name(&self) -> Vec<&CountryOutcome> {
        let mut ordered: Vec<&CountryOutcome> = self.countries.iter().collect();
        ordered.sort_by(|left, right| left.name.cmp(&right.name));
        ordered
    }
}
