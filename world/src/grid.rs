//! Dense storage for the cities laid out on the fixed grid.

use euro_diffusion_core::{BalanceSheet, CellCoord, CountryId, GRID_SIZE};

/// Single city occupying one grid slot.
#[derive(Clone, Debug)]
pub(crate) struct City {
    pub(crate) owner: CountryId,
    pub(crate) complete: bool,
    pub(crate) balance: BalanceSheet,
    pub(crate) pending: BalanceSheet,
}

impl City {
    pub(crate) fn founded(owner: CountryId, balance: BalanceSheet) -> Self {
        let pending = BalanceSheet::zeroed(balance.len());
        Self {
            owner,
            complete: false,
            balance,
            pending,
        }
    }

    /// Folds the day's pending transfers into the live balance.
    pub(crate) fn settle(&mut self) {
        let Self {
            balance, pending, ..
        } = self;
        balance.settle_from(pending);
    }
}

/// Row-major array of optional city slots.
#[derive(Clone, Debug)]
pub(crate) struct Grid {
    slots: Vec<Option<City>>,
}

impl Grid {
    pub(crate) fn empty() -> Self {
        let capacity = usize::try_from(GRID_SIZE * GRID_SIZE).unwrap_or(0);
        Self {
            slots: vec![None; capacity],
        }
    }

    pub(crate) fn city(&self, cell: CellCoord) -> Option<&City> {
        cell.grid_index()
            .and_then(|index| self.slots.get(index))
            .and_then(Option::as_ref)
    }

    pub(crate) fn city_mut(&mut self, cell: CellCoord) -> Option<&mut City> {
        cell.grid_index()
            .and_then(|index| self.slots.get_mut(index))
            .and_then(Option::as_mut)
    }

    pub(crate) fn is_occupied(&self, cell: CellCoord) -> bool {
        self.city(cell).is_some()
    }

    pub(crate) fn place(&mut self, cell: CellCoord, city: City) {
        if let Some(slot) = cell.grid_index().and_then(|index| self.slots.get_mut(index)) {
            *slot = Some(city);
        }
    }

    /// Occupied orthogonal neighbours of `cell`, in the fixed adjacency order.
    pub(crate) fn neighbors(&self, cell: CellCoord) -> Vec<CellCoord> {
        cell.adjacent()
            .filter(|candidate| self.is_occupied(*candidate))
            .collect()
    }

    pub(crate) fn cities(&self) -> impl Iterator<Item = &City> {
        self.slots.iter().flatten()
    }

    pub(crate) fn cities_mut(&mut self) -> impl Iterator<Item = &mut City> {
        self.slots.iter_mut().flatten()
    }
}
