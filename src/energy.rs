//! Energy source — where admission control reads available energy
//!
//! The scheduler only *reads* the level. It never debits anything after
//! a task runs; depletion belongs to whatever implements the source (a
//! battery monitor, or a task that shares a `Cell<Energy>` and drains it).

use core::cell::Cell;

use crate::task::Energy;

/// Anything that can report the energy available right now
pub trait EnergySource {
    fn available(&self) -> Energy;
}

/// Fixed level, handy for tests and bench setups
impl EnergySource for Energy {
    fn available(&self) -> Energy {
        *self
    }
}

/// Shared level that tasks may update through an `Rc`
impl EnergySource for Cell<Energy> {
    fn available(&self) -> Energy {
        self.get()
    }
}

impl<E: EnergySource + ?Sized> EnergySource for &E {
    fn available(&self) -> Energy {
        (**self).available()
    }
}

impl<E: EnergySource + ?Sized> EnergySource for alloc::rc::Rc<E> {
    fn available(&self) -> Energy {
        (**self).available()
    }
}

/// Software battery gauge
///
/// Stand-in for a real fuel gauge: the driving loop charges it from
/// harvest readings and drains it by what tasks cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Battery {
    level: Energy,
    capacity: Energy,
}

impl Battery {
    /// Placeholder level when no real reading is available
    pub const DEFAULT_LEVEL: Energy = 30_000;

    /// Battery at `level`, capacity = `Energy::MAX`
    pub const fn new(level: Energy) -> Self {
        Self { level, capacity: Energy::MAX }
    }

    /// Battery with a ceiling; `level` is clamped to it
    pub const fn with_capacity(level: Energy, capacity: Energy) -> Self {
        let level = if level > capacity { capacity } else { level };
        Self { level, capacity }
    }

    pub fn level(&self) -> Energy {
        self.level
    }

    pub fn capacity(&self) -> Energy {
        self.capacity
    }

    /// Overwrite the level from a fresh reading
    pub fn set_level(&mut self, level: Energy) {
        self.level = level.min(self.capacity);
    }

    /// Add harvested energy, saturating at capacity
    pub fn charge(&mut self, amount: Energy) {
        self.level = self.level.saturating_add(amount).min(self.capacity);
    }

    /// Remove spent energy, saturating at zero
    pub fn drain(&mut self, amount: Energy) {
        self.level = self.level.saturating_sub(amount);
    }

    /// Fraction of capacity, 0.0..=1.0
    pub fn state_of_charge(&self) -> f32 {
        if self.capacity == 0 {
            0.0
        } else {
            self.level as f32 / self.capacity as f32
        }
    }
}

impl Default for Battery {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LEVEL)
    }
}

impl EnergySource for Battery {
    fn available(&self) -> Energy {
        self.level
    }
}
