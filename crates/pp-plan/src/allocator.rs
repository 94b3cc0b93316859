// allocator.rs: Point assignment for scheduled task occurrences.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// Inclusive range of points an occurrence can be worth.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PointRange {
    #[serde(default = "default_min")]
    pub min: u32,
    #[serde(default = "default_max")]
    pub max: u32,
}

fn default_min() -> u32 {
    1
}

fn default_max() -> u32 {
    5
}

impl Default for PointRange {
    fn default() -> Self {
        Self {
            min: default_min(),
            max: default_max(),
        }
    }
}

impl PointRange {
    pub fn new(min: u32, max: u32) -> Result<Self, PlanError> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        if self.min > self.max {
            return Err(PlanError::InvalidInput(format!(
                "point range is empty: min {} > max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }

    pub fn contains(&self, points: u32) -> bool {
        (self.min..=self.max).contains(&points)
    }
}

/// Decides how many points one scheduled occurrence is worth.
///
/// The random source is passed in so callers control seeding.
pub trait PointAllocator: Send + Sync {
    fn allocate(&self, rng: &mut dyn RngCore) -> u32;

    /// Bounds of every value `allocate` can return.
    fn range(&self) -> PointRange;
}

/// Draws uniformly from an inclusive range.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformPoints {
    range: PointRange,
}

impl UniformPoints {
    pub fn new(range: PointRange) -> Result<Self, PlanError> {
        range.validate()?;
        Ok(Self { range })
    }
}

impl PointAllocator for UniformPoints {
    fn allocate(&self, rng: &mut dyn RngCore) -> u32 {
        rng.gen_range(self.range.min..=self.range.max)
    }

    fn range(&self) -> PointRange {
        self.range
    }
}

/// Always awards the same value.
#[derive(Debug, Clone, Copy)]
pub struct FixedPoints(pub u32);

impl PointAllocator for FixedPoints {
    fn allocate(&self, _rng: &mut dyn RngCore) -> u32 {
        self.0
    }

    fn range(&self) -> PointRange {
        PointRange {
            min: self.0,
            max: self.0,
        }
    }
}
