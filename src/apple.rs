use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::error::SimulationError;
use crate::grid::{GridSize, Position};
use crate::snake::Snake;

/// Random draws tried before falling back to scanning the free cells.
pub const MAX_SAMPLE_ATTEMPTS: usize = 64;

/// A set of cells the apple may not be placed on.
pub trait Occupancy {
    fn is_occupied(&self, position: Position) -> bool;
}

impl Occupancy for Snake {
    fn is_occupied(&self, position: Position) -> bool {
        self.occupies(position)
    }
}

impl Occupancy for HashSet<Position> {
    fn is_occupied(&self, position: Position) -> bool {
        self.contains(&position)
    }
}

impl Occupancy for [Position] {
    fn is_occupied(&self, position: Position) -> bool {
        self.contains(&position)
    }
}

/// The food item.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct Apple {
    pub position: Position,
}

impl Apple {
    #[must_use]
    pub fn new(position: Position) -> Self {
        Self { position }
    }

    /// Creates an apple on a random free cell.
    pub fn spawn<R, O>(rng: &mut R, bounds: GridSize, occupied: &O) -> Result<Self, SimulationError>
    where
        R: Rng + ?Sized,
        O: Occupancy + ?Sized,
    {
        free_position(rng, bounds, occupied).map(Self::new)
    }

    /// Moves the apple to a random free cell.
    ///
    /// On error the apple keeps its previous position.
    pub fn respawn<R, O>(
        &mut self,
        rng: &mut R,
        bounds: GridSize,
        occupied: &O,
    ) -> Result<(), SimulationError>
    where
        R: Rng + ?Sized,
        O: Occupancy + ?Sized,
    {
        self.position = free_position(rng, bounds, occupied)?;
        trace!(position = ?self.position, "apple respawned");
        Ok(())
    }
}

/// Picks a uniformly random cell inside `bounds` that is not occupied.
///
/// Draws random cells first, which is fast while the board is sparse, then
/// enumerates the remaining free cells so a crowded board still terminates.
pub fn free_position<R, O>(
    rng: &mut R,
    bounds: GridSize,
    occupied: &O,
) -> Result<Position, SimulationError>
where
    R: Rng + ?Sized,
    O: Occupancy + ?Sized,
{
    let exhausted = SimulationError::NoFreeCell {
        width: bounds.width,
        height: bounds.height,
    };
    if !bounds.is_valid() {
        return Err(exhausted);
    }

    for _ in 0..MAX_SAMPLE_ATTEMPTS {
        let candidate = Position {
            x: rng.gen_range(0..i32::from(bounds.width)),
            y: rng.gen_range(0..i32::from(bounds.height)),
        };
        if !occupied.is_occupied(candidate) {
            return Ok(candidate);
        }
    }

    let candidates: Vec<Position> = bounds
        .cells()
        .filter(|cell| !occupied.is_occupied(*cell))
        .collect();

    if candidates.is_empty() {
        warn!(
            width = bounds.width,
            height = bounds.height,
            "no free cell left for the apple"
        );
        return Err(exhausted);
    }

    Ok(candidates[rng.gen_range(0..candidates.len())])
}
