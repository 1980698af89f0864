use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info};

use crate::apple::Apple;
use crate::config::SimulationConfig;
use crate::error::SimulationError;
use crate::grid::{GridSize, Position};
use crate::input::Direction;
use crate::snake::{Snake, StepOutcome};

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct TickOutcome {
    pub step: StepOutcome,
    /// The head landed on the apple and the snake will grow.
    pub ate: bool,
}

impl TickOutcome {
    #[must_use]
    pub fn collided(self) -> bool {
        self.step == StepOutcome::Collided
    }
}

/// Read-only view of everything a renderer needs.
#[derive(Debug, Clone, Copy)]
pub struct SimulationState<'a> {
    pub bounds: GridSize,
    pub snake: &'a Snake,
    pub apple: Apple,
    pub tick_count: u64,
    pub resets: u64,
}

impl SimulationState<'_> {
    /// Iterates over body segments from head to tail.
    pub fn body(&self) -> impl Iterator<Item = Position> + '_ {
        self.snake.segments().copied()
    }

    /// Owned copy of this view.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            bounds: self.bounds,
            body: self.body().collect(),
            direction: self.snake.direction(),
            apple: self.apple.position,
            tick_count: self.tick_count,
            resets: self.resets,
        }
    }
}

/// Serializable copy of a [`SimulationState`].
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Snapshot {
    pub bounds: GridSize,
    pub body: Vec<Position>,
    pub direction: Direction,
    pub apple: Position,
    pub tick_count: u64,
    pub resets: u64,
}

/// Owns the snake, the apple and the random source, and sequences each tick.
#[derive(Debug, Clone)]
pub struct Simulation {
    snake: Snake,
    apple: Apple,
    bounds: GridSize,
    rng: StdRng,
    tick_count: u64,
    resets: u64,
}

impl Simulation {
    /// Creates a simulation seeded from the operating system.
    pub fn new(config: &SimulationConfig) -> Result<Self, SimulationError> {
        Self::with_rng(config.grid, StdRng::from_entropy())
    }

    /// Creates a deterministic simulation for tests and reproducible runs.
    pub fn new_with_seed(config: &SimulationConfig, seed: u64) -> Result<Self, SimulationError> {
        Self::with_rng(config.grid, StdRng::seed_from_u64(seed))
    }

    /// Creates a simulation from an explicit snake and apple.
    ///
    /// Every segment and the apple must lie on the grid, and the apple must
    /// not overlap the snake.
    pub fn from_parts(
        config: &SimulationConfig,
        snake: Snake,
        apple: Apple,
        seed: u64,
    ) -> Result<Self, SimulationError> {
        let bounds = validate_bounds(config.grid)?;

        if let Some(stray) = snake
            .segments()
            .find(|segment| !segment.is_within_bounds(bounds))
        {
            return Err(SimulationError::InvalidPlacement(*stray));
        }
        if !apple.position.is_within_bounds(bounds) || snake.occupies(apple.position) {
            return Err(SimulationError::InvalidPlacement(apple.position));
        }

        Ok(Self {
            snake,
            apple,
            bounds,
            rng: StdRng::seed_from_u64(seed),
            tick_count: 0,
            resets: 0,
        })
    }

    fn with_rng(bounds: GridSize, mut rng: StdRng) -> Result<Self, SimulationError> {
        let bounds = validate_bounds(bounds)?;
        let snake = Snake::new(bounds.center(), Direction::Right);
        let apple = Apple::spawn(&mut rng, bounds, &snake)?;

        info!(
            width = bounds.width,
            height = bounds.height,
            "simulation started"
        );

        Ok(Self {
            snake,
            apple,
            bounds,
            rng,
            tick_count: 0,
            resets: 0,
        })
    }

    /// Advances the simulation by one tick.
    ///
    /// Applies `pending_direction`, steps the snake, moves the apple after a
    /// reset, then handles consumption. Fails only when the apple has no free
    /// cell left. In that case the snake has still moved, the apple stays on
    /// the cell the head now covers and `tick_count` is not advanced; start a
    /// new simulation rather than ticking on.
    pub fn tick(
        &mut self,
        pending_direction: Option<Direction>,
    ) -> Result<TickOutcome, SimulationError> {
        if let Some(direction) = pending_direction {
            self.snake.set_direction(direction);
        }

        let step = self.snake.step(self.bounds, &mut self.rng);
        if step == StepOutcome::Collided {
            self.resets += 1;
            self.apple.respawn(&mut self.rng, self.bounds, &self.snake)?;
        }

        let ate = self.snake.head() == self.apple.position;
        if ate {
            self.snake.grow();
            debug!(
                position = ?self.apple.position,
                target_length = self.snake.target_length(),
                "apple eaten"
            );
            self.apple.respawn(&mut self.rng, self.bounds, &self.snake)?;
        }

        self.tick_count += 1;
        Ok(TickOutcome { step, ate })
    }

    /// Returns the externally observable state.
    #[must_use]
    pub fn state(&self) -> SimulationState<'_> {
        SimulationState {
            bounds: self.bounds,
            snake: &self.snake,
            apple: self.apple,
            tick_count: self.tick_count,
            resets: self.resets,
        }
    }

    #[must_use]
    pub fn bounds(&self) -> GridSize {
        self.bounds
    }

    #[must_use]
    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    #[must_use]
    pub fn apple(&self) -> Apple {
        self.apple
    }

    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Number of self-collisions so far.
    #[must_use]
    pub fn resets(&self) -> u64 {
        self.resets
    }
}

fn validate_bounds(bounds: GridSize) -> Result<GridSize, SimulationError> {
    if bounds.is_valid() {
        Ok(bounds)
    } else {
        Err(SimulationError::InvalidGrid {
            width: bounds.width,
            height: bounds.height,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::apple::Apple;
    use crate::config::SimulationConfig;
    use crate::error::SimulationError;
    use crate::grid::{GridSize, Position};
    use crate::input::Direction;
    use crate::snake::{Snake, StepOutcome};

    use super::Simulation;

    fn config(width: u16, height: u16) -> SimulationConfig {
        SimulationConfig {
            grid: GridSize::new(width, height),
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn new_simulation_starts_at_center_with_free_apple() {
        let sim = Simulation::new_with_seed(&config(40, 30), 1).expect("grid has room");

        assert_eq!(sim.snake().len(), 1);
        assert_eq!(sim.snake().head(), Position::new(20, 15));
        assert!(!sim.snake().occupies(sim.apple().position));
        assert!(sim.apple().position.is_within_bounds(sim.bounds()));
    }

    #[test]
    fn snake_grows_after_eating_apple() {
        let snake = Snake::new(Position { x: 1, y: 1 }, Direction::Right);
        let apple = Apple::new(Position { x: 2, y: 1 });
        let mut sim = Simulation::from_parts(&config(10, 10), snake, apple, 1)
            .expect("parts are valid");

        let outcome = sim.tick(None).expect("board has room");
        assert!(outcome.ate);
        assert_eq!(sim.snake().len(), 1);
        assert_eq!(sim.snake().target_length(), 2);

        sim.tick(None).expect("board has room");
        assert_eq!(sim.snake().len(), 2);
    }

    #[test]
    fn pending_direction_is_applied_before_the_step() {
        let snake = Snake::new(Position { x: 5, y: 5 }, Direction::Right);
        let apple = Apple::new(Position { x: 0, y: 0 });
        let mut sim = Simulation::from_parts(&config(10, 10), snake, apple, 2)
            .expect("parts are valid");

        let outcome = sim.tick(Some(Direction::Down)).expect("board has room");

        assert_eq!(outcome.step, StepOutcome::Moved(Position { x: 5, y: 6 }));
        assert!(!outcome.ate);
    }

    #[test]
    fn self_collision_resets_snake_and_relocates_apple() {
        let snake = Snake::from_segments(
            vec![
                Position { x: 2, y: 2 },
                Position { x: 2, y: 3 },
                Position { x: 1, y: 3 },
                Position { x: 1, y: 2 },
                Position { x: 1, y: 1 },
            ],
            Direction::Up,
        )
        .expect("segments are non-empty");
        let apple = Apple::new(Position { x: 5, y: 5 });
        let mut sim = Simulation::from_parts(&config(6, 6), snake, apple, 3)
            .expect("parts are valid");

        let outcome = sim.tick(Some(Direction::Left)).expect("board has room");

        assert!(outcome.collided());
        assert_eq!(sim.resets(), 1);
        assert_eq!(sim.snake().len(), 1);
        assert_eq!(sim.snake().head(), Position::new(3, 3));
        assert!(!sim.snake().occupies(sim.apple().position));
    }

    #[test]
    fn filling_the_board_reports_no_free_cell() {
        let snake = Snake::new(Position { x: 0, y: 0 }, Direction::Right);
        let apple = Apple::new(Position { x: 1, y: 0 });
        let mut sim = Simulation::from_parts(&config(2, 1), snake, apple, 4)
            .expect("parts are valid");

        // After the first meal only the vacated start cell is free.
        let outcome = sim.tick(None).expect("tail cell is free");
        assert!(outcome.ate);
        assert_eq!(sim.apple().position, Position::new(0, 0));

        assert_eq!(
            sim.tick(None),
            Err(SimulationError::NoFreeCell {
                width: 2,
                height: 1
            })
        );
        assert_eq!(sim.tick_count(), 1);
        assert_eq!(sim.snake().len(), 2);
        assert!(sim.snake().occupies(sim.apple().position));
    }

    #[test]
    fn invalid_parts_are_rejected() {
        let snake = Snake::new(Position { x: 1, y: 1 }, Direction::Right);

        let overlapping = Simulation::from_parts(
            &config(4, 4),
            snake.clone(),
            Apple::new(Position { x: 1, y: 1 }),
            0,
        );
        assert_eq!(
            overlapping.err(),
            Some(SimulationError::InvalidPlacement(Position::new(1, 1)))
        );

        let off_board = Simulation::from_parts(
            &config(4, 4),
            snake,
            Apple::new(Position { x: 4, y: 0 }),
            0,
        );
        assert!(off_board.is_err());

        assert_eq!(
            Simulation::new_with_seed(&config(0, 4), 0).err(),
            Some(SimulationError::InvalidGrid {
                width: 0,
                height: 4
            })
        );
    }

    #[test]
    fn one_by_one_grid_has_no_room_for_an_apple() {
        assert_eq!(
            Simulation::new_with_seed(&config(1, 1), 0).err(),
            Some(SimulationError::NoFreeCell {
                width: 1,
                height: 1
            })
        );
    }

    #[test]
    fn snapshot_copies_the_view() {
        let mut sim = Simulation::new_with_seed(&config(8, 8), 9).expect("grid has room");
        sim.tick(None).expect("board has room");

        let snapshot = sim.state().snapshot();

        assert_eq!(snapshot.tick_count, 1);
        assert_eq!(snapshot.body, vec![sim.snake().head()]);
        assert_eq!(snapshot.apple, sim.apple().position);
        assert_eq!(snapshot.bounds, GridSize::new(8, 8));
    }
}
