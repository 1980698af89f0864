use std::collections::VecDeque;

use rand::Rng;
use tracing::{debug, trace};

use crate::error::SimulationError;
use crate::grid::{GridSize, Position};
use crate::input::{Direction, direction_change_is_valid};

/// Result of one movement step.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum StepOutcome {
    /// The head advanced to the contained cell.
    Moved(Position),
    /// The head ran into the body; the snake has already been reset.
    Collided,
}

/// Segmented body moving across a toroidal grid.
///
/// The head is at the front of `body`. Growth is lazy: [`Snake::grow`] only
/// raises `target_length`, and each [`Snake::step`] keeps the tail until the
/// body has caught up.
#[derive(Debug, Clone)]
pub struct Snake {
    body: VecDeque<Position>,
    direction: Direction,
    pending_direction: Option<Direction>,
    target_length: usize,
}

impl Snake {
    /// Creates a one-cell snake at `start` with the provided direction.
    #[must_use]
    pub fn new(start: Position, direction: Direction) -> Self {
        let mut body = VecDeque::new();
        body.push_front(start);

        Self {
            body,
            direction,
            pending_direction: None,
            target_length: 1,
        }
    }

    /// Creates a snake from explicit body segments (front is head) whose
    /// target length equals the segment count.
    pub fn from_segments(
        segments: Vec<Position>,
        direction: Direction,
    ) -> Result<Self, SimulationError> {
        if segments.is_empty() {
            return Err(SimulationError::EmptyBody);
        }

        let target_length = segments.len();
        Ok(Self {
            body: VecDeque::from(segments),
            direction,
            pending_direction: None,
            target_length,
        })
    }

    /// Buffers `direction` for the next step unless it reverses the current
    /// direction. A later call before the step replaces the buffered value.
    pub fn set_direction(&mut self, direction: Direction) {
        if !direction_change_is_valid(self.direction, direction) {
            trace!(?direction, current = ?self.direction, "ignoring reversal");
            return;
        }
        self.pending_direction = Some(direction);
    }

    /// Advances the head one cell, wrapping at the grid edges.
    ///
    /// Running into a segment behind the head resets the snake. The tail cell
    /// counts as free when the body is already at its target length, since it
    /// is vacated in the same step. Re-entering the head's own cell, which only
    /// happens along an axis one cell wide, is a plain move.
    pub fn step<R: Rng + ?Sized>(&mut self, bounds: GridSize, rng: &mut R) -> StepOutcome {
        debug_assert!(bounds.is_valid());

        if let Some(direction) = self.pending_direction.take() {
            self.direction = direction;
        }

        let next_head = self.next_head_position(bounds);
        let growing = self.body.len() < self.target_length;
        let blocking = if growing {
            self.body.len()
        } else {
            self.body.len() - 1
        };

        if self
            .body
            .iter()
            .skip(1)
            .take(blocking.saturating_sub(1))
            .any(|segment| *segment == next_head)
        {
            debug!(
                head = ?next_head,
                length = self.body.len(),
                "self collision, resetting snake"
            );
            self.reset(bounds, rng);
            return StepOutcome::Collided;
        }

        self.body.push_front(next_head);
        if self.body.len() > self.target_length {
            let _ = self.body.pop_back();
        }

        trace!(head = ?next_head, length = self.body.len(), "snake moved");
        StepOutcome::Moved(next_head)
    }

    /// Raises the target length by one. The body catches up on later steps.
    pub fn grow(&mut self) {
        self.target_length += 1;
    }

    /// Reinitializes to a single segment at the grid center heading in a
    /// random direction.
    pub fn reset<R: Rng + ?Sized>(&mut self, bounds: GridSize, rng: &mut R) {
        self.body.clear();
        self.body.push_front(bounds.center());
        self.direction = Direction::random(rng);
        self.pending_direction = None;
        self.target_length = 1;
    }

    /// Returns the head position for the next step with the current heading.
    #[must_use]
    pub fn next_head_position(&self, bounds: GridSize) -> Position {
        self.head().offset_wrapped(self.direction.delta(), bounds)
    }

    /// Returns the current head position.
    #[must_use]
    pub fn head(&self) -> Position {
        *self
            .body
            .front()
            .expect("snake body must always contain at least one segment")
    }

    /// Returns true if any segment occupies `position`.
    #[must_use]
    pub fn occupies(&self, position: Position) -> bool {
        self.body.contains(&position)
    }

    /// Returns current segment count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Returns true when there are no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    #[must_use]
    pub fn target_length(&self) -> usize {
        self.target_length
    }

    /// Returns the current movement direction.
    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn pending_direction(&self) -> Option<Direction> {
        self.pending_direction
    }

    /// Iterates over body segments from head to tail.
    pub fn segments(&self) -> impl Iterator<Item = &Position> {
        self.body.iter()
    }
}
