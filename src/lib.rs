//! Snake on a toroidal grid.
//!
//! The simulation core (`grid`, `snake`, `apple`, `simulation`) performs no
//! I/O. The terminal front end (`input`, `renderer`, `terminal_runtime`)
//! drives it: one optional direction per tick in, a read-only
//! [`simulation::SimulationState`] out.

pub mod apple;
pub mod config;
pub mod error;
pub mod grid;
pub mod input;
pub mod renderer;
pub mod simulation;
pub mod snake;
pub mod terminal_runtime;
