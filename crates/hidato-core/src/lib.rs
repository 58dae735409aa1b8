//! Core data structures for Hidato puzzles.
//!
//! This crate provides the grid model consumed by the generation pipeline:
//!
//! - [`Position`]: a `(row, col)` coordinate, ordered row-major
//! - [`Adjacency`]: the neighbour rule (4- or 8-neighbour)
//! - [`CellState`] and [`Cell`]: empty, given, or blocked cells
//! - [`Grid`]: a rectangular board whose irregular shape comes from blocked cells
//! - [`Constraints`]: adjacency, value bounds, and connectivity requirements
//! - [`connectivity`]: flood-fill based component analysis
//!
//! The pipeline treats a [`Grid`] as a read-only value. Operations that change
//! the shape of a board, like [`Grid::with_blocked`], return a new grid.
//!
//! # Examples
//!
//! ```
//! use hidato_core::{Adjacency, CellState, Grid, Position};
//!
//! let grid: Grid = "1 . . / # . 6".parse()?;
//! assert_eq!(grid.rows(), 2);
//! assert_eq!(grid.open_count(), 5);
//! assert_eq!(grid.cell(Position::new(1, 0)), CellState::Blocked);
//!
//! let neighbors = grid.open_neighbors(Position::new(0, 1), Adjacency::Four);
//! assert_eq!(neighbors.len(), 3);
//! # Ok::<(), hidato_core::GridError>(())
//! ```

pub use self::{
    adjacency::Adjacency,
    cell::{Cell, CellState},
    constraints::Constraints,
    error::GridError,
    grid::{Grid, Neighbors},
    position::Position,
};

mod adjacency;
mod cell;
mod constraints;
pub mod connectivity;
mod error;
mod grid;
mod position;
