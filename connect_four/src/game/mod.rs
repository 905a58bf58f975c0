//! Connect Four engine - board rules, turn order and outcome detection.
//!
//! This module has no I/O. Sessions own a [`Board`] each and serialize access
//! to it; everything here is plain synchronous state.

pub mod board;
pub mod entities;

pub use board::{Board, IllegalMove};
pub use entities::{COLUMNS, CONNECT, GameOutcome, Move, Player, ROWS};
