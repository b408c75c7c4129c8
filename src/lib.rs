//! Rule engine for a falling-block puzzle game.
//!
//! [`game::Game`] owns the board, the falling and queued pieces, and the
//! score. It is driven by plain method calls and observed through
//! [`game::Game::snapshot`]. [`controller`] adds the pause and gravity
//! pacing policy a front-end needs.

pub mod board;
pub mod controller;
pub mod game;
pub mod piece;

pub use board::{has_collision, Board, CellState, GRID_HEIGHT, GRID_WIDTH};
pub use controller::{Controller, Input, Screen};
pub use game::{Game, NextPiece, Snapshot};
pub use piece::{
    PieceProvider, Position, RandomPieceProvider, Rotation, SequencePieceProvider, Shape,
    Tetromino, TetrominoType,
};
