use tracing::{debug, info, instrument};

use crate::board::{has_collision, Board, Playfield, GRID_HEIGHT, GRID_WIDTH};
use crate::piece::{PieceProvider, RandomPieceProvider, Rotation, Shape, Tetromino, TetrominoType};

// ============================================================================
// Configuration
// ============================================================================

pub const LINES_PER_LEVEL: u32 = 10;

// Scoring
pub const SCORE_SINGLE: u64 = 40;
pub const SCORE_DOUBLE: u64 = 100;
pub const SCORE_TRIPLE: u64 = 300;
pub const SCORE_TETRIS: u64 = 1200;

/// Points for clearing `cleared` rows with one lock at `level`.
pub fn line_clear_score(cleared: u32, level: u32) -> u64 {
    let base = match cleared {
        0 => return 0,
        1 => SCORE_SINGLE,
        2 => SCORE_DOUBLE,
        3 => SCORE_TRIPLE,
        // More than four only happens on boards built with complete rows
        // already in place.
        _ => SCORE_TETRIS,
    };
    base.saturating_mul(u64::from(level) + 1)
}

pub fn level_for_lines(lines: u32) -> u32 {
    lines / LINES_PER_LEVEL
}

// ============================================================================
// Snapshot
// ============================================================================

/// The queued piece as shown in a preview; it has no position yet.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct NextPiece {
    pub tetromino_type: TetrominoType,
    pub shape: Shape,
}

/// Read-only view of a game, built fresh on every call to [`Game::snapshot`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Snapshot {
    pub level: u32,
    pub lines: u32,
    pub score: u64,
    pub next_piece: NextPiece,
    /// Locked cells with the falling piece drawn on top.
    pub playfield: Playfield,
    pub is_game_over: bool,
}

// ============================================================================
// Game
// ============================================================================

pub struct Game {
    board: Board,
    active: Tetromino,
    next: Tetromino,
    score: u64,
    lines: u32,
    game_over: bool,
    piece_provider: Box<dyn PieceProvider>,
}

impl Game {
    pub fn new() -> Self {
        Self::with_provider(Box::new(RandomPieceProvider::new()))
    }

    /// Same seed, same piece sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_provider(Box::new(RandomPieceProvider::seeded(seed)))
    }

    pub fn with_provider(mut provider: Box<dyn PieceProvider>) -> Self {
        let active = Tetromino::new(provider.next_piece());
        Self::with_board(Board::new(), active, provider)
    }

    /// Starts from an arbitrary position. The next piece is drawn from
    /// `provider`.
    pub fn with_board(board: Board, active: Tetromino, mut provider: Box<dyn PieceProvider>) -> Self {
        let next = Tetromino::new(provider.next_piece());
        Self {
            board,
            active,
            next,
            score: 0,
            lines: 0,
            game_over: false,
            piece_provider: provider,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn active_piece(&self) -> &Tetromino {
        &self.active
    }

    pub fn next_piece(&self) -> &Tetromino {
        &self.next
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn level(&self) -> u32 {
        level_for_lines(self.lines)
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn snapshot(&self) -> Snapshot {
        let mut playfield = *self.board.rows();

        for (pos, cell) in self.active.blocks() {
            let on_board = (0..GRID_HEIGHT as i16).contains(&pos.y)
                && (0..GRID_WIDTH as i16).contains(&pos.x);
            if on_board {
                playfield[pos.y as usize][pos.x as usize] = cell;
            }
        }

        Snapshot {
            level: self.level(),
            lines: self.lines,
            score: self.score,
            next_piece: NextPiece {
                tetromino_type: self.next.tetromino_type,
                shape: self.next.shape,
            },
            playfield,
            is_game_over: self.game_over,
        }
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    #[instrument(level = "debug", skip(self))]
    pub fn reset(&mut self) {
        self.board = Board::new();
        self.score = 0;
        self.lines = 0;
        self.game_over = false;
        self.active = self.spawn();
        self.next = self.spawn();

        info!(
            active = ?self.active.tetromino_type,
            next = ?self.next.tetromino_type,
            "game reset"
        );
    }

    pub fn move_left(&mut self) {
        self.shift(-1);
    }

    pub fn move_right(&mut self) {
        self.shift(1);
    }

    /// Rotates clockwise, or leaves the piece untouched if the rotated
    /// shape would collide.
    pub fn rotate(&mut self) {
        let direction = Rotation::Clockwise;
        self.active.shape.rotate(direction);
        if self.collides() {
            self.active.shape.rotate(direction.inverse());
        }
    }

    /// One row of gravity. A piece that cannot fall locks, completed rows
    /// are cleared and the queued piece takes over. If that piece has no
    /// room the game ends; from then on this is a no-op until `reset`.
    #[instrument(level = "debug", skip(self))]
    pub fn step(&mut self) {
        if self.game_over {
            return;
        }

        let y = self.active.position.y;
        self.active.position.y = y + 1;
        if self.collides() {
            self.active.position.y = y;
            self.lock_active();
        }

        if self.collides() {
            self.game_over = true;
            info!(score = self.score, lines = self.lines, "game over");
        }
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn collides(&self) -> bool {
        has_collision(&self.active, &self.board)
    }

    fn shift(&mut self, dx: i16) {
        let x = self.active.position.x;
        self.active.position.x = x + dx;
        if self.collides() {
            self.active.position.x = x;
        }
    }

    fn spawn(&mut self) -> Tetromino {
        Tetromino::new(self.piece_provider.next_piece())
    }

    fn lock_active(&mut self) {
        self.board.lock(&self.active);
        debug!(
            piece = ?self.active.tetromino_type,
            x = self.active.position.x,
            y = self.active.position.y,
            "piece locked"
        );

        let cleared = self.board.clear_lines();
        self.award(cleared);

        let next = self.spawn();
        self.active = std::mem::replace(&mut self.next, next);
    }

    fn award(&mut self, cleared: u32) {
        if cleared == 0 {
            return;
        }
        let level = self.level();
        let points = line_clear_score(cleared, level);
        self.score = self.score.saturating_add(points);
        self.lines = self.lines.saturating_add(cleared);

        debug!(cleared, level, points, score = self.score, "lines cleared");
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Test Helpers
// ============================================================================

/// Board builders and state setters for tests. Not part of the engine API.
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use super::*;
    use crate::board::CellState;

    pub fn empty_board() -> Board {
        Board::new()
    }

    pub fn fill_row(board: &mut Board, y: usize) {
        for x in 0..GRID_WIDTH {
            board.set(x as i16, y as i16, CellState::Filled(TetrominoType::T));
        }
    }

    pub fn fill_row_with_gap(board: &mut Board, y: usize, gap_x: usize) {
        for x in 0..GRID_WIDTH {
            if x != gap_x {
                board.set(x as i16, y as i16, CellState::Filled(TetrominoType::T));
            }
        }
    }

    /// Puts a game at a given line count, e.g. to test level multipliers.
    pub fn set_lines(game: &mut Game, lines: u32) {
        game.lines = lines;
    }
}
