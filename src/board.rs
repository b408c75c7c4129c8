use crate::piece::{Tetromino, TetrominoType};

// ============================================================================
// Configuration
// ============================================================================

pub const GRID_WIDTH: usize = 10;
pub const GRID_HEIGHT: usize = 20;

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CellState {
    #[default]
    Empty,
    Filled(TetrominoType),
}

impl CellState {
    pub fn is_filled(&self) -> bool {
        matches!(self, CellState::Filled(_))
    }

    /// 0 for an empty cell, otherwise the piece type's marker (1..=7).
    pub fn marker(&self) -> u8 {
        match self {
            CellState::Empty => 0,
            CellState::Filled(t) => t.marker(),
        }
    }
}

pub type Row = [CellState; GRID_WIDTH];

/// Full grid, row 0 at the top.
pub type Playfield = [Row; GRID_HEIGHT];

const EMPTY_ROW: Row = [CellState::Empty; GRID_WIDTH];

// ============================================================================
// Board
// ============================================================================

/// Locked cells only. The falling piece is never stored here until it locks.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Board {
    rows: Playfield,
}

impl Board {
    pub fn new() -> Self {
        Self {
            rows: [EMPTY_ROW; GRID_HEIGHT],
        }
    }

    /// Cell at column `x`, row `y`, or `None` when outside the grid.
    pub fn get(&self, x: i16, y: i16) -> Option<CellState> {
        if x < 0 || y < 0 {
            return None;
        }
        self.rows
            .get(y as usize)
            .and_then(|row| row.get(x as usize))
            .copied()
    }

    /// Writes a cell. Returns false (and writes nothing) when outside the grid.
    pub fn set(&mut self, x: i16, y: i16, cell: CellState) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        match self.rows.get_mut(y as usize).and_then(|row| row.get_mut(x as usize)) {
            Some(slot) => {
                *slot = cell;
                true
            }
            None => false,
        }
    }

    pub fn rows(&self) -> &Playfield {
        &self.rows
    }

    pub fn filled_count_in_row(&self, y: usize) -> usize {
        self.rows[y].iter().filter(|cell| cell.is_filled()).count()
    }

    pub fn is_row_complete(&self, y: usize) -> bool {
        self.filled_count_in_row(y) == GRID_WIDTH
    }

    pub fn total_filled_cells(&self) -> usize {
        (0..GRID_HEIGHT).map(|y| self.filled_count_in_row(y)).sum()
    }

    /// Copies the piece's filled cells onto the board. Cells above the top
    /// edge have nowhere to go and are dropped.
    pub fn lock(&mut self, piece: &Tetromino) {
        for (pos, cell) in piece.blocks() {
            self.set(pos.x, pos.y, cell);
        }
    }

    /// Removes complete rows and returns how many were removed.
    ///
    /// Rows are scanned from the floor up. The scan stops at the first empty
    /// row, since nothing above it can be supported; partially filled rows are
    /// skipped without stopping it.
    pub fn clear_lines(&mut self) -> u32 {
        let mut full = Vec::new();

        for y in (0..GRID_HEIGHT).rev() {
            match self.filled_count_in_row(y) {
                0 => break,
                GRID_WIDTH => full.push(y),
                _ => continue,
            }
        }

        // Removing top-down keeps the indices of the remaining rows valid:
        // dropping row `y` only shifts the rows above it.
        for &y in full.iter().rev() {
            self.remove_row(y);
        }

        full.len() as u32
    }

    /// Deletes row `y` and shifts everything above it down by one, leaving
    /// an empty row at the top.
    fn remove_row(&mut self, y: usize) {
        self.rows.copy_within(0..y, 1);
        self.rows[0] = EMPTY_ROW;
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Collision
// ============================================================================

/// Whether `piece` overlaps a wall, the floor, or a locked cell.
///
/// Rows above the board never collide so that pieces can spawn partly off
/// screen and fall into view.
pub fn has_collision(piece: &Tetromino, board: &Board) -> bool {
    piece.blocks().any(|(pos, _)| {
        if pos.y < 0 {
            return false;
        }
        match board.get(pos.x, pos.y) {
            Some(cell) => cell.is_filled(),
            None => true,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> CellState {
        CellState::Filled(TetrominoType::T)
    }

    #[test]
    fn new_board_is_empty() {
        let board = Board::new();
        assert_eq!(board.total_filled_cells(), 0);
        assert_eq!(board.rows().len(), GRID_HEIGHT);
        assert_eq!(board.rows()[0].len(), GRID_WIDTH);
    }

    #[test]
    fn get_and_set_reject_out_of_range() {
        let mut board = Board::new();
        assert!(!board.set(-1, 0, filled()));
        assert!(!board.set(0, GRID_HEIGHT as i16, filled()));
        assert!(!board.set(GRID_WIDTH as i16, 0, filled()));
        assert_eq!(board.get(0, -1), None);
        assert_eq!(board.total_filled_cells(), 0);

        assert!(board.set(9, 19, filled()));
        assert_eq!(board.get(9, 19), Some(filled()));
    }

    #[test]
    fn remove_row_shifts_rows_above_down() {
        let mut board = Board::new();
        board.set(0, 17, filled());
        board.set(1, 18, filled());
        board.set(2, 19, filled());

        board.remove_row(18);

        assert_eq!(board.get(0, 18), Some(filled()));
        assert_eq!(board.get(1, 18), Some(CellState::Empty));
        assert_eq!(board.get(2, 19), Some(filled()));
        assert_eq!(board.filled_count_in_row(0), 0);
    }

    #[test]
    fn markers_round_trip_through_cells() {
        assert_eq!(CellState::Empty.marker(), 0);
        assert_eq!(CellState::Filled(TetrominoType::Z).marker(), 7);
    }
}
