use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::board::{CellState, GRID_WIDTH};

// ============================================================================
// Configuration
// ============================================================================

/// Side length of the largest shape matrix (I and O).
pub const MAX_SHAPE_SIZE: usize = 4;

/// Row at which freshly spawned pieces start: one above the visible board.
pub const SPAWN_Y: i16 = -1;

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Position {
    pub x: i16,
    pub y: i16,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum TetrominoType {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl TetrominoType {
    /// Every type, in marker order.
    pub const ALL: [TetrominoType; 7] = [
        TetrominoType::I,
        TetrominoType::J,
        TetrominoType::L,
        TetrominoType::O,
        TetrominoType::S,
        TetrominoType::T,
        TetrominoType::Z,
    ];

    /// Maps a spawner draw in `0..7` to its type.
    ///
    /// # Panics
    ///
    /// Any other index is a bug in the caller.
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => TetrominoType::I,
            1 => TetrominoType::J,
            2 => TetrominoType::L,
            3 => TetrominoType::O,
            4 => TetrominoType::S,
            5 => TetrominoType::T,
            6 => TetrominoType::Z,
            _ => unreachable!("piece index {index} outside of 0..7"),
        }
    }

    /// Cell marker (1..=7) stored on the board for this type.
    pub fn marker(self) -> u8 {
        match self {
            TetrominoType::I => 1,
            TetrominoType::J => 2,
            TetrominoType::L => 3,
            TetrominoType::O => 4,
            TetrominoType::S => 5,
            TetrominoType::T => 6,
            TetrominoType::Z => 7,
        }
    }

    /// Canonical spawn orientation.
    pub fn shape(self) -> Shape {
        let mask: &[&[u8]] = match self {
            TetrominoType::I => &[&[0, 0, 0, 0], &[1, 1, 1, 1], &[0, 0, 0, 0], &[0, 0, 0, 0]],
            TetrominoType::J => &[&[0, 0, 0], &[1, 1, 1], &[0, 0, 1]],
            TetrominoType::L => &[&[0, 0, 0], &[1, 1, 1], &[1, 0, 0]],
            TetrominoType::O => &[&[0, 0, 0, 0], &[0, 1, 1, 0], &[0, 1, 1, 0], &[0, 0, 0, 0]],
            TetrominoType::S => &[&[0, 0, 0], &[0, 1, 1], &[1, 1, 0]],
            TetrominoType::T => &[&[0, 0, 0], &[1, 1, 1], &[0, 1, 0]],
            TetrominoType::Z => &[&[0, 0, 0], &[1, 1, 0], &[0, 1, 1]],
        };
        Shape::from_mask(mask, CellState::Filled(self))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

impl Rotation {
    pub fn inverse(self) -> Self {
        match self {
            Rotation::Clockwise => Rotation::CounterClockwise,
            Rotation::CounterClockwise => Rotation::Clockwise,
        }
    }
}

// ============================================================================
// Shape Matrix
// ============================================================================

/// Square shape matrix of side 3 or 4. Only the top-left `size x size`
/// corner of `cells` is meaningful; the rest stays empty.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Shape {
    size: usize,
    cells: [[CellState; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE],
}

impl Shape {
    fn from_mask(mask: &[&[u8]], fill: CellState) -> Self {
        debug_assert!(mask.len() <= MAX_SHAPE_SIZE);
        let mut cells = [[CellState::Empty; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        for (y, row) in mask.iter().enumerate() {
            debug_assert_eq!(row.len(), mask.len(), "shape rows must be square");
            for (x, &bit) in row.iter().enumerate() {
                if bit != 0 {
                    cells[y][x] = fill;
                }
            }
        }
        Self {
            size: mask.len(),
            cells,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, x: usize, y: usize) -> CellState {
        if x < self.size && y < self.size {
            self.cells[y][x]
        } else {
            CellState::Empty
        }
    }

    /// Rows of the matrix, top to bottom, each `size` cells wide.
    pub fn rows(&self) -> impl Iterator<Item = &[CellState]> + '_ {
        self.cells[..self.size].iter().map(move |row| &row[..self.size])
    }

    /// Filled cells as `(x, y, cell)` offsets relative to the top-left corner.
    pub fn filled(&self) -> impl Iterator<Item = (usize, usize, CellState)> + '_ {
        self.rows().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, cell)| cell.is_filled())
                .map(move |(x, &cell)| (x, y, cell))
        })
    }

    pub fn filled_count(&self) -> usize {
        self.filled().count()
    }

    /// Rotates the matrix by 90 degrees in place, one concentric ring at a
    /// time. Each inner step cycles four cells that map onto each other.
    pub fn rotate(&mut self, direction: Rotation) {
        let m = &mut self.cells;
        let last = self.size - 1;

        for i in 0..self.size / 2 {
            for j in i..last - i {
                let temp = m[i][j];
                match direction {
                    Rotation::Clockwise => {
                        m[i][j] = m[last - j][i];
                        m[last - j][i] = m[last - i][last - j];
                        m[last - i][last - j] = m[j][last - i];
                        m[j][last - i] = temp;
                    }
                    Rotation::CounterClockwise => {
                        m[i][j] = m[j][last - i];
                        m[j][last - i] = m[last - i][last - j];
                        m[last - i][last - j] = m[last - j][i];
                        m[last - j][i] = temp;
                    }
                }
            }
        }
    }
}

// ============================================================================
// Tetromino
// ============================================================================

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Tetromino {
    pub tetromino_type: TetrominoType,
    pub position: Position,
    pub shape: Shape,
}

impl Tetromino {
    /// A piece in its canonical orientation at the spawn position:
    /// horizontally centred, one row above the board.
    pub fn new(tetromino_type: TetrominoType) -> Self {
        let shape = tetromino_type.shape();
        let x = (GRID_WIDTH - shape.size()) as i16 / 2;
        Self::with_shape(tetromino_type, shape, x, SPAWN_Y)
    }

    pub fn new_at(tetromino_type: TetrominoType, x: i16, y: i16) -> Self {
        Self::with_shape(tetromino_type, tetromino_type.shape(), x, y)
    }

    fn with_shape(tetromino_type: TetrominoType, shape: Shape, x: i16, y: i16) -> Self {
        Self {
            tetromino_type,
            position: Position { x, y },
            shape,
        }
    }

    /// Absolute board coordinates of every filled cell, with its value.
    pub fn blocks(&self) -> impl Iterator<Item = (Position, CellState)> + '_ {
        self.shape.filled().map(move |(dx, dy, cell)| {
            (
                Position {
                    x: self.position.x + dx as i16,
                    y: self.position.y + dy as i16,
                },
                cell,
            )
        })
    }
}

// ============================================================================
// Piece Provider Trait
// ============================================================================

/// Source of piece types for the spawner. The game owns exactly one.
pub trait PieceProvider {
    fn next_piece(&mut self) -> TetrominoType;
}

/// Uniform, independent draws over the seven types.
pub struct RandomPieceProvider<R = ChaCha8Rng> {
    rng: R,
}

impl RandomPieceProvider<ChaCha8Rng> {
    /// Seeded from OS entropy.
    pub fn new() -> Self {
        Self::from_rng(ChaCha8Rng::from_entropy())
    }

    /// Reproducible sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl Default for RandomPieceProvider<ChaCha8Rng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> RandomPieceProvider<R> {
    pub fn from_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> PieceProvider for RandomPieceProvider<R> {
    fn next_piece(&mut self) -> TetrominoType {
        TetrominoType::from_index(self.rng.gen_range(0..TetrominoType::ALL.len()))
    }
}

/// Replays a fixed sequence forever. Used to script games in tests.
pub struct SequencePieceProvider {
    pieces: Vec<TetrominoType>,
    index: usize,
}

impl SequencePieceProvider {
    pub fn new(pieces: Vec<TetrominoType>) -> Self {
        assert!(!pieces.is_empty(), "piece sequence must not be empty");
        Self { pieces, index: 0 }
    }
}

impl PieceProvider for SequencePieceProvider {
    fn next_piece(&mut self) -> TetrominoType {
        let piece = self.pieces[self.index % self.pieces.len()];
        self.index += 1;
        piece
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_canonical_shape_is_a_tetromino() {
        for t in TetrominoType::ALL {
            assert_eq!(t.shape().filled_count(), 4, "{t:?}");
        }
    }

    #[test]
    fn markers_are_distinct_and_in_range() {
        let markers: Vec<u8> = TetrominoType::ALL.iter().map(|t| t.marker()).collect();
        assert_eq!(markers, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn from_index_follows_marker_order() {
        for (i, t) in TetrominoType::ALL.iter().enumerate() {
            assert_eq!(TetrominoType::from_index(i), *t);
        }
    }

    #[test]
    #[should_panic(expected = "outside of 0..7")]
    fn from_index_rejects_unknown_type() {
        TetrominoType::from_index(7);
    }

    #[test]
    fn shape_sizes_match_piece_type() {
        assert_eq!(TetrominoType::I.shape().size(), 4);
        assert_eq!(TetrominoType::O.shape().size(), 4);
        for t in [
            TetrominoType::J,
            TetrominoType::L,
            TetrominoType::S,
            TetrominoType::T,
            TetrominoType::Z,
        ] {
            assert_eq!(t.shape().size(), 3);
        }
    }

    #[test]
    fn clockwise_rotation_of_t() {
        // . . .      . T .
        // T T T  ->  T T .
        // . T .      . T .
        let mut shape = TetrominoType::T.shape();
        shape.rotate(Rotation::Clockwise);

        let t = CellState::Filled(TetrominoType::T);
        let e = CellState::Empty;
        let rows: Vec<Vec<CellState>> = shape.rows().map(|r| r.to_vec()).collect();
        assert_eq!(rows, vec![vec![e, t, e], vec![t, t, e], vec![e, t, e]]);
    }

    #[test]
    fn clockwise_rotation_of_i_is_vertical() {
        let mut shape = TetrominoType::I.shape();
        shape.rotate(Rotation::Clockwise);

        let column: Vec<(usize, usize)> = shape.filled().map(|(x, y, _)| (x, y)).collect();
        assert_eq!(column, vec![(2, 0), (2, 1), (2, 2), (2, 3)]);
    }

    #[test]
    fn counter_clockwise_undoes_clockwise() {
        for t in TetrominoType::ALL {
            let original = t.shape();
            let mut shape = original;
            shape.rotate(Rotation::Clockwise);
            shape.rotate(Rotation::CounterClockwise);
            assert_eq!(shape, original, "{t:?}");
        }
    }

    #[test]
    fn spawn_position_is_centred_above_board() {
        let i = Tetromino::new(TetrominoType::I);
        assert_eq!(i.position, Position { x: 3, y: -1 });

        let t = Tetromino::new(TetrominoType::T);
        assert_eq!(t.position, Position { x: 3, y: -1 });
    }

    #[test]
    fn blocks_are_offset_by_position() {
        let piece = Tetromino::new_at(TetrominoType::O, 2, 5);
        let blocks: Vec<(i16, i16)> = piece.blocks().map(|(p, _)| (p.x, p.y)).collect();
        assert_eq!(blocks, vec![(3, 6), (4, 6), (3, 7), (4, 7)]);
    }

    #[test]
    fn seeded_providers_agree() {
        let mut a = RandomPieceProvider::seeded(42);
        let mut b = RandomPieceProvider::seeded(42);
        for _ in 0..32 {
            assert_eq!(a.next_piece(), b.next_piece());
        }
    }
}
