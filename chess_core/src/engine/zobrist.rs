use crate::logic::board::{Color, PieceKind};
use std::sync::OnceLock;

// 6 piece kinds * 2 colors * 64 squares
const NUM_PIECE_KINDS: usize = 6;
const NUM_COLORS: usize = 2;
const NUM_SQUARES: usize = 64;
const TABLE_SIZE: usize = NUM_PIECE_KINDS * NUM_COLORS * NUM_SQUARES;

pub struct ZobristKeys {
    pub piece_keys: [u64; TABLE_SIZE],
    pub side_key: u64,
}

// Simple XorShift RNG so keys are identical across runs
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

static KEYS: OnceLock<ZobristKeys> = OnceLock::new();

impl ZobristKeys {
    fn new() -> Self {
        let mut rng = XorShift64::new(123_456_789);
        let mut piece_keys = [0; TABLE_SIZE];
        for key in &mut piece_keys {
            *key = rng.next();
        }
        let side_key = rng.next();

        Self {
            piece_keys,
            side_key,
        }
    }

    /// Shared, lazily built key table.
    pub fn get() -> &'static Self {
        KEYS.get_or_init(Self::new)
    }

    pub fn piece_key(&self, kind: PieceKind, color: Color, row: usize, col: usize) -> u64 {
        // ((kind * 2 + color) * 8 + row) * 8 + col
        let idx = ((kind.index() * NUM_COLORS + color.index()) * 8 + row) * 8 + col;
        self.piece_keys.get(idx).copied().unwrap_or(0)
    }
}
