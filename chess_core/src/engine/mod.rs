use crate::logic::board::{Board, Color, Piece, PieceKind, Square};
use crate::logic::game::GameState;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod cache;
pub mod config;
pub mod eval;
pub mod learning;
pub mod ordering;
pub mod search;
pub mod tactics;
pub mod zobrist;


/// Evaluation scores, from the perspective of the side named by the caller.
pub type Score = f64;

/// Magnitude of a mate score. Search adds the remaining depth so quicker mates win.
pub const MATE_SCORE: Score = 1_000_000.0;

pub fn is_mate_score(score: Score) -> bool {
    score.abs() >= MATE_SCORE
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub promotion: Option<PieceKind>,
}

impl Move {
    pub const fn new(from: Square, to: Square, piece: Piece) -> Self {
        Self {
            from,
            to,
            piece,
            promotion: None,
        }
    }

    #[must_use]
    pub const fn with_promotion(mut self, kind: PieceKind) -> Self {
        self.promotion = Some(kind);
        self
    }

    /// Coordinate notation such as `e2e4` or `e7e8q`.
    pub fn to_coordinate(&self) -> String {
        let mut s = format!("{}{}", self.from, self.to);
        if let Some(kind) = self.promotion {
            s.push(kind.symbol());
        }
        s
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_coordinate())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchLimit {
    Depth(u8),
    Time(u64), // milliseconds
    /// Whichever runs out first.
    DepthAndTime { depth: u8, time_ms: u64 },
}

impl SearchLimit {
    pub const fn max_depth(self) -> u8 {
        match self {
            Self::Depth(d) | Self::DepthAndTime { depth: d, .. } => d,
            Self::Time(_) => 64,
        }
    }

    pub const fn time_ms(self) -> Option<u64> {
        match self {
            Self::Depth(_) => None,
            Self::Time(t) | Self::DepthAndTime { time_ms: t, .. } => Some(t),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    pub depth: u8,
    pub nodes: u64,
    pub time_ms: u64,
    pub score: Score,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub from_book: bool,
}

pub trait Evaluator {
    fn evaluate(&self, board: &Board, side: Color, state: &GameState) -> Score;
}

pub trait Searcher {
    fn search(
        &mut self,
        board: &Board,
        side: Color,
        state: &GameState,
        limit: SearchLimit,
    ) -> Option<(Move, SearchStats)>;
}
