use crate::engine::Move;
use crate::logic::board::{Board, Color, Square};
use crate::logic::game::GameState;
use crate::logic::rules::is_legal_move;

pub struct MoveGenerator;

impl Default for MoveGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveGenerator {
    pub const fn new() -> Self {
        Self
    }

    /// All legal moves for `side`, ordered by source square then destination square.
    pub fn generate_moves(&self, board: &Board, side: Color, state: &GameState) -> Vec<Move> {
        let mut moves = Vec::with_capacity(48);
        for (from, piece) in board.pieces_of(side) {
            for to in Square::all() {
                let mv = Move::new(from, to, piece);
                if is_legal_move(board, &mv, side, state) {
                    moves.push(mv);
                }
            }
        }
        moves
    }

    /// Checks if `side` has at least one legal move, stopping at the first one found.
    pub fn has_legal_moves(&self, board: &Board, side: Color, state: &GameState) -> bool {
        board.pieces_of(side).any(|(from, piece)| {
            Square::all().any(|to| is_legal_move(board, &Move::new(from, to, piece), side, state))
        })
    }
}

pub fn generate_legal_moves(board: &Board, side: Color, state: &GameState) -> Vec<Move> {
    MoveGenerator::new().generate_moves(board, side, state)
}
