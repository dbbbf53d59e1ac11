use crate::engine::Move;
use crate::logic::board::{Board, Color, PieceKind};
use crate::logic::game::GameState;
use crate::logic::generator::generate_legal_moves;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;

/// Book lines keyed by the concatenated coordinate moves played so far.
/// A single move as key also matches whenever it was the last move played.
const BOOK: &[(&str, &[&str])] = &[
    ("", &["e2e4", "d2d4", "c2c4", "g1f3"]),
    ("e2e4", &["e7e5", "c7c5", "e7e6", "c7c6", "g7g6", "d7d6", "f7f5"]),
    ("e7e5", &["e2e4", "d2d4", "c2c4", "g1f3", "b1c3", "f2f4"]),
    ("e2e4e7e5", &["g1f3", "b1c3", "f2f4"]),
    ("g1f3g8f6", &["b1c3", "f1c4", "f1b5"]),
    ("b1c3b8c6", &["f1c4", "f1b5"]),
    ("f1b5b8c6", &["d2d4", "0-0", "c2c3"]),
    ("e2e4c7c5", &["g1f3", "d2d4", "c2c3"]),
    ("e2e4e7e6", &["d2d4", "c2c4", "g1f3"]),
    ("e2e4c7c6", &["d2d4", "g1f3"]),
    ("e2e4g7g6", &["d2d4", "c2c4", "g1f3"]),
    ("d2d4", &["d7d5", "e7e6", "c7c5", "g7g6", "f7f5"]),
    ("d7d5", &["d2d4", "e2e4", "c2c4", "g1f3"]),
    ("c2c4", &["e7e5", "c7c5", "e7e6", "g7g6", "d7d5", "e7e4"]),
    ("g1f3", &["d7d5", "e7e5", "c7c5", "g7g6", "e7e6"]),
    ("f2f4e7e4", &["g1f3", "b1c3"]),
    ("d2d4d7d5", &["c2c4", "g1f3"]),
    ("c2c4e7e6", &["g1f3", "b1c3"]),
    ("d2d4f7f5", &["c2c4", "g1f3", "e2e3"]),
    ("e2e4d7d5", &["e4d5", "g1f3", "d2d4"]),
];

/// Short castling in book notation.
const CASTLE_SHORT: &str = "0-0";

pub struct OpeningBook {
    lines: HashMap<&'static str, Vec<&'static str>>,
}

impl Default for OpeningBook {
    fn default() -> Self {
        Self::new()
    }
}

impl OpeningBook {
    pub fn new() -> Self {
        let mut lines: HashMap<&'static str, Vec<&'static str>> = HashMap::new();
        for (key, replies) in BOOK {
            let entry = lines.entry(*key).or_default();
            for reply in *replies {
                if !entry.contains(reply) {
                    entry.push(*reply);
                }
            }
        }
        Self { lines }
    }

    /// Book entries that apply to the game so far: the whole sequence first,
    /// then the last move. Games set up from another position have none.
    fn entries<'a>(&'a self, state: &GameState) -> impl Iterator<Item = &'a [&'static str]> {
        let keys = if state.from_start {
            vec![
                Some(state.move_sequence.clone()),
                state.last_move.map(|mv| mv.to_coordinate()),
            ]
        } else {
            Vec::new()
        };
        keys.into_iter()
            .flatten()
            .filter_map(|key| self.lines.get(key.as_str()))
            .map(Vec::as_slice)
    }

    /// Raw book replies for the game so far.
    pub fn candidates(&self, state: &GameState) -> &[&'static str] {
        self.entries(state).next().unwrap_or_default()
    }

    /// Legal book replies for `side`, from the first entry that has any.
    pub fn legal_candidates(&self, board: &Board, side: Color, state: &GameState) -> Vec<Move> {
        let mut legal: Option<Vec<Move>> = None;
        for replies in self.entries(state) {
            let legal = legal.get_or_insert_with(|| generate_legal_moves(board, side, state));
            let moves: Vec<Move> = replies
                .iter()
                .filter_map(|text| resolve(text, side, legal))
                .collect();
            if !moves.is_empty() {
                return moves;
            }
        }
        Vec::new()
    }

    /// Picks a legal book reply uniformly at random.
    pub fn book_move<R: Rng + ?Sized>(
        &self,
        board: &Board,
        side: Color,
        state: &GameState,
        rng: &mut R,
    ) -> Option<Move> {
        let moves = self.legal_candidates(board, side, state);
        let choice = moves.choose(rng).copied();
        if let Some(mv) = choice {
            log::debug!("book: {mv} out of {} candidates", moves.len());
        }
        choice
    }
}

fn resolve(text: &str, side: Color, legal: &[Move]) -> Option<Move> {
    if text == CASTLE_SHORT {
        return legal.iter().copied().find(|m| {
            m.piece.kind == PieceKind::King
                && m.from.row == side.back_row()
                && m.to.col == m.from.col + 2
        });
    }
    legal.iter().copied().find(|m| m.to_coordinate() == text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::board::Square;
    use crate::logic::notation::parse_move;
    use crate::logic::rules::apply_move;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn play(moves: &[&str]) -> (Board, Color, GameState) {
        let mut board = Board::new();
        let mut state = GameState::new();
        let mut side = Color::White;
        for text in moves {
            let mv = parse_move(&board, side, &state, text).unwrap();
            (board, state) = apply_move(&board, &mv, &state);
            side = side.opposite();
        }
        (board, side, state)
    }

    #[test]
    fn test_start_position_uses_empty_key() {
        let book = OpeningBook::new();
        let (board, side, state) = play(&[]);
        let moves = book.legal_candidates(&board, side, &state);
        let texts: Vec<String> = moves.iter().map(Move::to_coordinate).collect();
        assert_eq!(texts, vec!["e2e4", "d2d4", "c2c4", "g1f3"]);
    }

    #[test]
    fn test_full_sequence_beats_last_move() {
        let book = OpeningBook::new();
        let (_, _, state) = play(&["e2e4", "e7e5"]);
        // "e2e4e7e5" exists, so the "e7e5" entry is not used
        assert_eq!(book.candidates(&state), &["g1f3", "b1c3", "f2f4"]);
    }

    #[test]
    fn test_falls_back_to_last_move_key() {
        let book = OpeningBook::new();
        let (board, side, state) = play(&["g1f3", "d7d5", "c2c4"]);
        let texts: Vec<String> = book
            .legal_candidates(&board, side, &state)
            .iter()
            .map(Move::to_coordinate)
            .collect();
        // Entry for c2c4; e7e4 is not a legal pawn move and is dropped
        assert!(texts.contains(&"e7e5".to_string()));
        assert!(!texts.contains(&"e7e4".to_string()));
        assert!(!texts.contains(&"d7d5".to_string()));
    }

    #[test]
    fn test_short_castling_entry() {
        let (board, side, state) = play(&["e2e4", "e7e5", "g1f3", "g8f6", "f1c4", "b8c6"]);
        let legal = generate_legal_moves(&board, side, &state);
        let castle = resolve(CASTLE_SHORT, side, &legal).unwrap();
        assert_eq!(castle.to_coordinate(), "e1g1");

        let (board, side, state) = play(&["e2e4", "e7e5"]);
        let legal = generate_legal_moves(&board, side, &state);
        assert!(resolve(CASTLE_SHORT, side, &legal).is_none());
    }

    #[test]
    fn test_book_move_is_a_candidate() {
        let book = OpeningBook::new();
        let (board, side, state) = play(&["d2d4"]);
        let mut rng = StdRng::seed_from_u64(7);
        let mv = book.book_move(&board, side, &state, &mut rng).unwrap();
        assert!(book.candidates(&state).contains(&mv.to_coordinate().as_str()));
    }

    #[test]
    fn test_set_up_position_is_out_of_book() {
        let book = OpeningBook::new();
        // Black queen loose on d3, reached by no book line
        let mut board = Board::new();
        board.set_piece(Square::from_algebraic("d8").unwrap(), None);
        board.set_piece(Square::from_algebraic("e7").unwrap(), None);
        board.add_piece(3, 4, PieceKind::Pawn, Color::Black);
        board.add_piece(5, 3, PieceKind::Queen, Color::Black);
        let state = GameState::for_position(&board, Color::White);
        assert!(state.move_sequence.is_empty());
        assert!(book.candidates(&state).is_empty());
        assert!(book
            .book_move(&board, Color::White, &state, &mut StdRng::seed_from_u64(1))
            .is_none());

        // The initial position set up by hand is still in book
        let start = GameState::for_position(&Board::new(), Color::White);
        assert_eq!(book.candidates(&start).len(), 4);
    }

    #[test]
    fn test_unplayable_sequence_entry_falls_back_to_last_move() {
        let book = OpeningBook::new();
        let (board, side, mut state) = play(&["c2c4"]);
        // A sequence entry holding only White replies, with Black to move
        state.move_sequence = "e2e4e7e5".to_string();
        assert_eq!(book.candidates(&state), &["g1f3", "b1c3", "f2f4"]);

        let texts: Vec<String> = book
            .legal_candidates(&board, side, &state)
            .iter()
            .map(Move::to_coordinate)
            .collect();
        // Answered from the "c2c4" entry instead
        assert!(texts.contains(&"e7e5".to_string()));
        assert!(texts.contains(&"c7c5".to_string()));
    }

    #[test]
    fn test_out_of_book() {
        let book = OpeningBook::new();
        let (board, side, state) = play(&["a2a3", "h7h6"]);
        assert!(book.book_move(&board, side, &state, &mut StdRng::seed_from_u64(1)).is_none());
    }
}
