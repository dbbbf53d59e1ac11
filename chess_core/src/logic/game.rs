use crate::engine::Move;
use crate::logic::board::{Board, Color, Piece, PieceKind, Square};
use crate::logic::generator::MoveGenerator;
use crate::logic::rules::{
    apply_move, draw_reason, is_en_passant, is_in_check, validate_move, DrawReason, MoveError,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CastlingSide {
    KingSide,
    QueenSide,
}

impl CastlingSide {
    pub const fn rook_col(self) -> u8 {
        match self {
            Self::KingSide => 7,
            Self::QueenSide => 0,
        }
    }

    /// Where the rook lands: beside the king, on the side it came from.
    pub const fn rook_target_col(self) -> u8 {
        match self {
            Self::KingSide => 5,
            Self::QueenSide => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CastlingRights {
    pub white_king_side: bool,
    pub white_queen_side: bool,
    pub black_king_side: bool,
    pub black_queen_side: bool,
}

impl Default for CastlingRights {
    fn default() -> Self {
        Self::all()
    }
}

impl CastlingRights {
    pub const fn all() -> Self {
        Self {
            white_king_side: true,
            white_queen_side: true,
            black_king_side: true,
            black_queen_side: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            white_king_side: false,
            white_queen_side: false,
            black_king_side: false,
            black_queen_side: false,
        }
    }

    pub const fn allows(&self, color: Color, side: CastlingSide) -> bool {
        match (color, side) {
            (Color::White, CastlingSide::KingSide) => self.white_king_side,
            (Color::White, CastlingSide::QueenSide) => self.white_queen_side,
            (Color::Black, CastlingSide::KingSide) => self.black_king_side,
            (Color::Black, CastlingSide::QueenSide) => self.black_queen_side,
        }
    }

    pub fn revoke(&mut self, color: Color, side: CastlingSide) {
        let flag = match (color, side) {
            (Color::White, CastlingSide::KingSide) => &mut self.white_king_side,
            (Color::White, CastlingSide::QueenSide) => &mut self.white_queen_side,
            (Color::Black, CastlingSide::KingSide) => &mut self.black_king_side,
            (Color::Black, CastlingSide::QueenSide) => &mut self.black_queen_side,
        };
        *flag = false;
    }

    pub fn revoke_all(&mut self, color: Color) {
        self.revoke(color, CastlingSide::KingSide);
        self.revoke(color, CastlingSide::QueenSide);
    }

    /// FEN castling field, `-` when nothing is left.
    pub fn to_fen(&self) -> String {
        let mut s = String::new();
        if self.white_king_side {
            s.push('K');
        }
        if self.white_queen_side {
            s.push('Q');
        }
        if self.black_king_side {
            s.push('k');
        }
        if self.black_queen_side {
            s.push('q');
        }
        if s.is_empty() {
            s.push('-');
        }
        s
    }
}

/// Flags the rules need beyond piece placement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameState {
    pub castling: CastlingRights,
    pub half_moves: u32,
    pub full_moves: u32,
    pub last_move: Option<Move>,
    pub position_history: Vec<u64>,
    /// Coordinate notation of every move played, concatenated.
    pub move_sequence: String,
    /// The game began at the standard initial position, so `move_sequence`
    /// names a line the opening book can follow.
    #[serde(default)]
    pub from_start: bool,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    /// State for the standard starting position.
    #[must_use]
    pub fn new() -> Self {
        Self::for_position(&Board::new(), Color::White)
    }

    /// Fresh state whose history starts at `board` with `turn` to move.
    #[must_use]
    pub fn for_position(board: &Board, turn: Color) -> Self {
        Self {
            castling: CastlingRights::all(),
            half_moves: 0,
            full_moves: 1,
            last_move: None,
            position_history: vec![board.signature(turn)],
            move_sequence: String::new(),
            from_start: turn == Color::White && *board == Board::new(),
        }
    }

    /// Derives the state after `mv` was played, given the resulting board.
    #[must_use]
    pub fn advance(&self, board_after: &Board, mv: &Move, captured: bool) -> Self {
        let mut next = self.clone();
        let color = mv.piece.color;

        match mv.piece.kind {
            PieceKind::King => next.castling.revoke_all(color),
            PieceKind::Rook if mv.from.row == color.back_row() => {
                if let Some(side) = corner_side(mv.from) {
                    next.castling.revoke(color, side);
                }
            }
            _ => {}
        }
        if captured && mv.to.row == color.opposite().back_row() {
            if let Some(side) = corner_side(mv.to) {
                next.castling.revoke(color.opposite(), side);
            }
        }

        next.half_moves = if mv.piece.kind == PieceKind::Pawn || captured {
            0
        } else {
            self.half_moves + 1
        };
        if color == Color::Black {
            next.full_moves += 1;
        }
        next.last_move = Some(*mv);
        next.position_history
            .push(board_after.signature(color.opposite()));
        next.move_sequence.push_str(&mv.to_coordinate());
        next
    }
}

const fn corner_side(sq: Square) -> Option<CastlingSide> {
    match sq.col {
        0 => Some(CastlingSide::QueenSide),
        7 => Some(CastlingSide::KingSide),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Playing,
    Checkmate(Color), // Winner
    Draw(DrawReason),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRecord {
    pub mv: Move,
    pub captured: Option<Piece>,
    pub color: Color,
    /// Signature of the position the move was played from.
    pub hash: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Snapshot {
    board: Board,
    turn: Color,
    state: GameState,
    status: GameStatus,
}

/// A game in progress: board, side to move, rule state and undo history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub board: Board,
    pub turn: Color,
    pub state: GameState,
    pub status: GameStatus,
    pub history: Vec<MoveRecord>,
    snapshots: Vec<Snapshot>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    #[must_use]
    pub fn new() -> Self {
        Self::from_position(Board::new(), Color::White, GameState::new())
    }

    #[must_use]
    pub fn from_position(board: Board, turn: Color, state: GameState) -> Self {
        let mut game = Self {
            board,
            turn,
            state,
            status: GameStatus::Playing,
            history: Vec::new(),
            snapshots: Vec::new(),
        };
        game.update_status();
        game
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        MoveGenerator::new().generate_moves(&self.board, self.turn, &self.state)
    }

    /// The legal move between two squares, if any. Promotions default to a queen.
    pub fn find_move(&self, from: Square, to: Square) -> Option<Move> {
        self.legal_moves()
            .into_iter()
            .find(|m| m.from == from && m.to == to)
    }

    pub fn make_move(&mut self, mv: Move) -> Result<(), MoveError> {
        if self.status != GameStatus::Playing {
            return Err(MoveError::GameOver);
        }

        validate_move(&self.board, &mv, self.turn, &self.state)?;

        let hash = self.board.signature(self.turn);
        let (next_board, next_state) = apply_move(&self.board, &mv, &self.state);
        let captured = if is_en_passant(&self.board, &mv, &self.state) {
            self.board.get_piece(Square {
                row: mv.from.row,
                col: mv.to.col,
            })
        } else {
            self.board.get_piece(mv.to)
        };

        self.snapshots.push(Snapshot {
            board: self.board,
            turn: self.turn,
            state: self.state.clone(),
            status: self.status,
        });
        self.history.push(MoveRecord {
            mv,
            captured,
            color: self.turn,
            hash,
        });

        self.board = next_board;
        self.state = next_state;
        self.turn = self.turn.opposite();
        self.update_status();

        Ok(())
    }

    pub fn undo_move(&mut self) -> bool {
        let Some(snapshot) = self.snapshots.pop() else {
            return false;
        };
        self.history.pop();
        self.board = snapshot.board;
        self.turn = snapshot.turn;
        self.state = snapshot.state;
        self.status = snapshot.status;
        true
    }

    pub fn is_in_check(&self) -> bool {
        is_in_check(&self.board, self.turn)
    }

    fn update_status(&mut self) {
        let has_moves = MoveGenerator::new().has_legal_moves(&self.board, self.turn, &self.state);
        self.status = if !has_moves && is_in_check(&self.board, self.turn) {
            GameStatus::Checkmate(self.turn.opposite())
        } else if let Some(reason) = draw_reason(&self.board, self.turn, &self.state) {
            GameStatus::Draw(reason)
        } else {
            GameStatus::Playing
        };
    }
}
