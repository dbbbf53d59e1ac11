//! FEN and coordinate-notation helpers.

use crate::engine::Move;
use crate::logic::board::{Board, Color, Piece, PieceKind, Square};
use crate::logic::game::{CastlingRights, GameState};
use crate::logic::generator::MoveGenerator;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotationError {
    #[error("FEN is missing the {0} field")]
    MissingField(&'static str),
    #[error("bad FEN placement: {0}")]
    BadPlacement(String),
    #[error("bad side to move: {0}")]
    BadSide(String),
    #[error("bad castling field: {0}")]
    BadCastling(String),
    #[error("bad move counter: {0}")]
    BadCounter(String),
    #[error("malformed coordinate move: {0}")]
    MalformedMove(String),
    #[error("illegal move in this position: {0}")]
    IllegalMove(String),
}

/// Full FEN line as sent to external engines. The en-passant field is always `-`.
pub fn to_fen(board: &Board, side: Color, state: &GameState) -> String {
    format!(
        "{} {} - {} {}",
        board.to_fen_string(side),
        state.castling.to_fen(),
        state.half_moves,
        state.full_moves
    )
}

/// Parses placement, side, castling and the two counters. The en-passant field is skipped.
pub fn parse_fen(fen: &str) -> Result<(Board, Color, GameState), NotationError> {
    let mut fields = fen.split_whitespace();
    let placement = fields.next().ok_or(NotationError::MissingField("placement"))?;
    let board = parse_placement(placement)?;

    let side = match fields.next() {
        None | Some("w") => Color::White,
        Some("b") => Color::Black,
        Some(other) => return Err(NotationError::BadSide(other.to_string())),
    };

    let mut state = GameState::for_position(&board, side);
    if let Some(castling) = fields.next() {
        state.castling = parse_castling(castling)?;
    }
    let _en_passant = fields.next();
    if let Some(half) = fields.next() {
        state.half_moves = half
            .parse()
            .map_err(|_| NotationError::BadCounter(half.to_string()))?;
    }
    if let Some(full) = fields.next() {
        state.full_moves = full
            .parse()
            .map_err(|_| NotationError::BadCounter(full.to_string()))?;
    }

    Ok((board, side, state))
}

fn parse_placement(placement: &str) -> Result<Board, NotationError> {
    let bad = || NotationError::BadPlacement(placement.to_string());
    let rows: Vec<&str> = placement.split('/').collect();
    if rows.len() != 8 {
        return Err(bad());
    }

    let mut board = Board::empty();
    for (r, row) in rows.iter().enumerate() {
        let mut col = 0usize;
        for c in row.chars() {
            if let Some(skip) = c.to_digit(10) {
                col += skip as usize;
            } else {
                let piece = Piece::from_fen_char(c).ok_or_else(bad)?;
                let sq = Square::new(r, col).ok_or_else(bad)?;
                board.set_piece(sq, Some(piece));
                col += 1;
            }
        }
        if col != 8 {
            return Err(bad());
        }
    }

    // The rules assume exactly one king per side
    for color in [Color::White, Color::Black] {
        let kings = board
            .pieces_of(color)
            .filter(|(_, p)| p.kind == PieceKind::King)
            .count();
        if kings != 1 {
            return Err(NotationError::BadPlacement(format!(
                "{placement} has {kings} {color:?} kings"
            )));
        }
    }
    Ok(board)
}

fn parse_castling(field: &str) -> Result<CastlingRights, NotationError> {
    let mut rights = CastlingRights::none();
    if field == "-" {
        return Ok(rights);
    }
    for c in field.chars() {
        match c {
            'K' => rights.white_king_side = true,
            'Q' => rights.white_queen_side = true,
            'k' => rights.black_king_side = true,
            'q' => rights.black_queen_side = true,
            _ => return Err(NotationError::BadCastling(field.to_string())),
        }
    }
    Ok(rights)
}

/// Splits `e7e8q` into squares and an optional promotion kind.
pub fn parse_coordinates(
    text: &str,
) -> Result<(Square, Square, Option<PieceKind>), NotationError> {
    let malformed = || NotationError::MalformedMove(text.to_string());
    if !text.is_ascii() || !(4..=5).contains(&text.len()) {
        return Err(malformed());
    }
    let from = text.get(0..2).and_then(Square::from_algebraic).ok_or_else(malformed)?;
    let to = text.get(2..4).and_then(Square::from_algebraic).ok_or_else(malformed)?;
    let promotion = match text.get(4..).and_then(|s| s.chars().next()) {
        None => None,
        Some(c) => Some(
            PieceKind::from_symbol(c)
                .filter(|k| k.is_promotion_target())
                .ok_or_else(malformed)?,
        ),
    };
    Ok((from, to, promotion))
}

/// Resolves coordinate notation against the legal moves of `side`.
pub fn parse_move(
    board: &Board,
    side: Color,
    state: &GameState,
    text: &str,
) -> Result<Move, NotationError> {
    let (from, to, promotion) = parse_coordinates(text)?;
    MoveGenerator::new()
        .generate_moves(board, side, state)
        .into_iter()
        .find(|m| m.from == from && m.to == to)
        .map(|m| match promotion {
            Some(kind) => m.with_promotion(kind),
            None => m,
        })
        .ok_or_else(|| NotationError::IllegalMove(text.to_string()))
}
