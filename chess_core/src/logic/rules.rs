use crate::engine::Move;
use crate::logic::board::{Board, Color, Piece, PieceKind, Square};
use crate::logic::game::{CastlingSide, GameState};
use crate::logic::generator::MoveGenerator;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    OutOfBounds,
    NoPieceAtSource,
    PieceMismatch,
    NotYourTurn,
    SameSquare,
    TargetOccupiedByFriendly,
    InvalidMovePattern,
    BlockedPath,
    InvalidPromotion,
    CastlingNotAllowed,
    CastlingThroughCheck,
    SelfCheck,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawReason {
    Stalemate,
    InsufficientMaterial,
    FiftyMoveRule,
    ThreefoldRepetition,
}

/// Checks if a move is fully legal, including castling safety and self-check prevention.
pub fn validate_move(
    board: &Board,
    mv: &Move,
    side: Color,
    state: &GameState,
) -> Result<(), MoveError> {
    // 1. Geometry, occupancy, castling rights
    validate_pseudo_legal(board, mv, side, state)?;

    // 2. Castling may not start in, pass through, or land on an attacked square
    if is_castling_move(mv) {
        validate_castling_safety(board, mv, side)?;
    }

    // 3. Simulate and look for self-check
    let next_board = play_move(board, mv, state);
    if is_in_check(&next_board, side) {
        return Err(MoveError::SelfCheck);
    }

    Ok(())
}

pub fn is_legal_move(board: &Board, mv: &Move, side: Color, state: &GameState) -> bool {
    validate_move(board, mv, side, state).is_ok()
}

/// Geometry-only layer: everything except the own-king safety filter.
pub fn is_pseudo_legal(board: &Board, mv: &Move, side: Color, state: &GameState) -> bool {
    validate_pseudo_legal(board, mv, side, state).is_ok()
}

pub fn validate_pseudo_legal(
    board: &Board,
    mv: &Move,
    side: Color,
    state: &GameState,
) -> Result<(), MoveError> {
    if !mv.from.is_valid() || !mv.to.is_valid() {
        return Err(MoveError::OutOfBounds);
    }
    if mv.from == mv.to {
        return Err(MoveError::SameSquare);
    }

    let piece = board.get_piece(mv.from).ok_or(MoveError::NoPieceAtSource)?;
    if piece != mv.piece {
        return Err(MoveError::PieceMismatch);
    }
    if piece.color != side {
        return Err(MoveError::NotYourTurn);
    }

    if let Some(target) = board.get_piece(mv.to) {
        if target.color == side {
            return Err(MoveError::TargetOccupiedByFriendly);
        }
        // Kings are never captured; a position where that is possible is already over.
        if target.kind == PieceKind::King {
            return Err(MoveError::InvalidMovePattern);
        }
    }

    validate_promotion(mv)?;
    validate_piece_logic(board, mv, piece, state)
}

fn validate_promotion(mv: &Move) -> Result<(), MoveError> {
    let reaches_last_rank =
        mv.piece.kind == PieceKind::Pawn && mv.to.row == mv.piece.color.promotion_row();
    match mv.promotion {
        None => Ok(()),
        Some(kind) if reaches_last_rank && kind.is_promotion_target() => Ok(()),
        Some(_) => Err(MoveError::InvalidPromotion),
    }
}

fn deltas(from: Square, to: Square) -> (i8, i8) {
    #[allow(clippy::cast_possible_wrap)]
    let d_row = to.row as i8 - from.row as i8;
    #[allow(clippy::cast_possible_wrap)]
    let d_col = to.col as i8 - from.col as i8;
    (d_row, d_col)
}

fn validate_piece_logic(
    board: &Board,
    mv: &Move,
    piece: Piece,
    state: &GameState,
) -> Result<(), MoveError> {
    let (d_row, d_col) = deltas(mv.from, mv.to);
    match piece.kind {
        PieceKind::Pawn => validate_pawn(board, mv, piece.color, state),
        PieceKind::Knight => {
            if is_knight_jump(d_row, d_col) {
                Ok(())
            } else {
                Err(MoveError::InvalidMovePattern)
            }
        }
        PieceKind::Bishop => {
            if d_row.abs() != d_col.abs() {
                return Err(MoveError::InvalidMovePattern);
            }
            validate_path(board, mv.from, mv.to)
        }
        PieceKind::Rook => {
            if d_row != 0 && d_col != 0 {
                return Err(MoveError::InvalidMovePattern);
            }
            validate_path(board, mv.from, mv.to)
        }
        PieceKind::Queen => {
            if d_row != 0 && d_col != 0 && d_row.abs() != d_col.abs() {
                return Err(MoveError::InvalidMovePattern);
            }
            validate_path(board, mv.from, mv.to)
        }
        PieceKind::King => {
            if d_row.abs() <= 1 && d_col.abs() <= 1 {
                Ok(())
            } else if is_castling_move(mv) {
                validate_castling_rights(board, mv, piece.color, state)
            } else {
                Err(MoveError::InvalidMovePattern)
            }
        }
    }
}

const fn is_knight_jump(d_row: i8, d_col: i8) -> bool {
    matches!(
        (d_row.abs(), d_col.abs()),
        (1, 2) | (2, 1)
    )
}

fn validate_pawn(
    board: &Board,
    mv: &Move,
    color: Color,
    state: &GameState,
) -> Result<(), MoveError> {
    let (d_row, d_col) = deltas(mv.from, mv.to);
    let dir = color.pawn_direction();

    if d_col == 0 {
        if !board.is_empty(mv.to) {
            return Err(MoveError::BlockedPath);
        }
        if d_row == dir {
            return Ok(());
        }
        if d_row == 2 * dir && mv.from.row == color.pawn_start_row() {
            let mid = mv.from.offset(dir, 0).ok_or(MoveError::OutOfBounds)?;
            if !board.is_empty(mid) {
                return Err(MoveError::BlockedPath);
            }
            return Ok(());
        }
        return Err(MoveError::InvalidMovePattern);
    }

    if d_col.abs() == 1 && d_row == dir {
        if board.get_piece(mv.to).is_some() {
            // Friendly targets were rejected earlier
            return Ok(());
        }
        if is_en_passant(board, mv, state) {
            return Ok(());
        }
    }

    Err(MoveError::InvalidMovePattern)
}

/// Squares strictly between two aligned squares must be empty.
fn validate_path(board: &Board, from: Square, to: Square) -> Result<(), MoveError> {
    if is_path_clear(board, from, to) {
        Ok(())
    } else {
        Err(MoveError::BlockedPath)
    }
}

fn is_path_clear(board: &Board, from: Square, to: Square) -> bool {
    let (d_row, d_col) = deltas(from, to);
    let step = (d_row.signum(), d_col.signum());
    let mut current = from.offset(step.0, step.1);
    while let Some(sq) = current {
        if sq == to {
            return true;
        }
        if !board.is_empty(sq) {
            return false;
        }
        current = sq.offset(step.0, step.1);
    }
    false
}

/// A king stepping two files along its home rank.
pub fn is_castling_move(mv: &Move) -> bool {
    let color = mv.piece.color;
    mv.piece.kind == PieceKind::King
        && mv.from.row == color.back_row()
        && mv.from.col == 4
        && mv.to.row == mv.from.row
        && (mv.to.col == 2 || mv.to.col == 6)
}

const fn castling_side(mv: &Move) -> CastlingSide {
    if mv.to.col > mv.from.col {
        CastlingSide::KingSide
    } else {
        CastlingSide::QueenSide
    }
}

fn validate_castling_rights(
    board: &Board,
    mv: &Move,
    color: Color,
    state: &GameState,
) -> Result<(), MoveError> {
    let side = castling_side(mv);
    if !state.castling.allows(color, side) {
        return Err(MoveError::CastlingNotAllowed);
    }

    let rook_sq = Square {
        row: mv.from.row,
        col: side.rook_col(),
    };
    if board.get_piece(rook_sq) != Some(Piece::new(PieceKind::Rook, color)) {
        return Err(MoveError::CastlingNotAllowed);
    }

    validate_path(board, mv.from, rook_sq)
}

fn validate_castling_safety(board: &Board, mv: &Move, color: Color) -> Result<(), MoveError> {
    if is_in_check(board, color) {
        return Err(MoveError::CastlingThroughCheck);
    }
    let step = if mv.to.col > mv.from.col { 1 } else { -1 };
    let enemy = color.opposite();
    let mut current = mv.from.offset(0, step);
    while let Some(sq) = current {
        if is_square_attacked(board, sq, enemy) {
            return Err(MoveError::CastlingThroughCheck);
        }
        if sq == mv.to {
            break;
        }
        current = sq.offset(0, step);
    }
    Ok(())
}

/// Diagonal pawn step onto an empty square, licensed by the opponent's double step beside it.
pub fn is_en_passant(board: &Board, mv: &Move, state: &GameState) -> bool {
    if mv.piece.kind != PieceKind::Pawn || !board.is_empty(mv.to) {
        return false;
    }
    let (d_row, d_col) = deltas(mv.from, mv.to);
    if d_col.abs() != 1 || d_row != mv.piece.color.pawn_direction() {
        return false;
    }
    let Some(last) = state.last_move else {
        return false;
    };
    let victim_sq = Square {
        row: mv.from.row,
        col: mv.to.col,
    };
    last.piece.kind == PieceKind::Pawn
        && last.piece.color != mv.piece.color
        && last.from.row.abs_diff(last.to.row) == 2
        && last.to == victim_sq
        && board.get_piece(victim_sq) == Some(last.piece)
}

/// Whether the piece on `from` attacks `target`, by geometry alone.
/// The occupant of `target` is ignored, so this answers both "attacks" and "defends".
pub fn attacks_square(board: &Board, from: Square, target: Square) -> bool {
    let Some(piece) = board.get_piece(from) else {
        return false;
    };
    if from == target || !target.is_valid() {
        return false;
    }
    let (d_row, d_col) = deltas(from, target);
    match piece.kind {
        PieceKind::Pawn => d_row == piece.color.pawn_direction() && d_col.abs() == 1,
        PieceKind::Knight => is_knight_jump(d_row, d_col),
        PieceKind::Bishop => d_row.abs() == d_col.abs() && is_path_clear(board, from, target),
        PieceKind::Rook => (d_row == 0 || d_col == 0) && is_path_clear(board, from, target),
        PieceKind::Queen => {
            (d_row == 0 || d_col == 0 || d_row.abs() == d_col.abs())
                && is_path_clear(board, from, target)
        }
        PieceKind::King => d_row.abs() <= 1 && d_col.abs() <= 1,
    }
}

pub fn is_square_attacked(board: &Board, sq: Square, by: Color) -> bool {
    board
        .pieces_of(by)
        .any(|(from, _)| attacks_square(board, from, sq))
}

/// Pieces of `by` attacking `sq`, in row-major order.
pub fn attackers_of(board: &Board, sq: Square, by: Color) -> Vec<(Square, Piece)> {
    board
        .pieces_of(by)
        .filter(|&(from, _)| attacks_square(board, from, sq))
        .collect()
}

/// Whether some other piece of the occupant's color covers `sq`.
pub fn is_defended(board: &Board, sq: Square) -> bool {
    board
        .get_piece(sq)
        .is_some_and(|p| is_square_attacked(board, sq, p.color))
}

/// Checks if the `color` is currently in check.
pub fn is_in_check(board: &Board, color: Color) -> bool {
    let Some(king) = board.king_square(color) else {
        log::error!("no {color:?} king on the board:\n{board}");
        debug_assert!(false, "board without a {color:?} king");
        return false;
    };
    is_square_attacked(board, king, color.opposite())
}

pub fn is_checkmate(board: &Board, color: Color, state: &GameState) -> bool {
    is_in_check(board, color) && !MoveGenerator::new().has_legal_moves(board, color, state)
}

pub fn is_stalemate(board: &Board, color: Color, state: &GameState) -> bool {
    !is_in_check(board, color) && !MoveGenerator::new().has_legal_moves(board, color, state)
}

pub fn is_draw(board: &Board, side: Color, state: &GameState) -> bool {
    draw_reason(board, side, state).is_some()
}

pub fn draw_reason(board: &Board, side: Color, state: &GameState) -> Option<DrawReason> {
    if is_insufficient_material(board) {
        Some(DrawReason::InsufficientMaterial)
    } else if state.half_moves >= 100 {
        Some(DrawReason::FiftyMoveRule)
    } else if is_threefold_repetition(board, side, state) {
        Some(DrawReason::ThreefoldRepetition)
    } else if is_stalemate(board, side, state) {
        Some(DrawReason::Stalemate)
    } else {
        None
    }
}

/// K v K, or K v K plus a single bishop or knight.
pub fn is_insufficient_material(board: &Board) -> bool {
    let mut counts = [0usize; 2];
    for (_, piece) in board.pieces() {
        if !matches!(
            piece.kind,
            PieceKind::King | PieceKind::Bishop | PieceKind::Knight
        ) {
            return false;
        }
        if let Some(count) = counts.get_mut(piece.color.index()) {
            *count += 1;
        }
    }
    let [white, black] = counts;
    white <= 2 && black <= 2 && white + black <= 3
}

/// The position on `board` with `side` to move has occurred at least twice before.
pub fn is_threefold_repetition(board: &Board, side: Color, state: &GameState) -> bool {
    let current = board.signature(side);
    let history = &state.position_history;
    let mut occurrences = history.iter().filter(|&&h| h == current).count();
    if history.last() != Some(&current) {
        // History not yet updated with the current position
        occurrences += 1;
    }
    occurrences >= 3
}

/// Executes a move on a copy of the board and derives the follow-up state.
pub fn apply_move(board: &Board, mv: &Move, state: &GameState) -> (Board, GameState) {
    let (next_board, captured) = play(board, mv, state);
    let next_state = state.advance(&next_board, mv, captured.is_some());
    (next_board, next_state)
}

/// Board half of `apply_move`.
pub fn play_move(board: &Board, mv: &Move, state: &GameState) -> Board {
    play(board, mv, state).0
}

fn play(board: &Board, mv: &Move, state: &GameState) -> (Board, Option<Piece>) {
    let mut next = *board;
    let color = mv.piece.color;

    let captured = if is_castling_move(mv) {
        next.move_piece_quiet(mv.from, mv.to);
        let side = castling_side(mv);
        let rook_from = Square {
            row: mv.from.row,
            col: side.rook_col(),
        };
        let rook_to = Square {
            row: mv.from.row,
            col: side.rook_target_col(),
        };
        next.move_piece_quiet(rook_from, rook_to);
        None
    } else if is_en_passant(board, mv, state) {
        next.move_piece_quiet(mv.from, mv.to);
        let victim_sq = Square {
            row: mv.from.row,
            col: mv.to.col,
        };
        let victim = next.get_piece(victim_sq);
        next.set_piece(victim_sq, None);
        victim
    } else {
        next.move_piece_quiet(mv.from, mv.to)
    };

    if mv.piece.kind == PieceKind::Pawn && mv.to.row == color.promotion_row() {
        let kind = mv.promotion.unwrap_or(PieceKind::Queen);
        next.set_piece(mv.to, Some(Piece::new(kind, color)));
    }

    (next, captured)
}
