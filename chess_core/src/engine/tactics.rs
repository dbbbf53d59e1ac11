//! Tactical pattern scans used by the evaluator.
//!
//! Every scan is from the point of view of `side` looking at the opponent's
//! pieces and works on geometry only (`attacks_square`), so hypothetical
//! boards never need a full legality check.

use crate::engine::config::EngineConfig;
use crate::engine::Move;
use crate::logic::board::{Board, Color, Piece, PieceKind, Square};
use crate::logic::game::GameState;
use crate::logic::rules::{
    attackers_of, attacks_square, is_castling_move, is_defended, play_move,
};

/// Raw pattern sums before the tactic weights are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TacticalReport {
    pub fork: f64,
    pub pin: f64,
    pub skewer: f64,
    pub discovery: f64,
    pub double_attack: f64,
    pub removal_of_guard: f64,
    pub unprotected: f64,
}

impl TacticalReport {
    pub fn weighted(&self, config: &EngineConfig) -> f64 {
        self.fork * f64::from(config.tactic_fork)
            + self.pin * f64::from(config.tactic_pin)
            + self.skewer * f64::from(config.tactic_skewer)
            + self.discovery * f64::from(config.tactic_discovery)
            + self.double_attack * f64::from(config.tactic_double_attack)
            + self.removal_of_guard * f64::from(config.tactic_removal_of_guard)
            + self.unprotected * f64::from(config.tactic_unprotected)
    }
}

/// Runs every scan. `own_moves` must be the legal moves of `side` on `board`.
#[allow(clippy::cast_precision_loss)]
pub fn scan(
    board: &Board,
    side: Color,
    state: &GameState,
    own_moves: &[Move],
    config: &EngineConfig,
) -> TacticalReport {
    let value = |piece: Piece| f64::from(config.exposure_value(piece.kind));
    let mut report = TacticalReport::default();

    for mv in own_moves {
        let after = play_move(board, mv, state);
        report.fork += fork_value(&after, mv, side, value);
        report.skewer += skewer_value(&after, mv, side, value);
        if !is_castling_move(mv) {
            report.discovery += discovery_value(board, &after, mv, side, value);
        }
    }

    let enemy = side.opposite();
    for (sq, target) in board.pieces_of(enemy) {
        if target.kind != PieceKind::King && is_pinned(board, sq, enemy) {
            report.pin += value(target) / 200.0;
        }

        let attackers = attackers_of(board, sq, side);
        if attackers.len() >= 2 {
            report.double_attack += (attackers.len() - 1) as f64 * value(target) / 200.0;
        }

        for (guard_sq, guard) in attackers_of(board, sq, enemy) {
            if value(target) > value(guard) && !attackers_of(board, guard_sq, side).is_empty() {
                report.removal_of_guard += (value(target) - value(guard)) / 200.0;
            }
        }

        if !is_defended(board, sq) {
            for (_, attacker) in &attackers {
                let (t, a) = (value(target), value(*attacker));
                if t > a {
                    report.unprotected += (t - a) / 100.0;
                } else if (t - a).abs() < f64::EPSILON {
                    report.unprotected += t / 200.0;
                }
            }
        }
    }

    report
}

/// The moved piece attacks two or more enemy pieces from its new square.
fn fork_value(after: &Board, mv: &Move, side: Color, value: impl Fn(Piece) -> f64) -> f64 {
    let targets: Vec<Piece> = after
        .pieces_of(side.opposite())
        .filter(|&(sq, _)| attacks_square(after, mv.to, sq))
        .map(|(_, p)| p)
        .collect();
    if targets.len() >= 2 {
        targets.into_iter().map(value).sum::<f64>() / 100.0
    } else {
        0.0
    }
}

/// A slider checks the king and hits the first piece standing behind it on the same line.
fn skewer_value(after: &Board, mv: &Move, side: Color, value: impl Fn(Piece) -> f64) -> f64 {
    let Some(checker) = after.get_piece(mv.to) else {
        return 0.0;
    };
    let enemy = side.opposite();
    let Some(king) = after.king_square(enemy) else {
        return 0.0;
    };
    if !checker.kind.is_slider() || !attacks_square(after, mv.to, king) {
        return 0.0;
    }
    let step = direction(mv.to, king);
    first_piece_along(after, king, step)
        .filter(|(_, p)| p.color == enemy && p.kind != PieceKind::King)
        .map_or(0.0, |(_, p)| value(p))
        / 100.0
}

/// Attacks on enemy pieces by other own pieces that did not exist before the move.
fn discovery_value(
    before: &Board,
    after: &Board,
    mv: &Move,
    side: Color,
    value: impl Fn(Piece) -> f64,
) -> f64 {
    let mut total = 0.0;
    for (rear_sq, _) in after.pieces_of(side).filter(|&(sq, _)| sq != mv.to) {
        for (target_sq, target) in after.pieces_of(side.opposite()) {
            if attacks_square(after, rear_sq, target_sq)
                && !attacks_square(before, rear_sq, target_sq)
            {
                total += value(target);
            }
        }
    }
    total / 100.0
}

/// The piece on `sq` shields its own king from an enemy slider on the same line.
pub fn is_pinned(board: &Board, sq: Square, color: Color) -> bool {
    let Some(king) = board.king_square(color) else {
        return false;
    };
    if king == sq || !aligned(king, sq) {
        return false;
    }
    let step = direction(king, sq);
    // Nothing may stand between the king and the pinned piece
    if first_piece_along(board, king, step).map(|(s, _)| s) != Some(sq) {
        return false;
    }
    let diagonal = step.0 != 0 && step.1 != 0;
    first_piece_along(board, sq, step).is_some_and(|(_, p)| {
        p.color != color
            && match p.kind {
                PieceKind::Queen => true,
                PieceKind::Rook => !diagonal,
                PieceKind::Bishop => diagonal,
                _ => false,
            }
    })
}

fn aligned(a: Square, b: Square) -> bool {
    let d_row = i16::from(b.row) - i16::from(a.row);
    let d_col = i16::from(b.col) - i16::from(a.col);
    d_row == 0 || d_col == 0 || d_row.abs() == d_col.abs()
}

fn direction(from: Square, to: Square) -> (i8, i8) {
    let sign = |a: u8, b: u8| match b.cmp(&a) {
        std::cmp::Ordering::Greater => 1,
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
    };
    (sign(from.row, to.row), sign(from.col, to.col))
}

fn first_piece_along(board: &Board, start: Square, step: (i8, i8)) -> Option<(Square, Piece)> {
    let mut current = start.offset(step.0, step.1);
    while let Some(sq) = current {
        if let Some(piece) = board.get_piece(sq) {
            return Some((sq, piece));
        }
        current = sq.offset(step.0, step.1);
    }
    None
}
