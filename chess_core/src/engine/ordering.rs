use crate::engine::config::EngineConfig;
use crate::engine::learning::LearningLog;
use crate::engine::Move;
use crate::logic::board::{Board, Color, Piece, PieceKind, Square};
use crate::logic::eval_constants::{get_pst_value, LOW_VALUE_LIMIT};
use crate::logic::game::GameState;
use crate::logic::rules::{
    attackers_of, is_defended, is_en_passant, is_in_check, is_square_attacked, play_move,
};
use std::sync::Arc;

/// Learning data consulted while ordering: the log and the current position key.
pub type LearningHint<'a> = Option<(&'a LearningLog, u64)>;

/// Heuristic move ordering. Only changes the order in which moves are searched.
pub struct MoveOrderer {
    config: Arc<EngineConfig>,
}

impl MoveOrderer {
    pub const fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }

    /// Sorts `moves` best-first. The sort is stable, so ties keep generation order.
    pub fn order(
        &self,
        board: &Board,
        side: Color,
        state: &GameState,
        moves: &mut [Move],
        learning: LearningHint,
    ) {
        let in_check = is_in_check(board, side);
        let mut scored: Vec<(f64, Move)> = moves
            .iter()
            .map(|mv| (self.score_move(board, mv, side, state, in_check, learning), *mv))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        for (slot, (_, mv)) in moves.iter_mut().zip(scored) {
            *slot = mv;
        }
    }

    pub fn score_move(
        &self,
        board: &Board,
        mv: &Move,
        side: Color,
        state: &GameState,
        in_check: bool,
        learning: LearningHint,
    ) -> f64 {
        let cfg = &self.config;
        let enemy = side.opposite();
        let after = play_move(board, mv, state);
        let value = |kind: PieceKind| f64::from(cfg.exposure_value(kind));
        let mover = value(mv.piece.kind);
        let mut score = 0.0;

        if mv.promotion.is_some() || is_promotion(mv) {
            score += f64::from(cfg.order_promotion);
        }
        if is_in_check(&after, enemy) {
            score += f64::from(cfg.order_check);
        }

        if in_check {
            if mv.piece.kind == PieceKind::King {
                score += 1000.0;
            } else if mover <= f64::from(LOW_VALUE_LIMIT) {
                score += 800.0;
            } else {
                score -= 300.0;
            }
        }

        let victim = board.get_piece(mv.to).or_else(|| {
            is_en_passant(board, mv, state).then_some(Piece::new(PieceKind::Pawn, enemy))
        });
        if let Some(victim) = victim {
            score += f64::from(cfg.order_capture) + value(victim.kind) - mover;
            if !is_defended(board, mv.to) {
                score += 200.0;
            }
        }

        if !in_check {
            let attackers = attackers_of(board, mv.from, enemy);
            if !attackers.is_empty() && !is_square_attacked(&after, mv.to, enemy) {
                let low_attacker = attackers.iter().any(|(_, a)| value(a.kind) < mover);
                let escape = f64::from(cfg.order_escape);
                score += if mover >= 500.0 && low_attacker {
                    escape * 3.0
                } else if mv.piece.kind == PieceKind::Queen {
                    escape * 2.0
                } else {
                    escape
                };
            }
        }

        if !is_square_attacked(&after, mv.to, enemy) {
            score += f64::from(cfg.order_safety);
        }

        if protects_new_piece(board, &after, side)
            && !shields_harassed_major(&after, side, value)
        {
            let protection = f64::from(cfg.order_protection);
            let guards_king = after
                .king_square(side)
                .is_some_and(|king| is_defended(&after, king));
            if !guards_king {
                score += protection;
            } else if mover <= f64::from(LOW_VALUE_LIMIT) {
                score += protection * 1.5;
            } else {
                score -= 200.0;
            }
        }

        if mv.to.is_center() {
            score += f64::from(cfg.order_center);
        }

        if matches!(
            mv.piece.kind,
            PieceKind::Knight | PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen
        ) && mv.from.row == side.back_row()
            && mv.to.row != side.back_row()
        {
            score += f64::from(cfg.order_development);
        }

        if is_unsound_sacrifice(&after, mv, victim.map(|v| value(v.kind)), value) {
            score -= 500.0;
        }

        if let Some((log, key)) = learning {
            score += log.move_bias(key, mv) * 10.0;
        }

        score
    }
}

fn is_promotion(mv: &Move) -> bool {
    mv.piece.kind == PieceKind::Pawn && mv.to.row == mv.piece.color.promotion_row()
}

/// Some own piece other than the mover is defended after the move but was not before.
fn protects_new_piece(before: &Board, after: &Board, side: Color) -> bool {
    after.pieces_of(side).any(|(sq, _)| {
        before.get_piece(sq).is_some_and(|p| p.color == side)
            && !is_defended(before, sq)
            && is_defended(after, sq)
    })
}

/// A rook or queen is attacked by something cheaper yet defended after the move.
fn shields_harassed_major(after: &Board, side: Color, value: impl Fn(PieceKind) -> f64) -> bool {
    after.pieces_of(side).any(|(sq, piece)| {
        let own = value(piece.kind);
        own >= 500.0
            && piece.kind != PieceKind::King
            && attackers_of(after, sq, side.opposite())
                .iter()
                .any(|(_, a)| value(a.kind) < own)
            && is_defended(after, sq)
    })
}

/// Trading down, or stepping onto a square a cheaper enemy piece covers,
/// without any piece-square gain. Pawn moves never count.
fn is_unsound_sacrifice(
    after: &Board,
    mv: &Move,
    victim: Option<f64>,
    value: impl Fn(PieceKind) -> f64,
) -> bool {
    if mv.piece.kind == PieceKind::Pawn {
        return false;
    }
    let pst = |sq: Square| {
        get_pst_value(
            mv.piece.kind,
            mv.piece.color,
            usize::from(sq.row),
            usize::from(sq.col),
            false,
        )
    };
    if pst(mv.to) > pst(mv.from) {
        return false;
    }

    let mover = value(mv.piece.kind);
    if victim.is_some_and(|v| mover > v) {
        return true;
    }
    attackers_of(after, mv.to, mv.piece.color.opposite())
        .iter()
        .any(|(_, a)| value(a.kind) < mover)
}
