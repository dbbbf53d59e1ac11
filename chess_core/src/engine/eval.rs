use crate::engine::config::EngineConfig;
use crate::engine::tactics::{self, TacticalReport};
use crate::engine::{Evaluator, Move, Score};
use crate::logic::board::{Board, Color, Piece, PieceKind, Square};
use crate::logic::eval_constants::{
    get_piece_value, get_pst_value, ENDGAME_MAJOR_MATERIAL, LOW_VALUE_LIMIT,
};
use crate::logic::game::GameState;
use crate::logic::generator::MoveGenerator;
use crate::logic::rules::{attackers_of, attacks_square, is_defended, is_in_check, play_move};
use serde::Serialize;
use std::sync::Arc;

/// Unweighted sub-scores of one evaluation, all from the perspective of one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EvalBreakdown {
    pub material: f64,
    pub position: f64,
    pub mobility: f64,
    pub king_safety: f64,
    pub queen_safety: f64,
    pub center: f64,
    pub pawn_structure: f64,
    pub coordination: f64,
    /// Already multiplied by the individual tactic weights.
    pub tactics: f64,
    pub piece_safety: f64,
    pub future_threats: f64,
}

impl EvalBreakdown {
    pub fn total(&self, config: &EngineConfig) -> Score {
        self.material * config.weight_material
            + self.position * config.weight_position
            + self.mobility * config.weight_mobility
            + self.king_safety * config.weight_king_safety
            + self.queen_safety * config.weight_queen_safety
            + self.center * config.weight_center
            + self.pawn_structure * config.weight_pawn_structure
            + self.coordination * config.weight_coordination
            + self.tactics * config.weight_tactics
            + self.piece_safety * config.weight_piece_safety
            + self.future_threats * config.weight_future_threats
    }
}

/// Per-evaluation data shared by the sub-scores. Move lists are generated once.
struct EvalContext<'a> {
    board: &'a Board,
    state: &'a GameState,
    side: Color,
    enemy: Color,
    own_moves: Vec<Move>,
    enemy_moves: Vec<Move>,
}

impl<'a> EvalContext<'a> {
    fn new(board: &'a Board, side: Color, state: &'a GameState) -> Self {
        let generator = MoveGenerator::new();
        Self {
            board,
            state,
            side,
            enemy: side.opposite(),
            own_moves: generator.generate_moves(board, side, state),
            enemy_moves: generator.generate_moves(board, side.opposite(), state),
        }
    }

    /// +1 for `side`, -1 for the opponent.
    fn sign(&self, color: Color) -> f64 {
        if color == self.side {
            1.0
        } else {
            -1.0
        }
    }
}

pub struct HeuristicEvaluator {
    config: Arc<EngineConfig>,
}

impl HeuristicEvaluator {
    pub const fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn breakdown(&self, board: &Board, side: Color, state: &GameState) -> EvalBreakdown {
        let ctx = EvalContext::new(board, side, state);
        let report: TacticalReport =
            tactics::scan(board, side, state, &ctx.own_moves, &self.config);

        EvalBreakdown {
            material: self.material(&ctx),
            position: Self::position(&ctx),
            mobility: Self::mobility(&ctx),
            king_safety: self.king_safety(&ctx),
            queen_safety: self.queen_safety(&ctx),
            center: Self::center(&ctx),
            pawn_structure: Self::pawn_structure(&ctx),
            coordination: Self::coordination(&ctx),
            tactics: report.weighted(&self.config),
            piece_safety: self.piece_safety(&ctx),
            future_threats: self.future_threats(&ctx),
        }
    }

    fn value(&self, piece: Piece) -> f64 {
        f64::from(self.config.piece_value(piece.kind))
    }

    fn exposure(&self, piece: Piece) -> f64 {
        f64::from(self.config.exposure_value(piece.kind))
    }

    fn material(&self, ctx: &EvalContext) -> f64 {
        ctx.board
            .pieces()
            .map(|(_, p)| ctx.sign(p.color) * self.value(p))
            .sum()
    }

    fn position(ctx: &EvalContext) -> f64 {
        let majors: i32 = ctx
            .board
            .pieces()
            .filter(|(_, p)| matches!(p.kind, PieceKind::Queen | PieceKind::Rook))
            .map(|(_, p)| get_piece_value(p.kind))
            .sum();
        let endgame = majors < ENDGAME_MAJOR_MATERIAL;

        ctx.board
            .pieces()
            .map(|(sq, p)| {
                let pst = get_pst_value(
                    p.kind,
                    p.color,
                    usize::from(sq.row),
                    usize::from(sq.col),
                    endgame,
                );
                ctx.sign(p.color) * f64::from(pst)
            })
            .sum()
    }

    #[allow(clippy::cast_precision_loss)]
    fn mobility(ctx: &EvalContext) -> f64 {
        (ctx.own_moves.len() as f64 - ctx.enemy_moves.len() as f64) * 0.1
    }

    #[allow(clippy::cast_precision_loss)]
    fn king_safety(&self, ctx: &EvalContext) -> f64 {
        let mut score = 0.0;
        if is_in_check(ctx.board, ctx.side) {
            score -= 10.0;
        }
        if is_in_check(ctx.board, ctx.enemy) {
            score += 5.0;
        }

        let Some(king) = ctx.board.king_square(ctx.side) else {
            return score;
        };

        let mut neighbours = 0;
        for sq in king.neighbors() {
            if let Some(p) = ctx.board.get_piece(sq).filter(|p| p.color == ctx.side) {
                neighbours += 1;
                if self.config.piece_value(p.kind) <= LOW_VALUE_LIMIT {
                    score += 0.5;
                } else {
                    score -= 0.8;
                }
            }
        }

        let pressing = ctx
            .board
            .pieces_of(ctx.enemy)
            .filter(|&(from, _)| king.neighbors().any(|sq| attacks_square(ctx.board, from, sq)))
            .count();
        score -= 3.0 * pressing as f64;

        if king.is_edge() || neighbours >= 2 {
            score += 3.0;
        }
        score
    }

    #[allow(clippy::cast_precision_loss)]
    fn queen_safety(&self, ctx: &EvalContext) -> f64 {
        let mut score = 0.0;
        let queens: Vec<(Square, Piece)> = ctx
            .board
            .pieces_of(ctx.side)
            .filter(|(_, p)| p.kind == PieceKind::Queen)
            .collect();

        for (sq, queen) in queens {
            let attackers = attackers_of(ctx.board, sq, ctx.enemy);
            if !attackers.is_empty() {
                score -= 8.0;
                score -= 10.0
                    * attackers
                        .iter()
                        .filter(|(_, p)| p.kind == PieceKind::Pawn)
                        .count() as f64;
            }

            let central = (2..=5).contains(&sq.row) && (2..=5).contains(&sq.col);
            if central || attackers.is_empty() {
                score += 3.0;
            }

            // Opponent replies that bring a cheaper piece onto the queen
            let queen_value = self.value(queen);
            for mv in &ctx.enemy_moves {
                if mv.to == sq {
                    continue;
                }
                let after = play_move(ctx.board, mv, ctx.state);
                let harasser = after.get_piece(mv.to);
                if harasser.is_some_and(|h| self.value(h) < queen_value)
                    && attacks_square(&after, mv.to, sq)
                {
                    score -= 4.0;
                }
            }
        }
        score
    }

    #[allow(clippy::cast_precision_loss)]
    fn center(ctx: &EvalContext) -> f64 {
        let occupancy: f64 = Square::all()
            .filter(|sq| sq.is_center())
            .filter_map(|sq| ctx.board.get_piece(sq))
            .map(|p| ctx.sign(p.color))
            .sum();
        let reach = ctx.own_moves.iter().filter(|m| m.to.is_center()).count();
        occupancy + 0.2 * reach as f64
    }

    fn pawn_structure(ctx: &EvalContext) -> f64 {
        let mut files = [[0u32; 8]; 2];
        for (sq, p) in ctx.board.pieces() {
            if p.kind == PieceKind::Pawn {
                if let Some(count) = files
                    .get_mut(p.color.index())
                    .and_then(|f| f.get_mut(usize::from(sq.col)))
                {
                    *count += 1;
                }
            }
        }

        let mut score = 0.0;
        for color in [ctx.side, ctx.enemy] {
            let Some(counts) = files.get(color.index()) else {
                continue;
            };
            let mut penalty = 0.0;
            for (col, &count) in counts.iter().enumerate() {
                if count > 1 {
                    penalty += 0.5 * f64::from(count - 1);
                }
                let left = col.checked_sub(1).and_then(|c| counts.get(c)).copied();
                let right = counts.get(col + 1).copied();
                if count > 0 && left.unwrap_or(0) == 0 && right.unwrap_or(0) == 0 {
                    penalty += 0.3 * f64::from(count);
                }
            }
            score -= ctx.sign(color) * penalty;
        }
        score
    }

    fn coordination(ctx: &EvalContext) -> f64 {
        let mut score = 0.0;
        for color in [ctx.side, ctx.enemy] {
            let pieces: Vec<(Square, Piece)> = ctx.board.pieces_of(color).collect();
            let mut pair_score = 0.0;
            for (i, (a_sq, a)) in pieces.iter().enumerate() {
                for (b_sq, b) in pieces.iter().skip(i + 1) {
                    let distance = euclidean(*a_sq, *b_sq);
                    if (2.0..=4.0).contains(&distance) {
                        pair_score += 0.5;
                    }
                    if is_pair(a.kind, b.kind, PieceKind::Knight, PieceKind::Bishop) {
                        pair_score += 1.0;
                    }
                    if is_pair(a.kind, b.kind, PieceKind::Rook, PieceKind::Queen) {
                        pair_score += 1.5;
                    }
                }
            }
            score += ctx.sign(color) * pair_score;
        }
        score
    }

    fn piece_safety(&self, ctx: &EvalContext) -> f64 {
        let mut score = 0.0;
        for (sq, piece) in ctx.board.pieces_of(ctx.side) {
            let value = self.exposure(piece);

            if piece.kind != PieceKind::King {
                let attackers = attackers_of(ctx.board, sq, ctx.enemy);
                if !attackers.is_empty() {
                    let low_attacker = attackers.iter().any(|(_, a)| self.exposure(*a) < value);
                    let multiplier = if low_attacker {
                        0.8
                    } else if piece.kind == PieceKind::Queen {
                        0.6
                    } else {
                        0.3
                    };
                    score -= value * multiplier;

                    if !low_attacker && piece.kind != PieceKind::Queen && is_defended(ctx.board, sq)
                    {
                        score += value * 0.2;
                    }
                }
            }

            let escorts = sq
                .neighbors()
                .filter(|n| ctx.board.get_piece(*n).is_some_and(|p| p.color == ctx.side))
                .count();
            let sheltered = match piece.kind {
                PieceKind::Queen | PieceKind::Rook => escorts >= 1,
                PieceKind::King => escorts >= 2,
                _ => false,
            };
            if sheltered {
                score += value * 0.1;
            }
        }
        score
    }

    fn future_threats(&self, ctx: &EvalContext) -> f64 {
        let mut score = 0.0;
        for (sq, piece) in ctx.board.pieces() {
            let attacker = piece.color.opposite();
            if attackers_of(ctx.board, sq, attacker).is_empty() {
                continue;
            }
            if piece.color == ctx.side {
                score -= self.exposure(piece) * 0.2;
            } else {
                score += self.exposure(piece) * 0.15;
            }
        }
        score
    }
}

impl Evaluator for HeuristicEvaluator {
    fn evaluate(&self, board: &Board, side: Color, state: &GameState) -> Score {
        self.breakdown(board, side, state).total(&self.config)
    }
}

fn euclidean(a: Square, b: Square) -> f64 {
    let d_row = f64::from(a.row) - f64::from(b.row);
    let d_col = f64::from(a.col) - f64::from(b.col);
    d_row.hypot(d_col)
}

fn is_pair(a: PieceKind, b: PieceKind, x: PieceKind, y: PieceKind) -> bool {
    (a == x && b == y) || (a == y && b == x)
}
