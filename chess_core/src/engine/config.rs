use crate::engine::MATE_SCORE;
use crate::logic::board::PieceKind;
use crate::logic::eval_constants::{
    VAL_BISHOP, VAL_KING, VAL_KNIGHT, VAL_PAWN, VAL_QUEEN, VAL_ROOK,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // Piece Values
    pub val_pawn: i32,
    pub val_knight: i32,
    pub val_bishop: i32,
    pub val_rook: i32,
    pub val_queen: i32,
    pub val_king: i32,

    // Evaluation Weights
    pub weight_material: f64,
    pub weight_position: f64,
    pub weight_mobility: f64,
    pub weight_king_safety: f64,
    pub weight_queen_safety: f64,
    pub weight_center: f64,
    pub weight_pawn_structure: f64,
    pub weight_coordination: f64,
    pub weight_tactics: f64,
    pub weight_piece_safety: f64,
    pub weight_future_threats: f64,

    // Tactical Pattern Weights
    pub tactic_fork: i32,
    pub tactic_pin: i32,
    pub tactic_skewer: i32,
    pub tactic_discovery: i32,
    pub tactic_double_attack: i32,
    pub tactic_removal_of_guard: i32,
    pub tactic_unprotected: i32,

    // Move Ordering
    pub order_capture: i32,
    pub order_promotion: i32,
    pub order_check: i32,
    pub order_safety: i32,
    pub order_center: i32,
    pub order_development: i32,
    pub order_protection: i32,
    pub order_escape: i32,

    // Search Parameters
    pub cache_size: usize,
    pub null_move_pruning: bool,
    pub null_move_reduction: u8,
    pub winning_score: f64,
    pub time_fraction: f64, // Share of the budget before iterative deepening stops
    pub opening_book: bool,
    pub book_max_full_moves: u32,
    pub learning: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            val_pawn: VAL_PAWN,
            val_knight: VAL_KNIGHT,
            val_bishop: VAL_BISHOP,
            val_rook: VAL_ROOK,
            val_queen: VAL_QUEEN,
            val_king: VAL_KING,

            weight_material: 1.0,
            weight_position: 0.4,
            weight_mobility: 0.25,
            weight_king_safety: 0.8,
            weight_queen_safety: 0.8,
            weight_center: 0.35,
            weight_pawn_structure: 0.45,
            weight_coordination: 0.3,
            weight_tactics: 0.5,
            weight_piece_safety: 0.7,
            weight_future_threats: 0.4,

            tactic_fork: 60,
            tactic_pin: 50,
            tactic_skewer: 55,
            tactic_discovery: 45,
            tactic_double_attack: 40,
            tactic_removal_of_guard: 35,
            tactic_unprotected: 45,

            order_capture: 1000,
            order_promotion: 900,
            order_check: 800,
            order_safety: 750,
            order_center: 700,
            order_development: 600,
            order_protection: 650,
            order_escape: 600,

            cache_size: 1000,
            null_move_pruning: true,
            null_move_reduction: 3,
            // Any mate score, however deep
            winning_score: MATE_SCORE - f64::from(u8::MAX),
            time_fraction: 0.9,
            opening_book: true,
            book_max_full_moves: 10,
            learning: true,
        }
    }
}

#[derive(Deserialize)]
struct EngineConfigJson {
    val_pawn: Option<f32>,
    val_knight: Option<f32>,
    val_bishop: Option<f32>,
    val_rook: Option<f32>,
    val_queen: Option<f32>,
    val_king: Option<f32>,

    weight_material: Option<f64>,
    weight_position: Option<f64>,
    weight_mobility: Option<f64>,
    weight_king_safety: Option<f64>,
    weight_queen_safety: Option<f64>,
    weight_center: Option<f64>,
    weight_pawn_structure: Option<f64>,
    weight_coordination: Option<f64>,
    weight_tactics: Option<f64>,
    weight_piece_safety: Option<f64>,
    weight_future_threats: Option<f64>,

    tactic_fork: Option<f32>,
    tactic_pin: Option<f32>,
    tactic_skewer: Option<f32>,
    tactic_discovery: Option<f32>,
    tactic_double_attack: Option<f32>,
    tactic_removal_of_guard: Option<f32>,
    tactic_unprotected: Option<f32>,

    order_capture: Option<f32>,
    order_promotion: Option<f32>,
    order_check: Option<f32>,
    order_safety: Option<f32>,
    order_center: Option<f32>,
    order_development: Option<f32>,
    order_protection: Option<f32>,
    order_escape: Option<f32>,

    cache_size: Option<usize>,
    null_move_pruning: Option<bool>,
    null_move_reduction: Option<u8>,
    winning_score: Option<f64>,
    time_fraction: Option<f64>,
    opening_book: Option<bool>,
    book_max_full_moves: Option<u32>,
    learning: Option<bool>,
}

impl EngineConfig {
    /// Piece values, tactic weights and ordering weights are multipliers of the defaults;
    /// everything else is taken as given.
    pub fn load_from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        let j: EngineConfigJson = serde_json::from_str(json_str)?;
        let d = Self::default();

        Ok(Self {
            val_pawn: apply_scale(d.val_pawn, j.val_pawn),
            val_knight: apply_scale(d.val_knight, j.val_knight),
            val_bishop: apply_scale(d.val_bishop, j.val_bishop),
            val_rook: apply_scale(d.val_rook, j.val_rook),
            val_queen: apply_scale(d.val_queen, j.val_queen),
            val_king: apply_scale(d.val_king, j.val_king),

            weight_material: j.weight_material.unwrap_or(d.weight_material),
            weight_position: j.weight_position.unwrap_or(d.weight_position),
            weight_mobility: j.weight_mobility.unwrap_or(d.weight_mobility),
            weight_king_safety: j.weight_king_safety.unwrap_or(d.weight_king_safety),
            weight_queen_safety: j.weight_queen_safety.unwrap_or(d.weight_queen_safety),
            weight_center: j.weight_center.unwrap_or(d.weight_center),
            weight_pawn_structure: j.weight_pawn_structure.unwrap_or(d.weight_pawn_structure),
            weight_coordination: j.weight_coordination.unwrap_or(d.weight_coordination),
            weight_tactics: j.weight_tactics.unwrap_or(d.weight_tactics),
            weight_piece_safety: j.weight_piece_safety.unwrap_or(d.weight_piece_safety),
            weight_future_threats: j.weight_future_threats.unwrap_or(d.weight_future_threats),

            tactic_fork: apply_scale(d.tactic_fork, j.tactic_fork),
            tactic_pin: apply_scale(d.tactic_pin, j.tactic_pin),
            tactic_skewer: apply_scale(d.tactic_skewer, j.tactic_skewer),
            tactic_discovery: apply_scale(d.tactic_discovery, j.tactic_discovery),
            tactic_double_attack: apply_scale(d.tactic_double_attack, j.tactic_double_attack),
            tactic_removal_of_guard: apply_scale(
                d.tactic_removal_of_guard,
                j.tactic_removal_of_guard,
            ),
            tactic_unprotected: apply_scale(d.tactic_unprotected, j.tactic_unprotected),

            order_capture: apply_scale(d.order_capture, j.order_capture),
            order_promotion: apply_scale(d.order_promotion, j.order_promotion),
            order_check: apply_scale(d.order_check, j.order_check),
            order_safety: apply_scale(d.order_safety, j.order_safety),
            order_center: apply_scale(d.order_center, j.order_center),
            order_development: apply_scale(d.order_development, j.order_development),
            order_protection: apply_scale(d.order_protection, j.order_protection),
            order_escape: apply_scale(d.order_escape, j.order_escape),

            cache_size: j.cache_size.unwrap_or(d.cache_size),
            null_move_pruning: j.null_move_pruning.unwrap_or(d.null_move_pruning),
            null_move_reduction: j.null_move_reduction.unwrap_or(d.null_move_reduction),
            winning_score: j.winning_score.unwrap_or(d.winning_score),
            time_fraction: j.time_fraction.unwrap_or(d.time_fraction),
            opening_book: j.opening_book.unwrap_or(d.opening_book),
            book_max_full_moves: j.book_max_full_moves.unwrap_or(d.book_max_full_moves),
            learning: j.learning.unwrap_or(d.learning),
        })
    }

    pub const fn piece_value(&self, kind: PieceKind) -> i32 {
        match kind {
            PieceKind::Pawn => self.val_pawn,
            PieceKind::Knight => self.val_knight,
            PieceKind::Bishop => self.val_bishop,
            PieceKind::Rook => self.val_rook,
            PieceKind::Queen => self.val_queen,
            PieceKind::King => self.val_king,
        }
    }

    /// Value used when weighing threats and safety: the king counts as a queen.
    pub const fn exposure_value(&self, kind: PieceKind) -> i32 {
        match kind {
            PieceKind::King => self.val_queen,
            _ => self.piece_value(kind),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn apply_scale(default_val: i32, scale: Option<f32>) -> i32 {
    scale.map_or(default_val, |s| (default_val as f32 * s) as i32)
}
