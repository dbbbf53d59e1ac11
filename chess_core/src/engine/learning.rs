//! Experience log: which moves the engine played in which positions, and how
//! those games ended. Records lose half their weight every 30 days.

use crate::engine::Move;
use crate::logic::board::Square;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

pub const MAX_RECORDS_PER_POSITION: usize = 64;
pub const MAX_POSITIONS: usize = 4096;
const HALF_LIFE_MS: f64 = 30.0 * 24.0 * 60.0 * 60.0 * 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOutcome {
    Win,
    Loss,
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnedRecord {
    pub from: Square,
    pub to: Square,
    pub timestamp_ms: u64,
    /// `None` until the game is over.
    pub success: Option<bool>,
}

/// Decayed usage of one move in one position.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveExperience {
    pub count: f64,
    pub successes: f64,
}

impl MoveExperience {
    pub fn rate(&self) -> f64 {
        if self.count > 0.0 {
            self.successes / self.count
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningLog {
    positions: HashMap<u64, Vec<LearnedRecord>>,
    /// Insertion order of position keys, oldest first.
    order: VecDeque<u64>,
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub total_moves: u64,
}

impl LearningLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn records(&self, key: u64) -> &[LearnedRecord] {
        self.positions.get(&key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn record_move(&mut self, key: u64, mv: &Move) {
        self.record_move_at(key, mv, now_ms());
    }

    pub fn record_move_at(&mut self, key: u64, mv: &Move, now_ms: u64) {
        if !self.positions.contains_key(&key) {
            while self.positions.len() >= MAX_POSITIONS {
                let Some(oldest) = self.order.pop_front() else {
                    break;
                };
                self.positions.remove(&oldest);
            }
            self.order.push_back(key);
        }

        let records = self.positions.entry(key).or_default();
        if records.len() >= MAX_RECORDS_PER_POSITION {
            records.remove(0);
        }
        records.push(LearnedRecord {
            from: mv.from,
            to: mv.to,
            timestamp_ms: now_ms,
            success: None,
        });
        self.total_moves += 1;
    }

    /// Resolves every pending record with the result of the finished game.
    pub fn learn_from_result(&mut self, outcome: GameOutcome) {
        self.games += 1;
        match outcome {
            GameOutcome::Win => self.wins += 1,
            GameOutcome::Loss => self.losses += 1,
            GameOutcome::Draw => self.draws += 1,
        }
        let success = outcome == GameOutcome::Win;
        for record in self.positions.values_mut().flatten() {
            if record.success.is_none() {
                record.success = Some(success);
            }
        }
        log::debug!(
            "learning: {outcome:?} recorded, {} positions known",
            self.positions.len()
        );
    }

    pub fn experience_at(&self, key: u64, mv: &Move, now_ms: u64) -> MoveExperience {
        let mut exp = MoveExperience::default();
        for record in self.records(key) {
            if record.from != mv.from || record.to != mv.to {
                continue;
            }
            let w = decay(record.timestamp_ms, now_ms);
            exp.count += w;
            if record.success == Some(true) {
                exp.successes += w;
            }
        }
        exp
    }

    /// Best remembered move among `legal`, if it has won more often than not.
    pub fn learned_move(&self, key: u64, legal: &[Move]) -> Option<Move> {
        self.learned_move_at(key, legal, now_ms())
    }

    pub fn learned_move_at(&self, key: u64, legal: &[Move], now_ms: u64) -> Option<Move> {
        let mut best: Option<(f64, Move, MoveExperience)> = None;
        for mv in legal {
            let exp = self.experience_at(key, mv, now_ms);
            if exp.count <= 0.0 {
                continue;
            }
            let score = exp.count * 0.3 + exp.rate() * 0.7;
            if best.map_or(true, |(s, _, _)| score > s) {
                best = Some((score, *mv, exp));
            }
        }
        best.filter(|(_, _, exp)| exp.rate() > 0.5).map(|(_, mv, _)| mv)
    }

    /// Ordering bias for `mv`. Negative for moves that keep losing.
    pub fn move_bias(&self, key: u64, mv: &Move) -> f64 {
        self.move_bias_at(key, mv, now_ms())
    }

    pub fn move_bias_at(&self, key: u64, mv: &Move, now_ms: u64) -> f64 {
        let exp = self.experience_at(key, mv, now_ms);
        let rate = exp.rate();
        if rate < 0.3 && exp.count > 2.0 {
            -1.0
        } else if rate < 0.5 {
            exp.count * 0.1 + exp.successes * 0.3
        } else {
            exp.count * 0.3 + exp.successes * 0.7
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[allow(clippy::cast_precision_loss)]
fn decay(timestamp_ms: u64, now_ms: u64) -> f64 {
    let age = now_ms.saturating_sub(timestamp_ms) as f64;
    0.5_f64.powf(age / HALF_LIFE_MS)
}

#[allow(clippy::cast_possible_truncation)]
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}
