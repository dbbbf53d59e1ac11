//! Where the next move comes from: the built-in engine or an external UCI process.

use crate::engine::{Move, SearchLimit, SearchStats};
use crate::logic::board::{Board, Color};
use crate::logic::game::GameState;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use thiserror::Error;

pub mod local;
pub mod uci;

pub use local::LocalSource;
pub use uci::{ExternalSource, UciEngine, UciError};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const fn max_depth(self) -> u8 {
        match self {
            Self::Easy => 4,
            Self::Medium => 7,
            Self::Hard => 10,
        }
    }

    /// Thinking time in milliseconds; each request draws from this range.
    pub const fn think_time(self) -> RangeInclusive<u64> {
        match self {
            Self::Easy => 500..=1000,
            Self::Medium => 2000..=3000,
            Self::Hard => 4000..=6000,
        }
    }

    /// Matching level in [`UCI_LEVELS`].
    pub const fn uci_level(self) -> u8 {
        match self {
            Self::Easy => 2,
            Self::Medium => 5,
            Self::Hard => 8,
        }
    }

    pub fn search_limit<R: Rng + ?Sized>(self, rng: &mut R) -> SearchLimit {
        SearchLimit::DepthAndTime {
            depth: self.max_depth(),
            time_ms: rng.gen_range(self.think_time()),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown difficulty `{0}` (expected easy, medium or hard)")]
pub struct ParseDifficultyError(String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            _ => Err(ParseDifficultyError(s.to_string())),
        }
    }
}

/// Search parameters sent to an external engine for one strength level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UciLevel {
    pub level: u8,
    /// Value for `setoption name Skill Level`.
    pub skill: u8,
    pub time_ms: u64,
    pub min_depth: u8,
    pub max_depth: u8,
    /// Search by `go movetime` instead of a depth.
    pub movetime: bool,
}

const fn level(level: u8, skill: u8, time_ms: u64, min_depth: u8, max_depth: u8) -> UciLevel {
    UciLevel {
        level,
        skill,
        time_ms,
        min_depth,
        max_depth,
        movetime: false,
    }
}

pub const UCI_LEVELS: [UciLevel; 8] = [
    level(1, 0, 1000, 2, 3),
    level(2, 3, 1500, 3, 4),
    level(3, 6, 2000, 4, 5),
    level(4, 9, 2500, 5, 6),
    level(5, 12, 3000, 6, 8),
    level(6, 15, 3500, 8, 10),
    level(7, 18, 4500, 10, 12),
    UciLevel {
        level: 8,
        skill: 20,
        time_ms: 6000,
        min_depth: 0,
        max_depth: 0,
        movetime: true,
    },
];

impl UciLevel {
    /// Entry for `level`, clamped to 1..=8.
    pub fn for_level(level: u8) -> Self {
        let [weakest, ..] = UCI_LEVELS;
        let index = usize::from(level.clamp(1, 8) - 1);
        UCI_LEVELS.get(index).copied().unwrap_or(weakest)
    }

    pub fn go_command<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        if self.movetime {
            format!("go movetime {}", self.time_ms)
        } else {
            format!("go depth {}", rng.gen_range(self.min_depth..=self.max_depth))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveOrigin {
    Book,
    Search,
    Fallback,
    External,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveReply {
    pub mv: Move,
    pub origin: MoveOrigin,
    pub stats: Option<SearchStats>,
    /// Why the preferred source was not used, if it wasn't.
    pub diagnostic: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("{0:?} has no legal moves")]
    NoLegalMoves(Color),
}

pub enum MoveSource {
    Local(LocalSource),
    External(ExternalSource),
}

impl MoveSource {
    /// The next move for `side`. The returned move is always legal.
    pub async fn request_move(
        &mut self,
        board: &Board,
        side: Color,
        state: &GameState,
        difficulty: Difficulty,
    ) -> Result<MoveReply, SourceError> {
        match self {
            Self::Local(source) => source.request_move(board, side, state, difficulty).await,
            Self::External(source) => source.request_move(board, side, state, difficulty).await,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Local(_) => "local",
            Self::External(_) => "external",
        }
    }
}

fn random_move<R: Rng + ?Sized>(legal: &[Move], side: Color, rng: &mut R) -> Result<Move, SourceError> {
    legal
        .choose(rng)
        .copied()
        .ok_or(SourceError::NoLegalMoves(side))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_difficulty_is_ordered() {
        assert!(Difficulty::Easy < Difficulty::Medium);
        assert!(Difficulty::Medium < Difficulty::Hard);
        assert_eq!("HARD".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("impossible".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_search_limit_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            for _ in 0..20 {
                let limit = difficulty.search_limit(&mut rng);
                assert_eq!(limit.max_depth(), difficulty.max_depth());
                let time = limit.time_ms().unwrap();
                assert!(difficulty.think_time().contains(&time));
            }
        }
    }

    #[test]
    fn test_uci_levels() {
        let mut rng = StdRng::seed_from_u64(9);
        assert_eq!(UciLevel::for_level(0).level, 1);
        assert_eq!(UciLevel::for_level(12).level, 8);
        assert_eq!(UciLevel::for_level(5).skill, 12);
        assert_eq!(
            UciLevel::for_level(8).go_command(&mut rng),
            "go movetime 6000"
        );

        let go = UciLevel::for_level(Difficulty::Easy.uci_level()).go_command(&mut rng);
        assert!(go == "go depth 3" || go == "go depth 4", "{go}");
    }
}
