use crate::engine::config::EngineConfig;
use crate::engine::learning::GameOutcome;
use crate::engine::search::AlphaBetaEngine;
use crate::engine::SearchLimit;
use crate::logic::board::{Board, Color};
use crate::logic::game::GameState;
use crate::logic::generator::MoveGenerator;
use crate::source::{Difficulty, MoveOrigin, MoveReply, SourceError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

/// The built-in engine. Yields to the runtime between search depths.
pub struct LocalSource {
    engine: AlphaBetaEngine,
    rng: StdRng,
}

impl LocalSource {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self {
            engine: AlphaBetaEngine::new(config),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(config: Arc<EngineConfig>, seed: u64) -> Self {
        Self {
            engine: AlphaBetaEngine::with_seed(config, seed),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub const fn engine(&self) -> &AlphaBetaEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut AlphaBetaEngine {
        &mut self.engine
    }

    pub fn learn_from_result(&mut self, outcome: GameOutcome) {
        self.engine.learn_from_result(outcome);
    }

    pub async fn request_move(
        &mut self,
        board: &Board,
        side: Color,
        state: &GameState,
        difficulty: Difficulty,
    ) -> Result<MoveReply, SourceError> {
        let limit = difficulty.search_limit(&mut self.rng);
        self.request_move_within(board, side, state, limit).await
    }

    /// Like [`Self::request_move`], with an explicit search limit.
    pub async fn request_move_within(
        &mut self,
        board: &Board,
        side: Color,
        state: &GameState,
        limit: SearchLimit,
    ) -> Result<MoveReply, SourceError> {
        if !MoveGenerator::new().has_legal_moves(board, side, state) {
            return Err(SourceError::NoLegalMoves(side));
        }

        let mut search = self.engine.start(board, side, state, limit);
        while self.engine.advance(&mut search) {
            tokio::task::yield_now().await;
        }

        let (mv, stats) = self
            .engine
            .finish(search)
            .ok_or(SourceError::NoLegalMoves(side))?;
        let origin = if stats.from_book {
            MoveOrigin::Book
        } else if stats.depth > 0 {
            MoveOrigin::Search
        } else {
            MoveOrigin::Fallback
        };
        let diagnostic = (origin == MoveOrigin::Fallback)
            .then(|| format!("no search depth completed within {limit:?}"));

        Ok(MoveReply {
            mv,
            origin,
            stats: Some(stats),
            diagnostic,
        })
    }
}
