use crate::engine::cache::{CacheKey, CacheStats, SearchCache};
use crate::engine::config::EngineConfig;
use crate::engine::eval::HeuristicEvaluator;
use crate::engine::learning::{GameOutcome, LearningLog};
use crate::engine::ordering::{LearningHint, MoveOrderer};
use crate::engine::{
    is_mate_score, Evaluator, Move, Score, SearchLimit, SearchStats, Searcher, MATE_SCORE,
};
use crate::logic::board::{Board, Color, PieceKind};
use crate::logic::game::GameState;
use crate::logic::generator::generate_legal_moves;
use crate::logic::opening::OpeningBook;
use crate::logic::rules::{apply_move, is_checkmate, is_draw, is_in_check, is_stalemate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::{Duration, Instant};

const PROMOTION_CHOICES: [PieceKind; 4] = [
    PieceKind::Queen,
    PieceKind::Rook,
    PieceKind::Bishop,
    PieceKind::Knight,
];

/// Outcome of the base cases every search node checks first.
enum Node {
    Leaf(Score),
    Expand(Vec<Move>),
}

/// An iterative-deepening search in progress, driven one depth at a time by
/// [`AlphaBetaEngine::advance`].
pub struct Deepening {
    board: Board,
    side: Color,
    state: GameState,
    max_depth: u8,
    budget_ms: Option<u64>,
    started: Instant,
    next_depth: u8,
    completed_depth: u8,
    best: Option<(Move, Score)>,
    from_book: bool,
    done: bool,
}

impl Deepening {
    pub const fn completed_depth(&self) -> u8 {
        self.completed_depth
    }

    pub const fn is_done(&self) -> bool {
        self.done
    }
}

pub struct AlphaBetaEngine {
    config: Arc<EngineConfig>,
    evaluator: HeuristicEvaluator,
    orderer: MoveOrderer,
    cache: SearchCache,
    book: OpeningBook,
    learning: LearningLog,
    nodes_searched: u64,
    deadline: Option<Instant>,
    rng: StdRng,
}

impl AlphaBetaEngine {
    pub fn new(config: Arc<EngineConfig>) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Engine whose book and fallback choices are reproducible.
    pub fn with_seed(config: Arc<EngineConfig>, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: Arc<EngineConfig>, rng: StdRng) -> Self {
        Self {
            evaluator: HeuristicEvaluator::new(config.clone()),
            orderer: MoveOrderer::new(config.clone()),
            cache: SearchCache::new(config.cache_size),
            book: OpeningBook::new(),
            learning: LearningLog::new(),
            nodes_searched: 0,
            deadline: None,
            rng,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn update_config(&mut self, config: Arc<EngineConfig>) {
        if config.cache_size != self.config.cache_size {
            self.cache = SearchCache::new(config.cache_size);
        }
        self.evaluator = HeuristicEvaluator::new(config.clone());
        self.orderer = MoveOrderer::new(config.clone());
        self.config = config;
    }

    /// Drops cached evaluations and move lists.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub const fn learning(&self) -> &LearningLog {
        &self.learning
    }

    pub fn replace_learning(&mut self, log: LearningLog) -> LearningLog {
        std::mem::replace(&mut self.learning, log)
    }

    /// Resolves the moves recorded during the game that just ended.
    pub fn learn_from_result(&mut self, outcome: GameOutcome) {
        self.learning.learn_from_result(outcome);
    }

    fn check_time(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Opens a search: consults the opening book and arms the deadline.
    pub fn start(
        &mut self,
        board: &Board,
        side: Color,
        state: &GameState,
        limit: SearchLimit,
    ) -> Deepening {
        let started = Instant::now();
        self.nodes_searched = 0;
        self.deadline = limit
            .time_ms()
            .map(|ms| started + Duration::from_millis(ms));

        let mut search = Deepening {
            board: *board,
            side,
            state: state.clone(),
            max_depth: limit.max_depth(),
            budget_ms: limit.time_ms(),
            started,
            next_depth: 1,
            completed_depth: 0,
            best: None,
            from_book: false,
            done: limit.max_depth() == 0,
        };

        if self.config.opening_book && state.full_moves <= self.config.book_max_full_moves {
            if let Some(mv) = self.book.book_move(board, side, state, &mut self.rng) {
                search.best = Some((mv, 0.0));
                search.from_book = true;
                search.done = true;
            }
        }
        search
    }

    /// Searches the next depth. Returns whether another iteration should follow.
    #[allow(clippy::cast_precision_loss)]
    pub fn advance(&mut self, search: &mut Deepening) -> bool {
        if search.done {
            return false;
        }

        let depth = search.next_depth;
        match self.alpha_beta(
            &search.board,
            depth,
            f64::NEG_INFINITY,
            f64::INFINITY,
            true,
            search.side,
            &search.state,
        ) {
            Some((score, Some(mv))) => {
                log::debug!(
                    "depth {depth}: {mv} score {score:.1}, {} nodes",
                    self.nodes_searched
                );
                search.best = Some((mv, score));
                search.completed_depth = depth;
                if score >= self.config.winning_score || depth >= search.max_depth {
                    search.done = true;
                }
            }
            // Terminal root: nothing to search
            Some((_, None)) => search.done = true,
            None => {
                log::debug!("depth {depth} interrupted after {} nodes", self.nodes_searched);
                search.done = true;
            }
        }

        if let Some(budget) = search.budget_ms {
            let elapsed = search.started.elapsed().as_millis() as f64;
            if elapsed >= budget as f64 * self.config.time_fraction {
                search.done = true;
            }
        }
        search.next_depth = depth.saturating_add(1);
        !search.done
    }

    /// Picks the final move: the deepest completed iteration, else the fallback.
    #[allow(clippy::cast_possible_truncation)]
    pub fn finish(&mut self, search: Deepening) -> Option<(Move, SearchStats)> {
        self.deadline = None;
        let (mv, score) = match search.best {
            Some(best) => best,
            None => (
                self.fallback_move(&search.board, search.side, &search.state)?,
                0.0,
            ),
        };
        let mv = self.with_promotion_choice(&search.board, &search.state, mv);

        if self.config.learning {
            self.learning
                .record_move(search.board.signature(search.side), &mv);
        }

        let cache = self.cache.stats();
        let stats = SearchStats {
            depth: search.completed_depth,
            nodes: self.nodes_searched,
            time_ms: search.started.elapsed().as_millis() as u64,
            score,
            cache_hits: cache.hits,
            cache_misses: cache.misses,
            from_book: search.from_book,
        };
        log::info!(
            "{:?} plays {mv} (depth {}, score {score:.1}, {} nodes, {} ms{})",
            search.side,
            stats.depth,
            stats.nodes,
            stats.time_ms,
            if stats.from_book { ", book" } else { "" }
        );
        Some((mv, stats))
    }

    /// A remembered winning move, else any legal move.
    fn fallback_move(&mut self, board: &Board, side: Color, state: &GameState) -> Option<Move> {
        let legal = self.legal_moves(board, side, state);
        if self.config.learning {
            if let Some(mv) = self.learning.learned_move(board.signature(side), &legal) {
                log::debug!("fallback: learned move {mv}");
                return Some(mv);
            }
        }
        let mv = legal.choose(&mut self.rng).copied();
        if let Some(mv) = mv {
            log::debug!("fallback: random move {mv}");
        }
        mv
    }

    fn with_promotion_choice(&self, board: &Board, state: &GameState, mv: Move) -> Move {
        let promotes = mv.piece.kind == PieceKind::Pawn
            && mv.to.row == mv.piece.color.promotion_row()
            && mv.promotion.is_none();
        if promotes {
            mv.with_promotion(self.choose_promotion_piece(board, &mv, state))
        } else {
            mv
        }
    }

    /// Scores each promotion piece by the position it leaves. Stalemating the
    /// opponent counts as a draw and a mating promotion wins outright.
    pub fn choose_promotion_piece(&self, board: &Board, mv: &Move, state: &GameState) -> PieceKind {
        let side = mv.piece.color;
        let enemy = side.opposite();
        let mut best = (PieceKind::Queen, f64::NEG_INFINITY);

        for kind in PROMOTION_CHOICES {
            let (after, next_state) = apply_move(board, &mv.with_promotion(kind), state);
            let stalemate = is_stalemate(&after, enemy, &next_state);
            let mut score = if is_checkmate(&after, enemy, &next_state) {
                MATE_SCORE + 100.0
            } else if stalemate {
                0.0
            } else {
                -self.evaluator.evaluate(&after, enemy, &next_state)
            };
            if kind != PieceKind::Queen && !stalemate {
                score += 10.0;
            }
            if !is_in_check(&after, enemy) {
                score += 5.0;
            }
            if score > best.1 {
                best = (kind, score);
            }
        }
        best.0
    }

    fn legal_moves(&mut self, board: &Board, side: Color, state: &GameState) -> Vec<Move> {
        let key = CacheKey::new(board, side, state);
        if let Some(moves) = self.cache.moves(&key) {
            return moves;
        }
        let moves = generate_legal_moves(board, side, state);
        self.cache.store_moves(key, moves.clone());
        moves
    }

    /// Static evaluation for `root`. The position is scored for the side to
    /// move, since only that side can play its tactics, then turned around
    /// when the opponent is to move.
    fn static_eval(
        &mut self,
        board: &Board,
        mover: Color,
        root: Color,
        state: &GameState,
    ) -> Score {
        let key = CacheKey::new(board, mover, state);
        let score = match self.cache.evaluation(&key) {
            Some(score) => score,
            None => {
                let score = self.evaluator.evaluate(board, mover, state);
                self.cache.store_evaluation(key, score);
                score
            }
        };
        if mover == root {
            score
        } else {
            -score
        }
    }

    /// Base cases in order: horizon, side to move mated, opponent mated, draw.
    /// Otherwise the legal moves, still in generation order.
    fn expand(
        &mut self,
        board: &Board,
        depth: u8,
        maximizing: bool,
        root: Color,
        state: &GameState,
    ) -> Node {
        let mover = if maximizing { root } else { root.opposite() };
        if depth == 0 {
            return Node::Leaf(self.static_eval(board, mover, root, state));
        }

        let mate = MATE_SCORE + f64::from(depth);
        let moves = self.legal_moves(board, mover, state);

        if moves.is_empty() && is_in_check(board, mover) {
            return Node::Leaf(if maximizing { -mate } else { mate });
        }
        let opponent = mover.opposite();
        if is_in_check(board, opponent) && is_checkmate(board, opponent, state) {
            return Node::Leaf(if maximizing { mate } else { -mate });
        }
        if moves.is_empty() || is_draw(board, mover, state) {
            return Node::Leaf(0.0);
        }
        Node::Expand(moves)
    }

    fn ordered(
        &self,
        board: &Board,
        mover: Color,
        state: &GameState,
        mut moves: Vec<Move>,
    ) -> Vec<Move> {
        let hint: LearningHint = self
            .config
            .learning
            .then(|| (&self.learning, board.signature(mover)));
        self.orderer.order(board, mover, state, &mut moves, hint);
        moves
    }

    /// Alpha-beta minimax. Scores are from `side`'s point of view and
    /// `maximizing` says whether `side` is the one to move.
    #[allow(clippy::too_many_arguments)]
    pub fn minimax(
        &mut self,
        board: &Board,
        depth: u8,
        alpha: Score,
        beta: Score,
        maximizing: bool,
        side: Color,
        state: &GameState,
    ) -> (Score, Option<Move>) {
        self.deadline = None;
        self.alpha_beta(board, depth, alpha, beta, maximizing, side, state)
            .unwrap_or((0.0, None))
    }

    /// `None` once the deadline has passed.
    #[allow(clippy::too_many_arguments)]
    fn alpha_beta(
        &mut self,
        board: &Board,
        depth: u8,
        mut alpha: Score,
        mut beta: Score,
        maximizing: bool,
        root: Color,
        state: &GameState,
    ) -> Option<(Score, Option<Move>)> {
        self.nodes_searched += 1;
        if self.check_time() {
            return None;
        }

        let moves = match self.expand(board, depth, maximizing, root, state) {
            Node::Leaf(score) => return Some((score, None)),
            Node::Expand(moves) => moves,
        };

        // Prune before paying for move ordering
        if self.null_move_cutoff(board, depth, alpha, beta, maximizing, root, state)? {
            return Some((if maximizing { beta } else { alpha }, None));
        }

        let mover = if maximizing { root } else { root.opposite() };
        let mut best: Option<(Score, Move)> = None;
        for mv in self.ordered(board, mover, state, moves) {
            let (next_board, next_state) = apply_move(board, &mv, state);
            let (score, _) = self.alpha_beta(
                &next_board,
                depth - 1,
                alpha,
                beta,
                !maximizing,
                root,
                &next_state,
            )?;
            if improves(best, score, maximizing) {
                best = Some((score, mv));
            }
            if maximizing {
                alpha = alpha.max(score);
            } else {
                beta = beta.min(score);
            }
            if beta <= alpha {
                break;
            }
        }
        Some(best.map_or((0.0, None), |(score, mv)| (score, Some(mv))))
    }

    /// Lets the side to move pass and searches the reply with a one-point window.
    /// A pass that still fails high (or low, when minimizing) prunes the node.
    #[allow(clippy::too_many_arguments)]
    fn null_move_cutoff(
        &mut self,
        board: &Board,
        depth: u8,
        alpha: Score,
        beta: Score,
        maximizing: bool,
        root: Color,
        state: &GameState,
    ) -> Option<bool> {
        let mover = if maximizing { root } else { root.opposite() };
        let bound = if maximizing { beta } else { alpha };
        if !self.config.null_move_pruning
            || depth < 3
            || is_mate_score(bound)
            || is_in_check(board, mover)
        {
            return Some(false);
        }

        let mut passed = state.clone();
        passed.last_move = None;
        let reduced = depth.saturating_sub(self.config.null_move_reduction);
        let (score, _) = if maximizing {
            self.alpha_beta(board, reduced, beta - 1.0, beta, false, root, &passed)?
        } else {
            self.alpha_beta(board, reduced, alpha, alpha + 1.0, true, root, &passed)?
        };
        Some(if maximizing {
            score >= beta
        } else {
            score <= alpha
        })
    }

    /// Plain minimax over the same ordered tree, without pruning or null moves.
    pub fn exhaustive_minimax(
        &mut self,
        board: &Board,
        depth: u8,
        maximizing: bool,
        side: Color,
        state: &GameState,
    ) -> (Score, Option<Move>) {
        self.nodes_searched += 1;
        let moves = match self.expand(board, depth, maximizing, side, state) {
            Node::Leaf(score) => return (score, None),
            Node::Expand(moves) => moves,
        };

        let mover = if maximizing { side } else { side.opposite() };
        let mut best: Option<(Score, Move)> = None;
        for mv in self.ordered(board, mover, state, moves) {
            let (next_board, next_state) = apply_move(board, &mv, state);
            let (score, _) =
                self.exhaustive_minimax(&next_board, depth - 1, !maximizing, side, &next_state);
            if improves(best, score, maximizing) {
                best = Some((score, mv));
            }
        }
        best.map_or((0.0, None), |(score, mv)| (score, Some(mv)))
    }
}

/// Strict comparison, so the first of equally good moves is kept.
fn improves(best: Option<(Score, Move)>, score: Score, maximizing: bool) -> bool {
    best.map_or(true, |(current, _)| {
        if maximizing {
            score > current
        } else {
            score < current
        }
    })
}

impl Searcher for AlphaBetaEngine {
    fn search(
        &mut self,
        board: &Board,
        side: Color,
        state: &GameState,
        limit: SearchLimit,
    ) -> Option<(Move, SearchStats)> {
        let mut search = self.start(board, side, state, limit);
        while self.advance(&mut search) {}
        self.finish(search)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::game::CastlingRights;
    use crate::logic::notation::parse_fen;
    use crate::logic::rules::is_legal_move;

    fn quiet_config() -> EngineConfig {
        EngineConfig {
            opening_book: false,
            learning: false,
            ..EngineConfig::default()
        }
    }

    fn engine(config: EngineConfig) -> AlphaBetaEngine {
        AlphaBetaEngine::with_seed(Arc::new(config), 42)
    }

    fn endgame_state(board: &Board, side: Color) -> GameState {
        let mut state = GameState::for_position(board, side);
        state.castling = CastlingRights::none();
        state
    }

    /// White: Ke2 Rd1 Pf4. Black: Ke7 Nc6 Pb5.
    fn small_endgame() -> Board {
        let mut board = Board::empty();
        board.add_piece(6, 4, PieceKind::King, Color::White);
        board.add_piece(7, 3, PieceKind::Rook, Color::White);
        board.add_piece(4, 5, PieceKind::Pawn, Color::White);
        board.add_piece(1, 4, PieceKind::King, Color::Black);
        board.add_piece(2, 2, PieceKind::Knight, Color::Black);
        board.add_piece(3, 1, PieceKind::Pawn, Color::Black);
        board
    }

    #[test]
    fn test_alpha_beta_matches_exhaustive_search() {
        let config = EngineConfig {
            null_move_pruning: false,
            ..quiet_config()
        };
        let board = small_endgame();

        for (side, depth) in [(Color::White, 3), (Color::Black, 2)] {
            let state = endgame_state(&board, side);
            let mut pruned = engine(config.clone());
            let mut full = engine(config.clone());

            let (score, mv) = pruned.minimax(
                &board,
                depth,
                f64::NEG_INFINITY,
                f64::INFINITY,
                true,
                side,
                &state,
            );
            let (expected_score, expected_mv) =
                full.exhaustive_minimax(&board, depth, true, side, &state);

            assert!((score - expected_score).abs() < 1e-9, "{side:?}: {score} vs {expected_score}");
            assert_eq!(mv, expected_mv);
            assert!(mv.is_some());
            assert!(pruned.nodes_searched < full.nodes_searched);
        }
    }

    #[test]
    fn test_finds_back_rank_mate() {
        // White: Kg1 Ra1. Black: Kh8 Pg7 Ph7.
        let mut board = Board::empty();
        board.add_piece(7, 6, PieceKind::King, Color::White);
        board.add_piece(7, 0, PieceKind::Rook, Color::White);
        board.add_piece(0, 7, PieceKind::King, Color::Black);
        board.add_piece(1, 6, PieceKind::Pawn, Color::Black);
        board.add_piece(1, 7, PieceKind::Pawn, Color::Black);
        let state = endgame_state(&board, Color::White);

        let mut engine = engine(quiet_config());
        let (mv, stats) = engine
            .search(&board, Color::White, &state, SearchLimit::Depth(3))
            .unwrap();
        assert_eq!(mv.to_coordinate(), "a1a8");
        assert!(is_mate_score(stats.score));
        // The mate is seen at depth 2, which stops the deepening
        assert_eq!(stats.depth, 2);
    }

    #[test]
    fn test_book_move_at_start() {
        let mut engine = engine(EngineConfig::default());
        let (mv, stats) = engine
            .search(&Board::new(), Color::White, &GameState::new(), SearchLimit::Depth(3))
            .unwrap();
        assert!(stats.from_book);
        assert_eq!(stats.nodes, 0);
        assert!(["e2e4", "d2d4", "c2c4", "g1f3"].contains(&mv.to_coordinate().as_str()));
    }

    #[test]
    fn test_time_limited_search_returns_a_legal_move() {
        let board = small_endgame();
        let state = endgame_state(&board, Color::White);
        let mut engine = engine(quiet_config());
        let (mv, stats) = engine
            .search(&board, Color::White, &state, SearchLimit::Time(50))
            .unwrap();
        assert!(is_legal_move(&board, &mv, Color::White, &state));
        assert!(stats.depth < 64);
    }

    #[test]
    fn test_no_move_when_mated() {
        let mut board = Board::empty();
        board.add_piece(0, 7, PieceKind::King, Color::Black);
        board.add_piece(1, 6, PieceKind::Pawn, Color::Black);
        board.add_piece(1, 7, PieceKind::Pawn, Color::Black);
        board.add_piece(0, 0, PieceKind::Rook, Color::White);
        board.add_piece(7, 6, PieceKind::King, Color::White);
        let state = endgame_state(&board, Color::Black);
        let mut engine = engine(quiet_config());
        assert!(engine
            .search(&board, Color::Black, &state, SearchLimit::Depth(2))
            .is_none());
    }

    #[test]
    fn test_underpromotion_when_the_knight_mates() {
        // Black: Kh7 Rh8 Bg8 Pg7 Pg6 Ph6. White: Ka1 Pf7. f8=N is mate, f8=Q is not check.
        let mut board = Board::empty();
        board.add_piece(1, 7, PieceKind::King, Color::Black);
        board.add_piece(0, 7, PieceKind::Rook, Color::Black);
        board.add_piece(0, 6, PieceKind::Bishop, Color::Black);
        board.add_piece(1, 6, PieceKind::Pawn, Color::Black);
        board.add_piece(2, 6, PieceKind::Pawn, Color::Black);
        board.add_piece(2, 7, PieceKind::Pawn, Color::Black);
        board.add_piece(7, 0, PieceKind::King, Color::White);
        board.add_piece(1, 5, PieceKind::Pawn, Color::White);
        let state = endgame_state(&board, Color::White);

        let engine = engine(quiet_config());
        let push = Move::new(
            crate::logic::board::Square { row: 1, col: 5 },
            crate::logic::board::Square { row: 0, col: 5 },
            crate::logic::board::Piece::new(PieceKind::Pawn, Color::White),
        );
        assert_eq!(
            engine.choose_promotion_piece(&board, &push, &state),
            PieceKind::Knight
        );
    }

    #[test]
    fn test_queen_is_the_default_promotion() {
        let mut board = Board::empty();
        board.add_piece(7, 4, PieceKind::King, Color::White);
        board.add_piece(1, 0, PieceKind::Pawn, Color::White);
        board.add_piece(3, 7, PieceKind::King, Color::Black);
        let state = endgame_state(&board, Color::White);

        let engine = engine(quiet_config());
        let push = Move::new(
            crate::logic::board::Square { row: 1, col: 0 },
            crate::logic::board::Square { row: 0, col: 0 },
            crate::logic::board::Piece::new(PieceKind::Pawn, Color::White),
        );
        assert_eq!(
            engine.choose_promotion_piece(&board, &push, &state),
            PieceKind::Queen
        );
    }

    #[test]
    fn test_learning_records_played_moves() {
        let config = EngineConfig {
            opening_book: false,
            ..EngineConfig::default()
        };
        let board = small_endgame();
        let state = endgame_state(&board, Color::White);
        let mut engine = engine(config);

        let (mv, _) = engine
            .search(&board, Color::White, &state, SearchLimit::Depth(1))
            .unwrap();
        let records = engine.learning().records(board.signature(Color::White));
        assert_eq!(records.len(), 1);
        assert_eq!((records[0].from, records[0].to), (mv.from, mv.to));

        engine.learn_from_result(GameOutcome::Win);
        assert_eq!(engine.learning().wins, 1);
        assert_eq!(
            engine.learning().records(board.signature(Color::White))[0].success,
            Some(true)
        );
    }

    fn default_engine() -> AlphaBetaEngine {
        engine(EngineConfig::default())
    }

    #[test]
    fn test_takes_a_hanging_queen() {
        let (board, side, state) =
            parse_fen("rnb1kbnr/pppp1ppp/8/4p3/8/3q4/PPPPPPPP/RNBQKBNR w KQkq - 0 3").unwrap();
        let mut engine = default_engine();
        let (mv, stats) = engine
            .search(&board, side, &state, SearchLimit::Depth(1))
            .unwrap();
        assert!(!stats.from_book);
        assert_eq!(stats.depth, 1);
        assert_eq!(mv.to.algebraic(), "d3", "played {mv}");
        assert!(stats.score > 0.0);
    }

    #[test]
    fn test_quiet_position_searches_past_depth_one() {
        let (board, side, state) =
            parse_fen("r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4")
                .unwrap();
        let mut engine = default_engine();
        let (mv, stats) = engine
            .search(
                &board,
                side,
                &state,
                SearchLimit::DepthAndTime {
                    depth: 2,
                    time_ms: 120_000,
                },
            )
            .unwrap();
        assert!(!stats.from_book);
        assert_eq!(stats.depth, 2);
        assert!(!is_mate_score(stats.score));
        assert!(is_legal_move(&board, &mv, side, &state));
    }

    #[test]
    fn test_falls_back_when_no_depth_completes() {
        let board = small_endgame();
        let state = endgame_state(&board, Color::White);
        let mut engine = default_engine();
        let (mv, stats) = engine
            .search(&board, Color::White, &state, SearchLimit::Time(0))
            .unwrap();
        assert_eq!(stats.depth, 0);
        assert!(!stats.from_book);
        assert!(is_legal_move(&board, &mv, Color::White, &state));
    }

    #[test]
    fn test_null_move_prunes_without_changing_a_forced_mate() {
        // Same back-rank mate, searched deep enough for the pass to apply
        let mut board = Board::empty();
        board.add_piece(7, 6, PieceKind::King, Color::White);
        board.add_piece(7, 0, PieceKind::Rook, Color::White);
        board.add_piece(0, 7, PieceKind::King, Color::Black);
        board.add_piece(1, 6, PieceKind::Pawn, Color::Black);
        board.add_piece(1, 7, PieceKind::Pawn, Color::Black);
        let state = endgame_state(&board, Color::White);

        let mut engine = default_engine();
        let (score, mv) = engine.minimax(
            &board,
            4,
            f64::NEG_INFINITY,
            f64::INFINITY,
            true,
            Color::White,
            &state,
        );
        assert!(is_mate_score(score));
        assert_eq!(mv.map(|m| m.to_coordinate()), Some("a1a8".to_string()));
    }

    #[test]
    fn test_cache_is_used_and_cleared() {
        let board = small_endgame();
        let state = endgame_state(&board, Color::White);
        let mut engine = engine(quiet_config());
        engine.search(&board, Color::White, &state, SearchLimit::Depth(2));
        engine.search(&board, Color::White, &state, SearchLimit::Depth(2));
        let stats = engine.cache_stats();
        assert!(stats.hits > 0);
        assert!(stats.evaluations > 0);

        engine.clear();
        assert_eq!(engine.cache_stats(), CacheStats::default());
    }
}
