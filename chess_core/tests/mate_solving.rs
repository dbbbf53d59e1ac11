use chess_core::engine::config::EngineConfig;
use chess_core::engine::search::AlphaBetaEngine;
use chess_core::engine::{is_mate_score, SearchLimit, Searcher};
use chess_core::logic::notation::parse_fen;
use chess_core::logic::rules::{apply_move, is_checkmate};
use std::sync::Arc;

fn solve_mate(fen: &str, mate_in: u8, expected: &str, name: &str) {
    let (board, side, state) = parse_fen(fen).unwrap();
    let mut engine = AlphaBetaEngine::with_seed(Arc::new(EngineConfig::default()), 5);

    let start = std::time::Instant::now();
    let (best_move, stats) = engine
        .search(&board, side, &state, SearchLimit::Depth(mate_in * 2))
        .unwrap();
    println!(
        "{name}: {best_move} in {:?} (depth {}, {} nodes)",
        start.elapsed(),
        stats.depth,
        stats.nodes
    );

    assert_eq!(best_move.to_coordinate(), expected, "{name}");
    assert!(is_mate_score(stats.score), "{name}: score {}", stats.score);

    if mate_in == 1 {
        let (after, next_state) = apply_move(&board, &best_move, &state);
        assert!(is_checkmate(&after, side.opposite(), &next_state), "{name}");
    }
}

#[test]
fn test_back_rank_mate() {
    solve_mate("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", 1, "a1a8", "back rank");
}

#[test]
fn test_back_rank_mate_for_black() {
    solve_mate("3r2k1/8/8/8/8/8/5PPP/6K1 b - - 0 1", 1, "d8d1", "black back rank");
}

#[test]
fn test_scholars_mate() {
    solve_mate(
        "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4",
        1,
        "h5f7",
        "scholar's mate",
    );
}
