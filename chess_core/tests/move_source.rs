use chess_core::engine::config::EngineConfig;
use chess_core::engine::SearchLimit;
use chess_core::logic::board::{Board, Color};
use chess_core::logic::game::GameState;
use chess_core::logic::notation::parse_fen;
use chess_core::logic::rules::is_legal_move;
use chess_core::source::{
    Difficulty, ExternalSource, LocalSource, MoveOrigin, MoveSource, SourceError,
};
use std::sync::Arc;

const FAKE_ENGINE: &str = r#"
while read -r line; do
  case "$line" in
    uci) echo "id name fake"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go*) echo "info depth 1 score cp 20"; echo "bestmove e2e4" ;;
    quit) exit 0 ;;
  esac
done
"#;

const CONFUSED_ENGINE: &str = r#"
while read -r line; do
  case "$line" in
    uci) echo "uciok" ;;
    isready) echo "readyok" ;;
    go*) echo "bestmove e2e5" ;;
  esac
done
"#;

fn shell_engine(script: &str) -> MoveSource {
    MoveSource::External(
        ExternalSource::new("/bin/sh")
            .with_args(vec!["-c".to_string(), script.to_string()])
            .with_seed(11),
    )
}

fn local() -> MoveSource {
    MoveSource::Local(LocalSource::with_seed(Arc::new(EngineConfig::default()), 11))
}

fn fools_mate() -> (Board, Color, GameState) {
    parse_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3").unwrap()
}

#[tokio::test]
async fn test_local_source_opens_from_the_book() {
    let board = Board::new();
    let state = GameState::new();
    let reply = local()
        .request_move(&board, Color::White, &state, Difficulty::Easy)
        .await
        .unwrap();
    assert_eq!(reply.origin, MoveOrigin::Book);
    assert!(is_legal_move(&board, &reply.mv, Color::White, &state));
    assert!(reply.stats.is_some_and(|s| s.from_book));
}

#[tokio::test]
async fn test_local_source_searches_out_of_book() {
    let (board, side, state) = parse_fen("8/5k2/2n5/1p6/5P2/8/4K3/3R4 w - - 0 40").unwrap();
    let reply = local()
        .request_move(&board, side, &state, Difficulty::Easy)
        .await
        .unwrap();
    assert_eq!(reply.origin, MoveOrigin::Search);
    assert!(is_legal_move(&board, &reply.mv, side, &state));
    let stats = reply.stats.unwrap();
    assert!(stats.depth >= 1 && stats.depth <= Difficulty::Easy.max_depth());
    assert!(stats.nodes > 0);
}

#[tokio::test]
async fn test_local_source_set_up_position_is_searched() {
    // Early move number, but not reached from the initial position
    let (board, side, state) =
        parse_fen("rnb1kbnr/pppp1ppp/8/4p3/8/3q4/PPPPPPPP/RNBQKBNR w KQkq - 0 3").unwrap();
    let mut source = LocalSource::with_seed(Arc::new(EngineConfig::default()), 5);
    let reply = source
        .request_move_within(&board, side, &state, SearchLimit::Depth(1))
        .await
        .unwrap();
    assert_eq!(reply.origin, MoveOrigin::Search);
    assert_eq!(reply.mv.to.algebraic(), "d3");
}

#[tokio::test]
async fn test_local_source_falls_back_without_time() {
    let (board, side, state) = parse_fen("8/5k2/2n5/1p6/5P2/8/4K3/3R4 w - - 0 40").unwrap();
    let mut source = LocalSource::with_seed(Arc::new(EngineConfig::default()), 9);
    let reply = source
        .request_move_within(&board, side, &state, SearchLimit::Time(0))
        .await
        .unwrap();
    assert_eq!(reply.origin, MoveOrigin::Fallback);
    assert!(is_legal_move(&board, &reply.mv, side, &state));
    assert!(reply.diagnostic.is_some());
    let stats = reply.stats.unwrap();
    assert_eq!(stats.depth, 0);
    assert!(!stats.from_book);
}

#[tokio::test]
async fn test_no_legal_moves_is_an_error() {
    let (board, side, state) = fools_mate();
    assert_eq!(
        local()
            .request_move(&board, side, &state, Difficulty::Hard)
            .await,
        Err(SourceError::NoLegalMoves(Color::White))
    );
    assert_eq!(
        shell_engine(FAKE_ENGINE)
            .request_move(&board, side, &state, Difficulty::Hard)
            .await,
        Err(SourceError::NoLegalMoves(Color::White))
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_external_engine_move() {
    let board = Board::new();
    let state = GameState::new();
    let mut source = shell_engine(FAKE_ENGINE);
    for difficulty in [Difficulty::Easy, Difficulty::Hard] {
        let reply = source
            .request_move(&board, Color::White, &state, difficulty)
            .await
            .unwrap();
        assert_eq!(reply.origin, MoveOrigin::External);
        assert_eq!(reply.mv.to_coordinate(), "e2e4");
        assert_eq!(reply.diagnostic, None);
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_illegal_external_move_falls_back() {
    let board = Board::new();
    let state = GameState::new();
    let reply = shell_engine(CONFUSED_ENGINE)
        .request_move(&board, Color::White, &state, Difficulty::Medium)
        .await
        .unwrap();
    assert_eq!(reply.origin, MoveOrigin::Fallback);
    assert!(is_legal_move(&board, &reply.mv, Color::White, &state));
    assert!(reply.diagnostic.unwrap().contains("illegal"));
}

#[tokio::test]
async fn test_missing_engine_falls_back() {
    let board = Board::new();
    let state = GameState::new();
    let mut source = MoveSource::External(
        ExternalSource::new("/nonexistent/uci-engine").with_seed(3),
    );
    let reply = source
        .request_move(&board, Color::White, &state, Difficulty::Easy)
        .await
        .unwrap();
    assert_eq!(reply.origin, MoveOrigin::Fallback);
    assert!(is_legal_move(&board, &reply.mv, Color::White, &state));
    assert!(reply.diagnostic.is_some());
}
