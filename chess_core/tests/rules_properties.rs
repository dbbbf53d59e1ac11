use chess_core::engine::Move;
use chess_core::logic::board::{Board, Color, PieceKind, Square};
use chess_core::logic::game::{Game, GameState, GameStatus};
use chess_core::logic::generator::generate_legal_moves;
use chess_core::logic::notation::{parse_fen, parse_move, to_fen};
use chess_core::logic::rules::{
    apply_move, is_checkmate, is_in_check, is_legal_move, is_stalemate,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

fn play(moves: &[&str]) -> (Board, Color, GameState) {
    let mut board = Board::new();
    let mut state = GameState::new();
    let mut side = Color::White;
    for text in moves {
        let mv = parse_move(&board, side, &state, text).unwrap();
        (board, state) = apply_move(&board, &mv, &state);
        side = side.opposite();
    }
    (board, side, state)
}

fn find(board: &Board, side: Color, state: &GameState, text: &str) -> Option<Move> {
    generate_legal_moves(board, side, state)
        .into_iter()
        .find(|m| m.to_coordinate() == text)
}

#[test]
fn test_generated_moves_are_legal_and_safe() {
    let positions = [
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "r3k2r/pppq1ppp/2npbn2/4p3/2B1P3/2NPBN2/PPPQ1PPP/R3K2R w KQkq - 4 8",
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R b KQkq - 0 1",
    ];
    for fen in positions {
        let (board, side, state) = parse_fen(fen).unwrap();
        let moves = generate_legal_moves(&board, side, &state);
        assert!(!moves.is_empty(), "{fen}");
        for mv in &moves {
            assert!(is_legal_move(&board, mv, side, &state), "{fen}: {mv}");
            let (after, _) = apply_move(&board, mv, &state);
            assert!(!is_in_check(&after, side), "{fen}: {mv} leaves the king in check");
        }
    }
}

#[test]
fn test_black_has_twenty_replies_to_e4() {
    let (board, side, state) = play(&["e2e4"]);
    assert_eq!(side, Color::Black);
    assert_eq!(generate_legal_moves(&board, side, &state).len(), 20);
}

#[test]
fn test_queen_on_open_file_gives_check() {
    let (board, _, _) = parse_fen("4q2k/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    assert!(is_in_check(&board, Color::White));
    assert!(!is_in_check(&board, Color::Black));
}

#[test]
fn test_mate_and_stalemate_have_no_moves() {
    let (board, side, state) = play(&["f2f3", "e7e5", "g2g4", "d8h4"]);
    assert!(is_checkmate(&board, side, &state));
    assert!(is_in_check(&board, side));
    assert!(generate_legal_moves(&board, side, &state).is_empty());

    let (board, side, state) = parse_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
    assert!(is_stalemate(&board, side, &state));
    assert!(!is_in_check(&board, side));
    assert!(generate_legal_moves(&board, side, &state).is_empty());
    assert!(!is_checkmate(&board, side, &state));
}

#[test]
fn test_en_passant_only_right_after_the_double_step() {
    let (board, side, state) = play(&["e2e4", "a7a6", "e4e5", "d7d5"]);
    let capture = find(&board, side, &state, "e5d6").unwrap();
    let (after, _) = apply_move(&board, &capture, &state);
    assert!(after.is_empty(Square::from_algebraic("d5").unwrap()));
    assert_eq!(
        after.get_piece(Square::from_algebraic("d6").unwrap()).map(|p| p.kind),
        Some(PieceKind::Pawn)
    );

    let (board, side, state) = play(&["e2e4", "a7a6", "e4e5", "d7d5", "h2h3", "a6a5"]);
    assert!(find(&board, side, &state, "e5d6").is_none());
}

#[test]
fn test_castling_needs_a_clear_path() {
    let (board, side, state) = parse_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    assert!(find(&board, side, &state, "e1g1").is_some());
    assert!(find(&board, side, &state, "e1c1").is_some());

    let (board, side, state) = parse_fen("r3k2r/8/8/8/8/8/8/R2QK1NR w KQkq - 0 1").unwrap();
    assert!(find(&board, side, &state, "e1g1").is_none());
    assert!(find(&board, side, &state, "e1c1").is_none());
}

#[test]
fn test_undo_restores_every_position() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut game = Game::new();
    let mut seen = Vec::new();

    for _ in 0..40 {
        if game.status != GameStatus::Playing {
            break;
        }
        let moves = game.legal_moves();
        let Some(mv) = moves.choose(&mut rng).copied() else {
            break;
        };
        seen.push((game.board, game.turn, game.state.clone()));
        game.make_move(mv).unwrap();
    }

    while let Some((board, turn, state)) = seen.pop() {
        assert!(game.undo_move());
        assert_eq!(game.board, board);
        assert_eq!(game.turn, turn);
        assert_eq!(game.state, state);
    }
    assert!(!game.undo_move());
}

#[test]
fn test_fen_round_trip() {
    let (board, side, state) = play(&["e2e4", "c7c5", "g1f3", "d7d6", "f1b5"]);
    let fen = to_fen(&board, side, &state);
    assert_eq!(
        fen,
        "rnbqkbnr/pp2pppp/3p4/1Bp5/4P3/5N2/PPPP1PPP/RNBQK2R b KQkq - 1 3"
    );
    let (parsed, parsed_side, parsed_state) = parse_fen(&fen).unwrap();
    assert_eq!(parsed, board);
    assert_eq!(parsed_side, side);
    assert_eq!(parsed_state.castling, state.castling);
    assert_eq!(parsed_state.half_moves, 1);
    assert_eq!(parsed_state.full_moves, 3);
}
