use anyhow::{anyhow, Context, Result};
use chess_core::engine::config::EngineConfig;
use chess_core::engine::learning::GameOutcome;
use chess_core::logic::board::Color;
use chess_core::logic::game::{Game, GameStatus};
use chess_core::logic::notation::{parse_fen, to_fen};
use chess_core::source::{Difficulty, ExternalSource, LocalSource, MoveSource};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Plays one game between two move sources and logs every move.
#[derive(Parser, Debug)]
#[command(name = "chess-game", version)]
struct Cli {
    /// Strength of the White side
    #[arg(long, default_value_t = Difficulty::Medium)]
    white: Difficulty,

    /// Strength of the Black side
    #[arg(long, default_value_t = Difficulty::Easy)]
    black: Difficulty,

    /// Stop after this many half-moves
    #[arg(long, default_value_t = 200)]
    max_plies: u32,

    /// Start from this position instead of the initial one
    #[arg(long)]
    fen: Option<String>,

    /// JSON engine configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// UCI engine executable that plays Black
    #[arg(long)]
    uci: Option<PathBuf>,
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    EngineConfig::load_from_json(&json).with_context(|| format!("parsing {}", path.display()))
}

fn new_game(fen: Option<&str>) -> Result<Game> {
    fen.map_or_else(
        || Ok(Game::new()),
        |fen| {
            let (board, turn, state) =
                parse_fen(fen).with_context(|| format!("invalid FEN `{fen}`"))?;
            Ok(Game::from_position(board, turn, state))
        },
    )
}

fn outcome_for(status: GameStatus, color: Color) -> GameOutcome {
    match status {
        GameStatus::Checkmate(winner) if winner == color => GameOutcome::Win,
        GameStatus::Checkmate(_) => GameOutcome::Loss,
        GameStatus::Draw(_) | GameStatus::Playing => GameOutcome::Draw,
    }
}

async fn play(
    game: &mut Game,
    white: &mut MoveSource,
    black: &mut MoveSource,
    cli: &Cli,
) -> Result<u32> {
    let mut plies = 0;
    while game.status == GameStatus::Playing && plies < cli.max_plies {
        let (source, difficulty) = match game.turn {
            Color::White => (&mut *white, cli.white),
            Color::Black => (&mut *black, cli.black),
        };
        let reply = source
            .request_move(&game.board, game.turn, &game.state, difficulty)
            .await?;
        if let Some(diagnostic) = &reply.diagnostic {
            tracing::warn!(source = source.name(), "{diagnostic}");
        }

        plies += 1;
        tracing::info!(
            ply = plies,
            side = ?game.turn,
            mv = %reply.mv,
            origin = ?reply.origin,
            depth = ?reply.stats.map(|s| s.depth),
            "move"
        );
        game.make_move(reply.mv)
            .map_err(|err| anyhow!("{} was rejected: {err:?}", reply.mv))?;
    }
    Ok(plies)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Arc::new(load_config(cli.config.as_deref())?);
    let mut game = new_game(cli.fen.as_deref())?;

    let mut white = MoveSource::Local(LocalSource::new(config.clone()));
    let mut black = cli.uci.clone().map_or_else(
        || MoveSource::Local(LocalSource::new(config)),
        |path| MoveSource::External(ExternalSource::new(path)),
    );
    tracing::info!(
        white = %cli.white,
        black = %cli.black,
        black_source = black.name(),
        "starting game"
    );

    let plies = play(&mut game, &mut white, &mut black, &cli).await?;

    for (source, color) in [(&mut white, Color::White), (&mut black, Color::Black)] {
        match source {
            MoveSource::Local(local) => local.learn_from_result(outcome_for(game.status, color)),
            MoveSource::External(external) => external.shutdown().await,
        }
    }

    tracing::info!(plies, status = ?game.status, "game over");
    println!("{}", to_fen(&game.board, game.turn, &game.state));
    Ok(())
}
