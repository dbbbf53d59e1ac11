//! External engines speaking UCI over stdin/stdout.

use crate::engine::Move;
use crate::logic::board::{Board, Color};
use crate::logic::game::GameState;
use crate::logic::generator::generate_legal_moves;
use crate::logic::notation::{parse_move, to_fen, NotationError};
use crate::logic::rules::is_legal_move;
use crate::source::{random_move, Difficulty, MoveOrigin, MoveReply, SourceError, UciLevel};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;

/// Added to a level's time budget before a request is abandoned.
pub const GRACE_MS: u64 = 2000;
const HANDSHAKE_MS: u64 = 5000;

#[derive(Debug, Error)]
pub enum UciError {
    #[error("engine I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("engine did not answer within {0} ms")]
    Timeout(u64),
    #[error("engine process exited")]
    ProcessExited,
    #[error("malformed engine output: {0}")]
    MalformedMessage(String),
    #[error("engine proposed an illegal move: {0}")]
    InvalidMove(String),
}

/// A running UCI child process. Killed when dropped.
pub struct UciEngine {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    skill: Option<u8>,
}

impl UciEngine {
    /// Starts `program` and completes the `uci`/`isready` handshake.
    pub async fn spawn(program: &Path, args: &[String]) -> Result<Self, UciError> {
        log::debug!("starting UCI engine {}", program.display());
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        let stdin = child.stdin.take().ok_or(UciError::ProcessExited)?;
        let stdout = child.stdout.take().ok_or(UciError::ProcessExited)?;

        let mut engine = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            skill: None,
        };
        engine.send("uci").await?;
        engine.expect("uciok", HANDSHAKE_MS).await?;
        engine.send("isready").await?;
        engine.expect("readyok", HANDSHAKE_MS).await?;
        Ok(engine)
    }

    async fn send(&mut self, command: &str) -> Result<(), UciError> {
        log::trace!("uci >> {command}");
        self.stdin.write_all(command.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Reads lines until one starts with `token`, skipping `info` and the like.
    async fn read_until(&mut self, token: &str) -> Result<String, UciError> {
        loop {
            let Some(line) = self.stdout.next_line().await? else {
                return Err(UciError::ProcessExited);
            };
            let line = line.trim();
            log::trace!("uci << {line}");
            if line.split_whitespace().next() == Some(token) {
                return Ok(line.to_string());
            }
        }
    }

    async fn expect(&mut self, token: &str, limit_ms: u64) -> Result<String, UciError> {
        timeout(Duration::from_millis(limit_ms), self.read_until(token))
            .await
            .map_err(|_| UciError::Timeout(limit_ms))?
    }

    /// Asks for a move in the given position and checks it is legal there.
    pub async fn best_move(
        &mut self,
        board: &Board,
        side: Color,
        state: &GameState,
        level: &UciLevel,
        go: &str,
    ) -> Result<Move, UciError> {
        if self.skill != Some(level.skill) {
            self.send(&format!("setoption name Skill Level value {}", level.skill))
                .await?;
            self.skill = Some(level.skill);
        }
        self.send(&format!("position fen {}", to_fen(board, side, state)))
            .await?;
        self.send(go).await?;

        let line = self.expect("bestmove", level.time_ms + GRACE_MS).await?;
        let token = parse_best_move(&line)?;
        let mv = parse_move(board, side, state, token).map_err(|err| match err {
            NotationError::IllegalMove(text) => UciError::InvalidMove(text),
            other => UciError::MalformedMessage(other.to_string()),
        })?;
        if !is_legal_move(board, &mv, side, state) {
            return Err(UciError::InvalidMove(token.to_string()));
        }
        Ok(mv)
    }

    pub async fn quit(mut self) -> Result<(), UciError> {
        self.send("quit").await?;
        self.child.wait().await?;
        Ok(())
    }
}

/// The move token of a `bestmove` line.
pub fn parse_best_move(line: &str) -> Result<&str, UciError> {
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("bestmove"), Some(token)) if (4..=5).contains(&token.len()) => Ok(token),
        _ => Err(UciError::MalformedMessage(line.to_string())),
    }
}

/// Moves from an external engine. Any failure is logged and answered with a
/// random legal move; the process is restarted on the next request.
pub struct ExternalSource {
    program: PathBuf,
    args: Vec<String>,
    engine: Option<UciEngine>,
    rng: StdRng,
}

impl ExternalSource {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            engine: None,
            rng: StdRng::from_entropy(),
        }
    }

    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub async fn request_move(
        &mut self,
        board: &Board,
        side: Color,
        state: &GameState,
        difficulty: Difficulty,
    ) -> Result<MoveReply, SourceError> {
        let legal = generate_legal_moves(board, side, state);
        if legal.is_empty() {
            return Err(SourceError::NoLegalMoves(side));
        }

        let level = UciLevel::for_level(difficulty.uci_level());
        match self.ask(board, side, state, &level).await {
            Ok(mv) => Ok(MoveReply {
                mv,
                origin: MoveOrigin::External,
                stats: None,
                diagnostic: None,
            }),
            Err(err) => {
                log::warn!("external engine {}: {err}", self.program.display());
                self.engine = None;
                Ok(MoveReply {
                    mv: random_move(&legal, side, &mut self.rng)?,
                    origin: MoveOrigin::Fallback,
                    stats: None,
                    diagnostic: Some(err.to_string()),
                })
            }
        }
    }

    async fn ask(
        &mut self,
        board: &Board,
        side: Color,
        state: &GameState,
        level: &UciLevel,
    ) -> Result<Move, UciError> {
        if self.engine.is_none() {
            self.engine = Some(UciEngine::spawn(&self.program, &self.args).await?);
        }
        let go = level.go_command(&mut self.rng);
        let engine = self.engine.as_mut().ok_or(UciError::ProcessExited)?;
        engine.best_move(board, side, state, level, &go).await
    }

    /// Stops the engine process, if one is running.
    pub async fn shutdown(&mut self) {
        if let Some(engine) = self.engine.take() {
            if let Err(err) = engine.quit().await {
                log::debug!("engine did not quit cleanly: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_best_move() {
        assert_eq!(parse_best_move("bestmove e2e4").unwrap(), "e2e4");
        assert_eq!(
            parse_best_move("bestmove e7e8q ponder a1a2").unwrap(),
            "e7e8q"
        );
        assert!(matches!(
            parse_best_move("bestmove"),
            Err(UciError::MalformedMessage(_))
        ));
        assert!(parse_best_move("bestmove (none)").is_err());
        assert!(parse_best_move("info depth 3").is_err());
    }
}
