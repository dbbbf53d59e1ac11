use crate::engine::zobrist::ZobristKeys;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const BOARD_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::White => 0,
            Self::Black => 1,
        }
    }

    /// Row delta of a single pawn step.
    pub const fn pawn_direction(self) -> i8 {
        match self {
            Self::White => -1,
            Self::Black => 1,
        }
    }

    pub const fn pawn_start_row(self) -> u8 {
        match self {
            Self::White => 6,
            Self::Black => 1,
        }
    }

    pub const fn promotion_row(self) -> u8 {
        match self {
            Self::White => 0,
            Self::Black => 7,
        }
    }

    pub const fn back_row(self) -> u8 {
        match self {
            Self::White => 7,
            Self::Black => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceKind {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl PieceKind {
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn symbol(self) -> char {
        match self {
            Self::Pawn => 'p',
            Self::Knight => 'n',
            Self::Bishop => 'b',
            Self::Rook => 'r',
            Self::Queen => 'q',
            Self::King => 'k',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'p' => Some(Self::Pawn),
            'n' => Some(Self::Knight),
            'b' => Some(Self::Bishop),
            'r' => Some(Self::Rook),
            'q' => Some(Self::Queen),
            'k' => Some(Self::King),
            _ => None,
        }
    }

    /// Kinds a pawn may promote to.
    pub const fn is_promotion_target(self) -> bool {
        matches!(self, Self::Knight | Self::Bishop | Self::Rook | Self::Queen)
    }

    pub const fn is_slider(self) -> bool {
        matches!(self, Self::Bishop | Self::Rook | Self::Queen)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub const fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }

    /// FEN letter: upper case for White.
    pub const fn fen_char(self) -> char {
        let c = self.kind.symbol();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    pub fn from_fen_char(c: char) -> Option<Self> {
        let kind = PieceKind::from_symbol(c)?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Self { kind, color })
    }
}

/// A board square. Row 0 is Black's back rank, row 7 is White's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Square {
    pub row: u8,
    pub col: u8,
}

impl Square {
    pub fn new(row: usize, col: usize) -> Option<Self> {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            #[allow(clippy::cast_possible_truncation)]
            Some(Self {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    pub const fn is_valid(self) -> bool {
        (self.row as usize) < BOARD_SIZE && (self.col as usize) < BOARD_SIZE
    }

    pub fn offset(self, d_row: i8, d_col: i8) -> Option<Self> {
        let row = i16::from(self.row) + i16::from(d_row);
        let col = i16::from(self.col) + i16::from(d_col);
        if (0..8).contains(&row) && (0..8).contains(&col) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Some(Self {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    /// Parses algebraic names like `e4`.
    pub fn from_algebraic(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        let file = chars.next()?;
        let rank = chars.next()?;
        if chars.next().is_some() || !('a'..='h').contains(&file) || !('1'..='8').contains(&rank)
        {
            return None;
        }
        let col = file as usize - 'a' as usize;
        let row = 8 - (rank as usize - '0' as usize);
        Self::new(row, col)
    }

    pub fn algebraic(self) -> String {
        let file = char::from(b'a'.saturating_add(self.col));
        let rank = 8u8.saturating_sub(self.row);
        format!("{file}{rank}")
    }

    /// All squares in row-major order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..BOARD_SIZE).flat_map(|r| (0..BOARD_SIZE).filter_map(move |c| Self::new(r, c)))
    }

    pub fn neighbors(self) -> impl Iterator<Item = Self> {
        const DIRS: [(i8, i8); 8] = [
            (-1, -1),
            (-1, 0),
            (-1, 1),
            (0, -1),
            (0, 1),
            (1, -1),
            (1, 0),
            (1, 1),
        ];
        DIRS.into_iter()
            .filter_map(move |(dr, dc)| self.offset(dr, dc))
    }

    pub const fn is_edge(self) -> bool {
        self.row == 0 || self.row == 7 || self.col == 0 || self.col == 7
    }

    /// d4, e4, d5, e5.
    pub const fn is_center(self) -> bool {
        (self.row == 3 || self.row == 4) && (self.col == 3 || self.col == 4)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.algebraic())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    grid: [[Option<Piece>; BOARD_SIZE]; BOARD_SIZE],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Standard starting position.
    pub fn new() -> Self {
        let mut board = Self::empty();
        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (col, kind) in back.into_iter().enumerate() {
            board.add_piece(0, col, kind, Color::Black);
            board.add_piece(1, col, PieceKind::Pawn, Color::Black);
            board.add_piece(6, col, PieceKind::Pawn, Color::White);
            board.add_piece(7, col, kind, Color::White);
        }
        board
    }

    pub const fn empty() -> Self {
        Self {
            grid: [[None; BOARD_SIZE]; BOARD_SIZE],
        }
    }

    pub fn clear(&mut self) {
        self.grid = [[None; BOARD_SIZE]; BOARD_SIZE];
    }

    /// Places a piece by raw coordinates; out-of-range coordinates are ignored.
    pub fn add_piece(&mut self, row: usize, col: usize, kind: PieceKind, color: Color) {
        if let Some(sq) = Square::new(row, col) {
            self.set_piece(sq, Some(Piece::new(kind, color)));
        }
    }

    pub fn get_piece(&self, sq: Square) -> Option<Piece> {
        self.grid
            .get(sq.row as usize)
            .and_then(|row| row.get(sq.col as usize))
            .copied()
            .flatten()
    }

    pub fn set_piece(&mut self, sq: Square, piece: Option<Piece>) {
        if let Some(cell) = self
            .grid
            .get_mut(sq.row as usize)
            .and_then(|row| row.get_mut(sq.col as usize))
        {
            *cell = piece;
        }
    }

    /// Moves whatever stands on `from` to `to` and returns the captured occupant.
    pub fn move_piece_quiet(&mut self, from: Square, to: Square) -> Option<Piece> {
        let piece = self.get_piece(from);
        let captured = self.get_piece(to);
        self.set_piece(from, None);
        self.set_piece(to, piece);
        captured
    }

    pub fn is_empty(&self, sq: Square) -> bool {
        self.get_piece(sq).is_none()
    }

    /// Occupied squares in row-major order.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(|sq| self.get_piece(sq).map(|p| (sq, p)))
    }

    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.pieces().filter(move |(_, p)| p.color == color)
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces_of(color)
            .find(|(_, p)| p.kind == PieceKind::King)
            .map(|(sq, _)| sq)
    }

    pub fn count(&self, kind: PieceKind, color: Color) -> usize {
        self.pieces_of(color).filter(|(_, p)| p.kind == kind).count()
    }

    /// Zobrist signature of the placement plus side to move.
    pub fn signature(&self, turn: Color) -> u64 {
        let keys = ZobristKeys::get();
        let mut hash = self.pieces().fold(0, |acc, (sq, p)| {
            acc ^ keys.piece_key(p.kind, p.color, sq.row as usize, sq.col as usize)
        });
        if turn == Color::Black {
            hash ^= keys.side_key;
        }
        hash
    }

    /// Placement field of a FEN string, rank 8 first.
    pub fn to_fen_placement(&self) -> String {
        let mut fen = String::new();
        for (r, row) in self.grid.iter().enumerate() {
            let mut empty_count = 0;
            for cell in row {
                match cell {
                    Some(p) => {
                        if empty_count > 0 {
                            fen.push_str(&empty_count.to_string());
                            empty_count = 0;
                        }
                        fen.push(p.fen_char());
                    }
                    None => empty_count += 1,
                }
            }
            if empty_count > 0 {
                fen.push_str(&empty_count.to_string());
            }
            if r < BOARD_SIZE - 1 {
                fen.push('/');
            }
        }
        fen
    }

    pub fn to_fen_string(&self, turn: Color) -> String {
        let side = match turn {
            Color::White => "w",
            Color::Black => "b",
        };
        format!("{} {side}", self.to_fen_placement())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.grid.iter().enumerate() {
            write!(f, "{} ", 8 - r)?;
            for cell in row {
                let c = cell.map_or('.', Piece::fen_char);
                write!(f, "{c} ")?;
            }
            writeln!(f)?;
        }
        write!(f, "  a b c d e f g h")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::from_algebraic(name).unwrap()
    }

    #[test]
    fn test_initial_setup() {
        let board = Board::new();
        assert_eq!(
            board.get_piece(sq("e1")),
            Some(Piece::new(PieceKind::King, Color::White))
        );
        assert_eq!(
            board.get_piece(sq("d8")),
            Some(Piece::new(PieceKind::Queen, Color::Black))
        );
        assert_eq!(board.pieces().count(), 32);
        assert_eq!(board.count(PieceKind::Pawn, Color::White), 8);
        assert_eq!(board.king_square(Color::Black), Some(sq("e8")));
    }

    #[test]
    fn test_square_naming() {
        let e2 = sq("e2");
        assert_eq!((e2.row, e2.col), (6, 4));
        assert_eq!(sq("a8"), Square { row: 0, col: 0 });
        assert_eq!(sq("h1").algebraic(), "h1");
        assert!(Square::from_algebraic("i1").is_none());
        assert!(Square::from_algebraic("e9").is_none());
        assert!(Square::from_algebraic("e22").is_none());
        assert!(sq("d5").is_center());
        assert!(!sq("c4").is_center());
        assert_eq!(sq("a1").neighbors().count(), 3);
        assert_eq!(sq("e4").neighbors().count(), 8);
    }

    #[test]
    fn test_out_of_range_access_is_ignored() {
        let mut board = Board::empty();
        let bad = Square { row: 9, col: 2 };
        assert!(!bad.is_valid());
        board.set_piece(bad, Some(Piece::new(PieceKind::Rook, Color::White)));
        assert_eq!(board.get_piece(bad), None);
        assert_eq!(board.pieces().count(), 0);
    }

    #[test]
    fn test_fen_generation() {
        let board = Board::new();
        assert_eq!(
            board.to_fen_string(Color::White),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w"
        );
    }

    #[test]
    fn test_signature_tracks_side_and_placement() {
        let mut board = Board::new();
        let start_white = board.signature(Color::White);
        assert_ne!(start_white, board.signature(Color::Black));

        board.move_piece_quiet(sq("g1"), sq("f3"));
        assert_ne!(start_white, board.signature(Color::White));
        board.move_piece_quiet(sq("f3"), sq("g1"));
        assert_eq!(start_white, board.signature(Color::White));
    }
}
