//! Main API to represent and interact with a chess position.
//!
//! A [`Position`] is a plain value: making a move returns a new position and
//! leaves the original untouched. The board is a flat 64 entries array indexed by
//! square, which makes positions `Copy` and snapshots cheap.

use thiserror::Error;

use super::{
    castling_rights::CastlingRights,
    colour::Colour,
    fen::{Fen, FenParseError},
    history::HistoryEntry,
    movegen::{self, GameStatus, MoveList},
    moves::{CheckMarker, Move, SanMove, SanMoveKind},
    piece::{Piece, PieceKind},
    square::{File, Rank, Square},
    zobrist,
};

/// Indicates that a move is not legal in the position it was played in.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Error)]
#[error("move {0} is not legal in the current position")]
pub struct IllegalMoveError(pub Move);

/// Represents a chess position: piece placement, side to move, castling rights,
/// en passant target and move counters.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Position {
    board: [Option<Piece>; 64],

    side_to_move: Colour,
    castling_rights: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u16,
    fullmove_number: u16,
    hash: u64,
}
impl Default for Position {
    /// A position with no pieces.
    fn default() -> Self {
        Self {
            board: [None; 64],

            side_to_move: Colour::White,
            castling_rights: CastlingRights::none(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
        }
    }
}
impl Position {
    /// The initial position of chess.
    /// # Example
    /// ```
    /// # use kibitzer::game::position::*;
    /// assert_eq!(
    ///     Position::initial().fen().to_string(),
    ///     "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    /// );
    /// ```
    pub fn initial() -> Self {
        const BACK_RANK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        let mut board = [None; 64];
        for colour in [Colour::White, Colour::Black] {
            for (file, kind) in File::iter().zip(BACK_RANK) {
                board[Square::new(file, colour.back_rank()).index()] = Some(Piece::new(kind, colour));
                board[Square::new(file, colour.pawn_rank()).index()] =
                    Some(Piece::new(PieceKind::Pawn, colour));
            }
        }

        let mut position = Self {
            board,
            castling_rights: CastlingRights::full(),
            ..Self::default()
        };
        position.rehash();
        position
    }

    /// Creates a position from a parsed FEN string.
    pub fn from_fen(fen: &Fen) -> Self {
        let mut position = Self {
            board: fen.board,

            side_to_move: fen.side_to_move,
            castling_rights: fen.castling_rights,
            en_passant: fen.en_passant,
            halfmove_clock: fen.halfmove_clock,
            fullmove_number: fen.fullmove_number,
            hash: 0,
        };
        position.rehash();
        position
    }

    /// Returns a FEN string describing the position.
    pub fn fen(&self) -> Fen {
        Fen {
            board: self.board,
            side_to_move: self.side_to_move,
            castling_rights: self.castling_rights,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        }
    }

    /// Returns the piece present on a given square if any.
    #[inline(always)]
    pub fn piece_on(&self, square: Square) -> Option<Piece> {
        self.board[square.index()]
    }

    /// Iterator over all occupied squares and the pieces standing on them.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::iter().filter_map(|square| self.piece_on(square).map(|piece| (square, piece)))
    }

    /// Returns the current side to move.
    pub fn side_to_move(&self) -> Colour {
        self.side_to_move
    }

    /// Returns the castling rights still held by both sides.
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    /// Returns the square a pawn could capture en passant on, if the last move
    /// was a double push.
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    /// Number of plies since the last capture or pawn move.
    pub fn halfmove_clock(&self) -> u16 {
        self.halfmove_clock
    }

    /// Number of the current full move, starting at 1 and incremented after
    /// each black move.
    pub fn fullmove_number(&self) -> u16 {
        self.fullmove_number
    }

    /// Returns the Zobrist hash of this position, which identifies it.
    pub fn zobrist_hash(&self) -> u64 {
        self.hash
    }

    /// Returns the square of the king of a given colour.
    pub fn king_square(&self, colour: Colour) -> Option<Square> {
        let king = Piece::new(PieceKind::King, colour);
        Square::iter().find(|&square| self.piece_on(square) == Some(king))
    }

    /// Counts the kings of a given colour. Legal play always keeps exactly one.
    pub fn king_count(&self, colour: Colour) -> usize {
        let king = Piece::new(PieceKind::King, colour);
        self.board.iter().filter(|p| **p == Some(king)).count()
    }

    /// Checks if the king of `colour` is attacked.
    pub fn is_in_check(&self, colour: Colour) -> bool {
        self.king_square(colour)
            .is_some_and(|king| movegen::is_square_attacked(self, king, colour.inverse()))
    }

    /// Checks if the side to move is in check.
    pub fn in_check(&self) -> bool {
        self.is_in_check(self.side_to_move)
    }

    /// Generates all legal moves for the side to move.
    pub fn legal_moves(&self) -> MoveList {
        movegen::legal_moves(self)
    }

    /// Checks if `mv` is legal to play in this position.
    pub fn is_legal(&self, mv: Move) -> bool {
        self.legal_moves().contains(&mv)
    }

    /// Returns whether the game goes on, or ended by checkmate or stalemate.
    pub fn status(&self) -> GameStatus {
        movegen::status(self)
    }

    /// Plays `mv` after checking that it is legal.
    /// # Errors
    /// Returns an [`IllegalMoveError`] if the move is not legal in this position.
    pub fn play(&self, mv: Move) -> Result<Self, IllegalMoveError> {
        if self.is_legal(mv) {
            Ok(self.after(mv))
        } else {
            Err(IllegalMoveError(mv))
        }
    }

    /// Plays `mv` on a copy of this position without checking legality.
    ///
    /// # Panics
    /// Panics if there is no piece on the origin square of the move.
    #[inline]
    pub fn after(&self, mv: Move) -> Self {
        self.make(mv).0
    }

    /// Plays `mv` on a copy of this position without checking legality, and
    /// returns the information needed to take it back with [`Position::unmake`].
    ///
    /// # Panics
    /// Panics if there is no piece on the origin square of the move.
    pub fn make(&self, mv: Move) -> (Self, HistoryEntry) {
        let mut next = *self;
        let Some(moved) = next.take(mv.from) else {
            panic!("no piece on {} to play {mv}", mv.from)
        };
        let us = moved.colour;

        let mut captured = next.take(mv.to).map(|piece| (piece, mv.to));
        if moved.kind == PieceKind::Pawn && self.en_passant == Some(mv.to) {
            let victim = Square::new(mv.to.file(), mv.from.rank());
            captured = next.take(victim).map(|piece| (piece, victim));
        }

        if let Some((rook_from, rook_to)) = castling_rook_squares(moved, mv) {
            if let Some(rook) = next.take(rook_from) {
                next.put(rook_to, rook)
            }
        }

        let placed = match mv.promotion {
            Some(target) => Piece::new(target.to_piece_kind(), us),
            None => moved,
        };
        next.put(mv.to, placed);

        next.hash ^= self.castling_rights.zobrist_hash();
        next.castling_rights.update_for_square(mv.from);
        next.castling_rights.update_for_square(mv.to);
        next.hash ^= next.castling_rights.zobrist_hash();

        next.hash ^= zobrist::en_passant_hash(self.en_passant);
        next.en_passant = if moved.kind == PieceKind::Pawn
            && (mv.to.rank() as i8 - mv.from.rank() as i8).abs() == 2
        {
            mv.from.offset(0, us.forward())
        } else {
            None
        };
        next.hash ^= zobrist::en_passant_hash(next.en_passant);

        next.halfmove_clock = if moved.kind == PieceKind::Pawn || captured.is_some() {
            0
        } else {
            self.halfmove_clock.saturating_add(1)
        };
        if us.is_black() {
            next.fullmove_number = self.fullmove_number.saturating_add(1)
        }

        next.hash ^= zobrist::side_to_move_hash(Colour::Black);
        next.side_to_move.invert();

        let entry = HistoryEntry {
            played: mv,
            moved,
            captured,
            castling_rights: self.castling_rights,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            hash: self.hash,
        };
        (next, entry)
    }

    /// Takes back the move recorded in `entry`, which must be the last move
    /// that led to this position.
    pub fn unmake(&self, entry: &HistoryEntry) -> Self {
        let mut previous = *self;
        let mv = entry.played;

        previous.take(mv.to);
        previous.put(mv.from, entry.moved);
        if let Some((piece, square)) = entry.captured {
            previous.put(square, piece)
        }
        if let Some((rook_from, rook_to)) = castling_rook_squares(entry.moved, mv) {
            if let Some(rook) = previous.take(rook_to) {
                previous.put(rook_from, rook)
            }
        }

        previous.side_to_move = entry.moved.colour;
        previous.castling_rights = entry.castling_rights;
        previous.en_passant = entry.en_passant;
        previous.halfmove_clock = entry.halfmove_clock;
        previous.fullmove_number = entry.fullmove_number;
        previous.hash = entry.hash;
        debug_assert_eq!(previous.hash, previous.computed_hash());

        previous
    }

    /// Converts a legal move into its SAN representation, check markers included.
    ///
    /// Returns `None` if `mv` is not legal in this position.
    /// # Example
    /// ```
    /// # use kibitzer::game::position::*;
    /// let position = Position::initial();
    /// let san = position.san("g1f3".parse().unwrap()).unwrap();
    /// assert_eq!(san.to_string(), "Nf3");
    /// ```
    pub fn san(&self, mv: Move) -> Option<SanMove> {
        let legal = self.legal_moves();
        if !legal.contains(&mv) {
            return None;
        }

        let moving = self.piece_on(mv.from)?;
        let move_kind = if castling_rook_squares(moving, mv).is_some() {
            if mv.to.file() == File::G {
                SanMoveKind::KingSideCastle
            } else {
                SanMoveKind::QueenSideCastle
            }
        } else if moving.kind == PieceKind::Pawn {
            if mv.from.file() != mv.to.file() {
                SanMoveKind::PawnCapture {
                    origin_file: mv.from.file(),
                    target: mv.to,
                    promoting_to: mv.promotion,
                }
            } else {
                SanMoveKind::PawnPush {
                    target: mv.to,
                    promoting_to: mv.promotion,
                }
            }
        } else {
            let rivals: Vec<Square> = legal
                .iter()
                .filter(|other| {
                    other.to == mv.to
                        && other.from != mv.from
                        && self.piece_on(other.from) == Some(moving)
                })
                .map(|other| other.from)
                .collect();

            let (origin_file, origin_rank) = if rivals.is_empty() {
                (None, None)
            } else if rivals.iter().all(|o| o.file() != mv.from.file()) {
                (Some(mv.from.file()), None)
            } else if rivals.iter().all(|o| o.rank() != mv.from.rank()) {
                (None, Some(mv.from.rank()))
            } else {
                (Some(mv.from.file()), Some(mv.from.rank()))
            };
            SanMoveKind::PieceMove {
                moving_piece: moving.kind,
                origin_file,
                origin_rank,
                is_capture: self.piece_on(mv.to).is_some(),
                target: mv.to,
            }
        };

        let next = self.after(mv);
        let check = if next.in_check() {
            Some(if next.legal_moves().is_empty() {
                CheckMarker::Checkmate
            } else {
                CheckMarker::Check
            })
        } else {
            None
        };

        Some(SanMove { move_kind, check })
    }

    #[inline(always)]
    fn put(&mut self, square: Square, piece: Piece) {
        debug_assert!(self.board[square.index()].is_none());
        self.board[square.index()] = Some(piece);
        self.hash ^= zobrist::piece_hash(piece, square);
    }

    #[inline(always)]
    fn take(&mut self, square: Square) -> Option<Piece> {
        let piece = self.board[square.index()].take()?;
        self.hash ^= zobrist::piece_hash(piece, square);
        Some(piece)
    }

    fn computed_hash(&self) -> u64 {
        self.pieces()
            .fold(0, |hash, (square, piece)| {
                hash ^ zobrist::piece_hash(piece, square)
            })
            ^ self.castling_rights.zobrist_hash()
            ^ zobrist::side_to_move_hash(self.side_to_move)
            ^ zobrist::en_passant_hash(self.en_passant)
    }

    fn rehash(&mut self) {
        self.hash = self.computed_hash()
    }
}

/// Returns the rook's origin and target when `mv` is a castling move of `moved`.
pub(crate) fn castling_rook_squares(moved: Piece, mv: Move) -> Option<(Square, Square)> {
    if moved.kind != PieceKind::King || (mv.from.file() as i8 - mv.to.file() as i8).abs() != 2 {
        return None;
    }
    let rank = mv.to.rank();
    if mv.to.file() == File::G {
        Some((Square::new(File::H, rank), Square::new(File::F, rank)))
    } else {
        Some((Square::new(File::A, rank), Square::new(File::D, rank)))
    }
}

impl std::str::FromStr for Position {
    type Err = FenParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_fen(&s.parse()?))
    }
}
impl std::hash::Hash for Position {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.hash.hash(state)
    }
}
impl From<Fen> for Position {
    fn from(value: Fen) -> Self {
        Self::from_fen(&value)
    }
}
impl std::fmt::Debug for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (r, rank) in Rank::iter().rev().enumerate() {
            for square in Square::rank_squares_iter(rank) {
                match self.piece_on(square) {
                    Some(piece) => write!(f, "{piece} ")?,
                    None => write!(f, ". ")?,
                }
            }
            match r {
                3 => writeln!(f, "side to move: {}", self.side_to_move),
                4 => writeln!(f, "halfmove clock: {}", self.halfmove_clock),
                5 => writeln!(
                    f,
                    "en passant: {}",
                    match self.en_passant {
                        Some(square) => square.to_string(),
                        None => "-".to_string(),
                    }
                ),
                6 => writeln!(f, "castling rights: {}", self.castling_rights),
                7 => writeln!(f, "hash: {:#018x}", self.hash),
                _ => writeln!(f),
            }?
        }
        writeln!(f, "\nfen: {}", self.fen())
    }
}
impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rank in Rank::iter().rev() {
            write!(f, "{rank} ")?;
            for square in Square::rank_squares_iter(rank) {
                match self.piece_on(square) {
                    Some(piece) => write!(f, " {}", piece.unicode_symbol())?,
                    None => write!(f, " ·")?,
                }
            }
            writeln!(f)?
        }
        write!(f, "  ")?;
        for file in File::iter() {
            write!(f, " {file}")?
        }
        writeln!(f)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn mv(s: &str) -> Move {
        s.parse().unwrap()
    }

    #[test]
    fn initial_position_matches_starting_fen() {
        let parsed: Position = super::super::fen::STARTING_FEN.parse().unwrap();
        assert_eq!(Position::initial(), parsed);
    }

    #[test]
    fn hash_is_restored_by_unmake() {
        let position = Position::initial();
        let (next, entry) = position.make(mv("e2e4"));
        assert_ne!(next.zobrist_hash(), position.zobrist_hash());
        assert_eq!(next.en_passant(), Some(Square::E3));
        assert_eq!(next.unmake(&entry), position);
    }

    #[test]
    fn incremental_hash_matches_full_hash() {
        let mut position = Position::initial();
        for m in ["e2e4", "d7d5", "e4d5", "g8f6", "f1b5", "c7c6", "g1f3", "c6b5", "e1g1"] {
            position = position.play(mv(m)).unwrap();
            assert_eq!(position.zobrist_hash(), position.computed_hash(), "after {m}");
        }
    }

    #[test]
    fn castling_moves_the_rook() {
        let position: Position = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1".parse().unwrap();
        let (next, entry) = position.make(mv("e1c1"));
        assert_eq!(next.piece_on(Square::D1), Some(Piece::new(PieceKind::Rook, Colour::White)));
        assert_eq!(next.piece_on(Square::A1), None);
        assert!(!next.castling_rights().queenside_castle_allowed(Colour::White));
        assert!(!next.castling_rights().kingside_castle_allowed(Colour::White));
        assert!(next.castling_rights().kingside_castle_allowed(Colour::Black));
        assert!(entry.is_castle());
        assert_eq!(next.unmake(&entry), position);
    }

    #[test]
    fn en_passant_removes_the_passed_pawn() {
        let position: Position = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2".parse().unwrap();
        let (next, entry) = position.make(mv("e5d6"));
        assert_eq!(next.piece_on(Square::D5), None);
        assert_eq!(next.piece_on(Square::D6), Some(Piece::new(PieceKind::Pawn, Colour::White)));
        assert!(entry.is_en_passant());
        assert_eq!(next.unmake(&entry), position);
    }

    #[test]
    fn promotion_replaces_the_pawn() {
        let position: Position = "1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let (next, entry) = position.make(mv("a7b8n"));
        assert_eq!(next.piece_on(Square::B8), Some(Piece::new(PieceKind::Knight, Colour::White)));
        assert_eq!(next.piece_on(Square::A7), None);
        assert_eq!(entry.captured, Some((Piece::new(PieceKind::Knight, Colour::Black), Square::B8)));
        assert_eq!(next.unmake(&entry), position);
    }

    #[test]
    fn capturing_a_rook_at_home_removes_the_right() {
        let position: Position = "r3k2r/8/8/8/8/8/6B1/4K3 w kq - 0 1".parse().unwrap();
        let next = position.after(mv("g2a8"));
        assert!(!next.castling_rights().queenside_castle_allowed(Colour::Black));
        assert!(next.castling_rights().kingside_castle_allowed(Colour::Black));
    }

    #[test]
    fn counters_advance() {
        let position = Position::initial().after(mv("g1f3"));
        assert_eq!(position.halfmove_clock(), 1);
        assert_eq!(position.fullmove_number(), 1);
        let position = position.after(mv("e7e5"));
        assert_eq!(position.halfmove_clock(), 0);
        assert_eq!(position.fullmove_number(), 2);
    }

    #[test]
    fn counters_saturate() {
        let position: Position = "4k3/8/8/8/8/8/8/4K3 b - - 65535 65535".parse().unwrap();
        let (next, entry) = position.make(mv("e8d7"));
        assert_eq!(next.halfmove_clock(), u16::MAX);
        assert_eq!(next.fullmove_number(), u16::MAX);
        assert_eq!(next.unmake(&entry), position);
    }

    #[test]
    fn san_disambiguates() {
        let position: Position = "4k3/8/8/8/8/8/K7/R6R w - - 0 1".parse().unwrap();
        assert_eq!(position.san(mv("a1d1")).unwrap().to_string(), "Rad1");
        assert_eq!(position.san(mv("e1g1")), None);

        let position: Position = "4k3/8/8/R7/8/8/8/R3K3 w - - 0 1".parse().unwrap();
        assert_eq!(position.san(mv("a1a3")).unwrap().to_string(), "R1a3");
    }

    #[test]
    fn san_marks_mate() {
        let position: Position = "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2"
            .parse()
            .unwrap();
        assert_eq!(position.san(mv("d8h4")).unwrap().to_string(), "Qh4#");
    }
}
