//! Piece types encoding.

use std::str::FromStr;

use thiserror::Error;

use crate::parsing::PartialFromStr;

use super::colour::Colour;

/// Total number of different piece kinds (6).
pub const NUM_PIECES: usize = 6;

const PIECE_SYMBOLS: [char; 12] = ['P', 'N', 'B', 'R', 'Q', 'K', 'p', 'n', 'b', 'r', 'q', 'k'];
const PIECE_SYMBOLS_UNICODE: [char; 12] =
    ['♙', '♘', '♗', '♖', '♕', '♔', '♟', '♞', '♝', '♜', '♛', '♚'];

/// Complete set of information for identifying a piece (colour and kind).
///
/// # Parsing
/// Pieces can be parsed from their FEN symbol ('p', 'n', 'b', 'r', 'q', 'k' for black,
/// uppercase for white) using Rust's [`FromStr`] trait.
/// ```
/// # use kibitzer::game::piece::*;
/// # use kibitzer::game::colour::*;
/// assert_eq!("p".parse(), Ok(Piece::new(PieceKind::Pawn, Colour::Black)));
/// assert_eq!("Q".parse(), Ok(Piece::new(PieceKind::Queen, Colour::White)));
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Piece {
    pub kind: PieceKind,
    pub colour: Colour,
}
impl Piece {
    /// Creates a new `kind` piece of the given `colour`.
    pub const fn new(kind: PieceKind, colour: Colour) -> Self {
        Self { kind, colour }
    }

    /// Returns the piece's FEN symbol.
    /// # Example
    /// ```
    /// # use kibitzer::game::piece::*;
    /// # use kibitzer::game::colour::*;
    /// assert_eq!(Piece::new(PieceKind::Pawn, Colour::Black).symbol(), 'p');
    /// ```
    pub fn symbol(&self) -> char {
        PIECE_SYMBOLS[self.colour as usize * NUM_PIECES + self.kind as usize]
    }

    /// Returns the piece's Unicode symbol.
    pub fn unicode_symbol(&self) -> char {
        PIECE_SYMBOLS_UNICODE[self.colour as usize * NUM_PIECES + self.kind as usize]
    }
}
impl std::fmt::Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Piece parsing errors.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Error)]
pub enum PieceParseError {
    #[error("{0} is not a valid piece symbol")]
    InvalidPieceSymbol(char),
    #[error("{0} is not a valid promotion target")]
    InvalidPromotionTarget(PieceKind),
    #[error("Empty input")]
    EmptyInput,
    #[error("A piece can only be one character long")]
    InputTooLong,
}

impl PartialFromStr for Piece {
    type Err = PieceParseError;

    fn partial_from_str(s: &str) -> Result<(Self, &str), Self::Err> {
        let symbol = s.chars().next().ok_or(PieceParseError::EmptyInput)?;
        let kind = PieceKind::from_symbol(symbol)?;
        let colour = Colour::from(symbol.is_ascii_lowercase());
        Ok((Self::new(kind, colour), &s[symbol.len_utf8()..]))
    }
}
impl FromStr for Piece {
    type Err = PieceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::partial_from_str(s).and_then(|(result, rest)| {
            if rest.is_empty() {
                Ok(result)
            } else {
                Err(PieceParseError::InputTooLong)
            }
        })
    }
}

/// The kind of a piece, one of Pawn, Knight, Bishop, Rook, Queen or King.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum PieceKind {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}
impl PieceKind {
    /// All piece kinds.
    pub const PIECE_KINDS: [Self; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    /// Iterator over all piece kinds.
    pub fn iter() -> impl Iterator<Item = Self> {
        Self::PIECE_KINDS.into_iter()
    }

    /// Checks if this piece kind is a diagonal slider (bishops and queens).
    #[inline(always)]
    pub fn is_diagonal_slider(self) -> bool {
        matches!(self, Self::Bishop | Self::Queen)
    }

    /// Checks if this piece kind is an orthogonal slider (rooks and queens).
    #[inline(always)]
    pub fn is_orthogonal_slider(self) -> bool {
        matches!(self, Self::Rook | Self::Queen)
    }

    /// Returns the uppercase letter used for this kind in SAN.
    pub fn san_letter(self) -> char {
        PIECE_SYMBOLS[self as usize]
    }

    fn from_symbol(symbol: char) -> Result<Self, PieceParseError> {
        Ok(match symbol.to_ascii_lowercase() {
            'p' => Self::Pawn,
            'n' => Self::Knight,
            'b' => Self::Bishop,
            'r' => Self::Rook,
            'q' => Self::Queen,
            'k' => Self::King,
            _ => Err(PieceParseError::InvalidPieceSymbol(symbol))?,
        })
    }
}
impl std::fmt::Display for PieceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", PIECE_SYMBOLS[NUM_PIECES + *self as usize])
    }
}

/// Special type that only contains valid promotion targets
/// (knight, bishop, rook and queen).
///
/// Moves carry this type instead of [`PieceKind`] so that a promotion to a pawn
/// or a king cannot be represented at all.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum PromotionTarget {
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
}
impl PromotionTarget {
    /// All promotion targets, in the order moves are generated.
    pub const ALL: [Self; 4] = [Self::Queen, Self::Rook, Self::Bishop, Self::Knight];

    /// Converts a piece kind into a promotion target if such a transformation is valid.
    pub fn from_piece_kind(kind: PieceKind) -> Option<Self> {
        match kind {
            PieceKind::Knight => Some(Self::Knight),
            PieceKind::Bishop => Some(Self::Bishop),
            PieceKind::Rook => Some(Self::Rook),
            PieceKind::Queen => Some(Self::Queen),
            PieceKind::Pawn | PieceKind::King => None,
        }
    }

    /// Converts this promotion target to the corresponding piece kind.
    pub fn to_piece_kind(self) -> PieceKind {
        match self {
            Self::Knight => PieceKind::Knight,
            Self::Bishop => PieceKind::Bishop,
            Self::Rook => PieceKind::Rook,
            Self::Queen => PieceKind::Queen,
        }
    }
}
impl From<PromotionTarget> for PieceKind {
    fn from(value: PromotionTarget) -> Self {
        value.to_piece_kind()
    }
}
impl PartialFromStr for PromotionTarget {
    type Err = PieceParseError;

    fn partial_from_str(s: &str) -> Result<(Self, &str), Self::Err> {
        let symbol = s.chars().next().ok_or(PieceParseError::EmptyInput)?;
        let kind = PieceKind::from_symbol(symbol)?;
        let target =
            Self::from_piece_kind(kind).ok_or(PieceParseError::InvalidPromotionTarget(kind))?;
        Ok((target, &s[symbol.len_utf8()..]))
    }
}
impl FromStr for PromotionTarget {
    type Err = PieceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::partial_from_str(s).and_then(|(result, rest)| {
            if rest.is_empty() {
                Ok(result)
            } else {
                Err(PieceParseError::InputTooLong)
            }
        })
    }
}
impl std::fmt::Display for PromotionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_piece_kind())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn promotion_targets_reject_pawns_and_kings() {
        assert_eq!("q".parse(), Ok(PromotionTarget::Queen));
        assert_eq!("N".parse(), Ok(PromotionTarget::Knight));
        assert_eq!(
            "k".parse::<PromotionTarget>(),
            Err(PieceParseError::InvalidPromotionTarget(PieceKind::King))
        );
        assert_eq!(
            "x".parse::<PromotionTarget>(),
            Err(PieceParseError::InvalidPieceSymbol('x'))
        );
    }

    #[test]
    fn symbols_round_trip_colour() {
        for colour in [Colour::White, Colour::Black] {
            for kind in PieceKind::iter() {
                let piece = Piece::new(kind, colour);
                assert_eq!(piece.symbol().to_string().parse(), Ok(piece));
            }
        }
    }
}
