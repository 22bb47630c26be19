//! Enumerations of chessboard accessing constants, such as files, ranks and squares.
//!
//! Squares are indexed from 0 (A1) to 63 (H8), with `file = index % 8` and
//! `rank = index / 8`.

use std::str::FromStr;

use thiserror::Error;

use crate::parsing::PartialFromStr;

/// Files of a chessboard (A-H).
#[repr(u8)]
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum File {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}
impl File {
    /// A file from a given index.
    ///
    /// Returns `None` if the index is more than 7.
    #[inline]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < 8 {
            // SAFETY: `File` is `repr(u8)` with contiguous discriminants 0..=7.
            Some(unsafe { std::mem::transmute::<u8, File>(index) })
        } else {
            None
        }
    }

    /// Iterator over all files, from A to H.
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> {
        (0..8).filter_map(Self::from_index)
    }

    /// Returns the lowercase letter of this file.
    pub const fn to_char(self) -> char {
        (b'a' + self as u8) as char
    }
}
impl std::fmt::Display for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Ranks of a chessboard (1-8).
#[repr(u8)]
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum Rank {
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
}
impl Rank {
    /// A rank from a given index.
    ///
    /// Returns `None` if the index is more than 7.
    #[inline]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < 8 {
            // SAFETY: `Rank` is `repr(u8)` with contiguous discriminants 0..=7.
            Some(unsafe { std::mem::transmute::<u8, Rank>(index) })
        } else {
            None
        }
    }

    /// Iterator over all ranks, from 1 to 8.
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> {
        (0..8).filter_map(Self::from_index)
    }

    /// Returns the digit of this rank.
    pub const fn to_char(self) -> char {
        (b'1' + self as u8) as char
    }
}
impl std::fmt::Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// General square indexing for an 8x8 board.
#[repr(u8)]
#[rustfmt::skip]
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum Square {
    A1, B1, C1, D1, E1, F1, G1, H1,
    A2, B2, C2, D2, E2, F2, G2, H2,
    A3, B3, C3, D3, E3, F3, G3, H3,
    A4, B4, C4, D4, E4, F4, G4, H4,
    A5, B5, C5, D5, E5, F5, G5, H5,
    A6, B6, C6, D6, E6, F6, G6, H6,
    A7, B7, C7, D7, E7, F7, G7, H7,
    A8, B8, C8, D8, E8, F8, G8, H8,
}
impl Square {
    /// Instantiates a new square based on file and rank.
    /// # Example
    /// ```
    /// # use kibitzer::game::square::*;
    /// assert_eq!(Square::new(File::E, Rank::Four), Square::E4);
    /// ```
    #[inline]
    pub const fn new(file: File, rank: Rank) -> Self {
        // SAFETY: both components are below 8, so the index is below 64.
        unsafe { std::mem::transmute::<u8, Square>((rank as u8) << 3 | file as u8) }
    }

    /// Instantiates a new square from its index.
    ///
    /// Returns `None` if the index is more than 63.
    #[inline]
    pub const fn from_index(index: u8) -> Option<Self> {
        if index < 64 {
            // SAFETY: `Square` is `repr(u8)` with contiguous discriminants 0..=63.
            Some(unsafe { std::mem::transmute::<u8, Square>(index) })
        } else {
            None
        }
    }

    /// Instantiates a square from zero-based file and rank coordinates.
    /// # Example
    /// ```
    /// # use kibitzer::game::square::*;
    /// assert_eq!(Square::from_coords(6, 0), Some(Square::G1));
    /// assert_eq!(Square::from_coords(8, 0), None);
    /// ```
    pub const fn from_coords(file: u8, rank: u8) -> Option<Self> {
        match (File::from_index(file), Rank::from_index(rank)) {
            (Some(file), Some(rank)) => Some(Self::new(file, rank)),
            _ => None,
        }
    }

    /// Returns the index of this square, between 0 and 63.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the rank of the square.
    #[inline]
    pub const fn rank(self) -> Rank {
        match Rank::from_index(self as u8 >> 3) {
            Some(rank) => rank,
            None => unreachable!(),
        }
    }

    /// Returns the file of the square.
    #[inline]
    pub const fn file(self) -> File {
        match File::from_index(self as u8 & 7) {
            Some(file) => file,
            None => unreachable!(),
        }
    }

    /// Moves this square by a number of files and ranks.
    ///
    /// Returns `None` if the result would be out of the board.
    #[inline]
    pub const fn offset(self, files: i8, ranks: i8) -> Option<Self> {
        let file = self.file() as i8 + files;
        let rank = self.rank() as i8 + ranks;
        if file < 0 || rank < 0 {
            return None;
        }
        Self::from_coords(file as u8, rank as u8)
    }

    /// Translates this square by a given delta.
    ///
    /// Returns `None` if the translation would go out of the board.
    #[inline]
    pub const fn translate(self, delta: Delta) -> Option<Self> {
        let (files, ranks) = delta.offsets();
        self.offset(files, ranks)
    }

    /// An iterator over all squares, ordered from A1 to H8.
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> {
        (0..64).filter_map(Self::from_index)
    }

    /// An iterator over the squares of a rank, from the A file to the H file.
    pub fn rank_squares_iter(rank: Rank) -> impl DoubleEndedIterator<Item = Self> {
        File::iter().map(move |file| Self::new(file, rank))
    }
}
impl std::fmt::Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.file(), self.rank())
    }
}

/// Square parsing errors.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Error)]
pub enum SquareParseError {
    #[error("Empty input")]
    EmptyInput,
    #[error("{0} is not a valid file")]
    InvalidFile(char),
    #[error("{0} is not a valid rank")]
    InvalidRank(char),
    #[error("A square is only two characters long")]
    InputTooLong,
}
impl PartialFromStr for Square {
    type Err = SquareParseError;

    fn partial_from_str(s: &str) -> Result<(Self, &str), Self::Err> {
        let mut chars = s.chars();
        let file = chars.next().ok_or(SquareParseError::EmptyInput)?;
        let rank = chars.next().ok_or(SquareParseError::EmptyInput)?;
        let file = match file {
            'a'..='h' => File::from_index(file as u8 - b'a'),
            _ => None,
        }
        .ok_or(SquareParseError::InvalidFile(file))?;
        let rank = match rank {
            '1'..='8' => Rank::from_index(rank as u8 - b'1'),
            _ => None,
        }
        .ok_or(SquareParseError::InvalidRank(rank))?;

        Ok((Self::new(file, rank), &s[2..]))
    }
}
impl FromStr for Square {
    type Err = SquareParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::partial_from_str(s).and_then(|(square, rest)| {
            if rest.is_empty() {
                Ok(square)
            } else {
                Err(SquareParseError::InputTooLong)
            }
        })
    }
}

/// Deltas represent directions in which pieces can move.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum Delta {
    North,
    South,
    East,
    West,

    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,

    KnightNorthEast,
    KnightNorthWest,
    KnightSouthEast,
    KnightSouthWest,
    KnightEastNorth,
    KnightWestNorth,
    KnightEastSouth,
    KnightWestSouth,
}
impl Delta {
    pub const KNIGHT_DELTAS: [Self; 8] = [
        Self::KnightNorthEast,
        Self::KnightNorthWest,
        Self::KnightSouthEast,
        Self::KnightSouthWest,
        Self::KnightEastNorth,
        Self::KnightWestNorth,
        Self::KnightEastSouth,
        Self::KnightWestSouth,
    ];
    pub const ORTHOGONAL_DELTAS: [Self; 4] = [Self::North, Self::South, Self::East, Self::West];
    pub const DIAGONAL_DELTAS: [Self; 4] = [
        Self::NorthEast,
        Self::NorthWest,
        Self::SouthEast,
        Self::SouthWest,
    ];
    pub const QUEEN_DELTAS: [Self; 8] = [
        Self::North,
        Self::South,
        Self::East,
        Self::West,
        Self::NorthEast,
        Self::NorthWest,
        Self::SouthEast,
        Self::SouthWest,
    ];

    /// Returns the (files, ranks) displacement of this delta.
    pub const fn offsets(self) -> (i8, i8) {
        match self {
            Self::North => (0, 1),
            Self::South => (0, -1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
            Self::NorthEast => (1, 1),
            Self::NorthWest => (-1, 1),
            Self::SouthEast => (1, -1),
            Self::SouthWest => (-1, -1),
            Self::KnightNorthEast => (1, 2),
            Self::KnightNorthWest => (-1, 2),
            Self::KnightSouthEast => (1, -2),
            Self::KnightSouthWest => (-1, -2),
            Self::KnightEastNorth => (2, 1),
            Self::KnightWestNorth => (-2, 1),
            Self::KnightEastSouth => (2, -1),
            Self::KnightWestSouth => (-2, -1),
        }
    }
}
