//! # Forsyth-Edwards Notation (FEN) utilities.
//!
//! Allows parsing, formatting and provides a clean API over FEN strings. FEN is
//! also the format positions are sent in to evaluation engines.

use thiserror::Error;

use crate::parsing::{parse_char, split_digits, PartialFromStr};

use super::{
    castling_rights::{CastlingParseError, CastlingRights},
    colour::Colour,
    piece::{Piece, PieceKind, PieceParseError},
    position::Position,
    square::{Rank, Square, SquareParseError},
};

/// FEN of the initial position of chess.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// FEN string representation.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Fen {
    pub(crate) board: [Option<Piece>; 64],
    pub side_to_move: Colour,
    pub castling_rights: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u16,
    pub fullmove_number: u16,
}
impl Fen {
    /// Parses a FEN string.
    /// # Example
    /// ```
    /// # use kibitzer::game::fen::*;
    /// # use kibitzer::game::castling_rights::*;
    /// # use kibitzer::game::colour::*;
    /// let parsed_values = Fen::parse(STARTING_FEN).unwrap();
    /// assert_eq!(parsed_values.side_to_move, Colour::White);
    /// assert_eq!(parsed_values.castling_rights, CastlingRights::full());
    /// ```
    pub fn parse(fen: &str) -> Result<Self, FenParseError> {
        fen.parse()
    }

    /// Returns the piece on a given square if any.
    /// # Example
    /// ```
    /// # use kibitzer::game::fen::*;
    /// # use kibitzer::game::colour::*;
    /// # use kibitzer::game::piece::*;
    /// # use kibitzer::game::square::*;
    /// let parsed_values = Fen::parse(STARTING_FEN).unwrap();
    /// assert_eq!(parsed_values.piece_on(Square::E2), Some(Piece::new(PieceKind::Pawn, Colour::White)));
    /// ```
    pub fn piece_on(&self, square: Square) -> Option<Piece> {
        self.board[square.index()]
    }
}

/// FEN parsing errors.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Error)]
pub enum FenParseError {
    #[error("Missing section separator")]
    MissingSeparator,
    #[error("Rank {rank} of the piece section is missing {undefined} squares")]
    IncompleteRank { rank: Rank, undefined: u8 },
    #[error("Rank {0} of the piece section defines more than 8 squares")]
    TooManySquares(Rank),
    #[error("The piece section defines at least one non-existing rank")]
    TooManyRanks,
    #[error("Failed to parse a piece symbol: {0}")]
    InvalidPiece(PieceParseError),
    #[error("Failed to parse the side to move")]
    InvalidSideToMove,
    #[error("Castling rights could not be parsed: {0}")]
    InvalidCastlingRights(CastlingParseError),
    #[error("En passant square could not be parsed: {0}")]
    InvalidEnPassantSquare(SquareParseError),
    #[error("Incompatible en passant rank: expected {expected}, got {got}")]
    InvalidEnPassantRank { expected: Rank, got: Rank },
    #[error("{colour} has {count} kings, expected exactly one")]
    InvalidKingCount { colour: Colour, count: u8 },
    #[error("The {0} does not fit in 16 bits")]
    CounterOutOfRange(&'static str),
    #[error("Some part of the input was left after parsing the FEN string")]
    InputTooLong,
}

/// Parses an optional move counter.
fn parse_counter<'a>(
    s: &'a str,
    counter: &'static str,
) -> Result<(Option<u16>, &'a str), FenParseError> {
    match split_digits(s) {
        Some((digits, rest)) => {
            let value = digits
                .parse()
                .map_err(|_| FenParseError::CounterOutOfRange(counter))?;
            Ok((Some(value), rest))
        }
        None => Ok((None, s)),
    }
}

fn parse_piece_section(mut s: &str) -> Result<([Option<Piece>; 64], &str), FenParseError> {
    let mut board = [None; 64];
    let mut ranks = Rank::iter().rev();
    let mut current_rank = ranks.next().ok_or(FenParseError::TooManyRanks)?;
    let mut squares = Square::rank_squares_iter(current_rank);

    while let Some(c) = s.chars().next() {
        if let Some(digit) = c.to_digit(10) {
            for _ in 0..digit {
                squares
                    .next()
                    .ok_or(FenParseError::TooManySquares(current_rank))?;
            }
            s = &s[1..];
        } else if c == '/' {
            let left = squares.count() as u8;
            if left != 0 {
                return Err(FenParseError::IncompleteRank {
                    rank: current_rank,
                    undefined: left,
                });
            }
            current_rank = ranks.next().ok_or(FenParseError::TooManyRanks)?;
            squares = Square::rank_squares_iter(current_rank);
            s = &s[1..];
        } else if c == ' ' {
            break;
        } else {
            let (piece, left) = Piece::partial_from_str(s).map_err(FenParseError::InvalidPiece)?;
            let square = squares
                .next()
                .ok_or(FenParseError::TooManySquares(current_rank))?;
            board[square.index()] = Some(piece);
            s = left
        }
    }

    let left = squares.count() as u8;
    if left != 0 {
        Err(FenParseError::IncompleteRank {
            rank: current_rank,
            undefined: left,
        })
    } else if let Some(rank) = ranks.next() {
        Err(FenParseError::IncompleteRank { rank, undefined: 8 })
    } else {
        Ok((board, s))
    }
}

fn check_kings(board: &[Option<Piece>; 64]) -> Result<(), FenParseError> {
    for colour in [Colour::White, Colour::Black] {
        let count = board
            .iter()
            .flatten()
            .filter(|p| **p == Piece::new(PieceKind::King, colour))
            .count() as u8;
        if count != 1 {
            return Err(FenParseError::InvalidKingCount { colour, count });
        }
    }
    Ok(())
}

impl PartialFromStr for Fen {
    type Err = FenParseError;

    fn partial_from_str(s: &str) -> Result<(Self, &str), Self::Err> {
        let (board, s) = parse_piece_section(s)?;
        check_kings(&board)?;

        let s = parse_char(s, ' ').map_err(|_| FenParseError::MissingSeparator)?;
        let side_to_move = match s.chars().next() {
            Some('w') => Colour::White,
            Some('b') => Colour::Black,
            _ => Err(FenParseError::InvalidSideToMove)?,
        };
        let s = &s[1..];

        let s = parse_char(s, ' ').map_err(|_| FenParseError::MissingSeparator)?;
        let (castling_rights, s) =
            CastlingRights::partial_from_str(s).map_err(FenParseError::InvalidCastlingRights)?;

        let s = parse_char(s, ' ').map_err(|_| FenParseError::MissingSeparator)?;
        let (en_passant, s) = match s.strip_prefix('-') {
            Some(s) => (None, s),
            None => {
                let (square, s) =
                    Square::partial_from_str(s).map_err(FenParseError::InvalidEnPassantSquare)?;
                let expected = if side_to_move.is_black() {
                    Rank::Three
                } else {
                    Rank::Six
                };
                if square.rank() != expected {
                    return Err(FenParseError::InvalidEnPassantRank {
                        expected,
                        got: square.rank(),
                    });
                }
                (Some(square), s)
            }
        };

        // Move counters are optional, a lot of tools omit them.
        let s = parse_char(s, ' ').unwrap_or(s);
        let (halfmove_clock, s) = parse_counter(s, "halfmove clock")?;
        let s = parse_char(s, ' ').unwrap_or(s);
        let (fullmove_number, s) = parse_counter(s, "fullmove number")?;

        Ok((
            Self {
                board,
                side_to_move,
                castling_rights,
                en_passant,
                halfmove_clock: halfmove_clock.unwrap_or(0),
                fullmove_number: fullmove_number.unwrap_or(1).max(1),
            },
            s,
        ))
    }
}
impl std::str::FromStr for Fen {
    type Err = FenParseError;

    fn from_str(fen_str: &str) -> Result<Self, Self::Err> {
        Self::partial_from_str(fen_str.trim()).and_then(|(fen, s)| {
            if s.is_empty() {
                Ok(fen)
            } else {
                Err(FenParseError::InputTooLong)
            }
        })
    }
}
impl std::fmt::Display for Fen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for rank in Rank::iter().rev() {
            let mut skip = 0;
            for square in Square::rank_squares_iter(rank) {
                match self.piece_on(square) {
                    Some(piece) => {
                        if skip != 0 {
                            write!(f, "{skip}")?;
                            skip = 0
                        }
                        write!(f, "{piece}")?
                    }
                    None => skip += 1,
                }
            }
            if skip != 0 {
                write!(f, "{skip}")?
            }
            if rank != Rank::One {
                write!(f, "/")?
            }
        }

        write!(
            f,
            " {} {} ",
            if self.side_to_move.is_black() {
                'b'
            } else {
                'w'
            },
            self.castling_rights,
        )?;
        match self.en_passant {
            Some(square) => write!(f, "{square}")?,
            None => write!(f, "-")?,
        }
        write!(f, " {} {}", self.halfmove_clock, self.fullmove_number)
    }
}
impl std::fmt::Debug for Fen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fen({self})")
    }
}
impl From<Position> for Fen {
    fn from(p: Position) -> Fen {
        p.fen()
    }
}
impl From<&Position> for Fen {
    fn from(p: &Position) -> Fen {
        p.fen()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    #[test]
    fn fen_round_trips() {
        for fen in [
            STARTING_FEN,
            KIWIPETE,
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
            "8/8/8/8/8/8/k7/7K b - - 12 40",
        ] {
            assert_eq!(Fen::parse(fen).unwrap().to_string(), fen)
        }
    }

    #[test]
    fn counters_are_optional() {
        let fen = Fen::parse("8/8/8/8/8/8/k7/7K w - -").unwrap();
        assert_eq!(fen.halfmove_clock, 0);
        assert_eq!(fen.fullmove_number, 1);
    }

    #[test]
    fn counters_must_fit() {
        let fen: Fen = "4k3/8/8/8/8/8/8/4K3 w - - 65535 65535".parse().unwrap();
        assert_eq!(fen.halfmove_clock, u16::MAX);
        assert_eq!(fen.fullmove_number, u16::MAX);

        assert_eq!(
            "4k3/8/8/8/8/8/8/4K3 w - - 70000 1".parse::<Fen>(),
            Err(FenParseError::CounterOutOfRange("halfmove clock"))
        );
        assert_eq!(
            "4k3/8/8/8/8/8/8/4K3 w - - 0 65536".parse::<Fen>(),
            Err(FenParseError::CounterOutOfRange("fullmove number"))
        );
    }

    #[test]
    fn malformed_piece_sections() {
        assert_eq!(
            Fen::parse("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPP/RNBQKBNR w KQkq - 0 1"),
            Err(FenParseError::IncompleteRank {
                rank: Rank::Two,
                undefined: 1
            })
        );
        assert_eq!(
            Fen::parse("rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            Err(FenParseError::TooManySquares(Rank::Six))
        );
        assert_eq!(
            Fen::parse("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1"),
            Err(FenParseError::IncompleteRank {
                rank: Rank::One,
                undefined: 8
            })
        );
        assert_eq!(
            Fen::parse("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR/8 w KQkq - 0 1"),
            Err(FenParseError::TooManyRanks)
        );
    }

    #[test]
    fn king_count_is_validated() {
        assert_eq!(
            Fen::parse("8/8/8/8/8/8/8/7K w - - 0 1"),
            Err(FenParseError::InvalidKingCount {
                colour: Colour::Black,
                count: 0
            })
        );
        assert_eq!(
            Fen::parse("k7/8/8/8/8/8/8/K6K w - - 0 1"),
            Err(FenParseError::InvalidKingCount {
                colour: Colour::White,
                count: 2
            })
        );
    }

    #[test]
    fn en_passant_rank_follows_side_to_move() {
        assert_eq!(
            Fen::parse("4k3/8/8/8/4P3/8/8/4K3 w - e3 0 1"),
            Err(FenParseError::InvalidEnPassantRank {
                expected: Rank::Six,
                got: Rank::Three
            })
        );
        assert!(Fen::parse("4k3/8/8/8/4P3/8/8/4K3 b - e3 0 1").is_ok());
    }
}
