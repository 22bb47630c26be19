//! # Moves
//!
//! A [`Move`] is a plain from-to \<promotion\> triple. It carries no information
//! about the position it is played in, and is only legal relative to one.

use std::str::FromStr;

use thiserror::Error;

use crate::parsing::PartialFromStr;

use super::{
    piece::{PieceKind, PieceParseError, PromotionTarget},
    square::{File, Rank, Square, SquareParseError},
};

/// Describes a move using a from-to \<promotion\> approach.
///
/// Equality is structural: two moves are equal when their origin, target and
/// promotion are.
///
/// # Parsing
/// Moves parse from and display as long algebraic notation, which is the UCI
/// move format.
/// ```
/// # use kibitzer::game::moves::*;
/// # use kibitzer::game::square::*;
/// # use kibitzer::game::piece::*;
/// let mv: Move = "e7e8q".parse().unwrap();
/// assert_eq!(mv, Move::new_promotion(Square::E7, Square::E8, PromotionTarget::Queen));
/// assert_eq!(mv.to_string(), "e7e8q");
/// ```
#[derive(Clone, Copy, Hash, Eq, PartialEq, Debug)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PromotionTarget>,
}
impl Move {
    /// Creates a new non-promoting move.
    #[inline(always)]
    pub const fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    /// Creates a new promoting move.
    #[inline(always)]
    pub const fn new_promotion(from: Square, to: Square, promoting_to: PromotionTarget) -> Self {
        Self {
            from,
            to,
            promotion: Some(promoting_to),
        }
    }

    /// Creates the four promotions of a pawn move, queen first.
    pub fn new_promotions(from: Square, to: Square) -> [Self; 4] {
        PromotionTarget::ALL.map(|target| Self::new_promotion(from, to, target))
    }
}
impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(target) = self.promotion {
            write!(f, "{target}")?
        }
        Ok(())
    }
}

/// Long algebraic move parsing errors.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Error)]
pub enum MoveParseError {
    #[error("Invalid origin square: {0}")]
    InvalidOrigin(SquareParseError),
    #[error("Invalid target square: {0}")]
    InvalidTarget(SquareParseError),
    #[error("Invalid promotion: {0}")]
    InvalidPromotion(PieceParseError),
    #[error("Some part of the input was left after parsing the move")]
    InputTooLong,
}
impl PartialFromStr for Move {
    type Err = MoveParseError;

    fn partial_from_str(s: &str) -> Result<(Self, &str), Self::Err> {
        let (from, s) = Square::partial_from_str(s).map_err(MoveParseError::InvalidOrigin)?;
        let (to, s) = Square::partial_from_str(s).map_err(MoveParseError::InvalidTarget)?;
        let (promotion, s) = match s.chars().next() {
            Some(c) if c.is_ascii_alphabetic() => {
                let (target, s) = PromotionTarget::partial_from_str(s)
                    .map_err(MoveParseError::InvalidPromotion)?;
                (Some(target), s)
            }
            _ => (None, s),
        };
        Ok((
            Self {
                from,
                to,
                promotion,
            },
            s,
        ))
    }
}
impl FromStr for Move {
    type Err = MoveParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::partial_from_str(s).and_then(|(mv, rest)| {
            if rest.is_empty() {
                Ok(mv)
            } else {
                Err(MoveParseError::InputTooLong)
            }
        })
    }
}

/// Check information appended to a SAN move.
#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
pub enum CheckMarker {
    Check,
    Checkmate,
}

/// Standard Algebraic Notation encoded move, for human-readable move lists.
#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
pub struct SanMove {
    pub move_kind: SanMoveKind,
    pub check: Option<CheckMarker>,
}

/// The body of a SAN move, without check markers.
#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
pub enum SanMoveKind {
    PawnPush {
        target: Square,
        promoting_to: Option<PromotionTarget>,
    },
    PawnCapture {
        origin_file: File,
        target: Square,
        promoting_to: Option<PromotionTarget>,
    },
    PieceMove {
        moving_piece: PieceKind,
        origin_file: Option<File>,
        origin_rank: Option<Rank>,
        is_capture: bool,
        target: Square,
    },
    KingSideCastle,
    QueenSideCastle,
}
impl std::fmt::Display for SanMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.move_kind {
            SanMoveKind::PawnPush {
                target,
                promoting_to,
            } => {
                write!(f, "{target}")?;
                if let Some(kind) = promoting_to {
                    write!(f, "={}", kind.to_piece_kind().san_letter())?
                }
            }
            SanMoveKind::PawnCapture {
                origin_file,
                target,
                promoting_to,
            } => {
                write!(f, "{origin_file}x{target}")?;
                if let Some(kind) = promoting_to {
                    write!(f, "={}", kind.to_piece_kind().san_letter())?
                }
            }
            SanMoveKind::PieceMove {
                moving_piece,
                origin_file,
                origin_rank,
                is_capture,
                target,
            } => {
                write!(f, "{}", moving_piece.san_letter())?;
                if let Some(file) = origin_file {
                    write!(f, "{file}")?
                }
                if let Some(rank) = origin_rank {
                    write!(f, "{rank}")?
                }
                if is_capture {
                    write!(f, "x")?
                }
                write!(f, "{target}")?
            }
            SanMoveKind::KingSideCastle => write!(f, "O-O")?,
            SanMoveKind::QueenSideCastle => write!(f, "O-O-O")?,
        }
        match self.check {
            Some(CheckMarker::Check) => write!(f, "+"),
            Some(CheckMarker::Checkmate) => write!(f, "#"),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn long_algebraic_parsing() {
        assert_eq!("g1f3".parse(), Ok(Move::new(Square::G1, Square::F3)));
        assert_eq!(
            "e2e4x".parse::<Move>(),
            Err(MoveParseError::InvalidPromotion(
                PieceParseError::InvalidPieceSymbol('x')
            ))
        );
        assert_eq!(
            "a7a8k".parse::<Move>(),
            Err(MoveParseError::InvalidPromotion(
                PieceParseError::InvalidPromotionTarget(PieceKind::King)
            ))
        );
        assert_eq!("e2e4 ".parse::<Move>(), Err(MoveParseError::InputTooLong));
        assert!(matches!(
            "e2".parse::<Move>(),
            Err(MoveParseError::InvalidTarget(_))
        ));
    }

    #[test]
    fn san_display() {
        let castle = SanMove {
            move_kind: SanMoveKind::QueenSideCastle,
            check: Some(CheckMarker::Check),
        };
        assert_eq!(castle.to_string(), "O-O-O+");

        let promotion = SanMove {
            move_kind: SanMoveKind::PawnCapture {
                origin_file: File::D,
                target: Square::E8,
                promoting_to: Some(PromotionTarget::Knight),
            },
            check: Some(CheckMarker::Checkmate),
        };
        assert_eq!(promotion.to_string(), "dxe8=N#");

        let knight = SanMove {
            move_kind: SanMoveKind::PieceMove {
                moving_piece: PieceKind::Knight,
                origin_file: Some(File::B),
                origin_rank: None,
                is_capture: true,
                target: Square::D2,
            },
            check: None,
        };
        assert_eq!(knight.to_string(), "Nbxd2");
    }
}
