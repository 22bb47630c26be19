use std::str::FromStr;

use thiserror::Error;

use crate::parsing::PartialFromStr;

use super::{
    colour::Colour,
    square::Square,
    zobrist::{self, CASTLING_RIGHTS_OFFSET},
};

/// Efficient representation of castling rights.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct CastlingRights(u8);
impl CastlingRights {
    const KINGSIDE_WHITE: u8 = 0b0001;
    const QUEENSIDE_WHITE: u8 = 0b0010;
    const KINGSIDE_BLACK: u8 = 0b0100;
    const QUEENSIDE_BLACK: u8 = 0b1000;
    const FULL: u8 =
        Self::KINGSIDE_BLACK | Self::KINGSIDE_WHITE | Self::QUEENSIDE_BLACK | Self::QUEENSIDE_WHITE;
    const EMPTY: u8 = 0;

    /// Full castling rights for both sides.
    pub const fn full() -> Self {
        Self(Self::FULL)
    }

    /// No castling rights for any sides.
    pub const fn none() -> Self {
        Self(Self::EMPTY)
    }

    /// Returns `true` if none of the sides can castle.
    pub const fn is_none(self) -> bool {
        self.0 == Self::EMPTY
    }

    const fn kingside_bit(colour: Colour) -> u8 {
        if colour.is_black() {
            Self::KINGSIDE_BLACK
        } else {
            Self::KINGSIDE_WHITE
        }
    }

    const fn queenside_bit(colour: Colour) -> u8 {
        if colour.is_black() {
            Self::QUEENSIDE_BLACK
        } else {
            Self::QUEENSIDE_WHITE
        }
    }

    /// Checks if kingside castling is allowed for a certain colour.
    #[inline(always)]
    pub const fn kingside_castle_allowed(self, colour: Colour) -> bool {
        self.0 & Self::kingside_bit(colour) != 0
    }

    /// Checks if queenside castling is allowed for a certain colour.
    #[inline(always)]
    pub const fn queenside_castle_allowed(self, colour: Colour) -> bool {
        self.0 & Self::queenside_bit(colour) != 0
    }

    /// Disallows kingside castling for a given side.
    #[inline(always)]
    pub fn disallow_kingside_castle(&mut self, colour: Colour) {
        self.0 &= !Self::kingside_bit(colour)
    }

    /// Disallows queenside castling for a given side.
    #[inline(always)]
    pub fn disallow_queenside_castle(&mut self, colour: Colour) {
        self.0 &= !Self::queenside_bit(colour)
    }

    /// Disallows both castling moves for a given side.
    pub fn disallow(&mut self, colour: Colour) {
        self.0 &= !(Self::kingside_bit(colour) | Self::queenside_bit(colour))
    }

    /// Removes the rights tied to a rook or king standing on `square`.
    ///
    /// Called with both the origin and target of every move: a king or rook
    /// leaving its home square, or a rook being captured on it, loses the right
    /// for good.
    pub fn update_for_square(&mut self, square: Square) {
        match square {
            Square::E1 => self.disallow(Colour::White),
            Square::E8 => self.disallow(Colour::Black),
            Square::H1 => self.disallow_kingside_castle(Colour::White),
            Square::A1 => self.disallow_queenside_castle(Colour::White),
            Square::H8 => self.disallow_kingside_castle(Colour::Black),
            Square::A8 => self.disallow_queenside_castle(Colour::Black),
            _ => (),
        }
    }

    /// Returns the Zobrist hash of these castling rights.
    #[inline(always)]
    pub(crate) fn zobrist_hash(self) -> u64 {
        (0..4u8)
            .filter(|&i| self.0 & (1 << i) != 0)
            .fold(0, |hash, i| {
                hash ^ zobrist::key(CASTLING_RIGHTS_OFFSET + i as usize)
            })
    }
}

/// Castling rights parsing errors.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Error)]
pub enum CastlingParseError {
    #[error("Empty castling rights section")]
    EmptyInput,
    #[error("Unexpected character {0} in castling rights")]
    UnexpectedCharacter(char),
    #[error("Castling rights contain trailing characters")]
    InputTooLong,
}
impl PartialFromStr for CastlingRights {
    type Err = CastlingParseError;

    fn partial_from_str(mut s: &str) -> Result<(Self, &str), Self::Err> {
        if let Some(rest) = s.strip_prefix('-') {
            return Ok((Self::none(), rest));
        }

        let mut rights = Self::EMPTY;
        while let Some(c) = s.chars().next() {
            let bit = match c {
                'K' => Self::KINGSIDE_WHITE,
                'Q' => Self::QUEENSIDE_WHITE,
                'k' => Self::KINGSIDE_BLACK,
                'q' => Self::QUEENSIDE_BLACK,
                _ => break,
            };
            if rights & bit != 0 {
                return Err(CastlingParseError::UnexpectedCharacter(c));
            }
            rights |= bit;
            s = &s[1..]
        }

        if rights == Self::EMPTY {
            Err(match s.chars().next() {
                Some(c) => CastlingParseError::UnexpectedCharacter(c),
                None => CastlingParseError::EmptyInput,
            })
        } else {
            Ok((Self(rights), s))
        }
    }
}
impl FromStr for CastlingRights {
    type Err = CastlingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::partial_from_str(s).and_then(|(rights, rest)| {
            if rest.is_empty() {
                Ok(rights)
            } else {
                Err(CastlingParseError::InputTooLong)
            }
        })
    }
}
impl std::fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            return write!(f, "-");
        }

        if self.kingside_castle_allowed(Colour::White) {
            write!(f, "K")?
        }
        if self.queenside_castle_allowed(Colour::White) {
            write!(f, "Q")?
        }
        if self.kingside_castle_allowed(Colour::Black) {
            write!(f, "k")?
        }
        if self.queenside_castle_allowed(Colour::Black) {
            write!(f, "q")?
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rights_format_in_fen_order() {
        assert_eq!(CastlingRights::full().to_string(), "KQkq");
        assert_eq!(CastlingRights::none().to_string(), "-");
        assert_eq!("Kq".parse::<CastlingRights>().unwrap().to_string(), "Kq");
    }

    #[test]
    fn duplicated_rights_are_rejected() {
        assert_eq!(
            "KK".parse::<CastlingRights>(),
            Err(CastlingParseError::UnexpectedCharacter('K'))
        );
    }

    #[test]
    fn rook_capture_removes_one_side() {
        let mut rights = CastlingRights::full();
        rights.update_for_square(Square::H8);
        assert!(!rights.kingside_castle_allowed(Colour::Black));
        assert!(rights.queenside_castle_allowed(Colour::Black));
        rights.update_for_square(Square::E1);
        assert!(!rights.kingside_castle_allowed(Colour::White));
        assert!(!rights.queenside_castle_allowed(Colour::White));
    }
}
