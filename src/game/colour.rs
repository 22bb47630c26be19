//! Colours for each players and their pieces.

use super::square::Rank;

/// Colour enumeration.
#[repr(u8)]
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug, Hash)]
pub enum Colour {
    White = 0,
    Black = 1,
}
impl Colour {
    /// Inverts the colour in place.
    /// # Example
    /// ```
    /// # use kibitzer::game::colour::Colour;
    /// let mut side_to_move = Colour::White;
    /// side_to_move.invert();
    /// assert_eq!(side_to_move, Colour::Black);
    /// ```
    #[inline]
    pub fn invert(&mut self) {
        *self = self.inverse()
    }

    /// Returns the inverse of this colour.
    /// # Example
    /// ```
    /// # use kibitzer::game::colour::Colour;
    /// assert_eq!(Colour::White.inverse(), Colour::Black);
    /// ```
    #[inline]
    pub const fn inverse(&self) -> Self {
        if self.is_black() {
            Colour::White
        } else {
            Colour::Black
        }
    }

    /// Checks if the colour variant is white.
    #[inline]
    pub const fn is_white(&self) -> bool {
        matches!(self, Colour::White)
    }

    /// Checks if the colour variant is black.
    #[inline]
    pub const fn is_black(&self) -> bool {
        matches!(self, Colour::Black)
    }

    /// Rank direction in which this colour's pawns advance.
    #[inline]
    pub const fn forward(&self) -> i8 {
        if self.is_black() {
            -1
        } else {
            1
        }
    }

    /// Rank on which this colour's pieces start (1 for white, 8 for black).
    #[inline]
    pub const fn back_rank(&self) -> Rank {
        if self.is_black() {
            Rank::Eight
        } else {
            Rank::One
        }
    }

    /// Rank on which this colour's pawns start.
    #[inline]
    pub const fn pawn_rank(&self) -> Rank {
        if self.is_black() {
            Rank::Seven
        } else {
            Rank::Two
        }
    }

    /// Rank on which this colour's pawns promote.
    #[inline]
    pub const fn promotion_rank(&self) -> Rank {
        self.inverse().back_rank()
    }
}
impl std::fmt::Display for Colour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", if self.is_black() { "Black" } else { "White" })
    }
}
impl From<bool> for Colour {
    fn from(value: bool) -> Self {
        if value {
            Self::Black
        } else {
            Self::White
        }
    }
}
