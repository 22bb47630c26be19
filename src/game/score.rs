//! # Utilities to handle scores in Chess (centipawns, mates, win probability)
//!
//! Scores are always given from White's point of view: positive values favour
//! White, negative ones favour Black.

use super::colour::Colour;

pub type WinProbability = f32;
pub type CentiPawns = i32;

/// Centipawn difference that shifts the odds by a factor of ten.
const CP_TO_WIN_PROB_CONST: f32 = 400.;

/// Evaluation of a position, from White's point of view.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Default)]
pub enum Score {
    /// Material-like advantage, in hundredths of a pawn.
    Centipawns(CentiPawns),
    /// Forced mate in the given number of moves. Negative when Black mates.
    MateIn(i32),
    /// No evaluation could be obtained.
    #[default]
    Unavailable,
}
impl Score {
    /// Converts a score given relative to the side to move into a score from
    /// White's point of view.
    /// # Example
    /// ```
    /// # use kibitzer::game::{score::Score, colour::Colour};
    /// assert_eq!(Score::Centipawns(35).from_side_to_move(Colour::Black), Score::Centipawns(-35));
    /// assert_eq!(Score::MateIn(2).from_side_to_move(Colour::White), Score::MateIn(2));
    /// ```
    pub fn from_side_to_move(self, side_to_move: Colour) -> Self {
        match (self, side_to_move) {
            (Self::Centipawns(cp), Colour::Black) => Self::Centipawns(-cp),
            (Self::MateIn(n), Colour::Black) => Self::MateIn(-n),
            _ => self,
        }
    }

    /// Checks if an evaluation was obtained.
    pub fn is_available(self) -> bool {
        self != Self::Unavailable
    }

    /// Share of an evaluation bar that should be White's, between 0 and 1.
    ///
    /// Centipawn scores are clamped to `[-clamp, clamp]` first, mates fill the
    /// bar for the mating side, and unavailable scores give an even bar.
    /// # Example
    /// ```
    /// # use kibitzer::game::score::Score;
    /// assert_eq!(Score::Centipawns(0).bar_fraction(1000), 0.5);
    /// assert_eq!(Score::Centipawns(2500).bar_fraction(1000), 1.);
    /// assert_eq!(Score::MateIn(-3).bar_fraction(1000), 0.);
    /// ```
    pub fn bar_fraction(self, clamp: CentiPawns) -> f32 {
        match self {
            Self::Centipawns(cp) => {
                let clamp = clamp.max(1);
                let cp = cp.clamp(-clamp, clamp);
                (cp + clamp) as f32 / (2 * clamp) as f32
            }
            Self::MateIn(n) if n < 0 => 0.,
            Self::MateIn(_) => 1.,
            Self::Unavailable => 0.5,
        }
    }

    /// Expected winning chances of White.
    pub fn win_probability(self) -> Option<WinProbability> {
        match self {
            Self::Centipawns(cp) => Some(centipawns_to_win_probability(cp)),
            Self::MateIn(n) => Some(if n < 0 { 0. } else { 1. }),
            Self::Unavailable => None,
        }
    }
}
impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Centipawns(cp) => write!(f, "{:+.2}", *cp as f32 / 100.),
            Self::MateIn(n) => write!(f, "#{n}"),
            Self::Unavailable => write!(f, "?"),
        }
    }
}

/// Converts a [`CentiPawns`] score into equivalent [`WinProbability`].
/// # Example
/// ```
/// # use kibitzer::game::score::*;
/// assert_eq!(centipawns_to_win_probability(0), 0.5);
/// ```
pub fn centipawns_to_win_probability(cp: CentiPawns) -> WinProbability {
    1. / (1. + 10f32.powf(-(cp as f32) / CP_TO_WIN_PROB_CONST))
}
