//! # Position evaluation
//!
//! Scores come from an external [`Evaluator`], usually a UCI engine driven by
//! [`engine::UciEngine`]. Evaluations never fail: anything going wrong on the
//! evaluator's side gives [`Score::Unavailable`], and the game goes on without
//! it.

pub mod engine;
pub mod service;

use crate::game::{position::Position, score::Score};

/// Search depth requested when none is configured.
pub const DEFAULT_DEPTH: u8 = 15;

/// Settings of one evaluation request.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct EvaluationOptions {
    /// Strength of the engine, sent as its `Skill Level` option when set.
    pub skill_level: Option<u8>,
    /// Depth to search to, in plies.
    pub depth: u8,
}
impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            skill_level: None,
            depth: DEFAULT_DEPTH,
        }
    }
}
impl EvaluationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the skill level of the engine.
    pub fn with_skill_level(mut self, skill_level: u8) -> Self {
        self.skill_level = Some(skill_level);
        self
    }

    /// Sets the depth to search to. A depth of 0 is raised to 1.
    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = depth.max(1);
        self
    }
}

/// Anything that can score a chess position.
pub trait Evaluator {
    /// Evaluates a position from White's point of view.
    ///
    /// Returns [`Score::Unavailable`] when no evaluation could be obtained.
    fn evaluate(&mut self, position: &Position, options: &EvaluationOptions) -> Score;
}
impl<E: Evaluator + ?Sized> Evaluator for Box<E> {
    fn evaluate(&mut self, position: &Position, options: &EvaluationOptions) -> Score {
        (**self).evaluate(position, options)
    }
}

/// Counts material, for use when no engine is available or in tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaterialCount;
impl Evaluator for MaterialCount {
    fn evaluate(&mut self, position: &Position, _: &EvaluationOptions) -> Score {
        use crate::game::piece::PieceKind;

        let cp: i32 = position
            .pieces()
            .map(|(_, piece)| {
                let value = match piece.kind {
                    PieceKind::Pawn => 100,
                    PieceKind::Knight => 300,
                    PieceKind::Bishop => 300,
                    PieceKind::Rook => 500,
                    PieceKind::Queen => 900,
                    PieceKind::King => 0,
                };
                if piece.colour.is_white() {
                    value
                } else {
                    -value
                }
            })
            .sum();
        Score::Centipawns(cp)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn options_builder() {
        let options = EvaluationOptions::new().with_skill_level(15).with_depth(0);
        assert_eq!(options.skill_level, Some(15));
        assert_eq!(options.depth, 1);
        assert_eq!(EvaluationOptions::default().depth, DEFAULT_DEPTH);
    }

    #[test]
    fn material_count_favours_the_side_ahead() {
        let mut evaluator: Box<dyn Evaluator> = Box::new(MaterialCount);
        let options = EvaluationOptions::default();
        assert_eq!(
            evaluator.evaluate(&Position::initial(), &options),
            Score::Centipawns(0)
        );
        let up_a_queen: Position = "4k3/8/8/8/8/8/8/3QK3 w - - 0 1".parse().unwrap();
        assert_eq!(evaluator.evaluate(&up_a_queen, &options), Score::Centipawns(900));
    }
}
