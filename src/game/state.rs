//! # Game state
//!
//! A [`GameState`] owns the current position of a game along with the moves that
//! led to it, and allows taking moves back and playing them again.
//!
//! The current position is maintained incrementally: each applied move records a
//! [`HistoryEntry`] that is enough to restore the position it was played from.
//! Replaying every move of the history from the start position always gives the
//! current position back.

use thiserror::Error;

use super::{
    fen::{Fen, FenParseError},
    history::HistoryEntry,
    movegen::{GameStatus, MoveList},
    moves::{Move, SanMove},
    piece::{Piece, PromotionTarget},
    position::{IllegalMoveError, Position},
    square::Square,
};

/// Returned by [`GameState::undo`] when no move was played.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Error)]
#[error("there is no move to undo")]
pub struct EmptyHistoryError;

/// Returned by [`GameState::redo`] when no move was undone.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Error)]
#[error("there is no move to redo")]
pub struct EmptyRedoError;

/// Summary of a successfully applied move.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct AppliedMove {
    pub played: Move,
    pub san: SanMove,
    pub captured: Option<Piece>,
    /// Status of the game after the move.
    pub status: GameStatus,
}

/// Notation used to render the move list.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Default)]
pub enum Notation {
    /// Long algebraic notation (`e2e4`, `e7e8q`), as spoken over UCI.
    #[default]
    LongAlgebraic,
    /// Standard algebraic notation (`e4`, `Nf3`, `O-O`).
    San,
}

/// A game in progress.
#[derive(Clone, Debug)]
pub struct GameState {
    start: Position,
    position: Position,
    history: Vec<HistoryEntry>,
    redo_stack: Vec<Move>,
}
impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
impl GameState {
    /// Starts a new game from the initial position.
    pub fn new() -> Self {
        Self::from_position(Position::initial())
    }

    /// Starts a new game from a given position.
    pub fn from_position(start: Position) -> Self {
        Self {
            start,
            position: start,
            history: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// Starts a new game from a FEN string.
    /// # Example
    /// ```
    /// # use kibitzer::game::state::GameState;
    /// let game = GameState::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
    /// assert!(game.history().next().is_none());
    /// ```
    pub fn from_fen(fen: &str) -> Result<Self, FenParseError> {
        Ok(Self::from_position(Position::from_fen(&fen.parse::<Fen>()?)))
    }

    /// The position the game started from.
    pub fn start(&self) -> &Position {
        &self.start
    }

    /// The current position.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Legal moves in the current position.
    pub fn legal_moves(&self) -> MoveList {
        self.position.legal_moves()
    }

    /// Legal moves of the piece standing on `from`, if any.
    pub fn legal_moves_from(&self, from: Square) -> MoveList {
        self.legal_moves()
            .into_iter()
            .filter(|mv| mv.from == from)
            .collect()
    }

    /// Squares the piece on `from` can move to, each listed once even when the
    /// move can promote to several pieces.
    pub fn legal_targets(&self, from: Square) -> Vec<Square> {
        let mut targets: Vec<Square> = self.legal_moves_from(from).iter().map(|mv| mv.to).collect();
        targets.dedup();
        targets
    }

    /// Checks if a piece of the side to move stands on `square`.
    pub fn selectable(&self, square: Square) -> bool {
        self.position
            .piece_on(square)
            .is_some_and(|piece| piece.colour == self.position.side_to_move())
    }

    /// Checks if moving from `from` to `to` requires choosing a promotion.
    pub fn needs_promotion(&self, from: Square, to: Square) -> bool {
        self.legal_moves_from(from)
            .iter()
            .any(|mv| mv.to == to && mv.promotion.is_some())
    }

    /// Status of the game in the current position.
    pub fn status(&self) -> GameStatus {
        self.position.status()
    }

    /// Moves played so far, in order.
    pub fn history(&self) -> impl DoubleEndedIterator<Item = Move> + ExactSizeIterator + '_ {
        self.history.iter().map(|entry| entry.played)
    }

    /// The last move played, if any.
    pub fn last_move(&self) -> Option<Move> {
        self.history.last().map(|entry| entry.played)
    }

    /// Moves that were undone and can be redone, the next one last.
    pub fn redo_stack(&self) -> &[Move] {
        &self.redo_stack
    }

    /// Applies a move if it is legal in the current position.
    ///
    /// Promotions must match exactly: a pawn reaching the last rank without a
    /// promotion is illegal, and so is any other move carrying one.
    ///
    /// Clears the moves that could be redone.
    /// # Errors
    /// Returns an [`IllegalMoveError`] and leaves the game untouched if the move
    /// is not legal.
    /// # Example
    /// ```
    /// # use kibitzer::game::state::GameState;
    /// let mut game = GameState::new();
    /// let applied = game.apply_move("g1f3".parse().unwrap()).unwrap();
    /// assert_eq!(applied.san.to_string(), "Nf3");
    /// assert!(game.apply_move("g1f3".parse().unwrap()).is_err());
    /// ```
    pub fn apply_move(&mut self, mv: Move) -> Result<AppliedMove, IllegalMoveError> {
        self.commit(mv, true)
    }

    /// Applies the move from `from` to `to`, with an optional promotion.
    pub fn play(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PromotionTarget>,
    ) -> Result<AppliedMove, IllegalMoveError> {
        self.apply_move(Move {
            from,
            to,
            promotion,
        })
    }

    /// Takes back the last move, which can then be redone.
    pub fn undo(&mut self) -> Result<Move, EmptyHistoryError> {
        let entry = self.history.pop().ok_or(EmptyHistoryError)?;
        self.position = self.position.unmake(&entry);
        self.redo_stack.push(entry.played);
        log::debug!("undid {}", entry.played);
        Ok(entry.played)
    }

    /// Plays the last undone move again, keeping the other undone moves.
    pub fn redo(&mut self) -> Result<Move, EmptyRedoError> {
        let mv = self.redo_stack.pop().ok_or(EmptyRedoError)?;
        match self.commit(mv, false) {
            Ok(_) => Ok(mv),
            // Moves on the redo stack were legal when undone, and the position
            // they apply to was restored exactly.
            Err(IllegalMoveError(mv)) => unreachable!("undone move {mv} became illegal"),
        }
    }

    fn commit(&mut self, mv: Move, clear_redo: bool) -> Result<AppliedMove, IllegalMoveError> {
        let san = self.position.san(mv).ok_or(IllegalMoveError(mv))?;
        let (next, entry) = self.position.make(mv);
        assert!(
            next.king_count(next.side_to_move()) == 1 && next.king_count(entry.moved.colour) == 1,
            "playing {mv} broke the one king per side invariant:\n{next:?}"
        );

        self.position = next;
        self.history.push(entry);
        if clear_redo {
            self.redo_stack.clear()
        }
        log::debug!("played {mv} ({san})");

        Ok(AppliedMove {
            played: mv,
            san,
            captured: entry.captured.map(|(piece, _)| piece),
            status: self.position.status(),
        })
    }

    /// Recomputes the current position by replaying the whole history from the
    /// start position.
    pub fn replay(&self) -> Result<Position, IllegalMoveError> {
        self.history()
            .try_fold(self.start, |position, mv| position.play(mv))
    }

    /// The history as SAN moves.
    pub fn san_history(&self) -> Vec<SanMove> {
        let mut position = self.start;
        self.history()
            .filter_map(|mv| {
                let san = position.san(mv);
                position = position.after(mv);
                san
            })
            .collect()
    }

    /// Numbered move list, one line per full move.
    /// # Example
    /// ```
    /// # use kibitzer::game::state::*;
    /// let mut game = GameState::new();
    /// for mv in ["e2e4", "e7e5", "g1f3"] {
    ///     game.apply_move(mv.parse().unwrap()).unwrap();
    /// }
    /// assert_eq!(game.move_list(Notation::LongAlgebraic), "1. e2e4 e7e5\n2. g1f3 ");
    /// assert_eq!(game.move_list(Notation::San), "1. e4 e5\n2. Nf3 ");
    /// ```
    pub fn move_list(&self, notation: Notation) -> String {
        let moves: Vec<String> = match notation {
            Notation::LongAlgebraic => self.history().map(|mv| mv.to_string()).collect(),
            Notation::San => self.san_history().iter().map(ToString::to_string).collect(),
        };

        let mut list = String::new();
        let mut number = self.start.fullmove_number();
        let mut black_to_move = self.start.side_to_move().is_black();
        if black_to_move && !moves.is_empty() {
            list.push_str(&format!("{number}. ... "));
        }
        for mv in moves {
            if black_to_move {
                list.push_str(&format!("{mv}\n"));
                number += 1;
            } else {
                list.push_str(&format!("{number}. {mv} "));
            }
            black_to_move = !black_to_move;
        }
        list
    }
}
