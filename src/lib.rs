//! # Kibitzer
//! A chess rules engine and game history manager, which asks an external UCI
//! engine what it thinks of the position.
//!
//! The [`game`] module knows the rules: legal moves, check, checkmate and
//! stalemate, and keeps the history of a game so that moves can be taken back
//! and played again. The [`eval`] module scores positions by driving an engine
//! such as Stockfish over the [`uci`] protocol.
//!
//! It is usable as both a library to embed into your own projects and a standalone
//! binary to play through games in a terminal.

pub mod eval;
pub mod game;
pub mod parsing;
pub mod uci;
