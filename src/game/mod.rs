//! # Chess API
//! This module contains everything Chess related: the board, moves, legal move
//! generation, game history and scores.

pub mod castling_rights;
pub mod colour;
pub mod fen;
pub mod history;
pub mod movegen;
pub mod moves;
#[cfg(feature = "perft")]
pub mod perft;
pub mod piece;
pub mod position;
pub mod score;
pub mod square;
pub mod state;
mod zobrist;
