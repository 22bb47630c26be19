//! # Zobrist hashing keys and utilities

use std::sync::LazyLock;

use rand::{rngs::SmallRng, Rng, SeedableRng};

use super::{
    colour::Colour,
    piece::{Piece, NUM_PIECES},
    square::{File, Square},
};

// We need :
// - one number for each piece on each square (64 * 12)
// - one number for side to move
// - four numbers for castling rights
// - eight numbers for en passant file
static ZOBRIST_KEYS: LazyLock<[u64; 781]> = LazyLock::new(|| {
    let mut rng = SmallRng::seed_from_u64(0x6F2DF0EAF362C1ED);
    let mut keys = [0; 781];
    for key in &mut keys {
        *key = rng.gen()
    }
    keys
});

const SIDE_TO_MOVE_OFFSET: usize = 64 * 12;
pub const CASTLING_RIGHTS_OFFSET: usize = SIDE_TO_MOVE_OFFSET + 1;
const EN_PASSANT_OFFSET: usize = CASTLING_RIGHTS_OFFSET + 4;

#[inline(always)]
pub(crate) fn key(index: usize) -> u64 {
    ZOBRIST_KEYS[index]
}

#[inline(always)]
pub fn piece_hash(piece: Piece, square: Square) -> u64 {
    let piece_index = piece.colour as usize * NUM_PIECES + piece.kind as usize;
    ZOBRIST_KEYS[piece_index * 64 + square.index()]
}

#[inline(always)]
pub fn side_to_move_hash(side: Colour) -> u64 {
    if side.is_black() {
        ZOBRIST_KEYS[SIDE_TO_MOVE_OFFSET]
    } else {
        0
    }
}

#[inline(always)]
pub fn en_passant_hash(target: Option<Square>) -> u64 {
    target
        .map(|square| en_passant_file_hash(square.file()))
        .unwrap_or(0)
}

#[inline(always)]
fn en_passant_file_hash(file: File) -> u64 {
    ZOBRIST_KEYS[EN_PASSANT_OFFSET + file as usize]
}
