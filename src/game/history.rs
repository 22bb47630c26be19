use super::{castling_rights::CastlingRights, moves::Move, piece::Piece, square::Square};

/// Records non-reversible informations that are lost when making a move.
///
/// Together with the position reached after the move, an entry is enough to
/// restore the position the move was played from.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct HistoryEntry {
    pub played: Move,
    pub moved: Piece,
    /// The captured piece and the square it stood on (which differs from the
    /// target square for en passant captures).
    pub captured: Option<(Piece, Square)>,
    pub castling_rights: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u16,
    pub fullmove_number: u16,
    pub hash: u64,
}
impl HistoryEntry {
    /// Checks if the recorded move was a castling move.
    pub fn is_castle(&self) -> bool {
        self.moved.kind == super::piece::PieceKind::King
            && (self.played.from.file() as i8 - self.played.to.file() as i8).abs() == 2
    }

    /// Checks if the recorded move was an en passant capture.
    pub fn is_en_passant(&self) -> bool {
        matches!(self.captured, Some((_, square)) if square != self.played.to)
    }
}
