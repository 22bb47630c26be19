//! # Legal move generation
//!
//! Moves are first generated following piece movement rules only (pseudo-legal
//! moves), then filtered by playing each of them on a copy of the position and
//! discarding the ones that leave the mover's king attacked.

use super::{
    colour::Colour,
    moves::Move,
    piece::{Piece, PieceKind},
    position::Position,
    square::{Delta, File, Square},
};

/// Upper bound on the number of legal moves of any chess position (218).
pub const MAX_MOVES: usize = 256;

/// Stack allocated list of moves.
pub type MoveList = heapless::Vec<Move, MAX_MOVES>;

/// Whether a game goes on, or how it ended.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum GameStatus {
    Ongoing,
    Checkmate,
    Stalemate,
}
impl GameStatus {
    /// Checks if the game ended.
    pub fn is_over(self) -> bool {
        self != Self::Ongoing
    }
}
impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Ongoing => "ongoing",
                Self::Checkmate => "checkmate",
                Self::Stalemate => "stalemate",
            }
        )
    }
}

/// Generates all legal moves for the side to move.
///
/// Promotions come as four moves, queen first.
/// # Example
/// ```
/// # use kibitzer::game::{position::Position, movegen};
/// assert_eq!(movegen::legal_moves(&Position::initial()).len(), 20);
/// ```
pub fn legal_moves(position: &Position) -> MoveList {
    let us = position.side_to_move();
    pseudo_legal_moves(position)
        .into_iter()
        .filter(|&mv| !position.after(mv).is_in_check(us))
        .collect()
}

/// Returns the status of the game in a given position.
pub fn status(position: &Position) -> GameStatus {
    if !legal_moves(position).is_empty() {
        GameStatus::Ongoing
    } else if position.in_check() {
        GameStatus::Checkmate
    } else {
        GameStatus::Stalemate
    }
}

/// Checks if `square` is attacked by any piece of colour `by`.
///
/// Works by looking from the square outwards: a pawn, knight, king or slider of
/// `by` standing where it could capture on `square` attacks it. Occupancy of
/// `square` itself does not matter.
pub fn is_square_attacked(position: &Position, square: Square, by: Colour) -> bool {
    let is = |target: Option<Square>, kind: PieceKind| {
        target.is_some_and(|target| position.piece_on(target) == Some(Piece::new(kind, by)))
    };

    // Pawns of `by` attack forward, so look backwards from their point of view.
    let back = -by.forward();
    if is(square.offset(-1, back), PieceKind::Pawn) || is(square.offset(1, back), PieceKind::Pawn)
    {
        return true;
    }
    if Delta::KNIGHT_DELTAS
        .iter()
        .any(|&delta| is(square.translate(delta), PieceKind::Knight))
    {
        return true;
    }
    if Delta::QUEEN_DELTAS
        .iter()
        .any(|&delta| is(square.translate(delta), PieceKind::King))
    {
        return true;
    }

    let slider_hits = |deltas: [Delta; 4], slides: fn(PieceKind) -> bool| {
        deltas.iter().any(|&delta| {
            first_piece_along(position, square, delta)
                .is_some_and(|piece| piece.colour == by && slides(piece.kind))
        })
    };
    slider_hits(Delta::ORTHOGONAL_DELTAS, PieceKind::is_orthogonal_slider)
        || slider_hits(Delta::DIAGONAL_DELTAS, PieceKind::is_diagonal_slider)
}

fn first_piece_along(position: &Position, from: Square, delta: Delta) -> Option<Piece> {
    let mut current = from.translate(delta);
    while let Some(square) = current {
        if let Some(piece) = position.piece_on(square) {
            return Some(piece);
        }
        current = square.translate(delta);
    }
    None
}

/// Generates moves following piece movement rules, which may leave the king
/// in check.
pub fn pseudo_legal_moves(position: &Position) -> MoveList {
    let mut moves = MoveList::new();
    let us = position.side_to_move();

    for (from, piece) in position.pieces().filter(|(_, piece)| piece.colour == us) {
        match piece.kind {
            PieceKind::Pawn => pawn_moves(position, from, us, &mut moves),
            PieceKind::Knight => step_moves(position, from, us, &Delta::KNIGHT_DELTAS, &mut moves),
            PieceKind::Bishop => slider_moves(position, from, us, &Delta::DIAGONAL_DELTAS, &mut moves),
            PieceKind::Rook => slider_moves(position, from, us, &Delta::ORTHOGONAL_DELTAS, &mut moves),
            PieceKind::Queen => slider_moves(position, from, us, &Delta::QUEEN_DELTAS, &mut moves),
            PieceKind::King => {
                step_moves(position, from, us, &Delta::QUEEN_DELTAS, &mut moves);
                castling_moves(position, from, us, &mut moves)
            }
        }
    }

    moves
}

#[inline(always)]
fn push(moves: &mut MoveList, mv: Move) {
    if moves.push(mv).is_err() {
        unreachable!("a chess position never has more than {MAX_MOVES} moves")
    }
}

fn push_pawn_move(moves: &mut MoveList, from: Square, to: Square, us: Colour) {
    if to.rank() == us.promotion_rank() {
        for mv in Move::new_promotions(from, to) {
            push(moves, mv)
        }
    } else {
        push(moves, Move::new(from, to))
    }
}

fn pawn_moves(position: &Position, from: Square, us: Colour, moves: &mut MoveList) {
    let forward = us.forward();

    if let Some(single) = from.offset(0, forward) {
        if position.piece_on(single).is_none() {
            push_pawn_move(moves, from, single, us);
            if from.rank() == us.pawn_rank() {
                if let Some(double) = single.offset(0, forward) {
                    if position.piece_on(double).is_none() {
                        push(moves, Move::new(from, double))
                    }
                }
            }
        }
    }

    for side in [-1, 1] {
        let Some(target) = from.offset(side, forward) else {
            continue;
        };
        match position.piece_on(target) {
            Some(piece) if piece.colour != us => push_pawn_move(moves, from, target, us),
            None if position.en_passant() == Some(target) => push(moves, Move::new(from, target)),
            _ => (),
        }
    }
}

fn step_moves(position: &Position, from: Square, us: Colour, deltas: &[Delta], moves: &mut MoveList) {
    for target in deltas.iter().filter_map(|&delta| from.translate(delta)) {
        if !matches!(position.piece_on(target), Some(piece) if piece.colour == us) {
            push(moves, Move::new(from, target))
        }
    }
}

fn slider_moves(
    position: &Position,
    from: Square,
    us: Colour,
    deltas: &[Delta],
    moves: &mut MoveList,
) {
    for &delta in deltas {
        let mut current = from.translate(delta);
        while let Some(target) = current {
            match position.piece_on(target) {
                None => push(moves, Move::new(from, target)),
                Some(piece) => {
                    if piece.colour != us {
                        push(moves, Move::new(from, target))
                    }
                    break;
                }
            }
            current = target.translate(delta);
        }
    }
}

/// Castling requires the right, the rook on its home square, empty squares
/// between king and rook, and a king that neither starts on, crosses, nor lands
/// on an attacked square.
fn castling_moves(position: &Position, from: Square, us: Colour, moves: &mut MoveList) {
    let rank = us.back_rank();
    if from != Square::new(File::E, rank) {
        return;
    }
    let rights = position.castling_rights();
    let them = us.inverse();
    let rook = Some(Piece::new(PieceKind::Rook, us));
    let empty = |files: &[File]| {
        files
            .iter()
            .all(|&file| position.piece_on(Square::new(file, rank)).is_none())
    };
    let safe = |files: &[File]| {
        files
            .iter()
            .all(|&file| !is_square_attacked(position, Square::new(file, rank), them))
    };

    if rights.kingside_castle_allowed(us)
        && position.piece_on(Square::new(File::H, rank)) == rook
        && empty(&[File::F, File::G])
        && safe(&[File::E, File::F, File::G])
    {
        push(moves, Move::new(from, Square::new(File::G, rank)))
    }
    if rights.queenside_castle_allowed(us)
        && position.piece_on(Square::new(File::A, rank)) == rook
        && empty(&[File::B, File::C, File::D])
        && safe(&[File::E, File::D, File::C])
    {
        push(moves, Move::new(from, Square::new(File::C, rank)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn position(fen: &str) -> Position {
        fen.parse().unwrap()
    }

    fn has(position: &Position, mv: &str) -> bool {
        legal_moves(position).contains(&mv.parse().unwrap())
    }

    #[test]
    fn castling_needs_empty_squares() {
        let blocked = position("r3k2r/8/8/8/8/8/8/RN2K1NR w KQkq - 0 1");
        assert!(!has(&blocked, "e1g1"));
        assert!(!has(&blocked, "e1c1"));
    }

    #[test]
    fn castling_through_attacked_squares_is_illegal() {
        // f1 is covered by the rook on f8.
        let crossing = position("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert!(!has(&crossing, "e1g1"));
        assert!(has(&crossing, "e1c1"));

        // b1 may be attacked, only the king path matters.
        let b_file = position("1r2k3/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert!(has(&b_file, "e1c1"));

        let in_check = position("4k3/8/8/8/8/8/8/R3K2r w Q - 0 1");
        assert!(!has(&in_check, "e1c1"));
    }

    #[test]
    fn castling_onto_an_attacked_square_is_illegal() {
        // Only g1 is covered, by the rook on g8.
        let kingside = position("4k1r1/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert!(!has(&kingside, "e1g1"));
        assert!(has(&kingside, "e1c1"));

        // Only c1 is covered, by the rook on c8.
        let queenside = position("2r1k3/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert!(!has(&queenside, "e1c1"));
        assert!(has(&queenside, "e1g1"));
    }

    #[test]
    fn castling_needs_the_right_and_the_rook() {
        let no_rights = position("r3k2r/8/8/8/8/8/8/R3K2R w kq - 0 1");
        assert!(!has(&no_rights, "e1g1"));
        assert!(!has(&no_rights, "e1c1"));

        let no_rook = position("r3k2r/8/8/8/8/8/8/4K2R w KQkq - 0 1");
        assert!(!has(&no_rook, "e1c1"));
        assert!(has(&no_rook, "e1g1"));
    }

    #[test]
    fn en_passant_is_only_available_right_after_the_push() {
        let start = position("4k3/3p4/8/4P3/8/8/8/4K3 b - - 0 1");
        let pushed = start.play("d7d5".parse().unwrap()).unwrap();
        assert!(has(&pushed, "e5d6"));

        let waited = pushed
            .play("e1e2".parse().unwrap())
            .and_then(|p| p.play("e8e7".parse().unwrap()))
            .unwrap();
        assert!(!has(&waited, "e5d6"));
    }

    #[test]
    fn pinned_en_passant_is_illegal() {
        let pinned = position("8/8/8/KPp4r/8/8/8/4k3 w - c6 0 1");
        assert!(!has(&pinned, "b5c6"));
    }

    #[test]
    fn promotions_come_queen_first() {
        let position = position("4k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let promotions: Vec<String> = legal_moves(&position)
            .iter()
            .filter(|mv| mv.from == Square::A7)
            .map(ToString::to_string)
            .collect();
        assert_eq!(promotions, ["a7a8q", "a7a8r", "a7a8b", "a7a8n"]);
        assert!(!has(&position, "a7a8"));
    }

    #[test]
    fn game_endings() {
        let fools_mate = position("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        assert_eq!(status(&fools_mate), GameStatus::Checkmate);

        let stalemate = position("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        assert_eq!(status(&stalemate), GameStatus::Stalemate);

        assert_eq!(status(&Position::initial()), GameStatus::Ongoing);
    }

    #[test]
    fn attacks_ignore_occupancy_of_the_target() {
        let position = Position::initial();
        assert!(is_square_attacked(&position, Square::F3, Colour::White));
        assert!(is_square_attacked(&position, Square::E2, Colour::White));
        assert!(!is_square_attacked(&position, Square::E4, Colour::White));
        assert!(is_square_attacked(&position, Square::F6, Colour::Black));
    }
}
