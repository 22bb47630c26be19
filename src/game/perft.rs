//! # Perft testing/benchmarking
//!
//! Counts the leaf nodes of the legal move tree to a fixed depth. Matching the
//! known counts of reference positions is the standard way of validating a move
//! generator.

use std::time::Instant;

use super::{moves::Move, position::Position};

/// Counts the number of leaf nodes reachable in exactly `depth` plies.
/// # Example
/// ```
/// # use kibitzer::game::{perft::perft, position::Position};
/// assert_eq!(perft(&Position::initial(), 2), 400);
/// ```
pub fn perft(position: &Position, depth: u8) -> u64 {
    match depth {
        0 => 1,
        1 => position.legal_moves().len() as u64,
        _ => position
            .legal_moves()
            .iter()
            .map(|&mv| perft(&position.after(mv), depth - 1))
            .sum(),
    }
}

/// Counts leaf nodes for each legal move of the root position.
pub fn divide(position: &Position, depth: u8) -> Vec<(Move, u64)> {
    position
        .legal_moves()
        .iter()
        .map(|&mv| (mv, perft(&position.after(mv), depth.saturating_sub(1))))
        .collect()
}

/// Builder pattern to configure a Perft run.
#[derive(Clone, Copy, Debug, Default)]
pub struct PerftConfig {
    pub depth: u8,
    pub iterative: bool,
    pub divide: bool,
    pub bench: bool,
    pub show_board: bool,
}
impl PerftConfig {
    /// Whether to show the board at the start of the run.
    ///
    /// Should be disabled when trying to parse the output.
    pub fn show_board(mut self, value: bool) -> Self {
        self.show_board = value;
        self
    }

    /// Sets the maximum depth of the perft run.
    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = depth;
        self
    }

    /// If set to true, the run will go through all depths between 1 and the maximum.
    pub fn iterative_deepening(mut self, value: bool) -> Self {
        self.iterative = value;
        self
    }

    /// Shows perft results per legal move at the root position.
    pub fn divide_moves(mut self, value: bool) -> Self {
        self.divide = value;
        self
    }

    /// Measures the time it takes to complete one depth.
    pub fn benchmark(mut self, value: bool) -> Self {
        self.bench = value;
        self
    }

    /// Runs a Perft test on the given position, printing results to stdout.
    ///
    /// Returns the node count of the deepest run.
    pub fn go(&self, position: &Position) -> u64 {
        if self.show_board {
            println!("{position:?}");
        }

        let mut nodes = 0;
        for depth in (if self.iterative { 1 } else { self.depth })..=self.depth {
            if self.iterative && self.divide {
                println!("====== DEPTH {depth} ======")
            }
            let start = Instant::now();
            nodes = if self.divide {
                divide(position, depth)
                    .into_iter()
                    .map(|(mv, mv_nodes)| {
                        println!("{mv}: {mv_nodes} nodes");
                        mv_nodes
                    })
                    .sum()
            } else {
                perft(position, depth)
            };
            let elapsed = start.elapsed().as_secs_f64();
            println!("depth {depth}: {nodes} nodes");
            if self.bench {
                println!(
                    "\ttook {} ({})",
                    human_readable_time(elapsed),
                    human_readable_nps(nodes as f64 / elapsed)
                );
            }
        }
        nodes
    }
}

fn human_readable_time(secs: f64) -> String {
    if secs < 0.000_001 {
        format!("{:.3}ns", secs * 1_000_000_000.)
    } else if secs < 0.001 {
        format!("{:.3}μs", secs * 1_000_000.)
    } else if secs < 1. {
        format!("{:.3}ms", secs * 1_000.)
    } else {
        format!("{secs:.3}s")
    }
}

fn human_readable_nps(nps: f64) -> String {
    if nps > 1_000_000_000. {
        format!("{:.3}Gnps", nps / 1_000_000_000.)
    } else if nps > 1_000_000. {
        format!("{:.3}Mnps", nps / 1_000_000.)
    } else if nps > 1_000. {
        format!("{:.3}Knps", nps / 1_000.)
    } else {
        format!("{nps:.3}nps")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    const POSITION_3: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";

    fn position(fen: &str) -> Position {
        fen.parse().unwrap()
    }

    #[test]
    fn perft_initial_position() {
        let initial = Position::initial();
        assert_eq!(perft(&initial, 1), 20);
        assert_eq!(perft(&initial, 2), 400);
        assert_eq!(perft(&initial, 3), 8_902);
    }

    #[test]
    fn perft_kiwipete() {
        let kiwipete = position(KIWIPETE);
        assert_eq!(perft(&kiwipete, 1), 48);
        assert_eq!(perft(&kiwipete, 2), 2_039);
    }

    #[test]
    fn perft_position_3() {
        let position = position(POSITION_3);
        assert_eq!(perft(&position, 1), 14);
        assert_eq!(perft(&position, 2), 191);
        assert_eq!(perft(&position, 3), 2_812);
    }

    #[test]
    fn divide_sums_to_perft() {
        let position = Position::initial();
        let split = divide(&position, 3);
        assert_eq!(split.len(), 20);
        assert_eq!(split.iter().map(|(_, n)| n).sum::<u64>(), perft(&position, 3));
    }

    #[test]
    fn config_returns_deepest_count() {
        let nodes = PerftConfig::default()
            .with_depth(2)
            .iterative_deepening(true)
            .go(&Position::initial());
        assert_eq!(nodes, 400);
    }

    #[test]
    fn times_pick_a_sensible_unit() {
        assert_eq!(human_readable_time(2.5), "2.500s");
        assert_eq!(human_readable_time(0.0025), "2.500ms");
        assert_eq!(human_readable_time(0.0000025), "2.500μs");
    }

    #[test]
    #[ignore]
    fn deep_reference_counts() {
        assert_eq!(perft(&Position::initial(), 4), 197_281);
        assert_eq!(perft(&position(KIWIPETE), 3), 97_862);
        assert_eq!(perft(&position(POSITION_3), 4), 43_238);
    }
}
