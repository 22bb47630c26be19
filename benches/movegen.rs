use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use kibitzer::game::{perft::perft, position::Position, state::GameState};

const POSITIONS: [(&str, &str, u8); 3] = [
    (
        "initial",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        3,
    ),
    (
        "kiwipete",
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        2,
    ),
    ("position_3", "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", 3),
];

fn legal_moves(c: &mut Criterion) {
    let mut group = c.benchmark_group("legal_moves");
    for (name, fen, _) in POSITIONS {
        let position: Position = fen.parse().expect("benchmark FEN should parse");
        group.bench_with_input(BenchmarkId::from_parameter(name), &position, |b, position| {
            b.iter(|| black_box(position).legal_moves())
        });
    }
    group.finish();
}

fn perft_counts(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");
    group.sample_size(10);
    for (name, fen, depth) in POSITIONS {
        let position: Position = fen.parse().expect("benchmark FEN should parse");
        group.throughput(Throughput::Elements(perft(&position, depth)));
        group.bench_with_input(BenchmarkId::new(name, depth), &position, |b, position| {
            b.iter(|| perft(black_box(position), depth))
        });
    }
    group.finish();
}

fn apply_and_undo(c: &mut Criterion) {
    let moves: Vec<_> = ["e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "a7a6", "b5a4", "g8f6", "e1g1"]
        .iter()
        .map(|mv| mv.parse().expect("benchmark move should parse"))
        .collect();
    c.bench_function("apply_undo_ruy_lopez", |b| {
        b.iter(|| {
            let mut game = GameState::new();
            for &mv in &moves {
                game.apply_move(mv).expect("benchmark line should be legal");
            }
            while game.undo().is_ok() {}
            black_box(game)
        })
    });
}

criterion_group!(benches, legal_moves, perft_counts, apply_and_undo);
criterion_main!(benches);
