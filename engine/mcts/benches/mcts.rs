//! MCTS benchmarks for performance profiling.
//!
//! Run with: `cargo bench -p mcts`
//!
//! These benchmarks measure:
//! - Single-tree search loops with varying search counts
//! - Batched rounds across many concurrent games
//! - Move commitment (subtree release and root promotion)
//! - Whole self-play runs on a small board

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use games_connectk::{ConnectK, Move, State, UniformEvaluator};
use mcts::{BatchedSelfPlay, Evaluator, SearchConfig, SelfPlayWorker, Tree};

/// Run `searches` select/evaluate/expand iterations on one tree.
fn search(tree: &mut Tree<State, Move>, evaluator: &UniformEvaluator, searches: usize) {
    for _ in 0..searches {
        let Some((leaf, state)) = tree.select_leaf().unwrap() else {
            continue;
        };
        let state = state.clone();
        let evaluation = evaluator
            .evaluate_batch(std::slice::from_ref(&state))
            .unwrap()
            .pop()
            .unwrap();
        tree.expand_leaf(leaf, evaluation.value, evaluation.children)
            .unwrap();
    }
}

// =============================================================================
// Single Tree Benchmarks
// =============================================================================

fn bench_search_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("mcts_search_loop");
    let game = ConnectK::standard();
    let evaluator = UniformEvaluator::new(game);

    for searches in [50, 200, 800] {
        group.throughput(Throughput::Elements(searches as u64));
        group.bench_with_input(
            BenchmarkId::new("connect4", searches),
            &searches,
            |b, &searches| {
                b.iter(|| {
                    let mut tree = Tree::with_seed(1.25, 19652.0, game.initial_state(), 42);
                    search(&mut tree, &evaluator, searches);
                    black_box(tree.stats())
                });
            },
        );
    }

    group.finish();
}

fn bench_tree_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("mcts_tree_ops");
    let game = ConnectK::standard();
    let evaluator = UniformEvaluator::new(game);

    // Commit after a full turn of searching
    group.bench_function("move_proportional_after_200", |b| {
        b.iter_batched(
            || {
                let mut tree = Tree::with_seed(1.25, 19652.0, game.initial_state(), 7);
                search(&mut tree, &evaluator, 200);
                tree
            },
            |mut tree| {
                tree.move_proportional().unwrap();
                black_box(tree)
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.bench_function("dirichlet_noise", |b| {
        let mut tree = Tree::with_seed(1.25, 19652.0, game.initial_state(), 7);
        search(&mut tree, &evaluator, 1);

        b.iter(|| tree.add_dirichlet_noise(0.5, 0.25).unwrap());
    });

    group.finish();
}

// =============================================================================
// Batched Benchmarks
// =============================================================================

fn bench_batched_rounds(c: &mut Criterion) {
    let mut group = c.benchmark_group("mcts_batched_rounds");
    let game = ConnectK::standard();
    let evaluator = UniformEvaluator::new(game);
    let rounds = 64;

    for n_games in [1, 8, 32] {
        group.throughput(Throughput::Elements((n_games * rounds) as u64));
        group.bench_with_input(
            BenchmarkId::new("connect4", n_games),
            &n_games,
            |b, &n_games| {
                b.iter(|| {
                    let mut coordinator: BatchedSelfPlay<State, Move> =
                        BatchedSelfPlay::with_seed(n_games, 1.25, 19652.0, game.initial_state(), 1);
                    for _ in 0..rounds {
                        coordinator.run_round(&evaluator).unwrap();
                    }
                    black_box(coordinator.len())
                });
            },
        );
    }

    group.finish();
}

fn bench_worker_games(c: &mut Criterion) {
    let mut group = c.benchmark_group("mcts_worker");
    let game = ConnectK::new(3, 3, 3).unwrap();
    let evaluator = UniformEvaluator::new(game);

    group.bench_function("8_games_3x3", |b| {
        b.iter(|| {
            let mut worker: SelfPlayWorker<State, Move> = SelfPlayWorker::with_seed(
                SearchConfig::for_testing(),
                game.initial_state(),
                4,
                8,
                3,
            )
            .unwrap();
            black_box(worker.run(&evaluator).unwrap())
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_search_loop,
    bench_tree_operations,
    bench_batched_rounds,
    bench_worker_games,
);
criterion_main!(benches);
