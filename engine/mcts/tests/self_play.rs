//! End-to-end self-play over Connect-K with the uniform evaluator.

use games_connectk::{ConnectK, Move, Outcome, State, UniformEvaluator};
use mcts::{
    run_self_play, BatchedSelfPlay, EvaluatorError, GameResult, SearchConfig, SelfPlayError,
    SelfPlayWorker,
};

fn small_game() -> ConnectK {
    ConnectK::new(3, 3, 3).unwrap()
}

/// Checks every property a finished game record must have.
///
/// Batched games may end on a root that was never evaluated; those score 0
/// even when the position is won, so `exact_score` is only set for the worker.
fn assert_well_formed(result: &GameResult<State, Move>, exact_score: bool) {
    let history = &result.history;
    assert!(!history.is_empty());

    // One piece added per committed move
    for pair in history.windows(2) {
        assert_eq!(pair[1].state.pieces(), pair[0].state.pieces() + 1);
    }

    for entry in &history[..history.len() - 1] {
        let sum: f64 = entry.search_probabilities.iter().map(|(_, p)| p).sum();
        assert!(
            (sum - 1.0).abs() < 1e-9 || sum == 0.0,
            "fractions sum to {}",
            sum
        );
        for (mv, _) in &entry.search_probabilities {
            assert!(entry.state.legal_moves().contains(mv));
        }
    }
    assert!(history.last().unwrap().search_probabilities.is_empty());

    // Score is from the first player's perspective
    let last = &history.last().unwrap().state;
    let expected = match last.outcome() {
        Some(Outcome::Loss) if history.len() % 2 == 1 => -1.0,
        Some(Outcome::Loss) => 1.0,
        Some(Outcome::Draw) | None => 0.0,
    };
    if exact_score || result.score != 0.0 {
        assert_eq!(result.score, expected);
    }
}

#[test]
fn test_run_self_play_connectk() {
    let game = small_game();
    let evaluator = UniformEvaluator::new(game);

    let results = run_self_play(4, 300, 1.25, 19652.0, game.initial_state(), &evaluator).unwrap();

    assert_eq!(results.len(), 4);
    for result in &results {
        assert_eq!(result.history[0].state, game.initial_state());
        assert_well_formed(result, false);
    }
}

#[test]
fn test_seeded_coordinator_is_deterministic() {
    let game = small_game();
    let evaluator = UniformEvaluator::new(game);

    let play = || {
        let mut coordinator: BatchedSelfPlay<State, Move> =
            BatchedSelfPlay::with_seed(3, 1.25, 19652.0, game.initial_state(), 11);
        for _ in 0..100 {
            coordinator.run_round(&evaluator).unwrap();
        }
        coordinator.finish().unwrap()
    };

    assert_eq!(play(), play());
}

#[test]
fn test_worker_plays_connectk_to_the_end() {
    let game = small_game();
    let evaluator = UniformEvaluator::new(game);

    let mut worker: SelfPlayWorker<State, Move> =
        SelfPlayWorker::with_seed(SearchConfig::for_testing(), game.initial_state(), 4, 6, 3)
            .unwrap();
    let results = worker.run(&evaluator).unwrap();

    assert_eq!(results.len(), 6);
    for result in &results {
        assert!(result.history.last().unwrap().state.is_done());
        assert_well_formed(result, true);
    }
}

#[test]
fn test_worker_with_noise_on_standard_board() {
    let game = ConnectK::standard();
    let evaluator = UniformEvaluator::new(game);
    let config = SearchConfig::default()
        .with_evaluations_per_move(8)
        .with_max_turns(7);

    let mut worker: SelfPlayWorker<State, Move> =
        SelfPlayWorker::with_seed(config, game.initial_state(), 2, 2, 5).unwrap();
    let results = worker.run(&evaluator).unwrap();

    assert_eq!(results.len(), 2);
    for result in &results {
        // Six pieces cannot connect four
        assert_eq!(result.history.len(), 7);
        assert_eq!(result.score, 0.0);
    }
}

#[test]
fn test_evaluator_for_other_variant_fails() {
    let evaluator = UniformEvaluator::new(ConnectK::standard());
    let start = small_game().initial_state();

    let err = run_self_play(2, 5, 1.25, 19652.0, start, &evaluator).unwrap_err();
    assert!(matches!(
        err,
        SelfPlayError::Evaluator(EvaluatorError::InvalidState(_))
    ));
}
