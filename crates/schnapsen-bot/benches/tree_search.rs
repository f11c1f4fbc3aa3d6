use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use schnapsen_bot::{AlphaBeta, GameTree, SearchConfig, SearchOrchestrator};
use schnapsen_core::model::deck::Deck;
use schnapsen_core::model::player::Player;
use schnapsen_core::model::round::RoundState;
use schnapsen_core::rules::Observable;
use std::hint::black_box;

const SEEDS: [u64; 3] = [42, 12345, 8675309];

fn bench_single_world(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_world");
    for seed in SEEDS {
        let round = RoundState::deal(&Deck::shuffled_with_seed(seed), Player::One);
        group.bench_function(format!("tree_1000_iters_seed{seed}"), |b| {
            b.iter_batched(
                || (GameTree::new(round.clone()), SmallRng::seed_from_u64(seed)),
                |(mut tree, mut rng)| {
                    let report = tree.run_iterations(1000, &mut rng);
                    black_box(report.ok());
                    black_box(tree.best_action(&mut rng));
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_endgame_solver(c: &mut Criterion) {
    let mut group = c.benchmark_group("endgame_solver");
    for seed in SEEDS {
        // Play the stock out with the first legal card to reach an open position.
        let mut round = RoundState::deal(&Deck::shuffled_with_seed(seed), Player::One);
        while !round.stock().is_empty() && round.outcome().is_none() {
            let seat = round.expected_player();
            let Some(card) = round.legal_cards(seat).first().copied() else {
                break;
            };
            if round.play_card(seat, card).is_err() {
                break;
            }
        }
        group.bench_function(format!("alpha_beta_seed{seed}"), |b| {
            b.iter_batched(
                AlphaBeta::<RoundState>::new,
                |mut engine| black_box(engine.best_action(&round)),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_orchestrator(c: &mut Criterion) {
    let mut group = c.benchmark_group("orchestrator");
    group.sample_size(10);
    let round = RoundState::deal(&Deck::shuffled_with_seed(SEEDS[0]), Player::One);
    let view = round.observer_view(Player::One);
    let config = SearchConfig {
        max_iterations_per_permutation: 300,
        max_permutations: 8,
        num_workers: 4,
        ..SearchConfig::default()
    };
    let mut orchestrator = SearchOrchestrator::with_seed(SEEDS[0]);
    group.bench_function("decide_8_worlds_300_iters", |b| {
        b.iter(|| black_box(orchestrator.decide(&view, &config).map(|decision| decision.action)))
    });
    group.finish();
    orchestrator.shutdown();
}

criterion_group!(benches, bench_single_world, bench_endgame_solver, bench_orchestrator);
criterion_main!(benches);
