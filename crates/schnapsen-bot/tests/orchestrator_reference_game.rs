use schnapsen_bot::{
    AlphaBeta, Determinizer, DeterminizerKind, ExactPolicy, LexicographicDeterminizer,
    PermutationRequest, Policy, RandomPolicy, SearchConfig, SearchError, SearchOrchestrator,
    SearchPolicy, distinct_count,
};
use rand::SeedableRng;
use std::collections::BTreeMap;
use schnapsen_core::model::card::Card;
use schnapsen_core::model::deck::Deck;
use schnapsen_core::model::hand::Hand;
use schnapsen_core::model::player::Player;
use schnapsen_core::model::round::{PlayOutcome, RoundState};
use schnapsen_core::model::view::PlayerView;
use schnapsen_core::rules::{GameState, Observable, ObservedState};

fn card(raw: &str) -> Card {
    raw.parse().expect("valid card")
}

fn hand(raw: &[&str]) -> Hand {
    Hand::with_cards(raw.iter().map(|c| card(c)).collect())
}

fn quick() -> SearchConfig {
    SearchConfig {
        max_iterations_per_permutation: 200,
        max_permutations: 6,
        num_workers: 2,
        ..SearchConfig::default()
    }
}

/// Two cards each, one hidden stock card above the turned trump.
fn late_round() -> RoundState {
    RoundState::from_parts(
        [hand(&["AH", "KH"]), hand(&["JS", "QS"])],
        vec![card("10C"), card("QD")],
        card("QD"),
        Player::One,
    )
    .with_score([40, 30], [3, 3])
}

/// Stock exhausted: nothing is hidden from either seat.
fn open_round() -> RoundState {
    RoundState::from_parts(
        [hand(&["AH", "KH", "JD"]), hand(&["10H", "QS", "AD"])],
        Vec::new(),
        card("QD"),
        Player::One,
    )
    .with_score([30, 25], [2, 2])
}

#[test]
fn chooses_a_legal_card_from_a_fresh_deal() {
    for seed in 0u64..4 {
        let round = RoundState::deal(&Deck::shuffled_with_seed(seed), Player::One);
        let view = round.observer_view(Player::One);
        let mut orchestrator = SearchOrchestrator::with_seed(seed);
        let decision = orchestrator.decide(&view, &quick()).unwrap();
        assert!(view.legal_cards().contains(&decision.action), "seed {seed}");
        assert_eq!(decision.worlds, 6);
        assert_eq!(decision.consistent_worlds, distinct_count(14, 5));
        assert_eq!(decision.ranking.len(), 5);
    }
}

#[test]
fn permutation_request_is_capped_silently() {
    let view = late_round().observer_view(Player::One);
    assert_eq!(view.unseen_cards().len(), 3);
    assert_eq!(view.opponent_unknown_count(), 2);

    let mut orchestrator = SearchOrchestrator::with_seed(1);
    let config = SearchConfig {
        max_permutations: 1000,
        ..quick()
    };
    let decision = orchestrator.decide(&view, &config).unwrap();
    assert_eq!(decision.consistent_worlds, 3);
    assert_eq!(decision.worlds, 3);
}

#[test]
fn full_information_rejects_hidden_cards() {
    let round = RoundState::deal(&Deck::shuffled_with_seed(3), Player::Two);
    let view = round.observer_view(Player::Two);
    let mut orchestrator = SearchOrchestrator::with_seed(3);
    let config = SearchConfig {
        full_information: true,
        ..quick()
    };
    assert_eq!(
        orchestrator.choose_action(&view, &config),
        Err(SearchError::FullInformationViolated {
            count: 2002 * 362_880
        })
    );
}

#[test]
fn open_position_is_solved_the_same_way_by_both_engines() {
    let round = open_round();
    let view = round.observer_view(Player::One);
    assert!(view.is_fully_observed());

    let sampled = SearchConfig {
        full_information: true,
        max_iterations_per_permutation: 100_000,
        ..quick()
    };
    let exact = SearchConfig {
        exact_full_information: true,
        ..sampled.clone()
    };
    let mut orchestrator = SearchOrchestrator::with_seed(11);
    let by_tree = orchestrator.decide(&view, &sampled).unwrap();
    let by_alpha_beta = orchestrator.decide(&view, &exact).unwrap();
    assert_eq!(by_tree.solved_worlds, 1);
    assert!(by_alpha_beta.exact);

    let scores = |ranking: &[schnapsen_bot::RankedAction<Card>]| {
        let mut pairs: Vec<(Card, f64)> = ranking.iter().map(|r| (r.action, r.score)).collect();
        pairs.sort_by_key(|(card, _)| *card);
        pairs
    };
    assert_eq!(scores(&by_tree.ranking), scores(&by_alpha_beta.ranking));
    let best = by_alpha_beta.ranking[0].score;
    assert_eq!(by_tree.ranking[0].score, best);
}

#[test]
fn seeded_decisions_do_not_depend_on_worker_count() {
    let round = RoundState::deal(&Deck::shuffled_with_seed(42), Player::One);
    let view = round.observer_view(Player::One);
    let decide = |workers: usize| {
        let config = SearchConfig {
            num_workers: workers,
            determinizer: DeterminizerKind::Stratified,
            ..quick()
        };
        let mut orchestrator = SearchOrchestrator::with_seed(7);
        orchestrator.decide(&view, &config).unwrap()
    };
    let single = decide(1);
    let many = decide(3);
    assert_eq!(single.action, many.action);
    assert_eq!(single.ranking, many.ranking);
}

#[test]
fn time_limited_budget_runs_without_iteration_cap() {
    let round = RoundState::deal(&Deck::shuffled_with_seed(5), Player::One);
    let view = round.observer_view(Player::One);
    let config = SearchConfig {
        max_iterations_per_permutation: 0,
        time_limit_seconds: Some(0.02),
        max_permutations: 2,
        ..quick()
    };
    let mut orchestrator = SearchOrchestrator::with_seed(5);
    let decision = orchestrator.decide(&view, &config).unwrap();
    assert!(decision.iterations > 0);
}

fn play_out(first: &mut dyn Policy, second: &mut dyn Policy, seed: u64) -> RoundState {
    let mut round = RoundState::deal(&Deck::shuffled_with_seed(seed), Player::One);
    while !round.is_terminal() {
        let seat = round.acting_player();
        let view = PlayerView::observe(&round, seat);
        let policy: &mut dyn Policy = if seat == Player::One { &mut *first } else { &mut *second };
        let card = policy.choose_play(&view).expect("policy picks a card");
        match round.play_card(seat, card).expect("legal play") {
            PlayOutcome::GameOver(_) => break,
            PlayOutcome::Played | PlayOutcome::TrickCompleted { .. } => {}
        }
    }
    round
}

#[test]
fn policies_finish_whole_games() {
    let fast = SearchConfig {
        max_iterations_per_permutation: 50,
        max_permutations: 3,
        num_workers: 1,
        ..SearchConfig::default()
    };
    let mut search = SearchPolicy::new(fast.clone(), 1).unwrap();
    let mut random = RandomPolicy::new(2);
    let round = play_out(&mut search, &mut random, 9);
    assert!(round.outcome().is_some());
    assert!(search.last_decision().is_some());

    let mut exact = ExactPolicy::new(fast, 3).unwrap();
    let mut random = RandomPolicy::new(4);
    let round = play_out(&mut random, &mut exact, 10);
    assert!(round.outcome().is_some());
    assert!(exact.engine().cache_len() > 0);

    search.shutdown();
    exact.shutdown();
}

/// Mean exact value per card over every world consistent with `view`, plus
/// each world's own best cards.
fn averaged_solution(view: &PlayerView) -> (Vec<Card>, Vec<Vec<Card>>) {
    let mut engine = AlphaBeta::new();
    let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    let permutations = LexicographicDeterminizer.generate(
        &view.unseen_cards(),
        view.opponent_unknown_count(),
        PermutationRequest::All,
        &mut rng,
    );
    let mut totals: BTreeMap<Card, f64> = BTreeMap::new();
    let mut per_world_best = Vec::new();
    for permutation in &permutations {
        let values = engine.action_values(&view.determinize(permutation));
        let top = values.iter().map(|(_, v)| *v).fold(f64::NEG_INFINITY, f64::max);
        per_world_best.push(values.iter().filter(|(_, v)| *v == top).map(|(c, _)| *c).collect());
        for (card, value) in values {
            *totals.entry(card).or_default() += value;
        }
    }
    let top = totals.values().copied().fold(f64::NEG_INFINITY, f64::max);
    let best = totals.iter().filter(|(_, v)| **v == top).map(|(c, _)| *c).collect();
    (best, per_world_best)
}

#[test]
fn exact_policy_averages_over_every_consistent_world() {
    let config = SearchConfig {
        max_permutations: 20,
        num_workers: 1,
        ..quick()
    };
    let mut solvers = [
        ExactPolicy::new(config.clone(), 1).unwrap(),
        ExactPolicy::new(config, 2).unwrap(),
    ];
    let mut disagreements = 0usize;

    for seed in 0u64..30 {
        let mut round = RoundState::deal(&Deck::shuffled_with_seed(seed), Player::One);
        let mut first = RandomPolicy::new(seed);
        let mut second = RandomPolicy::new(seed + 100);
        while !round.is_terminal() {
            let seat = round.acting_player();
            let view = PlayerView::observe(&round, seat);
            if view.stock_len() <= 2 {
                let (best, per_world_best) = averaged_solution(&view);
                if per_world_best.iter().any(|world| world.iter().all(|c| !best.contains(c))) {
                    disagreements += 1;
                }
                for solver in solvers.iter_mut() {
                    let chosen = solver.choose_play(&view).unwrap();
                    assert!(best.contains(&chosen), "seed {seed}: {chosen} not in {best:?}");
                }
            }
            let policy: &mut dyn Policy = if seat == Player::One { &mut first } else { &mut second };
            let card = policy.choose_play(&view).unwrap();
            round.play_card(seat, card).unwrap();
        }
    }
    // Positions exist where trusting one sampled world would pick a worse card.
    assert!(disagreements > 0);
}
