//! Benchmarks for the per-decision hot path: state clone, encoding, legality
//! and network forward pass.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use ccg_learner::games::skirmish::{Archetype, Skirmish};
use ccg_learner::nn::{CardGameEncoder, MlpConfig, MlpQNetwork, QNetwork, StateEncoder};
use ccg_learner::{Action, ActionSpace, GameSetup, GameState, Simulator};

/// A position a few turns in, with cards in hand and minions on board.
fn midgame() -> GameState {
    let mut sim = Skirmish::new(42);
    let deck = Archetype::Midrange.deck();
    let mut state = sim.initial_state(&deck, &deck, &GameSetup::default());
    for _ in 0..8 {
        let side = state.active;
        let legal = ActionSpace::legal_actions(&state, side);
        let pick = legal.first().copied().unwrap_or(ccg_learner::core::END_TURN_INDEX);
        for index in [pick, ccg_learner::core::END_TURN_INDEX] {
            let Ok(action) = Action::decode(index) else { continue };
            if let Ok(next) = sim.apply(&state, &action, state.active) {
                state = next;
            }
        }
    }
    state
}

fn benchmark_state(c: &mut Criterion) {
    let state = midgame();
    let side = state.active;
    let encoder = CardGameEncoder::new();

    let mut group = c.benchmark_group("State");
    group.bench_function("clone", |b| b.iter(|| black_box(state.clone())));
    group.bench_function("encode", |b| {
        b.iter(|| black_box(encoder.encode(black_box(&state), side)))
    });
    group.bench_function("legal_actions", |b| {
        b.iter(|| black_box(ActionSpace::legal_actions(black_box(&state), side)))
    });
    group.finish();
}

fn benchmark_network(c: &mut Criterion) {
    let state = midgame();
    let encoded = CardGameEncoder::new().encode(&state, state.active);
    let network = MlpQNetwork::new(&MlpConfig::default());

    c.bench_function("mlp_predict", |b| {
        b.iter(|| black_box(network.predict(black_box(&encoded))))
    });
}

criterion_group!(benches, benchmark_state, benchmark_network);
criterion_main!(benches);
