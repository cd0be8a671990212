//! Property-based tests over random reachable positions.

use ccg_learner::core::{
    Action, GameRng, GameState, Side, ACTION_SPACE_SIZE, MAX_BOARD_SIZE, MAX_HAND_SIZE, MAX_HEALTH,
    MAX_MANA,
};
use ccg_learner::games::skirmish::{Archetype, Skirmish};
use ccg_learner::nn::{CardGameEncoder, EncodedState, StateEncoder, STATE_SIZE};
use ccg_learner::rules::{ActionSpace, GameSetup, Simulator};
use ccg_learner::training::{ReplayBuffer, Transition};
use proptest::prelude::*;

// =============================================================================
// Strategies for generating test inputs
// =============================================================================

fn arb_archetype() -> impl Strategy<Value = Archetype> {
    prop::sample::select(Archetype::ALL.to_vec())
}

/// A position reached by up to 120 uniformly random legal actions.
fn arb_position() -> impl Strategy<Value = GameState> {
    (any::<u64>(), 0usize..120, arb_archetype(), arb_archetype()).prop_map(
        |(seed, steps, first, second)| {
            let mut sim = Skirmish::new(seed);
            let mut rng = GameRng::new(seed ^ 0x5eed);
            let mut state =
                sim.initial_state(&first.deck(), &second.deck(), &GameSetup::default());
            for _ in 0..steps {
                if sim.is_terminal(&state).is_some() {
                    break;
                }
                let side = state.active;
                let legal = ActionSpace::legal_actions(&state, side);
                let index = legal[rng.index(legal.len())];
                let action = Action::decode(index).unwrap();
                state = sim.apply(&state, &action, side).unwrap();
            }
            state
        },
    )
}

// =============================================================================
// Action Space
// =============================================================================

proptest! {
    #[test]
    fn prop_legal_actions_are_accepted(state in arb_position(), seed in any::<u64>()) {
        let side = state.active;
        let legal = ActionSpace::legal_actions(&state, side);
        prop_assert!(legal.contains(&(ACTION_SPACE_SIZE - 1)));
        prop_assert!(legal.windows(2).all(|w| w[0] < w[1]));

        let mut sim = Skirmish::new(seed);
        for index in legal {
            let action = Action::decode(index).unwrap();
            prop_assert_eq!(action.encode().unwrap(), index);
            prop_assert!(sim.apply(&state, &action, side).is_ok());
        }
    }

    #[test]
    fn prop_illegal_actions_are_rejected(state in arb_position(), index in 0usize..ACTION_SPACE_SIZE) {
        let side = state.active;
        let action = Action::decode(index).unwrap();
        let mut sim = Skirmish::new(0);
        if !ActionSpace::is_legal(&action, &state, side) {
            prop_assert!(sim.apply(&state, &action, side).is_err());
        }
        prop_assert!(sim.apply(&state, &action, side.opponent()).is_err());
    }

    #[test]
    fn prop_play_card_needs_card_and_mana(state in arb_position(), slot in 0usize..MAX_HAND_SIZE) {
        let side = state.active;
        let own = state.own(side);
        let legal = ActionSpace::is_legal(&Action::PlayCard { hand_index: slot }, &state, side);
        match own.hand.get(slot) {
            None => prop_assert!(!legal),
            Some(card) if card.cost > own.mana => prop_assert!(!legal),
            Some(_) => {}
        }
    }

    #[test]
    fn prop_mask_matches_legal_actions(state in arb_position()) {
        let side = state.active;
        let mask = ActionSpace::legality_mask(&state, side);
        let legal = ActionSpace::legal_actions(&state, side);
        prop_assert_eq!(mask.len(), ACTION_SPACE_SIZE);
        let from_mask: Vec<usize> = (0..ACTION_SPACE_SIZE).filter(|&i| mask[i] == 1.0).collect();
        prop_assert_eq!(from_mask, legal);
    }
}

// =============================================================================
// Simulator Invariants
// =============================================================================

proptest! {
    #[test]
    fn prop_zone_and_resource_bounds(state in arb_position()) {
        for side in [Side::First, Side::Second] {
            let player = state.own(side);
            prop_assert!(player.hand.len() <= MAX_HAND_SIZE);
            prop_assert!(player.board.len() <= MAX_BOARD_SIZE);
            prop_assert!(player.health <= MAX_HEALTH);
            prop_assert!(player.max_mana <= MAX_MANA);
            prop_assert!(player.mana <= player.max_mana);
            prop_assert!(player.board.iter().all(|m| m.health > 0));
        }
    }
}

// =============================================================================
// Encoder
// =============================================================================

proptest! {
    #[test]
    fn prop_encoding_is_finite_and_sized(state in arb_position()) {
        let encoder = CardGameEncoder::new();
        for side in [Side::First, Side::Second] {
            let encoded = encoder.encode(&state, side);
            prop_assert_eq!(encoded.len(), STATE_SIZE);
            prop_assert!(encoded.tensor.iter().all(|v| v.is_finite()));
        }
    }
}

// =============================================================================
// Replay Buffer
// =============================================================================

proptest! {
    #[test]
    fn prop_replay_keeps_most_recent(capacity in 1usize..40, inserts in 0usize..120) {
        let mut buffer = ReplayBuffer::new(capacity);
        let s = EncodedState::zeros(vec![1]);
        for i in 0..inserts {
            buffer.add(Transition::new(s.clone(), 0, i as f32, s.clone(), false));
        }

        let kept = inserts.min(capacity);
        prop_assert_eq!(buffer.len(), kept);
        let rewards: Vec<f32> = buffer.iter_chronological().map(|t| t.reward).collect();
        let expected: Vec<f32> = (inserts - kept..inserts).map(|i| i as f32).collect();
        prop_assert_eq!(rewards, expected);
    }

    #[test]
    fn prop_replay_sample_is_distinct(capacity in 1usize..40, inserts in 1usize..80, k in 1usize..40, seed in any::<u64>()) {
        let mut buffer = ReplayBuffer::new(capacity);
        let s = EncodedState::zeros(vec![1]);
        for i in 0..inserts {
            buffer.add(Transition::new(s.clone(), 0, i as f32, s.clone(), false));
        }

        let mut rng = GameRng::new(seed);
        let batch = buffer.sample(k, &mut rng).unwrap();
        prop_assert_eq!(batch.len(), k.min(buffer.len()));
        let mut rewards: Vec<i64> = batch.iter().map(|t| t.reward as i64).collect();
        rewards.sort_unstable();
        rewards.dedup();
        prop_assert_eq!(rewards.len(), batch.len());
    }
}
