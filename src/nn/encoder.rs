//! State encoding for network input.
//!
//! Transforms a [`GameState`] into a fixed-length feature vector seen from
//! one side. Slot `i` always means the same feature, so the encoding can be
//! fed straight into a dense network.

use crate::core::{
    Card, GameState, Minion, PlayerState, Side, ACTION_SPACE_SIZE, DECK_SIZE, MAX_BOARD_SIZE,
    MAX_HAND_SIZE, MAX_HEALTH, MAX_MANA,
};
use crate::nn::traits::EncodedState;

/// Encodes game state into tensors for network input.
///
/// Each encoder defines:
/// - How to convert state to a tensor from a side's perspective
/// - The shape of the output tensor
/// - The size of the action space
pub trait StateEncoder {
    /// Encode the game state from `perspective`.
    ///
    /// Must be a pure function of `(state, perspective)`.
    fn encode(&self, state: &GameState, perspective: Side) -> EncodedState;

    /// Get the shape of encoded states.
    fn output_shape(&self) -> Vec<usize>;

    /// Get the total number of possible actions.
    fn action_space_size(&self) -> usize;
}

const HEALTH_SCALE: f32 = MAX_HEALTH as f32;
const MANA_SCALE: f32 = MAX_MANA as f32;
const TURN_SCALE: f32 = 30.0;
const HAND_SCALE: f32 = MAX_HAND_SIZE as f32;
const COST_SCALE: f32 = 10.0;
const ATTACK_SCALE: f32 = 10.0;
const DECK_SCALE: f32 = DECK_SIZE as f32;

const HAND_SLOT_FEATURES: usize = 4;
const BOARD_SLOT_FEATURES: usize = 5;

/// Length of a [`CardGameEncoder`] vector.
pub const STATE_SIZE: usize = 3 + 3 + 3
    + MAX_HAND_SIZE * HAND_SLOT_FEATURES
    + 2 * MAX_BOARD_SIZE * BOARD_SLOT_FEATURES
    + 2;

/// Flat 121-feature encoder.
///
/// Layout, with "own" meaning the perspective side:
/// - `[0..3)` own health/30, mana/10, max mana/10
/// - `[3..6)` the same for the opponent
/// - `[6..9)` turn/30, 1 if it is the perspective side's turn, opponent hand size/10
/// - `[9..49)` 10 own hand slots × (cost/10, minion flag, attack/10, health/30)
/// - `[49..84)` 7 own board slots × (cost/10, attack/10, health/30, can attack, taunt)
/// - `[84..119)` 7 opponent board slots, same features
/// - `[119..121)` own and opponent remaining deck / 30
///
/// Empty slots are zero. The opponent's hand contents are never encoded.
#[derive(Clone, Copy, Debug, Default)]
pub struct CardGameEncoder;

impl CardGameEncoder {
    pub fn new() -> Self {
        Self
    }

    fn push_resources(out: &mut Vec<f32>, player: &PlayerState) {
        out.push(player.health as f32 / HEALTH_SCALE);
        out.push(player.mana as f32 / MANA_SCALE);
        out.push(player.max_mana as f32 / MANA_SCALE);
    }

    fn push_hand(out: &mut Vec<f32>, hand: &[Card]) {
        for slot in 0..MAX_HAND_SIZE {
            match hand.get(slot) {
                Some(card) => out.extend_from_slice(&[
                    card.cost as f32 / COST_SCALE,
                    flag(card.occupies_board()),
                    card.attack() as f32 / ATTACK_SCALE,
                    card.health() as f32 / HEALTH_SCALE,
                ]),
                None => out.extend_from_slice(&[0.0; HAND_SLOT_FEATURES]),
            }
        }
    }

    fn push_board(out: &mut Vec<f32>, board: &[Minion]) {
        for slot in 0..MAX_BOARD_SIZE {
            match board.get(slot) {
                Some(minion) => out.extend_from_slice(&[
                    minion.cost as f32 / COST_SCALE,
                    minion.attack as f32 / ATTACK_SCALE,
                    minion.health as f32 / HEALTH_SCALE,
                    flag(minion.can_attack()),
                    flag(minion.forces_attacks()),
                ]),
                None => out.extend_from_slice(&[0.0; BOARD_SLOT_FEATURES]),
            }
        }
    }
}

fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

impl StateEncoder for CardGameEncoder {
    fn encode(&self, state: &GameState, perspective: Side) -> EncodedState {
        let own = state.own(perspective);
        let enemy = state.opponent(perspective);
        let mut tensor = Vec::with_capacity(STATE_SIZE);

        Self::push_resources(&mut tensor, own);
        Self::push_resources(&mut tensor, enemy);

        tensor.push(state.turn as f32 / TURN_SCALE);
        tensor.push(flag(state.is_turn_of(perspective)));
        tensor.push(enemy.hand.len() as f32 / HAND_SCALE);

        Self::push_hand(&mut tensor, &own.hand);
        Self::push_board(&mut tensor, &own.board);
        Self::push_board(&mut tensor, &enemy.board);

        tensor.push(own.deck.len() as f32 / DECK_SCALE);
        tensor.push(enemy.deck.len() as f32 / DECK_SCALE);

        EncodedState::new(tensor, vec![STATE_SIZE])
    }

    fn output_shape(&self) -> Vec<usize> {
        vec![STATE_SIZE]
    }

    fn action_space_size(&self) -> usize {
        ACTION_SPACE_SIZE
    }
}
