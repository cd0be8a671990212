//! Legality oracle over the fixed 68-slot action space.
//!
//! `ActionSpace` answers "may `side` take this action in this state?" using
//! only the hand, mana and minion predicates on [`GameState`]. It does not
//! check whose turn it is; simulators do that when the action is applied.

use crate::core::{Action, GameState, Minion, RawAction, Side, ACTION_SPACE_SIZE};
use crate::error::ActionError;

/// The 68-slot discrete action space.
#[derive(Clone, Copy, Debug, Default)]
pub struct ActionSpace;

impl ActionSpace {
    /// Number of action indices.
    pub const SIZE: usize = ACTION_SPACE_SIZE;

    /// The unique action at `index`.
    pub fn decode(index: usize) -> Result<Action, ActionError> {
        Action::decode(index)
    }

    /// Index of a structured action.
    pub fn encode(action: &Action) -> Result<usize, ActionError> {
        action.encode()
    }

    /// Index of a loosely-typed action; fails if a required field is absent.
    pub fn encode_raw(raw: RawAction) -> Result<usize, ActionError> {
        Action::try_from(raw)?.encode()
    }

    /// Is `action` legal for `side` in `state`?
    ///
    /// - PlayCard: the slot holds a card, it is affordable, and minions need a
    ///   free board slot
    /// - Attacks: the attacker exists and can attack
    /// - Taunt: while the enemy has a taunt minion, face attacks are illegal
    ///   and only taunt minions may be attacked
    /// - EndTurn: always legal
    #[must_use]
    pub fn is_legal(action: &Action, state: &GameState, side: Side) -> bool {
        let own = state.own(side);
        let enemy = state.opponent(side);

        match *action {
            Action::PlayCard { hand_index } => own.hand.get(hand_index).is_some_and(|card| {
                card.cost <= own.mana && (!card.occupies_board() || own.board_has_space())
            }),
            Action::AttackMinion {
                attacker_index,
                target_index,
            } => {
                let (Some(attacker), Some(target)) = (
                    own.board.get(attacker_index),
                    enemy.board.get(target_index),
                ) else {
                    return false;
                };
                attacker.can_attack() && (target.forces_attacks() || !enemy.has_taunt())
            }
            Action::AttackFace { attacker_index } => {
                own.board.get(attacker_index).is_some_and(Minion::can_attack)
                    && !enemy.has_taunt()
            }
            Action::EndTurn => true,
        }
    }

    /// Is the action at `index` legal? Out-of-range indices are not.
    #[must_use]
    pub fn is_legal_index(index: usize, state: &GameState, side: Side) -> bool {
        Action::decode(index).is_ok_and(|action| Self::is_legal(&action, state, side))
    }

    /// All legal indices, ascending. Never empty: EndTurn is always legal.
    #[must_use]
    pub fn legal_actions(state: &GameState, side: Side) -> Vec<usize> {
        (0..Self::SIZE)
            .filter(|&index| Self::is_legal_index(index, state, side))
            .collect()
    }

    /// 68 values aligned to action indices: 1.0 if legal, else 0.0.
    #[must_use]
    pub fn legality_mask(state: &GameState, side: Side) -> Vec<f32> {
        (0..Self::SIZE)
            .map(|index| {
                if Self::is_legal_index(index, state, side) {
                    1.0
                } else {
                    0.0
                }
            })
            .collect()
    }
}
