//! Actions and their fixed integer encoding.
//!
//! Every decision the learner can make is one of four kinds. The network sees
//! actions only as indices into a fixed 68-slot output layer:
//!
//! | indices | action |
//! |---|---|
//! | 0–9 | play the card in hand slot `i` |
//! | 10–59 | attacker `a` attacks enemy minion `t`: `10 + a*7 + t` (59 is never legal) |
//! | 60–66 | attacker `a` attacks the enemy hero: `60 + a` |
//! | 67 | end turn |
//!
//! ```
//! use ccg_learner::core::Action;
//!
//! let attack = Action::AttackMinion { attacker_index: 2, target_index: 5 };
//! assert_eq!(attack.encode().unwrap(), 10 + 2 * 7 + 5);
//! assert_eq!(Action::decode(29).unwrap(), attack);
//! ```

use serde::{Deserialize, Serialize};

use super::state::{MAX_BOARD_SIZE, MAX_HAND_SIZE};
use crate::error::ActionError;

/// Number of action indices.
pub const ACTION_SPACE_SIZE: usize = 68;

/// First attack-minion index.
pub const ATTACK_MINION_BASE: usize = MAX_HAND_SIZE;

/// First attack-face index. The attack-minion block is 50 slots wide; its last
/// slot decodes to attacker 7, which no board has.
pub const ATTACK_FACE_BASE: usize = 60;

/// The end-turn index.
pub const END_TURN_INDEX: usize = 67;

/// A structured action. Indices refer to hand and board slots of the acting
/// side (attacker) and the opposing side (target).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
    PlayCard { hand_index: usize },
    AttackMinion { attacker_index: usize, target_index: usize },
    AttackFace { attacker_index: usize },
    EndTurn,
}

impl Action {
    /// The unique action at `index`.
    pub fn decode(index: usize) -> Result<Self, ActionError> {
        match index {
            i if i < ATTACK_MINION_BASE => Ok(Action::PlayCard { hand_index: i }),
            i if i < ATTACK_FACE_BASE => {
                let offset = i - ATTACK_MINION_BASE;
                Ok(Action::AttackMinion {
                    attacker_index: offset / MAX_BOARD_SIZE,
                    target_index: offset % MAX_BOARD_SIZE,
                })
            }
            i if i < END_TURN_INDEX => Ok(Action::AttackFace {
                attacker_index: i - ATTACK_FACE_BASE,
            }),
            END_TURN_INDEX => Ok(Action::EndTurn),
            other => Err(ActionError::InvalidIndex(other)),
        }
    }

    /// The index of this action; the exact inverse of [`Action::decode`].
    pub fn encode(&self) -> Result<usize, ActionError> {
        match *self {
            Action::PlayCard { hand_index } => {
                check_slot("hand_index", hand_index, MAX_HAND_SIZE)?;
                Ok(hand_index)
            }
            Action::AttackMinion { attacker_index, target_index } => {
                check_slot("target_index", target_index, MAX_BOARD_SIZE)?;
                let span = ATTACK_FACE_BASE - ATTACK_MINION_BASE;
                check_slot("attacker_index", attacker_index, span.div_ceil(MAX_BOARD_SIZE))?;
                let row = ATTACK_MINION_BASE + attacker_index * MAX_BOARD_SIZE;
                check_slot("target_index", target_index, ATTACK_FACE_BASE - row)?;
                Ok(row + target_index)
            }
            Action::AttackFace { attacker_index } => {
                check_slot("attacker_index", attacker_index, MAX_BOARD_SIZE)?;
                Ok(ATTACK_FACE_BASE + attacker_index)
            }
            Action::EndTurn => Ok(END_TURN_INDEX),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::PlayCard { .. } => ActionKind::PlayCard,
            Action::AttackMinion { .. } => ActionKind::AttackMinion,
            Action::AttackFace { .. } => ActionKind::AttackFace,
            Action::EndTurn => ActionKind::EndTurn,
        }
    }

    #[must_use]
    pub fn is_end_turn(&self) -> bool {
        matches!(self, Action::EndTurn)
    }
}

fn check_slot(field: &'static str, value: usize, limit: usize) -> Result<(), ActionError> {
    if value < limit {
        Ok(())
    } else {
        Err(ActionError::FieldOutOfRange { field, value, limit })
    }
}

/// Discriminant of an [`Action`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    PlayCard,
    AttackMinion,
    AttackFace,
    EndTurn,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActionKind::PlayCard => "PlayCard",
            ActionKind::AttackMinion => "AttackMinion",
            ActionKind::AttackFace => "AttackFace",
            ActionKind::EndTurn => "EndTurn",
        };
        f.write_str(name)
    }
}

/// Loosely-typed action as it arrives from outside (a log file, a UI, a
/// replay dump): a kind plus whichever fields the sender filled in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawAction {
    pub kind: Option<ActionKind>,
    pub hand_index: Option<usize>,
    pub attacker_index: Option<usize>,
    pub target_index: Option<usize>,
}

impl RawAction {
    pub fn new(kind: ActionKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }
}

impl TryFrom<RawAction> for Action {
    type Error = ActionError;

    fn try_from(raw: RawAction) -> Result<Self, Self::Error> {
        let kind = raw.kind.ok_or(ActionError::MissingField {
            kind: None,
            field: "kind",
        })?;
        let require = |value: Option<usize>, field: &'static str| {
            value.ok_or(ActionError::MissingField {
                kind: Some(kind),
                field,
            })
        };
        Ok(match kind {
            ActionKind::PlayCard => Action::PlayCard {
                hand_index: require(raw.hand_index, "hand_index")?,
            },
            ActionKind::AttackMinion => Action::AttackMinion {
                attacker_index: require(raw.attacker_index, "attacker_index")?,
                target_index: require(raw.target_index, "target_index")?,
            },
            ActionKind::AttackFace => Action::AttackFace {
                attacker_index: require(raw.attacker_index, "attacker_index")?,
            },
            ActionKind::EndTurn => Action::EndTurn,
        })
    }
}

impl From<Action> for RawAction {
    fn from(action: Action) -> Self {
        let mut raw = RawAction::new(action.kind());
        match action {
            Action::PlayCard { hand_index } => raw.hand_index = Some(hand_index),
            Action::AttackMinion { attacker_index, target_index } => {
                raw.attacker_index = Some(attacker_index);
                raw.target_index = Some(target_index);
            }
            Action::AttackFace { attacker_index } => raw.attacker_index = Some(attacker_index),
            Action::EndTurn => {}
        }
        raw
    }
}
