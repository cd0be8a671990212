//! Reward shaping.
//!
//! `calculate_reward` scores one transition from the acting side's point of
//! view. Terminal transitions score exactly the win or loss reward. Every
//! other transition sums weighted deltas between the state before and after
//! the action. The presets are alternative weight vectors; there is only one
//! scoring function.

use serde::{Deserialize, Serialize};

use crate::core::{Action, GameState, Side};
use crate::rules::Outcome;

/// Reward weights.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub win_reward: f32,
    /// Also used for draws.
    pub loss_reward: f32,
    /// Per point of own health gained.
    pub own_health_weight: f32,
    /// Per point of damage dealt to the enemy hero.
    pub enemy_health_weight: f32,
    /// Per enemy minion removed.
    pub minion_kill_weight: f32,
    /// Per own minion lost.
    pub minion_loss_weight: f32,
    /// Per point of change in board strength difference.
    pub board_advantage_weight: f32,
    /// Per card of net hand growth.
    pub card_draw_weight: f32,
    /// Per mana spent by the action.
    pub mana_used_weight: f32,
    /// Per mana left unspent when ending the turn (normally negative).
    pub mana_wasted_weight: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            win_reward: 10.0,
            loss_reward: -10.0,
            own_health_weight: 0.3,
            enemy_health_weight: 0.3,
            minion_kill_weight: 0.5,
            minion_loss_weight: 0.5,
            board_advantage_weight: 0.05,
            card_draw_weight: 0.1,
            mana_used_weight: 0.05,
            mana_wasted_weight: -0.02,
        }
    }
}

impl RewardConfig {
    /// Favours face damage over board control.
    #[must_use]
    pub fn aggressive() -> Self {
        Self {
            own_health_weight: 0.15,
            enemy_health_weight: 0.6,
            minion_kill_weight: 0.3,
            minion_loss_weight: 0.2,
            board_advantage_weight: 0.03,
            ..Self::default()
        }
    }

    /// Favours preserving health and trading minions.
    #[must_use]
    pub fn defensive() -> Self {
        Self {
            own_health_weight: 0.6,
            enemy_health_weight: 0.2,
            minion_kill_weight: 0.7,
            minion_loss_weight: 0.8,
            board_advantage_weight: 0.08,
            ..Self::default()
        }
    }

    /// Favours spending mana efficiently and holding the board.
    #[must_use]
    pub fn tempo() -> Self {
        Self {
            board_advantage_weight: 0.1,
            mana_used_weight: 0.15,
            mana_wasted_weight: -0.08,
            minion_kill_weight: 0.6,
            ..Self::default()
        }
    }

    /// Look up a preset by name.
    #[must_use]
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "aggressive" => Some(Self::aggressive()),
            "defensive" => Some(Self::defensive()),
            "tempo" => Some(Self::tempo()),
            _ => None,
        }
    }
}

/// Score `side` taking `action` in `prev`, producing `next`.
///
/// `terminal` is the episode outcome for `side` if this transition ended the
/// game. Draws score the loss reward.
#[must_use]
pub fn calculate_reward(
    prev: &GameState,
    action: &Action,
    next: &GameState,
    side: Side,
    terminal: Option<Outcome>,
    config: &RewardConfig,
) -> f32 {
    if let Some(outcome) = terminal {
        return match outcome {
            Outcome::Win => config.win_reward,
            Outcome::Loss | Outcome::Draw => config.loss_reward,
        };
    }

    let (own_before, enemy_before) = (prev.own(side), prev.opponent(side));
    let (own_after, enemy_after) = (next.own(side), next.opponent(side));

    let own_health_delta = (own_after.health - own_before.health) as f32;
    let enemy_health_delta = (enemy_after.health - enemy_before.health) as f32;
    let mut reward = own_health_delta * config.own_health_weight
        - enemy_health_delta * config.enemy_health_weight;

    let enemy_board_delta = enemy_after.board.len() as f32 - enemy_before.board.len() as f32;
    reward += (-enemy_board_delta).max(0.0) * config.minion_kill_weight;

    let own_board_delta = own_after.board.len() as f32 - own_before.board.len() as f32;
    reward += own_board_delta.min(0.0) * config.minion_loss_weight;

    let advantage_before = own_before.board_strength() - enemy_before.board_strength();
    let advantage_after = own_after.board_strength() - enemy_after.board_strength();
    reward += (advantage_after - advantage_before) as f32 * config.board_advantage_weight;

    let hand_delta = own_after.hand.len() as f32 - own_before.hand.len() as f32;
    reward += hand_delta.max(0.0) * config.card_draw_weight;

    if action.is_end_turn() {
        reward += own_before.mana as f32 * config.mana_wasted_weight;
    } else {
        let spent = (own_before.mana - own_after.mana).max(0) as f32;
        reward += spent * config.mana_used_weight;
    }

    reward
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Card, PlayerState};

    fn assert_close(actual: f32, expected: f32) {
        assert!((actual - expected).abs() < 1e-5, "{actual} != {expected}");
    }

    fn base() -> GameState {
        GameState::new(PlayerState::default(), PlayerState::default())
    }

    fn play() -> Action {
        Action::PlayCard { hand_index: 0 }
    }

    #[test]
    fn test_own_damage_scenario() {
        let prev = base();
        let mut next = prev.clone();
        next.own_mut(Side::First).health = 28;

        let reward = calculate_reward(&prev, &play(), &next, Side::First, None, &RewardConfig::default());
        assert_close(reward, -0.6);
    }

    #[test]
    fn test_wasted_mana_scenario() {
        let mut prev = base();
        prev.own_mut(Side::First).mana = 3;
        let next = prev.clone();

        let reward = calculate_reward(
            &prev,
            &Action::EndTurn,
            &next,
            Side::First,
            None,
            &RewardConfig::default(),
        );
        assert_close(reward, -0.06);
    }

    #[test]
    fn test_terminal_ignores_deltas() {
        let prev = base();
        let mut next = prev.clone();
        next.own_mut(Side::First).health = 1;
        next.opponent_mut(Side::First).health = -4;
        let config = RewardConfig::default();

        let win = calculate_reward(&prev, &play(), &next, Side::First, Some(Outcome::Win), &config);
        let loss = calculate_reward(&prev, &play(), &next, Side::First, Some(Outcome::Loss), &config);
        let draw = calculate_reward(&prev, &play(), &next, Side::First, Some(Outcome::Draw), &config);
        assert_eq!(win, config.win_reward);
        assert_eq!(loss, config.loss_reward);
        assert_eq!(draw, config.loss_reward);
    }

    #[test]
    fn test_enemy_damage_is_rewarded() {
        let prev = base();
        let mut next = prev.clone();
        next.opponent_mut(Side::First).health = 25;

        let reward = calculate_reward(&prev, &play(), &next, Side::First, None, &RewardConfig::default());
        assert_close(reward, 5.0 * 0.3);
    }

    #[test]
    fn test_kill_and_board_advantage() {
        let mut prev = base();
        let enemy = Card::minion(1, 2, 2, 2).summon().unwrap();
        prev.opponent_mut(Side::First).board.push(enemy);
        let next = base();

        // One kill (+0.5) and enemy strength 4 removed (+4 * 0.05).
        let config = RewardConfig::default();
        let reward = calculate_reward(&prev, &play(), &next, Side::First, None, &config);
        assert_close(reward, 0.5 + 0.2);
    }

    #[test]
    fn test_minion_loss_penalty() {
        let mut prev = base();
        prev.own_mut(Side::First).board.push(Card::minion(1, 1, 1, 1).summon().unwrap());
        let next = base();

        let config = RewardConfig::default();
        let reward = calculate_reward(&prev, &play(), &next, Side::First, None, &config);
        assert_close(reward, -0.5 - 2.0 * 0.05);
    }

    #[test]
    fn test_mana_used_and_draw() {
        let mut prev = base();
        prev.own_mut(Side::First).mana = 5;
        let mut next = prev.clone();
        next.own_mut(Side::First).mana = 2;
        next.own_mut(Side::First).hand.push(Card::minion(1, 1, 1, 1));

        let config = RewardConfig::default();
        let reward = calculate_reward(&prev, &play(), &next, Side::First, None, &config);
        assert_close(reward, 3.0 * 0.05 + 0.1);
    }

    #[test]
    fn test_reward_from_second_side() {
        let prev = base();
        let mut next = prev.clone();
        next.own_mut(Side::First).health = 26;

        let reward = calculate_reward(&prev, &play(), &next, Side::Second, None, &RewardConfig::default());
        assert_close(reward, 4.0 * 0.3);
    }

    #[test]
    fn test_presets_differ_only_in_weights() {
        let prev = base();
        let mut next = prev.clone();
        next.opponent_mut(Side::First).health = 20;

        let default = calculate_reward(&prev, &play(), &next, Side::First, None, &RewardConfig::default());
        let aggressive = calculate_reward(&prev, &play(), &next, Side::First, None, &RewardConfig::aggressive());
        assert!(aggressive > default);

        assert_eq!(RewardConfig::preset("tempo"), Some(RewardConfig::tempo()));
        assert_eq!(RewardConfig::preset("unknown"), None);
        assert_eq!(RewardConfig::aggressive().win_reward, RewardConfig::default().win_reward);
    }

    #[test]
    fn test_config_toml_defaults() {
        let config: RewardConfig = toml::from_str("win_reward = 5.0").unwrap();
        assert_eq!(config.win_reward, 5.0);
        assert_eq!(config.loss_reward, -10.0);
    }
}
