//! Skirmish rules.

use crate::core::{
    Action, Card, CardKind, Deck, GameRng, GameState, PlayerState, Side, SpellEffect,
    MAX_HAND_SIZE, MAX_HEALTH, MAX_MANA,
};
use crate::error::SimulationError;
use crate::rules::{ActionSpace, GameResult, GameSetup, Simulator};

/// Two-seat minion battler.
#[derive(Clone, Debug)]
pub struct Skirmish {
    rng: GameRng,
    shuffle: bool,
}

impl Skirmish {
    /// Create a simulator with its own seeded RNG. Decks are shuffled.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: GameRng::new(seed),
            shuffle: true,
        }
    }

    /// Keep decks in list order (draws become predictable).
    #[must_use]
    pub fn without_shuffle(mut self) -> Self {
        self.shuffle = false;
        self
    }

    fn seat(&mut self, deck: &Deck, setup: &GameSetup) -> PlayerState {
        let mut cards = deck.cards.clone();
        if self.shuffle {
            self.rng.shuffle(&mut cards);
        }
        let mut player = PlayerState::new(cards);
        player.max_mana = (setup.starting_mana - 1).clamp(0, MAX_MANA);
        for _ in 0..setup.opening_hand {
            draw(&mut player);
        }
        player
    }

    fn cast(&mut self, state: &mut GameState, side: Side, effect: SpellEffect) {
        let (own, enemy) = state.players.pair_mut(side);
        match effect {
            SpellEffect::DamageFace(amount) => enemy.health -= amount,
            SpellEffect::DamageRandomEnemy(amount) => {
                // Hero is the last candidate.
                let pick = self.rng.index(enemy.board.len() + 1);
                match enemy.board.get_mut(pick) {
                    Some(minion) => minion.health -= amount,
                    None => enemy.health -= amount,
                }
            }
            SpellEffect::Draw(count) => {
                for _ in 0..count {
                    draw(own);
                }
            }
            SpellEffect::Heal(amount) => own.health = (own.health + amount).min(MAX_HEALTH),
        }
    }

    fn play_card(&mut self, state: &mut GameState, side: Side, hand_index: usize) {
        let own = state.own_mut(side);
        let card: Card = own.hand.remove(hand_index);
        own.mana -= card.cost;
        match card.kind {
            CardKind::Minion { .. } => {
                if let Some(minion) = card.summon() {
                    own.board.push(minion);
                }
            }
            CardKind::Spell(effect) => self.cast(state, side, effect),
        }
    }
}

/// Draw one card. Overdrawn cards are burned; an empty deck deals
/// increasing fatigue damage.
fn draw(player: &mut PlayerState) {
    match player.deck.pop_front() {
        Some(card) if player.hand.len() < MAX_HAND_SIZE => player.hand.push(card),
        Some(_) => {}
        None => {
            player.fatigue += 1;
            player.health -= player.fatigue;
        }
    }
}

/// Gain a mana crystal, refill, draw, and ready the board.
fn begin_turn(state: &mut GameState, side: Side) {
    let player = state.own_mut(side);
    player.max_mana = (player.max_mana + 1).min(MAX_MANA);
    player.mana = player.max_mana;
    draw(player);
    for minion in &mut player.board {
        minion.attacks_left = 1;
    }
}

fn remove_dead(state: &mut GameState) {
    for side in Side::BOTH {
        state.own_mut(side).board.retain(|m| !m.is_dead());
    }
}

impl Simulator for Skirmish {
    fn initial_state(&mut self, first: &Deck, second: &Deck, setup: &GameSetup) -> GameState {
        let first = self.seat(first, setup);
        let second = self.seat(second, setup);
        let mut state = GameState::new(first, second);
        begin_turn(&mut state, Side::First);
        state
    }

    fn apply(
        &mut self,
        state: &GameState,
        action: &Action,
        side: Side,
    ) -> Result<GameState, SimulationError> {
        if !state.is_turn_of(side) {
            return Err(SimulationError::NotYourTurn {
                side,
                active: state.active,
            });
        }
        if !ActionSpace::is_legal(action, state, side) {
            return Err(SimulationError::IllegalAction(*action));
        }

        let mut next = state.clone();
        match *action {
            Action::PlayCard { hand_index } => self.play_card(&mut next, side, hand_index),
            Action::AttackMinion {
                attacker_index,
                target_index,
            } => {
                let (own, enemy) = next.players.pair_mut(side);
                let attacker = &mut own.board[attacker_index];
                let target = &mut enemy.board[target_index];
                target.health -= attacker.attack;
                attacker.health -= target.attack;
                attacker.attacks_left -= 1;
            }
            Action::AttackFace { attacker_index } => {
                let (own, enemy) = next.players.pair_mut(side);
                let attacker = &mut own.board[attacker_index];
                enemy.health -= attacker.attack;
                attacker.attacks_left -= 1;
            }
            Action::EndTurn => {
                let incoming = side.opponent();
                next.active = incoming;
                next.turn += 1;
                begin_turn(&mut next, incoming);
            }
        }
        remove_dead(&mut next);
        Ok(next)
    }

    fn is_terminal(&self, state: &GameState) -> Option<GameResult> {
        match (
            state.own(Side::First).is_dead(),
            state.own(Side::Second).is_dead(),
        ) {
            (true, true) => Some(GameResult::Draw),
            (true, false) => Some(GameResult::Winner(Side::Second)),
            (false, true) => Some(GameResult::Winner(Side::First)),
            (false, false) => None,
        }
    }
}
