//! Cards, minions on the board, and decks.
//!
//! A card in hand is either a minion (it occupies a board slot when played)
//! or a spell (it resolves immediately). Once a minion card is played it
//! becomes a [`Minion`], which tracks damage and how many attacks it has left
//! this turn.

use serde::{Deserialize, Serialize};

/// Catalog identifier of a card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(pub u16);

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

/// What a spell does when it resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpellEffect {
    /// Damage the enemy hero.
    DamageFace(i32),
    /// Damage one random enemy character (a minion or the hero).
    DamageRandomEnemy(i32),
    /// Draw cards.
    Draw(u32),
    /// Restore health to the caster's hero.
    Heal(i32),
}

/// Card behaviour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardKind {
    Minion {
        attack: i32,
        health: i32,
        /// Enemies must attack this minion before anything else.
        taunt: bool,
        /// May attack on the turn it is played.
        charge: bool,
    },
    Spell(SpellEffect),
}

/// A card in a hand or deck.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub cost: i32,
    pub kind: CardKind,
}

impl Card {
    /// A minion card.
    #[must_use]
    pub const fn minion(id: u16, cost: i32, attack: i32, health: i32) -> Self {
        Self {
            id: CardId(id),
            cost,
            kind: CardKind::Minion {
                attack,
                health,
                taunt: false,
                charge: false,
            },
        }
    }

    /// A spell card.
    #[must_use]
    pub const fn spell(id: u16, cost: i32, effect: SpellEffect) -> Self {
        Self {
            id: CardId(id),
            cost,
            kind: CardKind::Spell(effect),
        }
    }

    /// Give a minion card taunt. No effect on spells.
    #[must_use]
    pub fn with_taunt(mut self) -> Self {
        if let CardKind::Minion { attack, health, charge, .. } = self.kind {
            self.kind = CardKind::Minion { attack, health, taunt: true, charge };
        }
        self
    }

    /// Give a minion card charge. No effect on spells.
    #[must_use]
    pub fn with_charge(mut self) -> Self {
        if let CardKind::Minion { attack, health, taunt, .. } = self.kind {
            self.kind = CardKind::Minion { attack, health, taunt, charge: true };
        }
        self
    }

    /// Does playing this card put something on the board?
    #[must_use]
    pub const fn occupies_board(&self) -> bool {
        matches!(self.kind, CardKind::Minion { .. })
    }

    /// Printed attack (0 for spells).
    #[must_use]
    pub const fn attack(&self) -> i32 {
        match self.kind {
            CardKind::Minion { attack, .. } => attack,
            CardKind::Spell(_) => 0,
        }
    }

    /// Printed health (0 for spells).
    #[must_use]
    pub const fn health(&self) -> i32 {
        match self.kind {
            CardKind::Minion { health, .. } => health,
            CardKind::Spell(_) => 0,
        }
    }

    /// Summon this card as a minion. `None` for spells.
    #[must_use]
    pub fn summon(&self) -> Option<Minion> {
        match self.kind {
            CardKind::Minion { attack, health, taunt, charge } => Some(Minion {
                card: self.id,
                cost: self.cost,
                attack,
                health,
                max_health: health,
                taunt,
                charge,
                attacks_left: u8::from(charge),
            }),
            CardKind::Spell(_) => None,
        }
    }
}

/// A minion on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Minion {
    pub card: CardId,
    pub cost: i32,
    pub attack: i32,
    /// Current health.
    pub health: i32,
    pub max_health: i32,
    pub taunt: bool,
    pub charge: bool,
    /// Attacks remaining this turn. Refreshed by the simulator at turn start.
    pub attacks_left: u8,
}

impl Minion {
    /// Is this minion currently allowed to attack?
    #[must_use]
    pub const fn can_attack(&self) -> bool {
        self.attack > 0 && self.attacks_left > 0
    }

    /// Must enemy attacks target this minion first?
    #[must_use]
    pub const fn forces_attacks(&self) -> bool {
        self.taunt
    }

    /// Attack plus current health.
    #[must_use]
    pub const fn strength(&self) -> i32 {
        self.attack + self.health
    }

    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.health <= 0
    }
}

/// A named list of cards a seat starts the game with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    pub name: String,
    pub cards: Vec<Card>,
}

impl Deck {
    pub fn new(name: impl Into<String>, cards: Vec<Card>) -> Self {
        Self {
            name: name.into(),
            cards,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minion_card_summon() {
        let card = Card::minion(1, 3, 2, 4).with_taunt();
        let minion = card.summon().unwrap();

        assert_eq!(minion.attack, 2);
        assert_eq!(minion.health, 4);
        assert_eq!(minion.max_health, 4);
        assert!(minion.forces_attacks());
        assert!(!minion.can_attack(), "summoning sickness without charge");
    }

    #[test]
    fn test_charge_minion_attacks_immediately() {
        let minion = Card::minion(2, 1, 1, 1).with_charge().summon().unwrap();
        assert!(minion.can_attack());
    }

    #[test]
    fn test_zero_attack_minion_cannot_attack() {
        let mut minion = Card::minion(3, 2, 0, 5).summon().unwrap();
        minion.attacks_left = 1;
        assert!(!minion.can_attack());
    }

    #[test]
    fn test_spell_is_not_board_card() {
        let spell = Card::spell(9, 2, SpellEffect::DamageFace(3));
        assert!(!spell.occupies_board());
        assert!(spell.summon().is_none());
        assert_eq!(spell.attack(), 0);
        assert_eq!(spell.health(), 0);
        assert_eq!(spell.with_taunt(), spell);
    }

    #[test]
    fn test_strength() {
        let mut minion = Card::minion(4, 4, 3, 5).summon().unwrap();
        minion.health = 2;
        assert_eq!(minion.strength(), 5);
    }

    #[test]
    fn test_card_serialization() {
        let card = Card::minion(5, 2, 2, 3).with_charge();
        let json = serde_json::to_string(&card).unwrap();
        let back: Card = serde_json::from_str(&json).unwrap();
        assert_eq!(card, back);
    }
}
