//! Built-in deck archetypes.

use serde::{Deserialize, Serialize};

use crate::core::{Card, Deck, SpellEffect};

/// The three stock decks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Archetype {
    /// Cheap minions, charge and face damage.
    Aggro,
    /// Efficient mid-cost minions with some removal and draw.
    Midrange,
    /// Taunt walls, healing and expensive finishers.
    Control,
}

impl Archetype {
    pub const ALL: [Archetype; 3] = [Archetype::Aggro, Archetype::Midrange, Archetype::Control];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Archetype::Aggro => "aggro",
            Archetype::Midrange => "midrange",
            Archetype::Control => "control",
        }
    }

    /// Parse a lowercase archetype name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// The 30-card list for this archetype, in a fixed order.
    #[must_use]
    pub fn deck(self) -> Deck {
        let entries: Vec<(usize, Card)> = match self {
            Archetype::Aggro => vec![
                (4, Card::minion(1, 1, 2, 1)),
                (4, Card::minion(2, 1, 1, 2)),
                (4, Card::minion(3, 2, 3, 2)),
                (4, Card::minion(4, 2, 2, 1).with_charge()),
                (3, Card::minion(5, 3, 3, 3)),
                (3, Card::minion(6, 3, 4, 2).with_charge()),
                (4, Card::spell(7, 1, SpellEffect::DamageFace(2))),
                (2, Card::spell(8, 2, SpellEffect::DamageRandomEnemy(3))),
                (2, Card::minion(9, 4, 5, 3)),
            ],
            Archetype::Midrange => vec![
                (2, Card::minion(2, 1, 1, 2)),
                (4, Card::minion(3, 2, 3, 2)),
                (4, Card::minion(10, 3, 3, 4)),
                (2, Card::minion(11, 3, 2, 4).with_taunt()),
                (4, Card::minion(12, 4, 4, 5)),
                (3, Card::minion(13, 5, 5, 5)),
                (2, Card::minion(14, 6, 6, 6)),
                (3, Card::spell(8, 2, SpellEffect::DamageRandomEnemy(3))),
                (3, Card::spell(15, 3, SpellEffect::Draw(2))),
                (3, Card::spell(16, 4, SpellEffect::DamageFace(4))),
            ],
            Archetype::Control => vec![
                (4, Card::minion(17, 2, 1, 4).with_taunt()),
                (4, Card::minion(11, 3, 2, 4).with_taunt()),
                (3, Card::minion(10, 3, 3, 4)),
                (3, Card::minion(18, 5, 3, 7).with_taunt()),
                (2, Card::minion(19, 7, 7, 7)),
                (2, Card::minion(20, 8, 8, 8)),
                (4, Card::spell(21, 2, SpellEffect::Heal(5))),
                (4, Card::spell(15, 3, SpellEffect::Draw(2))),
                (4, Card::spell(22, 4, SpellEffect::DamageRandomEnemy(5))),
            ],
        };

        let cards = entries
            .into_iter()
            .flat_map(|(copies, card)| std::iter::repeat(card).take(copies))
            .collect();
        Deck::new(self.name(), cards)
    }
}

impl std::fmt::Display for Archetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
