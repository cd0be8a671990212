//! Seat identification and per-seat data storage.
//!
//! ## Side
//!
//! The game is strictly two-seated. `Side` names a seat; `opponent()` flips
//! it. Code that needs "the acting side" and "the other side" takes a `Side`
//! and asks the state for `own(side)` / `opponent(side)` rather than swapping
//! the two halves of the state around.
//!
//! ## SideMap
//!
//! Fixed two-entry storage indexable by `Side`.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// One of the two seats at the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The seat that takes the first turn.
    First,
    /// The seat that takes the second turn.
    Second,
}

impl Side {
    /// Both sides, in turn order.
    pub const BOTH: [Side; 2] = [Side::First, Side::Second];

    /// The other seat.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }

    /// Storage index (0 for `First`, 1 for `Second`).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Side::First => 0,
            Side::Second => 1,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::First => write!(f, "first"),
            Side::Second => write!(f, "second"),
        }
    }
}

/// Per-side data storage with O(1) access.
///
/// ```
/// use ccg_learner::core::{Side, SideMap};
///
/// let mut health = SideMap::with_value(30);
/// health[Side::Second] -= 4;
///
/// assert_eq!(health[Side::First], 30);
/// assert_eq!(health[Side::Second], 26);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SideMap<T> {
    data: [T; 2],
}

impl<T> SideMap<T> {
    /// Create from explicit values for each side.
    pub fn new(first: T, second: T) -> Self {
        Self {
            data: [first, second],
        }
    }

    /// Create with values from a factory function.
    pub fn from_fn(factory: impl Fn(Side) -> T) -> Self {
        Self::new(factory(Side::First), factory(Side::Second))
    }

    /// Create with both entries set to the same value.
    pub fn with_value(value: T) -> Self
    where
        T: Clone,
    {
        Self::new(value.clone(), value)
    }

    /// Iterate over `(Side, &T)` pairs in turn order.
    pub fn iter(&self) -> impl Iterator<Item = (Side, &T)> {
        Side::BOTH.into_iter().zip(self.data.iter())
    }

    /// Mutable access to both entries at once.
    pub fn pair_mut(&mut self, side: Side) -> (&mut T, &mut T) {
        let [first, second] = &mut self.data;
        match side {
            Side::First => (first, second),
            Side::Second => (second, first),
        }
    }
}

impl<T: Default> Default for SideMap<T> {
    fn default() -> Self {
        Self::new(T::default(), T::default())
    }
}

impl<T> Index<Side> for SideMap<T> {
    type Output = T;

    fn index(&self, side: Side) -> &Self::Output {
        &self.data[side.index()]
    }
}

impl<T> IndexMut<Side> for SideMap<T> {
    fn index_mut(&mut self, side: Side) -> &mut Self::Output {
        &mut self.data[side.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opponent_flips() {
        assert_eq!(Side::First.opponent(), Side::Second);
        assert_eq!(Side::Second.opponent(), Side::First);
        assert_eq!(Side::First.opponent().opponent(), Side::First);
    }

    #[test]
    fn test_index_and_display() {
        assert_eq!(Side::First.index(), 0);
        assert_eq!(Side::Second.index(), 1);
        assert_eq!(format!("{}", Side::Second), "second");
    }

    #[test]
    fn test_side_map_from_fn() {
        let map = SideMap::from_fn(|s| s.index() * 10);
        assert_eq!(map[Side::First], 0);
        assert_eq!(map[Side::Second], 10);
    }

    #[test]
    fn test_side_map_pair_mut() {
        let mut map = SideMap::new(1, 2);
        let (own, other) = map.pair_mut(Side::Second);
        *own += 10;
        *other += 100;
        assert_eq!(map[Side::First], 101);
        assert_eq!(map[Side::Second], 12);
    }

    #[test]
    fn test_side_map_iter_order() {
        let map = SideMap::new('a', 'b');
        let pairs: Vec<_> = map.iter().collect();
        assert_eq!(pairs, vec![(Side::First, &'a'), (Side::Second, &'b')]);
    }

    #[test]
    fn test_side_map_serialization() {
        let map = SideMap::new(3u32, 7u32);
        let json = serde_json::to_string(&map).unwrap();
        let back: SideMap<u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(map, back);
    }
}
