//! Cup positions and the random swap that shuffles them.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{CUPS, ContainerId, Slot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("positions {0:?} are not a permutation of the table slots")]
pub struct NotAPermutation(pub [u8; CUPS]);

/// Bijection between cups and table slots.
///
/// Both directions are stored explicitly and kept inverse to each other. On
/// the wire it is the `slot_of` table: index is the cup, value is its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[u8; 3]", into = "[u8; 3]")]
pub struct PositionMap {
    slot_of: [Slot; CUPS],
    container_at: [ContainerId; CUPS],
}

impl Default for PositionMap {
    fn default() -> Self {
        Self::identity()
    }
}

impl PositionMap {
    /// Cup `i` in slot `i`.
    pub fn identity() -> Self {
        Self {
            slot_of: Slot::ALL,
            container_at: ContainerId::ALL,
        }
    }

    pub fn slot_of(&self, container: ContainerId) -> Slot {
        self.slot_of[container.index()]
    }

    pub fn container_at(&self, slot: Slot) -> ContainerId {
        self.container_at[slot.index()]
    }

    /// Slots indexed by cup.
    pub fn slots(&self) -> [Slot; CUPS] {
        self.slot_of
    }

    /// Cups indexed by slot, left to right.
    pub fn containers(&self) -> [ContainerId; CUPS] {
        self.container_at
    }

    /// Exchange whatever cups stand in slots `a` and `b`. The third cup keeps
    /// its place; swapping a slot with itself returns the map unchanged.
    pub fn swap_slots(&self, a: Slot, b: Slot) -> Self {
        let mut next = *self;
        let cup_a = self.container_at(a);
        let cup_b = self.container_at(b);
        next.slot_of[cup_a.index()] = b;
        next.slot_of[cup_b.index()] = a;
        next.container_at[a.index()] = cup_b;
        next.container_at[b.index()] = cup_a;
        next
    }

    /// One shuffle step: swap the cups in two distinct, uniformly drawn slots.
    pub fn apply_random_swap<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        let (a, b) = pick_distinct_slots(rng);
        self.swap_slots(a, b)
    }

    /// Both tables describe the same bijection.
    pub fn is_consistent(&self) -> bool {
        ContainerId::ALL
            .iter()
            .all(|&cup| self.container_at(self.slot_of(cup)) == cup)
            && Slot::ALL
                .iter()
                .all(|&slot| self.slot_of(self.container_at(slot)) == slot)
    }
}

/// Draw two different slots uniformly; the second draw is retried until it
/// differs from the first.
pub fn pick_distinct_slots<R: Rng + ?Sized>(rng: &mut R) -> (Slot, Slot) {
    let a = rng.gen_range(0..CUPS);
    let mut b = rng.gen_range(0..CUPS);
    while b == a {
        b = rng.gen_range(0..CUPS);
    }
    (Slot::ALL[a], Slot::ALL[b])
}

impl TryFrom<[u8; CUPS]> for PositionMap {
    type Error = NotAPermutation;

    fn try_from(raw: [u8; CUPS]) -> Result<Self, Self::Error> {
        let mut slot_of = Slot::ALL;
        let mut container_at: [Option<ContainerId>; CUPS] = [None; CUPS];
        for (cup, &value) in ContainerId::ALL.iter().zip(raw.iter()) {
            let slot = Slot::try_from(value).map_err(|_| NotAPermutation(raw))?;
            if container_at[slot.index()].replace(*cup).is_some() {
                return Err(NotAPermutation(raw));
            }
            slot_of[cup.index()] = slot;
        }
        let mut resolved = ContainerId::ALL;
        for (out, cup) in resolved.iter_mut().zip(container_at) {
            *out = cup.ok_or(NotAPermutation(raw))?;
        }
        Ok(Self {
            slot_of,
            container_at: resolved,
        })
    }
}

impl From<PositionMap> for [u8; CUPS] {
    fn from(map: PositionMap) -> Self {
        map.slot_of.map(u8::from)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn slot(i: u8) -> Slot {
        Slot::try_from(i).unwrap()
    }

    fn cup(i: u8) -> ContainerId {
        ContainerId::try_from(i).unwrap()
    }

    #[test]
    fn swap_moves_exactly_the_two_cups() {
        let map = PositionMap::identity().swap_slots(slot(0), slot(2));
        assert_eq!(map.slot_of(cup(0)), slot(2));
        assert_eq!(map.slot_of(cup(2)), slot(0));
        assert_eq!(map.slot_of(cup(1)), slot(1));
        assert_eq!(map.container_at(slot(0)), cup(2));
        assert!(map.is_consistent());
    }

    #[test]
    fn swap_follows_cups_not_slots() {
        // After the first swap cup 2 stands in slot 0; swapping slots 0 and 1
        // must move cup 2, not cup 0.
        let map = PositionMap::identity()
            .swap_slots(slot(0), slot(2))
            .swap_slots(slot(0), slot(1));
        assert_eq!(map.containers(), [cup(1), cup(2), cup(0)]);
        assert_eq!(map.slots(), [slot(2), slot(0), slot(1)]);
    }

    #[test]
    fn random_swaps_keep_a_bijection() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut map = PositionMap::identity();
        for _ in 0..1_000 {
            let next = map.apply_random_swap(&mut rng);
            let changed = ContainerId::ALL
                .iter()
                .filter(|&&c| next.slot_of(c) != map.slot_of(c))
                .count();
            assert_eq!(changed, 2, "a swap moves exactly two cups");
            assert!(next.is_consistent());
            map = next;
        }
    }

    #[test]
    fn distinct_slot_pairs_cover_every_pair() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut seen = [[false; CUPS]; CUPS];
        for _ in 0..500 {
            let (a, b) = pick_distinct_slots(&mut rng);
            assert_ne!(a, b);
            seen[a.index()][b.index()] = true;
        }
        for a in 0..CUPS {
            for b in 0..CUPS {
                assert_eq!(seen[a][b], a != b, "pair ({a},{b})");
            }
        }
    }

    #[test]
    fn serde_uses_slot_table_and_validates() {
        let map = PositionMap::identity().swap_slots(slot(1), slot(2));
        assert_eq!(serde_json::to_string(&map).unwrap(), "[0,2,1]");

        let parsed: PositionMap = serde_json::from_str("[2,0,1]").unwrap();
        assert_eq!(parsed.container_at(slot(0)), cup(1));
        assert!(parsed.is_consistent());

        assert!(serde_json::from_str::<PositionMap>("[0,0,1]").is_err());
        assert!(serde_json::from_str::<PositionMap>("[0,1,3]").is_err());
    }
}
