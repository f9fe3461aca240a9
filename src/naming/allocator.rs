//! NameAllocator — seeded, collision-free mutant names
//!
//! The full color × shape × animal product is shuffled once per zoo with a
//! portable PCG stream seeded from the zoo's seed, then handed out in order
//! behind a cursor. Allocation order is therefore a pure function of the seed
//! and the allocation history.

use super::vocabulary::{compose, decompose, ANIMALS, NAME_SPACE, SHAPES};
use crate::error::ZooError;
use log::debug;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::collections::BTreeSet;

/// Anything that can mint a fresh, never-before-issued mutant name
pub trait NameSource {
    fn next_name(&mut self) -> Result<String, ZooError>;
}

/// Deterministic name generator scoped to a single zoo
#[derive(Debug, Clone)]
pub struct NameAllocator {
    seed: u64,
    /// Next position to try in `permutation`
    cursor: usize,
    /// Encoded (color, shape, animal) triples in shuffled order
    permutation: Vec<u16>,
    /// Every name ever issued; never shrinks
    allocated: BTreeSet<String>,
}

impl NameAllocator {
    /// Fresh allocator with nothing issued yet
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            cursor: 0,
            permutation: Self::shuffled(seed),
            allocated: BTreeSet::new(),
        }
    }

    /// Rebuild an allocator from persisted state
    pub fn restore(seed: u64, allocated: impl IntoIterator<Item = String>, cursor: usize) -> Self {
        Self {
            seed,
            cursor: cursor.min(NAME_SPACE),
            permutation: Self::shuffled(seed),
            allocated: allocated.into_iter().collect(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn allocated(&self) -> &BTreeSet<String> {
        &self.allocated
    }

    pub fn is_allocated(&self, name: &str) -> bool {
        self.allocated.contains(name)
    }

    /// How many names of the vocabulary are still free
    pub fn remaining(&self) -> usize {
        let used = self
            .allocated
            .iter()
            .filter(|n| decompose(n).is_some())
            .count();
        NAME_SPACE - used
    }

    /// Issue the next free name and mark it allocated
    pub fn allocate(&mut self) -> Result<String, ZooError> {
        let len = self.permutation.len();
        for step in 0..len {
            let idx = (self.cursor + step) % len;
            let name = Self::name_at(self.permutation[idx]);
            if self.allocated.insert(name.clone()) {
                self.cursor = idx + 1;
                debug!("Allocated mutant name '{}' (slot {}/{})", name, idx, len);
                return Ok(name);
            }
        }
        Err(ZooError::Exhausted { space: NAME_SPACE })
    }

    /// Mark a name as taken without issuing it. Returns false if it already was.
    pub(crate) fn register(&mut self, name: &str) -> bool {
        self.allocated.insert(name.to_string())
    }

    fn name_at(code: u16) -> String {
        let code = code as usize;
        let per_color = SHAPES.len() * ANIMALS.len();
        compose(
            code / per_color,
            (code % per_color) / ANIMALS.len(),
            code % ANIMALS.len(),
        )
    }

    fn shuffled(seed: u64) -> Vec<u16> {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut codes: Vec<u16> = (0..NAME_SPACE as u16).collect();
        codes.shuffle(&mut rng);
        codes
    }
}

impl NameSource for NameAllocator {
    fn next_name(&mut self) -> Result<String, ZooError> {
        self.allocate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::is_valid_name;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_valid_and_unique() {
        let mut names = NameAllocator::new(42);
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let name = names.allocate().unwrap();
            assert!(is_valid_name(&name), "bad name {}", name);
            assert!(seen.insert(name));
        }
        assert_eq!(names.allocated().len(), 500);
        assert_eq!(names.remaining(), NAME_SPACE - 500);
    }

    #[test]
    fn test_exhaustion() {
        let mut names = NameAllocator::new(7);
        let mut seen = HashSet::new();
        for _ in 0..NAME_SPACE {
            let name = names.allocate().unwrap();
            assert!(seen.insert(name));
        }
        assert_eq!(names.remaining(), 0);
        match names.allocate() {
            Err(ZooError::Exhausted { space }) => assert_eq!(space, NAME_SPACE),
            other => panic!("expected exhaustion, got {:?}", other),
        }
    }

    #[test]
    fn test_same_seed_same_names() {
        let mut a = NameAllocator::new(42);
        let mut b = NameAllocator::new(42);
        for _ in 0..50 {
            assert_eq!(a.allocate().unwrap(), b.allocate().unwrap());
        }
    }

    #[test]
    fn test_different_seeds_diverge() {
        let mut a = NameAllocator::new(1);
        let mut b = NameAllocator::new(2);
        let first_a: Vec<String> = (0..10).map(|_| a.allocate().unwrap()).collect();
        let first_b: Vec<String> = (0..10).map(|_| b.allocate().unwrap()).collect();
        assert_ne!(first_a, first_b);
    }

    #[test]
    fn test_restore_continues_sequence() {
        let mut original = NameAllocator::new(99);
        let issued: Vec<String> = (0..10).map(|_| original.allocate().unwrap()).collect();

        let mut partial = NameAllocator::new(99);
        for _ in 0..5 {
            partial.allocate().unwrap();
        }
        let mut restored =
            NameAllocator::restore(99, partial.allocated().iter().cloned(), partial.cursor());
        let rest: Vec<String> = (0..5).map(|_| restored.allocate().unwrap()).collect();
        assert_eq!(rest, issued[5..]);
    }

    #[test]
    fn test_restore_without_cursor_skips_taken_names() {
        let mut original = NameAllocator::new(3);
        let issued: Vec<String> = (0..4).map(|_| original.allocate().unwrap()).collect();

        let mut restored = NameAllocator::restore(3, issued.clone(), 0);
        let next = restored.allocate().unwrap();
        assert!(!issued.contains(&next));
        assert_eq!(next, original.allocate().unwrap());
    }

    #[test]
    fn test_register_blocks_name() {
        let mut reference = NameAllocator::new(5);
        let first = reference.allocate().unwrap();

        let mut names = NameAllocator::new(5);
        assert!(names.register(&first));
        assert!(!names.register(&first));
        assert_ne!(names.allocate().unwrap(), first);
    }
}
