//! Ordered roster of configured marbles.
//!
//! The roster is edited before a race. Every invalid edit (adding past
//! capacity, removing the last marble, touching an index that does not
//! exist) leaves the roster unchanged; the `bool` returned by the mutators
//! only reports whether anything happened.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::marble::{Color, Marble, MarblePatch};

/// Most marbles a roster can hold.
pub const MAX_MARBLES: usize = 10;

/// Fewest marbles `remove` will leave behind.
pub const MIN_MARBLES: usize = 1;

/// How `add` picks the new marble's color.
#[derive(Debug, Clone)]
enum ColorSource {
    Random(ChaCha8Rng),
    Palette,
}

/// Ordered list of marbles, indexed by position.
#[derive(Debug, Clone)]
pub struct Roster {
    marbles: Vec<Marble>,
    colors: ColorSource,
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

impl Roster {
    /// Creates an empty roster that hands out random colors.
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Creates an empty roster whose random colors are reproducible.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            marbles: Vec::new(),
            colors: ColorSource::Random(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Creates an empty roster that colors marbles from [`Color::PALETTE`].
    pub fn with_palette() -> Self {
        Self {
            marbles: Vec::new(),
            colors: ColorSource::Palette,
        }
    }

    /// Creates a roster pre-populated with `count` default marbles.
    ///
    /// `count` is clamped to `MIN_MARBLES..=MAX_MARBLES`.
    pub fn with_defaults(count: usize) -> Self {
        let mut roster = Self::new();
        roster.fill(count);
        roster
    }

    /// Adds default marbles until the roster holds `count` (clamped).
    pub fn fill(&mut self, count: usize) {
        let target = count.clamp(MIN_MARBLES, MAX_MARBLES);
        while self.marbles.len() < target {
            self.add();
        }
    }

    /// Appends a marble named `Marble {n}`. No-op at capacity.
    pub fn add(&mut self) -> bool {
        if !self.can_add() {
            return false;
        }

        let ordinal = self.marbles.len() + 1;
        let color = match &mut self.colors {
            ColorSource::Random(rng) => Color::random(rng),
            ColorSource::Palette => Color::from_palette(self.marbles.len()),
        };
        let marble = Marble::new(Marble::default_name(ordinal), color);
        tracing::debug!(name = %marble.name, color = %marble.color, "marble added");
        self.marbles.push(marble);
        true
    }

    /// Removes the marble at `index`, shifting later marbles down.
    ///
    /// No-op when it would leave fewer than [`MIN_MARBLES`] or `index` is
    /// out of bounds.
    pub fn remove(&mut self, index: usize) -> bool {
        if !self.can_remove() || index >= self.marbles.len() {
            return false;
        }

        let removed = self.marbles.remove(index);
        tracing::debug!(index, name = %removed.name, "marble removed");
        true
    }

    /// Applies `patch` to the marble at `index`. No-op when out of bounds.
    pub fn update(&mut self, index: usize, patch: MarblePatch) -> bool {
        let Some(marble) = self.marbles.get_mut(index) else {
            return false;
        };
        marble.apply(patch);
        tracing::debug!(index, name = %marble.name, color = %marble.color, "marble updated");
        true
    }

    pub fn can_add(&self) -> bool {
        self.marbles.len() < MAX_MARBLES
    }

    pub fn can_remove(&self) -> bool {
        self.marbles.len() > MIN_MARBLES
    }

    pub fn marbles(&self) -> &[Marble] {
        &self.marbles
    }

    pub fn get(&self, index: usize) -> Option<&Marble> {
        self.marbles.get(index)
    }

    pub fn len(&self) -> usize {
        self.marbles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marbles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(roster: &Roster) -> Vec<&str> {
        roster.marbles().iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn test_starts_empty() {
        let roster = Roster::with_seed(1);
        assert!(roster.is_empty());
        assert!(roster.can_add());
        assert!(!roster.can_remove());
    }

    #[test]
    fn test_add_names_in_order() {
        let mut roster = Roster::with_seed(1);
        roster.add();
        roster.add();
        roster.add();
        assert_eq!(names(&roster), ["Marble 1", "Marble 2", "Marble 3"]);
    }

    #[test]
    fn test_add_stops_at_capacity() {
        let mut roster = Roster::with_seed(1);
        for _ in 0..MAX_MARBLES {
            assert!(roster.add());
        }
        assert!(!roster.can_add());

        let before = roster.marbles().to_vec();
        assert!(!roster.add());
        assert_eq!(roster.marbles(), before.as_slice());
    }

    #[test]
    fn test_remove_shifts_indices() {
        let mut roster = Roster::with_seed(1);
        roster.fill(3);
        assert!(roster.remove(1));
        assert_eq!(names(&roster), ["Marble 1", "Marble 3"]);
    }

    #[test]
    fn test_remove_keeps_last_marble() {
        let mut roster = Roster::with_seed(1);
        roster.add();
        assert!(!roster.remove(0));
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_remove_out_of_bounds_is_noop() {
        let mut roster = Roster::with_seed(1);
        roster.fill(3);
        assert!(!roster.remove(3));
        assert_eq!(roster.len(), 3);
    }

    #[test]
    fn test_update_fields() {
        let mut roster = Roster::with_palette();
        roster.fill(2);
        assert!(roster.update(1, MarblePatch::name("Bolt")));
        assert!(roster.update(1, MarblePatch::color(Color::PINK)));
        assert_eq!(roster.get(1), Some(&Marble::new("Bolt", Color::PINK)));
        assert!(!roster.update(2, MarblePatch::name("Ghost")));
        assert_eq!(names(&roster), ["Marble 1", "Bolt"]);
    }

    #[test]
    fn test_palette_colors_follow_position() {
        let mut roster = Roster::with_palette();
        roster.fill(3);
        let colors: Vec<_> = roster.marbles().iter().map(|m| m.color).collect();
        assert_eq!(colors, [Color::RED, Color::BLUE, Color::GREEN]);
    }

    #[test]
    fn test_seeded_colors_are_reproducible() {
        let mut a = Roster::with_seed(99);
        let mut b = Roster::with_seed(99);
        a.fill(5);
        b.fill(5);
        assert_eq!(a.marbles(), b.marbles());
    }

    #[test]
    fn test_with_defaults_clamps() {
        assert_eq!(Roster::with_defaults(0).len(), MIN_MARBLES);
        assert_eq!(Roster::with_defaults(5).len(), 5);
        assert_eq!(Roster::with_defaults(42).len(), MAX_MARBLES);
    }

    #[test]
    fn test_size_stays_in_bounds_under_mixed_edits() {
        let mut roster = Roster::with_seed(3);
        roster.add();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..500 {
            if rng.random_bool(0.5) {
                roster.add();
            } else {
                let index = rng.random_range(0..12);
                roster.remove(index);
            }
            let len = roster.len();
            assert!((MIN_MARBLES..=MAX_MARBLES).contains(&len));
            assert_eq!(roster.can_add(), len < MAX_MARBLES);
            assert_eq!(roster.can_remove(), len > MIN_MARBLES);
        }
    }
}
