/// Per-tile "seen" freshness record.
///
/// Each tile carries a countdown of ticks since it was last lit:
///   - `0`        → never seen
///   - `max_age`  → lit this tick
///   - `1`        → seen long ago, fully faded
///
/// Once a tile has been seen it never returns to 0, so "seen, faded"
/// and "never seen" stay distinguishable for rendering and the win check.

#[derive(Clone, Debug)]
pub struct SeenTiles {
    ages: Vec<u32>,
    max_age: u32,
}

impl SeenTiles {
    pub fn new(len: usize, max_age: u32) -> Self {
        SeenTiles { ages: vec![0; len], max_age: max_age.max(1) }
    }

    /// Light a tile: reset its freshness to the maximum.
    pub fn mark(&mut self, index: usize) {
        if let Some(age) = self.ages.get_mut(index) {
            *age = self.max_age;
        }
    }

    /// One tick of fading. Seen tiles count down to 1 and stop there.
    pub fn decay(&mut self) {
        for age in self.ages.iter_mut().filter(|a| **a > 1) {
            *age -= 1;
        }
    }

    #[inline]
    pub fn age(&self, index: usize) -> u32 {
        self.ages.get(index).copied().unwrap_or(0)
    }

    #[inline]
    pub fn is_seen(&self, index: usize) -> bool {
        self.age(index) > 0
    }

    /// Lit recently enough to draw at full strength.
    #[inline]
    pub fn is_fresh(&self, index: usize, fade_age: u32) -> bool {
        self.age(index) >= fade_age
    }

    /// Number of tiles ever seen.
    pub fn seen_count(&self) -> usize {
        self.ages.iter().filter(|&&a| a > 0).count()
    }
}
