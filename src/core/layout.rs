//! Cosmetic per-card layout: initial tilt, staggered entry and stack lift.
//!
//! Tilt is random for visual variety only. It is drawn from a
//! [`LayoutSource`] so hosts and tests can make it reproducible.

/// Maximum initial tilt in degrees, either side of upright
pub const MAX_TILT_DEG: f64 = 10.0;

/// Entry delay added per card position
pub const ENTRY_STAGGER_MS: f64 = 100.0;

/// Vertical lift per card position, so the stack edge stays visible
pub const STACK_LIFT: f64 = -4.0;

/// Vertical offset cards enter from
pub const ENTRY_OFFSET_Y: f64 = -1000.0;

/// Scale cards enter with
pub const ENTRY_SCALE: f64 = 1.5;

/// Supplies the initial tilt for each card
pub trait LayoutSource {
    /// Tilt in degrees for the card at `index`, in `[-MAX_TILT_DEG, MAX_TILT_DEG)`
    fn initial_rotation(&mut self, index: usize) -> f64;
}

/// Random tilt from a seedable generator
#[derive(Debug, Clone)]
pub struct SeededLayout {
    rng: fastrand::Rng,
}

impl SeededLayout {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Non-reproducible layout for production use
    pub fn from_entropy() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }
}

impl LayoutSource for SeededLayout {
    fn initial_rotation(&mut self, _index: usize) -> f64 {
        -MAX_TILT_DEG + self.rng.f64() * 2.0 * MAX_TILT_DEG
    }
}

/// Every card gets the same tilt
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLayout(pub f64);

impl LayoutSource for FixedLayout {
    fn initial_rotation(&mut self, _index: usize) -> f64 {
        self.0
    }
}

/// Resolved layout for one card
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardLayout {
    pub rotation: f64,
    pub entry_delay_ms: f64,
    pub lift: f64,
}

impl CardLayout {
    pub fn for_index(index: usize, source: &mut dyn LayoutSource) -> Self {
        Self {
            rotation: source.initial_rotation(index),
            entry_delay_ms: index as f64 * ENTRY_STAGGER_MS,
            lift: index as f64 * STACK_LIFT,
        }
    }
}
