use std::collections::VecDeque;
use std::ops::{Add, Sub};

/// 2D vector in layout units
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// A raw pointer/touch sample as delivered by the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    /// Host timestamp in milliseconds
    pub t_ms: f64,
    pub position: Vec2,
}

impl PointerSample {
    pub fn new(t_ms: f64, x: f64, y: f64) -> Self {
        Self {
            t_ms,
            position: Vec2::new(x, y),
        }
    }
}

/// Displacement and velocity measured when the pointer is released
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Release {
    pub displacement: Vec2,
    /// Units per millisecond
    pub velocity: Vec2,
}

/// Samples older than this (relative to the newest) do not count towards velocity
pub const DEFAULT_VELOCITY_WINDOW_MS: f64 = 48.0;

const MAX_SAMPLES: usize = 32;

/// Turns a pointer-down/move/up sequence into displacement and release velocity
#[derive(Debug, Clone)]
pub struct GestureTracker {
    origin: Option<PointerSample>,
    samples: VecDeque<PointerSample>,
    window_ms: f64,
}

impl GestureTracker {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_VELOCITY_WINDOW_MS)
    }

    pub fn with_window(window_ms: f64) -> Self {
        Self {
            origin: None,
            samples: VecDeque::with_capacity(MAX_SAMPLES),
            window_ms,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.origin.is_some()
    }

    /// Start a new gesture, discarding any previous one
    pub fn begin(&mut self, sample: PointerSample) {
        self.origin = Some(sample);
        self.samples.clear();
        self.samples.push_back(sample);
    }

    /// Record a move and return the displacement from the gesture origin
    pub fn update(&mut self, sample: PointerSample) -> Option<Vec2> {
        let origin = self.origin?;
        self.push(sample);
        Some(sample.position - origin.position)
    }

    /// Record the final sample and end the gesture
    pub fn finish(&mut self, sample: PointerSample) -> Option<Release> {
        let origin = self.origin.take()?;
        self.push(sample);

        let release = Release {
            displacement: sample.position - origin.position,
            velocity: self.velocity(),
        };
        self.samples.clear();
        Some(release)
    }

    /// Drop the gesture without producing a release
    pub fn cancel(&mut self) {
        self.origin = None;
        self.samples.clear();
    }

    /// Current velocity estimate over the sampling window
    pub fn velocity(&self) -> Vec2 {
        let Some(newest) = self.samples.back() else {
            return Vec2::ZERO;
        };

        let mut oldest = self
            .samples
            .iter()
            .find(|s| newest.t_ms - s.t_ms <= self.window_ms)
            .unwrap_or(newest);

        // Sparse input: nothing else inside the window, use the previous sample
        if oldest.t_ms >= newest.t_ms && self.samples.len() >= 2 {
            oldest = &self.samples[self.samples.len() - 2];
        }

        let dt = newest.t_ms - oldest.t_ms;
        if dt <= 0.0 {
            return Vec2::ZERO;
        }

        (newest.position - oldest.position).scale(1.0 / dt)
    }

    fn push(&mut self, sample: PointerSample) {
        if self.samples.len() == MAX_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }
}

impl Default for GestureTracker {
    fn default() -> Self {
        Self::new()
    }
}
