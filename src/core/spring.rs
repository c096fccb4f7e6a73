/// Spring parameters, in the tension/friction/mass convention used by web
/// animation libraries.
///
/// Values are per-second quantities; position is in layout units and
/// velocity in units per millisecond.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringConfig {
    pub tension: f64,
    pub friction: f64,
    pub mass: f64,
    /// Distance from the target under which the spring may come to rest
    pub precision: f64,
}

impl SpringConfig {
    pub fn new(tension: f64, friction: f64) -> Self {
        Self {
            tension,
            friction,
            ..Self::default()
        }
    }

    pub fn with_precision(mut self, precision: f64) -> Self {
        self.precision = precision;
        self
    }

    /// Velocity under which a spring near its target counts as stopped
    #[inline]
    fn rest_velocity(&self) -> f64 {
        self.precision / 10.0
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            tension: 170.0,
            friction: 26.0,
            mass: 1.0,
            precision: 0.01,
        }
    }
}

/// Integration step in milliseconds. Larger frames are split into substeps.
const STEP_MS: f64 = 1.0;

/// A single animated scalar driven by a damped spring
#[derive(Debug, Clone, Copy)]
pub struct Spring {
    value: f64,
    velocity: f64,
    target: f64,
    config: SpringConfig,
    delay_ms: f64,
}

impl Spring {
    /// A spring at rest at `value`
    pub fn new(value: f64) -> Self {
        Self {
            value,
            velocity: 0.0,
            target: value,
            config: SpringConfig::default(),
            delay_ms: 0.0,
        }
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[inline]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    #[inline]
    pub fn target(&self) -> f64 {
        self.target
    }

    #[inline]
    pub fn config(&self) -> SpringConfig {
        self.config
    }

    /// Start animating towards `target`. Cancels any pending delay.
    pub fn animate_to(&mut self, target: f64, config: SpringConfig) {
        self.animate_to_after(target, config, 0.0);
    }

    /// Start animating towards `target` once `delay_ms` has elapsed
    pub fn animate_to_after(&mut self, target: f64, config: SpringConfig, delay_ms: f64) {
        self.target = target;
        self.config = config;
        self.delay_ms = delay_ms.max(0.0);
    }

    /// Place the spring at `value` with no motion
    pub fn jump_to(&mut self, value: f64) {
        self.value = value;
        self.target = value;
        self.velocity = 0.0;
        self.delay_ms = 0.0;
    }

    /// True when the spring sits on its target with negligible velocity
    pub fn is_settled(&self) -> bool {
        self.delay_ms <= 0.0
            && (self.target - self.value).abs() <= self.config.precision
            && self.velocity.abs() <= self.config.rest_velocity()
    }

    /// Advance the simulation by `dt_ms` milliseconds
    pub fn step(&mut self, dt_ms: f64) {
        let mut remaining = dt_ms.max(0.0);

        if self.delay_ms > 0.0 {
            let waited = remaining.min(self.delay_ms);
            self.delay_ms -= waited;
            remaining -= waited;
        }

        while remaining > 0.0 {
            if self.is_settled() {
                self.value = self.target;
                self.velocity = 0.0;
                return;
            }

            let h = remaining.min(STEP_MS);

            // Tension and friction are per-second; scale to per-millisecond.
            let spring_force = -self.config.tension * 1e-6 * (self.value - self.target);
            let damping_force = -self.config.friction * 1e-3 * self.velocity;
            let acceleration = (spring_force + damping_force) / self.config.mass;

            self.velocity += acceleration * h;
            self.value += self.velocity * h;
            remaining -= h;
        }

        if self.is_settled() {
            self.value = self.target;
            self.velocity = 0.0;
        }
    }
}

impl Default for Spring {
    fn default() -> Self {
        Self::new(0.0)
    }
}
