use std::collections::BTreeSet;
use std::sync::Arc;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::agent::sensing::Sensor;

/// Rectangular arena with tokens scattered on it. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    width: f64,
    height: f64,
    tokens: Vec<(f64, f64)>,
}

impl Field {
    pub fn new(width: f64, height: f64, tokens: Vec<(f64, f64)>) -> Self {
        Self { width, height, tokens }
    }

    /// Places `num_tokens` uniformly at random.
    pub fn generate(width: f64, height: f64, num_tokens: u32, rng: &mut StdRng) -> Self {
        let tokens = (0..num_tokens)
            .map(|_| (rng.gen_range(0.0..=width), rng.gen_range(0.0..=height)))
            .collect();
        Self::new(width, height, tokens)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn tokens(&self) -> &[(f64, f64)] {
        &self.tokens
    }

    pub fn centre(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    /// Starting position for a robot: uniform over the arena, or the centre.
    pub fn spawn_position(&self, rng: &mut StdRng, random_start: bool) -> (f64, f64) {
        if random_start {
            (rng.gen_range(0.0..=self.width), rng.gen_range(0.0..=self.height))
        } else {
            self.centre()
        }
    }

    pub fn clip(&self, (x, y): (f64, f64)) -> (f64, f64) {
        (x.clamp(0.0, self.width), y.clamp(0.0, self.height))
    }
}

/// Motion and scan parameters of one simulated robot body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyParams {
    pub movement_range: f64,
    pub scan_range: f64,
    pub battery_drain: f64,
}

/// Random-walk robot body on a [`Field`].
pub struct SimulatedSensor {
    field: Arc<Field>,
    params: BodyParams,
    position: (f64, f64),
    battery: f64,
    seen: BTreeSet<usize>,
    rng: StdRng,
}

impl SimulatedSensor {
    pub fn new(field: Arc<Field>, start: (f64, f64), params: BodyParams, seed: u64) -> Self {
        let position = field.clip(start);
        Self {
            field,
            params,
            position,
            battery: 1.0,
            seen: BTreeSet::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[cfg(test)]
    fn seen(&self) -> usize {
        self.seen.len()
    }

    fn wander(&mut self) {
        if self.battery <= 0.0 {
            return;
        }
        let half = self.params.movement_range / 2.0;
        if half > 0.0 {
            let dx = self.rng.gen_range(-half..=half);
            let dy = self.rng.gen_range(-half..=half);
            self.position = self.field.clip((self.position.0 + dx, self.position.1 + dy));
        }
        self.battery = (self.battery - self.params.battery_drain).max(0.0);
    }

    /// Nearest unseen token within scan range, if any.
    fn scan(&self) -> Option<usize> {
        let (x, y) = self.position;
        self.field
            .tokens()
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.seen.contains(i))
            .map(|(i, (tx, ty))| (i, ((tx - x).powi(2) + (ty - y).powi(2)).sqrt()))
            .filter(|(_, d)| *d <= self.params.scan_range)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }
}

impl Sensor for SimulatedSensor {
    fn sense_tokens(&mut self) -> bool {
        self.wander();
        match self.scan() {
            Some(index) => self.seen.insert(index),
            None => false,
        }
    }

    fn position(&self) -> (f64, f64) {
        self.position
    }

    fn proximity_readings(&self) -> [f64; 3] {
        let (x, y) = self.position;
        let reach = self.params.scan_range.max(f64::EPSILON);
        let proximity = |distance: f64| (1.0 - distance / reach).clamp(0.0, 1.0);

        let left = proximity(x);
        let right = proximity(self.field.width() - x);
        let front = proximity(y.min(self.field.height() - y));
        [left, front, right]
    }

    fn battery_level(&self) -> f64 {
        self.battery
    }
}
