use std::ops::RangeInclusive;

use rand::{rngs::StdRng, Rng};
use serde::{Deserialize, Serialize};

/// Offsets a compromised agent adds to (or removes from) its true tally.
pub const OFFSET_RANGE: RangeInclusive<u32> = 1..=5;

/// Report perturbation applied by a compromised agent before digesting.
pub type ValueTransform = Box<dyn FnMut(u32) -> u32 + Send>;

/// Direction in which compromised agents skew their reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdversarialPolicy {
    #[default]
    Inflate,
    Deflate,
}

impl AdversarialPolicy {
    /// Saturating: a deflated count never goes below zero.
    pub fn apply(self, value: u32, offset: u32) -> u32 {
        match self {
            AdversarialPolicy::Inflate => value.saturating_add(offset),
            AdversarialPolicy::Deflate => value.saturating_sub(offset),
        }
    }
}

/// Fresh random offset in [`OFFSET_RANGE`] on every report.
pub fn random_offset(policy: AdversarialPolicy, mut rng: StdRng) -> ValueTransform {
    Box::new(move |value| policy.apply(value, rng.gen_range(OFFSET_RANGE)))
}

pub fn fixed_offset(policy: AdversarialPolicy, offset: u32) -> ValueTransform {
    Box::new(move |value| policy.apply(value, offset))
}
