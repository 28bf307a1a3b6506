use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use swarm_common::{error::ConfigurationError, Result};
use swarm_consensus::{AggregatorSettings, QuorumPolicy};

use crate::agent::AdversarialPolicy;

/// Experiment parameters. Read once at startup; missing keys take defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub field_size_x: f64,
    pub field_size_y: f64,
    pub num_tokens: u32,
    pub num_robots: usize,
    pub num_compromised: usize,
    /// `f` in the quorum rule. Defaults to `num_compromised`.
    pub max_compromised_assumed: Option<usize>,
    pub reporting_interval: u64,
    /// Stalled rounds tolerated before a view change. Should be at least
    /// `reporting_interval`: a shorter budget can expire between two report
    /// rounds and discard votes before the next batch arrives.
    pub max_rounds_per_view: u64,
    pub rounds: u64,
    pub adversarial_policy: AdversarialPolicy,
    pub loss_probability: f64,
    pub movement_range: f64,
    pub scan_range: f64,
    pub random_start: bool,
    pub battery_drain: f64,
    pub seed: u64,
    /// Ends the run early once this many sequences are decided.
    pub stop_after_decisions: Option<usize>,
    /// CSV and audit output. `None` disables file output.
    pub log_folder: Option<PathBuf>,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            field_size_x: 20.0,
            field_size_y: 20.0,
            num_tokens: 10,
            num_robots: 10,
            num_compromised: 3,
            max_compromised_assumed: None,
            reporting_interval: 50,
            max_rounds_per_view: 100,
            rounds: 2000,
            adversarial_policy: AdversarialPolicy::Inflate,
            loss_probability: 0.0,
            movement_range: 10.0,
            scan_range: 5.0,
            random_start: true,
            battery_drain: 0.0001,
            seed: 42,
            stop_after_decisions: None,
            log_folder: Some(PathBuf::from("logs")),
        }
    }
}

impl SwarmConfig {
    pub fn max_faulty(&self) -> usize {
        self.max_compromised_assumed.unwrap_or(self.num_compromised)
    }

    pub fn quorum_policy(&self) -> QuorumPolicy {
        QuorumPolicy::new(self.num_robots, self.max_faulty())
    }

    pub fn aggregator_settings(&self) -> AggregatorSettings {
        AggregatorSettings {
            policy: self.quorum_policy(),
            max_rounds_per_view: self.max_rounds_per_view,
            true_token_count: self.num_tokens,
        }
    }

    /// Whether a view lasts long enough to see at least one report round.
    pub fn view_outlasts_reporting_interval(&self) -> bool {
        self.max_rounds_per_view >= self.reporting_interval
    }

    /// Rejects configurations that cannot run. Legal but suspicious
    /// settings are only warned about.
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        if self.num_tokens == 0 {
            return Err(ConfigurationError::ZeroTrueTokenCount);
        }
        if self.num_robots == 0 {
            return Err(ConfigurationError::NoAgents);
        }
        if self.reporting_interval == 0 {
            return Err(ConfigurationError::ZeroReportingInterval);
        }
        if self.max_rounds_per_view == 0 {
            return Err(ConfigurationError::ZeroRoundsPerView);
        }
        if self.num_compromised > self.num_robots {
            return Err(ConfigurationError::TooManyCompromised {
                compromised: self.num_compromised,
                robots: self.num_robots,
            });
        }
        if !(0.0..=1.0).contains(&self.loss_probability) {
            return Err(ConfigurationError::LossProbability(self.loss_probability));
        }
        if !(self.field_size_x > 0.0 && self.field_size_y > 0.0) {
            return Err(ConfigurationError::FieldSize { x: self.field_size_x, y: self.field_size_y });
        }
        if !self.quorum_policy().is_byzantine_safe() {
            return Err(ConfigurationError::QuorumPrecondition { n: self.num_robots, f: self.max_faulty() });
        }
        if !self.view_outlasts_reporting_interval() {
            warn!(
                "⚠️ max_rounds_per_view ({}) is shorter than reporting_interval ({}); views may change before any report lands",
                self.max_rounds_per_view, self.reporting_interval
            );
        }
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let config = serde_json::from_str(&json)?;
        Ok(config)
    }
}
