use std::sync::Arc;

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::info;

use swarm_common::{
    audit::{CsvRecorder, NullRecorder, Recorder},
    utils::AgentId,
    Result,
};
use swarm_consensus::{
    consensus::events::{CENTRAL_LOG_FILE, CENTRAL_LOG_HEADER},
    ConsensusAggregator, ProtocolEvent,
};

use crate::agent::{
    adversary::random_offset,
    log::{robot_log_file, AgentLogRow, ROBOT_LOG_HEADER},
    Agent,
};
use crate::channel::BroadcastMedium;
use crate::config::SwarmConfig;
use crate::env::{BodyParams, Field, SimulatedSensor};

use super::maestro::Maestro;

/// Identity the aggregator listens under on the medium.
pub const CENTRAL_ID: &str = "central_ai";

/// Wires field, medium, agents and aggregator from a validated config.
///
/// All randomness is derived from `config.seed`.
pub async fn build_swarm(config: &SwarmConfig) -> Result<Maestro> {
    config.validate()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let field = Arc::new(Field::generate(config.field_size_x, config.field_size_y, config.num_tokens, &mut rng));
    info!(
        "🗺️ Field {}x{} with {} tokens",
        config.field_size_x, config.field_size_y, config.num_tokens
    );

    let medium = BroadcastMedium::new(config.loss_probability, rng.gen());
    let central = medium.attach(AgentId::from(CENTRAL_ID)).await;

    let central_log: Box<dyn Recorder<ProtocolEvent>> = match &config.log_folder {
        Some(folder) => Box::new(CsvRecorder::create(folder.join(CENTRAL_LOG_FILE), &CENTRAL_LOG_HEADER)?),
        None => Box::new(NullRecorder),
    };
    let roster = (0..config.num_robots).map(AgentId::robot);
    let aggregator = ConsensusAggregator::new(config.aggregator_settings(), roster, central_log)?;

    let params = BodyParams {
        movement_range: config.movement_range,
        scan_range: config.scan_range,
        battery_drain: config.battery_drain,
    };

    let mut agents = Vec::with_capacity(config.num_robots);
    let mut compromised = Vec::with_capacity(config.num_compromised);
    for i in 0..config.num_robots {
        let id = AgentId::robot(i);
        let start = field.spawn_position(&mut rng, config.random_start);
        let sensor = SimulatedSensor::new(Arc::clone(&field), start, params, rng.gen());
        let endpoint = medium.attach(id.clone()).await;

        let mut agent = Agent::new(id.clone(), config.reporting_interval, sensor, endpoint);
        if let Some(folder) = &config.log_folder {
            let log: Box<dyn Recorder<AgentLogRow>> =
                Box::new(CsvRecorder::create(folder.join(robot_log_file(&id)), &ROBOT_LOG_HEADER)?);
            agent = agent.with_log(log);
        }
        if i < config.num_compromised {
            let transform = random_offset(config.adversarial_policy, StdRng::seed_from_u64(rng.gen()));
            agent = agent.compromised(transform);
            info!("😈 [{}] compromised ({:?})", id, config.adversarial_policy);
            compromised.push(id);
        }
        agents.push(agent);
    }

    Ok(Maestro {
        agents,
        aggregator,
        central,
        medium,
        compromised,
        rounds: config.rounds,
        stop_after_decisions: config.stop_after_decisions,
        log_folder: config.log_folder.clone(),
    })
}
