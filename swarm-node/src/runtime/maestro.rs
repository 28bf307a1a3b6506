use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use swarm_common::{
    audit::save_audit,
    utils::{AgentId, RoundNumber},
    Result,
};
use swarm_consensus::{
    consensus::ViewChange, AggregatorSettings, ConsensusAggregator, Decision, DistributionSummary,
};

use crate::agent::{Agent, AgentState, StepOutcome};
use crate::channel::{BroadcastMedium, CommunicationChannel, MediumEndpoint};
use crate::env::SimulatedSensor;

pub const AUDIT_FILE: &str = "audit.json";

pub type SwarmAgent = Agent<SimulatedSensor, MediumEndpoint>;

/// Everything a finished run produced, as written to `audit.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditData {
    pub settings: AggregatorSettings,
    pub rounds_run: u64,
    pub compromised: Vec<AgentId>,
    pub decisions: Vec<Decision>,
    pub summaries: Vec<DistributionSummary>,
    pub view_changes: Vec<ViewChange>,
    pub final_tallies: BTreeMap<AgentId, u32>,
}

struct RoundTick {
    round: RoundNumber,
    done: oneshot::Sender<StepOutcome>,
}

struct AgentHandle {
    id: AgentId,
    ticks: mpsc::Sender<RoundTick>,
    task: JoinHandle<AgentState>,
}

/// Round driver.
///
/// Each round: tick every agent task and wait for all of them, release the
/// medium's buffered traffic, then let the aggregator drain its inbox. The
/// aggregator never leaves this task.
pub struct Maestro {
    pub(crate) agents: Vec<SwarmAgent>,
    pub(crate) aggregator: ConsensusAggregator,
    pub(crate) central: MediumEndpoint,
    pub(crate) medium: Arc<BroadcastMedium>,
    pub(crate) compromised: Vec<AgentId>,
    pub(crate) rounds: u64,
    pub(crate) stop_after_decisions: Option<usize>,
    pub(crate) log_folder: Option<PathBuf>,
}

impl Maestro {
    pub fn compromised(&self) -> &[AgentId] {
        &self.compromised
    }

    pub async fn run(self) -> Result<AuditData> {
        let Maestro {
            agents,
            mut aggregator,
            mut central,
            medium,
            compromised,
            rounds,
            stop_after_decisions,
            log_folder,
        } = self;

        info!(
            "🚀 Starting swarm run: {} robots ({} compromised), up to {} rounds",
            agents.len(),
            compromised.len(),
            rounds
        );

        let handles: Vec<AgentHandle> = agents.into_iter().map(spawn_agent).collect();
        let mut rounds_run = 0;

        for round in 0..rounds {
            let mut acks = Vec::with_capacity(handles.len());
            for handle in &handles {
                let (done, ack) = oneshot::channel();
                if handle.ticks.send(RoundTick { round, done }).await.is_err() {
                    warn!("⚠️ [{}] agent task is gone; skipping it", handle.id);
                    continue;
                }
                acks.push(ack);
            }

            let mut reports = 0;
            for ack in join_all(acks).await {
                match ack {
                    Ok(outcome) if outcome.sent.is_some() => reports += 1,
                    Ok(_) => {}
                    Err(_) => warn!("⚠️ An agent dropped round {} without acknowledging", round),
                }
            }

            let delivery = medium.deliver().await;
            let outcome = aggregator.process_round(round, central.receive());
            rounds_run = round + 1;

            if reports > 0 {
                debug!(
                    "🔄 Round {}: {} reports, {} delivered, {} dropped, {} accepted, {} rejected",
                    round, reports, delivery.delivered, delivery.dropped, outcome.accepted, outcome.rejected
                );
            }

            if let Some(limit) = stop_after_decisions {
                if aggregator.decisions().len() >= limit {
                    info!("🛑 {} decisions reached at round {}; stopping", limit, round);
                    break;
                }
            }
        }

        medium.close().await;

        let mut final_tallies = BTreeMap::new();
        for AgentHandle { id, ticks, task } in handles {
            drop(ticks);
            match task.await {
                Ok(state) => {
                    final_tallies.insert(state.id, state.local_token_tally);
                }
                Err(e) => error!("❌ [{}] agent task failed: {}", id, e),
            }
        }
        aggregator.flush();

        let audit = AuditData {
            settings: *aggregator.settings(),
            rounds_run,
            compromised,
            decisions: aggregator.decisions().to_vec(),
            summaries: aggregator.summaries().to_vec(),
            view_changes: aggregator.view_changes().to_vec(),
            final_tallies,
        };
        log_summary(&audit);

        if let Some(folder) = log_folder {
            let path = folder.join(AUDIT_FILE);
            save_audit(&path, &audit)?;
            info!("💾 Audit written to {}", path.display());
        }

        Ok(audit)
    }
}

fn spawn_agent(mut agent: SwarmAgent) -> AgentHandle {
    let id = agent.id().clone();
    let (ticks, mut rx) = mpsc::channel::<RoundTick>(1);
    let task = tokio::spawn(async move {
        while let Some(tick) = rx.recv().await {
            let outcome = agent.step(tick.round).await;
            let _ = tick.done.send(outcome);
        }
        agent.finish()
    });
    AgentHandle { id, ticks, task }
}

fn log_summary(audit: &AuditData) {
    info!(
        "🏁 Run finished after {} rounds: {} decisions, {} view changes",
        audit.rounds_run,
        audit.decisions.len(),
        audit.view_changes.len()
    );
    match (audit.decisions.last(), audit.summaries.last()) {
        (Some(decision), Some(summary)) => info!(
            "📊 Final agreed count {} of {} tokens (coverage {:.3}, seq {}, view {})",
            decision.agreed_count,
            summary.true_token_count,
            summary.coverage_ratio,
            decision.sequence,
            decision.view
        ),
        _ => warn!("⚠️ No consensus was reached during the run"),
    }
}
