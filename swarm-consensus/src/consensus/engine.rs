use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use swarm_common::{
    audit::Recorder,
    env::{envelope::Envelope, report::Report},
    error::{ConfigurationError, IntegrityViolation},
    utils::{AgentId, RoundNumber, SequenceNumber, ViewNumber},
};

use crate::coverage::{CoverageEvaluator, DistributionSummary};

use super::{
    evaluator::{ConsensusEvaluator, QuorumPolicy},
    events::{EventKind, ProtocolEvent},
    registry::VoteOutcome,
    round::{ConsensusRound, Decision},
};

/// Static parameters of an aggregator instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorSettings {
    pub policy: QuorumPolicy,
    pub max_rounds_per_view: u64,
    pub true_token_count: u32,
}

/// Why an inbound message was not counted.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    UnknownSender { sender: AgentId },
    Malformed { sender: AgentId, reason: String },
    SenderMismatch { channel_sender: AgentId, claimed: AgentId },
    Integrity(IntegrityViolation),
}

/// Liveness fallback record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewChange {
    pub tick: RoundNumber,
    pub sequence: SequenceNumber,
    pub from_view: ViewNumber,
    pub to_view: ViewNumber,
}

/// What happened during one call to [`ConsensusAggregator::process_round`].
#[derive(Debug, Clone, Default)]
pub struct RoundOutcome {
    pub tick: RoundNumber,
    pub accepted: usize,
    pub rejected: usize,
    pub decision: Option<Decision>,
    pub summary: Option<DistributionSummary>,
    pub view_change: Option<ViewChange>,
}

/// Central aggregator: verifies reports, tallies votes and commits agreed
/// counts under the `n - f` quorum rule.
///
/// It is the only writer of its [`ConsensusRound`]; agents reach it through
/// channel messages alone, so no locking is involved as long as one round's
/// inbox is processed to completion before the next.
pub struct ConsensusAggregator {
    round: ConsensusRound,
    evaluator: ConsensusEvaluator,
    coverage: CoverageEvaluator,
    settings: AggregatorSettings,
    roster: BTreeSet<AgentId>,
    recorder: Box<dyn Recorder<ProtocolEvent>>,
    decisions: Vec<Decision>,
    summaries: Vec<DistributionSummary>,
    view_changes: Vec<ViewChange>,
}

impl ConsensusAggregator {
    /// Builds an aggregator that accepts reports from `roster` only. Fails
    /// when the ground truth needed by the coverage evaluation is missing,
    /// the view budget is zero, or the roster size differs from `n`.
    ///
    /// `n > 3f` is not checked here; it is a deployment requirement.
    pub fn new<R>(
        settings: AggregatorSettings,
        roster: R,
        recorder: Box<dyn Recorder<ProtocolEvent>>,
    ) -> Result<Self, ConfigurationError>
    where
        R: IntoIterator<Item = AgentId>,
    {
        let roster: BTreeSet<AgentId> = roster.into_iter().collect();
        if roster.len() != settings.policy.total_agents {
            return Err(ConfigurationError::RosterSize {
                expected: settings.policy.total_agents,
                actual: roster.len(),
            });
        }
        if settings.true_token_count == 0 {
            return Err(ConfigurationError::ZeroTrueTokenCount);
        }
        if settings.max_rounds_per_view == 0 {
            return Err(ConfigurationError::ZeroRoundsPerView);
        }
        if !settings.policy.is_byzantine_safe() {
            warn!(
                "⚠️ Quorum precondition n > 3f does not hold (n: {}, f: {}); safety is not guaranteed",
                settings.policy.total_agents, settings.policy.max_faulty
            );
        }

        info!(
            "🗳️ Aggregator ready (n: {}, f: {}, quorum: {}, max rounds/view: {})",
            settings.policy.total_agents,
            settings.policy.max_faulty,
            settings.policy.threshold(),
            settings.max_rounds_per_view
        );

        Ok(Self {
            round: ConsensusRound::new(settings.policy.threshold()),
            evaluator: ConsensusEvaluator::new(settings.policy),
            coverage: CoverageEvaluator::new(),
            settings,
            roster,
            recorder,
            decisions: Vec::new(),
            summaries: Vec::new(),
            view_changes: Vec::new(),
        })
    }

    /// Drains one round's inbox, then evaluates quorum.
    pub fn process_round<I>(&mut self, tick: RoundNumber, inbox: I) -> RoundOutcome
    where
        I: IntoIterator<Item = Envelope>,
    {
        let mut outcome = RoundOutcome { tick, ..Default::default() };

        for envelope in inbox {
            match self.ingest(tick, &envelope) {
                Ok(_) => outcome.accepted += 1,
                Err(_) => outcome.rejected += 1,
            }
        }

        match self.evaluator.evaluate(self.round.votes()) {
            Some(result) => {
                if let Some((decision, summary)) =
                    self.commit(tick, result.value, result.votes, &result.qualifying_values)
                {
                    outcome.decision = Some(decision);
                    outcome.summary = summary;
                }
            }
            None => {
                if self.round.record_stalled_round(self.settings.max_rounds_per_view) {
                    outcome.view_change = Some(self.change_view(tick));
                }
            }
        }

        outcome
    }

    /// Collecting step for a single message.
    ///
    /// Every rejection is isolated: it is logged and recorded, and never
    /// aborts the round.
    pub fn ingest(&mut self, tick: RoundNumber, envelope: &Envelope) -> Result<VoteOutcome, Rejection> {
        if !self.roster.contains(&envelope.sender_id) {
            warn!("⚠️ Report from [{}], which is not on the roster; discarded", envelope.sender_id);
            self.emit(
                tick,
                EventKind::UnknownSender,
                Some(envelope.sender_id.clone()),
                format!("payload_bytes={}", envelope.payload.len()),
            );
            return Err(Rejection::UnknownSender { sender: envelope.sender_id.clone() });
        }

        let report = match Report::decode(&envelope.payload) {
            Ok(report) => report,
            Err(e) => {
                warn!("⚠️ Undecodable report from [{}]: {}", envelope.sender_id, e);
                self.emit(tick, EventKind::MalformedPayload, Some(envelope.sender_id.clone()), e.to_string());
                return Err(Rejection::Malformed {
                    sender: envelope.sender_id.clone(),
                    reason: e.to_string(),
                });
            }
        };

        if report.sender_id != envelope.sender_id {
            warn!(
                "⚠️ Report claims sender [{}] but arrived from [{}]; discarded",
                report.sender_id, envelope.sender_id
            );
            self.emit(
                tick,
                EventKind::SenderMismatch,
                Some(envelope.sender_id.clone()),
                format!("claimed={}", report.sender_id),
            );
            return Err(Rejection::SenderMismatch {
                channel_sender: envelope.sender_id.clone(),
                claimed: report.sender_id,
            });
        }

        if let Err(violation) = report.verify() {
            warn!("🚨 INTEGRITY VIOLATION: {}", violation);
            tracing::warn!(target: "consensus", "EVENT:INTEGRITY_VIOLATION sender={} round={}", report.sender_id, report.round);
            self.emit(
                tick,
                EventKind::IntegrityViolation,
                Some(report.sender_id.clone()),
                format!(
                    "token_count={} declared={} recomputed={}",
                    report.token_count, violation.declared, violation.recomputed
                ),
            );
            return Err(Rejection::Integrity(violation));
        }

        let outcome = self
            .round
            .votes_mut()
            .register_vote(report.sender_id.clone(), report.token_count);

        match outcome {
            VoteOutcome::New | VoteOutcome::Unchanged => {
                debug!("📥 [{}] votou {} (round {})", report.sender_id, report.token_count, report.round);
                self.emit(
                    tick,
                    EventKind::Vote,
                    Some(report.sender_id),
                    format!("value={} round={}", report.token_count, report.round),
                );
            }
            VoteOutcome::Replaced { previous } => {
                debug!(
                    "🔁 [{}] replaced vote {} with {} (round {})",
                    report.sender_id, previous, report.token_count, report.round
                );
                self.emit(
                    tick,
                    EventKind::VoteReplaced,
                    Some(report.sender_id),
                    format!("value={} previous={} round={}", report.token_count, previous, report.round),
                );
            }
        }

        Ok(outcome)
    }

    fn commit(
        &mut self,
        tick: RoundNumber,
        value: u32,
        votes: usize,
        qualifying_values: &[u32],
    ) -> Option<(Decision, Option<DistributionSummary>)> {
        if let Err(e) = self.round.decide(value) {
            warn!("⚠️ {}", e);
            return None;
        }

        let decision = Decision {
            view: self.round.view(),
            sequence: self.round.sequence(),
            agreed_count: value,
            votes,
            tick,
        };

        info!(
            "🎉 Consensus reached (view {}, seq {}): agreed count {} with {}/{} votes",
            decision.view, decision.sequence, value, votes, self.round.quorum_threshold()
        );
        tracing::info!(target: "consensus", "EVENT:COMMIT view={} seq={} agreed_count={}", decision.view, decision.sequence, value);
        self.emit(
            tick,
            EventKind::ConsensusReached,
            None,
            format!(
                "agreed_count={} votes={} threshold={} {}",
                value,
                votes,
                self.round.quorum_threshold(),
                format_qualifying(qualifying_values)
            ),
        );

        let tallies = self.round.votes().tallies();
        let summary = match self.coverage.evaluate(value, self.settings.true_token_count, &tallies) {
            Ok(summary) => {
                info!(
                    "📊 Coverage: {:.3} ({} of {} tokens)",
                    summary.coverage_ratio, value, summary.true_token_count
                );
                self.emit(
                    tick,
                    EventKind::Coverage,
                    None,
                    format!(
                        "coverage_ratio={:.4} true_token_count={} {}",
                        summary.coverage_ratio,
                        summary.true_token_count,
                        format_deviation(&summary.per_agent_deviation)
                    ),
                );
                self.summaries.push(summary.clone());
                Some(summary)
            }
            Err(e) => {
                warn!("⚠️ Coverage evaluation skipped: {}", e);
                None
            }
        };

        self.decisions.push(decision);
        self.round.begin_next_sequence();

        Some((decision, summary))
    }

    fn change_view(&mut self, tick: RoundNumber) -> ViewChange {
        let from_view = self.round.view();
        let discarded = self.round.votes().total_votes();
        self.round.change_view();

        let change = ViewChange {
            tick,
            sequence: self.round.sequence(),
            from_view,
            to_view: self.round.view(),
        };

        warn!(
            "⏳ QuorumStall: no quorum for seq {} within {} rounds; view {} -> {} ({} votes discarded)",
            change.sequence, self.settings.max_rounds_per_view, from_view, change.to_view, discarded
        );
        tracing::warn!(target: "consensus", "EVENT:VIEW_CHANGE seq={} view={}", change.sequence, change.to_view);
        self.emit(
            tick,
            EventKind::ViewChange,
            None,
            format!("from_view={} discarded_votes={}", from_view, discarded),
        );

        self.view_changes.push(change);
        change
    }

    fn emit(&mut self, tick: RoundNumber, event: EventKind, sender_id: Option<AgentId>, detail: String) {
        let row = ProtocolEvent {
            tick,
            event,
            view: self.round.view(),
            seq: self.round.sequence(),
            sender_id,
            detail,
        };
        self.recorder.record(&row);
    }

    pub fn flush(&mut self) {
        self.recorder.flush();
    }

    pub fn state(&self) -> &ConsensusRound {
        &self.round
    }

    pub fn settings(&self) -> &AggregatorSettings {
        &self.settings
    }

    /// Agents whose reports are counted.
    pub fn roster(&self) -> &BTreeSet<AgentId> {
        &self.roster
    }

    /// Committed decisions, in sequence order.
    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    pub fn summaries(&self) -> &[DistributionSummary] {
        &self.summaries
    }

    pub fn view_changes(&self) -> &[ViewChange] {
        &self.view_changes
    }

    pub fn decision_for(&self, sequence: SequenceNumber) -> Option<&Decision> {
        self.decisions.iter().find(|d| d.sequence == sequence)
    }
}

fn format_qualifying(values: &[u32]) -> String {
    let parts: Vec<String> = values.iter().map(u32::to_string).collect();
    format!("qualifying_values=[{}]", parts.join(" "))
}

fn format_deviation(deviation: &BTreeMap<AgentId, i64>) -> String {
    let parts: Vec<String> = deviation.iter().map(|(id, d)| format!("{}:{:+}", id, d)).collect();
    format!("deviation=[{}]", parts.join(" "))
}
